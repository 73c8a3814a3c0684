//! `.sandbox-hint` files: metadata plus an ordered list of rules.
//!
//! ```text
//! <!id: encoding>
//! <!severity: warning>
//! <!include: collections>
//!
//! "Use StandardCharsets":
//! new String($bytes, "UTF-8") :: sourceVersionGE(7)
//! => new String($bytes, java.nio.charset.StandardCharsets.UTF_8)
//! ;;
//! ```

pub mod bundled;
pub mod parser;
pub mod registry;

pub use parser::HintFileParser;
pub use registry::HintFileRegistry;

use crate::diagnostic::Severity;
use crate::rule::TransformationRule;

pub const HINT_FILE_EXTENSION: &str = "sandbox-hint";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintFile {
    pub id: Option<String>,
    pub description: Option<String>,
    /// Severity as written; see [`HintFile::severity_level`].
    pub severity: String,
    pub min_java_version: Option<u32>,
    pub tags: Vec<String>,
    /// Ids of other hint files whose rules this one pulls in.
    pub includes: Vec<String>,
    pub rules: Vec<TransformationRule>,
}

impl Default for HintFile {
    fn default() -> Self {
        Self {
            id: None,
            description: None,
            severity: "info".to_string(),
            min_java_version: None,
            tags: Vec::new(),
            includes: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl HintFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn add_rule(&mut self, rule: TransformationRule) {
        self.rules.push(rule);
    }

    /// Severity mapped onto the report levels; unknown names report as info.
    pub fn severity_level(&self) -> Severity {
        Severity::from_str(&self.severity).unwrap_or(Severity::Info)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the file applies at the given source level (`"1.8"`, `"17"`).
    pub fn applies_to(&self, source_version: &str) -> bool {
        let Some(min) = self.min_java_version else {
            return true;
        };
        let version = source_version.trim();
        let version = version.strip_prefix("1.").unwrap_or(version);
        let major = version
            .split('.')
            .next()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        major >= min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let file = HintFile::new();
        assert_eq!(file.severity, "info");
        assert_eq!(file.severity_level(), Severity::Info);
        assert_eq!(file.id(), "");
        assert!(file.applies_to("1.8"));
    }

    #[test]
    fn min_java_version_gate() {
        let file = HintFile {
            min_java_version: Some(11),
            ..HintFile::default()
        };
        assert!(!file.applies_to("1.8"));
        assert!(file.applies_to("11"));
        assert!(file.applies_to("17.0.2"));
    }

    #[test]
    fn severity_mapping() {
        let mut file = HintFile::new();
        file.severity = "warning".to_string();
        assert_eq!(file.severity_level(), Severity::Warning);
        file.severity = "bogus".to_string();
        assert_eq!(file.severity_level(), Severity::Info);
    }
}
