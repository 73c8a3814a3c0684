use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn letter(&self) -> char {
        match self {
            Severity::Hint => 'H',
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hint => "hint",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Severity> {
        match s.trim().to_lowercase().as_str() {
            "hint" => Some(Severity::Hint),
            "info" | "information" => Some(Severity::Info),
            "warning" | "warn" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// 1-indexed line number
    pub line: usize,
    /// 0-indexed column (character offset within the line)
    pub column: usize,
}

/// One reported match in one file.
#[derive(Debug, Clone)]
pub struct Finding {
    pub path: String,
    pub location: Location,
    pub offset: usize,
    pub length: usize,
    pub severity: Severity,
    /// Id of the hint file the rule came from.
    pub hint_file: String,
    pub message: String,
    pub matched: String,
    pub replacement: Option<String>,
    pub pattern: String,
    pub applied: bool,
}

impl Finding {
    pub fn sort_key(&self) -> (&str, usize, usize) {
        (&self.path, self.location.line, self.location.column)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}: {}",
            self.path,
            self.location.line,
            self.location.column,
            self.severity.letter(),
            self.hint_file,
            self.message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_letters() {
        assert_eq!(Severity::Hint.letter(), 'H');
        assert_eq!(Severity::Info.letter(), 'I');
        assert_eq!(Severity::Warning.letter(), 'W');
        assert_eq!(Severity::Error.letter(), 'E');
    }

    #[test]
    fn severity_from_str() {
        assert_eq!(Severity::from_str("INFO"), Some(Severity::Info));
        assert_eq!(Severity::from_str("warn"), Some(Severity::Warning));
        assert_eq!(Severity::from_str(" error "), Some(Severity::Error));
        assert_eq!(Severity::from_str("fatal"), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Hint < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn finding_display() {
        let f = Finding {
            path: "A.java".to_string(),
            location: Location { line: 3, column: 8 },
            offset: 40,
            length: 5,
            severity: Severity::Warning,
            hint_file: "collections".to_string(),
            message: "Use List.of()".to_string(),
            matched: "new ArrayList<>()".to_string(),
            replacement: None,
            pattern: "new ArrayList<>()".to_string(),
            applied: false,
        };
        assert_eq!(f.to_string(), "A.java:3:8: W: collections: Use List.of()");
    }
}
