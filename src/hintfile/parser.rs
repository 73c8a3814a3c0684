//! Line-oriented parser and writer for the hint file format.

use super::HintFile;
use crate::error::HintParseError;
use crate::guard::{GuardExpression, GuardParser, GuardRegistry};
use crate::pattern::{Pattern, PatternKind};
use crate::rule::{ImportDirective, RewriteAlternative, TransformationRule};

const IMPORT_KEYWORDS: &[&str] = &[
    "addImport",
    "removeImport",
    "addStaticImport",
    "removeStaticImport",
    "replaceStaticImport",
];

/// Parses hint file text. Guard calls are checked against the parser's
/// guard registry, so a file using custom guards must be parsed with a
/// registry that knows them.
#[derive(Debug, Clone, Default)]
pub struct HintFileParser {
    guards: GuardRegistry,
}

impl HintFileParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(guards: GuardRegistry) -> Self {
        Self { guards }
    }

    pub fn parse(&self, content: &str) -> Result<HintFile, HintParseError> {
        if content.trim().is_empty() {
            return Err(HintParseError::new("Hint file content is empty"));
        }
        let lines = strip_comments(content)?;
        let mut file = HintFile::new();
        let mut pending: Vec<(usize, String)> = Vec::new();

        for (idx, raw) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if pending.is_empty() && line.starts_with("<!") {
                parse_directive(&mut file, line, line_no)?;
                continue;
            }
            if let Some(body) = line.strip_suffix(";;") {
                let body = body.trim_end();
                if !body.is_empty() {
                    pending.push((line_no, body.to_string()));
                }
                if !pending.is_empty() {
                    file.add_rule(self.parse_rule(&pending)?);
                    pending.clear();
                }
                continue;
            }
            pending.push((line_no, line.to_string()));
        }

        if let Some((first, _)) = pending.first() {
            return Err(HintParseError::at(
                format!("Rule starting at line {first} is missing ';;' terminator"),
                *first,
            ));
        }
        Ok(file)
    }

    fn parse_guard(&self, text: &str, line_no: usize) -> Result<GuardExpression, HintParseError> {
        GuardParser::new(&self.guards)
            .parse(text)
            .map_err(|e| HintParseError::at(e.to_string(), line_no))
    }

    fn parse_rule(&self, lines: &[(usize, String)]) -> Result<TransformationRule, HintParseError> {
        let (first_no, first) = &lines[0];
        let mut body = lines;
        let mut description = None;
        if first.len() >= 3 && first.starts_with('"') && first.ends_with("\":") {
            description = Some(first[1..first.len() - 2].to_string());
            body = &lines[1..];
            if body.is_empty() {
                return Err(HintParseError::at("Rule has description but no pattern", *first_no));
            }
        }

        let mut source: Option<(String, Option<GuardExpression>)> = None;
        let mut alternatives = Vec::new();
        let mut imports = ImportDirective::new();

        for (line_no, text) in body {
            let line_no = *line_no;
            let mut segments = split_top_level(text, "=>");
            let head = segments.remove(0);
            let head = head.trim();
            if !head.is_empty() {
                if starts_with_import_keyword(head) {
                    parse_imports(head, &mut imports, line_no)?;
                } else if source.is_none() {
                    let (pattern, guard) = split_guard(head);
                    let guard = match guard {
                        Some(g) => Some(self.parse_guard(&g, line_no)?),
                        None => None,
                    };
                    source = Some((pattern, guard));
                } else {
                    return Err(HintParseError::at(
                        format!("Expected '=>' or ';;' but found: {head}"),
                        line_no,
                    ));
                }
            } else if source.is_none() {
                return Err(HintParseError::at("Rule has no source pattern", line_no));
            }

            for segment in segments {
                let (alternative, tail) = split_import_tail(&segment);
                if let Some(tail) = tail {
                    parse_imports(&tail, &mut imports, line_no)?;
                }
                let (replacement, guard) = split_guard(&alternative);
                if replacement.is_empty() {
                    return Err(HintParseError::at("Empty replacement after '=>'", line_no));
                }
                let guard = match guard.as_deref() {
                    None | Some("otherwise") => None,
                    Some(g) => Some(self.parse_guard(g, line_no)?),
                };
                alternatives.push(RewriteAlternative {
                    replacement: Some(replacement),
                    guard,
                });
            }
        }

        let Some((pattern_text, source_guard)) = source else {
            return Err(HintParseError::at("Rule has no source pattern", *first_no));
        };
        if imports.is_empty() {
            for alternative in &alternatives {
                if let Some(replacement) = &alternative.replacement {
                    imports.merge(&ImportDirective::detect_in(replacement));
                }
            }
        }

        let kind = PatternKind::infer(&pattern_text);
        Ok(TransformationRule {
            description,
            source_pattern: Pattern::new(pattern_text, kind),
            source_guard,
            alternatives,
            import_directive: (!imports.is_empty()).then_some(imports),
        })
    }
}

fn parse_directive(file: &mut HintFile, line: &str, line_no: usize) -> Result<(), HintParseError> {
    let inner = line
        .strip_prefix("<!")
        .and_then(|l| l.strip_suffix('>'))
        .ok_or_else(|| {
            HintParseError::at(format!("Invalid metadata directive (missing '>'): {line}"), line_no)
        })?;
    let (key, value) = inner.split_once(':').ok_or_else(|| {
        HintParseError::at(format!("Invalid metadata directive (missing ':'): {line}"), line_no)
    })?;
    let value = value.trim();
    match key.trim() {
        "id" => file.id = Some(value.to_string()),
        "description" => file.description = Some(value.to_string()),
        "severity" => file.severity = value.to_string(),
        "minJavaVersion" => {
            let version = value
                .strip_prefix("1.")
                .unwrap_or(value)
                .parse()
                .map_err(|_| HintParseError::at(format!("Invalid minJavaVersion: {value}"), line_no))?;
            file.min_java_version = Some(version);
        }
        "tags" => {
            file.tags = split_list(value);
        }
        "include" => file.includes.extend(split_list(value)),
        other => {
            return Err(HintParseError::at(format!("Unknown directive: {other}"), line_no));
        }
    }
    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn starts_with_import_keyword(text: &str) -> bool {
    let word = text.split_whitespace().next().unwrap_or("");
    IMPORT_KEYWORDS.contains(&word)
}

/// `addImport a.B removeImport c.D ...`
fn parse_imports(
    text: &str,
    imports: &mut ImportDirective,
    line_no: usize,
) -> Result<(), HintParseError> {
    let mut words = text.split_whitespace();
    while let Some(keyword) = words.next() {
        let mut operand = || {
            words.next().ok_or_else(|| {
                HintParseError::at(format!("Missing type name after '{keyword}'"), line_no)
            })
        };
        match keyword {
            "addImport" => imports.add_import(operand()?),
            "removeImport" => imports.remove_import(operand()?),
            "addStaticImport" => imports.add_static_import(operand()?),
            "removeStaticImport" => imports.remove_static_import(operand()?),
            "replaceStaticImport" => {
                let old = operand()?;
                let new = operand()?;
                imports.replace_static_import(old, new);
            }
            other => {
                return Err(HintParseError::at(
                    format!("Unexpected '{other}' in import directives"),
                    line_no,
                ));
            }
        }
    }
    Ok(())
}

/// Byte offsets of `needle` outside string and character literals. Every
/// offset falls on a char boundary.
fn top_level_positions(text: &str, needle: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices();
    while let Some((i, ch)) = chars.next() {
        match quote {
            Some(q) => {
                if ch == '\\' {
                    chars.next();
                } else if ch == q {
                    quote = None;
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                } else if text[i..].starts_with(needle) {
                    positions.push(i);
                    for _ in 1..needle.chars().count() {
                        chars.next();
                    }
                }
            }
        }
    }
    positions
}

fn split_top_level(text: &str, separator: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in top_level_positions(text, separator) {
        parts.push(text[start..pos].to_string());
        start = pos + separator.len();
    }
    parts.push(text[start..].to_string());
    parts
}

/// Split `text :: guard`. A `::` glued on both sides is a method
/// reference, not a guard separator.
fn split_guard(text: &str) -> (String, Option<String>) {
    let bytes = text.as_bytes();
    for pos in top_level_positions(text, "::") {
        let before = pos.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(pos + 2).copied();
        let spaced = before.is_none_or(|b| b.is_ascii_whitespace())
            || after.is_none_or(|b| b.is_ascii_whitespace());
        if spaced {
            let guard = text[pos + 2..].trim().to_string();
            return (text[..pos].trim().to_string(), Some(guard));
        }
    }
    (text.trim().to_string(), None)
}

/// Split a trailing run of import directives off a replacement.
fn split_import_tail(text: &str) -> (String, Option<String>) {
    let cut = IMPORT_KEYWORDS
        .iter()
        .flat_map(|kw| top_level_positions(text, kw))
        .filter(|&pos| {
            let preceded = pos == 0 || text.as_bytes()[pos - 1].is_ascii_whitespace();
            preceded && starts_with_import_keyword(&text[pos..])
        })
        .min();
    match cut {
        Some(pos) => (text[..pos].trim().to_string(), Some(text[pos..].trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

/// Remove `//` and `/* */` comments outside literals, keeping one output
/// line per input line so line numbers stay meaningful. A string or
/// character literal left open at the end of a line is an error, except on
/// `<!...>` directive lines whose free text may hold apostrophes.
fn strip_comments(content: &str) -> Result<Vec<String>, HintParseError> {
    let mut lines = Vec::new();
    let mut in_block = false;
    for (index, raw) in content.lines().enumerate() {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.char_indices().peekable();
        let mut quote: Option<char> = None;
        while let Some((_, ch)) = chars.next() {
            if in_block {
                if ch == '*' && chars.peek().is_some_and(|&(_, n)| n == '/') {
                    chars.next();
                    in_block = false;
                }
                continue;
            }
            if let Some(q) = quote {
                out.push(ch);
                if ch == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                } else if ch == q {
                    quote = None;
                }
                continue;
            }
            match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '/' if chars.peek().is_some_and(|&(_, n)| n == '/') => break,
                '/' if chars.peek().is_some_and(|&(_, n)| n == '*') => {
                    chars.next();
                    in_block = true;
                }
                _ => out.push(ch),
            }
        }
        if let Some(q) = quote {
            if !raw.trim_start().starts_with("<!") {
                return Err(HintParseError::at(format!("Unterminated {q} literal"), index + 1));
            }
        }
        lines.push(out);
    }
    Ok(lines)
}

/// Write `file` back out in the hint file format.
pub fn render(file: &HintFile) -> String {
    let mut out = String::new();
    if let Some(id) = &file.id {
        out.push_str(&format!("<!id: {id}>\n"));
    }
    if let Some(description) = &file.description {
        out.push_str(&format!("<!description: {description}>\n"));
    }
    out.push_str(&format!("<!severity: {}>\n", file.severity));
    if let Some(version) = file.min_java_version {
        out.push_str(&format!("<!minJavaVersion: {version}>\n"));
    }
    if !file.tags.is_empty() {
        out.push_str(&format!("<!tags: {}>\n", file.tags.join(", ")));
    }
    for include in &file.includes {
        out.push_str(&format!("<!include: {include}>\n"));
    }
    for rule in &file.rules {
        out.push('\n');
        if let Some(description) = &rule.description {
            out.push_str(&format!("\"{description}\":\n"));
        }
        out.push_str(rule.source_pattern.value());
        if let Some(guard) = &rule.source_guard {
            out.push_str(&format!(" :: {guard}"));
        }
        out.push('\n');
        for alternative in &rule.alternatives {
            let Some(replacement) = &alternative.replacement else {
                continue;
            };
            out.push_str(&format!("=> {replacement}"));
            if let Some(guard) = &alternative.guard {
                out.push_str(&format!(" :: {guard}"));
            }
            out.push('\n');
        }
        if let Some(imports) = &rule.import_directive {
            for line in imports.directive_lines() {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out.push_str(";;\n");
    }
    out
}
