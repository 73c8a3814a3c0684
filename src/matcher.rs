//! Placeholder-aware structural matching.
//!
//! A template node matches a candidate when both have the same kind, the
//! same keywords/operators and pairwise matching named children. Template
//! identifiers that are placeholders capture the candidate subtree instead
//! of comparing it. A placeholder used twice must capture equal subtrees.

use std::collections::BTreeMap;

use crate::parse::kinds;
use crate::parse::node::subtree_eq;
use crate::parse::AstNode;
use crate::pattern::{is_placeholder, is_variadic, ParsedPattern};

/// What a placeholder captured.
#[derive(Debug, Clone)]
pub enum Binding<'a> {
    Node(AstNode<'a>),
    List(Vec<AstNode<'a>>),
}

impl<'a> Binding<'a> {
    pub fn as_node(&self) -> Option<AstNode<'a>> {
        match self {
            Binding::Node(n) => Some(*n),
            Binding::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AstNode<'a>]> {
        match self {
            Binding::Node(_) => None,
            Binding::List(items) => Some(items),
        }
    }

    /// The captured nodes, one for a single binding.
    pub fn nodes(&self) -> Vec<AstNode<'a>> {
        match self {
            Binding::Node(n) => vec![*n],
            Binding::List(items) => items.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Binding::List(items) if items.is_empty())
    }

    /// Source text of the capture. Lists of statements are joined with a
    /// space, other lists with `", "`.
    pub fn text(&self) -> String {
        match self {
            Binding::Node(n) => n.text().trim().to_string(),
            Binding::List(items) => {
                let sep = if items.iter().all(|n| n.is_statement()) && !items.is_empty() {
                    " "
                } else {
                    ", "
                };
                items
                    .iter()
                    .map(|n| n.text().trim())
                    .collect::<Vec<_>>()
                    .join(sep)
            }
        }
    }
}

/// Placeholder name to captured subtree(s), ordered by name.
pub type Bindings<'a> = BTreeMap<String, Binding<'a>>;

/// Name of the wildcard placeholder; matches anything and binds nothing.
pub const WILDCARD: &str = "$_";

/// One matching attempt against one template.
///
/// Create a fresh matcher per candidate; a failed attempt may leave
/// partial bindings behind.
pub struct PlaceholderMatcher<'p, 'a> {
    pattern: &'p ParsedPattern,
    bindings: Bindings<'a>,
}

impl<'p, 'a> PlaceholderMatcher<'p, 'a> {
    pub fn new(pattern: &'p ParsedPattern) -> Self {
        Self {
            pattern,
            bindings: Bindings::new(),
        }
    }

    pub fn bindings(&self) -> &Bindings<'a> {
        &self.bindings
    }

    pub fn into_bindings(self) -> Bindings<'a> {
        self.bindings
    }

    /// Match the pattern's template against `candidate`.
    pub fn matches(&mut self, candidate: AstNode<'a>) -> bool {
        let template = self.pattern.template();
        self.match_node(template, candidate)
    }

    pub fn match_node(&mut self, t: AstNode<'p>, c: AstNode<'a>) -> bool {
        if let Some(name) = placeholder_of(&t) {
            return self.bind(name, c);
        }
        if let Some(name) = statement_placeholder(&t) {
            if c.kind() != "expression_statement" && c.is_statement() {
                return self.bind(name, c);
            }
        }
        if t.kind() != c.kind() && !(kinds::is_block(t.kind()) && kinds::is_block(c.kind())) {
            return false;
        }
        match t.kind() {
            "modifiers" => self.match_modifiers(t, c),
            "marker_annotation" | "annotation" => self.match_annotation(t, c),
            "field_declaration" => self.match_field(t, c),
            "method_declaration" => self.match_method_declaration(t, c),
            _ => self.match_generic(t, c),
        }
    }

    fn match_generic(&mut self, t: AstNode<'p>, c: AstNode<'a>) -> bool {
        let tc = t.named_children();
        let cc = c.named_children();
        if tc.is_empty() && cc.is_empty() {
            return t.text() == c.text();
        }
        if t.tokens() != c.tokens() {
            return false;
        }
        self.match_sequence(&tc, &cc)
    }

    /// Match sibling lists. The first variadic marker absorbs whatever the
    /// fixed items before and after it leave over; later markers in the
    /// same list capture nothing.
    fn match_sequence(&mut self, tc: &[AstNode<'p>], cc: &[AstNode<'a>]) -> bool {
        let Some(v) = tc.iter().position(|n| variadic_name(n).is_some()) else {
            return tc.len() == cc.len()
                && tc.iter().zip(cc).all(|(t, c)| self.match_node(*t, *c));
        };
        let Some(name) = variadic_name(&tc[v]) else {
            return false;
        };
        let before = &tc[..v];
        let mut after = Vec::new();
        let mut extra = Vec::new();
        for node in &tc[v + 1..] {
            match variadic_name(node) {
                Some(n) => extra.push(n),
                None => after.push(*node),
            }
        }
        if cc.len() < before.len() + after.len() {
            return false;
        }
        let tail = cc.len() - after.len();
        if !before.iter().zip(cc).all(|(t, c)| self.match_node(*t, *c)) {
            return false;
        }
        if !after.iter().zip(&cc[tail..]).all(|(t, c)| self.match_node(*t, *c)) {
            return false;
        }
        if !self.bind_list(name, cc[before.len()..tail].to_vec()) {
            return false;
        }
        extra.into_iter().all(|n| self.bind_list(n, Vec::new()))
    }

    /// Every keyword and annotation in the template must be present in the
    /// candidate; the candidate may carry more.
    fn match_modifiers(&mut self, t: AstNode<'p>, c: AstNode<'a>) -> bool {
        let c_tokens = c.tokens();
        if !t.tokens().iter().all(|tok| c_tokens.contains(tok)) {
            return false;
        }
        let c_annotations = c.named_children();
        for ta in t.named_children() {
            let mut found = false;
            for ca in &c_annotations {
                let mut trial = self.fork();
                if trial.match_node(ta, *ca) {
                    self.bindings = trial.bindings;
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    fn match_annotation(&mut self, t: AstNode<'p>, c: AstNode<'a>) -> bool {
        let (Some(tn), Some(cn)) = (t.child_by_field("name"), c.child_by_field("name")) else {
            return false;
        };
        let names_match = match placeholder_of(&tn) {
            Some(name) => self.bind(name, cn),
            None => type_names_match(tn.text(), cn.text()),
        };
        if !names_match {
            return false;
        }
        if t.kind() == "marker_annotation" {
            return true;
        }
        let tv = t.child_by_field("arguments").map(|a| a.named_children()).unwrap_or_default();
        let cv = c.child_by_field("arguments").map(|a| a.named_children()).unwrap_or_default();
        let pairs = !tv.is_empty() && tv.iter().all(|n| n.kind() == "element_value_pair");
        if !pairs {
            return self.match_sequence(&tv, &cv);
        }
        if tv.len() != cv.len() {
            return false;
        }
        for tp in &tv {
            let key = tp.child_by_field("key").map(|k| k.text());
            let counterpart = cv.iter().find(|cp| {
                cp.kind() == "element_value_pair" && cp.child_by_field("key").map(|k| k.text()) == key
            });
            let (Some(cp), Some(t_value)) = (counterpart, tp.child_by_field("value")) else {
                return false;
            };
            match cp.child_by_field("value") {
                Some(c_value) if self.match_node(t_value, c_value) => {}
                _ => return false,
            }
        }
        true
    }

    fn match_field(&mut self, t: AstNode<'p>, c: AstNode<'a>) -> bool {
        if !self.match_optional_modifiers(t, c) {
            return false;
        }
        match (t.child_by_field("type"), c.child_by_field("type")) {
            (Some(tt), Some(ct)) if self.match_node(tt, ct) => {}
            _ => return false,
        }
        let td = declarators(&t);
        let cd = declarators(&c);
        if td.len() != cd.len() {
            return false;
        }
        for (tv, cv) in td.iter().zip(&cd) {
            match (tv.child_by_field("name"), cv.child_by_field("name")) {
                (Some(tn), Some(cn)) if self.match_node(tn, cn) => {}
                _ => return false,
            }
            if let Some(t_init) = tv.child_by_field("value") {
                match cv.child_by_field("value") {
                    Some(c_init) if self.match_node(t_init, c_init) => {}
                    _ => return false,
                }
            }
        }
        true
    }

    fn match_method_declaration(&mut self, t: AstNode<'p>, c: AstNode<'a>) -> bool {
        if !self.match_optional_modifiers(t, c) {
            return false;
        }
        for field in ["type", "name", "parameters"] {
            match (t.child_by_field(field), c.child_by_field(field)) {
                (Some(tf), Some(cf)) if self.match_node(tf, cf) => {}
                _ => return false,
            }
        }
        if let Some(tp) = t.child_by_field("type_parameters") {
            match c.child_by_field("type_parameters") {
                Some(cp) if self.match_node(tp, cp) => {}
                _ => return false,
            }
        }
        // An empty template body stands for any body.
        match t.child_by_field("body") {
            Some(tb) if !tb.named_children().is_empty() => match c.child_by_field("body") {
                Some(cb) => self.match_node(tb, cb),
                None => false,
            },
            _ => true,
        }
    }

    fn match_optional_modifiers(&mut self, t: AstNode<'p>, c: AstNode<'a>) -> bool {
        let tm = first_child(&t, "modifiers");
        let cm = first_child(&c, "modifiers");
        match (tm, cm) {
            (None, _) => true,
            (Some(tm), Some(cm)) => self.match_modifiers(tm, cm),
            (Some(tm), None) => tm.tokens().is_empty() && tm.named_children().is_empty(),
        }
    }

    fn bind(&mut self, name: &str, c: AstNode<'a>) -> bool {
        if name == WILDCARD {
            return true;
        }
        if let Some(constraint) = self.pattern.constraint(name) {
            if !kinds::satisfies_constraint(c.kind(), constraint) {
                return false;
            }
        }
        match self.bindings.get(name) {
            Some(Binding::Node(prev)) => subtree_eq(prev, &c),
            Some(Binding::List(_)) => false,
            None => {
                self.bindings.insert(name.to_string(), Binding::Node(c));
                true
            }
        }
    }

    fn bind_list(&mut self, name: &str, items: Vec<AstNode<'a>>) -> bool {
        if let Some(constraint) = self.pattern.constraint(name) {
            if !items.iter().all(|n| kinds::satisfies_constraint(n.kind(), constraint)) {
                return false;
            }
        }
        match self.bindings.get(name) {
            Some(Binding::List(prev)) => {
                prev.len() == items.len() && prev.iter().zip(&items).all(|(a, b)| subtree_eq(a, b))
            }
            Some(Binding::Node(_)) => false,
            None => {
                self.bindings.insert(name.to_string(), Binding::List(items));
                true
            }
        }
    }

    fn fork(&self) -> Self {
        Self {
            pattern: self.pattern,
            bindings: self.bindings.clone(),
        }
    }
}

/// Placeholder name if `node` is a placeholder identifier.
fn placeholder_of<'n>(node: &AstNode<'n>) -> Option<&'n str> {
    if matches!(node.kind(), "identifier" | "type_identifier") && is_placeholder(node.text()) {
        Some(node.text())
    } else {
        None
    }
}

/// `$s;` in statement position.
fn statement_placeholder<'n>(node: &AstNode<'n>) -> Option<&'n str> {
    if node.kind() != "expression_statement" {
        return None;
    }
    match node.named_children().as_slice() {
        [only] => placeholder_of(only).filter(|n| !is_variadic(n)),
        _ => None,
    }
}

/// Variadic marker name: `$args$` as an argument, `$stmts$;` as a
/// statement, or `Object... $params$` as a parameter.
fn variadic_name<'n>(node: &AstNode<'n>) -> Option<&'n str> {
    match node.kind() {
        "identifier" if is_variadic(node.text()) => Some(node.text()),
        "expression_statement" => match node.named_children().as_slice() {
            [only] if only.kind() == "identifier" && is_variadic(only.text()) => Some(only.text()),
            _ => None,
        },
        "spread_parameter" => node
            .descendants()
            .into_iter()
            .find(|d| d.kind() == "identifier" && is_variadic(d.text()))
            .map(|d| d.text()),
        _ => None,
    }
}

fn declarators<'n>(node: &AstNode<'n>) -> Vec<AstNode<'n>> {
    node.named_children()
        .into_iter()
        .filter(|c| c.kind() == "variable_declarator")
        .collect()
}

fn first_child<'n>(node: &AstNode<'n>, kind: &str) -> Option<AstNode<'n>> {
    node.named_children().into_iter().find(|c| c.kind() == kind)
}

/// `Deprecated` and `java.lang.Deprecated` name the same type.
pub fn type_names_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let simple = |s: &str| s.rsplit('.').next().unwrap_or(s).to_string();
    (!a.contains('.') || !b.contains('.')) && simple(a) == simple(b)
}
