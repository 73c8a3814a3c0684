//! Node-kind tables for the tree-sitter Java grammar.

pub const LITERAL_KINDS: &[&str] = &[
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
    "character_literal",
    "string_literal",
    "text_block",
    "true",
    "false",
    "null_literal",
];

pub const NUMBER_KINDS: &[&str] = &[
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
];

const EXPRESSION_KINDS: &[&str] = &[
    "assignment_expression",
    "binary_expression",
    "instanceof_expression",
    "lambda_expression",
    "ternary_expression",
    "update_expression",
    "unary_expression",
    "cast_expression",
    "switch_expression",
    "class_literal",
    "this",
    "super",
    "identifier",
    "parenthesized_expression",
    "object_creation_expression",
    "field_access",
    "array_access",
    "method_invocation",
    "method_reference",
    "array_creation_expression",
    "template_expression",
];

const STATEMENT_KINDS: &[&str] = &[
    "expression_statement",
    "local_variable_declaration",
    "labeled_statement",
    "if_statement",
    "while_statement",
    "for_statement",
    "enhanced_for_statement",
    "block",
    "assert_statement",
    "do_statement",
    "break_statement",
    "continue_statement",
    "return_statement",
    "yield_statement",
    "synchronized_statement",
    "throw_statement",
    "try_statement",
    "try_with_resources_statement",
    "switch_expression",
    "local_class_declaration",
];

const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub fn is_literal(kind: &str) -> bool {
    LITERAL_KINDS.contains(&kind)
}

pub fn is_expression(kind: &str) -> bool {
    EXPRESSION_KINDS.contains(&kind) || is_literal(kind)
}

pub fn is_statement(kind: &str) -> bool {
    STATEMENT_KINDS.contains(&kind) || kind == "class_declaration"
}

/// Brace-delimited statement lists. Constructor bodies are their own kind.
pub fn is_block(kind: &str) -> bool {
    matches!(kind, "block" | "constructor_body")
}

pub fn is_type_declaration(kind: &str) -> bool {
    TYPE_DECLARATION_KINDS.contains(&kind)
}

/// Members that can carry modifiers and annotations.
pub fn is_body_declaration(kind: &str) -> bool {
    is_type_declaration(kind)
        || matches!(
            kind,
            "method_declaration"
                | "constructor_declaration"
                | "compact_constructor_declaration"
                | "field_declaration"
                | "annotation_type_element_declaration"
                | "enum_constant"
        )
}

pub fn is_annotation(kind: &str) -> bool {
    matches!(kind, "marker_annotation" | "annotation")
}

pub fn is_type(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "scoped_type_identifier"
            | "generic_type"
            | "array_type"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
            | "void_type"
    )
}

/// Node kinds satisfying a type constraint such as `StringLiteral` or
/// `MethodInvocation`.
///
/// Unknown names fall back to the snake-cased constraint, so
/// `BinaryExpression` matches `binary_expression`.
pub fn satisfies_constraint(kind: &str, constraint: &str) -> bool {
    match constraint {
        "StringLiteral" => matches!(kind, "string_literal" | "text_block"),
        "NumberLiteral" => NUMBER_KINDS.contains(&kind),
        "CharacterLiteral" => kind == "character_literal",
        "BooleanLiteral" => matches!(kind, "true" | "false"),
        "NullLiteral" => kind == "null_literal",
        "TypeLiteral" => kind == "class_literal",
        "Literal" => is_literal(kind),
        "SimpleName" | "Name" if kind == "identifier" => true,
        "QualifiedName" | "Name" => matches!(kind, "scoped_identifier" | "field_access"),
        "MethodInvocation" => kind == "method_invocation",
        "ClassInstanceCreation" => kind == "object_creation_expression",
        "InfixExpression" => kind == "binary_expression",
        "PrefixExpression" => matches!(kind, "unary_expression" | "update_expression"),
        "PostfixExpression" => kind == "update_expression",
        "ConditionalExpression" => kind == "ternary_expression",
        "Assignment" => kind == "assignment_expression",
        "CastExpression" => kind == "cast_expression",
        "InstanceofExpression" => kind == "instanceof_expression",
        "LambdaExpression" => kind == "lambda_expression",
        "ArrayCreation" => kind == "array_creation_expression",
        "ThisExpression" => kind == "this",
        "Expression" => is_expression(kind),
        "Statement" => is_statement(kind),
        "Annotation" => is_annotation(kind),
        "Type" => is_type(kind),
        other => kind == camel_to_snake(other),
    }
}

fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_kinds_are_expressions() {
        for kind in LITERAL_KINDS {
            assert!(is_expression(kind), "{kind}");
        }
    }

    #[test]
    fn named_constraints() {
        assert!(satisfies_constraint("string_literal", "StringLiteral"));
        assert!(!satisfies_constraint("decimal_integer_literal", "StringLiteral"));
        assert!(satisfies_constraint("hex_integer_literal", "NumberLiteral"));
        assert!(satisfies_constraint("identifier", "SimpleName"));
        assert!(satisfies_constraint("method_invocation", "Expression"));
        assert!(!satisfies_constraint("return_statement", "Expression"));
        assert!(satisfies_constraint("return_statement", "Statement"));
    }

    #[test]
    fn unknown_constraint_falls_back_to_snake_case() {
        assert!(satisfies_constraint("binary_expression", "BinaryExpression"));
        assert!(satisfies_constraint("field_access", "FieldAccess"));
        assert!(!satisfies_constraint("identifier", "FieldAccess"));
    }
}
