//! TypeScript parser.

use mosaic_core::errors::ParseError;
use mosaic_core::model::task::Language;

use super::{parse_with_spec, BindingRule, LanguageSpec};
use crate::parsers::traits::LanguageParser;
use crate::parsers::types::AtomAst;

static SPEC: LanguageSpec = LanguageSpec {
    language: Language::TypeScript,
    module_kinds: &["program"],
    class_kinds: &[
        "class_declaration",
        "abstract_class_declaration",
        "interface_declaration",
        "enum_declaration",
        "type_alias_declaration",
    ],
    function_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
        "arrow_function",
    ],
    block_kinds: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "switch_statement",
        "try_statement",
    ],
    import_kinds: &["import_statement"],
    transparent_kinds: &["statement_block", "class_body", "export_statement", "switch_body"],
    clause_kinds: &["else_clause", "catch_clause", "finally_clause"],
    decision_kinds: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "switch_case",
        "catch_clause",
        "ternary_expression",
        "&&",
        "||",
    ],
    identifier_kinds: &["identifier", "type_identifier", "shorthand_property_identifier"],
    call_kinds: &["call_expression", "new_expression"],
    binding_rules: &[BindingRule { kind: "variable_declarator", field: "name" }],
    local_rules: &[
        BindingRule { kind: "function_declaration", field: "parameters" },
        BindingRule { kind: "generator_function_declaration", field: "parameters" },
        BindingRule { kind: "method_definition", field: "parameters" },
        BindingRule { kind: "arrow_function", field: "parameters" },
        BindingRule { kind: "arrow_function", field: "parameter" },
        BindingRule { kind: "for_in_statement", field: "left" },
    ],
    dynamic_markers: &["eval", "Function"],
    builtins: &[
        "console", "Math", "JSON", "Object", "Array", "String", "Number", "Boolean",
        "Promise", "Error", "TypeError", "RangeError", "SyntaxError", "Map", "Set",
        "WeakMap", "WeakSet", "Date", "RegExp", "Symbol", "Proxy", "Reflect",
        "parseInt", "parseFloat", "isNaN", "isFinite", "NaN", "Infinity", "undefined",
        "globalThis", "require", "module", "exports", "window", "document", "structuredClone",
    ],
};

/// Parser for TypeScript sources.
pub struct TypeScriptParser;

impl TypeScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for TypeScriptParser {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn parse(&self, source: &str) -> Result<AtomAst, ParseError> {
        parse_with_spec(
            source,
            &SPEC,
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        )
    }
}
