//! Rust parser.

use mosaic_core::errors::ParseError;
use mosaic_core::model::task::Language;

use super::{parse_with_spec, BindingRule, LanguageSpec};
use crate::parsers::traits::LanguageParser;
use crate::parsers::types::AtomAst;

static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Rust,
    module_kinds: &["source_file"],
    class_kinds: &[
        "struct_item",
        "enum_item",
        "trait_item",
        "impl_item",
        "union_item",
        "mod_item",
    ],
    function_kinds: &["function_item", "closure_expression"],
    block_kinds: &[
        "if_expression",
        "while_expression",
        "loop_expression",
        "for_expression",
        "match_expression",
        "unsafe_block",
    ],
    import_kinds: &["use_declaration"],
    transparent_kinds: &["declaration_list", "field_declaration_list", "block", "match_block"],
    clause_kinds: &["else_clause", "match_arm"],
    decision_kinds: &[
        "if_expression",
        "while_expression",
        "for_expression",
        "loop_expression",
        "match_arm",
        "&&",
        "||",
    ],
    identifier_kinds: &["identifier", "type_identifier"],
    call_kinds: &["call_expression", "macro_invocation"],
    binding_rules: &[
        BindingRule { kind: "let_declaration", field: "pattern" },
        BindingRule { kind: "const_item", field: "name" },
        BindingRule { kind: "static_item", field: "name" },
    ],
    local_rules: &[
        BindingRule { kind: "function_item", field: "parameters" },
        BindingRule { kind: "closure_expression", field: "parameters" },
        BindingRule { kind: "for_expression", field: "pattern" },
    ],
    dynamic_markers: &[],
    builtins: &[
        "self", "Self", "Vec", "String", "Box", "Rc", "Arc", "Option", "Some", "None",
        "Result", "Ok", "Err", "HashMap", "HashSet", "BTreeMap", "BTreeSet", "Default",
        "Clone", "Copy", "Debug", "PartialEq", "Eq", "Hash", "Iterator", "Into", "From",
        "usize", "isize", "u8", "u16", "u32", "u64", "i8", "i16", "i32", "i64", "f32",
        "f64", "bool", "str", "char", "println", "print", "eprintln", "format", "vec",
        "assert", "assert_eq", "assert_ne", "panic", "todo", "unimplemented", "dbg",
    ],
};

/// Parser for Rust sources.
pub struct RustParser;

impl RustParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for RustParser {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn parse(&self, source: &str) -> Result<AtomAst, ParseError> {
        parse_with_spec(source, &SPEC, tree_sitter_rust::LANGUAGE.into())
    }
}
