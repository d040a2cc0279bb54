//! Python parser.

use mosaic_core::errors::ParseError;
use mosaic_core::model::task::Language;

use super::{parse_with_spec, BindingRule, LanguageSpec};
use crate::parsers::traits::LanguageParser;
use crate::parsers::types::AtomAst;

static SPEC: LanguageSpec = LanguageSpec {
    language: Language::Python,
    module_kinds: &["module"],
    class_kinds: &["class_definition"],
    function_kinds: &["function_definition", "lambda"],
    block_kinds: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "try_statement",
        "with_statement",
        "match_statement",
    ],
    import_kinds: &["import_statement", "import_from_statement", "future_import_statement"],
    transparent_kinds: &["block"],
    clause_kinds: &[
        "decorated_definition",
        "elif_clause",
        "else_clause",
        "except_clause",
        "finally_clause",
        "case_clause",
    ],
    decision_kinds: &[
        "if_statement",
        "elif_clause",
        "for_statement",
        "while_statement",
        "except_clause",
        "case_clause",
        "conditional_expression",
        "boolean_operator",
    ],
    identifier_kinds: &["identifier"],
    call_kinds: &["call"],
    binding_rules: &[
        BindingRule { kind: "assignment", field: "left" },
        BindingRule { kind: "named_expression", field: "name" },
    ],
    local_rules: &[
        BindingRule { kind: "function_definition", field: "parameters" },
        BindingRule { kind: "lambda", field: "parameters" },
        BindingRule { kind: "for_statement", field: "left" },
    ],
    dynamic_markers: &[
        "eval",
        "exec",
        "getattr",
        "setattr",
        "delattr",
        "globals",
        "locals",
        "vars",
        "__import__",
    ],
    builtins: &[
        "self", "cls", "print", "len", "range", "str", "int", "float", "bool", "list",
        "dict", "set", "tuple", "sum", "min", "max", "abs", "round", "enumerate", "zip",
        "map", "filter", "sorted", "reversed", "isinstance", "issubclass", "super",
        "hasattr", "repr", "type", "iter", "next", "open", "Exception", "ValueError",
        "TypeError", "KeyError", "IndexError", "RuntimeError", "StopIteration",
        "NotImplementedError", "ZeroDivisionError",
    ],
};

/// Parser for Python sources.
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse(&self, source: &str) -> Result<AtomAst, ParseError> {
        parse_with_spec(source, &SPEC, tree_sitter_python::LANGUAGE.into())
    }
}
