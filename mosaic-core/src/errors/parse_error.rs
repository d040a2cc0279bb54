//! Parser errors. Fatal for the owning task; other tasks proceed.

use super::error_code::MosaicErrorCode;

/// Errors from the language parsers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("unsupported language tag: {tag}")]
    UnsupportedLanguage { tag: String },

    #[error("source is empty")]
    EmptySource,

    #[error("grammar failed to load for {language}: {message}")]
    GrammarUnavailable { language: String, message: String },
}

impl MosaicErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "PARSE_SYNTAX_ERROR",
            Self::UnsupportedLanguage { .. } => "PARSE_UNSUPPORTED_LANGUAGE",
            Self::EmptySource => "PARSE_EMPTY_SOURCE",
            Self::GrammarUnavailable { .. } => "PARSE_GRAMMAR_UNAVAILABLE",
        }
    }
}
