//! The parser seam.

use mosaic_core::errors::ParseError;
use mosaic_core::model::task::Language;

use super::types::AtomAst;

/// A per-language parser. Implementations are stateless aside from grammar
/// handles and are safe to share across rayon workers.
pub trait LanguageParser: Send + Sync {
    fn language(&self) -> Language;

    /// Parse source into the structural AST. A tree with error nodes still
    /// returns `Ok` with `has_errors = true`; only unparseable input or a
    /// missing grammar is an `Err`.
    fn parse(&self, source: &str) -> Result<AtomAst, ParseError>;
}
