//! ParserManager — routes sources to the correct language parser.

use mosaic_core::errors::ParseError;
use mosaic_core::model::task::Language;

use super::cache::ParseCache;
use super::hash_content;
use super::languages::python::PythonParser;
use super::languages::rust_lang::RustParser;
use super::languages::typescript::TypeScriptParser;
use super::traits::LanguageParser;
use super::types::AtomAst;

/// Manages all language parsers and the parse cache.
pub struct ParserManager {
    cache: ParseCache,
    python: PythonParser,
    typescript: TypeScriptParser,
    rust_parser: RustParser,
}

impl ParserManager {
    /// Create a new ParserManager with default cache capacity.
    pub fn new() -> Self {
        Self {
            cache: ParseCache::default(),
            python: PythonParser::new(),
            typescript: TypeScriptParser::new(),
            rust_parser: RustParser::new(),
        }
    }

    /// Create a new ParserManager with a specific cache capacity.
    pub fn with_cache_capacity(capacity: u64) -> Self {
        Self {
            cache: ParseCache::new(capacity),
            ..Self::new()
        }
    }

    /// Get the parser for a given language.
    fn parser_for(&self, lang: Language) -> &dyn LanguageParser {
        match lang {
            Language::Python => &self.python,
            Language::TypeScript => &self.typescript,
            Language::Rust => &self.rust_parser,
        }
    }

    /// Parse a source with a known language, using the cache if available.
    pub fn parse(&self, source: &str, lang: Language) -> Result<AtomAst, ParseError> {
        let content_hash = hash_content(source.as_bytes());

        if let Some(cached) = self.cache.get(content_hash, lang) {
            return Ok(cached);
        }

        let ast = self.parser_for(lang).parse(source)?;
        self.cache.insert(content_hash, lang, ast.clone());
        Ok(ast)
    }

    /// Syntax gate: true when the source parses without error nodes.
    pub fn parses_cleanly(&self, source: &str, lang: Language) -> bool {
        self.parse(source, lang)
            .map(|ast| !ast.has_errors)
            .unwrap_or(false)
    }

    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new()
    }
}
