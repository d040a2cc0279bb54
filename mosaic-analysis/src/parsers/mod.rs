//! Language parsers producing the simplified structural AST the decomposer
//! and dependency analyzer consume.

pub mod cache;
pub mod languages;
pub mod manager;
pub mod traits;
pub mod types;

pub use manager::ParserManager;
pub use traits::LanguageParser;
pub use types::{AstNode, AstNodeKind, AtomAst};

/// xxh3 content hash used for cache keys and idempotent persistence keys.
pub fn hash_content(content: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(content)
}
