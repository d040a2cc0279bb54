//! Structural AST types.
//!
//! The decomposer operates over a closed set of node kinds; decomposition
//! rules are a total function over this enumeration, never over raw
//! grammar node names.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use mosaic_core::model::task::Language;

/// Closed set of structural node kinds shared by all languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AstNodeKind {
    /// Whole file / module scope.
    Module,
    /// Class-like container: class, struct, enum, trait, interface, impl.
    Class,
    /// Function, method, or closure with a name.
    Function,
    /// Logical block: if, loop, try, match, with.
    Block,
    /// A run of simple statements with no inner structure.
    Statement,
    /// An import / use declaration.
    Import,
}

impl AstNodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Block => "block",
            Self::Statement => "statement",
            Self::Import => "import",
        }
    }
}

/// One structural node. Lines are 1-based and inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: AstNodeKind,
    /// Declared name for classes and functions, None elsewhere.
    pub name: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    /// Non-blank lines spanned by the node.
    pub loc: u32,
    /// Cyclomatic complexity of the subtree: 1 + decision points.
    pub complexity: f64,
    /// Symbols this subtree declares.
    pub declared: SmallVec<[String; 4]>,
    /// Symbols this subtree references but does not declare.
    pub referenced: SmallVec<[String; 8]>,
    /// Names of calls made in this subtree.
    pub calls: SmallVec<[String; 4]>,
    pub children: Vec<AstNode>,
}

impl AstNode {
    /// Count of nodes in the subtree, including self.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(AstNode::subtree_size).sum::<usize>()
    }
}

/// Parse output: the structural tree plus file-level metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomAst {
    pub language: Language,
    pub root: AstNode,
    pub content_hash: u64,
    /// True when tree-sitter reported error nodes; the source does not
    /// parse cleanly.
    pub has_errors: bool,
    pub error_count: u32,
    /// Occurrences of dynamic/reflection constructs (eval, getattr, …).
    pub dynamic_marker_count: u32,
    pub parse_time_us: u64,
}

impl AtomAst {
    /// All symbols declared anywhere in the tree, deduplicated, sorted.
    pub fn declared_symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_declared(&self.root, &mut out);
        out.sort();
        out.dedup();
        out
    }

    /// All symbols referenced but not declared, deduplicated, sorted.
    pub fn referenced_symbols(&self) -> Vec<String> {
        let declared: std::collections::BTreeSet<String> =
            self.declared_symbols().into_iter().collect();
        let mut out = Vec::new();
        collect_referenced(&self.root, &mut out);
        out.sort();
        out.dedup();
        out.retain(|s| !declared.contains(s));
        out
    }
}

fn collect_declared(node: &AstNode, out: &mut Vec<String>) {
    out.extend(node.declared.iter().cloned());
    for child in &node.children {
        collect_declared(child, out);
    }
}

fn collect_referenced(node: &AstNode, out: &mut Vec<String>) {
    out.extend(node.referenced.iter().cloned());
    for child in &node.children {
        collect_referenced(child, out);
    }
}
