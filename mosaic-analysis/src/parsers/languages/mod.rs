//! Per-language parser implementations.
//!
//! Each language contributes a closed table of grammar node kinds
//! ([`LanguageSpec`]); the shared walker below maps tree-sitter trees onto
//! the structural AST through those tables and nothing else.

pub mod python;
pub mod rust_lang;
pub mod typescript;

use std::time::Instant;

use smallvec::SmallVec;
use tree_sitter::{Node, Parser};

use mosaic_core::errors::ParseError;
use mosaic_core::model::task::Language;

use super::hash_content;
use super::types::{AstNode, AstNodeKind, AtomAst};

const MAX_WALK_DEPTH: usize = 64;

/// Identifier kinds that can be *bound* (parameters, assignment targets).
/// Type identifiers are referenced, never bound, so binding extraction
/// ignores them.
const VALUE_IDENTIFIER_KINDS: &[&str] =
    &["identifier", "simple_identifier", "shorthand_property_identifier"];

/// How a grammar node binds names: the node kind plus the field holding
/// the bound pattern or identifier.
pub(crate) struct BindingRule {
    pub kind: &'static str,
    pub field: &'static str,
}

/// Closed grammar tables for one language. The walker consults nothing
/// outside these lists.
pub(crate) struct LanguageSpec {
    pub language: Language,
    pub module_kinds: &'static [&'static str],
    pub class_kinds: &'static [&'static str],
    pub function_kinds: &'static [&'static str],
    pub block_kinds: &'static [&'static str],
    pub import_kinds: &'static [&'static str],
    /// Wrapper nodes the walker descends through without emitting a node
    /// (bodies, declaration lists). Children found inside are statements.
    pub transparent_kinds: &'static [&'static str],
    /// Clause wrappers (else/elif/except/match arms): descended through
    /// like transparent nodes, but their own header expressions are
    /// skipped rather than turned into statement leaves.
    pub clause_kinds: &'static [&'static str],
    /// Node kinds counted as decision points for cyclomatic complexity.
    pub decision_kinds: &'static [&'static str],
    pub identifier_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
    /// Nodes that bind exported names (assignments, let, const).
    pub binding_rules: &'static [BindingRule],
    /// Nodes that bind purely local names (parameters, loop targets).
    pub local_rules: &'static [BindingRule],
    /// Call names that indicate dynamic / reflection-heavy source.
    pub dynamic_markers: &'static [&'static str],
    /// Ambient names never reported as unresolved references.
    pub builtins: &'static [&'static str],
}

impl LanguageSpec {
    fn classify(&self, kind: &str) -> Option<AstNodeKind> {
        if self.class_kinds.contains(&kind) {
            Some(AstNodeKind::Class)
        } else if self.function_kinds.contains(&kind) {
            Some(AstNodeKind::Function)
        } else if self.block_kinds.contains(&kind) {
            Some(AstNodeKind::Block)
        } else if self.import_kinds.contains(&kind) {
            Some(AstNodeKind::Import)
        } else {
            None
        }
    }
}

/// Shared parsing logic used by all language parsers.
pub(crate) fn parse_with_spec(
    source: &str,
    spec: &LanguageSpec,
    ts_language: tree_sitter::Language,
) -> Result<AtomAst, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::EmptySource);
    }

    let start = Instant::now();
    let bytes = source.as_bytes();

    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|e| ParseError::GrammarUnavailable {
            language: spec.language.name().to_string(),
            message: e.to_string(),
        })?;

    let tree = parser
        .parse(bytes, None)
        .ok_or_else(|| ParseError::Syntax {
            line: 0,
            column: 0,
            message: "tree-sitter returned no tree".to_string(),
        })?;

    let ts_root = tree.root_node();
    let error_count = count_errors(ts_root, 0);
    let root = build_node(ts_root, bytes, source, spec, AstNodeKind::Module, 0);

    Ok(AtomAst {
        language: spec.language,
        root,
        content_hash: hash_content(bytes),
        has_errors: error_count > 0,
        error_count,
        dynamic_marker_count: count_dynamic_markers(ts_root, bytes, spec, 0),
        parse_time_us: start.elapsed().as_micros() as u64,
    })
}

/// Occurrences of dynamic/reflection calls anywhere in the tree.
fn count_dynamic_markers(node: Node, bytes: &[u8], spec: &LanguageSpec, depth: usize) -> u32 {
    let mut count = 0;
    if spec.call_kinds.contains(&node.kind()) {
        if let Some(callee) = callee_name(node, bytes) {
            if spec.dynamic_markers.contains(&callee.as_str()) {
                count += 1;
            }
        }
    }
    if depth < MAX_WALK_DEPTH {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                count += count_dynamic_markers(child, bytes, spec, depth + 1);
            }
        }
    }
    count
}

fn count_errors(node: Node, depth: usize) -> u32 {
    let mut count = if node.is_error() || node.is_missing() { 1 } else { 0 };
    if depth < MAX_WALK_DEPTH {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                count += count_errors(child, depth + 1);
            }
        }
    }
    count
}

/// Build one structural node from its tree-sitter counterpart. Metrics are
/// computed over the node's full grammar subtree so every node stands on
/// its own once the decomposer slices it out.
fn build_node(
    ts: Node,
    bytes: &[u8],
    source: &str,
    spec: &LanguageSpec,
    kind: AstNodeKind,
    depth: usize,
) -> AstNode {
    let mut facts = SubtreeFacts::default();
    collect_facts(ts, bytes, spec, &mut facts, 0);

    let start_line = ts.start_position().row as u32 + 1;
    let end_line = ts.end_position().row as u32 + 1;

    // Containers other than the module guard their header expressions
    // (names, parameters, conditions) from becoming statement leaves.
    let children = match kind {
        AstNodeKind::Statement | AstNodeKind::Import => Vec::new(),
        AstNodeKind::Module => structural_children(ts, bytes, source, spec, depth, false),
        _ => structural_children(ts, bytes, source, spec, depth, true),
    };

    let name = match kind {
        AstNodeKind::Class | AstNodeKind::Function => ts
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(bytes).ok())
            .map(str::to_string),
        _ => None,
    };

    facts.finish(spec);

    AstNode {
        kind,
        name,
        start_line,
        end_line,
        loc: non_blank_lines(source, start_line, end_line),
        complexity: 1.0 + facts.decisions as f64,
        declared: facts.bindings,
        referenced: facts.referenced,
        calls: facts.calls,
        children,
    }
}

/// Collect the structural children of a container node, descending through
/// transparent body wrappers and clause wrappers. With `guard_headers`
/// set, unclassified children are header expressions and are skipped;
/// otherwise they become statement leaves.
fn structural_children(
    ts: Node,
    bytes: &[u8],
    source: &str,
    spec: &LanguageSpec,
    depth: usize,
    guard_headers: bool,
) -> Vec<AstNode> {
    let mut out = Vec::new();
    if depth >= MAX_WALK_DEPTH {
        return out;
    }

    for i in 0..ts.named_child_count() {
        let Some(child) = ts.named_child(i) else { continue };
        let child_kind = child.kind();

        if let Some(kind) = spec.classify(child_kind) {
            out.push(build_node(child, bytes, source, spec, kind, depth + 1));
        } else if spec.transparent_kinds.contains(&child_kind) {
            out.extend(structural_children(child, bytes, source, spec, depth + 1, false));
        } else if spec.clause_kinds.contains(&child_kind) {
            out.extend(structural_children(child, bytes, source, spec, depth + 1, true));
        } else if !guard_headers && child_kind != "comment" {
            out.push(build_node(
                child,
                bytes,
                source,
                spec,
                AstNodeKind::Statement,
                depth + 1,
            ));
        }
    }
    out
}

#[derive(Default)]
struct SubtreeFacts {
    bindings: SmallVec<[String; 4]>,
    locals: Vec<String>,
    identifiers: Vec<String>,
    calls: SmallVec<[String; 4]>,
    referenced: SmallVec<[String; 8]>,
    decisions: u32,
}

impl SubtreeFacts {
    /// Derive the referenced set: identifiers minus bindings, locals, and
    /// ambient builtins.
    fn finish(&mut self, spec: &LanguageSpec) {
        self.bindings.sort();
        self.bindings.dedup();
        self.calls.sort();
        self.calls.dedup();

        let mut referenced: Vec<String> = std::mem::take(&mut self.identifiers);
        referenced.extend(self.calls.iter().cloned());
        referenced.sort();
        referenced.dedup();
        referenced.retain(|ident| {
            !self.bindings.iter().any(|b| b == ident)
                && !self.locals.iter().any(|l| l == ident)
                && !spec.builtins.contains(&ident.as_str())
        });
        self.referenced = referenced.into();
    }
}

fn collect_facts(node: Node, bytes: &[u8], spec: &LanguageSpec, facts: &mut SubtreeFacts, depth: usize) {
    let kind = node.kind();

    if spec.decision_kinds.contains(&kind) {
        facts.decisions += 1;
    }

    if spec.class_kinds.contains(&kind) || spec.function_kinds.contains(&kind) {
        if let Some(name) = field_text(node, "name", bytes) {
            facts.bindings.push(name);
        }
    }

    for rule in spec.binding_rules {
        if rule.kind == kind {
            collect_identifiers_in(node, rule.field, bytes, &mut facts.bindings);
        }
    }
    for rule in spec.local_rules {
        if rule.kind == kind {
            let mut found: SmallVec<[String; 4]> = SmallVec::new();
            collect_identifiers_in(node, rule.field, bytes, &mut found);
            facts.locals.extend(found);
        }
    }

    if spec.call_kinds.contains(&kind) {
        if let Some(callee) = callee_name(node, bytes) {
            facts.calls.push(callee);
        }
    }

    if spec.identifier_kinds.contains(&kind) {
        if let Ok(text) = node.utf8_text(bytes) {
            if !text.is_empty() {
                facts.identifiers.push(text.to_string());
            }
        }
    }

    if depth < MAX_WALK_DEPTH {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                collect_facts(child, bytes, spec, facts, depth + 1);
            }
        }
    }
}

/// All bindable value identifiers under the given field of a node.
fn collect_identifiers_in(
    node: Node,
    field: &str,
    bytes: &[u8],
    out: &mut SmallVec<[String; 4]>,
) {
    let Some(target) = node.child_by_field_name(field) else {
        return;
    };
    collect_value_identifiers(target, bytes, out, 0);
}

fn collect_value_identifiers(
    node: Node,
    bytes: &[u8],
    out: &mut SmallVec<[String; 4]>,
    depth: usize,
) {
    if VALUE_IDENTIFIER_KINDS.contains(&node.kind()) {
        if let Ok(text) = node.utf8_text(bytes) {
            if !text.is_empty() {
                out.push(text.to_string());
            }
        }
        return;
    }
    if depth < MAX_WALK_DEPTH {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                collect_value_identifiers(child, bytes, out, depth + 1);
            }
        }
    }
}

/// Resolve the callee name of a call-like node: a bare identifier, the
/// property of a member access, or a macro name.
fn callee_name(node: Node, bytes: &[u8]) -> Option<String> {
    if let Some(func) = node
        .child_by_field_name("function")
        .or_else(|| node.child_by_field_name("macro"))
    {
        match func.kind() {
            "identifier" | "simple_identifier" | "scoped_identifier" => {
                return func.utf8_text(bytes).ok().map(|t| {
                    t.rsplit("::").next().unwrap_or(t).to_string()
                });
            }
            "attribute" | "member_expression" | "field_expression" => {
                let prop = func
                    .child_by_field_name("attribute")
                    .or_else(|| func.child_by_field_name("property"))
                    .or_else(|| func.child_by_field_name("field"));
                if let Some(prop) = prop {
                    return prop.utf8_text(bytes).ok().map(str::to_string);
                }
            }
            _ => {}
        }
    }
    None
}

fn field_text(node: Node, field: &str, bytes: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(bytes).ok())
        .map(str::to_string)
}

/// Non-blank lines in the inclusive 1-based range.
fn non_blank_lines(source: &str, start_line: u32, end_line: u32) -> u32 {
    source
        .lines()
        .skip(start_line.saturating_sub(1) as usize)
        .take((end_line.saturating_sub(start_line) + 1) as usize)
        .filter(|line| !line.trim().is_empty())
        .count() as u32
}
