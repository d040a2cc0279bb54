//! Recursive structural splitter.
//!
//! Splits a parsed scaffold into candidate atoms along the coarsest
//! boundary that still violates the atomicity shape: module, then
//! class/function, then logical block, then statement group. Leaves that
//! cannot be split further are emitted with `reducible = false`.

use mosaic_core::config::DecomposeConfig;

use crate::parsers::types::{AstNode, AstNodeKind};

/// A candidate atom before context injection.
#[derive(Debug, Clone)]
pub struct AtomDraft {
    pub name: String,
    pub kind: AstNodeKind,
    pub start_line: u32,
    pub end_line: u32,
    pub loc: u32,
    pub complexity: f64,
    pub declared: Vec<String>,
    /// Names of class-like declarations, used for type-edge resolution.
    pub declared_types: Vec<String>,
    pub referenced: Vec<String>,
    pub calls: Vec<String>,
    pub reducible: bool,
    /// Scaffold slice covering the draft, dedented.
    pub source_text: String,
}

/// Splits one parsed scaffold into drafts, in document order.
pub struct Splitter<'a> {
    config: &'a DecomposeConfig,
    source: &'a str,
}

impl<'a> Splitter<'a> {
    pub fn new(config: &'a DecomposeConfig, source: &'a str) -> Self {
        Self { config, source }
    }

    /// Produce drafts for every leaf the recursion bottoms out on.
    pub fn split(&self, root: &AstNode) -> Vec<AtomDraft> {
        let mut drafts = Vec::new();
        self.visit(root, root.name.as_deref().unwrap_or("root"), 0, &mut drafts);
        drafts
    }

    fn atomic_shape(&self, loc: u32, complexity: f64) -> bool {
        loc <= self.config.effective_loc_cap()
            && complexity < self.config.effective_complexity_cap()
    }

    fn visit(&self, node: &AstNode, scope: &str, depth: u32, out: &mut Vec<AtomDraft>) {
        // Imports carry no generatable behavior; they surface through the
        // context bundles instead.
        if node.kind == AstNodeKind::Import {
            return;
        }

        let splittable = !node.children.is_empty()
            && depth < self.config.effective_max_split_depth()
            && node.kind != AstNodeKind::Statement;

        if node.kind != AstNodeKind::Module && self.atomic_shape(node.loc, node.complexity) {
            out.push(self.draft_from_node(node, scope, true));
            return;
        }

        if !splittable {
            if node.kind == AstNodeKind::Module {
                return;
            }
            out.push(self.draft_from_node(node, scope, false));
            return;
        }

        // Split along the next-coarser boundary: structural children are
        // visited recursively, runs of plain statements are grouped.
        let scope_name = node.name.clone().unwrap_or_else(|| scope.to_string());
        let mut pending: Vec<&AstNode> = Vec::new();

        for child in &node.children {
            match child.kind {
                AstNodeKind::Statement => pending.push(child),
                _ => {
                    self.flush_statement_groups(&pending, &scope_name, out);
                    pending.clear();
                    self.visit(child, &scope_name, depth + 1, out);
                }
            }
        }
        self.flush_statement_groups(&pending, &scope_name, out);
    }

    /// Group consecutive statements into drafts that satisfy the shape
    /// caps, splitting greedily in document order.
    fn flush_statement_groups(&self, run: &[&AstNode], scope: &str, out: &mut Vec<AtomDraft>) {
        if run.is_empty() {
            return;
        }

        let loc_cap = self.config.effective_loc_cap();
        let complexity_cap = self.config.effective_complexity_cap();

        let mut group: Vec<&AstNode> = Vec::new();
        let mut group_loc = 0u32;
        let mut group_decisions = 0.0f64;

        for stmt in run {
            // A statement that alone violates the shape cannot be grouped;
            // it is an irreducible leaf.
            if stmt.loc > loc_cap || stmt.complexity >= complexity_cap {
                if !group.is_empty() {
                    out.push(self.draft_from_group(&group, scope));
                    group.clear();
                    group_loc = 0;
                    group_decisions = 0.0;
                }
                out.push(self.draft_from_node(stmt, scope, false));
                continue;
            }

            let stmt_decisions = stmt.complexity - 1.0;
            let fits = group.is_empty()
                || (group_loc + stmt.loc <= loc_cap
                    && 1.0 + group_decisions + stmt_decisions < complexity_cap);
            if !fits {
                out.push(self.draft_from_group(&group, scope));
                group.clear();
                group_loc = 0;
                group_decisions = 0.0;
            }
            group.push(stmt);
            group_loc += stmt.loc;
            group_decisions += stmt_decisions;
        }
        if !group.is_empty() {
            out.push(self.draft_from_group(&group, scope));
        }
    }

    fn draft_from_node(&self, node: &AstNode, scope: &str, fits_shape: bool) -> AtomDraft {
        let name = match (&node.name, node.kind) {
            (Some(name), _) => name.clone(),
            (None, AstNodeKind::Block) => format!("{scope}-block-l{}", node.start_line),
            (None, AstNodeKind::Statement) => format!("{scope}-stmt-l{}", node.start_line),
            (None, _) => format!("{scope}-l{}", node.start_line),
        };

        let reducible = fits_shape;
        if !reducible {
            tracing::warn!(
                name = %name,
                loc = node.loc,
                complexity = node.complexity,
                "irreducible leaf exceeds atomicity shape"
            );
        }

        let declared_types = if node.kind == AstNodeKind::Class {
            node.name.iter().cloned().collect()
        } else {
            Vec::new()
        };

        AtomDraft {
            name,
            kind: node.kind,
            start_line: node.start_line,
            end_line: node.end_line,
            loc: node.loc,
            complexity: node.complexity,
            declared: node.declared.to_vec(),
            declared_types,
            referenced: node.referenced.to_vec(),
            calls: node.calls.to_vec(),
            reducible,
            source_text: self.slice_lines(node.start_line, node.end_line),
        }
    }

    fn draft_from_group(&self, group: &[&AstNode], scope: &str) -> AtomDraft {
        let start_line = group.iter().map(|n| n.start_line).min().unwrap_or(1);
        let end_line = group.iter().map(|n| n.end_line).max().unwrap_or(start_line);

        let mut declared = Vec::new();
        let mut referenced = Vec::new();
        let mut calls = Vec::new();
        let mut loc = 0u32;
        let mut decisions = 0.0f64;
        for stmt in group {
            declared.extend(stmt.declared.iter().cloned());
            referenced.extend(stmt.referenced.iter().cloned());
            calls.extend(stmt.calls.iter().cloned());
            loc += stmt.loc;
            decisions += stmt.complexity - 1.0;
        }
        declared.sort();
        declared.dedup();
        referenced.sort();
        referenced.dedup();
        referenced.retain(|r| !declared.contains(r));
        calls.sort();
        calls.dedup();

        AtomDraft {
            name: format!("{scope}-stmts-l{start_line}"),
            kind: AstNodeKind::Statement,
            start_line,
            end_line,
            loc,
            complexity: 1.0 + decisions,
            declared,
            declared_types: Vec::new(),
            referenced,
            calls,
            reducible: true,
            source_text: self.slice_lines(start_line, end_line),
        }
    }

    /// Slice the inclusive 1-based line range and strip the common leading
    /// indentation so the text parses standalone.
    fn slice_lines(&self, start_line: u32, end_line: u32) -> String {
        let lines: Vec<&str> = self
            .source
            .lines()
            .skip(start_line.saturating_sub(1) as usize)
            .take((end_line.saturating_sub(start_line) + 1) as usize)
            .collect();
        dedent(&lines)
    }
}

/// Remove the smallest common leading whitespace of all non-blank lines.
fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.len() >= indent {
            out.push_str(&line[indent..]);
        } else {
            out.push_str(line.trim_start());
        }
    }
    out
}
