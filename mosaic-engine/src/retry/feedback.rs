//! Prompt assembly: the initial generation prompt and the feedback prompt
//! composed from a failed attempt.
//!
//! Feedback quotes only the offending lines (plus context) from the prior
//! attempt, never the full code, so the oracle is not anchored on its own
//! mistake.

use mosaic_core::model::atom::AtomicUnit;
use mosaic_core::model::validation::ValidationResult;
use mosaic_core::traits::PatternSnippet;

/// Canonical suffix appended to every feedback prompt.
pub const FEEDBACK_SUFFIX: &str = "Your previous attempt failed the following checks. \
Produce a corrected implementation satisfying all preconditions and tests.";

/// The first-attempt prompt: task description, context bundle, conditions,
/// tests, and retrieved pattern snippets.
pub fn initial_prompt(
    atom: &AtomicUnit,
    task_description: &str,
    snippets: &[PatternSnippet],
    human_hint: Option<&str>,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(hint) = human_hint {
        sections.push(format!("Reviewer guidance:\n{hint}"));
    }

    sections.push(format!(
        "Implement `{}` in {} as part of: {}",
        atom.name,
        atom.language.name(),
        task_description
    ));

    let bundle = &atom.context;
    if !bundle.imports.is_empty() {
        let imports: Vec<String> = bundle
            .imports
            .iter()
            .map(|binding| format!("- {}", binding.symbol))
            .collect();
        sections.push(format!("Available symbols:\n{}", imports.join("\n")));
    }
    if !bundle.preconditions.is_empty() {
        sections.push(format!("Preconditions:\n- {}", bundle.preconditions.join("\n- ")));
    }
    if !bundle.postconditions.is_empty() {
        sections.push(format!("Postconditions:\n- {}", bundle.postconditions.join("\n- ")));
    }
    if !bundle.test_cases.is_empty() {
        let tests: Vec<String> = bundle
            .test_cases
            .iter()
            .map(|test| format!("# {}\n{}", test.name, test.body))
            .collect();
        sections.push(format!("The code must pass:\n{}", tests.join("\n")));
    }
    if !snippets.is_empty() {
        let patterns: Vec<String> = snippets
            .iter()
            .map(|snippet| format!("// from {}\n{}", snippet.source, snippet.content))
            .collect();
        sections.push(format!("Reference patterns:\n{}", patterns.join("\n\n")));
    }

    sections.push(format!(
        "Produce only the code for this unit, at most {} lines.",
        atom.estimated_loc.max(1)
    ));

    sections.join("\n\n")
}

/// The feedback prompt for the next attempt after a Level 1 failure.
pub fn feedback_prompt(
    base_prompt: &str,
    result: &ValidationResult,
    prior_code: &str,
    context_lines: u32,
) -> String {
    let mut sections: Vec<String> = vec![base_prompt.to_string()];

    let errors: Vec<String> = result
        .errors
        .iter()
        .map(|error| match error.span {
            Some(span) => format!(
                "- {} (lines {}-{}): {}",
                error.code, span.start_line, span.end_line, error.message
            ),
            None => format!("- {}: {}", error.code, error.message),
        })
        .collect();
    if errors.is_empty() {
        sections.push(format!(
            "Failed checks: {}",
            result
                .checks_run
                .iter()
                .skip(result.checks_passed as usize)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    } else {
        sections.push(format!("Errors:\n{}", errors.join("\n")));
    }

    let quoted = quote_offending_lines(prior_code, result, context_lines);
    if !quoted.is_empty() {
        sections.push(format!("Offending lines from the previous attempt:\n{quoted}"));
    }

    sections.push(FEEDBACK_SUFFIX.to_string());
    sections.join("\n\n")
}

/// Feedback when the oracle itself failed (no validation ran).
pub fn oracle_failure_prompt(base_prompt: &str, failure: &str) -> String {
    format!("{base_prompt}\n\nThe previous attempt produced no usable code ({failure}).\n\n{FEEDBACK_SUFFIX}")
}

/// Quote each error's span ± `context_lines`, deduplicating overlaps.
fn quote_offending_lines(code: &str, result: &ValidationResult, context_lines: u32) -> String {
    let lines: Vec<&str> = code.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let mut include = vec![false; lines.len()];
    for error in &result.errors {
        let Some(span) = error.span else { continue };
        let start = span.start_line.saturating_sub(1 + context_lines) as usize;
        let end = (span.end_line.saturating_sub(1) + context_lines) as usize;
        for flag in include
            .iter_mut()
            .skip(start)
            .take(end.saturating_sub(start) + 1)
        {
            *flag = true;
        }
    }

    let mut out: Vec<String> = Vec::new();
    let mut last_included = false;
    for (idx, line) in lines.iter().enumerate() {
        if include[idx] {
            out.push(format!("{:>4} | {}", idx + 1, line));
            last_included = true;
        } else if last_included {
            out.push("     | ...".to_string());
            last_included = false;
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mosaic_core::model::validation::{
        CheckError, Span, ValidationLevel, ValidationResultBuilder, ValidationSubject,
    };
    use mosaic_core::types::identifiers::AtomId;

    fn failed_result() -> ValidationResult {
        let mut builder = ValidationResultBuilder::new(
            ValidationSubject::Atom(AtomId::from("a1")),
            ValidationLevel::Atomic,
        );
        builder.check_failed(
            "types",
            CheckError {
                code: "TYPECHECK_MISSING_DECLARATION".into(),
                message: "expected output `f` is not declared".into(),
                source_atoms: vec![AtomId::from("a1")],
                span: Some(Span { start_line: 3, end_line: 3 }),
            },
        );
        builder.finish(Duration::ZERO, None)
    }

    #[test]
    fn feedback_quotes_span_with_context_but_not_whole_code() {
        let code = "line1\nline2\nline3-bad\nline4\nline5\nline6\nline7";
        let prompt = feedback_prompt("BASE", &failed_result(), code, 2);

        assert!(prompt.contains("BASE"));
        assert!(prompt.contains("line3-bad"));
        assert!(prompt.contains("line1"));
        assert!(prompt.contains("line5"));
        assert!(!prompt.contains("line7"), "quoted beyond the context window");
        assert!(prompt.ends_with(FEEDBACK_SUFFIX));
    }

    #[test]
    fn feedback_without_spans_still_lists_error_codes() {
        let mut builder = ValidationResultBuilder::new(
            ValidationSubject::Atom(AtomId::from("a1")),
            ValidationLevel::Atomic,
        );
        builder.check_failed(
            "syntax",
            CheckError {
                code: "SYNTAX_PARSE_FAILED".into(),
                message: "2 syntax error node(s)".into(),
                source_atoms: vec![],
                span: None,
            },
        );
        let result = builder.finish(Duration::ZERO, None);

        let prompt = feedback_prompt("BASE", &result, "broken(", 2);
        assert!(prompt.contains("SYNTAX_PARSE_FAILED"));
        assert!(!prompt.contains("broken("), "full code must not be echoed");
    }
}
