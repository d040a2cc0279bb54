//! AI remediation hints for queued atoms: failure summary, candidate
//! fixes derived from the structured errors, and a diff against the best
//! prior attempt. Informational only, never executed.

use mosaic_core::model::retry::RetryRecord;
use mosaic_core::model::validation::ValidationResult;

/// Compose the hint for one queued atom.
pub fn compose_hint(
    last_result: Option<&ValidationResult>,
    records: &[&RetryRecord],
    max_fixes: usize,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    match last_result {
        Some(result) => sections.push(format!("Final failure: {}", result.failure_summary())),
        None => sections.push("Final failure: no validation result recorded".to_string()),
    }

    if let Some(result) = last_result {
        let fixes: Vec<String> = result
            .errors
            .iter()
            .take(max_fixes)
            .map(|error| format!("- {}", suggest_fix(&error.code, &error.message)))
            .collect();
        if !fixes.is_empty() {
            sections.push(format!("Candidate fixes:\n{}", fixes.join("\n")));
        }
    }

    if let Some(diff) = last_attempt_diff(records) {
        sections.push(format!("Change between the last two attempts:\n{diff}"));
    }

    sections.join("\n\n")
}

/// Map a structured error code onto a human-actionable suggestion.
fn suggest_fix(code: &str, message: &str) -> String {
    match code {
        code if code.starts_with("SYNTAX") => {
            format!("fix the syntax error ({message}); check delimiters and indentation")
        }
        code if code.starts_with("TYPECHECK") => {
            format!("declare the expected output ({message})")
        }
        code if code.starts_with("TEST") => {
            format!("make the supplied test pass ({message})")
        }
        code if code.starts_with("ATOMICITY_LOC") => {
            "shrink the implementation to the line cap; extract nothing new".to_string()
        }
        code if code.starts_with("ATOMICITY_PLACEHOLDER") => {
            "replace the placeholder with a real implementation".to_string()
        }
        code if code.starts_with("INTEGRATION") || code.starts_with("SIGNATURE") => {
            format!("align the cross-atom signature ({message})")
        }
        _ => format!("address {code}: {message}"),
    }
}

/// Line diff between the last two attempts that produced code. The later
/// attempt is treated as "best" since prompts only accumulate feedback.
fn last_attempt_diff(records: &[&RetryRecord]) -> Option<String> {
    let with_code: Vec<&&RetryRecord> = records.iter().filter(|r| r.code.is_some()).collect();
    if with_code.len() < 2 {
        return None;
    }
    let old = with_code[with_code.len() - 2].code.as_deref().unwrap_or("");
    let new = with_code[with_code.len() - 1].code.as_deref().unwrap_or("");
    let diff = line_diff(old, new);
    if diff.is_empty() {
        None
    } else {
        Some(diff)
    }
}

/// Minimal LCS-based line diff, `-`/`+` prefixed. Atom-sized inputs keep
/// the quadratic table trivial.
fn line_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let n = old_lines.len();
    let m = new_lines.len();

    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old_lines[i] == new_lines[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out: Vec<String> = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if old_lines[i] == new_lines[j] {
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            out.push(format!("- {}", old_lines[i]));
            i += 1;
        } else {
            out.push(format!("+ {}", new_lines[j]));
            j += 1;
        }
    }
    for line in &old_lines[i..] {
        out.push(format!("- {line}"));
    }
    for line in &new_lines[j..] {
        out.push(format!("+ {line}"));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_marks_changed_lines_only() {
        let diff = line_diff("a\nb\nc", "a\nx\nc");
        assert_eq!(diff, "- b\n+ x");
    }

    #[test]
    fn diff_of_identical_text_is_empty() {
        assert!(line_diff("a\nb", "a\nb").is_empty());
    }
}
