//! Test doubles for the oracle and toolchain seams, shared by unit and
//! integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use mosaic_core::errors::{OracleError, ValidateError};
use mosaic_core::model::context::{ContextBundle, TestCase};
use mosaic_core::model::task::Language;
use mosaic_core::model::validation::CheckError;

use crate::oracle::CodeOracle;
use crate::validate::toolchain::{CheckOutcome, LanguageToolchain};

/// One scripted oracle reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    /// Reply with text after a delay, for scheduling-order tests.
    Slow { delay_ms: u64, text: String },
    Fail(OracleErrorKind),
}

/// Cloneable stand-in for OracleError construction in scripts.
#[derive(Debug, Clone)]
pub enum OracleErrorKind {
    Transport,
    RateLimit,
    Server,
    Semantic,
}

impl OracleErrorKind {
    fn to_error(&self) -> OracleError {
        match self {
            Self::Transport => OracleError::Transport {
                message: "scripted transport failure".to_string(),
            },
            Self::RateLimit => OracleError::RateLimit { retry_after: None },
            Self::Server => OracleError::Server {
                message: "scripted server failure".to_string(),
            },
            Self::Semantic => OracleError::Semantic {
                message: "scripted semantic failure".to_string(),
            },
        }
    }
}

/// Oracle replaying scripts keyed by a substring of the prompt. The first
/// key contained in the prompt wins; exhausted scripts and unmatched
/// prompts fall back to the default reply.
pub struct ScriptedOracle {
    scripts: Mutex<Vec<(String, VecDeque<ScriptedReply>)>>,
    default_reply: String,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    /// Every prompt gets `default_reply`.
    pub fn uniform(default_reply: impl Into<String>) -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            default_reply: default_reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue replies for prompts containing `key`.
    pub fn script(self, key: impl Into<String>, replies: Vec<ScriptedReply>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push((key.into(), replies.into()));
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeOracle for ScriptedOracle {
    async fn generate(
        &self,
        prompt: &str,
        _temperature: f64,
        _deadline: Duration,
    ) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut matched = None;
            if let Ok(mut scripts) = self.scripts.lock() {
                for (key, replies) in scripts.iter_mut() {
                    if prompt.contains(key.as_str()) {
                        matched = replies.pop_front();
                        break;
                    }
                }
            }
            matched
        };
        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Slow { delay_ms, text }) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(text)
            }
            Some(ScriptedReply::Fail(kind)) => Err(kind.to_error()),
            None => Ok(self.default_reply.clone()),
        }
    }
}

/// Oracle that fails transiently a fixed number of times, then succeeds.
pub struct FlakyOracle {
    failures_left: Mutex<usize>,
    reply: Option<String>,
    calls: AtomicUsize,
}

impl FlakyOracle {
    pub fn failing_times(failures: usize, reply: impl Into<String>) -> Self {
        Self {
            failures_left: Mutex::new(failures),
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with empty text (a semantic failure at the client).
    pub fn always_empty() -> Self {
        Self {
            failures_left: Mutex::new(0),
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeOracle for FlakyOracle {
    async fn generate(
        &self,
        _prompt: &str,
        _temperature: f64,
        _deadline: Duration,
    ) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut left) = self.failures_left.lock() {
            if *left > 0 {
                *left -= 1;
                return Err(OracleError::Transport {
                    message: "connection reset".to_string(),
                });
            }
        }
        Ok(self.reply.clone().unwrap_or_default())
    }
}

/// Markers the scripted toolchain reacts to when embedded in code.
pub const FAIL_SYNTAX_MARKER: &str = "@@fail-syntax";
pub const FAIL_TYPES_MARKER: &str = "@@fail-types";
pub const FAIL_TESTS_MARKER: &str = "@@fail-tests";
pub const LEVEL_ERROR_MARKER: &str = "@@level-error";

/// Toolchain driven entirely by markers in the code under test; anything
/// unmarked passes. Registered for every language in engine tests.
pub struct ScriptedToolchain {
    language: Language,
}

impl ScriptedToolchain {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

fn marker_failure(code: &str, marker: &str, error_code: &str) -> CheckOutcome {
    let span = code
        .lines()
        .position(|line| line.contains(marker))
        .map(|idx| mosaic_core::model::validation::Span {
            start_line: idx as u32 + 1,
            end_line: idx as u32 + 1,
        });
    CheckOutcome::fail(vec![CheckError {
        code: error_code.to_string(),
        message: format!("scripted failure ({error_code})"),
        source_atoms: Vec::new(),
        span,
    }])
}

#[async_trait]
impl LanguageToolchain for ScriptedToolchain {
    fn language(&self) -> Language {
        self.language
    }

    async fn parse(&self, code: &str) -> Result<CheckOutcome, ValidateError> {
        if code.contains(LEVEL_ERROR_MARKER) {
            return Err(ValidateError::ToolchainCrashed {
                check: "parse".to_string(),
                message: "scripted toolchain crash".to_string(),
            });
        }
        if code.contains(FAIL_SYNTAX_MARKER) {
            return Ok(marker_failure(code, FAIL_SYNTAX_MARKER, "SYNTAX_PARSE_FAILED"));
        }
        Ok(CheckOutcome::pass())
    }

    async fn typecheck(
        &self,
        code: &str,
        _bundle: &ContextBundle,
    ) -> Result<CheckOutcome, ValidateError> {
        if code.contains(FAIL_TYPES_MARKER) {
            return Ok(marker_failure(code, FAIL_TYPES_MARKER, "TYPECHECK_FAILED"));
        }
        Ok(CheckOutcome::pass())
    }

    async fn run_tests(
        &self,
        code: &str,
        _tests: &[TestCase],
    ) -> Result<CheckOutcome, ValidateError> {
        if code.contains(FAIL_TESTS_MARKER) {
            return Ok(marker_failure(code, FAIL_TESTS_MARKER, "TEST_FAILED"));
        }
        Ok(CheckOutcome::pass())
    }
}
