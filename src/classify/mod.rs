//! Result classifier: maps an engine response onto one of six outcomes.
//!
//! Checks run in a fixed order and the first match wins. The signals overlap (a
//! killed process can still have stderr), so reordering changes results:
//!
//! 1. `SIGKILL` or exit 137 -> time limit exceeded
//! 2. `SIGSEGV` or exit 139 -> memory limit exceeded
//! 3. compile stderr present -> compile error
//! 4. run stderr present and non-zero exit -> runtime error
//! 5. anything else -> success

use serde::Serialize;

use crate::engine::{CompileStage, EngineResponse, RunStage};

pub const TIME_LIMIT_MESSAGE: &str = "Time Limit Exceeded: your program ran longer than the allowed time.";
pub const MEMORY_LIMIT_MESSAGE: &str =
    "Memory Limit Exceeded: your program used too much memory or crashed with a segmentation fault.";
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Could not run your code right now. The execution service is unavailable, please try again.";
pub const COMPILE_ERROR_MARKER: &str = "Compilation Error:\n";
pub const RUNTIME_ERROR_MARKER: &str = "Runtime Error:\n";

const SIGKILL: &str = "SIGKILL";
const SIGSEGV: &str = "SIGSEGV";
const EXIT_KILLED: i64 = 137;
const EXIT_SEGFAULT: i64 = 139;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    TransportError,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "Success",
            Outcome::CompileError => "Compile Error",
            Outcome::RuntimeError => "Runtime Error",
            Outcome::TimeLimitExceeded => "Time Limit Exceeded",
            Outcome::MemoryLimitExceeded => "Memory Limit Exceeded",
            Outcome::TransportError => "Service Unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub outcome: Outcome,
    pub stdout: String,
    /// stderr, or a display message prefixed according to `outcome`.
    pub message: String,
    pub exit_code: i64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// What the user sees when the engine could not be reached.
    pub fn transport_failure() -> Self {
        Self {
            outcome: Outcome::TransportError,
            stdout: String::new(),
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
            exit_code: 1,
        }
    }
}

pub fn classify(response: &EngineResponse) -> ExecutionResult {
    let empty_run = RunStage::default();
    let run = response.run.as_ref().unwrap_or(&empty_run);
    let signal = run.signal.as_deref().unwrap_or_default();

    if signal == SIGKILL || run.code == Some(EXIT_KILLED) {
        return limit_exceeded(Outcome::TimeLimitExceeded, TIME_LIMIT_MESSAGE, run);
    }
    if signal == SIGSEGV || run.code == Some(EXIT_SEGFAULT) {
        return limit_exceeded(Outcome::MemoryLimitExceeded, MEMORY_LIMIT_MESSAGE, run);
    }

    if let Some(compile) = response.compile.as_ref().filter(|c| has_text(&c.stderr)) {
        return compile_error(compile);
    }

    if has_text(&run.stderr) && run.code.unwrap_or(0) != 0 {
        return ExecutionResult {
            outcome: Outcome::RuntimeError,
            stdout: text(&run.stdout),
            message: format!("{}{}", RUNTIME_ERROR_MARKER, text(&run.stderr)),
            exit_code: run.code.unwrap_or(1),
        };
    }

    ExecutionResult {
        outcome: Outcome::Success,
        stdout: text(&run.stdout),
        message: text(&run.stderr),
        exit_code: run.code.unwrap_or(0),
    }
}

fn limit_exceeded(outcome: Outcome, message: &str, run: &RunStage) -> ExecutionResult {
    ExecutionResult {
        outcome,
        stdout: String::new(),
        message: message.to_string(),
        exit_code: run.code.unwrap_or(1),
    }
}

fn compile_error(compile: &CompileStage) -> ExecutionResult {
    ExecutionResult {
        outcome: Outcome::CompileError,
        stdout: text(&compile.output),
        message: format!("{}{}", COMPILE_ERROR_MARKER, text(&compile.stderr)),
        exit_code: compile.code.unwrap_or(1),
    }
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

fn text(field: &Option<String>) -> String {
    field.clone().unwrap_or_default()
}
