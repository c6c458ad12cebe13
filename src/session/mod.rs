//! Client run state machine: Idle -> Running -> Resolved, one request in flight at most.

use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    classify::ExecutionResult,
    request::ValidationError,
    runner::CodeRunner,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Resolved(ExecutionResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    Started,
    /// A request was already in flight; nothing was dispatched.
    AlreadyRunning,
}

type Completion = (ExecutionResult, Duration);

/// Editor-side state for one session: the buffers, the language selector and
/// at most one in-flight run.
pub struct RunSession {
    runner: CodeRunner,
    language: String,
    source: String,
    stdin: String,
    phase: Phase,
    in_flight: Option<JoinHandle<Completion>>,
    last_elapsed: Option<Duration>,
}

impl RunSession {
    pub fn new(runner: CodeRunner, language: &str) -> Self {
        let source = template_for(&runner, language);
        Self {
            runner,
            language: language.to_string(),
            source,
            stdin: String::new(),
            phase: Phase::Idle,
            in_flight: None,
            last_elapsed: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        match &self.phase {
            Phase::Resolved(result) => Some(result),
            _ => None,
        }
    }

    /// Wall-clock time of the last resolved run. Display only.
    pub fn last_elapsed(&self) -> Option<Duration> {
        self.last_elapsed
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Switches the selector. An untouched starter buffer follows the new language.
    pub fn set_language(&mut self, language: &str) {
        if self.source == template_for(&self.runner, &self.language) {
            self.source = template_for(&self.runner, language);
        }
        self.language = language.to_string();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn stdin(&self) -> &str {
        &self.stdin
    }

    pub fn set_stdin(&mut self, stdin: impl Into<String>) {
        self.stdin = stdin.into();
    }

    /// Starts a run of the current buffers. Must be called inside a tokio runtime.
    ///
    /// A no-op while another run is in flight. Validation happens here, before
    /// anything is spawned, and leaves the phase untouched on failure.
    pub fn run(&mut self) -> Result<RunTrigger, ValidationError> {
        if self.is_running() {
            debug!(language = %self.language, "run ignored, request already in flight");
            return Ok(RunTrigger::AlreadyRunning);
        }

        let request = self.runner.build(&self.language, &self.source, Some(&self.stdin))?;
        let runner = self.runner.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let started = Instant::now();
            let result = runner.execute(request).await;
            (result, started.elapsed())
        }));
        self.phase = Phase::Running;
        Ok(RunTrigger::Started)
    }

    /// Waits for the in-flight run, if any, and returns the resolved result.
    ///
    /// Dropping this future early keeps the run in flight and cancellable.
    pub async fn settle(&mut self) -> Option<&ExecutionResult> {
        if let Some(handle) = self.in_flight.as_mut() {
            let joined = handle.await;
            self.in_flight = None;
            self.finish(joined);
        }
        self.result()
    }

    /// Non-blocking [`settle`](Self::settle).
    pub fn try_settle(&mut self) -> Option<&ExecutionResult> {
        let joined = self.in_flight.as_mut().and_then(|h| h.now_or_never());
        if let Some(joined) = joined {
            self.in_flight = None;
            self.finish(joined);
        }
        self.result()
    }

    /// Drops a resolved result and restores the starter template. An in-flight run keeps going.
    pub fn reset(&mut self) {
        if matches!(self.phase, Phase::Resolved(_)) {
            self.phase = Phase::Idle;
        }
        self.source = template_for(&self.runner, &self.language);
    }

    /// Aborts the in-flight run. Returns false when nothing was running.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(handle) => {
                handle.abort();
                self.phase = Phase::Idle;
                info!(language = %self.language, "run cancelled");
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, joined: Result<Completion, JoinError>) {
        match joined {
            Ok((result, elapsed)) => {
                info!(
                    language = %self.language,
                    outcome = ?result.outcome,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "run resolved"
                );
                self.last_elapsed = Some(elapsed);
                self.phase = Phase::Resolved(result);
            }
            Err(err) if err.is_cancelled() => self.phase = Phase::Idle,
            Err(err) => {
                warn!(error = %err, "run task panicked");
                self.phase = Phase::Resolved(ExecutionResult::transport_failure());
            }
        }
    }
}

impl Drop for RunSession {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

fn template_for(runner: &CodeRunner, language: &str) -> String {
    runner
        .registry()
        .resolve(language)
        .map(|spec| spec.template.clone())
        .unwrap_or_default()
}
