//! `run_code`: build -> dispatch -> classify.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    classify::{classify, ExecutionResult},
    config::{Budgets, Config},
    engine::{Engine, PistonEngine, TransportError},
    languages::Registry,
    request::{self, ExecutionRequest, ValidationError},
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Clone)]
pub struct CodeRunner {
    registry: &'static Registry,
    budgets: Budgets,
    engine: Arc<dyn Engine>,
}

impl CodeRunner {
    pub fn new(registry: &'static Registry, budgets: Budgets, engine: Arc<dyn Engine>) -> Self {
        Self { registry, budgets, engine }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let engine = PistonEngine::from_config(cfg)?;
        Ok(Self::new(Registry::builtin(), cfg.budgets(), Arc::new(engine)))
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    pub fn budgets(&self) -> &Budgets {
        &self.budgets
    }

    pub fn build(
        &self,
        language_id: &str,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<ExecutionRequest, ValidationError> {
        request::build(self.registry, &self.budgets, language_id, source, stdin)
    }

    /// Dispatch and classify. Never fails: transport problems become
    /// [`ExecutionResult::transport_failure`] and the detail goes to the log.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        match self.dispatch(request).await {
            Ok(result) => result,
            Err(err) => {
                log_transport_failure(&err);
                ExecutionResult::transport_failure()
            }
        }
    }

    pub async fn run_code(
        &self,
        language_id: &str,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<ExecutionResult, RunError> {
        let request = self.build(language_id, source, stdin)?;
        let result = self.dispatch(request).await.inspect_err(log_transport_failure)?;
        Ok(result)
    }

    async fn dispatch(&self, request: ExecutionRequest) -> Result<ExecutionResult, TransportError> {
        let language = request.language.id.clone();
        let response = self.engine.dispatch(request).await?;
        let result = classify(&response);
        info!(language = %language, outcome = ?result.outcome, exit_code = result.exit_code, "run classified");
        Ok(result)
    }
}

fn log_transport_failure(err: &TransportError) {
    match err {
        TransportError::Status { status, body } => {
            warn!(status = *status, body = %body, "execution engine rejected submission")
        }
        other => warn!(error = %other, "execution engine unreachable"),
    }
}
