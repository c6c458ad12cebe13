//! Execution dispatcher: the one place that talks to the remote execution engine.
//!
//! The engine speaks the Piston v2 protocol. Its response is third-party data, so
//! every field is optional and defaulting happens in the classifier, not here.

use std::{future::Future, pin::Pin, time::Duration};

use anyhow::Result;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{config::Config, request::ExecutionRequest};

/// Longest slice of an error body we keep for diagnostics.
const MAX_DIAGNOSTIC_BODY: usize = 2048;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResponse {
    #[serde(default)]
    pub compile: Option<CompileStage>,
    #[serde(default)]
    pub run: Option<RunStage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStage {
    pub output: Option<String>,
    pub stderr: Option<String>,
    pub code: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStage {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub code: Option<i64>,
    /// OS signal name, e.g. `SIGKILL`.
    pub signal: Option<String>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to reach execution engine: {0}")]
    Connect(#[source] reqwest::Error),
    /// `body` is kept for logs only.
    #[error("execution engine responded with status {status}")]
    Status { status: u16, body: String },
    #[error("unreadable execution engine response: {0}")]
    Decode(String),
}

pub type DispatchFuture = Pin<Box<dyn Future<Output = Result<EngineResponse, TransportError>> + Send>>;

/// Submits one request to an execution engine. Exactly one attempt, no retries.
pub trait Engine: Send + Sync {
    fn dispatch(&self, request: ExecutionRequest) -> DispatchFuture;
}

#[derive(Debug, Clone)]
pub struct PistonEngine {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PistonEngine {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let timeout = cfg.get_u64("REQUEST_TIMEOUT").unwrap_or(30);
        let worst_case = cfg.budgets().worst_case_ms();
        if timeout.saturating_mul(1000) <= worst_case {
            warn!(
                request_timeout_s = timeout,
                engine_budget_ms = worst_case,
                "REQUEST_TIMEOUT does not exceed the engine budgets; slow runs will surface as transport failures"
            );
        }
        let api_key = cfg.get("ENGINE_API_KEY").filter(|s| !s.trim().is_empty());
        Self::new(&cfg.engine_base_url(), api_key, Duration::from_secs(timeout))
    }

    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn execute_url(&self) -> String {
        format!("{}/execute", self.base_url)
    }
}

impl Engine for PistonEngine {
    fn dispatch(&self, request: ExecutionRequest) -> DispatchFuture {
        let http = self.http.clone();
        let url = self.execute_url();
        let api_key = self.api_key.clone();

        Box::pin(async move {
            let body = submission_body(&request);
            debug!(
                language = %request.language.id,
                version = %request.language.engine_version,
                url = %url,
                "dispatching submission"
            );

            let mut builder = http.post(&url).json(&body);
            if let Some(key) = api_key {
                builder = builder.header(AUTHORIZATION, key);
            }
            let resp = builder.send().await.map_err(TransportError::Connect)?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body: truncate_body(text),
                });
            }

            let bytes = resp.bytes().await.map_err(TransportError::Connect)?;
            serde_json::from_slice::<EngineResponse>(&bytes)
                .map_err(|e| TransportError::Decode(e.to_string()))
        })
    }
}

/// JSON body of a Piston `/execute` submission.
pub fn submission_body(request: &ExecutionRequest) -> serde_json::Value {
    serde_json::json!({
        "language": request.language.engine_language,
        "version": request.language.engine_version,
        "files": [{
            "name": request.language.filename,
            "content": request.source,
        }],
        "stdin": request.stdin,
        "args": [],
        "compile_timeout": request.budgets.compile_timeout_ms,
        "run_timeout": request.budgets.run_timeout_ms,
        "compile_memory_limit": request.budgets.compile_memory_limit,
        "run_memory_limit": request.budgets.run_memory_limit,
    })
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_DIAGNOSTIC_BODY {
        let mut cut = MAX_DIAGNOSTIC_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
