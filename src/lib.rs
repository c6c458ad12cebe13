//! Remote code execution orchestrator.
//!
//! Source text and a language id go in; a normalized [`ExecutionResult`] comes out.
//! Compilation and execution happen on an external sandboxed engine (Piston v2).

pub mod classify;
pub mod config;
pub mod engine;
pub mod languages;
pub mod printer;
pub mod request;
pub mod runner;
pub mod session;

pub use classify::{classify, ExecutionResult, Outcome};
pub use config::{Budgets, Config};
pub use engine::{Engine, EngineResponse, PistonEngine, TransportError};
pub use languages::{LanguageSpec, Registry};
pub use request::{ExecutionRequest, ValidationError};
pub use runner::{CodeRunner, RunError};
pub use session::{Phase, RunSession, RunTrigger};
