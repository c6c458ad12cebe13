//! Request builder: validates caller input and attaches the configured budgets.

use serde::Serialize;
use thiserror::Error;

use crate::{
    config::Budgets,
    languages::{LanguageSpec, Registry},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no language selected")]
    MissingLanguage,
    #[error("source code is empty")]
    EmptySource,
    #[error("unsupported language: {0}")]
    UnknownLanguage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRequest {
    pub language: LanguageSpec,
    pub source: String,
    pub stdin: String,
    pub budgets: Budgets,
}

pub fn build(
    registry: &Registry,
    budgets: &Budgets,
    language_id: &str,
    source: &str,
    stdin: Option<&str>,
) -> Result<ExecutionRequest, ValidationError> {
    if language_id.trim().is_empty() {
        return Err(ValidationError::MissingLanguage);
    }
    if source.trim().is_empty() {
        return Err(ValidationError::EmptySource);
    }
    let language = registry
        .resolve(language_id)
        .ok_or_else(|| ValidationError::UnknownLanguage(language_id.trim().to_string()))?;

    Ok(ExecutionRequest {
        language: language.clone(),
        source: source.to_string(),
        stdin: stdin.unwrap_or_default().to_string(),
        budgets: *budgets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_default(lang: &str, src: &str, stdin: Option<&str>) -> Result<ExecutionRequest, ValidationError> {
        build(Registry::builtin(), &Budgets::default(), lang, src, stdin)
    }

    #[test]
    fn rejects_missing_language_before_lookup() {
        assert_eq!(build_default("", "print(1)", None), Err(ValidationError::MissingLanguage));
        assert_eq!(build_default("   ", "print(1)", None), Err(ValidationError::MissingLanguage));
    }

    #[test]
    fn rejects_blank_source() {
        assert_eq!(build_default("python", "", None), Err(ValidationError::EmptySource));
        assert_eq!(build_default("python", " \n\t", None), Err(ValidationError::EmptySource));
    }

    #[test]
    fn rejects_unknown_language() {
        assert_eq!(
            build_default("brainfuck", "+.", None),
            Err(ValidationError::UnknownLanguage("brainfuck".into()))
        );
    }

    #[test]
    fn fills_budgets_and_empty_stdin() {
        let budgets = Budgets { compile_timeout_ms: 3_000, run_timeout_ms: 1_000, compile_memory_limit: -1, run_memory_limit: 64 };
        let req = build(Registry::builtin(), &budgets, "java", "class Main {}", None).unwrap();
        assert_eq!(req.language.filename, "Main.java");
        assert_eq!(req.stdin, "");
        assert_eq!(req.budgets, budgets);
    }

    #[test]
    fn build_is_pure() {
        let a = build_default("python", "print(input())", Some("42\n")).unwrap();
        let b = build_default("python", "print(input())", Some("42\n")).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
