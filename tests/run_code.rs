use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use coderun::{
    classify::COMPILE_ERROR_MARKER,
    engine::{CompileStage, DispatchFuture, RunStage},
    Budgets, CodeRunner, Engine, EngineResponse, ExecutionRequest, Outcome, Phase, Registry, RunError,
    RunSession, RunTrigger, ValidationError,
};

/// Replays one canned response and records every request it was handed.
struct Scripted {
    response: EngineResponse,
    seen: Mutex<Vec<ExecutionRequest>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(response: EngineResponse) -> Arc<Self> {
        Arc::new(Self { response, seen: Mutex::new(Vec::new()), calls: AtomicUsize::new(0) })
    }
}

impl Engine for Scripted {
    fn dispatch(&self, request: ExecutionRequest) -> DispatchFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request);
        let response = self.response.clone();
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(response)
        })
    }
}

fn runner(engine: Arc<Scripted>) -> CodeRunner {
    CodeRunner::new(Registry::builtin(), Budgets::default(), engine)
}

#[tokio::test]
async fn python_hello_succeeds() {
    let engine = Scripted::new(EngineResponse {
        compile: None,
        run: Some(RunStage { stdout: Some("hi\n".into()), stderr: Some(String::new()), code: Some(0), signal: None }),
    });
    let result = runner(engine.clone()).run_code("python", "print(\"hi\")", None).await.unwrap();

    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.stdout, "hi\n");
    assert_eq!(result.exit_code, 0);

    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen[0].language.engine_language, "python");
    assert_eq!(seen[0].language.filename, "main.py");
    assert_eq!(seen[0].stdin, "");
    assert_eq!(seen[0].budgets, Budgets::default());
}

#[tokio::test]
async fn cpp_syntax_error_is_compile_error() {
    let engine = Scripted::new(EngineResponse {
        compile: Some(CompileStage {
            output: None,
            stderr: Some("error: expected ';' before '}' token".into()),
            code: Some(1),
        }),
        run: None,
    });
    let result = runner(engine.clone())
        .run_code("cpp", "int main() { return 0 }", None)
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::CompileError);
    assert_eq!(result.stdout, "");
    assert!(result.message.starts_with(COMPILE_ERROR_MARKER));
    assert_eq!(engine.seen.lock().unwrap()[0].language.engine_language, "c++");
}

#[tokio::test]
async fn infinite_loop_is_time_limit_exceeded() {
    let engine = Scripted::new(EngineResponse {
        compile: None,
        run: Some(RunStage {
            stdout: Some("looping...".into()),
            stderr: None,
            code: Some(137),
            signal: Some("SIGKILL".into()),
        }),
    });
    let result = runner(engine).run_code("python", "while True: pass", None).await.unwrap();

    assert_eq!(result.outcome, Outcome::TimeLimitExceeded);
    assert_eq!(result.stdout, "");
}

#[tokio::test]
async fn stdin_is_forwarded() {
    let engine = Scripted::new(EngineResponse::default());
    runner(engine.clone())
        .run_code("javascript", "process.stdin.pipe(process.stdout)", Some("line\n"))
        .await
        .unwrap();
    assert_eq!(engine.seen.lock().unwrap()[0].stdin, "line\n");
}

#[tokio::test]
async fn missing_language_never_dispatches() {
    let engine = Scripted::new(EngineResponse::default());
    let err = runner(engine.clone()).run_code("", "print(1)", None).await.unwrap_err();
    assert!(matches!(err, RunError::Validation(ValidationError::MissingLanguage)));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rapid_double_run_dispatches_once() {
    let engine = Scripted::new(EngineResponse::default());
    let mut session = RunSession::new(runner(engine.clone()), "python");

    assert_eq!(session.run(), Ok(RunTrigger::Started));
    assert_eq!(session.run(), Ok(RunTrigger::AlreadyRunning));

    let result = session.settle().await.cloned().unwrap();
    assert_eq!(result.outcome, Outcome::Success);
    assert!(matches!(session.phase(), Phase::Resolved(_)));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}
