mod cli;

use std::{
    fs,
    io::{self, Read},
    process::ExitCode,
};

use anyhow::{anyhow, Context, Result};
use coderun::{
    printer::{languages_markdown, MarkdownPrinter, ResultPrinter},
    CodeRunner, Config, Registry, RunSession,
};
use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let args = cli::Cli::parse();

    // Load config
    let cfg = Config::load();
    let registry = Registry::builtin();

    // Informational shortcuts
    if args.list_languages {
        MarkdownPrinter::default().print(&languages_markdown(registry));
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(id) = &args.template {
        let spec = registry
            .resolve(id)
            .ok_or_else(|| anyhow!("unsupported language: {}", id))?;
        print!("{}", spec.template);
        return Ok(ExitCode::SUCCESS);
    }
    if args.show_config {
        let budgets = cfg.budgets();
        println!("config file: {}", cfg.config_path.display());
        println!("engine: {}", cfg.engine_base_url());
        println!("request timeout: {}s", cfg.get_u64("REQUEST_TIMEOUT").unwrap_or(30));
        println!("compile timeout: {}ms", budgets.compile_timeout_ms);
        println!("run timeout: {}ms", budgets.run_timeout_ms);
        println!("compile memory limit: {}", budgets.compile_memory_limit);
        println!("run memory limit: {}", budgets.run_memory_limit);
        return Ok(ExitCode::SUCCESS);
    }

    // Language: --lang, then file extension, then DEFAULT_LANGUAGE
    let language = args
        .lang
        .clone()
        .or_else(|| {
            args.file
                .as_deref()
                .and_then(|p| p.extension())
                .and_then(|e| e.to_str())
                .and_then(|ext| registry.by_extension(ext))
                .map(|spec| spec.id.clone())
        })
        .unwrap_or_else(|| cfg.default_language());

    // Source: FILE, else piped stdin, else the starter template
    let source = match &args.file {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None if !io::stdin().is_terminal() => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Some(buf)
        }
        None => None,
    };

    let program_stdin = match (&args.stdin, &args.stdin_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        (None, None) => String::new(),
    };

    let runner = CodeRunner::from_config(&cfg)?;
    let mut session = RunSession::new(runner, &language);
    if let Some(source) = source {
        session.set_source(source);
    }
    session.set_stdin(program_stdin);

    if let Err(err) = session.run() {
        eprintln!("error: {}", err);
        return Ok(ExitCode::from(2));
    }

    let settled = tokio::select! {
        result = session.settle() => result.cloned(),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(result) = settled else {
        if !session.cancel() {
            tracing::warn!(language = %language, "interrupted with no run in flight");
        }
        eprintln!("cancelled");
        return Ok(ExitCode::from(130));
    };

    if args.json {
        let value = serde_json::json!({
            "language": language,
            "result": result,
            "elapsed_ms": session.last_elapsed().map(|d| d.as_millis() as u64),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let color = !args.no_color && cfg.get_bool("PRETTIFY_OUTPUT") && io::stdout().is_terminal();
        ResultPrinter { color }.print(&result, session.last_elapsed());
    }

    Ok(if result.is_success() { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CODERUN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
