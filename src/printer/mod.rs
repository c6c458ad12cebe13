//! Printers: classified results (owo-colors) and the language table (termimad).

use std::time::Duration;

use owo_colors::OwoColorize;
use termimad::MadSkin;

use crate::{
    classify::{ExecutionResult, Outcome},
    languages::Registry,
};

pub struct ResultPrinter {
    pub color: bool,
}

impl ResultPrinter {
    pub fn print(&self, result: &ExecutionResult, elapsed: Option<Duration>) {
        print!("{}", self.render(result, elapsed));
    }

    pub fn render(&self, result: &ExecutionResult, elapsed: Option<Duration>) -> String {
        let mut out = String::new();
        let header = match elapsed {
            Some(d) => format!("{} (exit {}, {} ms)", result.outcome.label(), result.exit_code, d.as_millis()),
            None => format!("{} (exit {})", result.outcome.label(), result.exit_code),
        };
        out.push_str(&self.paint(result.outcome, &header));
        out.push('\n');

        if !result.stdout.is_empty() {
            out.push_str(&result.stdout);
            if !result.stdout.ends_with('\n') {
                out.push('\n');
            }
        }
        if !result.message.is_empty() {
            let msg = if self.color && !result.is_success() {
                format!("{}", result.message.red())
            } else {
                result.message.clone()
            };
            out.push_str(&msg);
            if !result.message.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    fn paint(&self, outcome: Outcome, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match outcome {
            Outcome::Success => format!("{}", text.green().bold()),
            Outcome::CompileError | Outcome::RuntimeError => format!("{}", text.red().bold()),
            Outcome::TimeLimitExceeded | Outcome::MemoryLimitExceeded => format!("{}", text.yellow().bold()),
            Outcome::TransportError => format!("{}", text.magenta().bold()),
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

pub fn languages_markdown(registry: &Registry) -> String {
    let mut md = String::from("|id|engine language|version|file|\n|-|-|-|-|\n");
    for spec in registry.iter() {
        md.push_str(&format!(
            "|{}|{}|{}|{}|\n",
            spec.id, spec.engine_language, spec.engine_version, spec.filename
        ));
    }
    md
}
