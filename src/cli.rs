use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "coderun", about = "Run source code on a remote sandboxed execution engine", version)]
#[command(group(ArgGroup::new("stdin_source").args(["stdin", "stdin_file"]).multiple(false)))]
#[command(group(ArgGroup::new("info").args(["list_languages", "template", "show_config"]).multiple(false)))]
pub struct Cli {
    /// Source file to run. Read from piped stdin when omitted.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Language id (see --list-languages). Inferred from FILE's extension when omitted.
    #[arg(short = 'l', long = "lang")]
    pub lang: Option<String>,

    /// Text passed to the program's standard input.
    #[arg(long)]
    pub stdin: Option<String>,

    /// Read the program's standard input from a file.
    #[arg(long = "stdin-file")]
    pub stdin_file: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// List supported languages.
    #[arg(long = "list-languages", visible_alias = "ll")]
    pub list_languages: bool,

    /// Print the starter template of a language.
    #[arg(long, value_name = "LANG")]
    pub template: Option<String>,

    /// Show the effective engine URL and budgets.
    #[arg(long = "show-config")]
    pub show_config: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
