use clap::Parser;
use sortdir::cli::{RunOptions, run};
use sortdir::output::OutputFormatter;
use sortdir::prompt::ConsolePrompt;
use std::env;
use std::path::PathBuf;
use std::process;

/// Environment variable naming the directory to organize.
const TARGET_ENV_VAR: &str = "FOLDER_PATH";

#[derive(Parser)]
#[command(name = "sortdir")]
#[command(version)]
#[command(about = "Sort a directory's files into extension-based subfolders")]
struct Cli {
    /// Path of the folder-to-extensions mapping file.
    #[arg(long, default_value = "folders.json")]
    mapping: PathBuf,

    /// Scan rules file (TOML); defaults to the lookup cascade.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Report planned moves without touching the filesystem.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    let cli = Cli::parse();

    let target = match env::var(TARGET_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => {
            OutputFormatter::error(&format!(
                "{} must be set to the directory to organize",
                TARGET_ENV_VAR
            ));
            process::exit(1);
        }
    };

    let opts = RunOptions {
        target,
        mapping: cli.mapping,
        rules: cli.rules,
        dry_run: cli.dry_run,
    };

    let mut prompts = ConsolePrompt::new();
    if let Err(e) = run(&opts, &mut prompts) {
        OutputFormatter::error(&e.to_string());
        process::exit(1);
    }
}
