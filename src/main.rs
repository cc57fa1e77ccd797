use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use libpath_patch::{deploy, init_tracing, DEFAULT_LIBRARY_DIR};

/// Move an executable's companion library into another directory and patch
/// the executable to load it from there.
#[derive(Parser)]
#[command(name = "libpath-patch")]
#[command(after_help = "Examples:\n  \
    libpath-patch c:\\temp\\1.exe bin dll    dll\\1.dll  => bin\\1.dll\n  \
    libpath-patch c:\\temp\\2.exe bin        2.dll       => bin\\2.dll")]
struct Cli {
    /// Path to the executable
    executable: PathBuf,

    /// Directory the library moves to, relative to the executable
    #[arg(default_value = DEFAULT_LIBRARY_DIR)]
    new_dir: String,

    /// Directory the library is in now; empty means beside the executable
    old_dir: Option<String>,
}

fn run(cli: Cli) -> Result<()> {
    let old_dir = cli.old_dir.unwrap_or_default();
    deploy(&cli.executable, &cli.new_dir, &old_dir)
        .with_context(|| format!("Failed to relocate library of {}", cli.executable.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    // Usage problems, including --help, exit 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
