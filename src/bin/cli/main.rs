//! CLI tool that rewrites SourceFile attributes in jar, aar and zip files.
//!
//! Usage: `sourcefile-fixer INPUT OUTPUT`. Progress is logged to stderr at
//! info level; set `RUST_LOG=sourcefile_fixer=debug` to see every rewritten
//! class.

mod exit_codes;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use sourcefile_fixer::{AtomicProgress, FixOptions, Fixer};

use exit_codes::ExitCode;

/// Restores meaningful SourceFile attributes in obfuscated class files
#[derive(Parser)]
#[command(name = "sourcefile-fixer")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Input .jar, .aar, .zip or class file
    input: PathBuf,

    /// Output file; its extension decides how nested archives are packed
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // info on stderr by default; RUST_LOG overrides
    env_logger::Builder::new()
        .filter_module("sourcefile_fixer", log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let progress = AtomicProgress::shared();

    // First Ctrl+C cancels the run, the second one exits immediately
    let handler_progress = Arc::clone(&progress);
    let interrupted = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupted");
            std::process::exit(exit_codes::USER_INTERRUPT);
        }
        eprintln!("\nCancelling...");
        handler_progress.cancel();
    })
    .ok();

    let exit_code = run(&cli, progress);
    std::process::exit(exit_code.code());
}

fn run(cli: &Cli, progress: Arc<AtomicProgress>) -> ExitCode {
    let mut fixer = Fixer::new(FixOptions::new().progress(Arc::clone(&progress)));
    match fixer.run(&cli.input, &cli.output) {
        Ok(report) => {
            log::info!(
                "{} of {} classes rewritten in {:.2?}",
                report.units_rewritten,
                report.units_parsed,
                progress.elapsed()
            );
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("error: {} during {}", e, fixer.state());
            exit_codes::error_to_exit_code(&e)
        }
    }
}
