//! Modulo build and diagnostic tasks.
//!
//! Usage:
//!   modulo-cli golden-exports [--update]
//!   modulo-cli compile-sanity
//!   modulo-cli validate-target-packs
//!   modulo-cli lint-no-version-labels

mod compile_sanity;
mod diagnostics;
mod env;
mod fixtures;
mod golden;
mod health;
mod lint;
mod validate_targets;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "modulo-cli", about = "Modulo build and diagnostic tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate or compare golden export fixtures
    GoldenExports {
        /// Regenerate golden_exports.json instead of comparing against it
        #[arg(long)]
        update: bool,
    },
    /// Emit representative exports and invoke the target toolchains
    CompileSanity,
    /// Schema-check every registered target pack
    ValidateTargetPacks,
    /// Forbid FIX###/STAGE###/BUILD###/REFAC### tokens in source
    LintNoVersionLabels,
    /// Run health probes (mods load, target-pack search dirs) and write a report
    Health,
}

fn main() -> ExitCode {
    env_logger::init();
    let artifact_dir = env::artifact_dir();
    diagnostics::install_panic_hook(artifact_dir.clone());

    let cli = Cli::parse();
    match dispatch(cli.command, &artifact_dir) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(command: Commands, artifact_dir: &Path) -> Result<ExitCode> {
    match command {
        Commands::GoldenExports { update } => run_golden_exports(update, artifact_dir),
        Commands::CompileSanity => run_compile_sanity(artifact_dir),
        Commands::ValidateTargetPacks => run_validate_target_packs(),
        Commands::LintNoVersionLabels => run_lint(),
        Commands::Health => run_health(artifact_dir),
    }
}

fn run_health(artifact_dir: &Path) -> Result<ExitCode> {
    let lines = health::probe();
    let has_error = lines.iter().any(|l| matches!(l.level, diagnostics::HealthLevel::Error));
    let path = diagnostics::write_health_report(artifact_dir, &lines)?;
    println!("wrote health report to {}", path.display());
    Ok(if has_error { ExitCode::from(1) } else { ExitCode::SUCCESS })
}

fn run_golden_exports(update: bool, artifact_dir: &Path) -> Result<ExitCode> {
    let fixtures_path = artifact_dir.join("golden_exports").join("golden_exports.json");

    if update {
        if env::beta_freeze() {
            anyhow::bail!("BETA_FREEZE=1: refusing to regenerate golden_exports.json");
        }
        let golden = golden::regenerate()?;
        golden::write_fixtures(&fixtures_path, &golden)?;
        println!("wrote {} fixture(s) to {}", golden.fixtures.len(), fixtures_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    match golden::compare(&fixtures_path)? {
        golden::Outcome::Match => {
            println!("golden exports match ({})", fixtures_path.display());
            Ok(ExitCode::SUCCESS)
        }
        golden::Outcome::Mismatch(diffs) => {
            let report = golden::write_mismatch_report(artifact_dir, &diffs)?;
            eprintln!("golden export mismatch, see {}", report.display());
            for diff in &diffs {
                eprintln!("  {diff}");
            }
            Ok(ExitCode::from(1))
        }
        golden::Outcome::Missing => {
            eprintln!("no golden_exports.json at {}; run with --update first", fixtures_path.display());
            Ok(ExitCode::from(2))
        }
    }
}

fn run_compile_sanity(artifact_dir: &Path) -> Result<ExitCode> {
    let summary = compile_sanity::run(artifact_dir)?;
    let run_dir = artifact_dir.join("parity_reports").join("compile_sanity");
    let path = compile_sanity::write_summary(&run_dir, &summary)?;
    println!("wrote compile sanity summary to {}", path.display());
    let failed = summary.results.iter().any(|r| r.toolchain_ok == Some(false));
    Ok(if failed { ExitCode::from(1) } else { ExitCode::SUCCESS })
}

fn run_validate_target_packs() -> Result<ExitCode> {
    match validate_targets::run() {
        Ok(ids) => {
            println!("{} target pack(s) valid: {}", ids.len(), ids.join(", "));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::from(1))
        }
    }
}

fn run_lint() -> Result<ExitCode> {
    let root = std::env::current_dir()?;
    let hits = lint::run(&root)?;
    if hits.is_empty() {
        println!("no version labels found");
        Ok(ExitCode::SUCCESS)
    } else {
        for hit in &hits {
            eprintln!("{}:{}: forbidden token '{}'", hit.path.display(), hit.line, hit.token);
        }
        Ok(ExitCode::from(1))
    }
}
