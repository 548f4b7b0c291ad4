//! Migrate command - run the Crosswalk pipeline against a Cordova project

use crate::reporter::{ConsoleReporter, Verbosity};
use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;
use xwalk_config::{ConfigLoader, Overrides};
use xwalk_migrate::{HttpFetcher, Pipeline, ShellRunner};

/// Migrate command arguments
pub struct MigrateArgs {
    pub project_dir: PathBuf,
    pub channel: Option<String>,
    pub bundle_version: Option<String>,
    pub target: Option<String>,
    pub arch: Option<String>,
    pub preserve: bool,
    pub force: bool,
    pub json: bool,
    pub verbosity: Verbosity,
}

/// Run the migration
pub fn run(args: MigrateArgs) -> Result<()> {
    let overrides = Overrides {
        channel: args.channel,
        artifact_version: args.bundle_version,
        target: args.target,
        architecture: args.arch,
        preserve_existing: args.preserve,
        force_override: args.force,
        cache_dir: None,
    };

    let config = ConfigLoader::new()
        .load(&args.project_dir, overrides)
        .context("Invalid configuration")?;
    tracing::debug!(?config, "resolved configuration");

    let fetcher =
        HttpFetcher::new(config.download_timeout).context("Failed to create HTTP client")?;

    // JSON output owns stdout; progress is suppressed
    let verbosity = if args.json {
        Verbosity::Quiet
    } else {
        args.verbosity
    };
    let reporter = ConsoleReporter::new(verbosity);

    if verbosity != Verbosity::Quiet {
        println!(
            "Migrating {} to Crosswalk {} ({} channel)",
            config.project_root.display().to_string().bold(),
            config.artifact_version,
            config.channel
        );
        if !config.uses_default_version() {
            println!(
                "  {} overrides the {} channel's pinned bundle {}",
                config.artifact_version,
                config.channel,
                config.channel.default_artifact_version()
            );
        }
    }

    match Pipeline::new(&config, &fetcher, &ShellRunner, &reporter).run() {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if verbosity != Verbosity::Quiet {
                print_build_output(&report.build_stdout);
                println!();
                println!("{}", report.summary.green().bold());
            }
            Ok(())
        }
        Err(failure) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "success": false,
                        "stage": failure.stage,
                        "kind": failure.error.kind(),
                        "error": failure.error.to_string(),
                        "guidance": failure.error.guidance(),
                        "stages": failure.stages,
                    }))?
                );
            }
            // The reporter has already shown the failed stage and its hint
            tracing::debug!(error = %failure, "pipeline failed");
            std::process::exit(1);
        }
    }
}

fn print_build_output(stdout: &str) {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return;
    }
    println!();
    for line in stdout.lines() {
        println!("  {}", line.dimmed());
    }
}
