use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod reporter;

use reporter::Verbosity;

/// Move a Cordova Android project onto the Crosswalk runtime.
///
/// Replaces platforms/android/CordovaLib with the framework from a Crosswalk
/// Cordova bundle, adds the permissions Crosswalk needs to
/// AndroidManifest.xml and rebuilds the library with the Android SDK.
///
/// EXAMPLES:
///     xwalkify                        Migrate the project in the current directory
///     xwalkify -c beta -a arm         Use the beta channel, ARM bundle only
///     xwalkify -p                     Reuse a previously downloaded bundle
///     xwalkify -C ~/apps/hello -f     Ignore a cordova-android version mismatch
///     xwalkify channels               List release channels
///
/// ENVIRONMENT VARIABLES:
///     XWALKIFY_CHANNEL    Default release channel
///     XWALKIFY_ARCH       Default architecture (x86 or arm)
///     XWALKIFY_BASE_URL   Bundle download host
///     XWALKIFY_CACHE_DIR  Where bundles are extracted
///     ANDROID_HOME        Android SDK root
///     XWALKIFY_JSON       Set to '1' for JSON output by default
///     NO_COLOR            Set to disable colored output
#[derive(Parser)]
#[command(name = "xwalkify")]
#[command(version)]
#[command(after_help = "Global settings live in ~/.xwalkify/config.toml")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Release channel (stable, beta, canary)
    #[arg(short = 'c', long, value_name = "CHANNEL")]
    channel: Option<String>,

    /// Crosswalk bundle version (defaults to the channel's pinned version)
    #[arg(short = 'x', long, value_name = "VERSION")]
    bundle_version: Option<String>,

    /// Android target platform id, e.g. android-19
    #[arg(short = 't', long, value_name = "ID")]
    target: Option<String>,

    /// Only download the bundle for one architecture (x86, arm)
    #[arg(short = 'a', long, value_name = "ARCH")]
    arch: Option<String>,

    /// Reuse a previously downloaded bundle
    #[arg(short = 'p', long)]
    preserve: bool,

    /// Continue even if the cordova-android version does not match
    #[arg(short = 'f', long)]
    force: bool,

    /// Cordova project directory
    #[arg(short = 'C', long = "project", value_name = "DIR", default_value = ".")]
    project: PathBuf,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List release channels and their pinned versions
    Channels {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     xwalkify completions bash > /etc/bash_completion.d/xwalkify
    ///     xwalkify completions zsh > ~/.zfunc/_xwalkify
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "xwalkify=debug,xwalk_migrate=debug,xwalk_config=debug"
    } else {
        "error"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    if cli_config.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Channels { json }) => {
            commands::channels::run(json || cli_config.default_json)?;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        None => {
            let verbosity = if cli.quiet {
                Verbosity::Quiet
            } else if cli.verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            let args = commands::migrate::MigrateArgs {
                project_dir: cli.project,
                channel: cli.channel,
                bundle_version: cli.bundle_version,
                target: cli.target,
                arch: cli.arch,
                preserve: cli.preserve,
                force: cli.force,
                // Command-line flag overrides environment variable
                json: cli.json || cli_config.default_json,
                verbosity,
            };
            commands::migrate::run(args)?;
        }
    }

    Ok(())
}
