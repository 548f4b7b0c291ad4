//! Migration pipeline
//!
//! A linear state machine:
//!
//! ```text
//! Init -> EnvironmentCheck -> VersionCheck -> Download -> Replace
//!      -> ManifestPatch -> ToolchainBuild -> Done
//! ```
//!
//! Any stage may fail, which ends the run in `Failed(stage)`. There is no
//! retry and no rollback: a failure after `Replace` leaves the project
//! partly migrated.

use crate::artifact::{bundle_dir, resolve_download_targets};
use crate::error::{MigrateError, MigrateResult};
use crate::fetch::{fetch_all, remove_tree, Fetcher};
use crate::layout::{BundleLayout, ProjectLayout};
use crate::manifest::patch_manifest;
use crate::replace::replace_framework;
use crate::reporter::Reporter;
use crate::toolchain::{
    discover_sdk_root, discover_target, run_build, BuildPlan, CommandRunner, HostFamily,
    ShellFlavor,
};
use crate::version::check_version;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};
use xwalk_config::ReleaseConfiguration;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Init,
    EnvironmentCheck,
    VersionCheck,
    Download,
    Replace,
    ManifestPatch,
    ToolchainBuild,
    Done,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::EnvironmentCheck => "environment-check",
            Self::VersionCheck => "version-check",
            Self::Download => "download",
            Self::Replace => "replace",
            Self::ManifestPatch => "manifest-patch",
            Self::ToolchainBuild => "toolchain-build",
            Self::Done => "done",
        }
    }

    /// Human-readable description for progress output
    pub fn description(&self) -> &'static str {
        match self {
            Self::Init => "Starting",
            Self::EnvironmentCheck => "Checking environment",
            Self::VersionCheck => "Checking cordova-android version",
            Self::Download => "Downloading Crosswalk bundle",
            Self::Replace => "Replacing CordovaLib",
            Self::ManifestPatch => "Patching AndroidManifest.xml",
            Self::ToolchainBuild => "Building CordovaLib",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Successful run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub channel: String,
    pub artifact_version: String,
    pub target_platform_id: String,
    /// Stages visited, ending with `Done`
    pub stages: Vec<Stage>,
    pub download_skipped: bool,
    pub permissions_added: Vec<String>,
    pub build_stdout: String,
    pub summary: String,
}

/// Run that ended in `Failed(stage)`
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: MigrateError,
    /// Stages visited, ending with the failed one
    pub stages: Vec<Stage>,
}

pub type PipelineResult = Result<PipelineReport, PipelineFailure>;

/// What a stage hands back to the driver
enum Transition {
    Advance(Stage),
    Skip { next: Stage, reason: String },
}

/// Values discovered while running
#[derive(Default)]
struct RunState {
    stages: Vec<Stage>,
    sdk_root: Option<PathBuf>,
    target: Option<String>,
    download_skipped: bool,
    permissions_added: Vec<String>,
    build_stdout: String,
}

/// Drives one migration of one project
pub struct Pipeline<'a> {
    config: &'a ReleaseConfiguration,
    layout: ProjectLayout,
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
    shell: &'a dyn ShellFlavor,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline using the host's shell flavor
    pub fn new(
        config: &'a ReleaseConfiguration,
        fetcher: &'a dyn Fetcher,
        runner: &'a dyn CommandRunner,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            layout: ProjectLayout::new(&config.project_root),
            fetcher,
            runner,
            reporter,
            shell: HostFamily::current().shell(),
        }
    }

    /// Override the shell flavor used to render commands
    pub fn with_shell(mut self, shell: &'a dyn ShellFlavor) -> Self {
        self.shell = shell;
        self
    }

    /// Run every stage until `Done` or the first failure
    pub fn run(&self) -> PipelineResult {
        let mut state = RunState::default();
        let mut stage = Stage::Init;

        loop {
            state.stages.push(stage);
            if stage == Stage::Done {
                break;
            }

            self.reporter.stage_started(stage);
            info!(stage = stage.name(), "entering stage");

            match self.step(stage, &mut state) {
                Ok(Transition::Advance(next)) => {
                    self.reporter.stage_finished(stage);
                    stage = next;
                }
                Ok(Transition::Skip { next, reason }) => {
                    info!(stage = stage.name(), %reason, "stage skipped");
                    self.reporter.stage_skipped(stage, &reason);
                    stage = next;
                }
                Err(error) => {
                    warn!(stage = stage.name(), kind = error.kind(), %error, "stage failed");
                    self.reporter.stage_failed(stage, &error);
                    return Err(PipelineFailure {
                        stage,
                        error,
                        stages: state.stages,
                    });
                }
            }
        }

        Ok(self.report(state))
    }

    fn step(&self, stage: Stage, state: &mut RunState) -> MigrateResult<Transition> {
        match stage {
            Stage::Init => Ok(Transition::Advance(Stage::EnvironmentCheck)),
            Stage::EnvironmentCheck => self.check_environment(state),
            Stage::VersionCheck => self.verify_platform_version(),
            Stage::Download => self.download(state),
            Stage::Replace => self.replace(),
            Stage::ManifestPatch => self.add_permissions(state),
            Stage::ToolchainBuild => self.build(state),
            Stage::Done => Ok(Transition::Advance(Stage::Done)),
        }
    }

    fn check_environment(&self, state: &mut RunState) -> MigrateResult<Transition> {
        let marker = self.layout.platform_version_marker();
        if !marker.is_file() {
            return Err(MigrateError::precondition(
                format!(
                    "No Android platform found in {} (missing {})",
                    self.layout.root().display(),
                    marker.display()
                ),
                "Add the platform first with `cordova platform add android`",
            ));
        }

        let sdk_root = match &self.config.sdk_root {
            Some(root) => root.clone(),
            None => discover_sdk_root()?,
        };
        let target = match &self.config.target_platform_id {
            Some(target) => target.clone(),
            None => {
                self.reporter.info("No target given, asking the SDK for installed targets");
                discover_target(self.runner, self.shell)?
            }
        };

        debug!(sdk_root = %sdk_root.display(), %target, "resolved toolchain");
        state.sdk_root = Some(sdk_root);
        state.target = Some(target);
        Ok(Transition::Advance(Stage::VersionCheck))
    }

    fn verify_platform_version(&self) -> MigrateResult<Transition> {
        let required = &self.config.required_platform_version;
        let probe = check_version(&self.layout, required)?;

        if !probe.matches {
            if !self.config.force_override {
                return Err(MigrateError::precondition(
                    format!(
                        "The {} channel requires cordova-android {}, but the project reports: {}",
                        self.config.channel, required, probe.raw_output
                    ),
                    format!(
                        "Install cordova-android {} (`cordova platform add android@{}`) or re-run with --force",
                        required, required
                    ),
                ));
            }

            let message = format!(
                "cordova-android {} is required but not detected; continuing because of --force",
                required
            );
            warn!(%required, found = %probe.raw_output, "version mismatch overridden");
            self.reporter.warn(&message);
        }

        Ok(Transition::Advance(Stage::Download))
    }

    fn download(&self, state: &mut RunState) -> MigrateResult<Transition> {
        let destination = bundle_dir(self.config);

        if self.config.preserve_existing && destination.is_dir() {
            state.download_skipped = true;
            return Ok(Transition::Skip {
                next: Stage::Replace,
                reason: format!("reusing existing bundle at {}", destination.display()),
            });
        }

        let targets = resolve_download_targets(self.config);
        if targets.is_empty() {
            return Err(MigrateError::Configuration(format!(
                "no download targets for architecture '{}'",
                self.config.architecture
            )));
        }

        remove_tree(&destination).map_err(|e| MigrateError::filesystem(&destination, e))?;

        for target in &targets {
            self.reporter
                .info(&format!("Fetching {} bundle from {}", target.architecture, target.url));
        }
        fetch_all(self.fetcher, &targets)?;

        Ok(Transition::Advance(Stage::Replace))
    }

    fn replace(&self) -> MigrateResult<Transition> {
        let bundle = BundleLayout::new(bundle_dir(self.config));
        replace_framework(&self.layout, &bundle)?;
        Ok(Transition::Advance(Stage::ManifestPatch))
    }

    fn add_permissions(&self, state: &mut RunState) -> MigrateResult<Transition> {
        let edit = patch_manifest(&self.layout)?;
        for permission in &edit.added {
            self.reporter.info(&format!("Added permission {}", permission));
        }
        if edit.removed_duplicates > 0 {
            self.reporter.info(&format!(
                "Removed {} duplicate permission declaration(s)",
                edit.removed_duplicates
            ));
        }
        state.permissions_added = edit.added;
        Ok(Transition::Advance(Stage::ToolchainBuild))
    }

    fn build(&self, state: &mut RunState) -> MigrateResult<Transition> {
        let (Some(sdk_root), Some(target)) = (state.sdk_root.clone(), state.target.clone()) else {
            return Err(MigrateError::Configuration(
                "toolchain was not resolved before the build stage".to_string(),
            ));
        };

        let plan = BuildPlan {
            sdk_root,
            library_dir: self.layout.library_dir(),
            target,
        };
        let output = run_build(self.runner, self.shell, &plan)?;
        debug!(stdout = %output.stdout.trim(), "toolchain output");

        state.build_stdout = output.stdout;
        Ok(Transition::Advance(Stage::Done))
    }

    fn report(&self, state: RunState) -> PipelineReport {
        let target = state.target.unwrap_or_default();
        let summary = format!(
            "CordovaLib replaced with Crosswalk {} from the {} channel and built for {}",
            self.config.artifact_version, self.config.channel, target
        );

        PipelineReport {
            channel: self.config.channel.name().to_string(),
            artifact_version: self.config.artifact_version.clone(),
            target_platform_id: target,
            stages: state.stages,
            download_skipped: state.download_skipped,
            permissions_added: state.permissions_added,
            build_stdout: state.build_stdout,
            summary,
        }
    }
}
