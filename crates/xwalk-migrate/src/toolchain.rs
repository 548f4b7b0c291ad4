//! Android toolchain invocation
//!
//! The build is described as an OS-independent list of [`BuildStep`]s and
//! rendered into one composite command by a [`ShellFlavor`]. Commands run
//! through a [`CommandRunner`] so the pipeline can be driven without an SDK.

use crate::error::{MigrateError, MigrateResult};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tracing::debug;

/// Captured result of a shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes a rendered script through a shell
pub trait CommandRunner {
    fn run(&self, shell: &dyn ShellFlavor, script: &str) -> io::Result<CommandOutput>;
}

/// Runs scripts with the host's command interpreter
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, shell: &dyn ShellFlavor, script: &str) -> io::Result<CommandOutput> {
        let (program, flag) = shell.interpreter();
        debug!(program, script, "spawning shell");

        let mut command = Command::new(program);
        command.arg(flag);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.raw_arg(script);
        }
        #[cfg(not(windows))]
        command.arg(script);

        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?
            .wait_with_output()?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// One logical step of the library build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    SetEnv { name: &'static str, value: String },
    ChangeDir(PathBuf),
    /// `android update project` against a target id
    UpdateProject { target: String },
    /// `ant debug`
    DebugBuild,
    RemoveDirs(Vec<&'static str>),
}

/// Inputs of the library build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub sdk_root: PathBuf,
    pub library_dir: PathBuf,
    pub target: String,
}

impl BuildPlan {
    /// Steps in execution order
    pub fn steps(&self) -> Vec<BuildStep> {
        vec![
            BuildStep::SetEnv {
                name: "ANDROID_HOME",
                value: self.sdk_root.display().to_string(),
            },
            BuildStep::ChangeDir(self.library_dir.clone()),
            BuildStep::UpdateProject {
                target: self.target.clone(),
            },
            BuildStep::DebugBuild,
            BuildStep::RemoveDirs(vec!["bin", "gen"]),
        ]
    }
}

/// Shell syntax for rendering build steps
pub trait ShellFlavor {
    fn name(&self) -> &'static str;

    /// Interpreter program and its "run this string" flag
    fn interpreter(&self) -> (&'static str, &'static str);

    /// Name of the SDK's `android` launcher
    fn android_tool(&self) -> &'static str;

    fn render_step(&self, step: &BuildStep) -> String;

    /// Join steps into one command that stops at the first failure
    fn render(&self, steps: &[BuildStep]) -> String {
        steps
            .iter()
            .map(|step| self.render_step(step))
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

/// `sh -c` rendering: `export`, `cd`, `rm -rf`
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixShell;

impl ShellFlavor for PosixShell {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn interpreter(&self) -> (&'static str, &'static str) {
        ("sh", "-c")
    }

    fn android_tool(&self) -> &'static str {
        "android"
    }

    fn render_step(&self, step: &BuildStep) -> String {
        match step {
            BuildStep::SetEnv { name, value } => format!("export {}={}", name, posix_quote(value)),
            BuildStep::ChangeDir(dir) => format!("cd {}", posix_quote(&dir.display().to_string())),
            BuildStep::UpdateProject { target } => {
                update_project(self.android_tool(), &posix_quote(target))
            }
            BuildStep::DebugBuild => "ant debug".to_string(),
            BuildStep::RemoveDirs(dirs) => format!("rm -rf {}", dirs.join(" ")),
        }
    }
}

/// `cmd /C` rendering: `set`, `cd /d`, `android.bat`, `rmdir /s /q`
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsShell;

impl ShellFlavor for WindowsShell {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn interpreter(&self) -> (&'static str, &'static str) {
        ("cmd", "/C")
    }

    fn android_tool(&self) -> &'static str {
        "android.bat"
    }

    fn render_step(&self, step: &BuildStep) -> String {
        match step {
            BuildStep::SetEnv { name, value } => format!("set \"{}={}\"", name, value),
            BuildStep::ChangeDir(dir) => format!("cd /d \"{}\"", dir.display()),
            BuildStep::UpdateProject { target } => {
                update_project(self.android_tool(), &format!("\"{}\"", target))
            }
            BuildStep::DebugBuild => "ant debug".to_string(),
            BuildStep::RemoveDirs(dirs) => format!("rmdir /s /q {}", dirs.join(" ")),
        }
    }
}

/// `quoted_target` is already quoted for the shell
fn update_project(tool: &str, quoted_target: &str) -> String {
    format!(
        "{} update project --subprojects --path . --target {}",
        tool, quoted_target
    )
}

fn posix_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Operating system family of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    Posix,
    Windows,
}

impl HostFamily {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    pub fn shell(self) -> &'static dyn ShellFlavor {
        match self {
            Self::Posix => &PosixShell,
            Self::Windows => &WindowsShell,
        }
    }
}

/// Render and run the library build
///
/// A non-zero exit status is a [`MigrateError::Toolchain`]; so is a shell
/// that cannot be spawned, reported with exit code -1.
pub fn run_build(
    runner: &dyn CommandRunner,
    shell: &dyn ShellFlavor,
    plan: &BuildPlan,
) -> MigrateResult<CommandOutput> {
    let script = shell.render(&plan.steps());
    let output = runner
        .run(shell, &script)
        .map_err(|e| MigrateError::Toolchain {
            exit_code: -1,
            stderr: format!("failed to spawn {}: {}", shell.interpreter().0, e),
        })?;

    if !output.success() {
        return Err(MigrateError::Toolchain {
            exit_code: output.exit_code,
            stderr: output.stderr,
        });
    }

    Ok(output)
}

fn target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"id:\s*\d+\s+or\s+"android-(\d+)""#).expect("target pattern is valid")
    })
}

/// Highest API level target in `android list targets` output
pub fn parse_highest_target(listing: &str) -> Option<String> {
    target_pattern()
        .captures_iter(listing)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .map(|level| format!("android-{}", level))
}

/// Pick the highest installed target by asking the SDK
pub fn discover_target(runner: &dyn CommandRunner, shell: &dyn ShellFlavor) -> MigrateResult<String> {
    let guidance = "Install an SDK platform with the Android SDK manager, or pass --target";
    let script = format!("{} list targets", shell.android_tool());

    let output = runner.run(shell, &script).map_err(|e| {
        MigrateError::precondition(format!("Cannot run `{}`: {}", script, e), guidance)
    })?;
    if !output.success() {
        return Err(MigrateError::precondition(
            format!("`{}` exited with status {}", script, output.exit_code),
            guidance,
        ));
    }

    let target = parse_highest_target(&output.stdout).ok_or_else(|| {
        MigrateError::precondition("No Android targets are installed", guidance)
    })?;
    debug!(%target, "discovered target");
    Ok(target)
}

/// SDK root for a launcher at `<sdk>/tools/android`
pub fn sdk_root_from_tool(tool: &Path) -> Option<PathBuf> {
    tool.parent()?.parent().map(Path::to_path_buf)
}

/// Locate the SDK root through the `android` launcher on `PATH`
pub fn discover_sdk_root() -> MigrateResult<PathBuf> {
    let guidance = "Install the Android SDK and put its tools directory on PATH, or set ANDROID_HOME";

    let tool = which::which("android").map_err(|e| {
        MigrateError::precondition(format!("Cannot find the `android` tool: {}", e), guidance)
    })?;
    let root = sdk_root_from_tool(&tool).ok_or_else(|| {
        MigrateError::precondition(
            format!("Cannot derive the SDK root from {}", tool.display()),
            guidance,
        )
    })?;
    debug!(path = %root.display(), "discovered SDK root");
    Ok(root)
}
