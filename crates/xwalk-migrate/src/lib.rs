//! Crosswalk migration for Cordova Android projects
//!
//! Replaces a project's `platforms/android/CordovaLib` with the framework
//! from a Crosswalk Cordova bundle:
//! - Version gating against the channel's required cordova-android release
//! - Per-architecture bundle download and extraction
//! - Library subtree replacement and VERSION propagation
//! - AndroidManifest.xml permission patching
//! - Rebuilding the library with the Android SDK toolchain
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use xwalk_config::ReleaseConfiguration;
//! use xwalk_migrate::{HttpFetcher, NullReporter, Pipeline, ShellRunner};
//!
//! let config = ReleaseConfiguration::builder("my-app").build()?;
//! let fetcher = HttpFetcher::new(Duration::from_secs(300))?;
//! let report = Pipeline::new(&config, &fetcher, &ShellRunner, &NullReporter).run()?;
//! println!("{}", report.summary);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod artifact;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod replace;
pub mod reporter;
pub mod toolchain;
pub mod version;

pub use artifact::{archive_url, bundle_dir, resolve_download_targets, DownloadTarget};
pub use error::{MigrateError, MigrateResult};
pub use fetch::{extract_archive, fetch_all, Fetcher, HttpFetcher};
pub use layout::{BundleLayout, ProjectLayout};
pub use manifest::{
    ensure_permissions, patch_manifest, ManifestDocument, PermissionDecl, PermissionEdit,
    REQUIRED_PERMISSIONS,
};
pub use pipeline::{Pipeline, PipelineFailure, PipelineReport, PipelineResult, Stage};
pub use replace::replace_framework;
pub use reporter::{NullReporter, Reporter};
pub use toolchain::{
    discover_sdk_root, discover_target, run_build, BuildPlan, BuildStep, CommandOutput,
    CommandRunner, HostFamily, PosixShell, ShellFlavor, ShellRunner, WindowsShell,
};
pub use version::{check_version, VersionProbe};
