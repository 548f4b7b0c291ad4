//! The resolved, immutable configuration of one migration run

use crate::architecture::ArchitectureFilter;
use crate::channel::ReleaseChannel;
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Download host for Crosswalk Android bundles
pub const DEFAULT_BASE_URL: &str = "https://download.01.org/crosswalk/releases/crosswalk/android";

/// Cache directory name under the project root
pub const DEFAULT_CACHE_DIR: &str = ".xwalkify";

/// Default HTTP timeout for a single bundle download
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Characters a target id may not contain; it ends up in a shell command line
const TARGET_FORBIDDEN: &[char] = &['"', '\'', '`', '$', '%', ';', '&', '|', '<', '>', '\\'];

/// Configuration of a single migration run
///
/// Constructed once through [`ReleaseConfigBuilder`] and then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseConfiguration {
    /// Release channel
    pub channel: ReleaseChannel,
    /// Crosswalk bundle version to download
    pub artifact_version: String,
    /// cordova-android version the project must report
    pub required_platform_version: String,
    /// Android build target (e.g. "android-19"), discovered when absent
    pub target_platform_id: Option<String>,
    /// Architectures to download
    pub architecture: ArchitectureFilter,
    /// Reuse a previously downloaded bundle
    pub preserve_existing: bool,
    /// Proceed despite a version mismatch
    pub force_override: bool,
    /// Cordova project root
    pub project_root: PathBuf,
    /// Where bundles are downloaded and extracted
    pub cache_root: PathBuf,
    /// Download host
    pub base_url: String,
    /// Android SDK root, discovered when absent
    pub sdk_root: Option<PathBuf>,
    /// HTTP timeout for one bundle download
    pub download_timeout: Duration,
}

impl ReleaseConfiguration {
    /// Start building a configuration for the given project
    pub fn builder(project_root: impl Into<PathBuf>) -> ReleaseConfigBuilder {
        ReleaseConfigBuilder::new(project_root)
    }

    /// Whether the bundle version is the channel's pinned default
    pub fn uses_default_version(&self) -> bool {
        self.artifact_version == self.channel.default_artifact_version()
    }
}

/// Builder for [`ReleaseConfiguration`]
#[derive(Debug, Clone)]
pub struct ReleaseConfigBuilder {
    channel: ReleaseChannel,
    artifact_version: Option<String>,
    target_platform_id: Option<String>,
    architecture: ArchitectureFilter,
    preserve_existing: bool,
    force_override: bool,
    project_root: PathBuf,
    cache_root: Option<PathBuf>,
    base_url: Option<String>,
    sdk_root: Option<PathBuf>,
    download_timeout: Duration,
}

impl ReleaseConfigBuilder {
    /// Create a builder with channel defaults
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            channel: ReleaseChannel::default(),
            artifact_version: None,
            target_platform_id: None,
            architecture: ArchitectureFilter::All,
            preserve_existing: false,
            force_override: false,
            project_root: project_root.into(),
            cache_root: None,
            base_url: None,
            sdk_root: None,
            download_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn channel(mut self, channel: ReleaseChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Override the channel's default bundle version
    pub fn artifact_version(mut self, version: impl Into<String>) -> Self {
        self.artifact_version = Some(version.into());
        self
    }

    pub fn target_platform_id(mut self, target: impl Into<String>) -> Self {
        self.target_platform_id = Some(target.into());
        self
    }

    pub fn architecture(mut self, filter: ArchitectureFilter) -> Self {
        self.architecture = filter;
        self
    }

    pub fn preserve_existing(mut self, preserve: bool) -> Self {
        self.preserve_existing = preserve;
        self
    }

    pub fn force_override(mut self, force: bool) -> Self {
        self.force_override = force;
        self
    }

    pub fn cache_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(path.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn sdk_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.sdk_root = Some(path.into());
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> ConfigResult<ReleaseConfiguration> {
        self.architecture.validate()?;

        let artifact_version = match self.artifact_version {
            Some(version) => {
                validate_bundle_version(&version)?;
                version
            }
            None => self.channel.default_artifact_version().to_string(),
        };

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "download.base_url".to_string(),
                reason: format!("'{}' is not an http(s) URL", base_url),
            });
        }

        if let Some(target) = &self.target_platform_id {
            if target.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "target".to_string(),
                    reason: "target platform id must not be empty".to_string(),
                });
            }
            if let Some(c) = target
                .chars()
                .find(|c| c.is_control() || TARGET_FORBIDDEN.contains(c))
            {
                return Err(ConfigError::InvalidValue {
                    field: "target".to_string(),
                    reason: format!("target platform id '{}' contains {:?}", target, c),
                });
            }
        }

        let cache_root = self
            .cache_root
            .unwrap_or_else(|| default_cache_root(&self.project_root));

        Ok(ReleaseConfiguration {
            channel: self.channel,
            artifact_version,
            required_platform_version: self.channel.required_platform_version().to_string(),
            target_platform_id: self.target_platform_id,
            architecture: self.architecture,
            preserve_existing: self.preserve_existing,
            force_override: self.force_override,
            project_root: self.project_root,
            cache_root,
            base_url: base_url.trim_end_matches('/').to_string(),
            sdk_root: self.sdk_root,
            download_timeout: self.download_timeout,
        })
    }
}

/// Default bundle cache for a project
pub fn default_cache_root(project_root: &Path) -> PathBuf {
    project_root.join(DEFAULT_CACHE_DIR)
}

fn validate_bundle_version(version: &str) -> ConfigResult<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^\d+(\.\d+){1,3}$").expect("bundle version pattern is valid")
    });

    if pattern.is_match(version) {
        Ok(())
    } else {
        Err(ConfigError::InvalidVersion(version.to_string()))
    }
}
