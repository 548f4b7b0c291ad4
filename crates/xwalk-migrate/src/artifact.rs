//! Download plan for Crosswalk Cordova bundles
//!
//! Everything here is a pure function of the [`ReleaseConfiguration`].

use std::path::PathBuf;
use xwalk_config::{Architecture, ReleaseChannel, ReleaseConfiguration};

/// One archive to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub architecture: Architecture,
    pub url: String,
    /// Extraction directory, shared by every target of a plan
    pub destination: PathBuf,
}

/// Archive file name for a bundle
pub fn archive_name(version: &str, arch: Architecture) -> String {
    format!("crosswalk-cordova-{}-{}.zip", version, arch.name())
}

/// Download URL of a bundle archive
pub fn archive_url(base_url: &str, channel: ReleaseChannel, version: &str, arch: Architecture) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        channel.name(),
        version,
        arch.name(),
        archive_name(version, arch)
    )
}

/// Local directory the bundle is extracted into: `<cache_root>/<channel>`
pub fn bundle_dir(config: &ReleaseConfiguration) -> PathBuf {
    config.cache_root.join(config.channel.name())
}

/// Targets selected by the configuration's architecture filter
///
/// No filter yields every supported architecture; an unrecognized filter
/// yields nothing and callers must treat that as a configuration error.
pub fn resolve_download_targets(config: &ReleaseConfiguration) -> Vec<DownloadTarget> {
    let destination = bundle_dir(config);
    config
        .architecture
        .selected()
        .into_iter()
        .map(|arch| DownloadTarget {
            architecture: arch,
            url: archive_url(
                &config.base_url,
                config.channel,
                &config.artifact_version,
                arch,
            ),
            destination: destination.clone(),
        })
        .collect()
}
