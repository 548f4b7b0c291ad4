//! Platform version probe
//!
//! `cordova platform add android` writes a `cordova/version` script whose
//! text embeds the cordova-android version. A project is compatible with a
//! channel when that text contains the channel's required version.

use crate::error::{MigrateError, MigrateResult};
use crate::layout::ProjectLayout;
use std::fs;
use tracing::debug;

/// Outcome of a version probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    /// Whether the marker embeds the required version
    pub matches: bool,
    /// Marker contents, trimmed
    pub raw_output: String,
}

/// Compare the project's platform version marker against `required`
///
/// The test is a substring match, so any build tag embedding the exact
/// version string is accepted. An unreadable marker is an error, not a
/// mismatch.
pub fn check_version(layout: &ProjectLayout, required: &str) -> MigrateResult<VersionProbe> {
    let marker = layout.platform_version_marker();
    let contents = fs::read_to_string(&marker).map_err(|e| {
        MigrateError::precondition(
            format!(
                "Cannot read platform version marker {}: {}",
                marker.display(),
                e
            ),
            "Re-add the Android platform with `cordova platform add android`",
        )
    })?;

    let probe = VersionProbe {
        matches: contents.contains(required),
        raw_output: contents.trim().to_string(),
    };
    debug!(required, matches = probe.matches, "probed platform version");
    Ok(probe)
}
