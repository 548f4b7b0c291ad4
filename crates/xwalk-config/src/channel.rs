//! Release channels
//!
//! Each channel pins a Crosswalk bundle version and the cordova-android
//! version a project must be on before that bundle can be dropped in.

use crate::{ConfigError, ConfigResult};
use std::fmt;
use std::str::FromStr;

/// Named Crosswalk distribution track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ReleaseChannel {
    #[default]
    Stable,
    Beta,
    Canary,
}

/// Pinned versions for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPins {
    /// Crosswalk bundle version downloaded by default
    pub artifact_version: &'static str,
    /// cordova-android version the project must report
    pub required_platform_version: &'static str,
}

impl ReleaseChannel {
    /// Get channel name as used in download URLs and cache paths
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Canary => "canary",
        }
    }

    /// Get all channels in display order
    pub fn all() -> [ReleaseChannel; 3] {
        [Self::Stable, Self::Beta, Self::Canary]
    }

    /// Get the pinned versions for this channel
    pub fn pins(&self) -> ChannelPins {
        match self {
            Self::Stable => ChannelPins {
                artifact_version: "10.39.235.15",
                required_platform_version: "3.7.1",
            },
            Self::Beta => ChannelPins {
                artifact_version: "11.40.277.7",
                required_platform_version: "3.7.1",
            },
            Self::Canary => ChannelPins {
                artifact_version: "12.41.296.0",
                required_platform_version: "4.0.0",
            },
        }
    }

    /// Default bundle version for this channel
    pub fn default_artifact_version(&self) -> &'static str {
        self.pins().artifact_version
    }

    /// cordova-android version required by this channel
    pub fn required_platform_version(&self) -> &'static str {
        self.pins().required_platform_version
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReleaseChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "beta" => Ok(Self::Beta),
            "canary" => Ok(Self::Canary),
            _ => Err(ConfigError::UnknownChannel(s.to_string())),
        }
    }
}
