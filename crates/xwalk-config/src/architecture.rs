//! Instruction-set selection for bundle downloads

use crate::{ConfigError, ConfigResult};
use std::fmt;
use std::str::FromStr;

/// Supported bundle architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Architecture {
    X86,
    Arm,
}

impl Architecture {
    /// Path segment used in download URLs and archive names
    pub fn name(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Arm => "arm",
        }
    }

    /// All supported architectures, in download order
    pub fn all() -> [Architecture; 2] {
        [Self::X86, Self::Arm]
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" => Ok(Self::X86),
            "arm" => Ok(Self::Arm),
            _ => Err(ConfigError::UnknownArchitecture(s.to_string())),
        }
    }
}

/// Which architectures to fetch
///
/// `Unrecognized` keeps the raw input so a configuration built field by
/// field can still be resolved (to nothing) and rejected downstream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArchitectureFilter {
    /// Fetch every supported architecture
    #[default]
    All,
    /// Fetch a single architecture
    Only(Architecture),
    /// A value that names no supported architecture
    Unrecognized(String),
}

impl ArchitectureFilter {
    /// Build a filter from an optional user-supplied name; never fails
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            None => Self::All,
            Some(raw) => match raw.parse::<Architecture>() {
                Ok(arch) => Self::Only(arch),
                Err(_) => Self::Unrecognized(raw.to_string()),
            },
        }
    }

    /// Architectures selected by this filter
    pub fn selected(&self) -> Vec<Architecture> {
        match self {
            Self::All => Architecture::all().to_vec(),
            Self::Only(arch) => vec![*arch],
            Self::Unrecognized(_) => Vec::new(),
        }
    }

    /// Reject unrecognized values
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Self::Unrecognized(raw) => Err(ConfigError::UnknownArchitecture(raw.clone())),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ArchitectureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("x86+arm"),
            Self::Only(arch) => write!(f, "{}", arch),
            Self::Unrecognized(raw) => write!(f, "{} (unrecognized)", raw),
        }
    }
}
