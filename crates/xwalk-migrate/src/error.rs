/// Migration error types
use std::path::PathBuf;
use thiserror::Error;
use xwalk_config::ConfigError;

pub type MigrateResult<T> = Result<T, MigrateError>;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{message}")]
    Precondition { message: String, guidance: String },

    #[error("Failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("I/O error at {path}: {error}")]
    Filesystem {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid manifest document: {0}")]
    Document(String),

    #[error("Toolchain build exited with status {exit_code}")]
    Toolchain { exit_code: i32, stderr: String },
}

impl MigrateError {
    /// Create a precondition error with remediation text
    pub fn precondition(message: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
            guidance: guidance.into(),
        }
    }

    /// Create an I/O error with path context
    pub fn filesystem(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            error,
        }
    }

    /// Create a transport error for a URL
    pub fn transport(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a document error
    pub fn document(message: impl ToString) -> Self {
        Self::Document(message.to_string())
    }

    /// Short name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Precondition { .. } => "PreconditionError",
            Self::Transport { .. } => "TransportError",
            Self::Filesystem { .. } => "FilesystemError",
            Self::Document(_) => "DocumentError",
            Self::Toolchain { .. } => "ToolchainError",
        }
    }

    /// Remediation text for the user, if the error carries any
    pub fn guidance(&self) -> Option<&str> {
        match self {
            Self::Precondition { guidance, .. } => Some(guidance),
            Self::Toolchain { .. } => Some(
                "CordovaLib has already been replaced; fix the toolchain and re-run with --preserve",
            ),
            _ => None,
        }
    }
}

impl From<ConfigError> for MigrateError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(
            MigrateError::Configuration("x".into()).kind(),
            "ConfigurationError"
        );
        assert_eq!(
            MigrateError::precondition("m", "g").kind(),
            "PreconditionError"
        );
        assert_eq!(
            MigrateError::transport("http://x", "boom").kind(),
            "TransportError"
        );
        assert_eq!(
            MigrateError::filesystem("/x", std::io::Error::other("denied")).kind(),
            "FilesystemError"
        );
        assert_eq!(MigrateError::document("bad").kind(), "DocumentError");
        assert_eq!(
            MigrateError::Toolchain {
                exit_code: 1,
                stderr: String::new()
            }
            .kind(),
            "ToolchainError"
        );
    }

    #[test]
    fn test_precondition_guidance() {
        let err = MigrateError::precondition("missing platform", "run cordova platform add android");
        assert_eq!(err.to_string(), "missing platform");
        assert_eq!(err.guidance(), Some("run cordova platform add android"));
        assert_eq!(MigrateError::document("bad").guidance(), None);
    }

    #[test]
    fn test_from_config_error() {
        let err: MigrateError = ConfigError::UnknownChannel("nightly".into()).into();
        assert!(matches!(err, MigrateError::Configuration(ref m) if m.contains("nightly")));
    }
}
