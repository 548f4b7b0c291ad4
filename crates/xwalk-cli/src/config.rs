//! CLI configuration via environment variables
//!
//! Output switches only. Migration settings are resolved by
//! `xwalk_config::ConfigLoader`.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Print JSON reports by default (XWALKIFY_JSON=1)
    pub default_json: bool,
    /// Disable colored output (XWALKIFY_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("XWALKIFY_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: env::var("XWALKIFY_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_truthy(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off" || lower == "no")
}
