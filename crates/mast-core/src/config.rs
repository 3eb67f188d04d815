//! Suite configuration defaults
//!
//! A suite reads its defaults once at construction. The active
//! environment drives environment-keyed base URL selection; the
//! remaining flags are inherited by every scenario the suite creates.

use serde::{Deserialize, Serialize};

/// Defaults a suite applies to the scenarios it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Active environment name, used to pick a base URL from an
    /// environment-keyed mapping
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Verify SSL certificates when fetching
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Hold scenarios in Waiting until the suite is told to execute
    #[serde(default)]
    pub defer_execution: bool,
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_verify_ssl() -> bool {
    true
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            verify_ssl: default_verify_ssl(),
            defer_execution: false,
        }
    }
}

impl SuiteConfig {
    /// Build configuration from `MAST_ENV` and `MAST_VERIFY_SSL`,
    /// falling back to defaults for anything unset
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(env) = std::env::var("MAST_ENV") {
            if !env.is_empty() {
                config.environment = env;
            }
        }
        if let Ok(verify) = std::env::var("MAST_VERIFY_SSL") {
            config.verify_ssl = !matches!(verify.as_str(), "0" | "false" | "no");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.environment, "dev");
        assert!(config.verify_ssl);
        assert!(!config.defer_execution);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SuiteConfig = serde_json::from_str(r#"{"environment":"staging"}"#).unwrap();
        assert_eq!(config.environment, "staging");
        assert!(config.verify_ssl);
    }
}
