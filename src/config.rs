use crate::constants;
use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: constants::BROWSER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Similarity ratio above which a near-miss venue/host name produces an
    /// operator warning on commit.
    pub warn_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            warn_threshold: 0.85,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            debug!("No config file at '{}', using defaults", config_path);
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetcher.timeout_seconds, 30);
        assert!(config.fetcher.user_agent.contains("Mozilla"));
        assert!(config.matching.warn_threshold > 0.5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[matching]\nwarn_threshold = 0.9\n").unwrap();
        assert_eq!(config.matching.warn_threshold, 0.9);
        assert_eq!(config.fetcher.timeout_seconds, 30);
    }
}
