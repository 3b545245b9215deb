// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItunesConfig {
    /// Overrides the public endpoint; `None` uses `https://itunes.apple.com`.
    pub base_url: Option<String>,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub max_retry_wait_secs: u64,
    /// Upper bound for one complete search or lookup, including retries.
    pub read_timeout_secs: u64,
}

impl Default for ItunesConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            requests_per_minute: 20,
            timeout_secs: 30,
            max_retries: 5,
            max_retry_wait_secs: 60,
            read_timeout_secs: 90,
        }
    }
}

impl ItunesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_retry_wait(&self) -> Duration {
        Duration::from_secs(self.max_retry_wait_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.requests_per_minute == 0 {
            bail!("itunes.requests_per_minute must be greater than zero");
        }
        if self.max_retries == 0 {
            bail!("itunes.max_retries must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub itunes: ItunesConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides
/// (prefix: TUNESEARCH_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("TUNESEARCH_").split("__"));

    let config: AppConfig = figment.extract()?;
    config.itunes.validate()?;
    info!(
        target: "config",
        requests_per_minute = config.itunes.requests_per_minute,
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.itunes.requests_per_minute, 20);
            assert_eq!(config.itunes.max_retries, 5);
            assert_eq!(config.itunes.max_retry_wait(), Duration::from_secs(60));
            assert_eq!(config.itunes.read_timeout(), Duration::from_secs(90));
            assert!(config.itunes.base_url.is_none());
            assert_eq!(config.telemetry.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tunesearch.toml",
                r#"
                [itunes]
                base_url = "http://localhost:9999"
                requests_per_minute = 10

                [telemetry]
                log_level = "debug"
                "#,
            )?;
            jail.set_env("TUNESEARCH_ITUNES__REQUESTS_PER_MINUTE", "5");

            let config = load(Some(Path::new("tunesearch.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(
                config.itunes.base_url.as_deref(),
                Some("http://localhost:9999")
            );
            assert_eq!(config.itunes.requests_per_minute, 5);
            assert_eq!(config.telemetry.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TUNESEARCH_ITUNES__REQUESTS_PER_MINUTE", "0");
            assert!(load(None).is_err());
            Ok(())
        });
    }
}
