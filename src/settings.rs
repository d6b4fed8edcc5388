//! Dashboard settings, layered from built-in defaults, an optional
//! `config/dashboard.{yaml,toml,json}` file, `DASHBOARD_*` environment
//! variables and finally the command line.

use std::time::Duration;

use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::query::DEFAULT_PAGE_SIZE;
use crate::sync::{StalePolicy, StatsRefresh};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug, Deserialize)]
pub struct DashboardConfig {
    pub api_base_url: String,
    /// Unset means requests may hang indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub default_page_size: u32,
    pub stale_responses: StalePolicy,
    pub stats_refresh: StatsRefresh,
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("default_page_size", i64::from(DEFAULT_PAGE_SIZE))?
        .set_default("stale_responses", "latest_only")?
        .set_default("stats_refresh", "on_filter_change")
}

fn finish(settings: Config) -> anyhow::Result<DashboardConfig> {
    let config: DashboardConfig = settings
        .try_deserialize()
        .context("invalid dashboard configuration")?;
    anyhow::ensure!(
        config.default_page_size > 0,
        "default_page_size must be at least 1"
    );
    Ok(config)
}

pub fn load(api_url_override: Option<&str>) -> anyhow::Result<DashboardConfig> {
    let settings = with_defaults()?
        .add_source(File::with_name("config/dashboard").required(false))
        .add_source(Environment::with_prefix("DASHBOARD").try_parsing(true))
        .set_override_option("api_base_url", api_url_override)?
        .build()
        .context("failed to load dashboard configuration")?;
    finish(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_point_at_local_api() {
        let config = finish(with_defaults().unwrap().build().unwrap()).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.stale_responses, StalePolicy::LatestOnly);
        assert_eq!(config.stats_refresh, StatsRefresh::OnFilterChange);
    }

    #[test]
    fn file_values_override_defaults() {
        let yaml = "api_base_url: https://students.example.org\n\
                    request_timeout_secs: 15\n\
                    stale_responses: apply_all\n\
                    stats_refresh: every_change\n";
        let settings = with_defaults()
            .unwrap()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap();

        let config = finish(settings).unwrap();
        assert_eq!(config.api_base_url, "https://students.example.org");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.stale_responses, StalePolicy::ApplyAll);
        assert_eq!(config.stats_refresh, StatsRefresh::EveryChange);
    }

    #[test]
    fn command_line_url_wins() {
        let settings = with_defaults()
            .unwrap()
            .add_source(File::from_str(
                "api_base_url: http://api.internal:8000",
                FileFormat::Yaml,
            ))
            .set_override_option("api_base_url", Some("http://10.0.0.5:9000"))
            .unwrap()
            .build()
            .unwrap();
        let config = finish(settings).unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.5:9000");
    }

    #[test]
    fn absent_command_line_url_keeps_lower_layers() {
        let settings = with_defaults()
            .unwrap()
            .add_source(File::from_str(
                "api_base_url: http://api.internal:8000",
                FileFormat::Yaml,
            ))
            .set_override_option("api_base_url", None::<&str>)
            .unwrap()
            .build()
            .unwrap();
        let config = finish(settings).unwrap();
        assert_eq!(config.api_base_url, "http://api.internal:8000");
    }

    #[test]
    fn rejects_zero_page_size() {
        let settings = with_defaults()
            .unwrap()
            .set_override("default_page_size", 0)
            .unwrap()
            .build()
            .unwrap();
        assert!(finish(settings).is_err());
    }
}
