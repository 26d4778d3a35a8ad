use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Telegram long-polling waits this long per request; the HTTP timeout must
/// be larger or every poll fails.
const POLLING_TIMEOUT_SECS: u64 = 10;

/// Periodic reports are due on days where `(day - 1) % day_period == 0`, so a
/// longer period would never fire.
const MAX_DAY_PERIOD: u32 = 31;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub firefly: FireflyConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default = "default_categories_in_row")]
    pub categories_in_row: usize,
    #[serde(default = "default_day_period")]
    pub day_period: u32,
    #[serde(default = "default_send_report_hour")]
    pub send_report_hour: u32,
    #[serde(default)]
    pub send_report_minute: u32,
    #[serde(default)]
    pub daily_report: ReportConfig,
    #[serde(default)]
    pub monthly_report: ReportConfig,
    #[serde(default)]
    pub periodic_report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FireflyConfig {
    pub api_key: String,
    pub api_url: String,
    /// Seconds
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Seconds
    #[serde(default = "default_timeout")]
    pub api_request_timeout: u64,
}

/// Per-report toggle and name exclusions.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReportConfig {
    #[serde(default = "default_send_report")]
    pub send_report: bool,
    #[serde(default)]
    pub exclude_budgets: Vec<String>,
    #[serde(default)]
    pub exclude_categories: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            send_report: default_send_report(),
            exclude_budgets: Vec::new(),
            exclude_categories: Vec::new(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_categories_in_row() -> usize {
    2
}

fn default_day_period() -> u32 {
    5
}

fn default_send_report_hour() -> u32 {
    12
}

fn default_send_report() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse settings: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.firefly.api_key.trim().is_empty() {
            return Err(Error::Config("firefly.api_key must not be empty".into()));
        }
        if reqwest::Url::parse(&self.firefly.api_url).is_err() {
            return Err(Error::Config(format!(
                "firefly.api_url is not a valid URL: {}",
                self.firefly.api_url
            )));
        }
        if self.firefly.request_timeout == 0 {
            return Err(Error::Config("firefly.request_timeout must be positive".into()));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(Error::Config("telegram.bot_token must not be empty".into()));
        }
        if self.telegram.api_request_timeout <= POLLING_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "telegram.api_request_timeout must be greater than {} seconds",
                POLLING_TIMEOUT_SECS
            )));
        }
        if self.send_report_hour > 23 {
            return Err(Error::Config(format!(
                "send_report_hour must be within 0..=23, got {}",
                self.send_report_hour
            )));
        }
        if self.send_report_minute > 59 {
            return Err(Error::Config(format!(
                "send_report_minute must be within 0..=59, got {}",
                self.send_report_minute
            )));
        }
        if self.day_period == 0 || self.day_period > MAX_DAY_PERIOD {
            return Err(Error::Config(format!(
                "day_period must be within 1..={}, got {}",
                MAX_DAY_PERIOD, self.day_period
            )));
        }
        if self.categories_in_row == 0 {
            return Err(Error::Config("categories_in_row must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[firefly]
api_key = "token"
api_url = "https://firefly.example.com"

[telegram]
bot_token = "123:abc"
chat_id = -100500
"#;

    #[test]
    fn test_minimal_settings_use_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.firefly.request_timeout, 60);
        assert_eq!(config.telegram.api_request_timeout, 60);
        assert_eq!(config.telegram.proxy_url, None);
        assert_eq!(config.telegram.chat_id, -100500);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.categories_in_row, 2);
        assert_eq!(config.day_period, 5);
        assert_eq!(config.send_report_hour, 12);
        assert_eq!(config.send_report_minute, 0);
        assert_eq!(config.daily_report, ReportConfig::default());
        assert!(config.monthly_report.send_report);
        assert!(config.periodic_report.exclude_categories.is_empty());
    }

    #[test]
    fn test_report_sections_parsed() {
        let content = format!(
            "{}\n[daily_report]\nsend_report = false\n\n\
             [periodic_report]\nexclude_budgets = [\"Rent\"]\nexclude_categories = [\"Taxes\", \"Fees\"]\n",
            MINIMAL.replace(
                "[firefly]",
                "day_period = 7\nlog_level = \"WARNING\"\n\n[firefly]"
            )
        );
        let config = Config::from_toml(&content).unwrap();
        assert_eq!(config.day_period, 7);
        assert_eq!(config.log_level, LogLevel::Warning);
        assert_eq!(config.log_level.as_filter(), "warn");
        assert!(!config.daily_report.send_report);
        assert_eq!(config.periodic_report.exclude_budgets, vec!["Rent"]);
        assert_eq!(
            config.periodic_report.exclude_categories,
            vec!["Taxes", "Fees"]
        );
        assert!(config.periodic_report.send_report);
    }

    #[test]
    fn test_missing_required_field_is_config_error() {
        let content = MINIMAL.replace("chat_id = -100500\n", "");
        let err = Config::from_toml(&content).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_out_of_range_schedule_rejected() {
        let content = MINIMAL.replace("[firefly]", "send_report_hour = 24\n\n[firefly]");
        assert!(matches!(Config::from_toml(&content), Err(Error::Config(_))));

        let content = MINIMAL.replace("[firefly]", "send_report_minute = 60\n\n[firefly]");
        assert!(matches!(Config::from_toml(&content), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_day_period_rejected() {
        let content = MINIMAL.replace("[firefly]", "day_period = 0\n\n[firefly]");
        assert!(matches!(Config::from_toml(&content), Err(Error::Config(_))));
    }

    #[test]
    fn test_day_period_upper_bound() {
        let content = MINIMAL.replace("[firefly]", "day_period = 31\n\n[firefly]");
        assert_eq!(Config::from_toml(&content).unwrap().day_period, 31);

        for period in ["32", "4000000000"] {
            let content =
                MINIMAL.replace("[firefly]", &format!("day_period = {}\n\n[firefly]", period));
            let err = Config::from_toml(&content).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted day_period = {}", period);
        }
    }

    #[test]
    fn test_short_telegram_timeout_rejected() {
        let content = MINIMAL.replace("chat_id", "api_request_timeout = 5\nchat_id");
        assert!(matches!(Config::from_toml(&content), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let content = MINIMAL.replace("https://firefly.example.com", "not a url");
        assert!(matches!(Config::from_toml(&content), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/settings.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
