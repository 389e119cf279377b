//! Configuration management for the morning update digest
//!
//! Non-secret settings are layered from a TOML file and `MORNING_UPDATE_*`
//! environment overrides. Credentials are read separately from the process
//! environment by [`Credentials::from_env`] and never pass through the
//! file layer.

use crate::DigestError;
use crate::models::TemperatureUnit;
use anyhow::{Context, Result};
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the sender address
pub const EMAIL_USER_VAR: &str = "EMAIL_USER";
/// Environment variable holding the sender secret (app password)
pub const EMAIL_PASS_VAR: &str = "EMAIL_PASS";
/// Environment variable holding the OpenWeatherMap API key
pub const WEATHER_API_KEY_VAR: &str = "WEATHER_API_KEY";

/// Root configuration structure for the digest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Market-data provider settings
    #[serde(default)]
    pub quotes: QuotesConfig,
    /// Outbound email settings
    #[serde(default)]
    pub email: EmailConfig,
    /// Firing schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather provider configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Place name used as the weather query key
    #[serde(default = "default_location")]
    pub location: String,
    /// Base URL for the OpenWeatherMap API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Unit system requested from the provider
    #[serde(default = "default_weather_units")]
    pub units: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Market-data provider configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotesConfig {
    /// Ticker symbols, reported in this order
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Base URL for the Yahoo Finance API
    #[serde(default = "default_quotes_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Outbound email configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port (implicit TLS)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Recipient address; the sender receives the digest when unset
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Firing schedule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local wake time as `HH:MM`
    #[serde(default = "default_wake_time")]
    pub wake_time: String,
    /// IANA time zone name
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Days the digest fires on
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_location() -> String {
    "Monterrey".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_units() -> String {
    "imperial".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_symbols() -> Vec<String> {
    ["AAPL", "GOOGL", "AMZN", "TSLA", "MSFT"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_quotes_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_wake_time() -> String {
    "09:00".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_weekdays() -> Vec<String> {
    ["mon", "tue", "wed", "thu", "fri"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            base_url: default_weather_base_url(),
            units: default_weather_units(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            base_url: default_quotes_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            recipient: None,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            wake_time: default_wake_time(),
            timezone: default_timezone(),
            weekdays: default_weekdays(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherConfig {
    /// Parse the configured unit system
    pub fn unit(&self) -> crate::Result<TemperatureUnit> {
        self.units.parse().map_err(|_| {
            DigestError::config(format!(
                "Invalid weather units '{}'. Must be one of: imperial, metric, standard",
                self.units
            ))
        })
    }
}

impl ScheduleConfig {
    /// Parse the configured wake time
    pub fn wake_time(&self) -> crate::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.wake_time, "%H:%M").map_err(|_| {
            DigestError::config(format!(
                "Invalid wake time '{}'. Expected HH:MM",
                self.wake_time
            ))
        })
    }

    /// Parse the configured time zone
    pub fn timezone(&self) -> crate::Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            DigestError::config(format!("Unknown time zone '{}'", self.timezone))
        })
    }

    /// Parse the configured weekdays
    pub fn weekdays(&self) -> crate::Result<Vec<Weekday>> {
        self.weekdays
            .iter()
            .map(|day| {
                day.trim()
                    .parse::<Weekday>()
                    .map_err(|_| DigestError::config(format!("Invalid weekday '{day}'")))
            })
            .collect()
    }
}

impl EmailConfig {
    /// Recipient address, defaulting to the sender
    #[must_use]
    pub fn recipient_or<'a>(&'a self, sender: &'a str) -> &'a str {
        self.recipient.as_deref().unwrap_or(sender)
    }
}

impl DigestConfig {
    /// Load configuration from `config_path`, or from the per-user file
    /// when no path is given, then apply `MORNING_UPDATE_*` overrides.
    ///
    /// An explicitly given path must exist; the per-user default is optional.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        match config_path {
            Some(path) => {
                builder = builder.add_source(
                    File::from(path)
                        .required(true)
                        .format(config::FileFormat::Toml),
                );
            }
            None => {
                if let Some(path) = Self::get_config_path().filter(|p| p.exists()) {
                    builder = builder.add_source(
                        File::from(path)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        // MORNING_UPDATE_WEATHER__LOCATION=Paris etc.
        builder = builder.add_source(
            Environment::with_prefix("MORNING_UPDATE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("quotes.symbols")
                .with_list_parse_key("schedule.weekdays")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: DigestConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("morning-update").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.location.trim().is_empty() {
            self.weather.location = default_location();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.units.is_empty() {
            self.weather.units = default_weather_units();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.quotes.base_url.is_empty() {
            self.quotes.base_url = default_quotes_base_url();
        }
        if self.quotes.timeout_seconds == 0 {
            self.quotes.timeout_seconds = default_timeout();
        }
        if self.email.smtp_host.is_empty() {
            self.email.smtp_host = default_smtp_host();
        }
        if self.email.smtp_port == 0 {
            self.email.smtp_port = default_smtp_port();
        }
        if self.email.recipient.as_deref().is_some_and(|r| r.trim().is_empty()) {
            self.email.recipient = None;
        }
        if self.schedule.wake_time.is_empty() {
            self.schedule.wake_time = default_wake_time();
        }
        if self.schedule.timezone.is_empty() {
            self.schedule.timezone = default_timezone();
        }
        if self.schedule.weekdays.is_empty() {
            self.schedule.weekdays = default_weekdays();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_schedule()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Weather", self.weather.timeout_seconds),
            ("Quotes", self.quotes.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(
                    DigestError::config(format!("{name} timeout cannot exceed 300 seconds")).into(),
                );
            }
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DigestError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DigestError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        self.weather.unit()?;

        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Quotes", &self.quotes.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DigestError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.quotes.symbols.is_empty() {
            return Err(DigestError::config("At least one ticker symbol is required").into());
        }
        if self.quotes.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(DigestError::config("Ticker symbols must not be blank").into());
        }

        Ok(())
    }

    fn validate_schedule(&self) -> Result<()> {
        self.schedule.wake_time()?;
        self.schedule.timezone()?;
        if self.schedule.weekdays()?.is_empty() {
            return Err(DigestError::config("At least one weekday is required").into());
        }
        Ok(())
    }
}

/// Secrets supplied by the execution environment
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Sender email address, also used as the SMTP username
    pub sender: String,
    /// Sender secret (app password)
    pub secret: String,
    /// OpenWeatherMap API key
    pub weather_api_key: String,
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup, failing on the first
    /// missing or blank variable
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| DigestError::config(format!("Missing {name} env var")))
        };

        Ok(Self {
            sender: require(EMAIL_USER_VAR)?,
            secret: require(EMAIL_PASS_VAR)?,
            weather_api_key: require(WEATHER_API_KEY_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("sender", &self.sender)
            .field("secret", &"<redacted>")
            .field("weather_api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = DigestConfig::default();
        assert_eq!(config.weather.location, "Monterrey");
        assert_eq!(config.weather.units, "imperial");
        assert_eq!(
            config.quotes.symbols,
            vec!["AAPL", "GOOGL", "AMZN", "TSLA", "MSFT"]
        );
        assert_eq!(config.email.smtp_host, "smtp.gmail.com");
        assert_eq!(config.email.smtp_port, 465);
        assert_eq!(config.schedule.wake_time, "09:00");
        assert_eq!(config.schedule.timezone, "America/New_York");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_schedule_parsing() {
        let schedule = ScheduleConfig::default();
        assert_eq!(
            schedule.wake_time().unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(schedule.timezone().unwrap(), chrono_tz::America::New_York);
        assert_eq!(
            schedule.weekdays().unwrap(),
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri
            ]
        );
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = DigestConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = DigestConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_bad_schedule() {
        let mut config = DigestConfig::default();
        config.schedule.wake_time = "9am".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Invalid wake time"));

        let mut config = DigestConfig::default();
        config.schedule.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Unknown time zone"));

        let mut config = DigestConfig::default();
        config.schedule.weekdays = vec!["funday".to_string()];
        assert!(config.validate().unwrap_err().to_string().contains("Invalid weekday"));
    }

    #[test]
    fn test_config_validation_units() {
        let mut config = DigestConfig::default();
        config.weather.units = "metric".to_string();
        assert_eq!(config.weather.unit().unwrap(), TemperatureUnit::Metric);

        config.weather.units = "furlongs".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Invalid weather units"));
    }

    #[test]
    fn test_config_validation_empty_symbols() {
        let mut config = DigestConfig::default();
        config.quotes.symbols = Vec::new();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("ticker symbol"));
    }

    #[rstest]
    #[case(&[" "])]
    #[case(&["AAPL", ""])]
    #[case(&["AAPL", "  ", "MSFT"])]
    fn test_config_validation_blank_symbol(#[case] symbols: &[&str]) {
        let mut config = DigestConfig::default();
        config.quotes.symbols = symbols.iter().map(|s| (*s).to_string()).collect();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("must not be blank"));
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = DigestConfig::default();
        config.weather.location = String::new();
        config.email.smtp_port = 0;
        config.email.recipient = Some("  ".to_string());
        config.schedule.weekdays.clear();
        config.apply_defaults();

        assert_eq!(config.weather.location, "Monterrey");
        assert_eq!(config.email.smtp_port, 465);
        assert!(config.email.recipient.is_none());
        assert_eq!(config.schedule.weekdays.len(), 5);
    }

    #[test]
    fn test_recipient_defaults_to_sender() {
        let mut email = EmailConfig::default();
        assert_eq!(email.recipient_or("me@example.com"), "me@example.com");

        email.recipient = Some("other@example.com".to_string());
        assert_eq!(email.recipient_or("me@example.com"), "other@example.com");
    }

    #[test]
    fn test_credentials_from_lookup() {
        let env = env_of(&[
            (EMAIL_USER_VAR, "me@example.com"),
            (EMAIL_PASS_VAR, "app-password"),
            (WEATHER_API_KEY_VAR, "owm-key"),
        ]);
        let creds = Credentials::from_lookup(|name| env.get(name).cloned()).unwrap();
        assert_eq!(creds.sender, "me@example.com");
        assert_eq!(creds.secret, "app-password");
        assert_eq!(creds.weather_api_key, "owm-key");
    }

    #[test]
    fn test_credentials_missing_variable_fails_fast() {
        let env = env_of(&[(EMAIL_USER_VAR, "me@example.com"), (EMAIL_PASS_VAR, " ")]);
        let err = Credentials::from_lookup(|name| env.get(name).cloned()).unwrap_err();
        assert!(matches!(err, DigestError::Config { .. }));
        assert!(err.to_string().contains(EMAIL_PASS_VAR));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            sender: "me@example.com".to_string(),
            secret: "hunter2".to_string(),
            weather_api_key: "owm-secret-key".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("owm-secret-key"));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let path = std::env::temp_dir().join(format!(
            "morning-update-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[weather]\nlocation = \"Paris\"\n\n[quotes]\nsymbols = [\"NVDA\"]\n\n[schedule]\nwake_time = \"07:30\"\ntimezone = \"Europe/Paris\"\n",
        )
        .unwrap();

        let config = DigestConfig::load_from_path(Some(path.clone()));
        std::fs::remove_file(&path).ok();
        let config = config.unwrap();

        assert_eq!(config.weather.location, "Paris");
        assert_eq!(config.quotes.symbols, vec!["NVDA"]);
        assert_eq!(config.schedule.wake_time, "07:30");
        assert_eq!(config.email.smtp_port, 465);
    }

    #[test]
    fn test_shipped_default_config_loads() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = DigestConfig::load_from_path(Some(path)).unwrap();
        let defaults = DigestConfig::default();

        assert_eq!(config.weather.location, defaults.weather.location);
        assert_eq!(config.quotes.symbols, defaults.quotes.symbols);
        assert_eq!(config.schedule.weekdays, defaults.schedule.weekdays);
        assert!(config.email.recipient.is_none());
    }

    #[test]
    fn test_load_from_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/morning-update/config.toml");
        assert!(DigestConfig::load_from_path(Some(path)).is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = DigestConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("morning-update"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
