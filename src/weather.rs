//! OpenWeatherMap client for the current-conditions line
//!
//! Any failure (transport, non-OK `cod`, malformed payload) degrades to
//! [`WeatherReport::Unavailable`]; nothing is raised to the caller.

use crate::config::WeatherConfig;
use crate::models::weather::capitalize;
use crate::models::{TemperatureUnit, WeatherReport};
use crate::{DigestError, Result};
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Source of the current-conditions report
pub trait WeatherSource {
    /// Fetch current conditions; never fails
    fn fetch(&self, location: &str, api_key: &str) -> WeatherReport;
}

/// Blocking OpenWeatherMap client
pub struct WeatherFetcher {
    client: Client,
    base_url: String,
    unit: TemperatureUnit,
}

impl WeatherFetcher {
    /// Create a new weather fetcher
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("morning-update/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            unit: config.unit()?,
        })
    }

    fn request(&self, location: &str, api_key: &str) -> Result<String> {
        let url = format!(
            "{}/weather?q={}&appid={}&units={}",
            self.base_url,
            urlencoding::encode(location),
            urlencoding::encode(api_key),
            self.unit.as_query()
        );
        debug!(
            "OpenWeatherMap request: {}/weather?q={} (units={})",
            self.base_url,
            location,
            self.unit.as_query()
        );

        // The provider reports failures through `cod` in the body, so the
        // HTTP status is not checked here. The URL carries the API key and
        // is stripped from transport errors before they can be logged.
        let response = self
            .client
            .get(url)
            .send()
            .map_err(reqwest::Error::without_url)?;
        debug!("HTTP response received: {}", response.status());
        Ok(response.text().map_err(reqwest::Error::without_url)?)
    }
}

impl WeatherSource for WeatherFetcher {
    #[instrument(skip(self, api_key))]
    fn fetch(&self, location: &str, api_key: &str) -> WeatherReport {
        let start_time = Instant::now();

        match self.request(location, api_key) {
            Ok(body) => {
                let report = report_from_body(location, self.unit, &body);
                if report.is_available() {
                    info!(
                        "Retrieved current weather in {:.3}s",
                        start_time.elapsed().as_secs_f64()
                    );
                }
                report
            }
            Err(e) => {
                warn!("Weather request failed: {}", e);
                WeatherReport::Unavailable
            }
        }
    }
}

/// Decode a provider body, substituting the sentinel on any failure
#[must_use]
pub fn report_from_body(location: &str, unit: TemperatureUnit, body: &str) -> WeatherReport {
    parse_weather_response(location, unit, body).unwrap_or_else(|e| {
        warn!("Weather information unavailable: {}", e);
        WeatherReport::Unavailable
    })
}

/// Decode an OpenWeatherMap "current weather" body
pub fn parse_weather_response(
    location: &str,
    unit: TemperatureUnit,
    body: &str,
) -> Result<WeatherReport> {
    let response: openweathermap::CurrentResponse = serde_json::from_str(body)?;

    if !response.cod.is_ok() {
        return Err(DigestError::weather(format!(
            "provider returned status {}{}",
            response.cod,
            response
                .message
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        )));
    }

    let description = response
        .weather
        .into_iter()
        .next()
        .map(|condition| condition.description)
        .ok_or_else(|| DigestError::weather("response has no weather conditions"))?;

    let temperature = response
        .main
        .map(|main| main.temp)
        .ok_or_else(|| DigestError::weather("response has no temperature"))?;

    Ok(WeatherReport::Available {
        location: location.to_string(),
        description: capitalize(&description),
        temperature,
        unit,
    })
}

/// OpenWeatherMap API response structures
mod openweathermap {
    use serde::Deserialize;
    use std::fmt;

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub cod: StatusCode,
        pub message: Option<String>,
        #[serde(default)]
        pub weather: Vec<Condition>,
        pub main: Option<Main>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub description: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Main {
        pub temp: f64,
    }

    /// `cod` arrives as a number on success and as a string on most errors
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum StatusCode {
        Number(i64),
        Text(String),
    }

    impl StatusCode {
        pub fn is_ok(&self) -> bool {
            match self {
                StatusCode::Number(code) => *code == 200,
                StatusCode::Text(code) => code.trim() == "200",
            }
        }
    }

    impl fmt::Display for StatusCode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                StatusCode::Number(code) => write!(f, "{code}"),
                StatusCode::Text(code) => f.write_str(code),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CLEAR_SKY: &str = r#"{
        "coord": {"lon": -100.3167, "lat": 25.6667},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 72.5, "feels_like": 71.9, "humidity": 40},
        "name": "Monterrey",
        "cod": 200
    }"#;

    #[test]
    fn test_parse_clear_sky() {
        let report = parse_weather_response("Monterrey", TemperatureUnit::Imperial, CLEAR_SKY)
            .unwrap();
        assert_eq!(report.to_string(), "Weather in Monterrey: Clear sky, 72.5°F");
    }

    #[test]
    fn test_parse_integer_temperature_and_string_cod() {
        let body = r#"{"weather":[{"description":"light rain"}],"main":{"temp":61},"cod":"200"}"#;
        let report = parse_weather_response("Oslo", TemperatureUnit::Metric, body).unwrap();
        assert_eq!(
            report,
            WeatherReport::Available {
                location: "Oslo".to_string(),
                description: "Light rain".to_string(),
                temperature: 61.0,
                unit: TemperatureUnit::Metric,
            }
        );
    }

    #[test]
    fn test_not_found_is_unavailable() {
        let body = r#"{"cod":"404","message":"city not found"}"#;
        let err = parse_weather_response("Atlantis", TemperatureUnit::Imperial, body).unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("city not found"));

        let report = report_from_body("Atlantis", TemperatureUnit::Imperial, body);
        assert_eq!(report.to_string(), "Weather information unavailable.");
    }

    #[rstest]
    #[case(r#"{"cod":401,"message":"Invalid API key"}"#)]
    #[case(r#"{"cod":"429"}"#)]
    #[case(r#"{"cod":500,"weather":[{"description":"clear sky"}],"main":{"temp":70}}"#)]
    #[case(r#"{"cod":200,"weather":[],"main":{"temp":70}}"#)]
    #[case(r#"{"cod":200,"weather":[{"description":"haze"}]}"#)]
    #[case(r#"{"weather":[{"description":"haze"}],"main":{"temp":70}}"#)]
    #[case("<html>Bad Gateway</html>")]
    #[case("")]
    fn test_bad_bodies_yield_sentinel(#[case] body: &str) {
        assert_eq!(
            report_from_body("Monterrey", TemperatureUnit::Imperial, body),
            WeatherReport::Unavailable
        );
    }

    #[test]
    fn test_unreachable_provider_yields_sentinel() {
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..WeatherConfig::default()
        };
        let fetcher = WeatherFetcher::new(&config).unwrap();
        assert_eq!(
            fetcher.fetch("Monterrey", "test-key"),
            WeatherReport::Unavailable
        );
    }

    #[test]
    fn test_transport_error_omits_api_key() {
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..WeatherConfig::default()
        };
        let fetcher = WeatherFetcher::new(&config).unwrap();

        let err = fetcher.request("Monterrey", "SUPERSECRETKEY123").unwrap_err();
        let rendered = format!("Weather request failed: {err}");
        assert!(matches!(err, DigestError::Http { .. }));
        assert!(!rendered.contains("SUPERSECRETKEY123"));
    }
}
