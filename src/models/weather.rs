//! Weather report model and display

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text substituted when the provider cannot deliver a usable report
pub const WEATHER_UNAVAILABLE: &str = "Weather information unavailable.";

/// Unit system requested from the weather provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Fahrenheit
    #[default]
    Imperial,
    /// Celsius
    Metric,
    /// Kelvin
    Standard,
}

impl TemperatureUnit {
    /// Value of the provider's `units` query parameter
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            TemperatureUnit::Imperial => "imperial",
            TemperatureUnit::Metric => "metric",
            TemperatureUnit::Standard => "standard",
        }
    }

    /// Suffix appended to a temperature value
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Imperial => "°F",
            TemperatureUnit::Metric => "°C",
            TemperatureUnit::Standard => "K",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" => Ok(TemperatureUnit::Imperial),
            "metric" => Ok(TemperatureUnit::Metric),
            "standard" => Ok(TemperatureUnit::Standard),
            other => Err(format!("unknown unit system '{other}'")),
        }
    }
}

/// Current conditions for the configured location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeatherReport {
    Available {
        location: String,
        /// Provider description, first letter capitalized
        description: String,
        temperature: f64,
        unit: TemperatureUnit,
    },
    Unavailable,
}

impl WeatherReport {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, WeatherReport::Available { .. })
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherReport::Available {
                location,
                description,
                temperature,
                unit,
            } => write!(
                f,
                "Weather in {location}: {description}, {temperature}{}",
                unit.symbol()
            ),
            WeatherReport::Unavailable => f.write_str(WEATHER_UNAVAILABLE),
        }
    }
}

/// Upper-case the first character and lower-case the rest
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
