//! Data models for the morning update digest
//!
//! Every value here lives for a single firing:
//! - Weather: the current conditions line, or the unavailable sentinel
//! - Quote: one outcome per ticker symbol, kept in input order
//! - Digest: the subject/body pair handed to the mailer

pub mod digest;
pub mod quote;
pub mod weather;

// Re-export all public types for convenient access
pub use digest::Digest;
pub use quote::{QuoteLine, QuoteOutcome, QuoteReport};
pub use weather::{TemperatureUnit, WeatherReport};
