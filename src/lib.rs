//! Morning Update - a daily weekday email digest
//!
//! This library fetches the current weather and a list of stock quotes,
//! composes them into a plain-text email and delivers it on a weekday
//! schedule.

pub mod config;
pub mod digest;
pub mod email;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod quotes;
pub mod scheduler;
pub mod weather;

// Re-export core types for public API
pub use config::{Credentials, DigestConfig};
pub use email::{DeliveryOutcome, Mailer, SmtpMailer};
pub use error::DigestError;
pub use models::{Digest, QuoteLine, QuoteOutcome, QuoteReport, WeatherReport};
pub use pipeline::{DigestPipeline, RunReport};
pub use quotes::{QuoteSource, YahooFinanceClient};
pub use scheduler::{Clock, Schedule, Scheduler, SystemClock};
pub use weather::{WeatherFetcher, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, DigestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
