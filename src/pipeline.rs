//! One firing: fetch weather and quotes, compose the digest, send it
//!
//! Every stage absorbs its own failures, so a firing always produces a
//! [`RunReport`] and never unwinds into the scheduler.

use crate::config::{Credentials, DigestConfig};
use crate::digest::compose;
use crate::email::{DeliveryOutcome, Mailer, deliver};
use crate::models::Digest;
use crate::quotes::{QuoteSource, fetch_quotes};
use crate::weather::WeatherSource;
use crate::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::time::Instant;
use tracing::{info, info_span, warn};

/// Summary of a single firing
#[derive(Debug, Clone)]
pub struct RunReport {
    pub digest: Digest,
    pub weather_available: bool,
    pub quote_count: usize,
    pub quote_failures: usize,
    /// `None` when the digest was only prepared
    pub delivery: Option<DeliveryOutcome>,
}

impl RunReport {
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.delivery
            .as_ref()
            .is_some_and(DeliveryOutcome::is_delivered)
    }
}

/// Fetch → compose → send, wired to concrete providers
pub struct DigestPipeline<W, Q, M> {
    location: String,
    symbols: Vec<String>,
    timezone: Tz,
    recipient: String,
    credentials: Credentials,
    weather: W,
    quotes: Q,
    mailer: M,
}

impl<W, Q, M> DigestPipeline<W, Q, M>
where
    W: WeatherSource,
    Q: QuoteSource,
    M: Mailer,
{
    pub fn new(
        config: &DigestConfig,
        credentials: Credentials,
        weather: W,
        quotes: Q,
        mailer: M,
    ) -> Result<Self> {
        Ok(Self {
            location: config.weather.location.clone(),
            symbols: config.quotes.symbols.clone(),
            timezone: config.schedule.timezone()?,
            recipient: config.email.recipient_or(&credentials.sender).to_string(),
            credentials,
            weather,
            quotes,
            mailer,
        })
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Fetch both sources and compose the digest without sending it
    pub fn prepare(&self, now: DateTime<Utc>) -> RunReport {
        let weather = self
            .weather
            .fetch(&self.location, &self.credentials.weather_api_key);
        if !weather.is_available() {
            warn!("Weather for {} unavailable this run", self.location);
        }

        let quotes = fetch_quotes(&self.quotes, &self.symbols);

        let digest = compose(
            &weather.to_string(),
            &quotes.render(),
            &now.with_timezone(&self.timezone),
        );

        RunReport {
            digest,
            weather_available: weather.is_available(),
            quote_count: quotes.len(),
            quote_failures: quotes.failures(),
            delivery: None,
        }
    }

    /// Run one complete firing
    pub fn run(&self, now: DateTime<Utc>) -> RunReport {
        let span = info_span!("firing", at = %now);
        let _enter = span.enter();
        let start_time = Instant::now();

        let mut report = self.prepare(now);

        report.delivery = Some(deliver(
            &self.mailer,
            &report.digest,
            &self.credentials.sender,
            &self.recipient,
        ));

        info!(
            "Firing finished in {:.3}s (delivered: {})",
            start_time.elapsed().as_secs_f64(),
            report.delivered()
        );

        report
    }
}
