//! Per-symbol quote outcomes and the rendered quotes block

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of looking up one ticker symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuoteOutcome {
    /// Latest regular-market price
    Price(f64),
    /// The provider answered but had no price
    NoData,
    /// The lookup failed with this message
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub symbol: String,
    pub outcome: QuoteOutcome,
}

impl QuoteLine {
    pub fn new<S: Into<String>>(symbol: S, outcome: QuoteOutcome) -> Self {
        Self {
            symbol: symbol.into(),
            outcome,
        }
    }
}

impl fmt::Display for QuoteLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            QuoteOutcome::Price(price) => write!(f, "{}: ${price:.2}", self.symbol),
            QuoteOutcome::NoData => write!(f, "{}: No current price data available", self.symbol),
            QuoteOutcome::Failed(message) => {
                write!(f, "{}: Failed to fetch data ({message})", self.symbol)
            }
        }
    }
}

/// Quote lines in the order the symbols were configured
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteReport {
    pub lines: Vec<QuoteLine>,
}

impl QuoteReport {
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of symbols whose lookup failed outright
    #[must_use]
    pub fn failures(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line.outcome, QuoteOutcome::Failed(_)))
            .count()
    }

    /// One line per symbol, each terminated by `\n`
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QuoteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl FromIterator<QuoteLine> for QuoteReport {
    fn from_iter<I: IntoIterator<Item = QuoteLine>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}
