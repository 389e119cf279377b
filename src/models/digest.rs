//! Composed email digest

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject and plain-text body for one day's email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub subject: String,
    pub body: String,
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f)?;
        f.write_str(&self.body)
    }
}
