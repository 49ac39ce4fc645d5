//! Input rules applied by callers before they hand data to the shortener.
//!
//! The shortening service trusts its inputs: a [`ShortCode`](crate::ShortCode)
//! or [`ValidityPeriod`] can only be built through these checks, and
//! [`validate_url`] must be called on a long URL before it is submitted.

use crate::error::ValidationError;
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use url::Url;

/// Checks that `input` is an absolute `http` or `https` URL.
pub fn validate_url(input: &str) -> Result<Url, ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::InvalidUrl(
            "URL cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(input)
        .map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", input, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ValidationError::InvalidUrl(format!(
            "URL scheme must be http or https: {}",
            scheme
        ))),
    }
}

/// How long a short URL stays active after creation, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ValidityPeriod(u32);

impl ValidityPeriod {
    pub const DEFAULT_MINUTES: u32 = 30;
    /// One week.
    pub const MAX_MINUTES: u32 = 10_080;

    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        if minutes == 0 || minutes > Self::MAX_MINUTES {
            return Err(ValidationError::InvalidValidity(format!(
                "must be between 1 and {} minutes, got {}",
                Self::MAX_MINUTES,
                minutes
            )));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> SignedDuration {
        SignedDuration::from_mins(i64::from(self.0))
    }
}

impl Default for ValidityPeriod {
    fn default() -> Self {
        Self(Self::DEFAULT_MINUTES)
    }
}

impl TryFrom<u32> for ValidityPeriod {
    type Error = ValidationError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<ValidityPeriod> for u32 {
    fn from(value: ValidityPeriod) -> Self {
        value.0
    }
}

impl FromStr for ValidityPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes: u32 = s.trim().parse().map_err(|_| {
            ValidationError::InvalidValidity(format!("not a positive integer: '{}'", s))
        })?;
        Self::from_minutes(minutes)
    }
}

impl Display for ValidityPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.0)
    }
}
