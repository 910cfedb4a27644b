use std::fmt;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

pub const DEFAULT_URL: &str = "http://www.celestrak.org/NORAD/elements/weather.txt";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d - %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub url: String,
    pub auto_run: bool,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub last_success: Option<NaiveDateTime>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            auto_run: false,
            last_success: None,
        }
    }
}

impl Settings {
    pub fn reset_url(&mut self) {
        self.url = DEFAULT_URL.to_string();
    }
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// The settings file only stores minutes, so in-memory timestamps are cut to match.
pub fn truncate_to_minute(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .with_second(0)
        .and_then(|ts| ts.with_nanosecond(0))
        .unwrap_or(timestamp)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Timeout,
    ConnectionFailed,
    Unexpected,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkErrorKind::Timeout => write!(f, "timeout"),
            NetworkErrorKind::ConnectionFailed => write!(f, "connection failed"),
            NetworkErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum PreflightReason {
    Status { code: u16 },
    ContentType { found: String },
}

impl fmt::Display for PreflightReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreflightReason::Status { code } => write!(f, "final status code {code} is not 200"),
            PreflightReason::ContentType { found } => {
                write!(f, "content-type '{found}' does not match the expected 'text/plain'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success {
        bytes: usize,
        #[serde(serialize_with = "serialize_timestamp")]
        timestamp: NaiveDateTime,
    },
    PreflightRejected {
        reason: PreflightReason,
    },
    NetworkError {
        kind: NetworkErrorKind,
        detail: String,
    },
    ValidationFailed,
    PersistenceError {
        reason: String,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Success { bytes, timestamp } => write!(
                f,
                "updated Kepler data ({bytes} bytes) at {}",
                format_timestamp(timestamp)
            ),
            FetchOutcome::PreflightRejected { reason } => {
                write!(f, "the requested URL was rejected: {reason}")
            }
            FetchOutcome::NetworkError { kind, detail } => {
                write!(f, "network error ({kind}): {detail}")
            }
            FetchOutcome::ValidationFailed => write!(
                f,
                "either the data is not formatted correctly, or one of the NOAA satellites (15, 18, 19) is missing"
            ),
            FetchOutcome::PersistenceError { reason } => {
                write!(f, "could not save Kepler data: {reason}")
            }
        }
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(value))
}

fn serialize_optional_timestamp<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(timestamp) => serializer.serialize_some(&format_timestamp(timestamp)),
        None => serializer.serialize_none(),
    }
}
