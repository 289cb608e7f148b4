use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

/// Timestamp format accepted by the extractor's `-s` and `-e` flags.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error)]
pub enum TimeWindowError {
    #[error("Failed to parse timestamp '{0}' (expected YYYY-MM-DDTHH:MM): {1}")]
    Parse(String, chrono::ParseError),
    #[error("end_time cannot be earlier than start_time")]
    Order,
}

/// Inclusive time interval shared by every task of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, TimeWindowError> {
        if start > end {
            return Err(TimeWindowError::Order);
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, TimeWindowError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn start_str(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Number of hourly steps in the window, both ends included.
    pub fn hours(&self) -> i64 {
        (self.end - self.start).num_hours() + 1
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start_str(), self.end_str())
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, TimeWindowError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| TimeWindowError::Parse(value.to_string(), e))
}
