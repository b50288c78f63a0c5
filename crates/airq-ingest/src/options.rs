//! Ingestion configuration.

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Default number of records per batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 500;

/// Default literal meaning "missing reading".
pub const DEFAULT_MISSING_SENTINEL: &str = "-200";

/// Options controlling how a sensor file is decoded and batched.
///
/// Column names refer to headers after normalization, so `Date` in the file
/// is matched by `date` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Single ASCII field separator.
    /// Defaults to `;`.
    pub delimiter: char,

    /// Records per batch handed to the consumer.
    /// Defaults to 500.
    pub batch_capacity: usize,

    /// Literal that marks a missing reading, coerced to null.
    /// Defaults to `-200`.
    pub missing_sentinel: String,

    /// Normalized header of the date component.
    pub date_column: String,

    /// Normalized header of the time-of-day component.
    pub time_column: String,

    /// Field name given to the composed timestamp, normalized like a header.
    pub timestamp_column: String,

    /// chrono format of the date component.
    /// Defaults to `%d/%m/%Y`.
    pub date_format: String,

    /// Whether double quotes delimit fields.
    /// Defaults to true.
    pub quoting: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: ';',
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            missing_sentinel: DEFAULT_MISSING_SENTINEL.to_string(),
            date_column: "date".to_string(),
            time_column: "time".to_string(),
            timestamp_column: "timestamp".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            quoting: true,
        }
    }
}

impl IngestOptions {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity;
        self
    }

    pub fn with_missing_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.missing_sentinel = sentinel.into();
        self
    }

    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = name.into();
        self
    }

    pub fn with_time_column(mut self, name: impl Into<String>) -> Self {
        self.time_column = name.into();
        self
    }

    pub fn with_timestamp_column(mut self, name: impl Into<String>) -> Self {
        self.timestamp_column = name.into();
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_quoting(mut self, quoting: bool) -> Self {
        self.quoting = quoting;
        self
    }

    /// The delimiter as the single byte the CSV reader expects.
    ///
    /// Only meaningful after [`validate`](Self::validate) has accepted the options.
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b';')
    }

    /// Rejects options the decoder or pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.batch_capacity == 0 {
            return Err(invalid("batch capacity must be at least 1"));
        }
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '\n' | '\r' | '"') {
            return Err(invalid(format!(
                "delimiter {:?} must be a single ASCII character other than quote or newline",
                self.delimiter
            )));
        }
        if self.missing_sentinel.trim().is_empty() {
            return Err(invalid("missing-reading sentinel must not be blank"));
        }
        for (label, name) in [
            ("date column", &self.date_column),
            ("time column", &self.time_column),
            ("timestamp column", &self.timestamp_column),
        ] {
            if name.trim().is_empty() {
                return Err(invalid(format!("{label} must not be blank")));
            }
        }
        if self.date_format.trim().is_empty() {
            return Err(invalid("date format must not be blank"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> IngestError {
    IngestError::InvalidOptions {
        reason: reason.into(),
    }
}
