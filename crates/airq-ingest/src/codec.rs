//! Per-field header normalization and value coercion.
//!
//! Everything here is pure: malformed input degrades to a string or null and
//! never fails the run.
//!
//! Coercion order for a single cell:
//!
//! 1. trim; empty becomes null
//! 2. the missing-reading sentinel becomes null
//! 3. the time column is canonicalized to `HH:MM:SS` and kept as text
//! 4. the date column is parsed into a midnight timestamp
//! 5. anything else is parsed as a number (decimal comma accepted), falling
//!    back to the trimmed text
//!
//! Timestamp composition and the post-coercion sentinel sweep work on a whole
//! record and run after every cell has been coerced.

use chrono::{NaiveDate, NaiveTime};

use airq_model::{Record, Value};

use crate::options::IngestOptions;

/// Normalizes a raw header token into a field name.
///
/// Lower-cases alphanumeric runs and joins them with a single `_`; every
/// other character acts as a separator. Returns `None` when nothing
/// alphanumeric remains, which drops the column.
///
/// `PT08.S1(CO)` becomes `pt08_s1_co`, `;;` or `()` become `None`.
pub fn normalize_header(raw: &str) -> Option<String> {
    let mut normalized = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            pending_separator = false;
            normalized.extend(ch.to_lowercase().filter(|c| c.is_alphanumeric()));
        } else {
            pending_separator = true;
        }
    }
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Canonicalizes a time-of-day value to `HH:MM:SS`.
///
/// Dots, commas and dashes are read as separators, single-digit components
/// are zero padded and a missing seconds component becomes `00`. Values that
/// are not two or three numeric components only get their separators mapped
/// to colons.
pub fn normalize_time(raw: &str) -> String {
    let parts: Vec<&str> = raw.split(is_time_separator).collect();
    let numeric = parts
        .iter()
        .all(|part| (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit()));
    if numeric && (2..=3).contains(&parts.len()) {
        let mut canonical: Vec<String> = parts.iter().map(|part| format!("{part:0>2}")).collect();
        if canonical.len() == 2 {
            canonical.push("00".to_string());
        }
        return canonical.join(":");
    }
    raw.chars()
        .map(|ch| if is_time_separator(ch) { ':' } else { ch })
        .collect()
}

fn is_time_separator(ch: char) -> bool {
    matches!(ch, ':' | '.' | ',' | '-')
}

/// Parses a numeric reading, accepting a decimal comma.
///
/// Non-finite results (`inf`, `NaN`) are not readings and return `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = trimmed.replace(',', ".");
    candidate
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Field coercion bound to one set of ingest options.
#[derive(Debug, Clone)]
pub struct FieldCodec {
    sentinel: String,
    sentinel_number: Option<f64>,
    date_column: String,
    time_column: String,
    timestamp_column: String,
    date_format: String,
}

impl FieldCodec {
    pub fn new(options: &IngestOptions) -> Self {
        let column = |name: &str| normalize_header(name).unwrap_or_else(|| name.to_string());
        let sentinel = options.missing_sentinel.trim().to_string();
        Self {
            sentinel_number: parse_number(&sentinel),
            sentinel,
            date_column: column(&options.date_column),
            time_column: column(&options.time_column),
            timestamp_column: column(&options.timestamp_column),
            date_format: options.date_format.clone(),
        }
    }

    /// Coerces one raw cell under its normalized header.
    pub fn coerce_value(&self, header: &str, raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == self.sentinel {
            return Value::Null;
        }
        if header == self.time_column {
            return Value::Text(normalize_time(trimmed));
        }
        if header == self.date_column {
            return match NaiveDate::parse_from_str(trimmed, &self.date_format) {
                Ok(date) => Value::Timestamp(date.and_time(NaiveTime::MIN)),
                Err(_) => Value::Text(trimmed.to_string()),
            };
        }
        match parse_number(trimmed) {
            Some(number) => Value::Number(number),
            None => Value::Text(trimmed.to_string()),
        }
    }

    /// Merges a parsed date and the time-of-day into one timestamp field.
    ///
    /// Only runs when the date column holds a parsed date. The date field is
    /// always replaced; the time field is removed when it was consumed or was
    /// null, and kept as text when it did not parse (the timestamp then stays
    /// at midnight).
    ///
    /// An input column that already normalizes to the timestamp name is
    /// replaced by the composed value.
    pub fn compose_timestamp(&self, record: &mut Record) {
        let Some(date) = record.get(&self.date_column).and_then(Value::as_timestamp) else {
            return;
        };
        record.remove(&self.date_column);

        let mut timestamp = date;
        match record.get(&self.time_column) {
            Some(Value::Text(time)) => {
                if let Some(time) = parse_time(time) {
                    timestamp = date.date().and_time(time);
                    record.remove(&self.time_column);
                }
            }
            Some(Value::Null) => {
                record.remove(&self.time_column);
            }
            _ => {}
        }
        record.insert(self.timestamp_column.as_str(), Value::Timestamp(timestamp));
    }

    /// Forces any numeric field equal to the sentinel to null.
    ///
    /// Catches spellings the literal comparison misses, such as `-200,0`.
    pub fn sweep_sentinels(&self, record: &mut Record) {
        let Some(sentinel) = self.sentinel_number else {
            return;
        };
        for value in record.values_mut() {
            if value.as_number() == Some(sentinel) {
                *value = Value::Null;
            }
        }
    }

    /// Builds a record from (header, raw value) pairs, applying every rule.
    ///
    /// Headers that normalize to nothing are skipped along with their value.
    pub fn decode_fields<'a, I>(&self, fields: I) -> Record
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Record::new();
        for (header, raw) in fields {
            let Some(name) = normalize_header(header) else {
                continue;
            };
            let value = self.coerce_value(&name, raw);
            record.insert(name, value);
        }
        self.compose_timestamp(&mut record);
        self.sweep_sentinels(&mut record);
        record
    }
}

impl Default for FieldCodec {
    fn default() -> Self {
        Self::new(&IngestOptions::default())
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S").ok()
}
