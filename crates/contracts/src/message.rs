//! Wire messages: work items and their audit records
//!
//! ## Wire formats
//! - work queue: the raw part-file identifier, UTF-8
//! - log queue: `<source>,<unix-seconds>,<payload>` where the timestamp has
//!   microsecond precision, e.g. `nsfw,1580000000.123456,/out/part-00000`

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContractError, PartFile};

/// Message published to the work queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub payload: PartFile,
}

impl WorkItem {
    pub fn new(payload: PartFile) -> Self {
        Self { payload }
    }

    /// Encode to the work-queue wire format
    pub fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(self.payload.as_str().as_bytes())
    }
}

/// Trace of one dispatched work item, published to the log queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Tag identifying the producing pipeline
    pub source: String,
    /// Wall-clock time of the publish
    pub timestamp: DateTime<Utc>,
    /// Same payload as the matching work item
    pub payload: String,
}

impl AuditRecord {
    /// Build a record stamped with the current time
    pub fn now(source: impl Into<String>, payload: &PartFile) -> Self {
        Self::at(source, Utc::now(), payload)
    }

    pub fn at(source: impl Into<String>, timestamp: DateTime<Utc>, payload: &PartFile) -> Self {
        Self {
            source: source.into(),
            timestamp,
            payload: payload.as_str().to_string(),
        }
    }

    /// Unix timestamp rendered with microsecond precision
    pub fn unix_seconds(&self) -> String {
        format!(
            "{}.{:06}",
            self.timestamp.timestamp(),
            self.timestamp.timestamp_subsec_micros()
        )
    }

    /// Encode to the comma-joined log-queue wire format
    pub fn encode(&self) -> Bytes {
        Bytes::from(format!(
            "{},{},{}",
            self.source,
            self.unix_seconds(),
            self.payload
        ))
    }

    /// Decode a log-queue message.
    ///
    /// Only the first two commas separate fields; the payload keeps any
    /// commas of its own.
    pub fn decode(raw: &[u8]) -> Result<Self, ContractError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| ContractError::Other(format!("audit record is not utf-8: {e}")))?;

        let mut fields = text.splitn(3, ',');
        let (Some(source), Some(ts), Some(payload)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(ContractError::Other(format!(
                "malformed audit record: {text:?}"
            )));
        };

        let timestamp = parse_unix_seconds(ts)?;

        Ok(Self {
            source: source.to_string(),
            timestamp,
            payload: payload.to_string(),
        })
    }
}

fn parse_unix_seconds(raw: &str) -> Result<DateTime<Utc>, ContractError> {
    let invalid = || ContractError::Other(format!("invalid audit timestamp: {raw:?}"));

    let (secs, frac) = raw.split_once('.').unwrap_or((raw, ""));
    let secs: i64 = secs.parse().map_err(|_| invalid())?;

    let micros: u32 = if frac.is_empty() {
        0
    } else {
        if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // Right-pad to nanoseconds then drop to micros
        let nanos: u32 = format!("{frac:0<9}").parse().map_err(|_| invalid())?;
        nanos / 1_000
    };

    DateTime::from_timestamp(secs, micros * 1_000).ok_or_else(invalid)
}
