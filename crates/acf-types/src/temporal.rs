use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Creation time of a pass.
///
/// Held at millisecond precision in UTC. The canonical string form is
/// `YYYY-MM-DDTHH:MM:SS.mmmZ`; every RFC 3339 rendering of the same instant
/// (`+00:00` suffix, other offsets, extra sub-millisecond digits) parses back
/// to the same value, so the canonical form is stable across a store that
/// rewrites timestamp strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PassTimestamp(DateTime<Utc>);

impl PassTimestamp {
    /// The current wall-clock time, truncated to milliseconds.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(3))
    }

    /// Construct from milliseconds since the UNIX epoch.
    pub fn from_millis(ms: i64) -> Result<Self, TypeError> {
        DateTime::from_timestamp_millis(ms)
            .map(Self)
            .ok_or_else(|| TypeError::InvalidTimestamp(format!("{ms}ms out of range")))
    }

    /// Parse any RFC 3339 timestamp and normalize it to UTC milliseconds.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Self(dt.with_timezone(&Utc).trunc_subsecs(3)))
            .map_err(|e| TypeError::InvalidTimestamp(format!("{s:?}: {e}")))
    }

    /// Re-render a stored timestamp string in canonical form.
    pub fn normalize(s: &str) -> Result<String, TypeError> {
        Self::parse(s).map(|ts| ts.canonical())
    }

    /// The canonical string form, e.g. `2024-11-20T06:00:00.000Z`.
    pub fn canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Milliseconds since the UNIX epoch.
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The underlying `chrono` value.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl FromStr for PassTimestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PassTimestamp {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PassTimestamp> for String {
    fn from(ts: PassTimestamp) -> Self {
        ts.canonical()
    }
}

impl fmt::Debug for PassTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PassTimestamp({})", self.canonical())
    }
}

impl fmt::Display for PassTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
