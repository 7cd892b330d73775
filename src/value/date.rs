//! Canonical date-time values
//!
//! Lexical grammar (fixed, round-trippable):
//!
//! ```text
//! sYYYY-MM-DDThh:mm:ss.sssTZD
//! ```
//!
//! - `s`: optional `+` or `-`; years use astronomical numbering
//! - `YYYY`: exactly four digits
//! - `sss`: exactly three fractional digits (milliseconds)
//! - `TZD`: `Z` or `+hh:mm` / `-hh:mm`
//!
//! A date is stored as milliseconds since the Unix epoch plus the offset it
//! was written with. Numeric sources may produce instants outside the
//! calendar range chrono can render; such dates compare normally but have
//! no canonical string form.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use super::errors::ConversionError;
use super::types::SemanticType;

/// A date instant with the UTC offset it was expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateValue {
    /// Milliseconds since 1970-01-01T00:00:00.000Z
    millis: i64,
    /// Offset from UTC in seconds
    offset_seconds: i32,
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([+-]?)(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})\.(\d{3})(Z|[+-]\d{2}:\d{2})$",
        )
        .expect("date regex must compile")
    })
}

impl DateValue {
    /// Creates a UTC date from milliseconds since the epoch.
    pub fn from_epoch_millis(millis: i64) -> Self {
        Self {
            millis,
            offset_seconds: 0,
        }
    }

    /// Milliseconds since the epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.millis
    }

    /// Offset from UTC in seconds.
    pub fn offset_seconds(&self) -> i32 {
        self.offset_seconds
    }

    /// Parses the canonical lexical form.
    pub fn parse(input: &str) -> Result<Self, ConversionError> {
        let lexical = || ConversionError::lexical(SemanticType::Date, input);

        let caps = date_re().captures(input).ok_or_else(lexical)?;
        let field = |i: usize| -> Result<u32, ConversionError> {
            caps[i].parse::<u32>().map_err(|_| lexical())
        };

        let mut year = field(2)? as i32;
        if &caps[1] == "-" {
            year = -year;
        }

        let date = NaiveDate::from_ymd_opt(year, field(3)?, field(4)?).ok_or_else(lexical)?;
        let time = NaiveTime::from_hms_milli_opt(field(5)?, field(6)?, field(7)?, field(8)?)
            .ok_or_else(lexical)?;
        let offset = parse_offset(&caps[9]).ok_or_else(lexical)?;

        let local = NaiveDateTime::new(date, time);
        let instant = offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(lexical)?;

        Ok(Self {
            millis: instant.timestamp_millis(),
            offset_seconds: offset.local_minus_utc(),
        })
    }

    /// Renders the canonical lexical form.
    ///
    /// Returns `None` when the instant has no four-digit year representation.
    pub fn to_canonical_string(&self) -> Option<String> {
        let offset = FixedOffset::east_opt(self.offset_seconds)?;
        let dt = DateTime::from_timestamp_millis(self.millis)?.with_timezone(&offset);

        let year = dt.year();
        if year.abs() > 9999 {
            return None;
        }
        let sign = if year < 0 { "-" } else { "" };

        Some(format!(
            "{}{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}{}",
            sign,
            year.abs(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.timestamp_subsec_millis(),
            format_offset(self.offset_seconds),
        ))
    }

    /// Compares two dates as instants, ignoring the offset they carry.
    pub fn cmp_instant(&self, other: &DateValue) -> Ordering {
        self.millis.cmp(&other.millis)
    }
}

fn parse_offset(tzd: &str) -> Option<FixedOffset> {
    if tzd == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = if tzd.starts_with('-') { -1 } else { 1 };
    let hours: i32 = tzd.get(1..3)?.parse().ok()?;
    let minutes: i32 = tzd.get(4..6)?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn format_offset(offset_seconds: i32) -> String {
    if offset_seconds == 0 {
        return "Z".to_string();
    }
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_canonical_string() {
            Some(s) => write!(f, "{}", s),
            None => write!(f, "@{}ms", self.millis),
        }
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_canonical_string() {
            Some(s) => serializer.serialize_str(&s),
            None => serializer.serialize_i64(self.millis),
        }
    }
}

impl<'de> Deserialize<'de> for DateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Lexical(String),
            Millis(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Lexical(s) => DateValue::parse(&s).map_err(serde::de::Error::custom),
            Repr::Millis(m) => Ok(DateValue::from_epoch_millis(m)),
        }
    }
}
