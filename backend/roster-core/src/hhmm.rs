// src/hhmm.rs
//! `HH:MM[:SS]` text form for `chrono::Duration`, used for shift times, rule
//! ceilings and error messages.

use chrono::Duration;
use serde::{de, Deserialize, Deserializer, Serializer};

/// Parses `HH:MM` or `HH:MM:SS`. Hours are not capped at 24 so that rule
/// ceilings such as `48:00` can be expressed.
pub fn parse(text: &str) -> Result<Duration, String> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("expected HH:MM or HH:MM:SS, got '{}'", text));
    }

    let number = |part: &str, what: &str| -> Result<i64, String> {
        part.parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| format!("invalid {} '{}' in '{}'", what, part, text))
    };

    let hours = number(parts[0], "hours")?;
    let minutes = number(parts[1], "minutes")?;
    let seconds = match parts.get(2) {
        Some(part) => number(part, "seconds")?,
        None => 0,
    };
    if minutes >= 60 || seconds >= 60 {
        return Err(format!("minutes and seconds must be below 60 in '{}'", text));
    }

    let total = Duration::try_hours(hours)
        .zip(Duration::try_minutes(minutes))
        .and_then(|(h, m)| h.checked_add(&m))
        .and_then(|hm| hm.checked_add(&Duration::seconds(seconds)))
        .ok_or_else(|| format!("'{}' is out of range", text))?;
    Ok(if negative { -total } else { total })
}

/// Formats as `HH:MM`, appending `:SS` only when seconds are present.
/// Negative values get a leading `-`.
pub fn format(duration: &Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if seconds == 0 {
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
    }
}

pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(duration))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(de::Error::custom)
}

/// Same as the parent module for `Option<Duration>`; `null` means "no limit".
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_some(&format(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => parse(&text).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}
