// Calendar-day serde helpers
//
// Dates arrive from the store either as plain `YYYY-MM-DD` strings or as full
// timestamps written by older clients. Both are accepted and normalised to a
// UTC calendar day; output is always `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
use std::collections::{BTreeMap, BTreeSet};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse a calendar day from a date or timestamp string
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, DAY_FORMAT) {
        return Some(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc().date());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, DAY_FORMAT).ok())
}

pub fn format_day(day: &NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn parse_or_error<E: serde::de::Error>(raw: &str) -> Result<NaiveDate, E> {
    parse_day(raw).ok_or_else(|| E::custom(format!("invalid calendar day '{}'", raw)))
}

/// `#[serde(with = "dates::day")]` for `NaiveDate`
pub mod day {
    use super::*;

    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_day(day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_or_error(&raw)
    }
}

/// `#[serde(with = "dates::option_day")]` for `Option<NaiveDate>`; blank strings read as `None`
pub mod option_day {
    use super::*;

    pub fn serialize<S: Serializer>(day: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match day {
            Some(day) => serializer.serialize_str(&format_day(day)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_or_error(&raw).map(Some),
            None => Ok(None),
        }
    }
}

/// `#[serde(with = "dates::day_set")]` for `BTreeSet<NaiveDate>`
pub mod day_set {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(days: &BTreeSet<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(days.len()))?;
        for day in days {
            seq.serialize_element(&format_day(day))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<NaiveDate>, D::Error> {
        let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        raw.iter().map(|value| parse_or_error(value)).collect()
    }
}

/// `#[serde(with = "dates::day_map")]` for `BTreeMap<NaiveDate, u32>`
pub mod day_map {
    use super::*;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<NaiveDate, u32>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (day, count) in map {
            out.serialize_entry(&format_day(day), count)?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<NaiveDate, u32>, D::Error> {
        let raw = Option::<BTreeMap<String, u32>>::deserialize(deserializer)?.unwrap_or_default();
        raw.into_iter()
            .map(|(key, count)| {
                parse_day(&key)
                    .map(|day| (day, count))
                    .ok_or_else(|| D::Error::custom(format!("invalid calendar day key '{}'", key)))
            })
            .collect()
    }
}
