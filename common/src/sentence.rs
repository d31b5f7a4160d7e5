// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fields of one decoded sentence.
///
/// A `FieldMapping` is produced per packet by a sentence decoder. The `kind`
/// discriminates the sentence type reported by the receiver (e.g. `GGA`,
/// `RMC`). The attributes the driver reacts on are kept as dedicated fields,
/// every other named value of the sentence lands in `fields`.
///
/// An attribute the sentence did not carry (or carried empty) is `None`,
/// which is distinct from a reported zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// The sentence type without the talker prefix.
    pub kind: String,
    /// The talker prefix of the sentence (e.g. `GP`, `GN`).
    pub talker_id: String,
    /// UTC time of the sentence as reported, `hhmmss.sss`.
    pub timestamp: Option<String>,
    /// UTC date of the sentence as reported, `ddmmyy`.
    pub date: Option<String>,
    /// Latitude in the `ddmm.mmmm` encoding.
    pub lat: Option<String>,
    pub lat_pole: Option<String>,
    /// Longitude in the `dddmm.mmmm` encoding.
    pub lon: Option<String>,
    pub lon_pole: Option<String>,
    /// Altitude above mean sea level as reported.
    pub alt: Option<String>,
    /// Number of satellites used for the fix.
    pub num_sat: Option<u32>,
    /// Remaining named values of the sentence.
    pub fields: BTreeMap<String, String>,
}

impl FieldMapping {
    /// Creates an empty mapping for the given sentence kind.
    pub fn new(kind: &str) -> Self {
        FieldMapping {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    /// Returns true if latitude, longitude and both hemisphere letters are present.
    pub fn has_position(&self) -> bool {
        self.lat.is_some() && self.lat_pole.is_some() && self.lon.is_some() && self.lon_pole.is_some()
    }

    /// Looks up one of the remaining named values.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Parses the reported timestamp (`hhmmss` with optional fraction).
    pub fn utc_time(&self) -> Option<NaiveTime> {
        let timestamp = self.timestamp.as_deref()?;
        NaiveTime::parse_from_str(timestamp, "%H%M%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(timestamp, "%H%M%S"))
            .ok()
    }

    /// Parses the reported date (`ddmmyy`).
    pub fn utc_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.as_deref()?, "%d%m%y").ok()
    }
}
