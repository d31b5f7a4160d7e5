// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::serde::{date, time};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The UTM zone used when the UTM format is selected without a zone.
pub const DEFAULT_UTM_ZONE: u8 = 10;

/// Hemisphere letter of a latitude or longitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "W")]
    West,
}

impl Hemisphere {
    /// Parses the single hemisphere letter reported by the receiver.
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "N" => Some(Hemisphere::North),
            "S" => Some(Hemisphere::South),
            "E" => Some(Hemisphere::East),
            "W" => Some(Hemisphere::West),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        }
    }

    /// Southern and western values are negative in signed decimal degrees.
    pub fn is_negative(&self) -> bool {
        matches!(self, Hemisphere::South | Hemisphere::West)
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The format in which coordinates are reported.
///
/// Exactly one format is active per device. Parsing an unknown name fails,
/// the caller keeps its previous format in that case.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordinateFormat {
    /// Degrees, whole minutes and seconds.
    DegMinSec,
    /// Decimal degrees.
    DegDec,
    /// Degrees and decimal minutes, the encoding of the receiver itself.
    #[default]
    DegMinDec,
    /// Northing and easting of the Universal Transverse Mercator projection.
    Utm,
}

impl CoordinateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateFormat::DegMinSec => "deg-min-sec",
            CoordinateFormat::DegDec => "deg-dec",
            CoordinateFormat::DegMinDec => "deg-min-dec",
            CoordinateFormat::Utm => "utm",
        }
    }
}

impl FromStr for CoordinateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deg-min-sec" => Ok(CoordinateFormat::DegMinSec),
            "deg-dec" => Ok(CoordinateFormat::DegDec),
            "deg-min-dec" => Ok(CoordinateFormat::DegMinDec),
            "utm" => Ok(CoordinateFormat::Utm),
            _ => Err(format!(
                "invalid format '{s}', must be 'deg-min-sec', 'deg-dec', 'deg-min-dec' or 'utm'"
            )),
        }
    }
}

impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active coordinate format together with the zone used for UTM projections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateSettings {
    pub format: CoordinateFormat,
    pub zone: u8,
}

impl Default for CoordinateSettings {
    fn default() -> Self {
        CoordinateSettings {
            format: CoordinateFormat::default(),
            zone: DEFAULT_UTM_ZONE,
        }
    }
}

/// A single latitude or longitude value in one of the [`CoordinateFormat`]s.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    DegMinSec {
        degrees: u16,
        minutes: u8,
        seconds: f64,
        hemisphere: Hemisphere,
    },
    DegMinDec {
        degrees: u16,
        minutes: f64,
        hemisphere: Hemisphere,
    },
    DegDec {
        degrees: f64,
        hemisphere: Hemisphere,
    },
    /// Northing (for the latitude) or easting (for the longitude) in meters.
    Utm(f64),
}

/// A position report of the receiver.
///
/// For the UTM format `lat` holds the northing and `lon` the easting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: CoordinateValue,
    pub lon: CoordinateValue,
    #[serde(with = "time", default)]
    pub time: Option<NaiveTime>,
    #[serde(with = "date", default)]
    pub date: Option<NaiveDate>,
}

/// An altitude report of the receiver in whole meters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Altitude {
    pub alt: i64,
    #[serde(with = "time", default)]
    pub time: Option<NaiveTime>,
    #[serde(with = "date", default)]
    pub date: Option<NaiveDate>,
}

impl Coordinates {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
