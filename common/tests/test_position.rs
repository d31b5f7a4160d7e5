// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use chrono::{NaiveDate, NaiveTime};
use common::position::{
    CoordinateFormat, CoordinateSettings, CoordinateValue, Coordinates, DEFAULT_UTM_ZONE,
    Hemisphere,
};
use std::str::FromStr;

fn get_coordinates_as_json<'a>() -> &'a str {
    r#"
    {
        "lat": { "degrees": 47, "minutes": 47.976, "hemisphere": "N" },
        "lon": { "degrees": 122, "minutes": 5.0757, "hemisphere": "W" },
        "time": "19:17:42.339",
        "date": "25.11.2015"
    }
    "#
}

fn get_coordinates() -> Coordinates {
    Coordinates {
        lat: CoordinateValue::DegMinDec {
            degrees: 47,
            minutes: 47.976,
            hemisphere: Hemisphere::North,
        },
        lon: CoordinateValue::DegMinDec {
            degrees: 122,
            minutes: 5.0757,
            hemisphere: Hemisphere::West,
        },
        time: Some(NaiveTime::parse_from_str("19:17:42.339", "%H:%M:%S%.3f").unwrap()),
        date: Some(NaiveDate::parse_from_str("25.11.2015", "%d.%m.%Y").unwrap()),
    }
}

#[test]
pub fn deserialize_coordinates_from_json() {
    let coordinates = Coordinates::from_json(get_coordinates_as_json())
        .unwrap_or_else(|e| panic!("Failed to deserialize the raw json. Reason: {e}"));
    assert_eq!(coordinates, get_coordinates());
}

#[test]
pub fn serialize_utm_coordinates_without_time() {
    let coordinates = Coordinates {
        lat: CoordinateValue::Utm(5_294_000.5),
        lon: CoordinateValue::Utm(568_600.25),
        time: None,
        date: None,
    };
    let json = serde_json::to_value(&coordinates).unwrap();
    assert_eq!(json["lat"], 5_294_000.5);
    assert_eq!(json["lon"], 568_600.25);
    assert!(json["time"].is_null());
}

#[test]
pub fn parse_known_coordinate_formats() {
    for format in [
        CoordinateFormat::DegMinSec,
        CoordinateFormat::DegDec,
        CoordinateFormat::DegMinDec,
        CoordinateFormat::Utm,
    ] {
        assert_eq!(CoordinateFormat::from_str(format.as_str()), Ok(format));
    }
}

#[test]
pub fn reject_unknown_coordinate_format() {
    assert!(CoordinateFormat::from_str("deg-sec").is_err());
    assert!(CoordinateFormat::from_str("").is_err());
    assert!(CoordinateFormat::from_str("UTM").is_err());
}

#[test]
pub fn default_settings_use_deg_min_dec_and_default_zone() {
    let settings = CoordinateSettings::default();
    assert_eq!(settings.format, CoordinateFormat::DegMinDec);
    assert_eq!(settings.zone, DEFAULT_UTM_ZONE);
}

#[test]
pub fn hemisphere_letters() {
    assert_eq!(Hemisphere::from_letter("S"), Some(Hemisphere::South));
    assert_eq!(Hemisphere::from_letter(""), None);
    assert!(Hemisphere::West.is_negative());
    assert!(!Hemisphere::East.is_negative());
    assert_eq!(Hemisphere::North.to_string(), "N");
}
