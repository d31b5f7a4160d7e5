use crate::{convert_coordinate, convert_coordinates, split_degree_minutes, to_utm};
use common::position::{
    CoordinateFormat, CoordinateSettings, CoordinateValue, DEFAULT_UTM_ZONE, Hemisphere,
};

const LAT: &str = "4747.9760";
const LON: &str = "12205.0757";

fn assert_close(lhs: f64, rhs: f64) {
    assert!((lhs - rhs).abs() < 1e-9, "{lhs} != {rhs}");
}

#[test]
fn split_latitude_with_two_degree_digits() {
    let value = split_degree_minutes(LAT).unwrap();
    assert_eq!(value.degrees, 47);
    assert_close(value.minutes, 47.976);
}

#[test]
fn split_longitude_with_three_degree_digits() {
    let value = split_degree_minutes(LON).unwrap();
    assert_eq!(value.degrees, 122);
    assert_close(value.minutes, 5.0757);
}

#[test]
fn split_rejects_values_without_minutes() {
    assert!(split_degree_minutes("4.5").is_none());
    assert!(split_degree_minutes("").is_none());
    assert!(split_degree_minutes("ab12.5").is_none());
    assert!(split_degree_minutes("4775.0").is_none());
}

#[test]
fn split_rejects_non_ascii_values() {
    assert!(split_degree_minutes("éa.5").is_none());
    assert!(split_degree_minutes("4é7.5").is_none());
    assert!(split_degree_minutes("4747.97€").is_none());
    assert!(split_degree_minutes("-4747.9760").is_none());
    assert!(
        convert_coordinate("é7.5", Hemisphere::North, CoordinateFormat::DegMinSec).is_none()
    );
}

#[test]
fn convert_to_deg_min_dec() {
    let value = convert_coordinate(LAT, Hemisphere::North, CoordinateFormat::DegMinDec);
    assert_eq!(
        value,
        Some(CoordinateValue::DegMinDec {
            degrees: 47,
            minutes: 47.976,
            hemisphere: Hemisphere::North,
        })
    );
}

#[test]
fn convert_to_deg_dec() {
    let Some(CoordinateValue::DegDec {
        degrees,
        hemisphere,
    }) = convert_coordinate(LAT, Hemisphere::North, CoordinateFormat::DegDec)
    else {
        panic!("Expected a deg-dec value");
    };
    assert_close(degrees, 47.0 + 47.976 / 60.0);
    assert_eq!(hemisphere, Hemisphere::North);
}

#[test]
fn convert_to_deg_min_sec() {
    let Some(CoordinateValue::DegMinSec {
        degrees,
        minutes,
        seconds,
        hemisphere,
    }) = convert_coordinate(LAT, Hemisphere::North, CoordinateFormat::DegMinSec)
    else {
        panic!("Expected a deg-min-sec value");
    };
    assert_eq!(degrees, 47);
    assert_eq!(minutes, 47);
    assert_close(seconds, 58.56);
    assert_eq!(hemisphere, Hemisphere::North);
}

#[test]
fn single_value_utm_is_not_possible() {
    assert!(convert_coordinate(LAT, Hemisphere::North, CoordinateFormat::Utm).is_none());
}

#[test]
fn convert_pair_keeps_hemispheres() {
    let settings = CoordinateSettings::default();
    let (lat, lon) = convert_coordinates(LAT, "N", LON, "W", &settings).unwrap();
    assert!(matches!(
        lat,
        CoordinateValue::DegMinDec {
            hemisphere: Hemisphere::North,
            ..
        }
    ));
    assert!(matches!(
        lon,
        CoordinateValue::DegMinDec {
            degrees: 122,
            hemisphere: Hemisphere::West,
            ..
        }
    ));
}

#[test]
fn convert_pair_rejects_unknown_pole() {
    let settings = CoordinateSettings::default();
    assert!(convert_coordinates(LAT, "", LON, "W", &settings).is_none());
    assert!(convert_coordinates(LAT, "N", LON, "X", &settings).is_none());
}

#[test]
fn convert_pair_to_utm_negates_western_longitude() {
    let settings = CoordinateSettings {
        format: CoordinateFormat::Utm,
        zone: DEFAULT_UTM_ZONE,
    };
    let (northing, easting) = match convert_coordinates(LAT, "N", LON, "W", &settings) {
        Some((CoordinateValue::Utm(northing), CoordinateValue::Utm(easting))) => {
            (northing, easting)
        }
        other => panic!("Expected UTM values, got {other:?}"),
    };
    // 122.08 W lies east of the central meridian (123 W) of zone 10.
    assert!(easting > 500_000.0 && easting < 700_000.0, "{easting}");
    assert!(northing > 5_200_000.0 && northing < 5_400_000.0, "{northing}");

    let (expected_northing, expected_easting) =
        to_utm(47.0 + 47.976 / 60.0, -(122.0 + 5.0757 / 60.0), DEFAULT_UTM_ZONE);
    assert_close(northing, expected_northing);
    assert_close(easting, expected_easting);
}
