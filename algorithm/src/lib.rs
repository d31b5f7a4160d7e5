// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::position::{CoordinateFormat, CoordinateSettings, CoordinateValue, Hemisphere};

/// A latitude or longitude split into whole degrees and decimal minutes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DegreeMinutes {
    pub degrees: u16,
    pub minutes: f64,
}

impl DegreeMinutes {
    /// Returns the unsigned value in decimal degrees.
    pub fn decimal_degrees(&self) -> f64 {
        f64::from(self.degrees) + self.minutes / 60.0
    }

    /// Returns the decimal degrees, negated for southern and western hemispheres.
    pub fn signed_degrees(&self, hemisphere: Hemisphere) -> f64 {
        let degrees = self.decimal_degrees();
        if hemisphere.is_negative() {
            -degrees
        } else {
            degrees
        }
    }

    /// Splits the decimal minutes into whole minutes and seconds.
    pub fn minutes_seconds(&self) -> (u8, f64) {
        let whole = self.minutes.trunc();
        (whole as u8, (self.minutes - whole) * 60.0)
    }
}

/// Splits the `dddmm.mmmm` encoding of the receiver into degrees and minutes.
///
/// The two digits immediately preceding the decimal point are the minutes, all
/// digits before them are the degrees. `4747.9760` is 47 degrees and 47.976 minutes.
///
/// # Returns
/// `None` if the value has less than two digits before the decimal point or is
/// not a number.
pub fn split_degree_minutes(raw: &str) -> Option<DegreeMinutes> {
    let raw = raw.trim();
    if !raw.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    let point = raw.find('.').unwrap_or(raw.len());
    if point < 2 {
        return None;
    }
    let (degrees, minutes) = raw.split_at(point - 2);
    let degrees = if degrees.is_empty() {
        0
    } else {
        degrees.parse::<u16>().ok()?
    };
    let minutes = minutes.parse::<f64>().ok()?;
    if !(0.0..60.0).contains(&minutes) {
        return None;
    }
    Some(DegreeMinutes { degrees, minutes })
}

/// Converts one raw coordinate into an angular [`CoordinateFormat`].
///
/// - `deg-min-sec`: degrees, truncated minutes and the fractional minutes as seconds.
/// - `deg-dec`: degrees plus minutes / 60.
/// - `deg-min-dec`: degrees and decimal minutes as reported.
///
/// The UTM projection needs latitude and longitude together, `None` is returned
/// for [`CoordinateFormat::Utm`]; use [`convert_coordinates`] instead.
pub fn convert_coordinate(
    raw: &str,
    hemisphere: Hemisphere,
    format: CoordinateFormat,
) -> Option<CoordinateValue> {
    let value = split_degree_minutes(raw)?;
    match format {
        CoordinateFormat::DegMinSec => {
            let (minutes, seconds) = value.minutes_seconds();
            Some(CoordinateValue::DegMinSec {
                degrees: value.degrees,
                minutes,
                seconds,
                hemisphere,
            })
        }
        CoordinateFormat::DegDec => Some(CoordinateValue::DegDec {
            degrees: value.decimal_degrees(),
            hemisphere,
        }),
        CoordinateFormat::DegMinDec => Some(CoordinateValue::DegMinDec {
            degrees: value.degrees,
            minutes: value.minutes,
            hemisphere,
        }),
        CoordinateFormat::Utm => None,
    }
}

/// Projects signed decimal degrees into the given UTM zone.
///
/// # Returns
/// The `(northing, easting)` pair in meters.
pub fn to_utm(latitude: f64, longitude: f64, zone: u8) -> (f64, f64) {
    let (northing, easting, _) = utm::to_utm_wgs84(latitude, longitude, zone);
    (northing, easting)
}

/// Converts a raw latitude/longitude pair with their hemisphere letters into
/// the format selected by `settings`.
///
/// For UTM both values are first converted to signed decimal degrees and then
/// projected into `settings.zone`; the latitude slot carries the northing and the
/// longitude slot the easting.
///
/// # Returns
/// `None` if a value or a hemisphere letter can't be interpreted.
pub fn convert_coordinates(
    lat: &str,
    lat_pole: &str,
    lon: &str,
    lon_pole: &str,
    settings: &CoordinateSettings,
) -> Option<(CoordinateValue, CoordinateValue)> {
    let lat_pole = Hemisphere::from_letter(lat_pole)?;
    let lon_pole = Hemisphere::from_letter(lon_pole)?;
    if settings.format == CoordinateFormat::Utm {
        let latitude = split_degree_minutes(lat)?.signed_degrees(lat_pole);
        let longitude = split_degree_minutes(lon)?.signed_degrees(lon_pole);
        let (northing, easting) = to_utm(latitude, longitude, settings.zone);
        return Some((CoordinateValue::Utm(northing), CoordinateValue::Utm(easting)));
    }
    Some((
        convert_coordinate(lat, lat_pole, settings.format)?,
        convert_coordinate(lon, lon_pole, settings.format)?,
    ))
}

/// Parses the leading integer of a string, ignoring everything after it.
///
/// `"545.4"` yields 545, `"  -12m"` yields -12 and `"x"` yields `None`.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests;
