// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Decoding of single NMEA 0183 sentences into a [`FieldMapping`].

use common::sentence::FieldMapping;
use nmea::{
    ParseResult,
    sentences::{GgaData, GllData, GsaData, GsvData, RmcData, VtgData},
};
use tracing::debug;

/// Turns one framed packet into the fields of a sentence.
pub trait SentenceDecoder: Send + Sync {
    /// Decodes a packet that starts with the `$` sentinel.
    ///
    /// # Returns
    /// `None` if the packet is not a valid sentence. A malformed packet is not
    /// an error, it simply yields no data.
    fn decode(&self, packet: &[u8]) -> Option<FieldMapping>;
}

/// Sentence kinds parsed by the `nmea` crate. Every other kind keeps its
/// values under positional names.
const TYPED_KINDS: &[&str] = &["GGA", "RMC", "GLL", "GSA", "GSV", "VTG"];

/// Decoder for the plain text sentences of the receiver, e.g.
/// `$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NmeaDecoder;

impl NmeaDecoder {
    pub fn new() -> Self {
        NmeaDecoder
    }
}

impl SentenceDecoder for NmeaDecoder {
    fn decode(&self, packet: &[u8]) -> Option<FieldMapping> {
        let sentence = std::str::from_utf8(packet).ok()?.trim();
        let id = sentence.strip_prefix('$')?.split([',', '*']).next()?;
        if id.len() < 5 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let (talker_id, kind) = id.split_at(2);
        let mut mapping = if TYPED_KINDS.contains(&kind) {
            typed(sentence)?
        } else {
            positional(kind, sentence)?
        };
        mapping.talker_id = talker_id.to_string();
        Some(mapping)
    }
}

fn typed(sentence: &str) -> Option<FieldMapping> {
    match nmea::parse_str(sentence) {
        Ok(ParseResult::GGA(gga)) => Some(from_gga(gga)),
        Ok(ParseResult::RMC(rmc)) => Some(from_rmc(rmc)),
        Ok(ParseResult::GLL(gll)) => Some(from_gll(gll)),
        Ok(ParseResult::GSA(gsa)) => Some(from_gsa(gsa)),
        Ok(ParseResult::GSV(gsv)) => Some(from_gsv(gsv)),
        Ok(ParseResult::VTG(vtg)) => Some(from_vtg(vtg)),
        Ok(other) => {
            debug!("Ignore sentence {other:?}");
            None
        }
        Err(e) => {
            debug!("Drop sentence {sentence:?}. Error: {e:?}");
            None
        }
    }
}

/// Back to the `ddmm.mmmmm` encoding with the hemisphere letter from the sign.
fn degree_minutes(value: f64, degree_digits: usize, poles: [char; 2]) -> (String, String) {
    let pole = if value < 0.0 { poles[1] } else { poles[0] };
    let value = value.abs();
    let mut degrees = value.trunc();
    let mut minutes = ((value - degrees) * 60.0 * 1e5).round() / 1e5;
    if minutes >= 60.0 {
        degrees += 1.0;
        minutes -= 60.0;
    }
    (
        format!("{:0degree_digits$}{minutes:08.5}", degrees as u32),
        pole.to_string(),
    )
}

fn set_position(mapping: &mut FieldMapping, lat: Option<f64>, lon: Option<f64>) {
    if let (Some(lat), Some(lon)) = (lat, lon) {
        let (lat, lat_pole) = degree_minutes(lat, 2, ['N', 'S']);
        let (lon, lon_pole) = degree_minutes(lon, 3, ['E', 'W']);
        mapping.lat = Some(lat);
        mapping.lat_pole = Some(lat_pole);
        mapping.lon = Some(lon);
        mapping.lon_pole = Some(lon_pole);
    }
}

fn insert<T: ToString>(mapping: &mut FieldMapping, name: &str, value: Option<T>) {
    if let Some(value) = value {
        mapping.fields.insert(name.to_string(), value.to_string());
    }
}

fn from_gga(gga: GgaData) -> FieldMapping {
    let mut mapping = FieldMapping::new("GGA");
    mapping.timestamp = gga.fix_time.map(|time| time.format("%H%M%S%.3f").to_string());
    set_position(&mut mapping, gga.latitude, gga.longitude);
    mapping.alt = gga.altitude.map(|alt| alt.to_string());
    mapping.num_sat = gga.fix_satellites;
    insert(&mut mapping, "fix_type", gga.fix_type.map(|fix| format!("{fix:?}")));
    insert(&mut mapping, "hdop", gga.hdop);
    insert(&mut mapping, "geoid_separation", gga.geoid_separation);
    mapping
}

fn from_rmc(rmc: RmcData) -> FieldMapping {
    let mut mapping = FieldMapping::new("RMC");
    mapping.timestamp = rmc.fix_time.map(|time| time.format("%H%M%S%.3f").to_string());
    mapping.date = rmc.fix_date.map(|date| date.format("%d%m%y").to_string());
    set_position(&mut mapping, rmc.lat, rmc.lon);
    insert(&mut mapping, "speed_over_ground", rmc.speed_over_ground);
    insert(&mut mapping, "true_course", rmc.true_course);
    mapping
}

fn from_gll(gll: GllData) -> FieldMapping {
    let mut mapping = FieldMapping::new("GLL");
    set_position(&mut mapping, gll.latitude, gll.longitude);
    mapping
}

fn from_gsa(gsa: GsaData) -> FieldMapping {
    let mut mapping = FieldMapping::new("GSA");
    let prns: Vec<String> = gsa.fix_sats_prn.iter().map(u32::to_string).collect();
    if !prns.is_empty() {
        mapping.fields.insert("fix_sats_prn".to_string(), prns.join(" "));
    }
    insert(&mut mapping, "pdop", gsa.pdop);
    insert(&mut mapping, "hdop", gsa.hdop);
    insert(&mut mapping, "vdop", gsa.vdop);
    mapping
}

fn from_gsv(gsv: GsvData) -> FieldMapping {
    let mut mapping = FieldMapping::new("GSV");
    insert(&mut mapping, "gnss_type", Some(format!("{:?}", gsv.gnss_type)));
    insert(&mut mapping, "num_msgs", Some(gsv.number_of_sentences));
    insert(&mut mapping, "msg_num", Some(gsv.sentence_num));
    for (index, satellite) in gsv.sats_info.iter().enumerate() {
        let Some(satellite) = satellite else {
            continue;
        };
        let prefix = format!("sat{}", index + 1);
        insert(&mut mapping, &format!("{prefix}_prn"), Some(satellite.prn()));
        insert(&mut mapping, &format!("{prefix}_elevation"), satellite.elevation());
        insert(&mut mapping, &format!("{prefix}_azimuth"), satellite.azimuth());
        insert(&mut mapping, &format!("{prefix}_snr"), satellite.snr());
    }
    mapping
}

fn from_vtg(vtg: VtgData) -> FieldMapping {
    let mut mapping = FieldMapping::new("VTG");
    insert(&mut mapping, "true_course", vtg.true_course);
    insert(&mut mapping, "speed_over_ground", vtg.speed_over_ground);
    mapping
}

/// Keeps the values of kinds without a typed parser as `field1`, `field2`, ...
///
/// The `*hh` checksum is optional here but verified when present.
fn positional(kind: &str, sentence: &str) -> Option<FieldMapping> {
    let body = sentence.strip_prefix('$')?;
    let body = match body.split_once('*') {
        Some((body, expected)) => {
            let expected = u8::from_str_radix(expected.trim(), 16).ok()?;
            if body.bytes().fold(0, |acc, b| acc ^ b) != expected {
                debug!("Checksum mismatch for {sentence:?}");
                return None;
            }
            body
        }
        None => body,
    };
    let mut mapping = FieldMapping::new(kind);
    for (index, value) in body.split(',').skip(1).enumerate() {
        if !value.is_empty() {
            mapping
                .fields
                .insert(format!("field{}", index + 1), value.to_string());
        }
    }
    Some(mapping)
}
