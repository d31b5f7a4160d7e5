// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use chrono::{NaiveDate, NaiveTime};
use common::sentence::FieldMapping;

fn get_rmc_mapping() -> FieldMapping {
    let mut mapping = FieldMapping::new("RMC");
    mapping.talker_id = "GP".to_string();
    mapping.timestamp = Some("191742.339".to_string());
    mapping.date = Some("251115".to_string());
    mapping.lat = Some("4747.9760".to_string());
    mapping.lat_pole = Some("N".to_string());
    mapping.lon = Some("12205.0757".to_string());
    mapping.lon_pole = Some("W".to_string());
    mapping
        .fields
        .insert("status".to_string(), "A".to_string());
    mapping
}

#[test]
pub fn parse_time_and_date_of_sentence() {
    let mapping = get_rmc_mapping();
    assert_eq!(
        mapping.utc_time(),
        Some(NaiveTime::from_hms_milli_opt(19, 17, 42, 339).unwrap())
    );
    assert_eq!(
        mapping.utc_date(),
        Some(NaiveDate::from_ymd_opt(2015, 11, 25).unwrap())
    );
}

#[test]
pub fn parse_time_without_fraction() {
    let mut mapping = FieldMapping::new("GGA");
    mapping.timestamp = Some("123519".to_string());
    assert_eq!(
        mapping.utc_time(),
        Some(NaiveTime::from_hms_opt(12, 35, 19).unwrap())
    );
}

#[test]
pub fn absent_attributes_are_not_zero() {
    let mapping = FieldMapping::new("GSA");
    assert_eq!(mapping.num_sat, None);
    assert_eq!(mapping.utc_time(), None);
    assert_eq!(mapping.utc_date(), None);
    assert!(!mapping.has_position());
}

#[test]
pub fn position_requires_both_poles() {
    let mut mapping = get_rmc_mapping();
    assert!(mapping.has_position());
    mapping.lon_pole = None;
    assert!(!mapping.has_position());
    assert_eq!(mapping.field("status"), Some("A"));
}
