// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{
    error::{GpsError, Result},
    power::PowerTiming,
};
use algorithm::parse_int_prefix;
use common::position::{CoordinateFormat, CoordinateSettings, DEFAULT_UTM_ZONE};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Interval between two fix register reads of the polling acquisition.
///
/// Values below [`PollTime::MIN`] or above [`PollTime::MAX`] snap to the
/// nearest bound, input that is not a number falls back to [`PollTime::MIN`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollTime(u64);

impl PollTime {
    pub const MIN: PollTime = PollTime(2000);
    pub const MAX: PollTime = PollTime(60000);

    pub fn from_millis(ms: i64) -> Self {
        PollTime(ms.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u64)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Default for PollTime {
    fn default() -> Self {
        PollTime::MIN
    }
}

impl From<i64> for PollTime {
    fn from(ms: i64) -> Self {
        PollTime::from_millis(ms)
    }
}

impl From<u64> for PollTime {
    fn from(ms: u64) -> Self {
        PollTime::from_millis(i64::try_from(ms).unwrap_or(i64::MAX))
    }
}

impl From<i32> for PollTime {
    fn from(ms: i32) -> Self {
        PollTime::from_millis(ms.into())
    }
}

impl From<f64> for PollTime {
    fn from(ms: f64) -> Self {
        if ms.is_nan() {
            return PollTime::default();
        }
        // Saturating float to int cast.
        PollTime::from_millis(ms.trunc() as i64)
    }
}

impl From<&str> for PollTime {
    fn from(ms: &str) -> Self {
        parse_int_prefix(ms)
            .map(PollTime::from_millis)
            .unwrap_or_default()
    }
}

impl From<Duration> for PollTime {
    fn from(interval: Duration) -> Self {
        PollTime::from_millis(i64::try_from(interval.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Configuration of a [`GpsDevice`](crate::device::GpsDevice).
///
/// Every value is optional in the JSON representation, missing values take
/// their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub coordinate_format: CoordinateFormat,
    pub utm_zone: u8,
    /// Default timeout of the fix queries.
    pub timeout_ms: u64,
    pub poll_time_ms: u64,
    /// Baud rate the receiver talks after power up.
    pub native_baud_rate: u32,
    /// Baud rate after switching the receiver to NMEA sentences.
    pub nmea_baud_rate: u32,
    /// How long bring-up waits for data before and after a power pulse.
    pub probe_timeout_ms: u64,
    /// How long the power pin is held high for one pulse.
    pub pulse_hold_ms: u64,
    /// How long a power request waits after a pulse.
    pub power_settle_ms: u64,
}

impl Default for GpsConfig {
    fn default() -> Self {
        GpsConfig {
            coordinate_format: CoordinateFormat::default(),
            utm_zone: DEFAULT_UTM_ZONE,
            timeout_ms: 10000,
            poll_time_ms: PollTime::default().as_millis(),
            native_baud_rate: 115200,
            nmea_baud_rate: 9600,
            probe_timeout_ms: 1000,
            pulse_hold_ms: 250,
            power_settle_ms: 500,
        }
    }
}

impl GpsConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GpsError::InvalidConfiguration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: GpsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_zone(self.utm_zone)?;
        if self.native_baud_rate == 0 || self.nmea_baud_rate == 0 {
            return Err(GpsError::InvalidConfiguration(
                "baud rates must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn coordinate_settings(&self) -> CoordinateSettings {
        CoordinateSettings {
            format: self.coordinate_format,
            zone: self.utm_zone,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured poll time after clamping.
    pub fn poll_time(&self) -> PollTime {
        PollTime::from(self.poll_time_ms)
    }

    pub fn power_timing(&self) -> PowerTiming {
        PowerTiming {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            pulse_hold: Duration::from_millis(self.pulse_hold_ms),
            settle: Duration::from_millis(self.power_settle_ms),
            native_baud_rate: self.native_baud_rate,
            nmea_baud_rate: self.nmea_baud_rate,
        }
    }
}

/// UTM zones are numbered 1 to 60.
pub fn validate_zone(zone: u8) -> Result<()> {
    if (1..=60).contains(&zone) {
        Ok(())
    } else {
        Err(GpsError::InvalidConfiguration(format!(
            "UTM zone {zone} is out of range 1..=60"
        )))
    }
}
