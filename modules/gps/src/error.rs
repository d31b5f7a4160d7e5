// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use module_core::EventKindType;
use thiserror::Error;

/// Errors of the GPS driver.
#[derive(Debug, Error)]
pub enum GpsError {
    /// The receiver sent no data, neither before nor after a power pulse.
    #[error("no GPS module found")]
    NoModuleFound,

    /// A query did not receive its event in time.
    #[error("timed out waiting for {0:?}")]
    Timeout(EventKindType),

    /// A query that needs a fix was made while no satellite is in use.
    #[error("no satellites available")]
    NoSatellitesAvailable,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("power pin error: {0}")]
    PowerPin(String),

    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The event bus dropped a pending query.
    #[error("event bus closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, GpsError>;
