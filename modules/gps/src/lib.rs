// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Driver for UART attached GPS receivers with a pulse controlled power pin.
//!
//! Bytes from the transport are framed into packets, decoded into sentences and
//! turned into fix events on the [`module_core::EventBus`]. The receiver is only
//! read after the bring-up handshake of the [`power::PowerSequencer`] succeeded.

pub mod config;
pub mod device;
pub mod error;
pub mod fix_engine;
pub mod packetizer;
pub mod poll_source;
pub mod power;
pub mod test_helper;
pub mod transport;

pub use config::{GpsConfig, PollTime};
pub use device::{Acquisition, GpsDevice, GpsHandle, HardwareBinding};
pub use error::{GpsError, Result};
