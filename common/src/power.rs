// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::{Deserialize, Serialize};
use std::fmt;

/// The power state of the receiver as tracked by the driver.
///
/// The receiver toggles its power on a pulse, so this is the state the driver
/// believes the receiver to be in, not a level read back from the hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    #[default]
    Off,
    On,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Off => f.write_str("off"),
            PowerState::On => f.write_str("on"),
        }
    }
}
