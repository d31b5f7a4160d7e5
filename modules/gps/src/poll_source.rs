// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{error::Result, fix_engine::FixEngine};
use common::sentence::FieldMapping;
use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Sentence type of the mappings created from register reads.
pub const REGISTER_FIX_KIND: &str = "FIX";

/// A fix read from the registers of receivers that don't stream sentences.
///
/// Values use the same encodings as the sentences (`ddmm.mmmm` for positions).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegisterFix {
    pub timestamp: Option<String>,
    pub lat: String,
    pub lat_pole: String,
    pub lon: String,
    pub lon_pole: String,
    pub alt: Option<String>,
    pub num_satellites: u32,
}

impl From<RegisterFix> for FieldMapping {
    fn from(fix: RegisterFix) -> Self {
        FieldMapping {
            timestamp: fix.timestamp,
            lat: Some(fix.lat),
            lat_pole: Some(fix.lat_pole),
            lon: Some(fix.lon),
            lon_pole: Some(fix.lon_pole),
            alt: fix.alt,
            num_sat: Some(fix.num_satellites),
            ..FieldMapping::new(REGISTER_FIX_KIND)
        }
    }
}

/// The fix registers of a receiver.
pub trait FixRegisters: Send {
    /// Reads the current fix.
    ///
    /// # Returns
    /// `None` while the receiver has no fix.
    fn read_fix(&mut self) -> Result<Option<RegisterFix>>;
}

/// Periodically reads [`FixRegisters`] and feeds the fixes into a [`FixEngine`].
pub struct FixPoller {
    registers: Box<dyn FixRegisters>,
    has_fix: bool,
}

impl FixPoller {
    pub fn new(registers: Box<dyn FixRegisters>) -> Self {
        FixPoller {
            registers,
            has_fix: false,
        }
    }

    /// Reads the registers once.
    ///
    /// Losing a previously read fix is reported as dropped fix.
    pub fn poll_once(&mut self, engine: &mut FixEngine) -> Result<()> {
        match self.registers.read_fix()? {
            Some(fix) => {
                self.has_fix = true;
                engine.on_field_mapping(fix.into());
            }
            None => {
                if self.has_fix {
                    engine.on_fix_dropped();
                }
                self.has_fix = false;
            }
        }
        Ok(())
    }

    /// Polls forever. The poll time in milliseconds is read before every wait,
    /// changes apply to the next period.
    pub async fn run(mut self, engine: Arc<Mutex<FixEngine>>, poll_time: Arc<AtomicU64>) {
        loop {
            let period = Duration::from_millis(poll_time.load(Ordering::Relaxed));
            sleep(period).await;
            debug!("Poll fix registers");
            let result = {
                let mut fix_engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
                self.poll_once(&mut fix_engine)
            };
            if let Err(e) = result {
                warn!("Failed to read fix registers. Error: {e}");
            }
        }
    }
}
