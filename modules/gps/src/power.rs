// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{
    error::{GpsError, Result},
    transport::Transport,
};
use common::power::PowerState;
use embedded_hal::digital::OutputPin;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    time::{sleep, timeout},
};
use tracing::{debug, info, warn};

/// Switches the receiver from its binary protocol to NMEA sentences at 9600 baud.
pub const NMEA_9600_COMMAND: [u8; 32] = [
    0xA0, 0xA2, 0x00, 0x18, 0x81, 0x02, 0x01, 0x01, 0x00, 0x01, 0x01, 0x01, 0x05, 0x01, 0x01,
    0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x25, 0x80, 0x01, 0x3A,
    0xB0, 0xB3,
];

/// The digital output that toggles the power of the receiver.
pub trait PowerPin: Send {
    fn set_output_mode(&mut self) -> Result<()>;
    fn set_high(&mut self) -> Result<()>;
    fn set_low(&mut self) -> Result<()>;
}

/// An [`OutputPin`] is in output mode by its type.
impl<P> PowerPin for P
where
    P: OutputPin + Send,
{
    fn set_output_mode(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<()> {
        OutputPin::set_high(self).map_err(|e| GpsError::PowerPin(format!("{e:?}")))
    }

    fn set_low(&mut self) -> Result<()> {
        OutputPin::set_low(self).map_err(|e| GpsError::PowerPin(format!("{e:?}")))
    }
}

/// Timings and baud rates of the bring-up handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerTiming {
    /// How long to wait for data before and after the power pulse.
    pub probe_timeout: Duration,
    /// How long the pin is held high.
    pub pulse_hold: Duration,
    /// How long the receiver needs after a pulse.
    pub settle: Duration,
    pub native_baud_rate: u32,
    pub nmea_baud_rate: u32,
}

impl Default for PowerTiming {
    fn default() -> Self {
        PowerTiming {
            probe_timeout: Duration::from_millis(1000),
            pulse_hold: Duration::from_millis(250),
            settle: Duration::from_millis(500),
            native_baud_rate: 115200,
            nmea_baud_rate: 9600,
        }
    }
}

/// Progress of the bring-up handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BringUpState {
    #[default]
    Unknown,
    Probing,
    AlreadyOn,
    PowerCycling,
    On,
    Failed,
}

/// How the receiver was brought up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BringUp {
    /// The receiver was already sending data, no pulse was needed.
    AlreadyOn,
    /// The receiver started sending after a power pulse.
    PowerCycled,
}

/// Owns the power pin and the tracked [`PowerState`] of the receiver.
///
/// The receiver toggles its power on every pulse of the pin. The real state is
/// unknown, therefore the sequencer only pulses if the tracked state differs from
/// the requested one.
pub struct PowerSequencer {
    pin: Box<dyn PowerPin>,
    state: PowerState,
    bring_up_state: BringUpState,
    timing: PowerTiming,
}

impl PowerSequencer {
    pub fn new(mut pin: Box<dyn PowerPin>, timing: PowerTiming) -> Result<Self> {
        pin.set_output_mode()?;
        Ok(PowerSequencer {
            pin,
            state: PowerState::Off,
            bring_up_state: BringUpState::Unknown,
            timing,
        })
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn bring_up_state(&self) -> BringUpState {
        self.bring_up_state
    }

    pub fn timing(&self) -> &PowerTiming {
        &self.timing
    }

    /// Drives the pin high, holds it and drives it low again.
    pub async fn pulse(&mut self) -> Result<()> {
        debug!("Power pin high");
        self.pin.set_high()?;
        sleep(self.timing.pulse_hold).await;
        debug!("Power pin low");
        self.pin.set_low()
    }

    /// Brings the receiver into the desired power state.
    ///
    /// # Returns
    /// `true` if a pulse was necessary. After a pulse the call completes once
    /// the settle time elapsed, otherwise it completes immediately.
    pub async fn switch(&mut self, desired: PowerState) -> Result<bool> {
        if self.state == desired {
            debug!("Receiver already {desired}");
            return Ok(false);
        }
        self.pulse().await?;
        self.state = desired;
        info!("Receiver switched {desired}");
        sleep(self.timing.settle).await;
        Ok(true)
    }

    /// Establishes the communication with the receiver.
    ///
    /// Listens on the native baud rate for data. If the receiver stays silent, it is
    /// pulsed and given a second chance. Once data arrived, the receiver is switched
    /// to NMEA sentences and the transport to the NMEA baud rate.
    pub async fn bring_up<T: Transport>(&mut self, transport: &mut T) -> Result<BringUp> {
        transport.configure(self.timing.native_baud_rate)?;
        self.enter(BringUpState::Probing);
        if wait_for_data(transport, self.timing.probe_timeout).await? {
            self.enter(BringUpState::AlreadyOn);
            self.state = PowerState::On;
            self.switch_to_nmea(transport).await?;
            self.enter(BringUpState::On);
            return Ok(BringUp::AlreadyOn);
        }

        self.enter(BringUpState::PowerCycling);
        self.pulse().await?;
        sleep(self.timing.settle).await;
        if wait_for_data(transport, self.timing.probe_timeout).await? {
            self.state = PowerState::On;
            self.switch_to_nmea(transport).await?;
            self.enter(BringUpState::On);
            return Ok(BringUp::PowerCycled);
        }

        self.state = PowerState::Off;
        self.enter(BringUpState::Failed);
        warn!("Receiver didn't send data after power pulse");
        Err(GpsError::NoModuleFound)
    }

    async fn switch_to_nmea<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        debug!("Send NMEA switch command");
        transport.write_all(&NMEA_9600_COMMAND).await?;
        transport.flush().await?;
        transport.configure(self.timing.nmea_baud_rate)
    }

    fn enter(&mut self, state: BringUpState) {
        debug!("Bring-up {:?} -> {state:?}", self.bring_up_state);
        self.bring_up_state = state;
    }
}

/// Waits until at least one byte arrives or the window elapses.
async fn wait_for_data<T: Transport>(transport: &mut T, window: Duration) -> Result<bool> {
    let mut buf = [0u8; 64];
    match timeout(window, transport.read(&mut buf)).await {
        Ok(Ok(0)) => Ok(false),
        Ok(Ok(_)) => Ok(true),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Ok(false),
    }
}
