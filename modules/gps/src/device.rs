// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{
    config::{GpsConfig, PollTime, validate_zone},
    error::{GpsError, Result},
    fix_engine::{FixEngine, FixSnapshot},
    packetizer::packetize,
    poll_source::{FixPoller, FixRegisters},
    power::{PowerPin, PowerSequencer},
    transport::Transport,
};
use common::{
    position::{CoordinateFormat, CoordinateSettings, DEFAULT_UTM_ZONE},
    power::PowerState,
};
use futures::StreamExt;
use module_core::{
    AltitudePtr, CoordinatesPtr, Event, EventBus, EventKind, EventKindType, Listener, Module,
    ModuleCtx, OneShotListener, Topic, payload_ref,
};
use nmea_decoder::SentenceDecoder;
use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::broadcast::error::RecvError,
    task::{JoinError, JoinHandle},
    time::{Instant, timeout_at},
};
use tracing::{debug, error, info, trace};

/// Where the fixes come from once the receiver is up.
pub enum Acquisition {
    /// Sentences streamed over the transport, decoded by the decoder.
    Stream(Box<dyn SentenceDecoder>),
    /// Fix registers read in the configured poll time.
    Poll(Box<dyn FixRegisters>),
}

/// The hardware a [`GpsDevice`] drives.
pub struct HardwareBinding<T: Transport> {
    pub transport: T,
    pub power_pin: Box<dyn PowerPin>,
    pub acquisition: Acquisition,
}

impl<T: Transport> HardwareBinding<T> {
    pub fn streaming(
        transport: T,
        power_pin: impl PowerPin + 'static,
        decoder: impl SentenceDecoder + 'static,
    ) -> Self {
        HardwareBinding {
            transport,
            power_pin: Box::new(power_pin),
            acquisition: Acquisition::Stream(Box::new(decoder)),
        }
    }

    pub fn polling(
        transport: T,
        power_pin: impl PowerPin + 'static,
        registers: impl FixRegisters + 'static,
    ) -> Self {
        HardwareBinding {
            transport,
            power_pin: Box::new(power_pin),
            acquisition: Acquisition::Poll(Box::new(registers)),
        }
    }
}

/// State shared between the device, its handles and the acquisition task.
struct Shared {
    bus: EventBus,
    engine: Arc<Mutex<FixEngine>>,
    power: tokio::sync::Mutex<PowerSequencer>,
    poll_time: Arc<AtomicU64>,
    timeout: Duration,
}

impl Shared {
    fn engine(&self) -> MutexGuard<'_, FixEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, kind: EventKind) {
        self.bus.publish(&Event { kind });
    }
}

/// A GPS receiver attached to a UART and a power pin.
///
/// Connecting brings the receiver up and starts the acquisition. Afterwards the
/// device publishes the fix events on the bus until it receives a `QuitEvent`.
/// Queries and configuration go through a [`GpsHandle`].
pub struct GpsDevice<T: Transport> {
    ctx: ModuleCtx,
    shared: Arc<Shared>,
    /// Transport and acquisition until the device is connected.
    pending: Option<(T, Acquisition)>,
    /// The transport is kept open while fixes are polled.
    idle_transport: Option<T>,
    acquisition_task: Option<JoinHandle<()>>,
}

impl<T: Transport> GpsDevice<T> {
    pub fn new(bus: &EventBus, binding: HardwareBinding<T>, config: &GpsConfig) -> Result<Self> {
        config.validate()?;
        let power = PowerSequencer::new(binding.power_pin, config.power_timing())?;
        let engine = FixEngine::new(bus.clone(), config.coordinate_settings());
        Ok(GpsDevice {
            ctx: bus.context(),
            shared: Arc::new(Shared {
                bus: bus.clone(),
                engine: Arc::new(Mutex::new(engine)),
                power: tokio::sync::Mutex::new(power),
                poll_time: Arc::new(AtomicU64::new(config.poll_time().as_millis())),
                timeout: config.timeout(),
            }),
            pending: Some((binding.transport, binding.acquisition)),
            idle_transport: None,
            acquisition_task: None,
        })
    }

    /// Creates the device and connects it.
    pub async fn open(
        bus: &EventBus,
        binding: HardwareBinding<T>,
        config: &GpsConfig,
    ) -> Result<Self> {
        let mut device = Self::new(bus, binding, config)?;
        device.connect().await?;
        Ok(device)
    }

    pub fn handle(&self) -> GpsHandle {
        GpsHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.pending.is_none()
    }

    /// Brings the receiver up and starts the acquisition.
    ///
    /// Publishes `ReadyEvent` once fixes flow, or `ErrorEvent` if bring-up fails.
    pub async fn connect(&mut self) -> Result<()> {
        let Some((mut transport, acquisition)) = self.pending.take() else {
            return Err(GpsError::InvalidConfiguration(
                "device is already connected".to_string(),
            ));
        };
        let bring_up = self.shared.power.lock().await.bring_up(&mut transport).await;
        match bring_up {
            Ok(bring_up) => info!("Receiver up: {bring_up:?}"),
            Err(e) => {
                error!("Failed to bring up the receiver. Error: {e}");
                self.shared.publish(EventKind::ErrorEvent(e.to_string()));
                return Err(e);
            }
        }

        let shared = self.shared.clone();
        let task = match acquisition {
            Acquisition::Stream(decoder) => {
                tokio::spawn(async move { read_sentences(transport, decoder, shared).await })
            }
            Acquisition::Poll(registers) => {
                self.idle_transport = Some(transport);
                let poller = FixPoller::new(registers);
                tokio::spawn(poller.run(shared.engine.clone(), shared.poll_time.clone()))
            }
        };
        self.acquisition_task = Some(task);
        self.shared.publish(EventKind::ReadyEvent);
        Ok(())
    }
}

async fn read_sentences<T: Transport>(
    transport: T,
    decoder: Box<dyn SentenceDecoder>,
    shared: Arc<Shared>,
) {
    let mut packets = packetize(transport);
    while let Some(packet) = packets.next().await {
        let packet = match packet {
            Ok(packet) => packet,
            Err(e) => {
                error!("Failed to read from the receiver. Error: {e}");
                shared.publish(EventKind::ErrorEvent(e.to_string()));
                return;
            }
        };
        trace!("Packet {:?}", String::from_utf8_lossy(&packet));
        if !packet.is_sentence() {
            debug!("Drop {} bytes without sentence", packet.len());
            continue;
        }
        let Some(mapping) = decoder.decode(&packet) else {
            debug!("Drop undecodable packet");
            continue;
        };
        shared.engine().on_field_mapping(mapping);
    }
    error!("Receiver closed the transport");
    shared.publish(EventKind::ErrorEvent(
        "receiver closed the transport".to_string(),
    ));
}

/// Resolves when the acquisition task ends, never if there is none.
async fn acquisition_finished(
    task: &mut Option<JoinHandle<()>>,
) -> std::result::Result<(), JoinError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

#[async_trait::async_trait]
impl<T: Transport> Module for GpsDevice<T> {
    async fn run(&mut self) -> std::result::Result<(), ()> {
        if !self.is_connected() && self.connect().await.is_err() {
            return Err(());
        }
        let mut run = true;
        while run {
            tokio::select! {
                event = self.ctx.receiver.recv() => {
                    match event {
                        Ok(event) => {
                            if let EventKind::QuitEvent = event.kind {
                                run = false;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => debug!("Skipped {skipped} events"),
                        Err(RecvError::Closed) => run = false,
                    }
                }
                finished = acquisition_finished(&mut self.acquisition_task) => {
                    self.acquisition_task = None;
                    if let Err(e) = finished {
                        error!("Acquisition stopped. Error: {e}");
                        self.shared
                            .publish(EventKind::ErrorEvent(format!("acquisition stopped: {e}")));
                    }
                }
            }
        }
        if let Some(task) = self.acquisition_task.take() {
            task.abort();
        }
        self.idle_transport = None;
        Ok(())
    }
}

/// Queries and configuration of a [`GpsDevice`].
///
/// Handles are cheap to clone and stay usable while the device runs.
#[derive(Clone)]
pub struct GpsHandle {
    shared: Arc<Shared>,
}

impl GpsHandle {
    /// Waits for the next position report.
    ///
    /// `timeout` defaults to the configured query timeout and covers the whole call.
    ///
    /// # Errors
    /// - [`GpsError::NoSatellitesAvailable`] immediately if no satellite is in use.
    /// - [`GpsError::Timeout`] if no report arrived in time.
    pub async fn get_coordinates(&self, timeout: Option<Duration>) -> Result<CoordinatesPtr> {
        let event = self
            .satellite_dependent(EventKindType::CoordinatesEvent, timeout)
            .await?;
        payload_ref!(event.kind, EventKind::CoordinatesEvent)
            .cloned()
            .ok_or(GpsError::Closed)
    }

    /// Waits for the next altitude report, see [`GpsHandle::get_coordinates`].
    pub async fn get_altitude(&self, timeout: Option<Duration>) -> Result<AltitudePtr> {
        let event = self
            .satellite_dependent(EventKindType::AltitudeEvent, timeout)
            .await?;
        payload_ref!(event.kind, EventKind::AltitudeEvent)
            .cloned()
            .ok_or(GpsError::Closed)
    }

    /// Waits for the next reported satellite count.
    pub async fn get_num_satellites(&self, timeout: Option<Duration>) -> Result<u32> {
        self.num_satellites_until(self.deadline(timeout)).await
    }

    /// Selects the format of all following coordinates.
    ///
    /// The zone is only used for UTM and defaults to zone 10.
    pub fn set_coordinate_format(&self, format: CoordinateFormat, zone: Option<u8>) -> Result<()> {
        let zone = zone.unwrap_or(DEFAULT_UTM_ZONE);
        validate_zone(zone)?;
        self.shared
            .engine()
            .set_coordinate_settings(CoordinateSettings { format, zone });
        Ok(())
    }

    /// Selects the format by its name, e.g. `deg-min-sec`.
    ///
    /// An unknown name is rejected and the previous format stays active.
    pub fn set_coordinate_format_str(&self, format: &str, zone: Option<u8>) -> Result<()> {
        let format = format
            .parse::<CoordinateFormat>()
            .map_err(GpsError::InvalidConfiguration)?;
        self.set_coordinate_format(format, zone)
    }

    pub fn coordinate_settings(&self) -> CoordinateSettings {
        self.shared.engine().coordinate_settings()
    }

    /// Sets the interval of the fix polling.
    ///
    /// Out of range values are clamped, see [`PollTime`].
    ///
    /// # Returns
    /// The poll time that is actually used.
    pub fn set_poll_time(&self, poll_time: impl Into<PollTime>) -> PollTime {
        let poll_time = poll_time.into();
        debug!("Poll time {} ms", poll_time.as_millis());
        self.shared
            .poll_time
            .store(poll_time.as_millis(), Ordering::Relaxed);
        poll_time
    }

    pub fn poll_time(&self) -> PollTime {
        PollTime::from(self.shared.poll_time.load(Ordering::Relaxed))
    }

    /// Switches the receiver on. Publishes `PowerOnEvent` when done.
    ///
    /// # Returns
    /// `true` if the power pin was pulsed, `false` if the receiver was already on.
    pub async fn power_on(&self) -> Result<bool> {
        self.power(PowerState::On).await
    }

    /// Switches the receiver off. Publishes `PowerOffEvent` when done.
    pub async fn power_off(&self) -> Result<bool> {
        self.power(PowerState::Off).await
    }

    pub async fn power_state(&self) -> PowerState {
        self.shared.power.lock().await.state()
    }

    pub fn snapshot(&self) -> FixSnapshot {
        self.shared.engine().snapshot().clone()
    }

    pub fn bus(&self) -> &EventBus {
        &self.shared.bus
    }

    pub fn listen(&self, topic: impl Into<Topic>) -> Listener {
        self.shared.bus.listen(topic)
    }

    pub fn listen_once(&self, topic: impl Into<Topic>) -> OneShotListener {
        self.shared.bus.listen_once(topic)
    }

    async fn power(&self, desired: PowerState) -> Result<bool> {
        let switched = self.shared.power.lock().await.switch(desired).await?;
        self.shared.publish(match desired {
            PowerState::On => EventKind::PowerOnEvent,
            PowerState::Off => EventKind::PowerOffEvent,
        });
        Ok(switched)
    }

    fn deadline(&self, timeout: Option<Duration>) -> Instant {
        Instant::now() + timeout.unwrap_or(self.shared.timeout)
    }

    async fn satellite_dependent(
        &self,
        kind: EventKindType,
        timeout: Option<Duration>,
    ) -> Result<Event> {
        let deadline = self.deadline(timeout);
        let listener = self.shared.bus.listen_once(kind);
        let cached = self.shared.engine().snapshot().num_satellites;
        let num_satellites = match cached {
            Some(count) => count,
            None => self.num_satellites_until(deadline).await?,
        };
        if num_satellites == 0 {
            debug!("No satellites for {kind:?}");
            return Err(GpsError::NoSatellitesAvailable);
        }
        wait_until(kind, listener, deadline).await
    }

    async fn num_satellites_until(&self, deadline: Instant) -> Result<u32> {
        let kind = EventKindType::NumSatellitesEvent;
        let event = wait_until(kind, self.shared.bus.listen_once(kind), deadline).await?;
        payload_ref!(event.kind, EventKind::NumSatellitesEvent)
            .copied()
            .ok_or(GpsError::Closed)
    }
}

/// Waits for the event of a one-shot listener.
///
/// The listener is dropped and with it deregistered on every outcome.
async fn wait_until(
    kind: EventKindType,
    listener: OneShotListener,
    deadline: Instant,
) -> Result<Event> {
    match timeout_at(deadline, listener.recv()).await {
        Ok(Some(event)) => Ok(event),
        Ok(None) => Err(GpsError::Closed),
        Err(_) => {
            debug!("Query for {kind:?} timed out");
            Err(GpsError::Timeout(kind))
        }
    }
}
