// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use clap::Parser;
use common::position::CoordinateFormat;
use gps::{GpsConfig, GpsDevice, HardwareBinding, transport::open_serial};
use linux_embedded_hal::{SysfsPin, sysfs_gpio};
use module_core::{Event, EventBus, EventKind, Module};
use nmea_decoder::NmeaDecoder;
use std::path::PathBuf;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial port of the receiver.
    #[arg(short, long, default_value = "/dev/ttyS1")]
    port: String,
    /// GPIO number of the power pin.
    #[arg(short = 'g', long)]
    power_gpio: u32,
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Coordinate format: deg-min-sec, deg-dec, deg-min-dec or utm.
    #[arg(short, long)]
    format: Option<String>,
    /// UTM zone.
    #[arg(short, long)]
    zone: Option<u8>,
}

fn load_config(cli: &Cli) -> Result<GpsConfig, ()> {
    let mut config = match &cli.config {
        Some(path) => GpsConfig::load(path).map_err(|e| {
            error!("Failed to load config {}. Error: {e}", path.display());
        })?,
        None => GpsConfig::default(),
    };
    if let Some(format) = &cli.format {
        config.coordinate_format = format.parse::<CoordinateFormat>().map_err(|e| {
            error!("{e}");
        })?;
    }
    if let Some(zone) = cli.zone {
        config.utm_zone = zone;
    }
    config.validate().map_err(|e| {
        error!("Invalid configuration. Error: {e}");
    })?;
    Ok(config)
}

/// Exports the GPIO of the power pin and drives it low.
fn export_power_pin(number: u32) -> Result<SysfsPin, sysfs_gpio::Error> {
    let pin = SysfsPin::new(u64::from(number));
    pin.export()?;
    pin.set_direction(sysfs_gpio::Direction::Low)?;
    Ok(pin)
}

fn describe(event: &Event) -> Option<String> {
    match &event.kind {
        EventKind::ReadyEvent => Some("ready".to_string()),
        EventKind::ErrorEvent(reason) => Some(format!("error {reason}")),
        EventKind::ConnectedEvent(count) => Some(format!("connected {count}")),
        EventKind::DisconnectedEvent(count) => Some(format!("disconnected {count}")),
        EventKind::NumSatellitesEvent(count) => Some(format!("numSatellites {count}")),
        EventKind::CoordinatesEvent(coordinates) => serde_json::to_string(coordinates.as_ref())
            .ok()
            .map(|json| format!("coordinates {json}")),
        EventKind::AltitudeEvent(altitude) => serde_json::to_string(altitude.as_ref())
            .ok()
            .map(|json| format!("altitude {json}")),
        EventKind::DroppedEvent => Some("dropped".to_string()),
        EventKind::PowerOnEvent => Some("power-on".to_string()),
        EventKind::PowerOffEvent => Some("power-off".to_string()),
        EventKind::QuitEvent | EventKind::SentenceEvent(_) => None,
    }
}

async fn print_events(mut rx: Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = describe(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = load_config(&cli)?;
    let transport = open_serial(&cli.port, config.native_baud_rate).map_err(|e| {
        error!("Failed to open {}. Error: {e}", cli.port);
    })?;
    let pin = export_power_pin(cli.power_gpio).map_err(|e| {
        error!("Failed to export GPIO {}. Error: {e}", cli.power_gpio);
    })?;

    let eb = EventBus::default();
    let mut device = GpsDevice::new(
        &eb,
        HardwareBinding::streaming(transport, pin, NmeaDecoder::new()),
        &config,
    )
    .map_err(|e| {
        error!("Failed to create GPS device. Error: {e}");
    })?;

    let quit_bus = eb.clone();
    ctrlc::set_handler(move || {
        quit_bus.publish(&Event {
            kind: EventKind::QuitEvent,
        })
    })
    .map_err(|e| {
        error!("Failed to install Ctrl-C handler. Error: {e}");
    })?;

    let printer = tokio::spawn(print_events(eb.subscribe()));
    info!("Starting GPS on {}...", cli.port);
    let result = device.run().await;
    printer.abort();
    result
}
