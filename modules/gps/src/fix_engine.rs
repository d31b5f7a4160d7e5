// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use algorithm::{convert_coordinates, parse_int_prefix};
use common::{
    position::{Altitude, CoordinateSettings, Coordinates},
    sentence::FieldMapping,
};
use module_core::{AltitudePtr, CoordinatesPtr, Event, EventBus, EventKind};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// The latest value of every fix attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixSnapshot {
    /// `None` until a sentence reported a satellite count.
    pub num_satellites: Option<u32>,
    pub coordinates: Option<CoordinatesPtr>,
    pub altitude: Option<AltitudePtr>,
}

impl FixSnapshot {
    pub fn has_satellites(&self) -> bool {
        self.num_satellites.unwrap_or(0) > 0
    }
}

/// Derives the fix events from decoded sentences.
///
/// Per sentence the events are published in this order:
/// 1. `SentenceEvent` with the sentence itself.
/// 2. `ConnectedEvent` or `DisconnectedEvent` on a satellite count transition
///    from or to zero, followed by `NumSatellitesEvent`.
/// 3. `CoordinatesEvent` if the sentence has a position and satellites are in use.
/// 4. `AltitudeEvent` if the sentence has an altitude.
pub struct FixEngine {
    bus: EventBus,
    settings: CoordinateSettings,
    snapshot: FixSnapshot,
}

impl FixEngine {
    pub fn new(bus: EventBus, settings: CoordinateSettings) -> Self {
        FixEngine {
            bus,
            settings,
            snapshot: FixSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &FixSnapshot {
        &self.snapshot
    }

    pub fn coordinate_settings(&self) -> CoordinateSettings {
        self.settings
    }

    /// Applies to all coordinates converted after this call.
    pub fn set_coordinate_settings(&mut self, settings: CoordinateSettings) {
        debug!("Coordinate format {} zone {}", settings.format, settings.zone);
        self.settings = settings;
    }

    pub fn on_field_mapping(&mut self, mapping: FieldMapping) {
        trace!("Sentence {}{}", mapping.talker_id, mapping.kind);
        let mapping = Arc::new(mapping);
        self.publish(EventKind::SentenceEvent(mapping.clone()));

        if let Some(count) = mapping.num_sat {
            self.update_satellites(count);
        }

        if self.snapshot.has_satellites()
            && let Some(coordinates) = self.coordinates(&mapping)
        {
            let coordinates = Arc::new(coordinates);
            self.snapshot.coordinates = Some(coordinates.clone());
            self.publish(EventKind::CoordinatesEvent(coordinates));
        }

        if let Some(alt) = mapping.alt.as_deref() {
            match parse_int_prefix(alt) {
                Some(alt) => {
                    let altitude = Arc::new(Altitude {
                        alt,
                        time: mapping.utc_time(),
                        date: mapping.utc_date(),
                    });
                    self.snapshot.altitude = Some(altitude.clone());
                    self.publish(EventKind::AltitudeEvent(altitude));
                }
                None => debug!("Ignore altitude {alt}"),
            }
        }
    }

    /// A previously reported fix is gone.
    pub fn on_fix_dropped(&mut self) {
        info!("Fix dropped");
        self.publish(EventKind::DroppedEvent);
        self.update_satellites(0);
    }

    fn update_satellites(&mut self, count: u32) {
        let previous = self.snapshot.num_satellites.unwrap_or(0);
        self.snapshot.num_satellites = Some(count);
        if previous == 0 && count > 0 {
            info!("Connected with {count} satellites");
            self.publish(EventKind::ConnectedEvent(count));
        } else if previous > 0 && count == 0 {
            info!("Disconnected");
            self.publish(EventKind::DisconnectedEvent(count));
        }
        self.publish(EventKind::NumSatellitesEvent(count));
    }

    fn coordinates(&self, mapping: &FieldMapping) -> Option<Coordinates> {
        let (Some(lat), Some(lat_pole), Some(lon), Some(lon_pole)) = (
            mapping.lat.as_deref(),
            mapping.lat_pole.as_deref(),
            mapping.lon.as_deref(),
            mapping.lon_pole.as_deref(),
        ) else {
            return None;
        };
        let Some((lat, lon)) = convert_coordinates(lat, lat_pole, lon, lon_pole, &self.settings)
        else {
            debug!("Ignore position {lat} {lat_pole} {lon} {lon_pole}");
            return None;
        };
        Some(Coordinates {
            lat,
            lon,
            time: mapping.utc_time(),
            date: mapping.utc_date(),
        })
    }

    fn publish(&self, kind: EventKind) {
        self.bus.publish(&Event { kind });
    }
}
