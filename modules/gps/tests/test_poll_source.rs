use common::position::CoordinateSettings;
use gps::{
    GpsConfig, GpsDevice, HardwareBinding,
    fix_engine::FixEngine,
    poll_source::{FixPoller, REGISTER_FIX_KIND, RegisterFix},
    test_helper::{MockPin, MockRegisters, mock_transport},
};
use module_core::{EventBus, EventKind, EventKindType, Topic, payload_ref};
use std::time::Duration;
use tokio::time::{Instant, timeout};

fn fix(num_satellites: u32) -> RegisterFix {
    RegisterFix {
        timestamp: Some("083015".to_string()),
        lat: "4747.9760".to_string(),
        lat_pole: "N".to_string(),
        lon: "12205.0757".to_string(),
        lon_pole: "W".to_string(),
        alt: Some("12".to_string()),
        num_satellites,
    }
}

#[tokio::test]
#[test_log::test]
async fn lost_fix_is_reported_as_dropped() {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let registers = MockRegisters::default();
    registers.push(Some(fix(5)));
    registers.push(None);
    registers.push(None);
    let mut engine = FixEngine::new(bus.clone(), CoordinateSettings::default());
    let mut poller = FixPoller::new(Box::new(registers));

    for _ in 0..3 {
        poller.poll_once(&mut engine).unwrap();
    }

    let mut types = Vec::new();
    while let Ok(event) = rx.try_recv() {
        types.push(event.event_type());
    }
    assert_eq!(
        types,
        vec![
            EventKindType::SentenceEvent,
            EventKindType::ConnectedEvent,
            EventKindType::NumSatellitesEvent,
            EventKindType::CoordinatesEvent,
            EventKindType::AltitudeEvent,
            EventKindType::DroppedEvent,
            EventKindType::DisconnectedEvent,
            EventKindType::NumSatellitesEvent,
        ]
    );
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn polling_device_reads_in_poll_time() {
    let bus = EventBus::default();
    let (transport, mut receiver) = mock_transport();
    let registers = MockRegisters::default();
    registers.push(None);
    registers.push(Some(fix(7)));
    receiver.send(b"\xa0\xa2").await.unwrap();
    let mut device = GpsDevice::new(
        &bus,
        HardwareBinding::polling(transport, MockPin::default(), registers),
        &GpsConfig::default(),
    )
    .unwrap();
    let handle = device.handle();
    handle.set_poll_time(5000_i64);
    let fixes = bus.listen_once(Topic::sentence(REGISTER_FIX_KIND));

    device.connect().await.unwrap();
    let start = Instant::now();
    let event = timeout(Duration::from_secs(20), fixes.recv())
        .await
        .unwrap()
        .unwrap();

    // The first read has no fix, the second one does.
    assert!(start.elapsed() >= Duration::from_millis(10000));
    let mapping = payload_ref!(event.kind, EventKind::SentenceEvent).unwrap();
    assert_eq!(mapping.num_sat, Some(7));
    assert_eq!(handle.snapshot().num_satellites, Some(7));
}
