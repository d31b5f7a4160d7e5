use common::power::PowerState;
use gps::{
    GpsError,
    power::{BringUp, BringUpState, NMEA_9600_COMMAND, PowerSequencer, PowerTiming},
    test_helper::{MockPin, mock_transport},
};
use std::time::Duration;
use tokio::time::{Instant, sleep};

fn sequencer(pin: &MockPin) -> PowerSequencer {
    PowerSequencer::new(Box::new(pin.clone()), PowerTiming::default()).unwrap()
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn bring_up_without_pulse_when_receiver_sends() {
    let pin = MockPin::default();
    let mut sequencer = sequencer(&pin);
    let (mut transport, mut receiver) = mock_transport();
    receiver.send(b"\xa0\xa2\x00\x01").await.unwrap();

    let start = Instant::now();
    let bring_up = sequencer.bring_up(&mut transport).await.unwrap();

    assert_eq!(bring_up, BringUp::AlreadyOn);
    assert!(start.elapsed() < Duration::from_millis(1000));
    assert_eq!(pin.pulses(), 0);
    assert_eq!(sequencer.state(), PowerState::On);
    assert_eq!(sequencer.bring_up_state(), BringUpState::On);
    assert_eq!(receiver.read_exact(32).await.unwrap(), NMEA_9600_COMMAND);
    assert_eq!(receiver.baud_rates(), vec![115200, 9600]);
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn bring_up_pulses_silent_receiver() {
    let pin = MockPin::default();
    let mut sequencer = sequencer(&pin);
    let (mut transport, mut receiver) = mock_transport();
    let responder = tokio::spawn(async move {
        sleep(Duration::from_millis(1500)).await;
        receiver.send(b"\xa0\xa2").await.unwrap();
        receiver
    });

    let start = Instant::now();
    let bring_up = sequencer.bring_up(&mut transport).await.unwrap();

    assert_eq!(bring_up, BringUp::PowerCycled);
    // Probe window, pulse and settle time.
    assert!(start.elapsed() >= Duration::from_millis(1750));
    assert_eq!(pin.levels(), vec![true, false]);
    assert_eq!(sequencer.state(), PowerState::On);
    let mut receiver = responder.await.unwrap();
    assert_eq!(receiver.read_exact(32).await.unwrap(), NMEA_9600_COMMAND);
    assert_eq!(receiver.baud_rates(), vec![115200, 9600]);
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn bring_up_fails_without_receiver() {
    let pin = MockPin::default();
    let mut sequencer = sequencer(&pin);
    let (mut transport, receiver) = mock_transport();

    let result = sequencer.bring_up(&mut transport).await;

    assert!(matches!(result, Err(GpsError::NoModuleFound)));
    assert_eq!(pin.pulses(), 1);
    assert_eq!(sequencer.state(), PowerState::Off);
    assert_eq!(sequencer.bring_up_state(), BringUpState::Failed);
    assert_eq!(receiver.baud_rates(), vec![115200]);
}

#[tokio::test(start_paused = true)]
#[test_log::test]
async fn switch_only_pulses_on_state_change() {
    let pin = MockPin::default();
    let mut sequencer = sequencer(&pin);

    let start = Instant::now();
    assert!(!sequencer.switch(PowerState::Off).await.unwrap());
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(pin.pulses(), 0);

    assert!(sequencer.switch(PowerState::On).await.unwrap());
    assert!(start.elapsed() >= Duration::from_millis(750));
    assert!(start.elapsed() < Duration::from_millis(800));
    assert_eq!(pin.levels(), vec![true, false]);
    assert_eq!(sequencer.state(), PowerState::On);

    let start = Instant::now();
    assert!(!sequencer.switch(PowerState::On).await.unwrap());
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(pin.pulses(), 1);
}

#[test]
fn nmea_command_is_unchanged() {
    assert_eq!(NMEA_9600_COMMAND.len(), 32);
    assert_eq!(&NMEA_9600_COMMAND[..4], &[0xA0, 0xA2, 0x00, 0x18]);
    assert_eq!(&NMEA_9600_COMMAND[26..], &[0x25, 0x80, 0x01, 0x3A, 0xB0, 0xB3]);
}
