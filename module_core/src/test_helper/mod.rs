use crate::{Event, EventBus, EventKind, EventKindType, Listener};
use tokio::{
    sync::broadcast::error::RecvError,
    time::{Instant, timeout, timeout_at},
};

/// Sends a quit signal to a running module and waits for it to stop gracefully.
///
/// This function publishes a [`QuitEvent`](EventKind::QuitEvent) through the given [`EventBus`],
/// signaling the target module to terminate. It then waits asynchronously for the module’s task
/// (represented by the provided [`tokio::task::JoinHandle`]) to complete within a fixed timeout.
///
/// # Panics
/// This function panics if:
/// - The module does not stop within the timeout.
/// - The task returns an error (`Err(())`).
pub async fn stop_module(
    event_bus: &EventBus,
    handle: &mut tokio::task::JoinHandle<Result<(), ()>>,
) {
    event_bus.publish(&Event {
        kind: EventKind::QuitEvent,
    });
    timeout(std::time::Duration::from_millis(100), handle)
        .await
        .expect("Module doesn't handle quit event in timeout")
        .expect("Module task panicked")
        .expect("Module returned an error");
}

/// Waits asynchronously for a specific type of [`Event`] to be received on a
/// [`tokio::sync::broadcast::Receiver`] within a given duration.
///
/// Events of other types are skipped.
///
/// # Panics
///
/// This function panics if no matching event is received within the specified
/// `duration`.
///
/// # Returns
///
/// Returns the first [`Event`] whose [`EventKind`] discriminant matches
/// `exp_event`.
pub async fn wait_for_event(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    duration: std::time::Duration,
    exp_event: EventKindType,
) -> Event {
    let deadline = Instant::now() + duration;
    loop {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Ok(event)) if EventKindType::from(&event.kind) == exp_event => return event,
            Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
            Ok(Err(RecvError::Closed)) | Err(_) => break,
        }
    }
    panic!("Failed to receive event of type {:?}", exp_event);
}

/// Collects all events already queued for a [`Listener`].
pub fn drain(listener: &mut Listener) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = listener.try_recv() {
        events.push(event);
    }
    events
}
