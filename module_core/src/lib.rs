// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{
    position::{Altitude, Coordinates},
    sentence::FieldMapping,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strum_macros::EnumDiscriminants;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::trace;

/// Represents a high-level event in the system.
///
/// Each `Event` wraps an [`EventKind`], which defines the actual type
/// and data carried by the event.
///
/// This structure is designed to be passed through an [`EventBus`]
/// between asynchronous modules.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The inner event type and associated data.
    pub kind: EventKind,
}

impl Event {
    /// Returns the payload-less type of the event.
    pub fn event_type(&self) -> EventKindType {
        EventKindType::from(&self.kind)
    }
}

/// A thread-safe, reference-counted pointer to [`Coordinates`].
pub type CoordinatesPtr = Arc<Coordinates>;

/// A thread-safe, reference-counted pointer to an [`Altitude`].
pub type AltitudePtr = Arc<Altitude>;

/// A thread-safe, reference-counted pointer to a decoded sentence.
///
/// Every listener of a sentence shares the same [`FieldMapping`] instance.
pub type FieldMappingPtr = Arc<FieldMapping>;

/// Enumerates the different kinds of events that can be emitted
/// and transmitted via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(EventKindType), derive(Hash))]
pub enum EventKind {
    /// Indicates that a module shall terminate.
    QuitEvent,

    /// The receiver is brought up and the sentence pipeline is running.
    ReadyEvent,

    /// Bring-up or the transport failed. Carries a description of the reason.
    ErrorEvent(String),

    /// The satellite count changed from zero to the carried count.
    ConnectedEvent(u32),

    /// The satellite count dropped to zero. Carries the new count.
    DisconnectedEvent(u32),

    /// The satellite count reported by the last sentence that carried one.
    NumSatellitesEvent(u32),

    /// A position report in the active coordinate format.
    CoordinatesEvent(CoordinatesPtr),

    /// An altitude report in whole meters.
    AltitudeEvent(AltitudePtr),

    /// A previously valid fix was lost.
    DroppedEvent,

    /// A power on request completed.
    PowerOnEvent,

    /// A power off request completed.
    PowerOffEvent,

    /// Every decoded sentence, independent of its content.
    ///
    /// Listeners can subscribe to all sentences through
    /// `Topic::Kind(EventKindType::SentenceEvent)` or to a single sentence type
    /// through [`Topic::Sentence`].
    SentenceEvent(FieldMappingPtr),
}

/// Extracts a reference to the payload of an [`EventKind`] variant.
///
/// Evaluates to `Some(&payload)` if the kind matches the variant, `None` otherwise.
#[macro_export]
macro_rules! payload_ref {
    ($kind:expr, $variant:path) => {
        match &$kind {
            $variant(payload) => Some(payload),
            _ => None,
        }
    };
}

/// Names a channel of the [`EventBus`] listeners can register on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// All events of one [`EventKindType`].
    Kind(EventKindType),
    /// Decoded sentences of one sentence type, e.g. `GGA`.
    Sentence(String),
}

impl Topic {
    pub fn sentence(kind: &str) -> Self {
        Topic::Sentence(kind.to_string())
    }

    fn matches(&self, event: &Event) -> bool {
        match self {
            Topic::Kind(kind) => *kind == event.event_type(),
            Topic::Sentence(sentence) => match &event.kind {
                EventKind::SentenceEvent(mapping) => mapping.kind == *sentence,
                _ => false,
            },
        }
    }
}

impl From<EventKindType> for Topic {
    fn from(kind: EventKindType) -> Self {
        Topic::Kind(kind)
    }
}

/// Identifies a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

enum Sink {
    Stream(mpsc::UnboundedSender<Event>),
    /// The sender is taken on the first delivery, an empty sink is removed.
    Once(Option<oneshot::Sender<Event>>),
}

struct Entry {
    id: ListenerId,
    topic: Topic,
    sink: Sink,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Kept in registration order.
    entries: Vec<Entry>,
}

impl Registry {
    fn register(&mut self, topic: Topic, sink: Sink) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, topic, sink });
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let len = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        len != self.entries.len()
    }

    fn dispatch(&mut self, event: &Event) {
        self.entries.retain_mut(|entry| {
            if !entry.topic.matches(event) {
                return true;
            }
            match &mut entry.sink {
                Sink::Stream(sender) => sender.send(event.clone()).is_ok(),
                Sink::Once(sender) => {
                    if let Some(sender) = sender.take() {
                        let _ = sender.send(event.clone());
                    }
                    false
                }
            }
        });
    }
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn lock(registry: &SharedRegistry) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A simple asynchronous event bus for publishing and subscribing to [`Event`]s.
///
/// The bus offers two ways of receiving events:
/// - Topic listeners ([`EventBus::listen`], [`EventBus::listen_once`], [`EventBus::on`])
///   kept in a registry. Every published event is queued for the matching
///   listeners in registration order. A one-shot listener is removed from the
///   registry before its event is handed over.
/// - A [`tokio::sync::broadcast::channel`] that carries every event, used by
///   modules through their [`ModuleCtx`].
///
/// Delivery always goes through a channel, a listener never runs inside
/// [`EventBus::publish`].
#[derive(Clone)]
pub struct EventBus {
    /// The broadcast sender used internally to distribute events.
    sender: broadcast::Sender<Event>,
    registry: SharedRegistry,
}

impl EventBus {
    /// Creates a new [`EventBus`] with a fixed buffer capacity of 100 messages.
    ///
    /// When the buffer is full, the oldest messages are dropped automatically
    /// as new ones are published.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        EventBus {
            sender,
            registry: SharedRegistry::default(),
        }
    }

    /// Subscribes to the event bus and returns a [`tokio::sync::broadcast::Receiver`].
    ///
    /// The returned receiver will receive all future events published after the
    /// subscription is created.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publishes an [`Event`] to the topic listeners and all broadcast subscribers.
    ///
    /// If nobody listens, the event is discarded silently.
    pub fn publish(&self, event: &Event) {
        trace!("Publish {:?}", event.event_type());
        lock(&self.registry).dispatch(event);
        let _ = self.sender.send(event.clone());
    }

    /// Registers a listener that receives every event of the topic in order
    /// until it is dropped.
    pub fn listen(&self, topic: impl Into<Topic>) -> Listener {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = lock(&self.registry).register(topic.into(), Sink::Stream(sender));
        Listener {
            id,
            receiver,
            registry: self.registry.clone(),
        }
    }

    /// Registers a listener that receives only the next event of the topic.
    ///
    /// Dropping the listener before the event arrives removes it from the registry.
    pub fn listen_once(&self, topic: impl Into<Topic>) -> OneShotListener {
        let (sender, receiver) = oneshot::channel();
        let id = lock(&self.registry).register(topic.into(), Sink::Once(Some(sender)));
        OneShotListener {
            id,
            receiver,
            registry: self.registry.clone(),
        }
    }

    /// Invokes `callback` for every event of the topic until [`EventBus::unsubscribe`]
    /// is called with the returned id.
    ///
    /// The callback runs on its own task, therefore this must be called within
    /// a tokio runtime.
    pub fn on<F>(&self, topic: impl Into<Topic>, mut callback: F) -> ListenerId
    where
        F: FnMut(Event) + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let id = lock(&self.registry).register(topic.into(), Sink::Stream(sender));
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                callback(event);
            }
        });
        id
    }

    /// Removes a listener from the registry.
    ///
    /// # Returns
    /// `true` if the listener was still registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        lock(&self.registry).remove(id)
    }

    /// Returns the number of listeners registered for exactly this topic.
    pub fn listener_count(&self, topic: impl Into<Topic>) -> usize {
        let topic = topic.into();
        lock(&self.registry)
            .entries
            .iter()
            .filter(|entry| entry.topic == topic)
            .count()
    }

    /// Creates a [`ModuleCtx`] bound to this [`EventBus`].
    ///
    /// The returned context can be used by modules implementing [`Module`]
    /// to send and receive events within their execution scope.
    pub fn context(&self) -> ModuleCtx {
        ModuleCtx::new(self)
    }
}

/// Provides a default instance of [`EventBus`].
impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered topic listener, see [`EventBus::listen`].
pub struct Listener {
    id: ListenerId,
    receiver: mpsc::UnboundedReceiver<Event>,
    registry: SharedRegistry,
}

impl Listener {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Waits for the next event of the topic.
    ///
    /// Returns `None` once the listener was unsubscribed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Returns an already queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        lock(&self.registry).remove(self.id);
    }
}

/// A registered one-shot listener, see [`EventBus::listen_once`].
pub struct OneShotListener {
    id: ListenerId,
    receiver: oneshot::Receiver<Event>,
    registry: SharedRegistry,
}

impl OneShotListener {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Waits for the event.
    ///
    /// Returns `None` if the listener was unsubscribed before the event arrived.
    pub async fn recv(mut self) -> Option<Event> {
        (&mut self.receiver).await.ok()
    }
}

impl Drop for OneShotListener {
    fn drop(&mut self) {
        lock(&self.registry).remove(self.id);
    }
}

/// Defines the common interface for an asynchronous module
/// that can be executed and communicate via the [`EventBus`].
#[async_trait::async_trait]
pub trait Module {
    /// Runs the module asynchronously until completion.
    ///
    /// This function typically contains the module's main event loop,
    /// reacting to messages received through the [`ModuleCtx`].
    async fn run(&mut self) -> Result<(), ()>;
}

/// Provides a module-scoped context for interacting with the [`EventBus`].
///
/// Each `ModuleCtx` owns a handle to the bus and a broadcast receiver, allowing
/// the module to both publish and listen for events concurrently.
pub struct ModuleCtx {
    /// The bus the module publishes to.
    pub bus: EventBus,

    /// The broadcast receiver used to listen for events.
    pub receiver: broadcast::Receiver<Event>,
}

impl ModuleCtx {
    /// Constructs a new [`ModuleCtx`] from the given [`EventBus`].
    pub fn new(event_bus: &EventBus) -> Self {
        ModuleCtx {
            bus: event_bus.clone(),
            receiver: event_bus.subscribe(),
        }
    }

    /// Publishes an event of the given kind on the bus.
    pub fn publish_event(&self, kind: EventKind) {
        self.bus.publish(&Event { kind });
    }
}

pub mod test_helper;
