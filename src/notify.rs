use std::fmt;

use crate::types::{
    EntityKind, GameEvent, GhostKind, GhostView, ObstacleView, PickupFlavor, PickupView, PlayerView,
};

/// Callback attached to one entity; receives a borrowed view on each notify.
pub type Observer<T> = Box<dyn FnMut(&T)>;

/// Attach/detach registry owned by each subject entity. Fan-out is
/// synchronous: every callback runs before `notify` returns, and the
/// registry drops with its entity.
pub struct ObserverList<T> {
    observers: Vec<Observer<T>>,
}

impl<T> ObserverList<T> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn attach(&mut self, observer: Observer<T>) {
        self.observers.push(observer);
    }

    pub fn detach_all(&mut self) {
        self.observers.clear();
    }

    pub fn notify(&mut self, state: &T) {
        for observer in &mut self.observers {
            observer(state);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.observers.len())
            .finish()
    }
}

/// Receiver for tagged game events (pickups, captures, level progress).
/// The score engine is the built-in sink; presentation layers register
/// additional ones.
pub trait EventSink {
    fn on_event(&mut self, event: &GameEvent);
}

pub struct EventHub {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn publish(&mut self, event: &GameEvent) {
        for sink in &mut self.sinks {
            sink.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

/// Construction hook passed to `World::load_level`. For each entity the
/// world creates it may hand back an observer, which the world attaches
/// to that entity for its lifetime. The simulation compiles and runs with
/// no factory at all.
pub trait ViewFactory {
    fn player_view(&mut self) -> Option<Observer<PlayerView>> {
        None
    }

    fn ghost_view(&mut self, _kind: GhostKind) -> Option<Observer<GhostView>> {
        None
    }

    fn pickup_view(&mut self, _flavor: PickupFlavor) -> Option<Observer<PickupView>> {
        None
    }

    fn obstacle_view(&mut self, _kind: EntityKind) -> Option<Observer<ObstacleView>> {
        None
    }
}
