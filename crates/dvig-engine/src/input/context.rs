use std::collections::{HashSet, VecDeque};

use super::types::{Event, Key};

/// Source of platform messages.
///
/// `pump` must never block: it translates whatever is pending into `input` and
/// returns immediately when nothing is.
pub trait EventPump {
    fn pump(&mut self, input: &mut InputContext);
}

/// Pump for contexts with no platform attached (headless runs, tests).
#[derive(Debug, Default, Copy, Clone)]
pub struct NoPump;

impl EventPump for NoPump {
    fn pump(&mut self, _input: &mut InputContext) {}
}

/// Input state owned by the application.
///
/// Events queue in arrival order and are delivered oldest first. Held keys track
/// the most recent press/release seen by the pump.
#[derive(Debug, Default)]
pub struct InputContext {
    events: VecDeque<Event>,
    keys_down: HashSet<Key>,
    resized: Option<(u32, u32)>,
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pumps `platform` once, then pops the oldest pending event.
    pub fn poll_next_event(&mut self, platform: &mut dyn EventPump) -> Option<Event> {
        platform.pump(self);
        self.pop_event()
    }

    /// Pops the oldest queued event without pumping.
    pub fn pop_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Instantaneous held state of `key`.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Records a key press. Emits `KeyPressed` unless `repeat` is set.
    pub fn press_key(&mut self, key: Key, repeat: bool) {
        self.keys_down.insert(key);
        if !repeat {
            self.events.push_back(Event::KeyPressed { key });
        }
    }

    pub fn release_key(&mut self, key: Key) {
        self.keys_down.remove(&key);
    }

    /// Clears held keys. Called on focus loss so keys released elsewhere don't stick.
    pub fn release_all(&mut self) {
        self.keys_down.clear();
    }

    /// Records the latest drawable size; earlier unconsumed sizes are replaced.
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        self.resized = Some((width, height));
    }

    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.resized.take()
    }
}
