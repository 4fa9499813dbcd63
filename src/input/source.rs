//! Boundaries to the host: where key states come from and where cursor policy goes

use std::collections::HashMap;

use super::types::{CursorLockMode, KeyCode, Phase};

/// Read-only view of physical input for the current tick
pub trait InputSource {
    /// Key went down this tick
    fn was_pressed_this_tick(&self, key: KeyCode) -> bool;

    /// Key is down (including the tick it went down)
    fn is_held(&self, key: KeyCode) -> bool;

    /// Key went up this tick
    fn was_released_this_tick(&self, key: KeyCode) -> bool;

    /// Value of a physical axis ("Mouse X", "Mouse Y", ...)
    fn axis_value(&self, physical_axis: &str) -> f32;

    /// Whether `key` is active in the given phase
    fn is_active(&self, key: KeyCode, phase: Phase) -> bool {
        match phase {
            Phase::JustPressed => self.was_pressed_this_tick(key),
            Phase::Held => self.is_held(key),
            Phase::JustReleased => self.was_released_this_tick(key),
        }
    }
}

/// Receives the cursor policy once per tick
pub trait CursorSink {
    fn set_cursor_policy(&mut self, mode: CursorLockMode);
}

/// Button press state with edge detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Released,
    /// Pressed this tick (edge)
    JustPressed,
    /// Held down (multiple ticks)
    Pressed,
    /// Released this tick (edge)
    JustReleased,
}

impl ButtonState {
    /// Advance state for next tick (transitions edges to steady states)
    pub fn advance(self) -> Self {
        match self {
            Self::JustPressed => Self::Pressed,
            Self::JustReleased => Self::Released,
            state => state,
        }
    }

    /// Returns true if button is currently down (just pressed or held)
    pub fn is_down(self) -> bool {
        matches!(self, Self::JustPressed | Self::Pressed)
    }

    /// Returns true if button was just pressed this tick
    pub fn is_just_pressed(self) -> bool {
        matches!(self, Self::JustPressed)
    }

    /// Returns true if button was just released this tick
    pub fn is_just_released(self) -> bool {
        matches!(self, Self::JustReleased)
    }
}

/// Per-key record for one tick: the down state plus both edges
///
/// Edges are kept separately from the down state so that a press and a
/// release arriving before the same tick are both observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct KeyTrack {
    down: bool,
    pressed_this_tick: bool,
    released_this_tick: bool,
}

impl KeyTrack {
    fn summary(self) -> ButtonState {
        match (self.down, self.pressed_this_tick, self.released_this_tick) {
            (true, true, _) => ButtonState::JustPressed,
            (true, false, _) => ButtonState::Pressed,
            (false, _, true) => ButtonState::JustReleased,
            (false, _, false) => ButtonState::Released,
        }
    }
}

/// Host-fed input snapshot
///
/// Feed it press/release events as they arrive, read it during the tick,
/// then call [`InputState::advance_tick`].
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashMap<KeyCode, KeyTrack>,
    axes: HashMap<String, f32>,
}

impl InputState {
    /// Creates a new empty input state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: KeyCode) {
        let track = self.keys.entry(key.normalized()).or_default();
        if !track.down {
            track.down = true;
            track.pressed_this_tick = true;
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        if let Some(track) = self.keys.get_mut(&key.normalized()) {
            if track.down {
                track.down = false;
                track.released_this_tick = true;
            }
        }
    }

    /// Release every key that is down (e.g. on focus loss)
    pub fn release_all(&mut self) {
        for track in self.keys.values_mut() {
            if track.down {
                track.down = false;
                track.released_this_tick = true;
            }
        }
    }

    /// Summary of a key for this tick
    ///
    /// A key pressed and released within one tick reports `JustReleased`;
    /// use the `InputSource` queries to see both edges.
    pub fn key_state(&self, key: KeyCode) -> ButtonState {
        self.keys
            .get(&key)
            .map(|track| track.summary())
            .unwrap_or_default()
    }

    /// Set an absolute axis value for this tick
    pub fn set_axis(&mut self, physical_axis: impl Into<String>, value: f32) {
        self.axes.insert(physical_axis.into(), value);
    }

    /// Accumulate a delta into an axis (mouse motion, wheel)
    pub fn add_axis_delta(&mut self, physical_axis: &str, delta: f32) {
        *self.axes.entry(physical_axis.to_string()).or_insert(0.0) += delta;
    }

    /// Clear edges and per-tick axis values; keys that are up are forgotten
    pub fn advance_tick(&mut self) {
        for track in self.keys.values_mut() {
            track.pressed_this_tick = false;
            track.released_this_tick = false;
        }
        self.keys.retain(|_, track| track.down);
        self.axes.clear();
    }

    fn track(&self, key: KeyCode) -> KeyTrack {
        self.keys.get(&key.normalized()).copied().unwrap_or_default()
    }
}

impl InputSource for InputState {
    fn was_pressed_this_tick(&self, key: KeyCode) -> bool {
        self.track(key).pressed_this_tick
    }

    fn is_held(&self, key: KeyCode) -> bool {
        self.track(key).down
    }

    fn was_released_this_tick(&self, key: KeyCode) -> bool {
        self.track(key).released_this_tick
    }

    fn axis_value(&self, physical_axis: &str) -> f32 {
        self.axes.get(physical_axis).copied().unwrap_or(0.0)
    }
}

/// Cursor sink that remembers what it was told
#[derive(Debug, Clone, Default)]
pub struct RecordingCursorSink {
    pub last: Option<CursorLockMode>,
    pub applied: usize,
}

impl CursorSink for RecordingCursorSink {
    fn set_cursor_policy(&mut self, mode: CursorLockMode) {
        self.last = Some(mode);
        self.applied += 1;
    }
}
