//! Adapter feeding winit events into an [`InputState`]
//!
//! Keys are mapped from their physical position, so bindings do not move
//! when the keyboard layout changes.

use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use super::axis::{MOUSE_SCROLL_WHEEL, MOUSE_X, MOUSE_Y};
use super::source::InputState;
use super::types::KeyCode;

/// Pixels per wheel line when a platform reports pixel deltas
const PIXELS_PER_LINE: f64 = 20.0;

/// Convert a winit physical key to our key code
///
/// Returns None for keys the engine does not model.
pub fn key_from_physical(physical_key: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = physical_key else {
        return None;
    };

    let key = match code {
        // Letters
        WinitKeyCode::KeyA => KeyCode::Char('a'),
        WinitKeyCode::KeyB => KeyCode::Char('b'),
        WinitKeyCode::KeyC => KeyCode::Char('c'),
        WinitKeyCode::KeyD => KeyCode::Char('d'),
        WinitKeyCode::KeyE => KeyCode::Char('e'),
        WinitKeyCode::KeyF => KeyCode::Char('f'),
        WinitKeyCode::KeyG => KeyCode::Char('g'),
        WinitKeyCode::KeyH => KeyCode::Char('h'),
        WinitKeyCode::KeyI => KeyCode::Char('i'),
        WinitKeyCode::KeyJ => KeyCode::Char('j'),
        WinitKeyCode::KeyK => KeyCode::Char('k'),
        WinitKeyCode::KeyL => KeyCode::Char('l'),
        WinitKeyCode::KeyM => KeyCode::Char('m'),
        WinitKeyCode::KeyN => KeyCode::Char('n'),
        WinitKeyCode::KeyO => KeyCode::Char('o'),
        WinitKeyCode::KeyP => KeyCode::Char('p'),
        WinitKeyCode::KeyQ => KeyCode::Char('q'),
        WinitKeyCode::KeyR => KeyCode::Char('r'),
        WinitKeyCode::KeyS => KeyCode::Char('s'),
        WinitKeyCode::KeyT => KeyCode::Char('t'),
        WinitKeyCode::KeyU => KeyCode::Char('u'),
        WinitKeyCode::KeyV => KeyCode::Char('v'),
        WinitKeyCode::KeyW => KeyCode::Char('w'),
        WinitKeyCode::KeyX => KeyCode::Char('x'),
        WinitKeyCode::KeyY => KeyCode::Char('y'),
        WinitKeyCode::KeyZ => KeyCode::Char('z'),

        // Digit row
        WinitKeyCode::Digit0 => KeyCode::Char('0'),
        WinitKeyCode::Digit1 => KeyCode::Char('1'),
        WinitKeyCode::Digit2 => KeyCode::Char('2'),
        WinitKeyCode::Digit3 => KeyCode::Char('3'),
        WinitKeyCode::Digit4 => KeyCode::Char('4'),
        WinitKeyCode::Digit5 => KeyCode::Char('5'),
        WinitKeyCode::Digit6 => KeyCode::Char('6'),
        WinitKeyCode::Digit7 => KeyCode::Char('7'),
        WinitKeyCode::Digit8 => KeyCode::Char('8'),
        WinitKeyCode::Digit9 => KeyCode::Char('9'),

        // Punctuation (US positions)
        WinitKeyCode::Backquote => KeyCode::Char('`'),
        WinitKeyCode::Minus => KeyCode::Char('-'),
        WinitKeyCode::Equal => KeyCode::Char('='),
        WinitKeyCode::BracketLeft => KeyCode::Char('['),
        WinitKeyCode::BracketRight => KeyCode::Char(']'),
        WinitKeyCode::Backslash => KeyCode::Char('\\'),
        WinitKeyCode::Semicolon => KeyCode::Char(';'),
        WinitKeyCode::Quote => KeyCode::Char('\''),
        WinitKeyCode::Comma => KeyCode::Char(','),
        WinitKeyCode::Period => KeyCode::Char('.'),
        WinitKeyCode::Slash => KeyCode::Char('/'),

        WinitKeyCode::Enter => KeyCode::Enter,
        WinitKeyCode::Escape => KeyCode::Escape,
        WinitKeyCode::Tab => KeyCode::Tab,
        WinitKeyCode::Backspace => KeyCode::Backspace,
        WinitKeyCode::Delete => KeyCode::Delete,
        WinitKeyCode::Space => KeyCode::Space,

        // Arrows
        WinitKeyCode::ArrowUp => KeyCode::Up,
        WinitKeyCode::ArrowDown => KeyCode::Down,
        WinitKeyCode::ArrowLeft => KeyCode::Left,
        WinitKeyCode::ArrowRight => KeyCode::Right,

        // Navigation
        WinitKeyCode::Home => KeyCode::Home,
        WinitKeyCode::End => KeyCode::End,
        WinitKeyCode::PageUp => KeyCode::PageUp,
        WinitKeyCode::PageDown => KeyCode::PageDown,
        WinitKeyCode::Insert => KeyCode::Insert,

        // Modifiers: left and right collapse to one key
        WinitKeyCode::ShiftLeft | WinitKeyCode::ShiftRight => KeyCode::Shift,
        WinitKeyCode::ControlLeft | WinitKeyCode::ControlRight => KeyCode::Ctrl,
        WinitKeyCode::AltLeft | WinitKeyCode::AltRight => KeyCode::Alt,
        WinitKeyCode::SuperLeft | WinitKeyCode::SuperRight => KeyCode::Meta,

        // Function keys
        WinitKeyCode::F1 => KeyCode::F(1),
        WinitKeyCode::F2 => KeyCode::F(2),
        WinitKeyCode::F3 => KeyCode::F(3),
        WinitKeyCode::F4 => KeyCode::F(4),
        WinitKeyCode::F5 => KeyCode::F(5),
        WinitKeyCode::F6 => KeyCode::F(6),
        WinitKeyCode::F7 => KeyCode::F(7),
        WinitKeyCode::F8 => KeyCode::F(8),
        WinitKeyCode::F9 => KeyCode::F(9),
        WinitKeyCode::F10 => KeyCode::F(10),
        WinitKeyCode::F11 => KeyCode::F(11),
        WinitKeyCode::F12 => KeyCode::F(12),

        // Numpad
        WinitKeyCode::Numpad0 => KeyCode::Numpad0,
        WinitKeyCode::Numpad1 => KeyCode::Numpad1,
        WinitKeyCode::Numpad2 => KeyCode::Numpad2,
        WinitKeyCode::Numpad3 => KeyCode::Numpad3,
        WinitKeyCode::Numpad4 => KeyCode::Numpad4,
        WinitKeyCode::Numpad5 => KeyCode::Numpad5,
        WinitKeyCode::Numpad6 => KeyCode::Numpad6,
        WinitKeyCode::Numpad7 => KeyCode::Numpad7,
        WinitKeyCode::Numpad8 => KeyCode::Numpad8,
        WinitKeyCode::Numpad9 => KeyCode::Numpad9,
        WinitKeyCode::NumpadAdd => KeyCode::NumpadAdd,
        WinitKeyCode::NumpadSubtract => KeyCode::NumpadSubtract,
        WinitKeyCode::NumpadMultiply => KeyCode::NumpadMultiply,
        WinitKeyCode::NumpadDivide => KeyCode::NumpadDivide,
        WinitKeyCode::NumpadEnter => KeyCode::NumpadEnter,
        WinitKeyCode::NumpadDecimal => KeyCode::NumpadDecimal,

        _ => return None,
    };
    Some(key)
}

/// Convert a winit mouse button to our key code
pub fn key_from_mouse_button(button: MouseButton) -> Option<KeyCode> {
    match button {
        MouseButton::Left => Some(KeyCode::MouseLeft),
        MouseButton::Right => Some(KeyCode::MouseRight),
        MouseButton::Middle => Some(KeyCode::MouseMiddle),
        _ => None,
    }
}

/// Collects winit events between ticks into an [`InputState`]
///
/// Call the `handle_*` methods from the event loop, pass [`state`] to the
/// engine tick, then call [`end_tick`].
///
/// [`state`]: WinitInputCollector::state
/// [`end_tick`]: WinitInputCollector::end_tick
#[derive(Debug, Default)]
pub struct WinitInputCollector {
    state: InputState,
}

impl WinitInputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a window event; returns true if it was an input event we use
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                // OS key repeat must not produce new edges
                if event.repeat {
                    return true;
                }
                self.handle_key(event.physical_key, event.state)
            }
            WindowEvent::MouseInput { state, button, .. } => self.handle_mouse_button(*button, *state),
            WindowEvent::MouseWheel { delta, .. } => {
                self.handle_scroll(*delta);
                true
            }
            WindowEvent::Focused(false) => {
                tracing::debug!("Window lost focus; releasing held keys");
                self.state.release_all();
                true
            }
            _ => false,
        }
    }

    pub fn handle_key(&mut self, physical_key: PhysicalKey, state: ElementState) -> bool {
        match key_from_physical(physical_key) {
            Some(key) => {
                self.apply(key, state);
                true
            }
            None => {
                tracing::trace!(?physical_key, "Ignoring unmapped key");
                false
            }
        }
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) -> bool {
        match key_from_mouse_button(button) {
            Some(key) => {
                self.apply(key, state);
                true
            }
            None => false,
        }
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
        };
        self.state.add_axis_delta(MOUSE_SCROLL_WHEEL, lines);
    }

    /// Feed a device event; raw mouse motion drives the mouse axes
    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> bool {
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                self.state.add_axis_delta(MOUSE_X, *dx as f32);
                // Screen y grows downwards; the axis grows upwards
                self.state.add_axis_delta(MOUSE_Y, -*dy as f32);
                true
            }
            _ => false,
        }
    }

    fn apply(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => self.state.press(key),
            ElementState::Released => self.state.release(key),
        }
    }

    /// Input snapshot for the current tick
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Advance edges and clear axis deltas after the tick was processed
    pub fn end_tick(&mut self) {
        self.state.advance_tick();
    }
}
