//! Core types for the input system: KeyCode, Phase, Slot, CursorLockMode

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Punctuation keys present on a US layout, in scan order
const PUNCTUATION: [char; 11] = ['`', '-', '=', '[', ']', '\\', ';', '\'', ',', '.', '/'];

/// A physical key (or mouse button) that can be bound to a listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    /// A printable ASCII character key, stored lowercase
    ///
    /// Engine entry points fold uppercase letters with
    /// [`KeyCode::normalized`]. Other characters are accepted but cannot be
    /// written to or read back from a bindings file.
    Char(char),

    // Named keys
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,

    // Arrow keys
    Up,
    Down,
    Left,
    Right,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,
    Insert,

    // Modifiers, as plain keys
    Shift,
    Ctrl,
    Alt,
    Meta,

    // Function keys
    F(u8), // F1-F12

    // Numpad (physical keys)
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadAdd,
    NumpadSubtract,
    NumpadMultiply,
    NumpadDivide,
    NumpadEnter,
    NumpadDecimal,

    // Mouse buttons
    MouseLeft,
    MouseRight,
    MouseMiddle,
}

impl KeyCode {
    /// Every key the engine knows about, in a fixed scan order
    ///
    /// Letters come first, then digits, punctuation, named keys, function
    /// keys, numpad and finally mouse buttons.
    pub fn all() -> &'static [KeyCode] {
        static ALL: OnceLock<Vec<KeyCode>> = OnceLock::new();
        ALL.get_or_init(|| {
            let mut keys = Vec::with_capacity(96);
            keys.extend(('a'..='z').map(KeyCode::Char));
            keys.extend(('0'..='9').map(KeyCode::Char));
            keys.extend(PUNCTUATION.iter().copied().map(KeyCode::Char));
            keys.extend([
                KeyCode::Enter,
                KeyCode::Escape,
                KeyCode::Tab,
                KeyCode::Backspace,
                KeyCode::Delete,
                KeyCode::Space,
                KeyCode::Up,
                KeyCode::Down,
                KeyCode::Left,
                KeyCode::Right,
                KeyCode::Home,
                KeyCode::End,
                KeyCode::PageUp,
                KeyCode::PageDown,
                KeyCode::Insert,
                KeyCode::Shift,
                KeyCode::Ctrl,
                KeyCode::Alt,
                KeyCode::Meta,
            ]);
            keys.extend((1..=12).map(KeyCode::F));
            keys.extend([
                KeyCode::Numpad0,
                KeyCode::Numpad1,
                KeyCode::Numpad2,
                KeyCode::Numpad3,
                KeyCode::Numpad4,
                KeyCode::Numpad5,
                KeyCode::Numpad6,
                KeyCode::Numpad7,
                KeyCode::Numpad8,
                KeyCode::Numpad9,
                KeyCode::NumpadAdd,
                KeyCode::NumpadSubtract,
                KeyCode::NumpadMultiply,
                KeyCode::NumpadDivide,
                KeyCode::NumpadEnter,
                KeyCode::NumpadDecimal,
                KeyCode::MouseLeft,
                KeyCode::MouseRight,
                KeyCode::MouseMiddle,
            ]);
            keys
        })
    }

    /// Canonical form: `Char('A')` becomes `Char('a')`, everything else is unchanged
    pub fn normalized(self) -> KeyCode {
        match self {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }

    /// Whether the key survives a trip through its text form
    pub fn is_representable(self) -> bool {
        match self {
            KeyCode::Char(c) => c.is_ascii_graphic() && !c.is_ascii_uppercase(),
            KeyCode::F(n) => (1..=12).contains(&n),
            _ => true,
        }
    }

    /// Whether this key is a mouse button rather than a keyboard key
    pub const fn is_mouse(self) -> bool {
        matches!(
            self,
            KeyCode::MouseLeft | KeyCode::MouseRight | KeyCode::MouseMiddle
        )
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Escape => write!(f, "escape"),
            KeyCode::Tab => write!(f, "tab"),
            KeyCode::Backspace => write!(f, "backspace"),
            KeyCode::Delete => write!(f, "delete"),
            KeyCode::Space => write!(f, "space"),
            KeyCode::Up => write!(f, "up"),
            KeyCode::Down => write!(f, "down"),
            KeyCode::Left => write!(f, "left"),
            KeyCode::Right => write!(f, "right"),
            KeyCode::Home => write!(f, "home"),
            KeyCode::End => write!(f, "end"),
            KeyCode::PageUp => write!(f, "pageup"),
            KeyCode::PageDown => write!(f, "pagedown"),
            KeyCode::Insert => write!(f, "insert"),
            KeyCode::Shift => write!(f, "shift"),
            KeyCode::Ctrl => write!(f, "ctrl"),
            KeyCode::Alt => write!(f, "alt"),
            KeyCode::Meta => write!(f, "meta"),
            KeyCode::F(n) => write!(f, "f{}", n),
            KeyCode::Numpad0 => write!(f, "numpad0"),
            KeyCode::Numpad1 => write!(f, "numpad1"),
            KeyCode::Numpad2 => write!(f, "numpad2"),
            KeyCode::Numpad3 => write!(f, "numpad3"),
            KeyCode::Numpad4 => write!(f, "numpad4"),
            KeyCode::Numpad5 => write!(f, "numpad5"),
            KeyCode::Numpad6 => write!(f, "numpad6"),
            KeyCode::Numpad7 => write!(f, "numpad7"),
            KeyCode::Numpad8 => write!(f, "numpad8"),
            KeyCode::Numpad9 => write!(f, "numpad9"),
            KeyCode::NumpadAdd => write!(f, "numpad_add"),
            KeyCode::NumpadSubtract => write!(f, "numpad_subtract"),
            KeyCode::NumpadMultiply => write!(f, "numpad_multiply"),
            KeyCode::NumpadDivide => write!(f, "numpad_divide"),
            KeyCode::NumpadEnter => write!(f, "numpad_enter"),
            KeyCode::NumpadDecimal => write!(f, "numpad_decimal"),
            KeyCode::MouseLeft => write!(f, "mouse_left"),
            KeyCode::MouseRight => write!(f, "mouse_right"),
            KeyCode::MouseMiddle => write!(f, "mouse_middle"),
        }
    }
}

/// A key name that does not match any known key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key: {0:?}")]
pub struct KeyParseError(pub String);

impl FromStr for KeyCode {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_graphic() {
                return Ok(KeyCode::Char(c.to_ascii_lowercase()));
            }
            return Err(KeyParseError(s.to_string()));
        }

        let lower = trimmed.to_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" => KeyCode::Enter,
            "escape" | "esc" => KeyCode::Escape,
            "tab" => KeyCode::Tab,
            "backspace" | "back" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "space" | "spacebar" => KeyCode::Space,

            "up" | "arrowup" => KeyCode::Up,
            "down" | "arrowdown" => KeyCode::Down,
            "left" | "arrowleft" => KeyCode::Left,
            "right" | "arrowright" => KeyCode::Right,

            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
            "insert" | "ins" => KeyCode::Insert,

            "shift" => KeyCode::Shift,
            "ctrl" | "control" => KeyCode::Ctrl,
            "alt" | "option" | "opt" => KeyCode::Alt,
            "meta" | "super" | "win" | "cmd" => KeyCode::Meta,

            "numpad0" | "num0" => KeyCode::Numpad0,
            "numpad1" | "num1" => KeyCode::Numpad1,
            "numpad2" | "num2" => KeyCode::Numpad2,
            "numpad3" | "num3" => KeyCode::Numpad3,
            "numpad4" | "num4" => KeyCode::Numpad4,
            "numpad5" | "num5" => KeyCode::Numpad5,
            "numpad6" | "num6" => KeyCode::Numpad6,
            "numpad7" | "num7" => KeyCode::Numpad7,
            "numpad8" | "num8" => KeyCode::Numpad8,
            "numpad9" | "num9" => KeyCode::Numpad9,
            "numpad_add" | "numadd" | "numplus" => KeyCode::NumpadAdd,
            "numpad_subtract" | "numsub" | "numminus" => KeyCode::NumpadSubtract,
            "numpad_multiply" | "nummul" => KeyCode::NumpadMultiply,
            "numpad_divide" | "numdiv" => KeyCode::NumpadDivide,
            "numpad_enter" | "numenter" => KeyCode::NumpadEnter,
            "numpad_decimal" | "numdot" => KeyCode::NumpadDecimal,

            "mouse_left" | "mouse0" | "lmb" => KeyCode::MouseLeft,
            "mouse_right" | "mouse1" | "rmb" => KeyCode::MouseRight,
            "mouse_middle" | "mouse2" | "mmb" => KeyCode::MouseMiddle,

            other => {
                // Function keys
                let n = other
                    .strip_prefix('f')
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| (1..=12).contains(n))
                    .ok_or_else(|| KeyParseError(s.to_string()))?;
                KeyCode::F(n)
            }
        };
        Ok(key)
    }
}

impl Serialize for KeyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// The trigger phase a listener reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Key went down this tick (edge-down)
    JustPressed,
    /// Key is down (includes the tick it was pressed)
    Held,
    /// Key went up this tick (edge-up)
    JustReleased,
}

impl Phase {
    /// All phases in dispatch order
    pub const ALL: [Phase; 3] = [Phase::JustPressed, Phase::Held, Phase::JustReleased];

    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Phase::JustPressed => 0,
            Phase::Held => 1,
            Phase::JustReleased => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::JustPressed => write!(f, "just pressed"),
            Phase::Held => write!(f, "held"),
            Phase::JustReleased => write!(f, "just released"),
        }
    }
}

/// Which of a listener's two key slots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Positive,
    Alternative,
}

impl Slot {
    /// The other slot
    pub const fn other(self) -> Slot {
        match self {
            Slot::Positive => Slot::Alternative,
            Slot::Alternative => Slot::Positive,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Positive => write!(f, "positive"),
            Slot::Alternative => write!(f, "alternative"),
        }
    }
}

/// Cursor policy requested by the handler on top of the stack
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorLockMode {
    /// Cursor is free and visible
    #[default]
    None,
    /// Cursor is confined to the window
    Confined,
    /// Cursor is locked in place (mouse-look)
    Locked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_char_lowercase() {
        assert_eq!("A".parse::<KeyCode>(), Ok(KeyCode::Char('a')));
        assert_eq!("a".parse::<KeyCode>(), Ok(KeyCode::Char('a')));
    }

    #[test]
    fn test_normalized_folds_uppercase_chars() {
        assert_eq!(KeyCode::Char('J').normalized(), KeyCode::Char('j'));
        assert_eq!(KeyCode::Char(';').normalized(), KeyCode::Char(';'));
        assert_eq!(KeyCode::Escape.normalized(), KeyCode::Escape);

        let key = KeyCode::Char('Q').normalized();
        assert_eq!(key.to_string().parse::<KeyCode>(), Ok(key));
    }

    #[test]
    fn test_representable_keys() {
        assert!(KeyCode::all().iter().all(|key| key.is_representable()));
        assert!(!KeyCode::Char('A').is_representable());
        assert!(!KeyCode::Char('é').is_representable());
        assert!(!KeyCode::Char(' ').is_representable());
        assert!("é".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_parse_named_aliases() {
        assert_eq!("esc".parse::<KeyCode>(), Ok(KeyCode::Escape));
        assert_eq!("Return".parse::<KeyCode>(), Ok(KeyCode::Enter));
        assert_eq!("arrowup".parse::<KeyCode>(), Ok(KeyCode::Up));
        assert_eq!("mouse0".parse::<KeyCode>(), Ok(KeyCode::MouseLeft));
        assert_eq!("F11".parse::<KeyCode>(), Ok(KeyCode::F(11)));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("f13".parse::<KeyCode>().is_err());
        assert!("hyper".parse::<KeyCode>().is_err());
        assert!("".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_display_parse_roundtrip_for_whole_key_space() {
        for &key in KeyCode::all() {
            let text = key.to_string();
            assert_eq!(text.parse::<KeyCode>(), Ok(key), "key {:?} as {:?}", key, text);
        }
    }

    #[test]
    fn test_all_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for key in KeyCode::all() {
            assert!(seen.insert(*key), "duplicate key {:?}", key);
        }
        assert!(seen.contains(&KeyCode::MouseLeft));
        assert!(seen.contains(&KeyCode::F(12)));
    }

    #[test]
    fn test_phase_index_matches_all_order() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn test_slot_other() {
        assert_eq!(Slot::Positive.other(), Slot::Alternative);
        assert_eq!(Slot::Alternative.other(), Slot::Positive);
    }
}
