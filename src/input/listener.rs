//! Listener: a named binding of up to two keys to a set of callbacks

use std::fmt;

use super::types::{KeyCode, Phase, Slot};

/// A callback registered on a listener
pub type Callback = Box<dyn FnMut()>;

/// Handle identifying one registered callback, used for removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Binding of one or two physical keys to a multicast callback set
///
/// A listener belongs to exactly one phase table of its handler. Both key
/// slots may be empty, in which case the listener is inert but can still be
/// found by name (and rebound).
pub struct Listener {
    name: Option<String>,
    phase: Phase,
    positive: Option<KeyCode>,
    alternative: Option<KeyCode>,
    invoked_this_tick: bool,
    callbacks: Vec<(CallbackId, Callback)>,
}

impl Listener {
    /// Create a named listener
    pub fn new(
        name: impl Into<String>,
        phase: Phase,
        positive: Option<KeyCode>,
        alternative: Option<KeyCode>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            phase,
            positive,
            alternative,
            invoked_this_tick: false,
            callbacks: Vec::new(),
        }
    }

    /// Create an anonymous listener bound to a single key
    pub fn unnamed(phase: Phase, key: KeyCode) -> Self {
        Self {
            name: None,
            phase,
            positive: Some(key),
            alternative: None,
            invoked_this_tick: false,
            callbacks: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn positive(&self) -> Option<KeyCode> {
        self.positive
    }

    pub fn alternative(&self) -> Option<KeyCode> {
        self.alternative
    }

    /// Key bound to the given slot
    pub fn key(&self, slot: Slot) -> Option<KeyCode> {
        match slot {
            Slot::Positive => self.positive,
            Slot::Alternative => self.alternative,
        }
    }

    /// Write a key into a slot, returning the previous value
    pub(crate) fn set_key(&mut self, slot: Slot, key: Option<KeyCode>) -> Option<KeyCode> {
        let target = match slot {
            Slot::Positive => &mut self.positive,
            Slot::Alternative => &mut self.alternative,
        };
        std::mem::replace(target, key)
    }

    /// Bound keys, positive first, without duplicates
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> {
        let alternative = self.alternative.filter(|alt| Some(*alt) != self.positive);
        self.positive.into_iter().chain(alternative)
    }

    /// True when neither slot holds a key
    pub fn is_inert(&self) -> bool {
        self.positive.is_none() && self.alternative.is_none()
    }

    pub fn has_callbacks(&self) -> bool {
        !self.callbacks.is_empty()
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    pub fn invoked_this_tick(&self) -> bool {
        self.invoked_this_tick
    }

    pub(crate) fn add_callback(&mut self, id: CallbackId, callback: Callback) {
        self.callbacks.push((id, callback));
    }

    pub(crate) fn remove_callback(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    /// Run every callback in registration order
    ///
    /// Returns false without running anything when there are no callbacks,
    /// or when `once_per_tick` is set and the listener already fired this tick.
    pub(crate) fn invoke(&mut self, once_per_tick: bool) -> bool {
        if self.callbacks.is_empty() {
            return false;
        }
        if once_per_tick && self.invoked_this_tick {
            return false;
        }
        for (_, callback) in &mut self.callbacks {
            callback();
        }
        self.invoked_this_tick = true;
        true
    }

    pub(crate) fn clear_tick(&mut self) {
        self.invoked_this_tick = false;
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("positive", &self.positive)
            .field("alternative", &self.alternative)
            .field("invoked_this_tick", &self.invoked_this_tick)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, Callback) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        (count, Box::new(move || inner.set(inner.get() + 1)))
    }

    #[test]
    fn test_keys_skip_empty_and_duplicate_slots() {
        let l = Listener::new("Jump", Phase::JustPressed, Some(KeyCode::Space), None);
        assert_eq!(l.keys().collect::<Vec<_>>(), vec![KeyCode::Space]);

        let l = Listener::new(
            "Jump",
            Phase::JustPressed,
            Some(KeyCode::Space),
            Some(KeyCode::Space),
        );
        assert_eq!(l.keys().count(), 1);

        let l = Listener::new("Idle", Phase::Held, None, None);
        assert!(l.is_inert());
        assert_eq!(l.keys().count(), 0);
    }

    #[test]
    fn test_invoke_without_callbacks_does_nothing() {
        let mut l = Listener::unnamed(Phase::Held, KeyCode::Char('w'));
        assert!(!l.invoke(false));
        assert!(!l.invoked_this_tick());
    }

    #[test]
    fn test_invoke_once_per_tick() {
        let (count, cb) = counter();
        let mut l = Listener::unnamed(Phase::Held, KeyCode::Char('w'));
        l.add_callback(CallbackId::new(1), cb);

        assert!(l.invoke(true));
        assert!(!l.invoke(true));
        assert_eq!(count.get(), 1);

        l.clear_tick();
        assert!(l.invoke(true));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_invoke_repeats_without_once_per_tick() {
        let (count, cb) = counter();
        let mut l = Listener::unnamed(Phase::Held, KeyCode::Char('w'));
        l.add_callback(CallbackId::new(1), cb);

        assert!(l.invoke(false));
        assert!(l.invoke(false));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_remove_callback_by_id() {
        let (first, cb1) = counter();
        let (second, cb2) = counter();
        let mut l = Listener::unnamed(Phase::JustPressed, KeyCode::Enter);
        l.add_callback(CallbackId::new(1), cb1);
        l.add_callback(CallbackId::new(2), cb2);

        assert!(l.remove_callback(CallbackId::new(1)));
        assert!(!l.remove_callback(CallbackId::new(1)));
        l.invoke(false);

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_set_key_returns_previous() {
        let mut l = Listener::new("Fire", Phase::JustPressed, Some(KeyCode::MouseLeft), None);
        let old = l.set_key(Slot::Positive, Some(KeyCode::Char('f')));
        assert_eq!(old, Some(KeyCode::MouseLeft));
        assert_eq!(l.key(Slot::Positive), Some(KeyCode::Char('f')));
        assert_eq!(l.set_key(Slot::Alternative, Some(KeyCode::Enter)), None);
    }
}
