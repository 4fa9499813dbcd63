//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use keystack::input::{
    HandlerDef, HandlerId, HandlerPolicy, InputEngine, InputState, KeyCode, NullBindingStore,
    Phase, RecordingCursorSink, TickReport,
};

/// Ordered record of which callbacks fired
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that appends `label` each time it runs
    pub fn recorder(&self, label: &str) -> impl FnMut() + 'static {
        let log = self.0.clone();
        let label = label.to_string();
        move || log.borrow_mut().push(label.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.0.borrow().iter().filter(|l| *l == label).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub fn policy() -> HandlerPolicy {
    HandlerPolicy::default()
}

pub fn pass_through() -> HandlerPolicy {
    HandlerPolicy {
        block_keys: false,
        ..HandlerPolicy::default()
    }
}

pub fn exclusive() -> HandlerPolicy {
    HandlerPolicy {
        hard_block_keys: true,
        block_keys: false,
        ..HandlerPolicy::default()
    }
}

/// Engine without persistence
pub fn engine() -> InputEngine {
    InputEngine::new(NullBindingStore)
}

/// Attach a handler with one listener "Act" on `key` in `phase`, recording
/// calls under the handler's name, and push it
pub fn push_layer(
    engine: &mut InputEngine,
    log: &CallLog,
    name: &str,
    policy: HandlerPolicy,
    phase: Phase,
    key: KeyCode,
) -> HandlerId {
    let def = HandlerDef::new(name)
        .policy(policy)
        .listener(phase, "Act", Some(key), None);
    let id = engine.attach(def).unwrap();
    engine
        .add_callback(id, phase, "Act", log.recorder(name))
        .unwrap();
    engine.push(id).unwrap();
    id
}

/// Input with `keys` pressed on this tick
pub fn pressed(keys: &[KeyCode]) -> InputState {
    let mut input = InputState::new();
    for &key in keys {
        input.press(key);
    }
    input
}

/// Input with `keys` held since an earlier tick
pub fn held(keys: &[KeyCode]) -> InputState {
    let mut input = pressed(keys);
    input.advance_tick();
    input
}

pub fn tick(engine: &mut InputEngine, input: &InputState) -> TickReport {
    engine.tick(input, &mut RecordingCursorSink::default())
}
