//! Handler: a named layer of listeners, axes and blocking policy

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::axis::{Axis, AxisKind};
use super::binding::{Bindings, ListenerBinding};
use super::error::EngineError;
use super::listener::{Callback, CallbackId, Listener};
use super::store::BindingStore;
use super::types::{CursorLockMode, KeyCode, Phase, Slot};

/// How a handler treats events and axes of the handlers beneath it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerPolicy {
    /// While on top of the stack, only this handler receives key events
    pub hard_block_keys: bool,
    /// A key matched by this handler does not reach lower handlers
    pub block_keys: bool,
    /// Axes of lower handlers are not live while this handler is active
    pub hard_block_axes: bool,
    /// A listener fires at most once per tick even if both its keys match
    pub invoke_once_per_frame: bool,
    /// Cursor policy applied while this handler is on top
    pub cursor_lock_mode: CursorLockMode,
}

impl Default for HandlerPolicy {
    fn default() -> Self {
        Self {
            hard_block_keys: false,
            block_keys: true,
            hard_block_axes: false,
            invoke_once_per_frame: false,
            cursor_lock_mode: CursorLockMode::None,
        }
    }
}

/// Author-supplied definition of a handler: its name, policy and default bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDef {
    pub name: String,
    #[serde(default)]
    pub policy: HandlerPolicy,
    #[serde(flatten)]
    pub defaults: Bindings,
}

impl HandlerDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: HandlerPolicy::default(),
            defaults: Bindings::default(),
        }
    }

    pub fn policy(mut self, policy: HandlerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn listener(
        mut self,
        phase: Phase,
        name: impl Into<String>,
        positive: Option<KeyCode>,
        alternative: Option<KeyCode>,
    ) -> Self {
        self.defaults = self.defaults.listener(phase, name, positive, alternative);
        self
    }

    pub fn just_pressed(self, name: impl Into<String>, key: KeyCode) -> Self {
        self.listener(Phase::JustPressed, name, Some(key), None)
    }

    pub fn held(self, name: impl Into<String>, key: KeyCode) -> Self {
        self.listener(Phase::Held, name, Some(key), None)
    }

    pub fn just_released(self, name: impl Into<String>, key: KeyCode) -> Self {
        self.listener(Phase::JustReleased, name, Some(key), None)
    }

    pub fn axis(mut self, name: impl Into<String>, kind: AxisKind) -> Self {
        self.defaults = self.defaults.axis(name, kind);
        self
    }
}

/// Where `Handler::init` took its bindings from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitSource {
    /// Saved bindings were found in the store
    Persisted,
    /// No saved bindings; author defaults were used
    Defaults,
    /// `init` had already run; nothing changed
    AlreadyInitialized,
}

/// Result of moving a listener slot to a new key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange {
    pub listener: String,
    pub slot: Slot,
    pub old: Option<KeyCode>,
    pub new: KeyCode,
}

/// A named layer of key listeners and axes
///
/// Tables are empty until [`Handler::init`] runs; callbacks must be added
/// after that.
pub struct Handler {
    name: String,
    policy: HandlerPolicy,
    defaults: Bindings,
    /// Listener arena; phase tables and the name index point into it
    listeners: Vec<Listener>,
    /// Per-phase key -> listener index
    tables: [HashMap<KeyCode, usize>; 3],
    /// Listener name -> first listener with that name (any phase)
    by_name: HashMap<String, usize>,
    axes: Vec<Axis>,
    initialized: bool,
    next_callback: u64,
}

impl Handler {
    pub fn new(def: HandlerDef) -> Self {
        Self {
            name: def.name,
            policy: def.policy,
            defaults: def.defaults,
            listeners: Vec::new(),
            tables: Default::default(),
            by_name: HashMap::new(),
            axes: Vec::new(),
            initialized: false,
            next_callback: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &HandlerPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: HandlerPolicy) {
        self.policy = policy;
    }

    pub fn cursor_lock_mode(&self) -> CursorLockMode {
        self.policy.cursor_lock_mode
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Populate tables from saved bindings, or from defaults if none are saved
    ///
    /// Runs once; later calls are no-ops. A store read error is logged and
    /// treated as "nothing saved".
    pub fn init(&mut self, store: &dyn BindingStore) -> InitSource {
        if self.initialized {
            return InitSource::AlreadyInitialized;
        }

        let (bindings, source) = match store.read(&self.name) {
            Ok(Some(saved)) => (saved, InitSource::Persisted),
            Ok(None) => (self.defaults.clone(), InitSource::Defaults),
            Err(e) => {
                tracing::warn!(handler = %self.name, "Failed to read saved bindings: {}", e);
                (self.defaults.clone(), InitSource::Defaults)
            }
        };

        self.populate(&bindings);
        self.initialized = true;

        tracing::debug!(
            handler = %self.name,
            ?source,
            listeners = self.listeners.len(),
            axes = self.axes.len(),
            "Handler initialized"
        );
        source
    }

    fn populate(&mut self, bindings: &Bindings) {
        for phase in Phase::ALL {
            for binding in bindings.phase(phase) {
                self.insert_listener(phase, binding);
            }
        }
        self.axes = bindings.axes.clone();
    }

    fn insert_listener(&mut self, phase: Phase, binding: &ListenerBinding) {
        let idx = self.listeners.len();
        let listener = Listener::new(
            binding.name.clone(),
            phase,
            binding.positive.map(KeyCode::normalized),
            binding.alternative.map(KeyCode::normalized),
        );

        let table = &mut self.tables[phase.index()];
        for key in listener.keys() {
            if let Some(&occupant) = table.get(&key) {
                tracing::warn!(
                    handler = %self.name,
                    %phase,
                    %key,
                    listener = %binding.name,
                    taken_by = ?self.listeners[occupant].name(),
                    "Key already bound in this phase; keeping the first listener"
                );
                continue;
            }
            table.insert(key, idx);
        }

        self.by_name.entry(binding.name.clone()).or_insert(idx);
        self.listeners.push(listener);
    }

    /// Listener by name, searching all phases (first declared wins)
    pub fn listener(&self, name: &str) -> Option<&Listener> {
        self.by_name.get(name).map(|&idx| &self.listeners[idx])
    }

    /// Listener by name within one phase
    pub fn listener_in(&self, phase: Phase, name: &str) -> Option<&Listener> {
        self.position_in(phase, name).map(|idx| &self.listeners[idx])
    }

    /// Listener bound to a key within one phase
    pub fn listener_for_key(&self, phase: Phase, key: KeyCode) -> Option<&Listener> {
        self.listener_index(phase, key).map(|idx| &self.listeners[idx])
    }

    /// All listeners, in declaration order
    pub fn listeners(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.iter()
    }

    pub(crate) fn listener_index(&self, phase: Phase, key: KeyCode) -> Option<usize> {
        self.tables[phase.index()].get(&key).copied()
    }

    pub(crate) fn position_in(&self, phase: Phase, name: &str) -> Option<usize> {
        self.listeners
            .iter()
            .position(|l| l.phase() == phase && l.name() == Some(name))
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn add_axis(&mut self, axis: Axis) {
        self.axes.push(axis);
    }

    /// Every key referenced by any phase table, sorted
    pub fn all_keys(&self) -> Vec<KeyCode> {
        self.tables
            .iter()
            .flat_map(|table| table.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Snapshot in persistence shape; unnamed listeners are left out
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        for listener in &self.listeners {
            if let Some(name) = listener.name() {
                bindings.phase_mut(listener.phase()).push(ListenerBinding::new(
                    name,
                    listener.positive(),
                    listener.alternative(),
                ));
            }
        }
        bindings.axes = self.axes.clone();
        bindings
    }

    fn next_callback_id(&mut self) -> CallbackId {
        let id = CallbackId::new(self.next_callback);
        self.next_callback += 1;
        id
    }

    /// Add a callback to the named listener of a phase
    ///
    /// Returns `None` if there is no such listener.
    pub fn add_callback(
        &mut self,
        phase: Phase,
        name: &str,
        callback: impl FnMut() + 'static,
    ) -> Option<CallbackId> {
        let idx = self.position_in(phase, name)?;
        let id = self.next_callback_id();
        self.listeners[idx].add_callback(id, Box::new(callback) as Callback);
        Some(id)
    }

    /// Add a callback to whatever listener owns `key` in a phase
    ///
    /// If the key is unbound, an anonymous listener is created for it.
    pub fn add_key_callback(
        &mut self,
        phase: Phase,
        key: KeyCode,
        callback: impl FnMut() + 'static,
    ) -> CallbackId {
        let idx = match self.listener_index(phase, key) {
            Some(idx) => idx,
            None => {
                let idx = self.listeners.len();
                self.listeners.push(Listener::unnamed(phase, key));
                self.tables[phase.index()].insert(key, idx);
                tracing::debug!(handler = %self.name, %phase, %key, "Created anonymous listener");
                idx
            }
        };
        let id = self.next_callback_id();
        self.listeners[idx].add_callback(id, Box::new(callback) as Callback);
        id
    }

    /// Remove a callback from every listener with this name in a phase
    pub fn remove_callback(&mut self, phase: Phase, name: &str, id: CallbackId) -> bool {
        let mut removed = false;
        for listener in &mut self.listeners {
            if listener.phase() == phase && listener.name() == Some(name) {
                removed |= listener.remove_callback(id);
            }
        }
        removed
    }

    /// Remove a callback from the listener owning `key` in a phase
    pub fn remove_key_callback(&mut self, phase: Phase, key: KeyCode, id: CallbackId) -> bool {
        match self.listener_index(phase, key) {
            Some(idx) => self.listeners[idx].remove_callback(id),
            None => false,
        }
    }

    /// Write `new_key` into a slot of every listener named `name` and move
    /// their table entries from the old key to the new one
    ///
    /// Fails without changing anything if no listener has that name, or if
    /// another listener already owns `new_key` in one of the affected
    /// phases. The returned change reports the old key of the
    /// first-declared listener.
    pub fn rebind_key(
        &mut self,
        name: &str,
        slot: Slot,
        new_key: KeyCode,
    ) -> Result<KeyChange, EngineError> {
        let new_key = new_key.normalized();
        let Some(&primary) = self.by_name.get(name) else {
            return Err(EngineError::UnknownListener {
                handler: self.name.clone(),
                listener: name.to_string(),
            });
        };
        let old = self.listeners[primary].key(slot);

        let targets: Vec<usize> = self
            .listeners
            .iter()
            .enumerate()
            .filter(|(_, l)| l.name() == Some(name))
            .map(|(idx, _)| idx)
            .collect();

        for &idx in &targets {
            let phase = self.listeners[idx].phase();
            if let Some(&occupant) = self.tables[phase.index()].get(&new_key) {
                if occupant != idx {
                    let taken_by = self.listeners[occupant].name().unwrap_or("<unnamed>");
                    tracing::warn!(
                        handler = %self.name,
                        listener = name,
                        %phase,
                        key = %new_key,
                        taken_by,
                        "Key already bound in this phase; rebind refused"
                    );
                    return Err(EngineError::KeyInUse {
                        handler: self.name.clone(),
                        phase,
                        key: new_key,
                        taken_by: taken_by.to_string(),
                    });
                }
            }
        }

        for idx in targets {
            let listener = &self.listeners[idx];
            let previous = listener.key(slot);
            if previous == Some(new_key) {
                continue;
            }
            let other_slot_key = listener.key(slot.other());
            let phase = listener.phase();

            self.listeners[idx].set_key(slot, Some(new_key));

            let table = &mut self.tables[phase.index()];
            table.insert(new_key, idx);
            if let Some(old_key) = previous {
                let still_used = other_slot_key == Some(old_key);
                if !still_used && table.get(&old_key) == Some(&idx) {
                    table.remove(&old_key);
                }
            }
        }

        tracing::debug!(handler = %self.name, listener = name, %slot, ?old, new = %new_key, "Key rebound");
        Ok(KeyChange {
            listener: name.to_string(),
            slot,
            old,
            new: new_key,
        })
    }

    /// Invoke the listener at `idx` under this handler's dedup policy
    pub(crate) fn invoke(&mut self, idx: usize) -> bool {
        let once = self.policy.invoke_once_per_frame;
        self.listeners[idx].invoke(once)
    }

    /// Clear the per-tick invocation flag of every listener
    pub fn clear_tick_flags(&mut self) {
        for listener in &mut self.listeners {
            listener.clear_tick();
        }
    }
}

impl From<HandlerDef> for Handler {
    fn from(def: HandlerDef) -> Self {
        Handler::new(def)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("listeners", &self.listeners)
            .field("axes", &self.axes)
            .field("initialized", &self.initialized)
            .finish()
    }
}
