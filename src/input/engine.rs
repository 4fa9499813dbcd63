//! The input engine: registry, active stack and per-tick driver
//!
//! Hosts construct one `InputEngine`, attach handlers, push/pop them as
//! their UI state changes, and call [`InputEngine::tick`] once per frame
//! with the current input snapshot.

use crate::config::EngineConfig;

use super::axis::LiveAxes;
use super::error::EngineError;
use super::handler::Handler;
use super::listener::CallbackId;
use super::rebind::{AbandonReason, Poll, RebindId, RebindOutcome, RebindRequest, RebindSession};
use super::registry::{HandlerId, Registry};
use super::router;
use super::source::{CursorSink, InputSource};
use super::stack::HandlerStack;
use super::store::{BindingStore, StoreError};
use super::types::{CursorLockMode, KeyCode, Phase};

/// What happened during one [`InputEngine::tick`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick counter, starting at 1
    pub tick: u64,
    /// Listener invocations made by dispatch
    pub invoked: usize,
    /// Rebind sessions that finished this tick
    pub rebinds: Vec<(RebindId, RebindOutcome)>,
    /// Cursor policy sent to the sink
    pub cursor: CursorLockMode,
}

pub struct InputEngine {
    registry: Registry,
    stack: HandlerStack,
    store: Box<dyn BindingStore>,
    /// Union of keys referenced by stacked handlers, sorted
    keys_of_interest: Vec<KeyCode>,
    live_axes: LiveAxes,
    /// Keys of interest / live axes need recomputing
    dirty: bool,
    rebinds: Vec<RebindSession>,
    next_rebind: u64,
    rebind_timeout_ticks: Option<u32>,
    persist_on_rebind: bool,
    tick: u64,
}

impl InputEngine {
    pub fn new(store: impl BindingStore + 'static) -> Self {
        Self::with_config(store, &EngineConfig::default())
    }

    pub fn with_config(store: impl BindingStore + 'static, config: &EngineConfig) -> Self {
        Self {
            registry: Registry::new(),
            stack: HandlerStack::new(),
            store: Box::new(store),
            keys_of_interest: Vec::new(),
            live_axes: LiveAxes::default(),
            dirty: false,
            rebinds: Vec::new(),
            next_rebind: 1,
            rebind_timeout_ticks: config.rebind_timeout_ticks,
            persist_on_rebind: config.persist_on_rebind,
            tick: 0,
        }
    }

    pub fn store(&self) -> &dyn BindingStore {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Register a handler and load its bindings
    pub fn attach(&mut self, handler: impl Into<Handler>) -> Result<HandlerId, EngineError> {
        self.registry.attach(handler.into(), self.store.as_ref())
    }

    /// Unregister a handler, taking it off the stack and abandoning its rebinds
    pub fn detach(&mut self, id: HandlerId) -> Option<Handler> {
        let handler = self.registry.detach(id)?;

        if self.stack.remove(id) > 0 {
            self.refresh();
        }

        let (orphaned, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.rebinds)
            .into_iter()
            .partition(|session| session.handler() == id);
        self.rebinds = kept;
        for mut session in orphaned {
            let outcome = session.abandoned(AbandonReason::HandlerDetached);
            session.finish(&outcome);
        }

        Some(handler)
    }

    pub fn lookup(&self, name: &str) -> Option<HandlerId> {
        self.registry.lookup(name)
    }

    pub fn handler(&self, id: HandlerId) -> Option<&Handler> {
        self.registry.get(id)
    }

    pub fn handler_by_name(&self, name: &str) -> Option<&Handler> {
        self.lookup(name).and_then(|id| self.registry.get(id))
    }

    /// Mutable access to a handler
    ///
    /// Keys of interest and live axes are recomputed before the next
    /// dispatch, or on [`InputEngine::refresh`].
    pub fn handler_mut(&mut self, id: HandlerId) -> Option<&mut Handler> {
        let handler = self.registry.get_mut(id)?;
        self.dirty = true;
        Some(handler)
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    pub fn add_callback(
        &mut self,
        id: HandlerId,
        phase: Phase,
        listener: &str,
        callback: impl FnMut() + 'static,
    ) -> Option<CallbackId> {
        self.registry.get_mut(id)?.add_callback(phase, listener, callback)
    }

    /// Add a callback by key; an anonymous listener is created if needed
    pub fn add_key_callback(
        &mut self,
        id: HandlerId,
        phase: Phase,
        key: KeyCode,
        callback: impl FnMut() + 'static,
    ) -> Option<CallbackId> {
        let callback_id = self.handler_mut(id)?.add_key_callback(phase, key, callback);
        if self.stack.contains(id) {
            self.refresh();
        }
        Some(callback_id)
    }

    pub fn remove_callback(
        &mut self,
        id: HandlerId,
        phase: Phase,
        listener: &str,
        callback: CallbackId,
    ) -> bool {
        self.registry
            .get_mut(id)
            .is_some_and(|h| h.remove_callback(phase, listener, callback))
    }

    pub fn remove_key_callback(
        &mut self,
        id: HandlerId,
        phase: Phase,
        key: KeyCode,
        callback: CallbackId,
    ) -> bool {
        self.registry
            .get_mut(id)
            .is_some_and(|h| h.remove_key_callback(phase, key, callback))
    }

    // =========================================================================
    // Stack
    // =========================================================================

    pub fn push(&mut self, id: HandlerId) -> Result<(), EngineError> {
        if !self.registry.contains(id) {
            return Err(EngineError::UnknownHandler(id));
        }
        self.stack.push(id);
        tracing::debug!(handler = %id, depth = self.stack.len(), "Handler pushed");
        self.refresh();
        Ok(())
    }

    /// Push a handler by name; `None` if no handler has that name
    pub fn push_by_name(&mut self, name: &str) -> Option<HandlerId> {
        let id = self.lookup(name)?;
        self.stack.push(id);
        tracing::debug!(handler = name, depth = self.stack.len(), "Handler pushed");
        self.refresh();
        Some(id)
    }

    pub fn pop(&mut self) -> Option<HandlerId> {
        let id = self.stack.pop()?;
        tracing::debug!(handler = %id, depth = self.stack.len(), "Handler popped");
        self.refresh();
        Some(id)
    }

    /// Take every occurrence of a handler off the stack
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let removed = self.stack.remove(id);
        if removed == 0 {
            return false;
        }
        tracing::debug!(handler = %id, removed, "Handler removed from stack");
        self.refresh();
        true
    }

    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.lookup(name) {
            Some(id) => self.remove(id),
            None => false,
        }
    }

    pub fn top(&self) -> Option<HandlerId> {
        self.stack.top()
    }

    pub fn stack(&self) -> &HandlerStack {
        &self.stack
    }

    pub fn keys_of_interest(&self) -> &[KeyCode] {
        &self.keys_of_interest
    }

    /// Recompute keys of interest and live axes from the current stack
    pub fn refresh(&mut self) {
        let mut keys: Vec<KeyCode> = self
            .stack
            .iter_top_down()
            .filter_map(|id| self.registry.get(id))
            .flat_map(|handler| handler.all_keys())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        self.keys_of_interest = keys;

        self.live_axes = LiveAxes::aggregate(
            self.stack
                .iter_top_down()
                .filter_map(|id| self.registry.get(id).map(|handler| (id, handler))),
        );
        self.dirty = false;

        tracing::debug!(
            keys = self.keys_of_interest.len(),
            axes = self.live_axes.len(),
            "Recomputed stack-derived state"
        );
    }

    // =========================================================================
    // Per-tick
    // =========================================================================

    /// Run one tick: finish rebinds, dispatch key events, apply cursor policy
    pub fn tick(&mut self, source: &dyn InputSource, cursor: &mut dyn CursorSink) -> TickReport {
        self.tick += 1;

        let rebinds = self.poll_rebinds(source);

        if self.dirty {
            self.refresh();
        }

        let invoked = router::dispatch(&self.stack, &mut self.registry, &self.keys_of_interest, source);

        let mode = self.cursor_lock_mode();
        cursor.set_cursor_policy(mode);

        TickReport {
            tick: self.tick,
            invoked,
            rebinds,
            cursor: mode,
        }
    }

    /// Whether a listener receives an event this tick, given stack blocking
    pub fn is_triggered(
        &self,
        id: HandlerId,
        listener: &str,
        phase: Phase,
        source: &dyn InputSource,
    ) -> bool {
        router::is_triggered(&self.stack, &self.registry, id, listener, phase, source)
    }

    /// Value of a live axis; 0.0 when no active handler exposes it
    pub fn axis_value(&self, name: &str, source: &dyn InputSource) -> f32 {
        self.live_axes.value(name, source)
    }

    pub fn live_axes(&self) -> &LiveAxes {
        &self.live_axes
    }

    /// Cursor policy of the top handler, or `None` for an empty stack
    pub fn cursor_lock_mode(&self) -> CursorLockMode {
        self.stack
            .top()
            .and_then(|id| self.registry.get(id))
            .map(Handler::cursor_lock_mode)
            .unwrap_or_default()
    }

    // =========================================================================
    // Rebinding
    // =========================================================================

    /// Begin waiting for the next held key to rebind a listener slot
    pub fn start_rebind(&mut self, request: RebindRequest) -> Result<RebindId, EngineError> {
        let handler = self
            .registry
            .get(request.handler)
            .ok_or(EngineError::UnknownHandler(request.handler))?;
        if handler.listener(&request.listener).is_none() {
            return Err(EngineError::UnknownListener {
                handler: handler.name().to_string(),
                listener: request.listener.clone(),
            });
        }

        let id = RebindId::new(self.next_rebind);
        self.next_rebind += 1;
        tracing::debug!(%id, handler = handler.name(), listener = %request.listener, slot = %request.slot, "Rebind started");
        self.rebinds
            .push(RebindSession::new(id, request, self.rebind_timeout_ticks));
        Ok(id)
    }

    /// Abandon a pending rebind; its completion callback still runs
    pub fn cancel_rebind(&mut self, id: RebindId) -> Option<RebindOutcome> {
        let pos = self.rebinds.iter().position(|s| s.id() == id)?;
        let mut session = self.rebinds.remove(pos);
        let outcome = session.abandoned(AbandonReason::Cancelled);
        session.finish(&outcome);
        Some(outcome)
    }

    pub fn pending_rebinds(&self) -> impl Iterator<Item = &RebindSession> {
        self.rebinds.iter()
    }

    fn poll_rebinds(&mut self, source: &dyn InputSource) -> Vec<(RebindId, RebindOutcome)> {
        if self.rebinds.is_empty() {
            return Vec::new();
        }

        let mut finished = Vec::new();
        let mut sessions = std::mem::take(&mut self.rebinds);
        sessions.retain_mut(|session| {
            let outcome = match session.poll(source) {
                Poll::Pending => return true,
                Poll::Captured(key) => self.apply_rebind(session, key),
                Poll::TimedOut => session.abandoned(AbandonReason::TimedOut),
            };
            session.finish(&outcome);
            finished.push((session.id(), outcome));
            false
        });
        self.rebinds = sessions;
        finished
    }

    fn apply_rebind(&mut self, session: &RebindSession, key: KeyCode) -> RebindOutcome {
        let Some(handler) = self.registry.get_mut(session.handler()) else {
            return session.abandoned(AbandonReason::HandlerDetached);
        };
        let change = match handler.rebind_key(session.listener(), session.slot(), key) {
            Ok(change) => change,
            Err(EngineError::KeyInUse { .. }) => {
                return session.abandoned(AbandonReason::KeyInUse(key));
            }
            Err(_) => return session.abandoned(AbandonReason::ListenerMissing),
        };
        self.dirty = true;

        let persisted = self.persist_on_rebind && {
            match self.store.write(handler.name(), &handler.bindings()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(handler = handler.name(), "Failed to save rebound key: {}", e);
                    false
                }
            }
        };

        tracing::info!(
            handler = handler.name(),
            listener = %change.listener,
            slot = %change.slot,
            new = %change.new,
            persisted,
            "Key rebound"
        );

        RebindOutcome::Applied {
            handler: session.handler(),
            change,
            persisted,
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write a handler's current bindings to the store
    ///
    /// Returns `Ok(false)` if the handler is not registered.
    pub fn persist(&self, id: HandlerId) -> Result<bool, StoreError> {
        let Some(handler) = self.registry.get(id) else {
            return Ok(false);
        };
        self.store.write(handler.name(), &handler.bindings())?;
        Ok(true)
    }
}

impl std::fmt::Debug for InputEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputEngine")
            .field("registry", &self.registry)
            .field("stack", &self.stack)
            .field("keys_of_interest", &self.keys_of_interest)
            .field("live_axes", &self.live_axes)
            .field("rebinds", &self.rebinds)
            .field("tick", &self.tick)
            .finish()
    }
}
