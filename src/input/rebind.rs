//! Key rebinding sessions
//!
//! A session waits, one poll per tick, for the next held key and then
//! writes it into a listener slot. The engine owns the sessions and applies
//! the captured key; this module only models the waiting side and the
//! reported outcome.

use std::fmt;

use super::handler::KeyChange;
use super::registry::HandlerId;
use super::source::InputSource;
use super::types::{KeyCode, Slot};

/// Handle to a pending rebind session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RebindId(u64);

impl RebindId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RebindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rebind-{}", self.0)
    }
}

/// Why a session ended without applying a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    Cancelled,
    TimedOut,
    HandlerDetached,
    /// The handler no longer has a listener with the requested name
    ListenerMissing,
    /// The captured key belongs to another listener in the same phase
    KeyInUse(KeyCode),
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonReason::Cancelled => write!(f, "cancelled"),
            AbandonReason::TimedOut => write!(f, "timed out"),
            AbandonReason::HandlerDetached => write!(f, "handler detached"),
            AbandonReason::ListenerMissing => write!(f, "listener missing"),
            AbandonReason::KeyInUse(key) => write!(f, "key {key} already in use"),
        }
    }
}

/// How a session finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebindOutcome {
    Applied {
        handler: HandlerId,
        change: KeyChange,
        /// Whether the handler's bindings were written to the store
        persisted: bool,
    },
    Abandoned {
        handler: HandlerId,
        listener: String,
        slot: Slot,
        reason: AbandonReason,
    },
}

impl RebindOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RebindOutcome::Applied { .. })
    }

    pub fn handler(&self) -> HandlerId {
        match self {
            RebindOutcome::Applied { handler, .. } | RebindOutcome::Abandoned { handler, .. } => *handler,
        }
    }
}

/// Called once when a session finishes, applied or abandoned
pub type RebindCallback = Box<dyn FnOnce(&RebindOutcome)>;

/// What to rebind
pub struct RebindRequest {
    pub handler: HandlerId,
    pub listener: String,
    pub slot: Slot,
    on_complete: Option<RebindCallback>,
}

impl RebindRequest {
    pub fn new(handler: HandlerId, listener: impl Into<String>, slot: Slot) -> Self {
        Self {
            handler,
            listener: listener.into(),
            slot,
            on_complete: None,
        }
    }

    pub fn on_complete(mut self, callback: impl FnOnce(&RebindOutcome) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for RebindRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebindRequest")
            .field("handler", &self.handler)
            .field("listener", &self.listener)
            .field("slot", &self.slot)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebindState {
    Waiting { ticks_waited: u32 },
    Applied(KeyChange),
    Abandoned(AbandonReason),
}

/// Result of polling a waiting session for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Pending,
    Captured(KeyCode),
    TimedOut,
}

pub struct RebindSession {
    id: RebindId,
    handler: HandlerId,
    listener: String,
    slot: Slot,
    timeout_ticks: Option<u32>,
    state: RebindState,
    on_complete: Option<RebindCallback>,
}

impl RebindSession {
    pub(crate) fn new(id: RebindId, request: RebindRequest, timeout_ticks: Option<u32>) -> Self {
        Self {
            id,
            handler: request.handler,
            listener: request.listener,
            slot: request.slot,
            timeout_ticks,
            state: RebindState::Waiting { ticks_waited: 0 },
            on_complete: request.on_complete,
        }
    }

    pub fn id(&self) -> RebindId {
        self.id
    }

    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    pub fn listener(&self) -> &str {
        &self.listener
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn state(&self) -> &RebindState {
        &self.state
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, RebindState::Waiting { .. })
    }

    /// Look for the first held key in the full key space
    ///
    /// A key tapped and released within the tick counts as held. A capture
    /// wins over a timeout reached on the same tick. Finished sessions always
    /// report `Pending`.
    pub fn poll(&mut self, source: &dyn InputSource) -> Poll {
        let RebindState::Waiting { ticks_waited } = &mut self.state else {
            return Poll::Pending;
        };

        let captured = KeyCode::all()
            .iter()
            .find(|&&key| source.is_held(key) || source.was_pressed_this_tick(key));
        if let Some(&key) = captured {
            return Poll::Captured(key);
        }

        *ticks_waited += 1;
        match self.timeout_ticks {
            Some(limit) if *ticks_waited >= limit => Poll::TimedOut,
            _ => Poll::Pending,
        }
    }

    /// Build the abandoned outcome for this session
    pub(crate) fn abandoned(&self, reason: AbandonReason) -> RebindOutcome {
        RebindOutcome::Abandoned {
            handler: self.handler,
            listener: self.listener.clone(),
            slot: self.slot,
            reason,
        }
    }

    /// Record the outcome and run the completion callback
    pub(crate) fn finish(&mut self, outcome: &RebindOutcome) {
        self.state = match outcome {
            RebindOutcome::Applied { change, .. } => RebindState::Applied(change.clone()),
            RebindOutcome::Abandoned { reason, .. } => RebindState::Abandoned(*reason),
        };
        tracing::debug!(id = %self.id, listener = %self.listener, state = ?self.state, "Rebind finished");
        if let Some(callback) = self.on_complete.take() {
            callback(outcome);
        }
    }
}

impl fmt::Debug for RebindSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebindSession")
            .field("id", &self.id)
            .field("handler", &self.handler)
            .field("listener", &self.listener)
            .field("slot", &self.slot)
            .field("timeout_ticks", &self.timeout_ticks)
            .field("state", &self.state)
            .finish()
    }
}
