//! Engine errors

use thiserror::Error;

use super::registry::HandlerId;
use super::types::{KeyCode, Phase};

/// Errors returned by engine operations
///
/// Lookups that can simply miss return `Option` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("a handler named '{0}' is already registered")]
    DuplicateHandler(String),
    #[error("no handler {0} is registered")]
    UnknownHandler(HandlerId),
    #[error("handler '{handler}' has no listener named '{listener}'")]
    UnknownListener { handler: String, listener: String },
    #[error("key '{key}' is already bound to '{taken_by}' in handler '{handler}' ({phase})")]
    KeyInUse {
        handler: String,
        phase: Phase,
        key: KeyCode,
        taken_by: String,
    },
}
