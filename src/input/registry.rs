//! Registry of known handlers, keyed by name

use std::collections::HashMap;
use std::fmt;

use super::error::EngineError;
use super::handler::Handler;
use super::store::BindingStore;

/// Handle to a handler owned by the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u32);

impl HandlerId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns every attached handler; each name appears at most once
#[derive(Debug, Default)]
pub struct Registry {
    handlers: HashMap<HandlerId, Handler>,
    by_name: HashMap<String, HandlerId>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, running its `init` against the store
    ///
    /// Fails without touching the handler if the name is already taken.
    pub fn attach(
        &mut self,
        mut handler: Handler,
        store: &dyn BindingStore,
    ) -> Result<HandlerId, EngineError> {
        if self.by_name.contains_key(handler.name()) {
            tracing::warn!(handler = handler.name(), "Rejected duplicate handler registration");
            return Err(EngineError::DuplicateHandler(handler.name().to_string()));
        }

        handler.init(store);

        self.next_id += 1;
        let id = HandlerId::new(self.next_id);
        self.by_name.insert(handler.name().to_string(), id);
        tracing::debug!(handler = handler.name(), %id, "Handler attached");
        self.handlers.insert(id, handler);
        Ok(id)
    }

    /// Remove a handler and hand it back to the caller
    pub fn detach(&mut self, id: HandlerId) -> Option<Handler> {
        let handler = self.handlers.remove(&id)?;
        self.by_name.remove(handler.name());
        tracing::debug!(handler = handler.name(), %id, "Handler detached");
        Some(handler)
    }

    pub fn lookup(&self, name: &str) -> Option<HandlerId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: HandlerId) -> Option<&Handler> {
        self.handlers.get(&id)
    }

    pub fn get_mut(&mut self, id: HandlerId) -> Option<&mut Handler> {
        self.handlers.get_mut(&id)
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered handler names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::handler::HandlerDef;
    use crate::input::store::NullBindingStore;
    use crate::input::types::KeyCode;

    fn handler(name: &str) -> Handler {
        Handler::new(HandlerDef::new(name).just_pressed("Go", KeyCode::Enter))
    }

    #[test]
    fn test_attach_initializes_and_stores() {
        let mut registry = Registry::new();
        let id = registry.attach(handler("Menu"), &NullBindingStore).unwrap();

        assert_eq!(registry.lookup("Menu"), Some(id));
        assert!(registry.get(id).unwrap().is_initialized());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = Registry::new();
        let first = registry.attach(handler("Menu"), &NullBindingStore).unwrap();
        let err = registry
            .attach(handler("Menu"), &NullBindingStore)
            .unwrap_err();

        assert_eq!(err, EngineError::DuplicateHandler("Menu".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("Menu"), Some(first));
    }

    #[test]
    fn test_lookup_unknown_returns_none() {
        let registry = Registry::new();
        assert_eq!(registry.lookup("Ghost"), None);
    }

    #[test]
    fn test_detach_frees_name() {
        let mut registry = Registry::new();
        let id = registry.attach(handler("Menu"), &NullBindingStore).unwrap();

        let detached = registry.detach(id).unwrap();
        assert_eq!(detached.name(), "Menu");
        assert!(registry.lookup("Menu").is_none());
        assert!(registry.detach(id).is_none());

        let again = registry.attach(handler("Menu"), &NullBindingStore).unwrap();
        assert_ne!(again, id);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = Registry::new();
        registry.attach(handler("Chat"), &NullBindingStore).unwrap();
        registry.attach(handler("Acrobatics"), &NullBindingStore).unwrap();
        assert_eq!(registry.names(), vec!["Acrobatics", "Chat"]);
    }
}
