//! Per-tick dispatch over the handler stack
//!
//! Routing a `(key, phase)` event yields the ordered listeners that receive
//! it. Dispatch invokes that route for every active key; the "is this
//! listener triggered" query checks membership in the same route.

use super::registry::{HandlerId, Registry};
use super::source::InputSource;
use super::stack::HandlerStack;
use super::types::{KeyCode, Phase};

/// One stop of a route: a handler and the index of its matching listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteHit {
    pub handler: HandlerId,
    pub listener: usize,
}

/// Listeners that receive `key` in `phase`, in invocation order
///
/// A hard-blocking top handler is the only one consulted. Otherwise the
/// walk goes top to base and stops after a match on a blocking handler.
pub fn route(stack: &HandlerStack, registry: &Registry, key: KeyCode, phase: Phase) -> Vec<RouteHit> {
    let mut hits = Vec::new();

    let Some(top_id) = stack.top() else {
        return hits;
    };
    let Some(top) = registry.get(top_id) else {
        return hits;
    };

    if top.policy().hard_block_keys {
        if let Some(listener) = top.listener_index(phase, key) {
            hits.push(RouteHit {
                handler: top_id,
                listener,
            });
        }
        return hits;
    }

    for id in stack.iter_top_down() {
        let Some(handler) = registry.get(id) else {
            continue;
        };
        if let Some(listener) = handler.listener_index(phase, key) {
            hits.push(RouteHit {
                handler: id,
                listener,
            });
            if handler.policy().block_keys {
                break;
            }
        }
    }

    hits
}

/// Run one tick of dispatch and return how many listeners were invoked
///
/// `keys` is the set of keys referenced by handlers on the stack. Every
/// listener of a stacked handler has its tick flag cleared afterwards.
pub fn dispatch(
    stack: &HandlerStack,
    registry: &mut Registry,
    keys: &[KeyCode],
    source: &dyn InputSource,
) -> usize {
    let mut invoked = 0;

    for phase in Phase::ALL {
        for &key in keys {
            if !source.is_active(key, phase) {
                continue;
            }
            for hit in route(stack, registry, key, phase) {
                let Some(handler) = registry.get_mut(hit.handler) else {
                    continue;
                };
                if handler.invoke(hit.listener) {
                    tracing::trace!(handler = handler.name(), %key, %phase, "Listener invoked");
                    invoked += 1;
                }
            }
        }
    }

    for id in stack.iter_top_down() {
        if let Some(handler) = registry.get_mut(id) {
            handler.clear_tick_flags();
        }
    }

    invoked
}

/// Whether the named listener of `handler` receives an event this tick
pub fn is_triggered(
    stack: &HandlerStack,
    registry: &Registry,
    handler: HandlerId,
    listener: &str,
    phase: Phase,
    source: &dyn InputSource,
) -> bool {
    let Some(owner) = registry.get(handler) else {
        return false;
    };
    let Some(target) = owner.position_in(phase, listener) else {
        return false;
    };
    let keys: Vec<KeyCode> = owner
        .listener_in(phase, listener)
        .map(|l| l.keys().collect())
        .unwrap_or_default();

    keys.into_iter()
        .filter(|&key| source.is_active(key, phase))
        .any(|key| {
            route(stack, registry, key, phase)
                .iter()
                .any(|hit| hit.handler == handler && hit.listener == target)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::handler::{Handler, HandlerDef, HandlerPolicy};
    use crate::input::source::InputState;
    use crate::input::store::NullBindingStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn attach(registry: &mut Registry, name: &'static str, policy: HandlerPolicy, log: &Log) -> HandlerId {
        let def = HandlerDef::new(name).policy(policy).held("Act", KeyCode::Char('k'));
        let id = registry.attach(Handler::new(def), &NullBindingStore).unwrap();
        let log = log.clone();
        registry
            .get_mut(id)
            .unwrap()
            .add_callback(Phase::Held, "Act", move || log.borrow_mut().push(name));
        id
    }

    fn held_k() -> InputState {
        let mut input = InputState::new();
        input.press(KeyCode::Char('k'));
        input
    }

    #[test]
    fn test_route_empty_stack() {
        let registry = Registry::new();
        let stack = HandlerStack::new();
        assert!(route(&stack, &registry, KeyCode::Enter, Phase::Held).is_empty());
    }

    #[test]
    fn test_blocking_top_stops_walk() {
        let log = Log::default();
        let mut registry = Registry::new();
        let mut stack = HandlerStack::new();
        stack.push(attach(&mut registry, "B", HandlerPolicy::default(), &log));
        stack.push(attach(&mut registry, "A", HandlerPolicy::default(), &log));

        let invoked = dispatch(&stack, &mut registry, &[KeyCode::Char('k')], &held_k());
        assert_eq!(invoked, 1);
        assert_eq!(*log.borrow(), vec!["A"]);
    }

    #[test]
    fn test_non_blocking_top_passes_through() {
        let log = Log::default();
        let mut registry = Registry::new();
        let mut stack = HandlerStack::new();
        let pass = HandlerPolicy {
            block_keys: false,
            ..HandlerPolicy::default()
        };
        stack.push(attach(&mut registry, "B", HandlerPolicy::default(), &log));
        stack.push(attach(&mut registry, "A", pass, &log));

        dispatch(&stack, &mut registry, &[KeyCode::Char('k')], &held_k());
        assert_eq!(*log.borrow(), vec!["A", "B"]);
    }

    #[test]
    fn test_hard_block_without_match_consults_nobody() {
        let log = Log::default();
        let mut registry = Registry::new();
        let mut stack = HandlerStack::new();
        stack.push(attach(&mut registry, "B", HandlerPolicy::default(), &log));

        let modal = HandlerDef::new("Modal").policy(HandlerPolicy {
            hard_block_keys: true,
            block_keys: false,
            ..HandlerPolicy::default()
        });
        stack.push(registry.attach(Handler::new(modal), &NullBindingStore).unwrap());

        let hits = route(&stack, &registry, KeyCode::Char('k'), Phase::Held);
        assert!(hits.is_empty());
        dispatch(&stack, &mut registry, &[KeyCode::Char('k')], &held_k());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_listener_without_callbacks_still_blocks() {
        let log = Log::default();
        let mut registry = Registry::new();
        let mut stack = HandlerStack::new();
        stack.push(attach(&mut registry, "B", HandlerPolicy::default(), &log));

        let silent = HandlerDef::new("Silent").held("Act", KeyCode::Char('k'));
        stack.push(registry.attach(Handler::new(silent), &NullBindingStore).unwrap());

        let invoked = dispatch(&stack, &mut registry, &[KeyCode::Char('k')], &held_k());
        assert_eq!(invoked, 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_is_triggered_respects_blocking() {
        let log = Log::default();
        let mut registry = Registry::new();
        let mut stack = HandlerStack::new();
        let lower = attach(&mut registry, "B", HandlerPolicy::default(), &log);
        let upper = attach(&mut registry, "A", HandlerPolicy::default(), &log);
        stack.push(lower);
        stack.push(upper);

        let input = held_k();
        assert!(is_triggered(&stack, &registry, upper, "Act", Phase::Held, &input));
        assert!(!is_triggered(&stack, &registry, lower, "Act", Phase::Held, &input));
        assert!(!is_triggered(&stack, &registry, upper, "Act", Phase::JustReleased, &input));
        assert!(!is_triggered(&stack, &registry, upper, "Missing", Phase::Held, &input));
    }

    #[test]
    fn test_stale_ids_are_skipped() {
        let log = Log::default();
        let mut registry = Registry::new();
        let mut stack = HandlerStack::new();
        let b = attach(&mut registry, "B", HandlerPolicy::default(), &log);
        stack.push(b);
        stack.push(HandlerId::new(99));

        // Unknown top: nothing routes
        assert!(route(&stack, &registry, KeyCode::Char('k'), Phase::Held).is_empty());
    }
}
