//! Stack of active handlers, most recently pushed on top

use super::registry::HandlerId;

/// Ordered collection of active handler handles
///
/// The stack does not own handlers. The same handler may be pushed more
/// than once; removal takes out every occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerStack {
    /// Base first, top last
    entries: Vec<HandlerId>,
}

impl HandlerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: HandlerId) {
        self.entries.push(id);
    }

    pub fn pop(&mut self) -> Option<HandlerId> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<HandlerId> {
        self.entries.last().copied()
    }

    /// Splice out every occurrence of `id`, keeping the order of the rest
    ///
    /// Returns how many entries were removed.
    pub fn remove(&mut self, id: HandlerId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != id);
        before - self.entries.len()
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.entries.contains(&id)
    }

    /// Dispatch order: top to base
    pub fn iter_top_down(&self) -> impl Iterator<Item = HandlerId> + '_ {
        self.entries.iter().rev().copied()
    }

    /// Entries base first
    pub fn as_slice(&self) -> &[HandlerId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> HandlerId {
        HandlerId::new(n)
    }

    #[test]
    fn test_lifo() {
        let mut stack = HandlerStack::new();
        stack.push(id(1));
        stack.push(id(2));
        stack.push(id(3));

        assert_eq!(stack.top(), Some(id(3)));
        assert_eq!(stack.pop(), Some(id(3)));
        assert_eq!(stack.top(), Some(id(2)));
    }

    #[test]
    fn test_pop_empty_is_noop() {
        let mut stack = HandlerStack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.top(), None);
        assert_eq!(stack.remove(id(1)), 0);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut stack = HandlerStack::new();
        for n in 1..=4 {
            stack.push(id(n));
        }
        assert_eq!(stack.remove(id(2)), 1);
        assert_eq!(stack.as_slice(), &[id(1), id(3), id(4)]);
        assert_eq!(stack.top(), Some(id(4)));
    }

    #[test]
    fn test_remove_takes_every_duplicate() {
        let mut stack = HandlerStack::new();
        stack.push(id(1));
        stack.push(id(2));
        stack.push(id(1));

        assert_eq!(stack.remove(id(1)), 2);
        assert_eq!(stack.as_slice(), &[id(2)]);
    }

    #[test]
    fn test_iter_top_down() {
        let mut stack = HandlerStack::new();
        stack.push(id(1));
        stack.push(id(2));
        assert_eq!(stack.iter_top_down().collect::<Vec<_>>(), vec![id(2), id(1)]);
    }
}
