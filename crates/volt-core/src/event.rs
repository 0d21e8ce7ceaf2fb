// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node listener records.
//!
//! Collaborators observe value transitions by registering callbacks per
//! [`EventKind`]. Callbacks for a kind run in registration order.

use core::fmt;

use crate::value::LogicValue;

/// Kind of node event a listener subscribes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The committed value changed (or was cleared by a reset).
    Change,
    /// The node was reset to HI-Z.
    Reset,
}

/// Payload delivered to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeEvent<'a> {
    /// The node committed `value`; `downstream` names the distinct nodes its
    /// edges feed, in edge insertion order.
    Change {
        /// Newly committed value.
        value: LogicValue,
        /// Names of the downstream nodes notified by this commit.
        downstream: &'a [String],
    },
    /// The node dropped back to HI-Z during a circuit-wide reset.
    Reset,
}

impl NodeEvent<'_> {
    /// Returns the kind this payload is dispatched under.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Change { .. } => EventKind::Change,
            Self::Reset => EventKind::Reset,
        }
    }
}

/// Handle returned by [`crate::LogicNode::on`], used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u32);

type Callback = Box<dyn FnMut(&NodeEvent<'_>)>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    callback: Callback,
}

/// Registration-ordered listener list.
#[derive(Default)]
pub(crate) struct Listeners {
    next: u32,
    entries: Vec<Listener>,
}

impl Listeners {
    pub(crate) fn push(&mut self, kind: EventKind, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next);
        self.next = self.next.wrapping_add(1);
        self.entries.push(Listener { id, kind, callback });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| l.id != id);
        before != self.entries.len()
    }

    pub(crate) fn emit(&mut self, event: &NodeEvent<'_>) {
        let kind = event.kind();
        for listener in self.entries.iter_mut().filter(|l| l.kind == kind) {
            (listener.callback)(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_fire_in_registration_order_per_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            listeners.push(
                EventKind::Change,
                Box::new(move |_: &NodeEvent<'_>| log.borrow_mut().push(tag)),
            );
        }
        let reset_log = Rc::clone(&log);
        listeners.push(
            EventKind::Reset,
            Box::new(move |_: &NodeEvent<'_>| reset_log.borrow_mut().push("reset")),
        );

        listeners.emit(&NodeEvent::Change {
            value: LogicValue::True,
            downstream: &[],
        });
        assert_eq!(*log.borrow(), ["first", "second"]);

        listeners.emit(&NodeEvent::Reset);
        assert_eq!(*log.borrow(), ["first", "second", "reset"]);
    }

    #[test]
    fn removed_listener_stops_firing() {
        let hits = Rc::new(RefCell::new(0_u32));
        let mut listeners = Listeners::default();
        let counter = Rc::clone(&hits);
        let id = listeners.push(
            EventKind::Reset,
            Box::new(move |_: &NodeEvent<'_>| *counter.borrow_mut() += 1),
        );
        listeners.emit(&NodeEvent::Reset);
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.emit(&NodeEvent::Reset);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(listeners.len(), 0);
    }
}
