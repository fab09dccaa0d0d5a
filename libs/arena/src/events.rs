//! Per-arena event dispatch.
//!
//! Every [`Arena`](crate::Arena) owns an [`EventTable`] holding one list of
//! callbacks per [`EventKind`]. Callbacks run synchronously, in registration
//! order, from inside the mutation that triggered them.

use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// The kinds of events an arena emits.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum EventKind {
    /// A slot became live.
    Create,
    /// A slot was removed and its id queued for reuse.
    Remove,
    /// The arena is being dropped.
    Destroy,
}

impl EventKind {
    const COUNT: usize = 3;

    #[inline]
    fn slot(self) -> usize {
        match self {
            Self::Create => 0,
            Self::Remove => 1,
            Self::Destroy => 2,
        }
    }
}

/// An event delivered to arena subscribers.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum ArenaEvent {
    /// The slot at `index` became live.
    Created {
        /// The index of the new slot.
        index: usize,
        /// The arena's [`largest_id`](crate::Arena::largest_id) after the creation.
        largest_id: usize,
        /// Whether `index` was taken from the free list.
        recycled: bool,
    },
    /// The slot at `index` was removed.
    Removed {
        /// The index of the removed slot.
        index: usize,
    },
    /// The arena is being dropped.
    Destroyed,
}

impl ArenaEvent {
    /// Returns the kind of this event.
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Created { .. } => EventKind::Create,
            Self::Removed { .. } => EventKind::Remove,
            Self::Destroyed => EventKind::Destroy,
        }
    }
}

/// A token identifying a registered callback.
///
/// Pass it back to [`Arena::unsubscribe`](crate::Arena::unsubscribe) to
/// remove the callback.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct Subscription {
    kind: EventKind,
    key: u64,
}

impl Subscription {
    /// The event kind this subscription listens to.
    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

type Callback = Rc<RefCell<dyn FnMut(&ArenaEvent)>>;

#[derive(Default)]
pub(crate) struct EventTable {
    next_key: u64,
    lists: [Vec<(u64, Callback)>; EventKind::COUNT],
}

impl Debug for EventTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTable")
            .field("create", &self.lists[0].len())
            .field("remove", &self.lists[1].len())
            .field("destroy", &self.lists[2].len())
            .finish()
    }
}

impl EventTable {
    pub(crate) fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&ArenaEvent) + 'static,
    ) -> Subscription {
        let key = self.next_key;
        self.next_key += 1;
        self.lists[kind.slot()].push((key, Rc::new(RefCell::new(callback))));
        Subscription { kind, key }
    }

    pub(crate) fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let list = &mut self.lists[subscription.kind.slot()];
        match list.iter().position(|(key, _)| *key == subscription.key) {
            Some(pos) => {
                // `remove` keeps the remaining callbacks in registration order.
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn num_subscribers(&self, kind: EventKind) -> usize {
        self.lists[kind.slot()].len()
    }
}

/// Delivers `event` to every callback registered for its kind.
///
/// The callback list is snapshotted first, so callbacks may subscribe or
/// unsubscribe while the event is being delivered. Changes take effect on the
/// next event.
pub(crate) fn dispatch(table: &RefCell<EventTable>, event: ArenaEvent) {
    let callbacks: Vec<Callback> = {
        let table = table.borrow();
        let list = &table.lists[event.kind().slot()];
        if list.is_empty() {
            return;
        }
        list.iter().map(|(_, callback)| callback.clone()).collect()
    };
    for callback in callbacks {
        (callback.borrow_mut())(&event);
    }
}
