//! Notifications about structural changes to a design.
//!
//! Observers are registered with [`Design::register_observer`] and are
//! called synchronously from inside the mutation that triggered them. They
//! receive a shared reference to the design and therefore cannot mutate it.

use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::{Design, InstanceId, LibraryCellId, NetId, PinId};

/// The structural events a design reports.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum DesignEvent {
    /// The design is being dropped.
    Destruction,
    /// An instance was created.
    PostInstanceCreate,
    /// An instance is about to be removed.
    PreInstanceRemove,
    /// A net was created.
    PostNetCreate,
    /// A net is about to be removed.
    PreNetRemove,
    /// A cell was bound to a different library cell.
    PostCellRemap,
    /// A pin was connected to a net.
    PostPinConnect,
    /// A pin is about to be disconnected.
    PrePinDisconnect,
    /// An instance was moved by a physical-design tool.
    PostInstanceMove,
}

impl DesignEvent {
    /// Every event kind.
    pub const ALL: [DesignEvent; 9] = [
        Self::Destruction,
        Self::PostInstanceCreate,
        Self::PreInstanceRemove,
        Self::PostNetCreate,
        Self::PreNetRemove,
        Self::PostCellRemap,
        Self::PostPinConnect,
        Self::PrePinDisconnect,
        Self::PostInstanceMove,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Receives design events.
///
/// Every method defaults to doing nothing. An observer is only called for
/// the events listed by [`interests`](DesignObserver::interests).
#[allow(unused_variables)]
pub trait DesignObserver {
    /// The events this observer wants to receive.
    fn interests(&self) -> &[DesignEvent] {
        &DesignEvent::ALL
    }

    /// Called when the design is dropped.
    fn on_design_destruction(&mut self) {}

    /// Called after `instance` was created.
    fn on_post_instance_create(&mut self, design: &Design, instance: InstanceId) {}

    /// Called before `instance` is removed.
    fn on_pre_instance_remove(&mut self, design: &Design, instance: InstanceId) {}

    /// Called after `net` was created.
    fn on_post_net_create(&mut self, design: &Design, net: NetId) {}

    /// Called before `net` is removed.
    fn on_pre_net_remove(&mut self, design: &Design, net: NetId) {}

    /// Called after `cell` was remapped away from `old`.
    fn on_post_cell_remap(&mut self, design: &Design, cell: InstanceId, old: LibraryCellId) {}

    /// Called after `pin` was connected.
    fn on_post_pin_connect(&mut self, design: &Design, pin: PinId) {}

    /// Called before `pin` is disconnected.
    fn on_pre_pin_disconnect(&mut self, design: &Design, pin: PinId) {}

    /// Called after `instance` was moved.
    fn on_post_instance_move(&mut self, design: &Design, instance: InstanceId) {}
}

/// A token identifying a registered observer.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct ObserverKey(u64);

pub(crate) type SharedObserver = Rc<RefCell<dyn DesignObserver>>;

#[derive(Default)]
pub(crate) struct ObserverTable {
    next_key: u64,
    lists: [Vec<(ObserverKey, SharedObserver)>; DesignEvent::ALL.len()],
}

impl Debug for ObserverTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                DesignEvent::ALL
                    .iter()
                    .map(|event| (event, self.lists[event.slot()].len())),
            )
            .finish()
    }
}

impl ObserverTable {
    fn register(&mut self, observer: SharedObserver) -> ObserverKey {
        let key = ObserverKey(self.next_key);
        self.next_key += 1;
        let interests = observer.borrow().interests().to_vec();
        for event in interests {
            let list = &mut self.lists[event.slot()];
            if !list.iter().any(|(k, _)| *k == key) {
                list.push((key, observer.clone()));
            }
        }
        key
    }

    fn unregister(&mut self, key: ObserverKey) -> bool {
        let mut found = false;
        for list in self.lists.iter_mut() {
            let len = list.len();
            list.retain(|(k, _)| *k != key);
            found |= list.len() != len;
        }
        found
    }

    pub(crate) fn snapshot(&self, event: DesignEvent) -> Vec<SharedObserver> {
        self.lists[event.slot()]
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect()
    }

    fn snapshot_except(&self, event: DesignEvent, ignore: Option<ObserverKey>) -> Vec<SharedObserver> {
        self.lists[event.slot()]
            .iter()
            .filter(|(key, _)| Some(*key) != ignore)
            .map(|(_, observer)| observer.clone())
            .collect()
    }
}

impl Design {
    /// Registers `observer` for the events it is interested in.
    ///
    /// Observers of the same event are called in registration order.
    pub fn register_observer<O: DesignObserver + 'static>(
        &mut self,
        observer: Rc<RefCell<O>>,
    ) -> ObserverKey {
        self.observers.register(observer)
    }

    /// Unregisters an observer. Returns `false` if it was not registered.
    pub fn unregister_observer(&mut self, key: ObserverKey) -> bool {
        self.observers.unregister(key)
    }

    /// Reports that `instance` was moved, to every interested observer except
    /// `ignore`.
    pub fn notify_instance_moved(&self, instance: InstanceId, ignore: Option<ObserverKey>) {
        for observer in self
            .observers
            .snapshot_except(DesignEvent::PostInstanceMove, ignore)
        {
            observer.borrow_mut().on_post_instance_move(self, instance);
        }
    }

    pub(crate) fn notify(
        &self,
        event: DesignEvent,
        mut f: impl FnMut(&mut (dyn DesignObserver + 'static), &Design),
    ) {
        for observer in self.observers.snapshot(event) {
            f(&mut *observer.borrow_mut(), self);
        }
    }
}
