//! Side tables indexed by arena ids.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::events::EventTable;
use crate::{Arena, ArenaEvent, ArenaKey, EventKind, Id, Subscription};

struct Store<V> {
    data: Vec<V>,
    default: V,
    attached: bool,
}

impl<V: Clone> Store<V> {
    fn accommodate(&mut self, len: usize) {
        if self.data.len() < len {
            self.data.resize(len, self.default.clone());
        }
    }
}

/// Auxiliary data of type `V` for every slot of an [`Arena<T>`].
///
/// The layer subscribes to its arena on construction:
/// * creations grow the table to the arena's `largest_id`, filled with the
///   default value, before the creating call returns;
/// * a recycled index is reset to the default, so a new value never sees
///   data left behind by the previous occupant;
/// * destruction of the arena detaches the layer, which keeps its data but
///   no longer touches the arena.
///
/// Cloning a layer copies its data and registers fresh callbacks for the
/// copy, so the two layers evolve independently.
///
/// Reads and writes go through [`Ref`]/[`RefMut`] guards. Guards must be
/// released before the arena is mutated again.
pub struct Attribute<T, V> {
    store: Rc<RefCell<Store<V>>>,
    table: Weak<RefCell<EventTable>>,
    owner: ArenaKey,
    subscriptions: Vec<Subscription>,
    marker: PhantomData<fn() -> T>,
}

impl<T, V: Clone + Default + 'static> Attribute<T, V> {
    /// Creates a layer over `arena` whose entries default to `V::default()`.
    pub fn new(arena: &Arena<T>) -> Self {
        Self::with_default(arena, V::default())
    }
}

impl<T, V: Clone + 'static> Attribute<T, V> {
    /// Creates a layer over `arena` whose entries default to `default`.
    pub fn with_default(arena: &Arena<T>, default: V) -> Self {
        let mut store = Store {
            data: Vec::new(),
            default,
            attached: true,
        };
        store.accommodate(arena.largest_id());
        let store = Rc::new(RefCell::new(store));
        let table = Rc::downgrade(arena.event_table());
        let subscriptions = Self::subscribe(arena.event_table(), &store);
        Self {
            store,
            table,
            owner: arena.key(),
            subscriptions,
            marker: PhantomData,
        }
    }

    fn subscribe(
        table: &Rc<RefCell<EventTable>>,
        store: &Rc<RefCell<Store<V>>>,
    ) -> Vec<Subscription> {
        let mut table = table.borrow_mut();
        let on_create = Rc::downgrade(store);
        let on_destroy = Rc::downgrade(store);
        vec![
            table.subscribe(EventKind::Create, move |event| {
                let Some(store) = on_create.upgrade() else {
                    return;
                };
                if let ArenaEvent::Created {
                    index,
                    largest_id,
                    recycled,
                } = *event
                {
                    let mut store = store.borrow_mut();
                    store.accommodate(largest_id);
                    if recycled {
                        let default = store.default.clone();
                        store.data[index] = default;
                    }
                }
            }),
            table.subscribe(EventKind::Destroy, move |_| {
                if let Some(store) = on_destroy.upgrade() {
                    store.borrow_mut().attached = false;
                }
            }),
        ]
    }

    /// Returns a copy of the entry for `id`.
    pub fn value(&self, id: Id<T>) -> V {
        self.get(id).clone()
    }

    /// Overwrites the entry for `id`.
    pub fn set(&mut self, id: Id<T>, value: V) {
        *self.get_mut(id) = value;
    }

    /// Returns a copy of the default value.
    pub fn default_value(&self) -> V {
        self.store.borrow().default.clone()
    }
}

impl<T, V> Attribute<T, V> {
    #[inline]
    fn check(&self, id: Id<T>) {
        debug_assert!(!id.is_null(), "null id used to index an attribute");
        debug_assert_eq!(
            id.owner(),
            self.owner,
            "id from a different arena used to index an attribute"
        );
    }

    /// Borrows the entry for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by the bound arena.
    pub fn get(&self, id: Id<T>) -> Ref<'_, V> {
        self.check(id);
        Ref::map(self.store.borrow(), |store| &store.data[id.index()])
    }

    /// Mutably borrows the entry for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by the bound arena.
    pub fn get_mut(&mut self, id: Id<T>) -> RefMut<'_, V> {
        self.check(id);
        RefMut::map(self.store.borrow_mut(), |store| &mut store.data[id.index()])
    }

    /// The number of entries currently backed by storage.
    pub fn len(&self) -> usize {
        self.store.borrow().data.len()
    }

    /// Returns `true` if no entries are backed by storage.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `false` once the bound arena has been dropped.
    pub fn is_attached(&self) -> bool {
        self.store.borrow().attached
    }
}

impl<T, V: Clone + 'static> Clone for Attribute<T, V> {
    fn clone(&self) -> Self {
        let source = self.store.borrow();
        let store = Rc::new(RefCell::new(Store {
            data: source.data.clone(),
            default: source.default.clone(),
            attached: source.attached,
        }));
        let subscriptions = match self.table.upgrade() {
            Some(table) if source.attached => Self::subscribe(&table, &store),
            _ => Vec::new(),
        };
        Self {
            store,
            table: self.table.clone(),
            owner: self.owner,
            subscriptions,
            marker: PhantomData,
        }
    }
}

impl<T, V> Drop for Attribute<T, V> {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            let mut table = table.borrow_mut();
            for subscription in self.subscriptions.drain(..) {
                table.unsubscribe(subscription);
            }
        }
    }
}

impl<T, V: Debug> Debug for Attribute<T, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let store = self.store.borrow();
        f.debug_struct("Attribute")
            .field("owner", &self.owner)
            .field("attached", &store.attached)
            .field("default", &store.default)
            .field("data", &store.data)
            .finish()
    }
}
