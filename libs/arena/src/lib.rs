//! Chunked slot arenas with stable handles.
//!
//! An [`Arena`] stores values in fixed-size chunks. Each chunk is allocated
//! once with its final capacity and is never grown, so appending a chunk never
//! moves values that are already stored. Every value is identified by an
//! [`Id`], a dense integer index that stays valid until the value is removed.
//! Removed indices are recycled (last removed, first reused) before fresh
//! capacity is consumed.
//!
//! Arenas publish [`ArenaEvent`]s to subscribers. [`Attribute`] layers use
//! these events to keep an index-aligned side table in sync with the arena
//! without touching the stored record type.
#![warn(missing_docs)]

mod attribute;
mod events;

#[cfg(test)]
pub(crate) mod tests;

pub use attribute::Attribute;
pub use events::{ArenaEvent, EventKind, Subscription};

use std::cell::RefCell;
use std::cmp::Ordering as CmpOrdering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use events::{dispatch, EventTable};

/// The number of slots per chunk used by [`Arena::new`].
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

const NULL_INDEX: u32 = u32::MAX;

static NEXT_ARENA_KEY: AtomicU32 = AtomicU32::new(0);

/// Identifies the arena that issued an [`Id`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct ArenaKey(u32);

impl ArenaKey {
    const NONE: Self = Self(u32::MAX);

    fn next() -> Self {
        Self(NEXT_ARENA_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// An opaque handle to a value stored in an [`Arena<T>`].
///
/// Equality, ordering and hashing only consider the index. The owning arena
/// is remembered so that layers bound to one arena can reject handles from
/// another in debug builds.
pub struct Id<T> {
    index: u32,
    owner: ArenaKey,
    marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// The null handle. It never refers to a live slot.
    pub const NULL: Self = Self {
        index: NULL_INDEX,
        owner: ArenaKey::NONE,
        marker: PhantomData,
    };

    #[inline]
    fn new(index: u32, owner: ArenaKey) -> Self {
        Self {
            index,
            owner,
            marker: PhantomData,
        }
    }

    /// The integer identity of this handle.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// The key of the arena that issued this handle.
    #[inline]
    pub fn owner(&self) -> ArenaKey {
        self.owner
    }

    /// Returns `true` if this is the null handle.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.index == NULL_INDEX
    }

    /// Converts the null handle into `None`.
    #[inline]
    pub fn into_option(self) -> Option<Self> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "Id(null)")
        } else {
            write!(f, "Id({})", self.index)
        }
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// A stored value plus its liveness flag.
#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    deleted: bool,
}

/// A chunked pool allocator with stable ids.
///
/// Invariants:
/// * every chunk is created with capacity `chunk_size` and never holds more
///   than `chunk_size` slots, so its buffer is never reallocated;
/// * `largest_id` counts every slot ever handed out and never decreases;
/// * an index is in `free` exactly when its slot is marked deleted.
pub struct Arena<T> {
    key: ArenaKey,
    chunk_size: usize,
    chunks: Vec<Vec<Slot<T>>>,
    free: Vec<u32>,
    len: usize,
    largest_id: usize,
    last_id: Option<u32>,
    events: Rc<RefCell<EventTable>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena using [`DEFAULT_CHUNK_SIZE`].
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates an empty arena whose chunks hold `chunk_size` slots each.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "arena chunk size must be positive");
        Self {
            key: ArenaKey::next(),
            chunk_size,
            chunks: Vec::new(),
            free: Vec::new(),
            len: 0,
            largest_id: 0,
            last_id: None,
            events: Rc::new(RefCell::new(EventTable::default())),
        }
    }

    /// The key identifying this arena.
    #[inline]
    pub fn key(&self) -> ArenaKey {
        self.key
    }

    /// The number of slots per chunk.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the highest index ever handed out.
    ///
    /// Never decreases, even when values are removed.
    #[inline]
    pub fn largest_id(&self) -> usize {
        self.largest_id
    }

    /// The id of the most recently created value.
    #[inline]
    pub fn last_id(&self) -> Option<Id<T>> {
        self.last_id.map(|index| Id::new(index, self.key))
    }

    /// The index the next creation will reuse, if any.
    ///
    /// Reads the same end of the free list that creation consumes from.
    #[inline]
    pub fn peek_recycled(&self) -> Option<usize> {
        self.free.last().map(|&index| index as usize)
    }

    /// The number of slots currently backed by allocated chunks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_size
    }

    /// Allocates enough chunks to hold `n` slots without further chunk
    /// allocation.
    pub fn reserve(&mut self, n: usize) {
        let needed = n.div_ceil(self.chunk_size);
        while self.chunks.len() < needed {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
        }
    }

    /// Stores `value` and returns its id.
    ///
    /// Create subscribers are notified before this returns.
    pub fn add(&mut self, value: T) -> Id<T> {
        let (index, recycled) = self.allocate(value);
        dispatch(
            &self.events,
            ArenaEvent::Created {
                index: index as usize,
                largest_id: self.largest_id,
                recycled,
            },
        );
        Id::new(index, self.key)
    }

    /// Stores `T::default()` and returns its id.
    pub fn create(&mut self) -> Id<T>
    where
        T: Default,
    {
        self.add(T::default())
    }

    fn allocate(&mut self, value: T) -> (u32, bool) {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = self.slot_mut(index as usize);
            slot.value = value;
            slot.deleted = false;
            self.last_id = Some(index);
            tracing::trace!(index, "recycled arena slot");
            return (index, true);
        }

        let index = self.largest_id;
        assert!(index < NULL_INDEX as usize, "arena index space exhausted");
        let chunk = index / self.chunk_size;
        if chunk == self.chunks.len() {
            tracing::trace!(chunk, chunk_size = self.chunk_size, "allocating arena chunk");
            self.chunks.push(Vec::with_capacity(self.chunk_size));
        }
        let slots = &mut self.chunks[chunk];
        debug_assert!(slots.len() < slots.capacity());
        slots.push(Slot {
            value,
            deleted: false,
        });
        self.largest_id += 1;
        self.last_id = Some(index as u32);
        (index as u32, false)
    }

    #[inline]
    fn slot(&self, index: usize) -> &Slot<T> {
        &self.chunks[index / self.chunk_size][index % self.chunk_size]
    }

    #[inline]
    fn slot_mut(&mut self, index: usize) -> &mut Slot<T> {
        &mut self.chunks[index / self.chunk_size][index % self.chunk_size]
    }

    /// Returns the value stored at `id`.
    ///
    /// No liveness check is made: the caller must hold an id that was issued
    /// by this arena and has not been removed.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never issued by this arena.
    #[inline]
    pub fn get(&self, id: Id<T>) -> &T {
        debug_assert!(!id.is_null(), "null arena id");
        &self.slot(id.index()).value
    }

    /// Returns the value stored at `id` mutably.
    ///
    /// Same preconditions as [`Arena::get`].
    #[inline]
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        debug_assert!(!id.is_null(), "null arena id");
        &mut self.slot_mut(id.index()).value
    }

    /// Returns the value at `id` if it is live.
    pub fn try_get(&self, id: Id<T>) -> Option<&T> {
        if self.contains(id) {
            Some(&self.slot(id.index()).value)
        } else {
            None
        }
    }

    /// Returns `true` if `id` refers to a live slot of this arena.
    pub fn contains(&self, id: Id<T>) -> bool {
        !id.is_null() && id.index() < self.largest_id && !self.slot(id.index()).deleted
    }

    /// Marks the slot at `id` deleted and queues its index for reuse.
    ///
    /// Returns `false`, without notifying anyone, if the slot is not live.
    pub fn remove(&mut self, id: Id<T>) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.slot_mut(id.index()).deleted = true;
        self.free.push(id.index);
        self.len -= 1;
        dispatch(&self.events, ArenaEvent::Removed { index: id.index() });
        true
    }

    /// Iterates over live values in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        let key = self.key;
        self.chunks
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, slot)| !slot.deleted)
            .map(move |(index, slot)| (Id::new(index as u32, key), &slot.value))
    }

    /// Iterates mutably over live values in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id<T>, &mut T)> + '_ {
        let key = self.key;
        self.chunks
            .iter_mut()
            .flatten()
            .enumerate()
            .filter(|(_, slot)| !slot.deleted)
            .map(move |(index, slot)| (Id::new(index as u32, key), &mut slot.value))
    }

    /// Iterates over the ids of live values in index order.
    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Registers `callback` for events of the given kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl FnMut(&ArenaEvent) + 'static,
    ) -> Subscription {
        self.events.borrow_mut().subscribe(kind, callback)
    }

    /// Removes a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.events.borrow_mut().unsubscribe(subscription)
    }

    /// The number of callbacks registered for `kind`.
    pub fn num_subscribers(&self, kind: EventKind) -> usize {
        self.events.borrow().num_subscribers(kind)
    }

    pub(crate) fn event_table(&self) -> &Rc<RefCell<EventTable>> {
        &self.events
    }
}

impl<T> Drop for Arena<T> {
    fn drop(&mut self) {
        dispatch(&self.events, ArenaEvent::Destroyed);
    }
}

impl<T> Index<Id<T>> for Arena<T> {
    type Output = T;

    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for Arena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}

impl<T> Debug for Arena<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("key", &self.key)
            .field("len", &self.len)
            .field("largest_id", &self.largest_id)
            .field("chunks", &self.chunks.len())
            .field("free", &self.free.len())
            .field("events", &*self.events.borrow())
            .finish()
    }
}
