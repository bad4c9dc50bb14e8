//! IdentityMap: weak-keyed structural layer with stable handles.
//!
//! Keys are `Weak<T>` compared by allocation address; `T` itself is never
//! hashed or compared. Holding the `Weak` keeps the allocation (not the
//! value) reserved, so an address cannot be reused by a new owner while a
//! stale entry for it is still present.

use core::hash::BuildHasher;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;
use std::sync::{Arc, Weak};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn value<'a, T, V, S>(&self, map: &'a IdentityMap<T, V, S>) -> Option<&'a V>
    where
        T: ?Sized,
        S: BuildHasher,
    {
        map.handle_value(*self)
    }
}

struct Entry<T: ?Sized, V> {
    key: Weak<T>,
    addr: usize,
    hash: u64,
    value: V,
}

pub struct IdentityMap<T: ?Sized, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<T, V>>, // storage using generational keys
}

/// Address of the allocation behind `owner`, with any metadata stripped.
#[inline]
pub(crate) fn addr_of<T: ?Sized>(owner: &Arc<T>) -> usize {
    Arc::as_ptr(owner).cast::<()>() as usize
}

#[cfg(any(test, feature = "bench_internal"))]
impl<T: ?Sized, V> IdentityMap<T, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

#[cfg(any(test, feature = "bench_internal"))]
impl<T: ?Sized, V> Default for IdentityMap<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, V, S> IdentityMap<T, V, S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            index: HashTable::new(),
            hasher,
            slots: SlotMap::with_key(),
        }
    }

    fn make_hash(&self, addr: usize) -> u64 {
        self.hasher.hash_one(addr)
    }

    /// Number of stored entries, including ones whose owner is already gone.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn find(&self, owner: &Arc<T>) -> Option<Handle> {
        let addr = addr_of(owner);
        let hash = self.make_hash(addr);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.addr == addr)
                    .unwrap_or(false)
            })
            .map(|&k| Handle::new(k))
    }

    pub fn contains(&self, owner: &Arc<T>) -> bool {
        self.find(owner).is_some()
    }

    /// Store `value` for `owner`, returning the value it replaced.
    ///
    /// The existing weak key is kept on overwrite; its address is the owner's.
    pub fn insert(&mut self, owner: &Arc<T>, value: V) -> (Handle, Option<V>) {
        let addr = addr_of(owner);
        let hash = self.make_hash(addr);
        match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|e| e.addr == addr).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                let previous = self
                    .slots
                    .get_mut(k)
                    .map(|e| core::mem::replace(&mut e.value, value));
                (Handle::new(k), previous)
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let entry = Entry {
                    key: Arc::downgrade(owner),
                    addr,
                    hash,
                    value,
                };
                let k = self.slots.insert(entry);
                let _ = v.insert(k);
                (Handle::new(k), None)
            }
        }
    }

    pub fn remove(&mut self, handle: Handle) -> Option<V> {
        let k = handle.raw_handle();

        let entry = self.slots.remove(k)?;

        // Unlink from index via occupied entry removal
        if let Ok(o) = self.index.find_entry(entry.hash, |&kk| kk == k) {
            o.remove();
        }

        Some(entry.value)
    }

    /// Remove every entry whose owner has been reclaimed or whose value
    /// fails `keep`. Removed values are handed back so the caller decides
    /// where they are dropped.
    pub fn retain_live<F>(&mut self, mut keep: F) -> Vec<V>
    where
        F: FnMut(&V) -> bool,
    {
        let dead: Vec<DefaultKey> = self
            .slots
            .iter()
            .filter(|(_, e)| e.key.strong_count() == 0 || !keep(&e.value))
            .map(|(k, _)| k)
            .collect();
        dead.into_iter()
            .filter_map(|k| self.remove(Handle::new(k)))
            .collect()
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        self.slots.get(h.raw_handle()).map(|e| &e.value)
    }
}
