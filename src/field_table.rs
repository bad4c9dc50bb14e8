//! FieldTable: the per-(owner type, field name) side table.
//!
//! Every operation resolves the owner, takes the table's one lock for its
//! whole read-then-maybe-write, and releases it before any value that left
//! the map is dropped.

use crate::error::{Error, Result};
use crate::identity_map::IdentityMap;
use crate::owner::Owner;
use crate::reentrancy::DebugReentrancy;
use crate::slot::{Slot, Strong, WeakSlot};
use core::fmt;
use core::hash::BuildHasher;
use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::sync::Arc;

/// Entries whose owner is gone are swept once this many operations have
/// run since the last sweep, or once an insert grows the map to this size.
/// After each sweep the threshold becomes twice the live size, never less
/// than this floor.
pub const MIN_SWEEP_THRESHOLD: usize = 32;

/// Strong-value field: stored values live as long as their owner's entry.
pub type Augment<T, F> = FieldTable<T, Strong<F>>;

/// Weak-value field: stored values live only while referenced elsewhere.
pub type WeakAugment<T, F> = FieldTable<T, WeakSlot<F>>;

struct Inner<T: ?Sized, S, H> {
    name: Arc<str>,
    map: IdentityMap<T, S, H>,
    sweep_at: usize,
    ops: usize,
}

impl<T, S, H> Inner<T, S, H>
where
    T: ?Sized,
    S: Slot,
    H: BuildHasher,
{
    /// Count one operation; sweep when enough have run since the last sweep.
    fn tick(&mut self, garbage: &mut Vec<S>) {
        self.ops += 1;
        if self.ops >= self.sweep_at {
            self.sweep(garbage);
        }
    }

    fn read(&mut self, owner: &Arc<T>, garbage: &mut Vec<S>) -> Option<S::Value> {
        let h = self.map.find(owner)?;
        let value = h.value(&self.map).and_then(S::load);
        if value.is_none() {
            // Value reclaimed since the last access.
            if let Some(stale) = self.map.remove(h) {
                tracing::trace!(field = %self.name, "purged reclaimed value");
                garbage.push(stale);
            }
        }
        value
    }

    fn write(&mut self, owner: &Arc<T>, value: &S::Value, garbage: &mut Vec<S>) {
        if self.map.len() >= self.sweep_at && !self.map.contains(owner) {
            self.sweep(garbage);
        }
        let (_, previous) = self.map.insert(owner, S::store(value));
        garbage.extend(previous);
    }

    fn remove(&mut self, owner: &Arc<T>, garbage: &mut Vec<S>) {
        if let Some(h) = self.map.find(owner) {
            garbage.extend(self.map.remove(h));
        }
    }

    fn sweep(&mut self, garbage: &mut Vec<S>) -> usize {
        let swept = self.map.retain_live(S::is_live);
        let removed = swept.len();
        garbage.extend(swept);
        self.ops = 0;
        self.sweep_at = MIN_SWEEP_THRESHOLD.max(self.map.len() * 2);
        if removed > 0 {
            tracing::debug!(
                field = %self.name,
                removed,
                retained = self.map.len(),
                "swept reclaimed entries"
            );
        }
        removed
    }
}

/// An augmented field: one value slot per owner object, keyed by identity.
///
/// Owners are `Arc<T>` allocations and are never kept alive by the table.
/// Create one table per (owner type, field name) and keep it for as long as
/// the field is used; see [`FieldRegistry`](crate::FieldRegistry) for a
/// checked way to do that.
pub struct FieldTable<T: ?Sized, S, H = RandomState> {
    name: Arc<str>,
    reentrancy: DebugReentrancy,
    inner: Mutex<Inner<T, S, H>>,
}

impl<T, S> FieldTable<T, S>
where
    T: ?Sized,
    S: Slot,
{
    pub fn new(name: &str) -> Self {
        Self::with_hasher(name, Default::default())
    }
}

impl<T, S, H> FieldTable<T, S, H>
where
    T: ?Sized,
    S: Slot,
    H: BuildHasher,
{
    pub fn with_hasher(name: &str, hasher: H) -> Self {
        let name: Arc<str> = Arc::from(name);
        tracing::debug!(field = %name, kind = S::KIND, "field table created");
        Self {
            name: Arc::clone(&name),
            reentrancy: DebugReentrancy::new(),
            inner: Mutex::new(Inner {
                name,
                map: IdentityMap::with_hasher(hasher),
                sweep_at: MIN_SWEEP_THRESHOLD,
                ops: 0,
            }),
        }
    }

    /// The descriptive field name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve `owner`, then run `f` under the lock. Values collected in
    /// the garbage list are dropped after the lock is released.
    fn locked<O, R, F>(&self, owner: &O, f: F) -> Result<R>
    where
        O: Owner<T> + ?Sized,
        F: FnOnce(&mut Inner<T, S, H>, &Arc<T>, &mut Vec<S>) -> R,
    {
        let mut garbage = Vec::new();
        let out = owner
            .with_live(|owner| {
                let _g = self.reentrancy.enter();
                let mut inner = self.inner.lock();
                inner.tick(&mut garbage);
                f(&mut *inner, owner, &mut garbage)
            })
            .ok_or(Error::InvalidArgument("object"))?;
        drop(garbage);
        Ok(out)
    }

    /// Current value of the field, if any.
    pub fn get<O>(&self, owner: &O) -> Result<Option<S::Value>>
    where
        O: Owner<T> + ?Sized,
    {
        self.locked(owner, |inner, owner, garbage| inner.read(owner, garbage))
    }

    /// Store `value`, discarding whatever was there.
    pub fn set<O>(&self, owner: &O, value: S::Value) -> Result<()>
    where
        O: Owner<T> + ?Sized,
    {
        self.get_and_set(owner, value).map(drop)
    }

    /// Store `value` and return the value **before** the operation.
    pub fn get_and_set<O>(&self, owner: &O, value: S::Value) -> Result<Option<S::Value>>
    where
        O: Owner<T> + ?Sized,
    {
        self.locked(owner, |inner, owner, garbage| {
            let previous = inner.read(owner, garbage);
            inner.write(owner, &value, garbage);
            (previous, value)
        })
        .map(|(previous, _value)| previous)
    }

    /// Remove the field and return the value **before** the operation.
    pub fn clear<O>(&self, owner: &O) -> Result<Option<S::Value>>
    where
        O: Owner<T> + ?Sized,
    {
        self.locked(owner, |inner, owner, garbage| {
            let previous = inner.read(owner, garbage);
            inner.remove(owner, garbage);
            previous
        })
    }

    /// Remove the field if it equals `expected`.
    ///
    /// Returns the value **after** the operation: `None` if it was cleared or
    /// already absent, otherwise the current, unchanged value.
    pub fn compare_and_clear<O>(&self, owner: &O, expected: &S::Value) -> Result<Option<S::Value>>
    where
        O: Owner<T> + ?Sized,
    {
        self.locked(owner, |inner, owner, garbage| {
            match inner.read(owner, garbage) {
                Some(current) if current == *expected => {
                    inner.remove(owner, garbage);
                    (None, Some(current))
                }
                current => (current, None),
            }
        })
        .map(|(after, _cleared)| after)
    }

    /// Store `value` unless a value is already present.
    ///
    /// Returns the value **after** the operation: the existing value, or
    /// `value` if it was stored.
    pub fn set_if_absent<O>(&self, owner: &O, value: S::Value) -> Result<Option<S::Value>>
    where
        O: Owner<T> + ?Sized,
    {
        self.locked(owner, |inner, owner, garbage| {
            match inner.read(owner, garbage) {
                Some(current) => (Some(current), Some(value)),
                None => {
                    inner.write(owner, &value, garbage);
                    (Some(value), None)
                }
            }
        })
        .map(|(after, _rejected)| after)
    }

    /// Store `value` if the current value equals `expected`.
    ///
    /// Returns the value **after** the operation: `value` if it was stored,
    /// otherwise the current, unchanged value (`None` when absent).
    pub fn compare_and_set<O>(
        &self,
        owner: &O,
        expected: &S::Value,
        value: S::Value,
    ) -> Result<Option<S::Value>>
    where
        O: Owner<T> + ?Sized,
    {
        self.locked(owner, |inner, owner, garbage| {
            match inner.read(owner, garbage) {
                Some(current) if current == *expected => {
                    inner.write(owner, &value, garbage);
                    (Some(value), Some(current))
                }
                current => (current, Some(value)),
            }
        })
        .map(|(after, _spent)| after)
    }

    /// Drop every entry whose owner (or, for weak fields, whose value) has
    /// been reclaimed. Returns how many entries were removed.
    pub fn purge(&self) -> usize {
        let mut garbage = Vec::new();
        let removed = {
            let _g = self.reentrancy.enter();
            self.inner.lock().sweep(&mut garbage)
        };
        drop(garbage);
        removed
    }

    /// Number of stored entries, counting ones not yet swept.
    pub fn len(&self) -> usize {
        let _g = self.reentrancy.enter();
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized, S: Slot, H> fmt::Debug for FieldTable<T, S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("name", &self.name)
            .field("kind", &S::KIND)
            .finish_non_exhaustive()
    }
}
