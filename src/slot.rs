//! Value slots: how a table stores a field value per owner.

use std::sync::{Arc, Weak};

/// Storage strategy for one field value.
///
/// The table only ever calls `store` on write and `load` on read, so every
/// operation sees the same notion of "present". A slot that no longer loads
/// counts as absent and is removed by the access that finds it.
pub trait Slot: Sized {
    /// The value as callers pass and receive it. Compared by value.
    type Value: Clone + PartialEq;

    /// Short variant label for logs and `Debug`.
    const KIND: &'static str;

    /// Build the stored form. The caller keeps `value`, so it is never
    /// dropped while the table is locked.
    fn store(value: &Self::Value) -> Self;

    fn load(&self) -> Option<Self::Value>;

    /// Whether `load` would currently return a value.
    fn is_live(&self) -> bool;
}

/// Holds the value directly; it lives as long as its entry.
#[derive(Debug)]
pub struct Strong<F>(F);

impl<F> Slot for Strong<F>
where
    F: Clone + PartialEq,
{
    type Value = F;

    const KIND: &'static str = "strong";

    #[inline]
    fn store(value: &F) -> Self {
        Strong(value.clone())
    }

    #[inline]
    fn load(&self) -> Option<F> {
        Some(self.0.clone())
    }

    #[inline]
    fn is_live(&self) -> bool {
        true
    }
}

/// Holds the value through a `Weak`; the table alone never keeps it alive.
///
/// Values go in and come out as `Arc<F>`. Equality compares the pointees,
/// not the allocations.
#[derive(Debug)]
pub struct WeakSlot<F: ?Sized>(Weak<F>);

impl<F> Slot for WeakSlot<F>
where
    F: ?Sized + PartialEq,
{
    type Value = Arc<F>;

    const KIND: &'static str = "weak";

    #[inline]
    fn store(value: &Arc<F>) -> Self {
        WeakSlot(Arc::downgrade(value))
    }

    #[inline]
    fn load(&self) -> Option<Arc<F>> {
        self.0.upgrade()
    }

    #[inline]
    fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}
