//! Owner references accepted by table operations.

use std::sync::{Arc, Weak};

/// Something that may name a live owner object.
///
/// `Arc<T>` always does. A `Weak<T>` does only while it still upgrades; a
/// dangling one is an absent owner and the operation fails with
/// [`Error::InvalidArgument`](crate::Error::InvalidArgument).
pub trait Owner<T: ?Sized> {
    /// Run `f` with a strong reference to the owner, or return `None` if
    /// the owner is absent. Any temporary strong reference is released only
    /// after `f` returns.
    fn with_live<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Arc<T>) -> R;
}

impl<T: ?Sized> Owner<T> for Arc<T> {
    #[inline]
    fn with_live<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Arc<T>) -> R,
    {
        Some(f(self))
    }
}

impl<T: ?Sized> Owner<T> for Weak<T> {
    #[inline]
    fn with_live<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Arc<T>) -> R,
    {
        let strong = self.upgrade()?;
        Some(f(&strong))
    }
}
