//! Entry points that create field tables.
//!
//! The free functions hand out a fresh, independent table on every call and
//! trust the caller to create only one per (owner type, field name).
//! `FieldRegistry` checks that rule instead.

use crate::error::{Error, Result};
use crate::field_table::{Augment, FieldTable, WeakAugment};
use core::any::{type_name, TypeId};
use hashbrown::HashSet;
use parking_lot::Mutex;
use std::sync::OnceLock;

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("name"));
    }
    Ok(())
}

/// Augment owners of type `T` with a field of type `F` whose values are
/// held strongly.
///
/// `name` only describes the field; it is not looked up on `T`.
pub fn augment<T, F>(name: &str) -> Result<Augment<T, F>>
where
    T: ?Sized,
    F: Clone + PartialEq,
{
    check_name(name)?;
    Ok(FieldTable::new(name))
}

/// Augment owners of type `T` with a field of type `F` whose values are
/// held weakly: a value is forgotten once nothing else holds its `Arc`.
pub fn augment_weak_field<T, F>(name: &str) -> Result<WeakAugment<T, F>>
where
    T: ?Sized,
    F: ?Sized + PartialEq,
{
    check_name(name)?;
    Ok(FieldTable::new(name))
}

/// Hands out at most one table per (owner type, field name).
///
/// A claim is held for the registry's lifetime, whichever variant made it
/// and whether or not the table is still alive.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    claimed: Mutex<HashSet<(TypeId, Box<str>)>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static FieldRegistry {
        static GLOBAL: OnceLock<FieldRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FieldRegistry::new)
    }

    /// Checked [`augment`]: fails with [`Error::DuplicateField`] if `name`
    /// is already claimed for `T`.
    pub fn augment<T, F>(&self, name: &str) -> Result<Augment<T, F>>
    where
        T: ?Sized + 'static,
        F: Clone + PartialEq,
    {
        self.claim::<T>(name)?;
        augment(name)
    }

    /// Checked [`augment_weak_field`].
    pub fn augment_weak_field<T, F>(&self, name: &str) -> Result<WeakAugment<T, F>>
    where
        T: ?Sized + 'static,
        F: ?Sized + PartialEq,
    {
        self.claim::<T>(name)?;
        augment_weak_field(name)
    }

    pub fn is_claimed<T: ?Sized + 'static>(&self, name: &str) -> bool {
        self.claimed
            .lock()
            .contains(&(TypeId::of::<T>(), Box::<str>::from(name)))
    }

    fn claim<T: ?Sized + 'static>(&self, name: &str) -> Result<()> {
        check_name(name)?;
        let fresh = self
            .claimed
            .lock()
            .insert((TypeId::of::<T>(), Box::from(name)));
        if !fresh {
            tracing::debug!(owner = type_name::<T>(), field = name, "duplicate field rejected");
            return Err(Error::DuplicateField {
                owner: type_name::<T>(),
                name: name.to_string(),
            });
        }
        tracing::debug!(owner = type_name::<T>(), field = name, "field claimed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_invalid() {
        assert_eq!(
            augment::<u8, u8>("").unwrap_err(),
            Error::InvalidArgument("name")
        );
        assert_eq!(
            augment_weak_field::<u8, str>("").unwrap_err(),
            Error::InvalidArgument("name")
        );
    }

    #[test]
    fn registry_rejects_empty_name_without_claiming() {
        let r = FieldRegistry::new();
        assert_eq!(
            r.augment::<u8, u8>("").unwrap_err(),
            Error::InvalidArgument("name")
        );
        assert!(!r.is_claimed::<u8>(""));
    }
}
