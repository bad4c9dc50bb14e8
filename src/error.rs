//! Error type shared by the tables, the factory and the registry.

use thiserror::Error;

/// Errors raised by field augmentation.
///
/// Absence of an entry is never an error; lookups report it as `None`.
/// Every variant is raised before the table is inspected or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A required argument was absent: a `Weak` owner that no longer
    /// upgrades, or an empty field name.
    #[error("invalid argument: `{0}` is absent")]
    InvalidArgument(&'static str),

    /// A [`FieldRegistry`](crate::FieldRegistry) already handed out a table
    /// for this owner type and field name.
    #[error("field `{name}` is already augmented on `{owner}`")]
    DuplicateField { owner: &'static str, name: String },
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
