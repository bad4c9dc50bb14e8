//! field-augment: out-of-band fields for objects whose type you cannot
//! change, stored in identity-keyed side tables that never keep their
//! owners alive.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: attach per-instance state (a cached value, a back-reference)
//!   to `Arc<T>` objects without touching `T` and without leaking.
//! - Layers:
//!   - IdentityMap<T, V, S>: structural map keyed by `Weak<T>` and
//!     compared by allocation address; returns stable handles over slotmap
//!     storage and can sweep entries whose owner is gone.
//!   - Slot: per-variant storage of one value. `Strong<F>` stores the
//!     value; `WeakSlot<F>` stores a `Weak<F>` and reads as absent once the
//!     value is reclaimed.
//!   - FieldTable<T, S, H>: public API. Seven operations (get, set,
//!     get_and_set, clear, compare_and_clear, set_if_absent,
//!     compare_and_set) built from one read/write pair over a locked map.
//!   - factory: `augment`, `augment_weak_field`, and `FieldRegistry` for
//!     checked one-table-per-(type, name) creation.
//!
//! Constraints
//! - Thread-shared: each table has one `parking_lot::Mutex`; every
//!   operation holds it for its whole read-then-write, so operations on
//!   one table are linearizable.
//! - Owners are identified by allocation, never by `T: Eq/Hash`.
//! - A table never stores an empty marker; clearing removes the entry.
//! - Absent results are `None`, never errors.
//!
//! Reclamation
//! - Keys are `Weak<T>`. Entries for dropped owners are swept once a
//!   threshold's worth of operations has run since the last sweep, when an
//!   insert finds the map at that threshold, and by `purge()`.
//!   A held `Weak<T>` keeps the allocation reserved, so a stale entry can
//!   never match a new owner at a reused address.
//! - Weak-value slots that no longer upgrade are removed by the access
//!   that finds them (and by sweeps). There is no background thread.
//!
//! Reentrancy policy
//! - Values leaving the map (overwritten, cleared, swept) are dropped
//!   after the lock is released, so `Drop` for `F` may use the table.
//! - `F: Clone`/`F: PartialEq` run under the lock. Calling back into the
//!   same table from them would deadlock; debug builds panic instead via
//!   a per-table reentrancy guard.
//!
//! Notes and non-goals
//! - No persistence and nothing cross-process.
//! - No capacity management beyond reclamation tied to owner liveness.
//! - Creating two tables for one (owner type, name) through the free
//!   functions yields two independent fields; use `FieldRegistry` to
//!   reject it.

mod error;
mod factory;
mod field_table;
#[cfg(feature = "bench_internal")]
pub mod identity_map;
#[cfg(not(feature = "bench_internal"))]
mod identity_map;
mod owner;
mod reentrancy;
mod slot;

// Public surface
pub use error::{Error, Result};
pub use factory::{augment, augment_weak_field, FieldRegistry};
pub use field_table::{Augment, FieldTable, WeakAugment, MIN_SWEEP_THRESHOLD};
pub use owner::Owner;
pub use slot::{Slot, Strong, WeakSlot};
