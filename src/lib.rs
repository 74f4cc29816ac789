//! chained-hashtable: an integer-keyed separate-chaining hash table that
//! grows when chains get long.
//!
//! Internal Design:
//!
//! Summary
//! - `ChainedHashTable<V>` maps non-negative `i64` keys to values. The
//!   bucket of a key is `key mod capacity()`; colliding keys share a
//!   singly linked chain and new entries are pushed at the chain head.
//! - Growth is keyed on chain length rather than load factor: once an
//!   insert leaves a chain longer than `TableConfig::max_chain_len`, the
//!   bucket array is multiplied by `TableConfig::resize_factor` and every
//!   entry is relinked under the new modulus. The table never shrinks.
//!
//! Storage
//! - Entries live in a `slotmap::SlotMap` arena; buckets and `next` links
//!   are generational arena keys rather than owning pointers. Removing an
//!   entry returns its slot to the arena's free list.
//! - The live entry count is the arena length, so `len()` is O(1) and
//!   always matches the number of linked entries.
//! - `max_chain_len()` is an upper bound on the longest chain. It only
//!   grows between resizes; a resize recomputes it from the new chains and
//!   a flush resets it to zero.
//!
//! Failure model
//! - Every operation returns `Result<_, TableError>` and is all-or-nothing.
//! - A resize target is allocated before the new entry is linked, so an
//!   `AllocationFailure` from a triggered resize leaves the table exactly
//!   as it was. `flush_all` allocates its output before draining.
//! - Relinking during a resize never starts another resize; a chain that
//!   is still long afterward triggers growth on the next insert.
//!
//! Keys
//! - Negative keys are rejected by `insert` and `remove` with
//!   `TableError::InvalidArgument`; `find`/`get` report them absent.
//!
//! Notes and non-goals
//! - No internal synchronization. The table is `Send` when `V` is, so a
//!   caller sharing it across threads wraps it in a `Mutex`.
//! - No iteration; `flush_all` is the only way to export the contents.
//! - Keys are plain integers; there is no pluggable hasher.

pub mod chained_hash_table;
mod chained_hash_table_proptest;
pub mod config;
pub mod error;
pub mod pair;

// Public surface
pub use chained_hash_table::ChainedHashTable;
pub use config::TableConfig;
pub use error::{Result, TableError};
pub use pair::Pair;
