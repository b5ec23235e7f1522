//! Identifier allocation for new registrations.
//!
//! # Responsibility
//! - Propose the next `(id, sequence_number)` pair from current store state.
//! - Fall back to timestamp-derived values when the store cannot be read.
//!
//! # Invariants
//! - Proposals are not reservations; uniqueness is enforced by the store.

pub mod id_allocator;
