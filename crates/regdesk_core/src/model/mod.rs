//! Registration domain model.
//!
//! # Responsibility
//! - Define the record shape, status set and form/patch inputs used by the
//!   store, allocator and service layers.
//!
//! # Invariants
//! - Every record is identified by a unique `RegistrationId`.
//! - Records are never deleted; the lifecycle is create then mutate.

pub mod registration;
