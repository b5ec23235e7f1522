//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the Record Store contract used by allocator and services.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Registration::validate()` before
//!   persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateKey`) in
//!   addition to DB transport errors.

pub mod registration_repo;
