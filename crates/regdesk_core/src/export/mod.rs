//! Document export for registrations.
//!
//! # Responsibility
//! - Turn a stored record into a downloadable plain-text document.
//!
//! # Invariants
//! - Export never touches the store or the filesystem; callers deliver the
//!   returned bytes.

pub mod document;
