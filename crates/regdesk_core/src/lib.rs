//! Core domain logic for the registration desk.
//! This crate is the single source of truth for business invariants.

pub mod allocator;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use allocator::id_allocator::{
    allocate, fallback_ids, next_sequential, AllocatedIds, AllocationSource, SEQUENCE_BASE,
};
pub use export::document::{
    format_date, render_document, status_label, DocumentKind, DocumentLocale, ExportedDocument,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::registration::{
    format_id, parse_id_suffix, Registration, RegistrationForm, RegistrationId,
    RegistrationPatch, RegistrationStatus, RegistrationValidationError,
};
pub use repo::registration_repo::{
    DuplicateField, RegistrationListQuery, RegistrationRepository, RegistrationStats, RepoError,
    RepoResult, SearchField, SqliteRegistrationRepository,
};
pub use service::registration_service::{
    system_now_ms, Clock, RegistrationService, ServiceError, ServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
