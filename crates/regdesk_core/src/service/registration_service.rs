//! Registration use-case service.
//!
//! # Responsibility
//! - Expose the collaborator interface the UI layer calls: create, fetch,
//!   search, list, edit, set status, stats and document export.
//! - Run the allocate-then-insert protocol with its single fallback retry.
//!
//! # Invariants
//! - Form validation runs before any store call.
//! - A `DuplicateKey` on create triggers exactly one retry with a fresh
//!   timestamp-derived pair; a second failure is returned to the caller.
//! - Every successful mutation returns the store's read-back record, never
//!   the caller's local copy.

use crate::allocator::id_allocator::{allocate, fallback_ids, AllocatedIds};
use crate::export::document::{render_document, DocumentKind, DocumentLocale, ExportedDocument};
use crate::model::registration::{
    Registration, RegistrationForm, RegistrationPatch, RegistrationStatus,
    RegistrationValidationError,
};
use crate::repo::registration_repo::{
    DuplicateField, RegistrationListQuery, RegistrationRepository, RegistrationStats, RepoError,
    SearchField,
};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Millisecond clock used for timestamps and fallback identifiers.
pub type Clock = fn() -> i64;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn system_now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Service error mirroring the collaborator-facing taxonomy.
#[derive(Debug)]
pub enum ServiceError {
    /// Missing or invalid input; nothing was written.
    Validation(RegistrationValidationError),
    /// Uniqueness violation that survived the automatic retry.
    DuplicateKey {
        field: DuplicateField,
        value: String,
    },
    /// Target registration does not exist.
    NotFound(String),
    /// Any other persistence failure, including connectivity.
    Store(RepoError),
    /// Write succeeded but the read-back did not find the record.
    InconsistentState(&'static str),
}

impl ServiceError {
    /// Stable machine-readable code for boundary layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::NotFound(_) => "not_found",
            Self::Store(_) | Self::InconsistentState(_) => "store",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey { field, value } => {
                write!(f, "duplicate {}: `{value}` already exists", field.as_str())
            }
            Self::NotFound(id) => write!(f, "registration not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent registration state: {details}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistrationValidationError> for ServiceError {
    fn from(value: RegistrationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::DuplicateKey { field, value } => Self::DuplicateKey { field, value },
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Registration service facade over repository implementations.
pub struct RegistrationService<R: RegistrationRepository> {
    repo: R,
    clock: Clock,
}

impl<R: RegistrationRepository> RegistrationService<R> {
    /// Creates a service using the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, system_now_ms)
    }

    /// Creates a service with a caller-provided clock.
    pub fn with_clock(repo: R, clock: Clock) -> Self {
        Self { repo, clock }
    }

    /// Registers a new applicant with status `pending`.
    ///
    /// # Contract
    /// - Required fields are checked before allocation.
    /// - On `DuplicateKey` the insert is retried once with a fallback pair.
    /// - Returns the persisted record.
    pub fn create_registration(&self, form: &RegistrationForm) -> ServiceResult<Registration> {
        if let Err(err) = form.validate() {
            info!(
                "event=registration_create module=service status=rejected error_code=validation error={}",
                err
            );
            return Err(err.into());
        }

        let now_ms = (self.clock)();
        let ids = allocate(&self.repo, now_ms);
        let first_attempt = self.insert_new(&ids, form, now_ms);

        let (record_id, source) = match first_attempt {
            Ok(()) => (ids.id, ids.source),
            Err(RepoError::DuplicateKey { field, value }) => {
                let retry_now_ms = (self.clock)().max(now_ms + 1);
                let retry_ids = fallback_ids(retry_now_ms);
                warn!(
                    "event=registration_create module=service status=retry reason=duplicate_key field={} conflicting={} retry_id={} retry_sequence_number={}",
                    field.as_str(),
                    value,
                    retry_ids.id,
                    retry_ids.sequence_number
                );
                if let Err(err) = self.insert_new(&retry_ids, form, retry_now_ms) {
                    error!(
                        "event=registration_create module=service status=error stage=retry error={}",
                        err
                    );
                    return Err(err.into());
                }
                (retry_ids.id, retry_ids.source)
            }
            Err(err) => {
                error!(
                    "event=registration_create module=service status=error stage=insert error={}",
                    err
                );
                return Err(err.into());
            }
        };

        info!(
            "event=registration_create module=service status=ok id={} source={}",
            record_id,
            source.as_str()
        );
        self.repo
            .get_by_id(&record_id)?
            .ok_or(ServiceError::InconsistentState(
                "created registration not found in read-back",
            ))
    }

    /// Gets one registration by exact id.
    pub fn fetch_registration(&self, id: &str) -> ServiceResult<Option<Registration>> {
        Ok(self.repo.get_by_id(id.trim())?)
    }

    /// Applicant lookup by id (case-insensitive) or sequence number.
    pub fn search_registration(&self, query: &str) -> ServiceResult<Option<Registration>> {
        self.search_registration_by(query, SearchField::Any)
    }

    /// Point search restricted to one field.
    pub fn search_registration_by(
        &self,
        query: &str,
        field: SearchField,
    ) -> ServiceResult<Option<Registration>> {
        Ok(self.repo.search(query, field)?)
    }

    /// Lists registrations, newest first, with optional filters.
    pub fn list_registrations(
        &self,
        status: Option<RegistrationStatus>,
        text: Option<String>,
    ) -> ServiceResult<Vec<Registration>> {
        let query = RegistrationListQuery { status, text };
        Ok(self.repo.list(&query)?)
    }

    /// Applies a partial edit and returns the stored result.
    ///
    /// Blank optional contact fields clear the stored value; blank required
    /// fields are rejected.
    pub fn edit_registration(
        &self,
        id: &str,
        patch: &RegistrationPatch,
    ) -> ServiceResult<Registration> {
        let id = id.trim();
        let patch = patch.normalized();
        patch.validate()?;

        self.repo.update(id, &patch, (self.clock)())?;
        info!(
            "event=registration_edit module=service status=ok id={} status_changed={}",
            id,
            patch.status.is_some()
        );

        self.repo
            .get_by_id(id)?
            .ok_or(ServiceError::InconsistentState(
                "edited registration not found in read-back",
            ))
    }

    /// Moves a registration to `status`. Any state may reach any other.
    ///
    /// # Errors
    /// - `Validation` when `status` is not `pending|approved|rejected`; the
    ///   stored record is left untouched.
    /// - `NotFound` when `id` does not exist.
    pub fn set_status(&self, id: &str, status: &str) -> ServiceResult<Registration> {
        let id = id.trim();
        let status = status.parse::<RegistrationStatus>()?;

        self.repo.update_status(id, status, (self.clock)())?;
        info!(
            "event=registration_status module=service status=ok id={} new_status={}",
            id, status
        );

        self.repo
            .get_by_id(id)?
            .ok_or(ServiceError::InconsistentState(
                "registration missing after status change",
            ))
    }

    /// Counts registrations per status.
    pub fn registration_stats(&self) -> ServiceResult<RegistrationStats> {
        Ok(self.repo.stats()?)
    }

    /// Renders a plain-text document for one registration.
    pub fn export_document(
        &self,
        id: &str,
        kind: DocumentKind,
        locale: DocumentLocale,
    ) -> ServiceResult<ExportedDocument> {
        let id = id.trim();
        let record = self
            .repo
            .get_by_id(id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        Ok(render_document(&record, kind, locale, (self.clock)()))
    }

    fn insert_new(
        &self,
        ids: &AllocatedIds,
        form: &RegistrationForm,
        now_ms: i64,
    ) -> Result<(), RepoError> {
        let record = Registration::new_pending(
            ids.id.as_str(),
            ids.sequence_number.as_str(),
            form,
            now_ms,
        )?;
        self.repo.insert(&record)
    }
}
