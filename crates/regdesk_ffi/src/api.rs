//! FFI use-case API for UI-facing calls.
//!
//! # Responsibility
//! - Expose the registration collaborator interface to the UI via FRB.
//! - Flatten core results into plain envelopes with stable error codes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the store, performs one use-case and returns the
//!   store-confirmed record; the UI never holds a second source of truth.
//! - `error_code` is one of `validation|duplicate_key|not_found|store`.

use log::warn;
use regdesk_core::db::open_db;
use regdesk_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DocumentKind, DocumentLocale, Registration, RegistrationForm, RegistrationPatch,
    RegistrationService, RegistrationStatus, ServiceError, ServiceResult,
    SqliteRegistrationRepository,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const REGISTRY_DB_FILE_NAME: &str = "regdesk.sqlite3";
const REGISTRY_DB_PATH_ENV: &str = "REGDESK_DB_PATH";
static REGISTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Flat registration view handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationItem {
    pub id: String,
    pub sequence_number: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// `pending|approved|rejected`.
    pub status: String,
    /// Epoch milliseconds.
    pub registration_date: i64,
    /// Epoch milliseconds.
    pub last_updated: i64,
}

impl From<Registration> for RegistrationItem {
    fn from(record: Registration) -> Self {
        Self {
            id: record.id,
            sequence_number: record.sequence_number,
            name: record.name,
            age: record.age,
            gender: record.gender,
            address: record.address,
            phone: record.phone,
            email: record.email,
            status: record.status.as_str().to_string(),
            registration_date: record.registration_date,
            last_updated: record.last_updated,
        }
    }
}

/// Envelope for single-record operations (create, fetch, search, edit, status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResponse {
    /// Whether the call succeeded. A lookup miss is still `ok` with no item.
    pub ok: bool,
    pub error_code: Option<String>,
    pub item: Option<RegistrationItem>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl RegistrationResponse {
    fn found(message: impl Into<String>, record: Registration) -> Self {
        Self {
            ok: true,
            error_code: None,
            item: Some(record.into()),
            message: message.into(),
        }
    }

    fn missing() -> Self {
        Self {
            ok: true,
            error_code: None,
            item: None,
            message: "No registration found.".to_string(),
        }
    }

    fn failure(err: BoundaryError) -> Self {
        Self {
            ok: false,
            error_code: Some(err.code.to_string()),
            item: None,
            message: err.message,
        }
    }
}

/// Envelope for dashboard listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationListResponse {
    pub ok: bool,
    pub error_code: Option<String>,
    /// Newest registration first.
    pub items: Vec<RegistrationItem>,
    pub message: String,
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationStatsResponse {
    pub ok: bool,
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub message: String,
}

/// Plain-text document ready for a client-side download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResponse {
    pub ok: bool,
    pub error_code: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub content: String,
    pub message: String,
}

/// Registers a new applicant.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `age=None` is reported as a validation error.
/// - Returns the stored record with its assigned id and sequence number.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_create(
    name: String,
    age: Option<u32>,
    gender: String,
    address: String,
    phone: Option<String>,
    email: Option<String>,
) -> RegistrationResponse {
    let form = RegistrationForm {
        name,
        age,
        gender,
        address,
        phone,
        email,
    };
    match with_registration_service("registration_create", |service| {
        service.create_registration(&form)
    }) {
        Ok(record) => {
            let message = format!("Registration {} created.", record.id);
            RegistrationResponse::found(message, record)
        }
        Err(err) => RegistrationResponse::failure(err),
    }
}

/// Gets one registration by exact id.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_fetch(id: String) -> RegistrationResponse {
    lookup_response(with_registration_service("registration_fetch", |service| {
        service.fetch_registration(&id)
    }))
}

/// Applicant lookup by id (case-insensitive) or sequence number.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_search(query: String) -> RegistrationResponse {
    lookup_response(with_registration_service("registration_search", |service| {
        service.search_registration(&query)
    }))
}

/// Lists registrations for the staff dashboard.
///
/// Input semantics:
/// - `status_filter`: `None`, empty or `all` disables the filter.
/// - `text_filter`: substring over id, sequence number and name.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_list(
    status_filter: Option<String>,
    text_filter: Option<String>,
) -> RegistrationListResponse {
    let result = parse_status_filter(status_filter.as_deref()).and_then(|status| {
        with_registration_service("registration_list", |service| {
            service.list_registrations(status, text_filter)
        })
    });

    match result {
        Ok(records) => {
            let items = records
                .into_iter()
                .map(RegistrationItem::from)
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No registrations.".to_string()
            } else {
                format!("Found {} registration(s).", items.len())
            };
            RegistrationListResponse {
                ok: true,
                error_code: None,
                items,
                message,
            }
        }
        Err(err) => RegistrationListResponse {
            ok: false,
            error_code: Some(err.code.to_string()),
            items: Vec::new(),
            message: err.message,
        },
    }
}

/// Applies a staff edit.
///
/// Input semantics:
/// - `None` leaves a field unchanged.
/// - `phone`/`email` set to an empty string clear the stored value.
/// - `status`, when given, must be `pending|approved|rejected`.
#[flutter_rust_bridge::frb(sync)]
#[allow(clippy::too_many_arguments)]
pub fn registration_edit(
    id: String,
    name: Option<String>,
    age: Option<u32>,
    gender: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    status: Option<String>,
) -> RegistrationResponse {
    let status = match status.as_deref().map(str::parse::<RegistrationStatus>) {
        None => None,
        Some(Ok(parsed)) => Some(parsed),
        Some(Err(err)) => {
            return RegistrationResponse::failure(BoundaryError::from_service(
                "registration_edit",
                ServiceError::Validation(err),
            ))
        }
    };
    let patch = RegistrationPatch {
        name,
        age,
        gender,
        address,
        phone: phone.map(Some),
        email: email.map(Some),
        status,
    };

    match with_registration_service("registration_edit", |service| {
        service.edit_registration(&id, &patch)
    }) {
        Ok(record) => RegistrationResponse::found("Registration updated.", record),
        Err(err) => RegistrationResponse::failure(err),
    }
}

/// Moves a registration to `status`.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_set_status(id: String, status: String) -> RegistrationResponse {
    match with_registration_service("registration_set_status", |service| {
        service.set_status(&id, &status)
    }) {
        Ok(record) => {
            let message = format!("Status set to {}.", record.status);
            RegistrationResponse::found(message, record)
        }
        Err(err) => RegistrationResponse::failure(err),
    }
}

/// Returns per-status counters.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_stats() -> RegistrationStatsResponse {
    match with_registration_service("registration_stats", |service| {
        service.registration_stats()
    }) {
        Ok(stats) => RegistrationStatsResponse {
            ok: true,
            total: stats.total,
            pending: stats.pending,
            approved: stats.approved,
            rejected: stats.rejected,
            message: String::new(),
        },
        Err(err) => RegistrationStatsResponse {
            ok: false,
            total: 0,
            pending: 0,
            approved: 0,
            rejected: 0,
            message: err.message,
        },
    }
}

/// Status values the UI may offer, in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_status_options() -> Vec<String> {
    RegistrationStatus::ALL
        .iter()
        .map(|status| status.as_str().to_string())
        .collect()
}

/// Renders a plain-text document for download.
///
/// Input semantics:
/// - `kind`: `certificate` or `details`.
/// - `locale`: `bn` or `en`; unknown tags fall back to `bn`.
#[flutter_rust_bridge::frb(sync)]
pub fn registration_export(id: String, kind: String, locale: String) -> DocumentResponse {
    let locale = DocumentLocale::parse(&locale).unwrap_or_default();
    let result = parse_document_kind(&kind).and_then(|kind| {
        with_registration_service("registration_export", |service| {
            service.export_document(&id, kind, locale)
        })
    });

    match result {
        Ok(document) => DocumentResponse {
            ok: true,
            error_code: None,
            file_name: document.file_name,
            mime_type: document.mime_type.to_string(),
            content: document.content,
            message: "Document generated.".to_string(),
        },
        Err(err) => DocumentResponse {
            ok: false,
            error_code: Some(err.code.to_string()),
            file_name: String::new(),
            mime_type: String::new(),
            content: String::new(),
            message: err.message,
        },
    }
}

struct BoundaryError {
    code: &'static str,
    message: String,
}

impl BoundaryError {
    fn from_service(operation: &'static str, err: ServiceError) -> Self {
        warn!(
            "event=ffi_call module=ffi status=error op={} error_code={}",
            operation,
            err.code()
        );
        Self {
            code: err.code(),
            message: format!("{operation} failed: {err}"),
        }
    }

    fn validation(operation: &'static str, message: String) -> Self {
        Self {
            code: "validation",
            message: format!("{operation} failed: {message}"),
        }
    }
}

fn lookup_response(result: Result<Option<Registration>, BoundaryError>) -> RegistrationResponse {
    match result {
        Ok(Some(record)) => RegistrationResponse::found("Registration found.", record),
        Ok(None) => RegistrationResponse::missing(),
        Err(err) => RegistrationResponse::failure(err),
    }
}

fn parse_status_filter(value: Option<&str>) -> Result<Option<RegistrationStatus>, BoundaryError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => raw
            .parse::<RegistrationStatus>()
            .map(Some)
            .map_err(|err| BoundaryError::validation("registration_list", err.to_string())),
    }
}

fn parse_document_kind(value: &str) -> Result<DocumentKind, BoundaryError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "certificate" => Ok(DocumentKind::Certificate),
        "details" | "registration_details" => Ok(DocumentKind::RegistrationDetails),
        other => Err(BoundaryError::validation(
            "registration_export",
            format!("unknown document kind `{other}`; expected certificate|details"),
        )),
    }
}

fn resolve_registry_db_path() -> PathBuf {
    REGISTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(REGISTRY_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(REGISTRY_DB_FILE_NAME)
        })
        .clone()
}

fn with_registration_service<T>(
    operation: &'static str,
    f: impl FnOnce(&RegistrationService<SqliteRegistrationRepository<'_>>) -> ServiceResult<T>,
) -> Result<T, BoundaryError> {
    let db_path = resolve_registry_db_path();
    let conn = open_db(&db_path).map_err(|err| BoundaryError {
        code: "store",
        message: format!("{operation} failed: registry DB open failed: {err}"),
    })?;
    let repo = SqliteRegistrationRepository::try_new(&conn).map_err(|err| BoundaryError {
        code: "store",
        message: format!("{operation} failed: registry repo init failed: {err}"),
    })?;
    let service = RegistrationService::new(repo);
    f(&service).map_err(|err| BoundaryError::from_service(operation, err))
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, registration_create, registration_edit,
        registration_export, registration_fetch, registration_list, registration_search,
        registration_set_status, registration_stats, registration_status_options,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn status_options_list_all_three_states() {
        assert_eq!(
            registration_status_options(),
            ["pending", "approved", "rejected"]
        );
    }

    #[test]
    fn create_then_fetch_and_search_by_lowercase_id() {
        let name = unique_token("create");
        let created = create(&name);
        assert!(created.ok, "{}", created.message);
        let item = created.item.expect("create should return the stored item");
        assert_eq!(item.status, "pending");
        assert!(item.id.starts_with("PPJ"));

        let fetched = registration_fetch(item.id.clone());
        assert_eq!(fetched.item.as_ref().map(|found| &found.name), Some(&name));

        let searched = registration_search(item.id.to_lowercase());
        assert_eq!(searched.item.map(|found| found.id), Some(item.id.clone()));

        let by_number = registration_search(item.sequence_number.clone());
        assert_eq!(by_number.item.map(|found| found.id), Some(item.id));
    }

    #[test]
    fn create_without_age_reports_validation() {
        let response = registration_create(
            unique_token("no-age"),
            None,
            "পুরুষ".to_string(),
            "Dhaka".to_string(),
            None,
            None,
        );
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("validation"));
    }

    #[test]
    fn fetch_missing_is_ok_without_item() {
        let response = registration_fetch("PPJ-missing".to_string());
        assert!(response.ok);
        assert!(response.item.is_none());
    }

    #[test]
    fn set_status_rejects_bogus_value_and_accepts_valid_one() {
        let created = create(&unique_token("status"));
        let id = created.item.expect("created item").id;

        let bogus = registration_set_status(id.clone(), "bogus".to_string());
        assert!(!bogus.ok);
        assert_eq!(bogus.error_code.as_deref(), Some("validation"));
        let unchanged = registration_fetch(id.clone()).item.expect("still stored");
        assert_eq!(unchanged.status, "pending");

        let approved = registration_set_status(id, "approved".to_string());
        assert!(approved.ok, "{}", approved.message);
        assert_eq!(approved.item.expect("approved item").status, "approved");
    }

    #[test]
    fn edit_missing_id_reports_not_found() {
        let response = registration_edit(
            "PPJ-missing".to_string(),
            Some("Ghost".to_string()),
            None,
            None,
            None,
            None,
            None,
            None,
        );
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("not_found"));
    }

    #[test]
    fn edit_clears_phone_with_empty_string_and_changes_status() {
        let created = create(&unique_token("edit"));
        let id = created.item.expect("created item").id;

        let edited = registration_edit(
            id,
            None,
            Some(45),
            None,
            None,
            Some(String::new()),
            None,
            Some("rejected".to_string()),
        );
        assert!(edited.ok, "{}", edited.message);
        let item = edited.item.expect("edited item");
        assert_eq!(item.age, 45);
        assert_eq!(item.phone, None);
        assert_eq!(item.status, "rejected");
    }

    #[test]
    fn list_filters_by_text_and_rejects_unknown_status_filter() {
        let name = unique_token("list");
        create(&name);

        let listed = registration_list(Some("all".to_string()), Some(name.to_uppercase()));
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].name, name);

        let invalid = registration_list(Some("archived".to_string()), None);
        assert!(!invalid.ok);
        assert_eq!(invalid.error_code.as_deref(), Some("validation"));
    }

    #[test]
    fn stats_count_created_registrations() {
        create(&unique_token("stats"));
        let stats = registration_stats();
        assert!(stats.ok, "{}", stats.message);
        assert!(stats.total >= 1);
        assert_eq!(
            stats.total,
            stats.pending + stats.approved + stats.rejected
        );
    }

    #[test]
    fn export_certificate_uses_id_based_file_name() {
        let created = create(&unique_token("export"));
        let id = created.item.expect("created item").id;

        let document = registration_export(id.clone(), "certificate".to_string(), "en".to_string());
        assert!(document.ok, "{}", document.message);
        assert_eq!(document.file_name, format!("{id}_certificate.txt"));
        assert!(document.content.contains("Status: Pending"));

        let unknown = registration_export(id, "pdf".to_string(), "en".to_string());
        assert_eq!(unknown.error_code.as_deref(), Some("validation"));
    }

    fn create(name: &str) -> super::RegistrationResponse {
        registration_create(
            name.to_string(),
            Some(26),
            "মহিলা".to_string(),
            "Chattogram".to_string(),
            Some("01900000000".to_string()),
            None,
        )
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
