//! Registration repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the Record Store: conflict-checked insert, point lookup,
//!   search, filtered listing and conditional updates over `users`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Insert validates the record before touching SQL and relies on the
//!   table's unique constraints, so a racing duplicate is never written.
//! - Every mutation is a single statement and bumps `last_updated` to
//!   `max(now, previous + 1)`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::registration::{
    is_numeric_sequence, parse_id_suffix, Registration, RegistrationPatch, RegistrationStatus,
    RegistrationValidationError,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const USERS_SELECT_SQL: &str = "SELECT
    id,
    sequence_number,
    name,
    age,
    gender,
    address,
    phone,
    email,
    status,
    registration_date,
    last_updated
FROM users";

const REQUIRED_USER_COLUMNS: [&str; 11] = [
    "id",
    "sequence_number",
    "name",
    "age",
    "gender",
    "address",
    "phone",
    "email",
    "status",
    "registration_date",
    "last_updated",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Unique column that rejected an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Id,
    SequenceNumber,
}

impl DuplicateField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::SequenceNumber => "sequence_number",
        }
    }
}

/// Repository error for registration persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RegistrationValidationError),
    /// Insert collided with an existing `id` or `sequence_number`.
    DuplicateKey {
        field: DuplicateField,
        value: String,
    },
    NotFound(String),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey { field, value } => {
                write!(f, "duplicate {}: `{value}` already exists", field.as_str())
            }
            Self::NotFound(id) => write!(f, "registration not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted registration data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistrationValidationError> for RepoError {
    fn from(value: RegistrationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which column a point search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    /// Case-insensitive exact match on `id`.
    Id,
    /// Exact match on `sequence_number`.
    SequenceNumber,
    /// Either of the above; first registered match wins.
    #[default]
    Any,
}

/// Query options for listing registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationListQuery {
    pub status: Option<RegistrationStatus>,
    /// Case-insensitive substring over `id`, `sequence_number` and `name`.
    pub text: Option<String>,
}

/// Per-status record counts for the staff dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

/// Repository interface for the registration Record Store.
pub trait RegistrationRepository {
    /// Persists `record` iff neither its `id` nor `sequence_number` exists.
    fn insert(&self, record: &Registration) -> RepoResult<()>;
    /// Exact primary-key lookup.
    fn get_by_id(&self, id: &str) -> RepoResult<Option<Registration>>;
    /// Point search returning the first match.
    fn search(&self, query: &str, field: SearchField) -> RepoResult<Option<Registration>>;
    /// Lists matches, newest registration first.
    fn list(&self, query: &RegistrationListQuery) -> RepoResult<Vec<Registration>>;
    /// Applies a partial update and bumps `last_updated`.
    fn update(&self, id: &str, patch: &RegistrationPatch, now_ms: i64) -> RepoResult<()>;
    /// Sets only `status` and `last_updated`.
    fn update_status(&self, id: &str, status: RegistrationStatus, now_ms: i64)
        -> RepoResult<()>;
    /// Highest numeric suffix among `PPJ<digits>` ids, if any.
    fn max_id_suffix(&self) -> RepoResult<Option<u64>>;
    /// Highest numeric `sequence_number`, if any.
    fn max_sequence_number(&self) -> RepoResult<Option<u64>>;
    /// Counts records grouped by status.
    fn stats(&self) -> RepoResult<RegistrationStats>;
}

/// SQLite-backed registration repository.
pub struct SqliteRegistrationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistrationRepository<'conn> {
    /// Constructs a repository over a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema does
    ///   not have the `users` shape this repository reads.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RegistrationRepository for SqliteRegistrationRepository<'_> {
    fn insert(&self, record: &Registration) -> RepoResult<()> {
        record.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (
                    id,
                    sequence_number,
                    name,
                    age,
                    gender,
                    address,
                    phone,
                    email,
                    status,
                    registration_date,
                    last_updated
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
                params![
                    record.id.as_str(),
                    record.sequence_number.as_str(),
                    record.name.as_str(),
                    record.age,
                    record.gender.as_str(),
                    record.address.as_str(),
                    record.phone.as_deref(),
                    record.email.as_deref(),
                    record.status.as_str(),
                    record.registration_date,
                    record.last_updated,
                ],
            )
            .map_err(|err| map_insert_error(err, record))?;

        Ok(())
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Option<Registration>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USERS_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_registration_row(row)?));
        }
        Ok(None)
    }

    fn search(&self, query: &str, field: SearchField) -> RepoResult<Option<Registration>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let predicate = match field {
            SearchField::Id => "id = ?1 COLLATE NOCASE",
            SearchField::SequenceNumber => "sequence_number = ?1",
            SearchField::Any => "(id = ?1 COLLATE NOCASE OR sequence_number = ?1)",
        };
        let mut stmt = self.conn.prepare(&format!(
            "{USERS_SELECT_SQL} WHERE {predicate} ORDER BY rowid ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([query])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_registration_row(row)?));
        }
        Ok(None)
    }

    fn list(&self, query: &RegistrationListQuery) -> RepoResult<Vec<Registration>> {
        let mut sql = format!("{USERS_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY registration_date DESC, rowid DESC");

        let needle = query
            .text
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let record = parse_registration_row(row)?;
            // SQLite LIKE only folds ASCII case; names are often not ASCII.
            if needle.map_or(true, |needle| record.matches_text(needle)) {
                records.push(record);
            }
        }

        Ok(records)
    }

    fn update(&self, id: &str, patch: &RegistrationPatch, now_ms: i64) -> RepoResult<()> {
        patch.validate()?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                name = COALESCE(?2, name),
                age = COALESCE(?3, age),
                gender = COALESCE(?4, gender),
                address = COALESCE(?5, address),
                phone = CASE WHEN ?6 = 1 THEN ?7 ELSE phone END,
                email = CASE WHEN ?8 = 1 THEN ?9 ELSE email END,
                status = COALESCE(?10, status),
                last_updated = MAX(?11, last_updated + 1)
             WHERE id = ?1;",
            params![
                id,
                patch.name.as_deref(),
                patch.age,
                patch.gender.as_deref(),
                patch.address.as_deref(),
                bool_to_int(patch.phone.is_some()),
                patch.phone.as_ref().and_then(|value| value.as_deref()),
                bool_to_int(patch.email.is_some()),
                patch.email.as_ref().and_then(|value| value.as_deref()),
                patch.status.map(RegistrationStatus::as_str),
                now_ms,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn update_status(
        &self,
        id: &str,
        status: RegistrationStatus,
        now_ms: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                status = ?2,
                last_updated = MAX(?3, last_updated + 1)
             WHERE id = ?1;",
            params![id, status.as_str(), now_ms],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn max_id_suffix(&self) -> RepoResult<Option<u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM users WHERE id GLOB 'PPJ[0-9]*';")?;
        let mut rows = stmt.query([])?;
        let mut max = None;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            if let Some(suffix) = parse_id_suffix(&id) {
                max = max.max(Some(suffix));
            }
        }
        Ok(max)
    }

    fn max_sequence_number(&self) -> RepoResult<Option<u64>> {
        let mut stmt = self.conn.prepare("SELECT sequence_number FROM users;")?;
        let mut rows = stmt.query([])?;
        let mut max = None;
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            if !is_numeric_sequence(&value) {
                continue;
            }
            if let Ok(parsed) = value.parse::<u64>() {
                max = max.max(Some(parsed));
            }
        }
        Ok(max)
    }

    fn stats(&self) -> RepoResult<RegistrationStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM users GROUP BY status;")?;
        let mut rows = stmt.query([])?;
        let mut stats = RegistrationStats::default();
        while let Some(row) = rows.next()? {
            let label: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let count = u64::try_from(count).map_err(|_| {
                RepoError::InvalidData(format!("negative count `{count}` for status `{label}`"))
            })?;
            match parse_status_column(&label)? {
                RegistrationStatus::Pending => stats.pending = count,
                RegistrationStatus::Approved => stats.approved = count,
                RegistrationStatus::Rejected => stats.rejected = count,
            }
            stats.total += count;
        }
        Ok(stats)
    }
}

fn map_insert_error(err: rusqlite::Error, record: &Registration) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        let is_unique = failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE;
        if is_unique {
            let on_sequence = message
                .as_deref()
                .is_some_and(|text| text.contains("users.sequence_number"));
            return if on_sequence {
                RepoError::DuplicateKey {
                    field: DuplicateField::SequenceNumber,
                    value: record.sequence_number.clone(),
                }
            } else {
                RepoError::DuplicateKey {
                    field: DuplicateField::Id,
                    value: record.id.clone(),
                }
            };
        }
    }
    err.into()
}

fn parse_registration_row(row: &Row<'_>) -> RepoResult<Registration> {
    let status_text: String = row.get("status")?;
    let record = Registration {
        id: row.get("id")?,
        sequence_number: row.get("sequence_number")?,
        name: row.get("name")?,
        age: row.get("age")?,
        gender: row.get("gender")?,
        address: row.get("address")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        status: parse_status_column(&status_text)?,
        registration_date: row.get("registration_date")?,
        last_updated: row.get("last_updated")?,
    };
    record.validate().map_err(|err| {
        RepoError::InvalidData(format!("row `{}` failed validation: {err}", record.id))
    })?;
    Ok(record)
}

fn parse_status_column(value: &str) -> RepoResult<RegistrationStatus> {
    match value {
        "pending" => Ok(RegistrationStatus::Pending),
        "approved" => Ok(RegistrationStatus::Approved),
        "rejected" => Ok(RegistrationStatus::Rejected),
        other => Err(RepoError::InvalidData(format!(
            "invalid status `{other}` in users.status"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "users")? {
        return Err(RepoError::MissingRequiredTable("users"));
    }

    for column in REQUIRED_USER_COLUMNS {
        if !table_has_column(conn, "users", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
