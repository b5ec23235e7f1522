//! Registration domain model.
//!
//! # Responsibility
//! - Define the canonical registration record owned by the Record Store.
//! - Provide field-level validation shared by insert and edit paths.
//!
//! # Invariants
//! - `id` follows `PPJ<digits>` and is never reused for another record.
//! - `sequence_number` is a purely numeric string.
//! - `status` is always one of `pending|approved|rejected`.
//! - `registration_date` never changes after creation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Human-readable identifier prefix for every registration.
pub const ID_PREFIX: &str = "PPJ";

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^PPJ(\d+)$").expect("valid id regex"));
static SEQUENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("valid sequence regex"));

/// Primary key of a registration record, e.g. `PPJ001`.
pub type RegistrationId = String;

/// Review state of a registration.
///
/// Every state may move to every other state; re-opening an approved or
/// rejected record back to `Pending` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Submitted and awaiting review.
    #[default]
    Pending,
    /// Accepted by staff.
    Approved,
    /// Declined by staff.
    Rejected,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Storage/wire label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a storage/wire label. Surrounding whitespace and case are ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl Display for RegistrationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = RegistrationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RegistrationValidationError::InvalidStatus(s.to_string()))
    }
}

/// Field-level validation failures for registration data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    /// A required text field is empty after trimming.
    MissingField(&'static str),
    /// `id` does not follow `PPJ<digits>`.
    InvalidId(String),
    /// `sequence_number` is not a purely numeric string.
    InvalidSequenceNumber(String),
    /// Status label is not one of `pending|approved|rejected`.
    InvalidStatus(String),
    /// `last_updated` is earlier than `registration_date`.
    TimestampOrder {
        registration_date: i64,
        last_updated: i64,
    },
}

impl Display for RegistrationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is missing"),
            Self::InvalidId(value) => {
                write!(f, "invalid registration id `{value}`; expected PPJ<digits>")
            }
            Self::InvalidSequenceNumber(value) => {
                write!(f, "invalid sequence number `{value}`; expected digits only")
            }
            Self::InvalidStatus(value) => write!(
                f,
                "invalid status `{value}`; expected pending|approved|rejected"
            ),
            Self::TimestampOrder {
                registration_date,
                last_updated,
            } => write!(
                f,
                "last_updated ({last_updated}) must be >= registration_date ({registration_date})"
            ),
        }
    }
}

impl Error for RegistrationValidationError {}

/// Canonical persisted registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Primary key, `PPJ` + zero-padded decimal.
    pub id: RegistrationId,
    /// Numeric string, unique across all records, starts at `1001`.
    pub sequence_number: String,
    pub name: String,
    /// Suggested range is 18..=65 but it is not enforced.
    pub age: u32,
    /// Free label from a small open set (the UI offers three).
    pub gender: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: RegistrationStatus,
    /// Unix epoch milliseconds. Immutable after creation.
    pub registration_date: i64,
    /// Unix epoch milliseconds. Bumped by every mutation.
    pub last_updated: i64,
}

impl Registration {
    /// Builds a new pending record from validated form input and an
    /// allocated identifier pair.
    ///
    /// # Invariants
    /// - `status` is forced to `Pending`.
    /// - `registration_date == last_updated == now_ms`.
    pub fn new_pending(
        id: impl Into<String>,
        sequence_number: impl Into<String>,
        form: &RegistrationForm,
        now_ms: i64,
    ) -> Result<Self, RegistrationValidationError> {
        let age = form.age.ok_or(RegistrationValidationError::MissingField("age"))?;
        let record = Self {
            id: id.into(),
            sequence_number: sequence_number.into(),
            name: form.name.trim().to_string(),
            age,
            gender: form.gender.trim().to_string(),
            address: form.address.trim().to_string(),
            phone: normalize_optional(form.phone.as_deref()),
            email: normalize_optional(form.email.as_deref()),
            status: RegistrationStatus::Pending,
            registration_date: now_ms,
            last_updated: now_ms,
        };
        record.validate()?;
        Ok(record)
    }

    /// Validates identifier formats, required fields and timestamp order.
    pub fn validate(&self) -> Result<(), RegistrationValidationError> {
        if parse_id_suffix(&self.id).is_none() {
            return Err(RegistrationValidationError::InvalidId(self.id.clone()));
        }
        if !is_numeric_sequence(&self.sequence_number) {
            return Err(RegistrationValidationError::InvalidSequenceNumber(
                self.sequence_number.clone(),
            ));
        }
        require_text("name", &self.name)?;
        require_text("gender", &self.gender)?;
        require_text("address", &self.address)?;
        if self.last_updated < self.registration_date {
            return Err(RegistrationValidationError::TimestampOrder {
                registration_date: self.registration_date,
                last_updated: self.last_updated,
            });
        }
        Ok(())
    }

    /// Case-insensitive substring match over `id`, `sequence_number` and
    /// `name`. An empty needle matches everything.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.id, &self.sequence_number, &self.name]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Applicant-supplied fields collected by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    /// `None` when the form field was left blank.
    pub age: Option<u32>,
    pub gender: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl RegistrationForm {
    /// Checks required fields before any store call is attempted.
    pub fn validate(&self) -> Result<(), RegistrationValidationError> {
        require_text("name", &self.name)?;
        if self.age.is_none() {
            return Err(RegistrationValidationError::MissingField("age"));
        }
        require_text("gender", &self.gender)?;
        require_text("address", &self.address)?;
        Ok(())
    }
}

/// Partial edit of an existing registration.
///
/// `None` leaves a field untouched. For `phone`/`email`, `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub status: Option<RegistrationStatus>,
}

impl RegistrationPatch {
    /// Returns a patch with required text fields trimmed and blank optional
    /// contact values turned into clears.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.as_deref().map(|value| value.trim().to_string()),
            age: self.age,
            gender: self.gender.as_deref().map(|value| value.trim().to_string()),
            address: self.address.as_deref().map(|value| value.trim().to_string()),
            phone: self
                .phone
                .as_ref()
                .map(|value| normalize_optional(value.as_deref())),
            email: self
                .email
                .as_ref()
                .map(|value| normalize_optional(value.as_deref())),
            status: self.status,
        }
    }

    /// Rejects patches that would blank out a required field.
    pub fn validate(&self) -> Result<(), RegistrationValidationError> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", name)?;
        }
        if let Some(gender) = self.gender.as_deref() {
            require_text("gender", gender)?;
        }
        if let Some(address) = self.address.as_deref() {
            require_text("address", address)?;
        }
        Ok(())
    }
}

/// Extracts the numeric suffix of a `PPJ<digits>` identifier.
pub fn parse_id_suffix(id: &str) -> Option<u64> {
    ID_RE
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
}

/// Formats a sequential identifier, zero-padded to three digits.
pub fn format_id(suffix: u64) -> RegistrationId {
    format!("{ID_PREFIX}{suffix:03}")
}

/// Returns whether `value` is a non-empty, digits-only string.
pub fn is_numeric_sequence(value: &str) -> bool {
    SEQUENCE_RE.is_match(value)
}

fn require_text(field: &'static str, value: &str) -> Result<(), RegistrationValidationError> {
    if value.trim().is_empty() {
        return Err(RegistrationValidationError::MissingField(field));
    }
    Ok(())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{format_id, parse_id_suffix, RegistrationPatch, RegistrationStatus};

    #[test]
    fn id_suffix_parses_only_prefixed_digits() {
        assert_eq!(parse_id_suffix("PPJ001"), Some(1));
        assert_eq!(parse_id_suffix("PPJ123456"), Some(123_456));
        assert_eq!(parse_id_suffix("ppj001"), None);
        assert_eq!(parse_id_suffix("PPJ"), None);
        assert_eq!(parse_id_suffix("PPJ12a"), None);
    }

    #[test]
    fn format_id_pads_to_three_digits() {
        assert_eq!(format_id(1), "PPJ001");
        assert_eq!(format_id(42), "PPJ042");
        assert_eq!(format_id(1234), "PPJ1234");
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(
            RegistrationStatus::parse(" Approved "),
            Some(RegistrationStatus::Approved)
        );
        assert_eq!(RegistrationStatus::parse("bogus"), None);
    }

    #[test]
    fn patch_normalization_turns_blank_contact_into_clear() {
        let patch = RegistrationPatch {
            phone: Some(Some("   ".to_string())),
            name: Some("  Rahim ".to_string()),
            ..RegistrationPatch::default()
        };
        let normalized = patch.normalized();
        assert_eq!(normalized.phone, Some(None));
        assert_eq!(normalized.name.as_deref(), Some("Rahim"));
    }
}
