//! Plain-text registration documents.
//!
//! # Responsibility
//! - Render the applicant certificate and the staff registration sheet.
//! - Localize field labels, status labels and dates.
//!
//! # Invariants
//! - Rendering is pure: no I/O, the generation time is passed in.
//! - Every record field appears in every document kind.

use crate::model::registration::{Registration, RegistrationStatus};
use chrono::{DateTime, Utc};

const TEXT_MIME_TYPE: &str = "text/plain";
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Which document to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Applicant-facing certificate with a status remark.
    Certificate,
    /// Staff-facing sheet including the last update date.
    RegistrationDetails,
}

impl DocumentKind {
    fn file_suffix(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::RegistrationDetails => "registration_details",
        }
    }
}

/// Output language for labels and dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentLocale {
    /// Bengali labels, dates in Bengali digits.
    #[default]
    Bengali,
    English,
}

impl DocumentLocale {
    /// Parses `bn`/`en` style tags; unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "bn" | "bn-bd" | "bengali" => Some(Self::Bengali),
            "en" | "en-us" | "en-gb" | "english" => Some(Self::English),
            _ => None,
        }
    }
}

/// A rendered document ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    /// `<id>_certificate.txt` or `<id>_registration_details.txt`.
    pub file_name: String,
    pub mime_type: &'static str,
    pub content: String,
}

struct Labels {
    organization: &'static str,
    certificate_title: &'static str,
    details_title: &'static str,
    certifies: &'static str,
    name: &'static str,
    id: &'static str,
    sequence_number: &'static str,
    age: &'static str,
    age_unit: &'static str,
    gender: &'static str,
    address: &'static str,
    phone: &'static str,
    email: &'static str,
    status: &'static str,
    registration_date: &'static str,
    last_updated: &'static str,
    issued: &'static str,
    generated: &'static str,
    authority: &'static str,
    not_provided: &'static str,
    pending: &'static str,
    approved: &'static str,
    rejected: &'static str,
    remark_pending: &'static str,
    remark_approved: &'static str,
    remark_rejected: &'static str,
}

const BENGALI: Labels = Labels {
    organization: "পেন প্যাকিং জব",
    certificate_title: "অফিসিয়াল সার্টিফিকেট",
    details_title: "ব্যবহারকারী রেজিস্ট্রেশন বিবরণ",
    certifies: "এই সার্টিফিকেট প্রমাণ করে যে:",
    name: "নাম",
    id: "ইউজার আইডি",
    sequence_number: "ইউজার নম্বর",
    age: "বয়স",
    age_unit: "বছর",
    gender: "লিঙ্গ",
    address: "ঠিকানা",
    phone: "ফোন",
    email: "ইমেইল",
    status: "স্ট্যাটাস",
    registration_date: "রেজিস্ট্রেশন তারিখ",
    last_updated: "সর্বশেষ আপডেট",
    issued: "জারি করা হয়েছে",
    generated: "তৈরি করা হয়েছে",
    authority: "অনুমোদিত কর্তৃপক্ষ",
    not_provided: "প্রদান করা হয়নি",
    pending: "অপেক্ষমান",
    approved: "অনুমোদিত",
    rejected: "প্রত্যাখ্যাত",
    remark_pending: "এই আবেদনটি এখনও পর্যালোচনাধীন রয়েছে।",
    remark_approved: "এই ব্যক্তি পেন প্যাকিং কাজের জন্য অনুমোদিত এবং কাজ শুরু করতে পারেন।",
    remark_rejected: "এই আবেদনটি প্রত্যাখ্যাত হয়েছে।",
};

const ENGLISH: Labels = Labels {
    organization: "Pen Packing Job",
    certificate_title: "Official Certificate",
    details_title: "User Registration Details",
    certifies: "This certificate confirms that:",
    name: "Name",
    id: "User ID",
    sequence_number: "User Number",
    age: "Age",
    age_unit: "years",
    gender: "Gender",
    address: "Address",
    phone: "Phone",
    email: "Email",
    status: "Status",
    registration_date: "Registration Date",
    last_updated: "Last Updated",
    issued: "Issued",
    generated: "Generated",
    authority: "Authorized Authority",
    not_provided: "Not provided",
    pending: "Pending",
    approved: "Approved",
    rejected: "Rejected",
    remark_pending: "This application is still under review.",
    remark_approved: "This person is approved for pen packing work and may start working.",
    remark_rejected: "This application has been rejected.",
};

fn labels(locale: DocumentLocale) -> &'static Labels {
    match locale {
        DocumentLocale::Bengali => &BENGALI,
        DocumentLocale::English => &ENGLISH,
    }
}

/// Localized label for a status.
pub fn status_label(status: RegistrationStatus, locale: DocumentLocale) -> &'static str {
    let labels = labels(locale);
    match status {
        RegistrationStatus::Pending => labels.pending,
        RegistrationStatus::Approved => labels.approved,
        RegistrationStatus::Rejected => labels.rejected,
    }
}

/// Formats epoch millis as `dd/mm/yyyy` (UTC), in Bengali digits for the
/// Bengali locale. Out-of-range values render as the raw number.
pub fn format_date(epoch_ms: i64, locale: DocumentLocale) -> String {
    let formatted = match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(datetime) => datetime.format(DATE_FORMAT).to_string(),
        None => epoch_ms.to_string(),
    };
    match locale {
        DocumentLocale::Bengali => to_bengali_digits(&formatted),
        DocumentLocale::English => formatted,
    }
}

/// Renders `kind` for `record`, stamped with `generated_at_ms`.
pub fn render_document(
    record: &Registration,
    kind: DocumentKind,
    locale: DocumentLocale,
    generated_at_ms: i64,
) -> ExportedDocument {
    let content = match kind {
        DocumentKind::Certificate => render_certificate(record, locale, generated_at_ms),
        DocumentKind::RegistrationDetails => render_details(record, locale, generated_at_ms),
    };
    ExportedDocument {
        file_name: format!("{}_{}.txt", record.id, kind.file_suffix()),
        mime_type: TEXT_MIME_TYPE,
        content,
    }
}

fn render_certificate(
    record: &Registration,
    locale: DocumentLocale,
    generated_at_ms: i64,
) -> String {
    let l = labels(locale);
    let status = match record.status {
        RegistrationStatus::Approved => format!("{} ✓", l.approved),
        other => status_label(other, locale).to_string(),
    };
    let remark = match record.status {
        RegistrationStatus::Pending => l.remark_pending,
        RegistrationStatus::Approved => l.remark_approved,
        RegistrationStatus::Rejected => l.remark_rejected,
    };

    let lines = [
        format!("{} - {}", l.organization, l.certificate_title),
        String::new(),
        l.certifies.to_string(),
        String::new(),
        format!("{}: {}", l.name, record.name),
        format!("{}: {}", l.id, record.id),
        format!("{}: {}", l.sequence_number, record.sequence_number),
        format!("{}: {} {}", l.age, record.age, l.age_unit),
        format!("{}: {}", l.gender, record.gender),
        format!("{}: {}", l.address, record.address),
        format!("{}: {}", l.phone, or_placeholder(record.phone.as_deref(), l)),
        format!("{}: {}", l.email, or_placeholder(record.email.as_deref(), l)),
        String::new(),
        format!(
            "{}: {}",
            l.registration_date,
            format_date(record.registration_date, locale)
        ),
        format!("{}: {}", l.status, status),
        String::new(),
        remark.to_string(),
        String::new(),
        format!("{}: {}", l.issued, format_date(generated_at_ms, locale)),
        String::new(),
        l.organization.to_string(),
        l.authority.to_string(),
        String::new(),
    ];
    lines.join("\n")
}

fn render_details(record: &Registration, locale: DocumentLocale, generated_at_ms: i64) -> String {
    let l = labels(locale);
    let lines = [
        format!("{} - {}", l.organization, l.details_title),
        String::new(),
        format!("{}: {}", l.id, record.id),
        format!("{}: {}", l.sequence_number, record.sequence_number),
        format!("{}: {}", l.name, record.name),
        format!("{}: {}", l.age, record.age),
        format!("{}: {}", l.gender, record.gender),
        format!("{}: {}", l.address, record.address),
        format!("{}: {}", l.phone, or_placeholder(record.phone.as_deref(), l)),
        format!("{}: {}", l.email, or_placeholder(record.email.as_deref(), l)),
        format!("{}: {}", l.status, status_label(record.status, locale)),
        format!(
            "{}: {}",
            l.registration_date,
            format_date(record.registration_date, locale)
        ),
        format!(
            "{}: {}",
            l.last_updated,
            format_date(record.last_updated, locale)
        ),
        String::new(),
        format!("{}: {}", l.generated, format_date(generated_at_ms, locale)),
        String::new(),
    ];
    lines.join("\n")
}

fn or_placeholder<'a>(value: Option<&'a str>, labels: &'a Labels) -> &'a str {
    value.unwrap_or(labels.not_provided)
}

fn to_bengali_digits(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch.to_digit(10) {
            Some(digit) => char::from_u32('০' as u32 + digit).unwrap_or(ch),
            None => ch,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{format_date, to_bengali_digits, DocumentLocale};

    #[test]
    fn bengali_digits_replace_ascii_digits_only() {
        assert_eq!(to_bengali_digits("19/10/2026"), "১৯/১০/২০২৬");
    }

    #[test]
    fn format_date_uses_day_month_year() {
        // 2026-10-19T00:00:00Z
        assert_eq!(
            format_date(1_792_368_000_000, DocumentLocale::English),
            "19/10/2026"
        );
    }

    #[test]
    fn locale_parse_accepts_common_tags() {
        assert_eq!(DocumentLocale::parse("bn-BD"), Some(DocumentLocale::Bengali));
        assert_eq!(DocumentLocale::parse("EN"), Some(DocumentLocale::English));
        assert_eq!(DocumentLocale::parse("fr"), None);
    }
}
