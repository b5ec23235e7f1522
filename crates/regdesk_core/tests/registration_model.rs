use regdesk_core::{
    Registration, RegistrationForm, RegistrationStatus, RegistrationValidationError,
};

#[test]
fn new_pending_forces_pending_status_and_trims_fields() {
    let form = RegistrationForm {
        name: "  Jamal  ".to_string(),
        age: Some(40),
        gender: " অন্যান্য ".to_string(),
        address: " Rajshahi ".to_string(),
        phone: Some("   ".to_string()),
        email: Some(" jamal@example.com ".to_string()),
    };

    let record = Registration::new_pending("PPJ001", "1001", &form, 5_000).unwrap();
    assert_eq!(record.status, RegistrationStatus::Pending);
    assert_eq!(record.name, "Jamal");
    assert_eq!(record.gender, "অন্যান্য");
    assert_eq!(record.phone, None);
    assert_eq!(record.email.as_deref(), Some("jamal@example.com"));
    assert_eq!(record.registration_date, 5_000);
    assert_eq!(record.last_updated, 5_000);
}

#[test]
fn form_validation_names_first_missing_field() {
    let mut form = RegistrationForm {
        name: "A".to_string(),
        age: Some(20),
        gender: "পুরুষ".to_string(),
        address: "B".to_string(),
        ..RegistrationForm::default()
    };
    assert!(form.validate().is_ok());

    form.gender.clear();
    assert_eq!(
        form.validate(),
        Err(RegistrationValidationError::MissingField("gender"))
    );

    form.age = None;
    assert_eq!(
        form.validate(),
        Err(RegistrationValidationError::MissingField("age"))
    );
}

#[test]
fn record_validation_rejects_malformed_identifiers() {
    let form = RegistrationForm {
        name: "A".to_string(),
        age: Some(20),
        gender: "পুরুষ".to_string(),
        address: "B".to_string(),
        ..RegistrationForm::default()
    };

    assert!(matches!(
        Registration::new_pending("USR001", "1001", &form, 1),
        Err(RegistrationValidationError::InvalidId(_))
    ));
    assert!(matches!(
        Registration::new_pending("PPJ001", "10a1", &form, 1),
        Err(RegistrationValidationError::InvalidSequenceNumber(_))
    ));
}

#[test]
fn status_from_str_reports_validation_error() {
    let err = "archived".parse::<RegistrationStatus>().unwrap_err();
    assert_eq!(
        err,
        RegistrationValidationError::InvalidStatus("archived".to_string())
    );
    assert_eq!(
        "rejected".parse::<RegistrationStatus>().unwrap(),
        RegistrationStatus::Rejected
    );
}

#[test]
fn registration_serializes_with_lowercase_status() {
    let form = RegistrationForm {
        name: "A".to_string(),
        age: Some(20),
        gender: "পুরুষ".to_string(),
        address: "B".to_string(),
        ..RegistrationForm::default()
    };
    let record = Registration::new_pending("PPJ001", "1001", &form, 1).unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["status"], "pending");
    assert_eq!(json["sequence_number"], "1001");

    let back: Registration = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
}
