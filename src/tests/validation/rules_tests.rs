use crate::{
    domain::{UserDraft, UserField},
    tests::support::valid_draft,
    validation::{normalize, validate, validate_field},
};

#[test]
fn valid_draft_has_no_errors() {
    assert!(validate(&valid_draft()).is_empty());
}

#[test]
fn blank_draft_reports_required_fields_in_order() {
    let errors = validate(&UserDraft::default());
    let fields = errors.iter().map(|(field, _)| field).collect::<Vec<_>>();
    assert_eq!(
        fields,
        vec![
            UserField::Username,
            UserField::DisplayName,
            UserField::Email,
            UserField::Roles
        ]
    );
    assert_eq!(errors.get(UserField::Username), Some("Username is required"));
    assert_eq!(
        errors.get(UserField::DisplayName),
        Some("Display name is required")
    );
    assert_eq!(errors.get(UserField::Roles), Some("Select at least one role"));
}

#[test]
fn mixed_case_username_and_email_normalize_to_lowercase() {
    let mut draft = valid_draft();
    draft.username = " Admin User ".to_string();
    draft.email = "  Admin@Example.ORG ".to_string();

    let normalized = normalize(&draft);
    assert_eq!(normalized.username, "adminuser");
    assert_eq!(normalized.email, "admin@example.org");
    assert!(validate(&draft).is_empty());
    assert_eq!(normalize(&normalized), normalized);
}

#[test]
fn username_rules() {
    let mut draft = valid_draft();
    draft.username = "ab".to_string();
    assert!(validate(&draft).contains(UserField::Username));

    draft.username = "a".repeat(33);
    assert!(validate(&draft).contains(UserField::Username));

    draft.username = "bad!name".to_string();
    let errors = validate(&draft);
    assert_eq!(
        errors.get(UserField::Username),
        Some("Use 3-32 characters: lowercase letters, digits, '.', '_' or '-'")
    );

    draft.username = "ok.name_1-2".to_string();
    assert!(validate(&draft).is_empty());
}

#[test]
fn display_name_is_trimmed_and_printable() {
    let mut draft = valid_draft();
    draft.display_name = "   ".to_string();
    assert_eq!(
        validate(&draft).get(UserField::DisplayName),
        Some("Display name is required")
    );

    draft.display_name = "Bell\u{7}Name".to_string();
    assert!(validate(&draft).contains(UserField::DisplayName));

    draft.display_name = "x".repeat(65);
    assert!(validate(&draft).contains(UserField::DisplayName));

    draft.display_name = "  Grace Hopper  ".to_string();
    assert!(validate(&draft).is_empty());
}

#[test]
fn email_needs_an_address_shape() {
    let mut draft = valid_draft();
    draft.email = "not-an-email".to_string();
    assert_eq!(
        validate(&draft).get(UserField::Email),
        Some("Enter an address like name@example.com")
    );
}

#[test]
fn email_domain_needs_no_dot() {
    let mut draft = valid_draft();
    draft.email = "admin@localhost".to_string();
    assert!(validate(&draft).is_empty());

    draft.email = "admin@@localhost".to_string();
    assert!(validate(&draft).contains(UserField::Email));
    draft.email = "ad min@localhost".to_string();
    assert!(validate(&draft).contains(UserField::Email));
}

#[test]
fn phone_is_optional_and_separators_are_ignored() {
    let mut draft = valid_draft();
    draft.phone = "+1 415-555-0123".to_string();
    assert_eq!(normalize(&draft).phone, "+14155550123");
    assert!(validate(&draft).is_empty());

    draft.phone = "0123".to_string();
    assert!(validate(&draft).contains(UserField::Phone));

    draft.phone = String::new();
    assert!(validate(&draft).is_empty());
}

#[test]
fn field_validation_reports_only_that_field() {
    let mut draft = UserDraft::default();
    draft.username = "validname".to_string();
    assert_eq!(validate_field(&draft, UserField::Username), None);
    assert!(validate_field(&draft, UserField::Email).is_some());
}
