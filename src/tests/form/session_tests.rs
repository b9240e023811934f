use std::collections::BTreeSet;

use crate::{
    api::{ErrorPayload, codes},
    domain::{DraftError, FieldValue, Role, UserField},
    form::{FormMode, FormSession, SessionStatus, SessionToken, SubmitOutcome},
    save::{SaveError, SaveTarget},
    tests::support::{user, valid_draft},
};

fn filled_create_session() -> FormSession {
    let mut session = FormSession::create(SessionToken::first());
    let draft = valid_draft();
    for field in UserField::ALL {
        session.set_field(field, draft.get(field)).unwrap();
    }
    session
}

#[test]
fn create_starts_blank_and_enabled() {
    let session = FormSession::create(SessionToken::first());
    assert_eq!(session.mode(), FormMode::Create);
    assert_eq!(session.bound_id(), None);
    assert!(session.draft().enabled);
    assert!(session.draft().roles.is_empty());
    assert!(!session.is_dirty());
    assert!(!session.can_save());
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[test]
fn edit_binds_to_the_record() {
    let record = user("12", "grace");
    let session = FormSession::edit(SessionToken::first(), record.clone());
    assert_eq!(session.mode(), FormMode::Edit);
    assert_eq!(session.bound_id(), Some(&record.id));
    assert_eq!(session.draft().username, "grace");
    assert!(!session.is_dirty());
}

#[test]
fn dirty_tracks_difference_from_bound_values() {
    let mut session = FormSession::edit(SessionToken::first(), user("1", "ada"));
    session
        .set_field(UserField::DisplayName, FieldValue::text("Countess"))
        .unwrap();
    assert!(session.is_field_dirty(UserField::DisplayName));
    assert!(session.is_dirty());

    session
        .set_field(UserField::DisplayName, FieldValue::text("User ada"))
        .unwrap();
    assert!(!session.is_dirty());
}

#[test]
fn save_is_gated_on_dirty_valid_and_idle() {
    let mut session = FormSession::edit(SessionToken::first(), user("1", "ada"));
    assert!(!session.can_save());

    session
        .set_field(UserField::Email, FieldValue::text("broken"))
        .unwrap();
    assert!(session.is_dirty());
    assert!(!session.can_save());
    session.blur_field(UserField::Email);
    assert!(session.errors().contains(UserField::Email));

    session
        .set_field(UserField::Email, FieldValue::text("ada@lovelace.dev"))
        .unwrap();
    assert!(session.can_save());

    let SubmitOutcome::Submitted(request) = session.try_save() else {
        panic!("expected a submission");
    };
    assert_eq!(request.target, SaveTarget::Update(user("1", "ada").id));
    assert!(session.is_saving());
    assert!(!session.can_save());
    assert_eq!(session.try_save(), SubmitOutcome::Ignored);
    assert_eq!(
        session.set_field(UserField::Email, FieldValue::text("x@y.z")),
        Err(DraftError::SaveInFlight)
    );
}

#[test]
fn field_errors_appear_when_the_field_loses_focus() {
    let mut session = FormSession::create(SessionToken::first());
    session
        .set_field(UserField::Username, FieldValue::text("a"))
        .unwrap();
    assert!(session.errors().is_empty());

    session.blur_field(UserField::Username);
    assert!(session.errors().contains(UserField::Username));
    assert!(!session.errors().contains(UserField::Email));

    session
        .set_field(UserField::Username, FieldValue::text("ab"))
        .unwrap();
    assert!(session.errors().contains(UserField::Username));
    session
        .set_field(UserField::Username, FieldValue::text("abc"))
        .unwrap();
    assert!(session.errors().is_empty());
}

#[test]
fn partial_create_draft_is_not_saveable() {
    let mut session = FormSession::create(SessionToken::first());
    session
        .set_field(UserField::Username, FieldValue::text("newbie"))
        .unwrap();
    assert!(session.is_dirty());
    assert!(session.errors().is_empty());
    assert!(!session.can_save());

    assert_eq!(session.try_save(), SubmitOutcome::Blocked { issues: 3 });
    for field in [UserField::DisplayName, UserField::Email, UserField::Roles] {
        assert!(session.errors().contains(field), "{field:?}");
    }
}

#[test]
fn pristine_form_does_not_submit() {
    let mut session = FormSession::edit(SessionToken::first(), user("1", "ada"));
    assert_eq!(session.try_save(), SubmitOutcome::Ignored);
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[test]
fn cleared_roles_block_submission() {
    let mut session = FormSession::edit(SessionToken::first(), user("1", "ada"));
    session
        .set_field(UserField::Roles, FieldValue::Roles(BTreeSet::new()))
        .unwrap();

    assert_eq!(session.try_save(), SubmitOutcome::Blocked { issues: 1 });
    assert_eq!(session.status(), SessionStatus::SaveFailed);
    assert_eq!(
        session.errors().get(UserField::Roles),
        Some("Select at least one role")
    );
}

#[test]
fn submission_carries_normalized_payload() {
    let mut session = filled_create_session();
    session
        .set_field(UserField::Username, FieldValue::text("AdminUser"))
        .unwrap();
    session
        .set_field(UserField::Email, FieldValue::text(" Admin@Example.org"))
        .unwrap();

    let SubmitOutcome::Submitted(request) = session.try_save() else {
        panic!("expected a submission");
    };
    assert_eq!(request.target, SaveTarget::Create);
    assert_eq!(request.token, SessionToken::first());
    assert_eq!(request.payload.username, "adminuser");
    assert_eq!(request.payload.email, "admin@example.org");
    assert_eq!(request.payload.phone, None);
    // the draft keeps what the user typed
    assert_eq!(session.draft().username, "AdminUser");
}

#[test]
fn server_rejection_keeps_draft_and_dirty_flags() {
    let mut session = filled_create_session();
    let dirty_before = session.dirty_fields().collect::<Vec<_>>();
    let SubmitOutcome::Submitted(request) = session.try_save() else {
        panic!("expected a submission");
    };
    let error = SaveError::from_api(
        crate::api::ApiError::rejected(
            409,
            ErrorPayload::new(codes::DUPLICATE).with_detail("email", ""),
        ),
        &request.target,
    );
    session.fail_save(&error);

    assert_eq!(session.status(), SessionStatus::SaveFailed);
    assert_eq!(session.errors().get(UserField::Email), Some("Already in use"));
    assert!(!session.errors().contains(UserField::Username));
    assert_eq!(session.draft(), &valid_draft());
    assert_eq!(session.dirty_fields().collect::<Vec<_>>(), dirty_before);

    assert!(!session.can_save());
    assert_eq!(session.try_save(), SubmitOutcome::Blocked { issues: 1 });
    assert_eq!(session.errors().get(UserField::Email), Some("Already in use"));

    session
        .set_field(UserField::Email, FieldValue::text("other@example.org"))
        .unwrap();
    assert!(session.errors().is_empty());
    assert!(session.can_save());
}

#[test]
fn read_only_fields_cannot_be_edited_by_name() {
    let mut session = FormSession::edit(SessionToken::first(), user("1", "ada"));
    for name in ["id", "createdAt", "updatedAt"] {
        assert_eq!(
            session.set_named_field(name, FieldValue::text("x")),
            Err(DraftError::NotEditable(name.to_string()))
        );
    }
    session
        .set_named_field("displayName", FieldValue::text("Ada"))
        .unwrap();
    assert!(session.is_field_dirty(UserField::DisplayName));
}

#[test]
fn value_kind_must_match_the_field() {
    let mut session = FormSession::create(SessionToken::first());
    assert!(matches!(
        session.set_field(UserField::Enabled, FieldValue::text("yes")),
        Err(DraftError::KindMismatch { .. })
    ));
    session
        .set_field(UserField::Roles, FieldValue::roles([Role::Guest]))
        .unwrap();
    assert!(session.is_field_dirty(UserField::Roles));
}

#[test]
fn discard_restores_bound_values_unless_saving() {
    let mut session = FormSession::edit(SessionToken::first(), user("1", "ada"));
    session
        .set_field(UserField::DisplayName, FieldValue::text("Changed"))
        .unwrap();
    assert!(session.discard());
    assert!(!session.is_dirty());
    assert_eq!(session.draft().display_name, "User ada");

    session
        .set_field(UserField::DisplayName, FieldValue::text("Changed"))
        .unwrap();
    assert!(matches!(session.try_save(), SubmitOutcome::Submitted(_)));
    assert!(!session.discard());
    assert_eq!(session.draft().display_name, "Changed");
}
