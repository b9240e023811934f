use std::sync::Arc;

use crate::{
    api::{ApiError, InMemoryUserApi},
    domain::{Role, UserField, UserId, UserPayload},
    form::SessionToken,
    save::{NOT_FOUND_MESSAGE, SaveError, SaveOrchestrator, SaveRequest, SaveTarget},
    tests::support::valid_draft,
};

fn payload(username: &str, email: &str) -> UserPayload {
    UserPayload {
        username: username.to_string(),
        display_name: format!("User {username}"),
        phone: None,
        email: email.to_string(),
        roles: [Role::Guest].into_iter().collect(),
        enabled: true,
    }
}

fn request(target: SaveTarget, payload: UserPayload) -> SaveRequest {
    SaveRequest {
        token: SessionToken::first(),
        target,
        payload,
    }
}

fn orchestrator(api: &InMemoryUserApi) -> SaveOrchestrator {
    SaveOrchestrator::new(Arc::new(api.clone()))
}

#[tokio::test]
async fn create_returns_the_canonical_record() {
    let api = InMemoryUserApi::new();
    let saver = orchestrator(&api);

    let saved = saver
        .save(&request(SaveTarget::Create, valid_draft().to_payload()))
        .await
        .unwrap();
    assert_eq!(saved.id, UserId::new("1"));
    assert_eq!(saved.username, "adminuser");
    assert_eq!(api.calls().create, 1);
}

#[tokio::test]
async fn duplicate_email_maps_to_the_email_field_only() {
    let api = InMemoryUserApi::new();
    api.seed(payload("ada", "ada@example.org"));
    let saver = orchestrator(&api);

    let error = saver
        .save(&request(
            SaveTarget::Create,
            payload("another", "ada@example.org"),
        ))
        .await
        .unwrap_err();
    let SaveError::Rejected {
        field_errors,
        form_errors,
    } = error
    else {
        panic!("expected a rejection");
    };
    assert_eq!(field_errors.get(UserField::Email), Some("Already in use"));
    assert!(!field_errors.contains(UserField::Username));
    assert!(form_errors.is_empty());
}

#[tokio::test]
async fn update_keeps_its_own_username_and_email() {
    let api = InMemoryUserApi::new();
    let ada = api.seed(payload("ada", "ada@example.org")).unwrap();
    let saver = orchestrator(&api);

    let mut changed = payload("ada", "ada@example.org");
    changed.enabled = false;
    let saved = saver
        .save(&request(SaveTarget::Update(ada.id.clone()), changed))
        .await
        .unwrap();
    assert_eq!(saved.id, ada.id);
    assert!(!saved.enabled);
    assert_eq!(saved.created_at, ada.created_at);
}

#[tokio::test]
async fn vanished_record_is_a_not_found_error() {
    let api = InMemoryUserApi::new();
    let ada = api.seed(payload("ada", "ada@example.org")).unwrap();
    assert!(api.remove(&ada.id));
    let saver = orchestrator(&api);

    let error = saver
        .save(&request(
            SaveTarget::Update(ada.id),
            payload("ada", "ada@example.org"),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        error,
        SaveError::NotFound {
            message: NOT_FOUND_MESSAGE.to_string()
        }
    );
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn transport_failure_is_retryable() {
    let api = InMemoryUserApi::new();
    api.fail_next(ApiError::Transport("connection reset".to_string()));
    let saver = orchestrator(&api);
    let submission = request(SaveTarget::Create, valid_draft().to_payload());

    let error = saver.save(&submission).await.unwrap_err();
    assert!(error.is_retryable());
    assert!(error.to_string().contains("connection reset"));

    assert!(saver.save(&submission).await.is_ok());
}

#[tokio::test]
async fn server_side_validation_reaches_the_fields() {
    let api = InMemoryUserApi::new();
    let saver = orchestrator(&api);
    let mut invalid = valid_draft().to_payload();
    invalid.phone = Some("0123".to_string());
    invalid.roles.clear();

    let error = saver
        .save(&request(SaveTarget::Create, invalid))
        .await
        .unwrap_err();
    let SaveError::Rejected { field_errors, .. } = error else {
        panic!("expected a rejection");
    };
    assert!(field_errors.contains(UserField::Roles));
    assert!(field_errors.contains(UserField::Phone));
    assert_eq!(api.users().len(), 0);
}
