use std::sync::LazyLock;

use jsonschema::{Validator, validator_for};
use serde_json::{Map, Value, json};

use crate::domain::{UserDraft, UserField};

/// JSON Schema describing an acceptable, already normalized user payload.
pub fn user_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "User",
        "type": "object",
        "required": ["username", "displayName", "email", "roles", "enabled"],
        "properties": {
            "username": {
                "type": "string",
                "minLength": 3,
                "maxLength": 32,
                "pattern": "^[a-z0-9._-]{3,32}$"
            },
            "displayName": {
                "type": "string",
                "minLength": 1,
                "maxLength": 64,
                "pattern": "^[^\\x00-\\x1f\\x7f]+$"
            },
            "email": {
                "type": "string",
                "minLength": 1,
                "pattern": "^[^@\\s]+@[^@\\s]+$"
            },
            "phone": {
                "type": "string",
                "pattern": "^\\+?[1-9]\\d{1,14}$"
            },
            "roles": {
                "type": "array",
                "minItems": 1,
                "uniqueItems": true,
                "items": { "enum": ["Guest", "Admin", "SuperAdmin"] }
            },
            "enabled": { "type": "boolean" }
        }
    })
}

static USER_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    validator_for(&user_schema()).expect("built-in user schema must compile")
});

pub(super) fn validator() -> &'static Validator {
    &USER_VALIDATOR
}

/// JSON instance for a normalized draft. An empty phone is omitted, which is
/// how the schema expresses "optional".
pub(super) fn instance(draft: &UserDraft) -> Value {
    let mut object = Map::new();
    object.insert(
        UserField::Username.as_str().into(),
        Value::String(draft.username.clone()),
    );
    object.insert(
        UserField::DisplayName.as_str().into(),
        Value::String(draft.display_name.clone()),
    );
    object.insert(
        UserField::Email.as_str().into(),
        Value::String(draft.email.clone()),
    );
    if !draft.phone.is_empty() {
        object.insert(
            UserField::Phone.as_str().into(),
            Value::String(draft.phone.clone()),
        );
    }
    object.insert(
        UserField::Roles.as_str().into(),
        Value::Array(
            draft
                .roles
                .iter()
                .map(|role| Value::String(role.as_str().to_string()))
                .collect(),
        ),
    );
    object.insert(
        UserField::Enabled.as_str().into(),
        Value::Bool(draft.enabled),
    );
    Value::Object(object)
}

/// Maps a JSON pointer such as `/roles/0` onto the field it belongs to.
pub(super) fn field_for_pointer(pointer: &str) -> Option<UserField> {
    let first = pointer.trim_start_matches('/').split('/').next()?;
    UserField::from_wire(first)
}
