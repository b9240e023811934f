//! Client-side validation of user drafts.
//!
//! Everything here is pure: a candidate goes in, a [`FieldErrors`] map comes
//! out. Candidates are normalized (lowercase username and email, trimmed
//! display name, phone without separators) before the rules run, and the same
//! normalization is applied to the payload that gets submitted.

mod schema;

use std::{collections::BTreeSet, sync::LazyLock};

use indexmap::IndexMap;
use regex::Regex;

use crate::domain::{UserDraft, UserField};

pub use schema::user_schema;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static PHONE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("phone separator pattern"));

/// Per-field error messages in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: IndexMap<UserField, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: UserField) -> Option<&str> {
        self.entries.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: UserField) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn insert(&mut self, field: UserField, message: impl Into<String>) {
        self.entries.insert(field, message.into());
    }

    pub fn remove(&mut self, field: UserField) -> Option<String> {
        self.entries.shift_remove(&field)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserField, &str)> {
        self.entries
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }
}

impl FromIterator<(UserField, String)> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = (UserField, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Canonical form of a draft: the value the server will store.
pub fn normalize(candidate: &UserDraft) -> UserDraft {
    UserDraft {
        username: WHITESPACE
            .replace_all(&candidate.username, "")
            .to_lowercase(),
        display_name: candidate.display_name.trim().to_string(),
        email: candidate.email.trim().to_lowercase(),
        phone: PHONE_SEPARATORS
            .replace_all(&candidate.phone, "")
            .into_owned(),
        roles: candidate.roles.clone(),
        enabled: candidate.enabled,
    }
}

/// Whole-record validation. An empty result means the draft may be submitted.
pub fn validate(candidate: &UserDraft) -> FieldErrors {
    let normalized = normalize(candidate);
    let instance = schema::instance(&normalized);

    let mut failed = BTreeSet::new();
    for error in schema::validator().iter_errors(&instance) {
        let pointer = error.instance_path.to_string();
        if let Some(field) = schema::field_for_pointer(&pointer) {
            failed.insert(field);
        }
    }

    UserField::ALL
        .into_iter()
        .filter(|field| failed.contains(field))
        .map(|field| (field, message_for(field, &normalized)))
        .collect()
}

/// Validation of a single field, as run when the field loses focus.
pub fn validate_field(candidate: &UserDraft, field: UserField) -> Option<String> {
    validate(candidate).remove(field)
}

fn message_for(field: UserField, normalized: &UserDraft) -> String {
    let empty = match field {
        UserField::Roles => normalized.roles.is_empty(),
        other => normalized.text(other).is_some_and(str::is_empty),
    };
    if empty && field.is_required() {
        return match field {
            UserField::Roles => "Select at least one role".to_string(),
            other => format!("{} is required", other.label()),
        };
    }
    match field {
        UserField::Username => {
            "Use 3-32 characters: lowercase letters, digits, '.', '_' or '-'".to_string()
        }
        UserField::DisplayName => "Use 1-64 printable characters".to_string(),
        UserField::Email => "Enter an address like name@example.com".to_string(),
        UserField::Phone => "Enter an E.164 number such as +14155550123".to_string(),
        UserField::Roles => "Select at least one role".to_string(),
        UserField::Enabled => "Invalid value".to_string(),
    }
}
