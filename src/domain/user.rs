use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DraftError;

/// Opaque, server-assigned identifier. Accepted from the wire as a string or a
/// number and always carried as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawUserId", into = "String")]
pub struct UserId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Number(u64),
}

impl From<RawUserId> for UserId {
    fn from(raw: RawUserId) -> Self {
        match raw {
            RawUserId::Text(text) => UserId(text),
            RawUserId::Number(number) => UserId(number.to_string()),
        }
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Guest,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Guest, Role::Admin, Role::SuperAdmin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "Guest",
            Role::Admin => "Admin",
            Role::SuperAdmin => "SuperAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-authoritative user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email: String,
    pub roles: BTreeSet<Role>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The editable fields of a [`User`]. `id`, `createdAt` and `updatedAt` have
/// no variant and cannot be targeted by an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserField {
    Username,
    DisplayName,
    Email,
    Phone,
    Roles,
    Enabled,
}

impl UserField {
    pub const ALL: [UserField; 6] = [
        UserField::Username,
        UserField::DisplayName,
        UserField::Email,
        UserField::Phone,
        UserField::Roles,
        UserField::Enabled,
    ];

    /// Name used on the wire and in server error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            UserField::Username => "username",
            UserField::DisplayName => "displayName",
            UserField::Email => "email",
            UserField::Phone => "phone",
            UserField::Roles => "roles",
            UserField::Enabled => "enabled",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        UserField::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            UserField::Username => "Username",
            UserField::DisplayName => "Display name",
            UserField::Email => "Email",
            UserField::Phone => "Phone",
            UserField::Roles => "Roles",
            UserField::Enabled => "Enabled",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, UserField::Phone | UserField::Enabled)
    }

    fn kind(self) -> &'static str {
        match self {
            UserField::Roles => "role set",
            UserField::Enabled => "flag",
            _ => "text",
        }
    }
}

impl FromStr for UserField {
    type Err = DraftError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        UserField::from_wire(name).ok_or_else(|| DraftError::NotEditable(name.to_string()))
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Roles(BTreeSet<Role>),
    Flag(bool),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        FieldValue::Roles(roles.into_iter().collect())
    }
}

/// In-progress edit of a user, holding only editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub roles: BTreeSet<Role>,
    pub enabled: bool,
}

impl Default for UserDraft {
    fn default() -> Self {
        Self {
            username: String::new(),
            display_name: String::new(),
            email: String::new(),
            phone: String::new(),
            roles: BTreeSet::new(),
            enabled: true,
        }
    }
}

impl From<&User> for UserDraft {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            roles: user.roles.clone(),
            enabled: user.enabled,
        }
    }
}

impl From<&UserPayload> for UserDraft {
    fn from(payload: &UserPayload) -> Self {
        Self {
            username: payload.username.clone(),
            display_name: payload.display_name.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone().unwrap_or_default(),
            roles: payload.roles.clone(),
            enabled: payload.enabled,
        }
    }
}

impl UserDraft {
    pub fn get(&self, field: UserField) -> FieldValue {
        match field {
            UserField::Username => FieldValue::Text(self.username.clone()),
            UserField::DisplayName => FieldValue::Text(self.display_name.clone()),
            UserField::Email => FieldValue::Text(self.email.clone()),
            UserField::Phone => FieldValue::Text(self.phone.clone()),
            UserField::Roles => FieldValue::Roles(self.roles.clone()),
            UserField::Enabled => FieldValue::Flag(self.enabled),
        }
    }

    pub fn set(&mut self, field: UserField, value: FieldValue) -> Result<(), DraftError> {
        match (field, value) {
            (UserField::Username, FieldValue::Text(text)) => self.username = text,
            (UserField::DisplayName, FieldValue::Text(text)) => self.display_name = text,
            (UserField::Email, FieldValue::Text(text)) => self.email = text,
            (UserField::Phone, FieldValue::Text(text)) => self.phone = text,
            (UserField::Roles, FieldValue::Roles(roles)) => self.roles = roles,
            (UserField::Enabled, FieldValue::Flag(flag)) => self.enabled = flag,
            (field, _) => {
                return Err(DraftError::KindMismatch {
                    field,
                    expected: field.kind(),
                });
            }
        }
        Ok(())
    }

    pub fn text(&self, field: UserField) -> Option<&str> {
        match field {
            UserField::Username => Some(&self.username),
            UserField::DisplayName => Some(&self.display_name),
            UserField::Email => Some(&self.email),
            UserField::Phone => Some(&self.phone),
            UserField::Roles | UserField::Enabled => None,
        }
    }

    /// Request body for create and update calls. Built from whatever the draft
    /// holds; callers normalize first.
    pub fn to_payload(&self) -> UserPayload {
        UserPayload {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            phone: if self.phone.is_empty() {
                None
            } else {
                Some(self.phone.clone())
            },
            email: self.email.clone(),
            roles: self.roles.clone(),
            enabled: self.enabled,
        }
    }
}

/// Wire body of create/update requests: a user without `id`, `createdAt` and
/// `updatedAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub username: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email: String,
    pub roles: BTreeSet<Role>,
    pub enabled: bool,
}
