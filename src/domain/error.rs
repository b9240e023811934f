use thiserror::Error;

use super::user::UserField;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("'{0}' is not an editable field")]
    NotEditable(String),
    #[error("{field} expects a {expected} value")]
    KindMismatch {
        field: UserField,
        expected: &'static str,
    },
    #[error("the form is read-only while a save is in flight")]
    SaveInFlight,
}
