//! Create/update sequencing and server error mapping.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{ApiError, ErrorPayload, UserApi, codes},
    domain::{User, UserField, UserId, UserPayload},
    form::{FormMode, SessionToken},
    validation::FieldErrors,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    Create,
    Update(UserId),
}

/// A validated, normalized submission produced by
/// [`FormSession::try_save`](crate::form::FormSession::try_save).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub token: SessionToken,
    pub target: SaveTarget,
    pub payload: UserPayload,
}

impl SaveRequest {
    pub fn mode(&self) -> FormMode {
        match self.target {
            SaveTarget::Create => FormMode::Create,
            SaveTarget::Update(_) => FormMode::Edit,
        }
    }
}

pub const NOT_FOUND_MESSAGE: &str =
    "This user no longer exists on the server. Copy your changes elsewhere or discard them.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("the server rejected the record")]
    Rejected {
        field_errors: FieldErrors,
        form_errors: Vec<String>,
    },
    #[error("{message}")]
    NotFound { message: String },
    #[error("{message}")]
    Transport { message: String },
}

impl SaveError {
    /// Transport failures can be retried as-is; the others need the user to
    /// change something first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaveError::Transport { .. })
    }

    pub fn from_api(error: ApiError, target: &SaveTarget) -> Self {
        if error.is_not_found() && matches!(target, SaveTarget::Update(_)) {
            return SaveError::NotFound {
                message: NOT_FOUND_MESSAGE.to_string(),
            };
        }
        match error {
            ApiError::Rejected { status, payload } if status >= 500 => SaveError::Transport {
                message: format!(
                    "The server is unavailable ({status} {}). Try saving again.",
                    payload.error
                ),
            },
            ApiError::Rejected { payload, .. } => map_payload(payload),
            ApiError::Transport(message) => SaveError::Transport {
                message: format!("Could not reach the server ({message}). Try saving again."),
            },
            ApiError::Decode(message) => SaveError::Transport {
                message: format!("The server sent an unexpected response ({message})."),
            },
        }
    }
}

fn default_message(code: &str) -> &'static str {
    match code {
        codes::DUPLICATE => "Already in use",
        _ => "Invalid value",
    }
}

fn map_payload(payload: ErrorPayload) -> SaveError {
    let mut field_errors = FieldErrors::new();
    let mut form_errors = Vec::new();
    for issue in payload.details {
        let message = if issue.message.trim().is_empty() {
            default_message(&payload.error).to_string()
        } else {
            issue.message
        };
        match UserField::from_wire(&issue.field) {
            Some(field) if !field_errors.contains(field) => field_errors.insert(field, message),
            Some(_) => {}
            None if issue.field.is_empty() => form_errors.push(message),
            None => form_errors.push(format!("{}: {message}", issue.field)),
        }
    }
    if field_errors.is_empty() && form_errors.is_empty() {
        form_errors.push(format!("The server rejected the record ({}).", payload.error));
    }
    SaveError::Rejected {
        field_errors,
        form_errors,
    }
}

/// Sends save requests to the user service.
#[derive(Clone)]
pub struct SaveOrchestrator {
    api: Arc<dyn UserApi>,
}

impl std::fmt::Debug for SaveOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveOrchestrator").finish_non_exhaustive()
    }
}

impl SaveOrchestrator {
    pub fn new(api: Arc<dyn UserApi>) -> Self {
        Self { api }
    }

    pub async fn save(&self, request: &SaveRequest) -> Result<User, SaveError> {
        let outcome = match &request.target {
            SaveTarget::Create => self.api.create(&request.payload).await,
            SaveTarget::Update(id) => self.api.update(id, &request.payload).await,
        };
        match outcome {
            Ok(user) => {
                info!(id = %user.id, mode = ?request.mode(), "user saved");
                Ok(user)
            }
            Err(error) => {
                warn!(%error, mode = ?request.mode(), "save failed");
                Err(SaveError::from_api(error, &request.target))
            }
        }
    }
}
