use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    domain::{DraftError, FieldValue, User, UserDraft, UserField, UserId},
    save::{SaveError, SaveRequest, SaveTarget},
    validation::{self, FieldErrors},
};

/// Identity of one form session. Save completions carry the token of the
/// session that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn first() -> Self {
        SessionToken(1)
    }

    pub fn next(self) -> Self {
        SessionToken(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Saving,
    SaveFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(SaveRequest),
    /// Client validation failed; nothing was sent.
    Blocked { issues: usize },
    /// Pristine form or a save already in flight.
    Ignored,
}

/// Editable detail of one user record.
///
/// A session is either unbound (`Create`) or bound to a server record
/// (`Edit`); the bound id is derived from the bound record so the two cannot
/// disagree.
#[derive(Debug, Clone)]
pub struct FormSession {
    token: SessionToken,
    bound: Option<User>,
    baseline: UserDraft,
    draft: UserDraft,
    dirty: BTreeSet<UserField>,
    errors: FieldErrors,
    form_errors: Vec<String>,
    status: SessionStatus,
}

impl FormSession {
    /// Blank draft in `Create` mode with `enabled` set.
    pub fn create(token: SessionToken) -> Self {
        Self {
            token,
            bound: None,
            baseline: UserDraft::default(),
            draft: UserDraft::default(),
            dirty: BTreeSet::new(),
            errors: FieldErrors::new(),
            form_errors: Vec::new(),
            status: SessionStatus::Idle,
        }
    }

    /// Session bound to `user` with the draft populated from it.
    pub fn edit(token: SessionToken, user: User) -> Self {
        let draft = UserDraft::from(&user);
        Self {
            token,
            baseline: draft.clone(),
            draft,
            bound: Some(user),
            dirty: BTreeSet::new(),
            errors: FieldErrors::new(),
            form_errors: Vec::new(),
            status: SessionStatus::Idle,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn mode(&self) -> FormMode {
        if self.bound.is_some() {
            FormMode::Edit
        } else {
            FormMode::Create
        }
    }

    pub fn bound(&self) -> Option<&User> {
        self.bound.as_ref()
    }

    pub fn bound_id(&self) -> Option<&UserId> {
        self.bound.as_ref().map(|user| &user.id)
    }

    pub fn draft(&self) -> &UserDraft {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_field_dirty(&self, field: UserField) -> bool {
        self.dirty.contains(&field)
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = UserField> + '_ {
        self.dirty.iter().copied()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn form_errors(&self) -> &[String] {
        &self.form_errors
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_saving(&self) -> bool {
        self.status == SessionStatus::Saving
    }

    /// Save admission: dirty, no shown field errors, every rule satisfied and
    /// nothing in flight.
    pub fn can_save(&self) -> bool {
        self.is_dirty()
            && !self.is_saving()
            && self.errors.is_empty()
            && validation::validate(&self.draft).is_empty()
    }

    /// Updates one field and recomputes its dirty flag against the bound
    /// values. An error already shown for the field is re-checked; new errors
    /// wait for [`blur_field`](Self::blur_field) or [`try_save`](Self::try_save).
    pub fn set_field(&mut self, field: UserField, value: FieldValue) -> Result<(), DraftError> {
        if self.is_saving() {
            return Err(DraftError::SaveInFlight);
        }
        self.draft.set(field, value)?;
        if self.draft.get(field) == self.baseline.get(field) {
            self.dirty.remove(&field);
        } else {
            self.dirty.insert(field);
        }
        if self.errors.contains(field) {
            self.check_field(field);
        }
        self.status = SessionStatus::Idle;
        Ok(())
    }

    /// The field lost focus: show or clear its error.
    pub fn blur_field(&mut self, field: UserField) {
        if self.is_saving() {
            return;
        }
        self.check_field(field);
    }

    fn check_field(&mut self, field: UserField) {
        match validation::validate_field(&self.draft, field) {
            Some(message) => self.errors.insert(field, message),
            None => {
                self.errors.remove(field);
            }
        }
    }

    /// Same as [`set_field`](Self::set_field) for a field addressed by its
    /// wire name. `id`, `createdAt` and `updatedAt` are refused.
    pub fn set_named_field(&mut self, name: &str, value: FieldValue) -> Result<(), DraftError> {
        let field = name.parse::<UserField>()?;
        self.set_field(field, value)
    }

    /// Whole-record validation followed by hand-off to the save orchestrator.
    ///
    /// Errors already shown stay, including those reported by the server;
    /// only editing the field clears them.
    pub fn try_save(&mut self) -> SubmitOutcome {
        if self.is_saving() || !self.is_dirty() {
            return SubmitOutcome::Ignored;
        }
        self.form_errors.clear();
        let issues = validation::validate(&self.draft);
        for (field, message) in issues.iter() {
            if !self.errors.contains(field) {
                self.errors.insert(field, message);
            }
        }
        if !self.errors.is_empty() {
            self.status = SessionStatus::SaveFailed;
            debug!(issues = self.errors.len(), "submission blocked by validation");
            return SubmitOutcome::Blocked {
                issues: self.errors.len(),
            };
        }
        self.status = SessionStatus::Saving;
        let target = match self.bound_id() {
            Some(id) => SaveTarget::Update(id.clone()),
            None => SaveTarget::Create,
        };
        SubmitOutcome::Submitted(SaveRequest {
            token: self.token,
            target,
            payload: validation::normalize(&self.draft).to_payload(),
        })
    }

    /// Applies a failed save. The draft and dirty flags are left untouched.
    pub fn fail_save(&mut self, error: &SaveError) {
        self.status = SessionStatus::SaveFailed;
        match error {
            SaveError::Rejected {
                field_errors,
                form_errors,
            } => {
                for (field, message) in field_errors.iter() {
                    self.errors.insert(field, message);
                }
                self.form_errors = form_errors.clone();
            }
            SaveError::NotFound { message } | SaveError::Transport { message } => {
                self.form_errors = vec![message.clone()];
            }
        }
    }

    pub fn set_form_error(&mut self, message: impl Into<String>) {
        self.form_errors = vec![message.into()];
    }

    /// Drops local edits, returning to the bound values (or a blank draft).
    /// Refused while a save is in flight.
    pub fn discard(&mut self) -> bool {
        if self.is_saving() {
            return false;
        }
        *self = match self.bound.take() {
            Some(user) => FormSession::edit(self.token, user),
            None => FormSession::create(self.token),
        };
        true
    }
}
