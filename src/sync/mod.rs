//! Discard-confirmation protocol between the grid and the form.
//!
//! The coordinator owns the [`FormSession`] and the grid selection. Requests
//! that would replace the session (selecting a row, starting a new user,
//! leaving the screen) apply at once when the form is clean and are queued
//! behind a confirmation when it is dirty. Nothing replaces a dirty session
//! without [`SyncCoordinator::confirm_discard`].

use tracing::{debug, info};

use crate::{
    domain::{DraftError, FieldValue, User, UserField, UserId},
    form::{FormSession, SessionToken, SubmitOutcome},
    save::SaveError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Clean,
    Dirty,
    PendingDiscard,
}

/// A request that replaces the form session once allowed.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    SelectRow(User),
    NewUser,
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The change was applied.
    Applied(PendingChange),
    /// The change waits for `confirm_discard` or `confirm_stay`.
    Deferred,
    /// Nothing to do (e.g. the row is already bound).
    Unchanged,
}

/// What became of a save completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDisposition {
    Applied,
    /// The issuing session was replaced before the result arrived.
    Orphaned,
}

#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    session: FormSession,
    selection: Option<UserId>,
    pending: Option<PendingChange>,
    last_token: SessionToken,
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncCoordinator {
    /// Mount state: a blank `Create` session and no selection.
    pub fn new() -> Self {
        let token = SessionToken::first();
        Self {
            session: FormSession::create(token),
            selection: None,
            pending: None,
            last_token: token,
        }
    }

    pub fn session(&self) -> &FormSession {
        &self.session
    }

    pub fn selection(&self) -> Option<&UserId> {
        self.selection.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingChange> {
        self.pending.as_ref()
    }

    pub fn phase(&self) -> SyncPhase {
        if self.pending.is_some() {
            SyncPhase::PendingDiscard
        } else if self.session.is_dirty() {
            SyncPhase::Dirty
        } else {
            SyncPhase::Clean
        }
    }

    pub fn select_row(&mut self, user: User) -> Decision {
        if self.pending.is_none() && self.session.bound_id() == Some(&user.id) {
            return Decision::Unchanged;
        }
        self.request(PendingChange::SelectRow(user))
    }

    pub fn new_user(&mut self) -> Decision {
        self.request(PendingChange::NewUser)
    }

    pub fn navigate_away(&mut self) -> Decision {
        self.request(PendingChange::Leave)
    }

    /// Runs the queued request and drops the local draft.
    pub fn confirm_discard(&mut self) -> Option<PendingChange> {
        let change = self.pending.take()?;
        info!(change = change_name(&change), "unsaved changes discarded");
        self.apply(change.clone());
        Some(change)
    }

    /// Drops the queued request and keeps the draft; the selection returns to
    /// the bound record.
    pub fn confirm_stay(&mut self) -> bool {
        let Some(change) = self.pending.take() else {
            return false;
        };
        debug!(change = change_name(&change), "kept unsaved changes");
        self.selection = self.session.bound_id().cloned();
        true
    }

    pub fn edit_field(&mut self, field: UserField, value: FieldValue) -> Result<(), DraftError> {
        self.session.set_field(field, value)
    }

    pub fn blur_field(&mut self, field: UserField) {
        self.session.blur_field(field);
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        self.session.try_save()
    }

    /// Rebinds to the saved record if the issuing session is still current.
    pub fn save_succeeded(&mut self, token: SessionToken, saved: User) -> SaveDisposition {
        if token != self.session.token() || !self.session.is_saving() {
            debug!(id = %saved.id, "save result for a replaced session");
            return SaveDisposition::Orphaned;
        }
        if self.pending.is_none() {
            self.selection = Some(saved.id.clone());
        }
        let next = self.next_token();
        self.session = FormSession::edit(next, saved);
        SaveDisposition::Applied
    }

    pub fn save_failed(&mut self, token: SessionToken, error: &SaveError) -> SaveDisposition {
        if token != self.session.token() || !self.session.is_saving() {
            return SaveDisposition::Orphaned;
        }
        self.session.fail_save(error);
        SaveDisposition::Applied
    }

    /// Replaces a clean bound session with a fresher copy of its record.
    pub fn refresh_bound(&mut self, user: User) -> bool {
        if self.pending.is_some()
            || self.session.is_dirty()
            || self.session.is_saving()
            || self.session.bound_id() != Some(&user.id)
        {
            return false;
        }
        let next = self.next_token();
        self.session = FormSession::edit(next, user);
        true
    }

    pub fn report_form_error(&mut self, message: impl Into<String>) {
        self.session.set_form_error(message);
    }

    fn request(&mut self, change: PendingChange) -> Decision {
        if self.pending.is_none() && !self.session.is_dirty() {
            self.apply(change.clone());
            return Decision::Applied(change);
        }
        debug!(change = change_name(&change), "change deferred behind discard prompt");
        if let PendingChange::SelectRow(user) = &change {
            self.selection = Some(user.id.clone());
        }
        self.pending = Some(change);
        Decision::Deferred
    }

    fn apply(&mut self, change: PendingChange) {
        match change {
            PendingChange::SelectRow(user) => {
                self.selection = Some(user.id.clone());
                let next = self.next_token();
                self.session = FormSession::edit(next, user);
            }
            PendingChange::NewUser => {
                self.selection = None;
                let next = self.next_token();
                self.session = FormSession::create(next);
            }
            PendingChange::Leave => {}
        }
    }

    fn next_token(&mut self) -> SessionToken {
        self.last_token = self.last_token.next();
        self.last_token
    }
}

fn change_name(change: &PendingChange) -> &'static str {
    match change {
        PendingChange::SelectRow(_) => "select-row",
        PendingChange::NewUser => "new-user",
        PendingChange::Leave => "leave",
    }
}
