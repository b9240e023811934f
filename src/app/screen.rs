//! The user-admin screen as a message-driven state machine.
//!
//! [`Screen::update`] is the only way state changes. It performs no I/O:
//! requests to the outside world are returned as [`Effect`]s, and their
//! completions come back as [`Msg`]s carrying the sequence number or session
//! token they were issued with.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    api::ApiError,
    domain::{FieldValue, FilterPatch, ListPage, PageSize, SortField, User, UserField, UserId},
    form::{FormSession, SessionToken, SubmitOutcome},
    list::{FetchTicket, ListQueryController},
    prefs::HIDE_DISABLED,
    save::{NOT_FOUND_MESSAGE, SaveError, SaveRequest},
    sync::{Decision, PendingChange, SaveDisposition, SyncCoordinator, SyncPhase},
};

use super::status::StatusLine;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    SelectRow(UserId),
    NewUser,
    NavigateAway,
    ConfirmDiscard,
    ConfirmStay,
    SetHideDisabled(bool),
    SetTextFilter(String),
    SetSort(SortField),
    SetPage(u32),
    SetPageSize(PageSize),
    RefreshList,
    EditField(UserField, FieldValue),
    /// The form cursor left this field.
    FieldBlurred(UserField),
    Save,
    ReloadRecord,
    ListLoaded {
        seq: u64,
        result: Result<ListPage, ApiError>,
    },
    SaveFinished {
        token: SessionToken,
        result: Result<User, SaveError>,
    },
    RecordLoaded {
        token: SessionToken,
        result: Result<User, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchList(FetchTicket),
    Save(SaveRequest),
    LoadRecord { token: SessionToken, id: UserId },
    StorePreference { key: &'static str, value: bool },
    Exit,
}

#[derive(Debug, Clone)]
pub struct Screen {
    list: ListQueryController,
    sync: SyncCoordinator,
    status: StatusLine,
}

impl Screen {
    /// Builds the mounted screen and the initial list fetch.
    pub fn mount(hide_disabled: bool, debounce: Duration) -> (Self, Vec<Effect>) {
        let mut screen = Self {
            list: ListQueryController::new(hide_disabled).with_debounce(debounce),
            sync: SyncCoordinator::new(),
            status: StatusLine::new(),
        };
        let effects = screen.list.ensure_loaded().map(Effect::FetchList);
        if effects.is_some() {
            screen.status.loading();
        }
        (screen, effects.into_iter().collect())
    }

    pub fn list(&self) -> &ListQueryController {
        &self.list
    }

    pub fn rows(&self) -> &[User] {
        self.list
            .current_result()
            .map(|page| page.data.as_slice())
            .unwrap_or_default()
    }

    pub fn session(&self) -> &FormSession {
        self.sync.session()
    }

    pub fn selection(&self) -> Option<&UserId> {
        self.sync.selection()
    }

    pub fn phase(&self) -> SyncPhase {
        self.sync.phase()
    }

    pub fn pending(&self) -> Option<&PendingChange> {
        self.sync.pending()
    }

    pub fn hides_disabled(&self) -> bool {
        self.list.query().hides_disabled()
    }

    pub fn can_save(&self) -> bool {
        self.sync.pending().is_none() && self.sync.session().can_save()
    }

    pub fn status(&self) -> &str {
        self.status.message()
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.list.next_deadline()
    }

    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        self.list.tick(now).map(Effect::FetchList).into_iter().collect()
    }

    pub fn update(&mut self, msg: Msg, now: Instant) -> Vec<Effect> {
        match msg {
            Msg::SelectRow(id) => self.on_select_row(&id),
            Msg::NewUser => {
                let decision = self.sync.new_user();
                self.on_decision(decision)
            }
            Msg::NavigateAway => {
                let decision = self.sync.navigate_away();
                self.on_decision(decision)
            }
            Msg::ConfirmDiscard => match self.sync.confirm_discard() {
                Some(PendingChange::Leave) => vec![Effect::Exit],
                Some(_) => {
                    self.status.ready();
                    Vec::new()
                }
                None => Vec::new(),
            },
            Msg::ConfirmStay => {
                if self.sync.confirm_stay() {
                    self.status.ready();
                }
                Vec::new()
            }
            Msg::SetHideDisabled(hide) => self.on_hide_disabled(hide, now),
            Msg::SetTextFilter(text) => {
                let ticket = self.list.set_filter(FilterPatch::text(text), now);
                fetch(ticket)
            }
            Msg::SetSort(field) => {
                let ticket = self.list.set_sort(field);
                fetch(Some(ticket))
            }
            Msg::SetPage(page) => {
                if let Some(result) = self.list.current_result()
                    && page > result.page_count()
                {
                    return Vec::new();
                }
                let ticket = self.list.set_page(page);
                fetch(ticket)
            }
            Msg::SetPageSize(size) => {
                let ticket = self.list.set_page_size(size);
                fetch(ticket)
            }
            Msg::RefreshList => {
                self.status.loading();
                let ticket = self.list.refresh();
                fetch(Some(ticket))
            }
            Msg::EditField(field, value) => {
                self.on_edit(field, value);
                Vec::new()
            }
            Msg::FieldBlurred(field) => {
                self.on_blur(field);
                Vec::new()
            }
            Msg::Save => self.on_save(),
            Msg::ReloadRecord => self.on_reload(),
            Msg::ListLoaded { seq, result } => {
                if !self.list.complete(seq, result) {
                    return Vec::new();
                }
                match self.list.error() {
                    Some(error) => {
                        let error = error.to_string();
                        self.status.list_failed(&error);
                    }
                    None => self.status.finish_loading(),
                }
                Vec::new()
            }
            Msg::SaveFinished { token, result } => self.on_save_finished(token, result),
            Msg::RecordLoaded { token, result } => {
                self.on_record_loaded(token, result);
                Vec::new()
            }
        }
    }

    fn on_select_row(&mut self, id: &UserId) -> Vec<Effect> {
        let Some(user) = self.rows().iter().find(|user| &user.id == id).cloned() else {
            debug!(%id, "selection ignored; row is not on the current page");
            return Vec::new();
        };
        let decision = self.sync.select_row(user);
        self.on_decision(decision)
    }

    fn on_decision(&mut self, decision: Decision) -> Vec<Effect> {
        match decision {
            Decision::Applied(PendingChange::Leave) => vec![Effect::Exit],
            Decision::Applied(PendingChange::NewUser) => {
                self.status.editing("new user");
                Vec::new()
            }
            Decision::Applied(PendingChange::SelectRow(user)) => {
                self.status.editing(&user.username);
                Vec::new()
            }
            Decision::Deferred => {
                self.status.pending_discard();
                Vec::new()
            }
            Decision::Unchanged => Vec::new(),
        }
    }

    fn on_hide_disabled(&mut self, hide: bool, now: Instant) -> Vec<Effect> {
        if hide == self.hides_disabled() {
            return Vec::new();
        }
        let ticket = self
            .list
            .set_filter(FilterPatch::enabled(hide.then_some(true)), now);
        let mut effects = fetch(ticket);
        effects.push(Effect::StorePreference {
            key: HIDE_DISABLED,
            value: hide,
        });
        effects
    }

    fn on_edit(&mut self, field: UserField, value: FieldValue) {
        if self.sync.pending().is_some() {
            self.status.pending_discard();
            return;
        }
        match self.sync.edit_field(field, value) {
            Ok(()) => self.show_field_state(field),
            Err(error) => self.status.set_raw(error.to_string()),
        }
    }

    fn on_blur(&mut self, field: UserField) {
        if self.sync.pending().is_some() {
            return;
        }
        self.sync.blur_field(field);
        if self.sync.session().errors().contains(field) {
            self.show_field_state(field);
        }
    }

    fn show_field_state(&mut self, field: UserField) {
        match self.sync.session().errors().get(field) {
            Some(message) => {
                let message = format!("{}: {message}", field.label());
                self.status.set_raw(message);
            }
            None => self.status.editing(field.label()),
        }
    }

    fn on_save(&mut self) -> Vec<Effect> {
        if self.sync.pending().is_some() {
            self.status.pending_discard();
            return Vec::new();
        }
        match self.sync.submit() {
            SubmitOutcome::Submitted(request) => {
                self.status.saving();
                vec![Effect::Save(request)]
            }
            SubmitOutcome::Blocked { issues } => {
                self.status.issues_remaining(issues);
                Vec::new()
            }
            SubmitOutcome::Ignored => Vec::new(),
        }
    }

    fn on_save_finished(
        &mut self,
        token: SessionToken,
        result: Result<User, SaveError>,
    ) -> Vec<Effect> {
        match result {
            Ok(user) => {
                let username = user.username.clone();
                let disposition = self.sync.save_succeeded(token, user);
                if disposition == SaveDisposition::Applied {
                    self.status.saved(&username);
                }
                // The server changed either way; the grid re-reads the same query.
                let ticket = self.list.refresh();
                fetch(Some(ticket))
            }
            Err(error) => {
                if self.sync.save_failed(token, &error) == SaveDisposition::Applied {
                    self.status.save_failed(error.is_retryable());
                }
                Vec::new()
            }
        }
    }

    fn on_reload(&mut self) -> Vec<Effect> {
        let session = self.sync.session();
        if self.sync.pending().is_some() || session.is_dirty() || session.is_saving() {
            self.status
                .set_raw("Save or discard your changes before reloading.");
            return Vec::new();
        }
        let Some(id) = session.bound_id().cloned() else {
            return Vec::new();
        };
        self.status.set_raw(format!("Reloading {id}..."));
        vec![Effect::LoadRecord {
            token: session.token(),
            id,
        }]
    }

    fn on_record_loaded(&mut self, token: SessionToken, result: Result<User, ApiError>) {
        if token != self.sync.session().token() {
            debug!("reload result for a replaced session");
            return;
        }
        match result {
            Ok(user) => {
                let username = user.username.clone();
                if self.sync.refresh_bound(user) {
                    self.status.set_raw(format!("Reloaded {username}"));
                }
            }
            Err(error) if error.is_not_found() => {
                self.sync.report_form_error(NOT_FOUND_MESSAGE);
                self.status.set_raw("Reload failed: the user was removed.");
            }
            Err(error) => self.status.set_raw(format!("Reload failed: {error}")),
        }
    }
}

fn fetch(ticket: Option<FetchTicket>) -> Vec<Effect> {
    ticket.map(Effect::FetchList).into_iter().collect()
}
