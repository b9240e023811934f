use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::{debug, warn};

use crate::{
    api::UserApi,
    domain::{FieldValue, Role, UserField},
    prefs::PreferenceStore,
    presentation::{self, Focus, UiContext},
    save::SaveOrchestrator,
};

use super::{
    input::{KeyAction, typed_char},
    keymap::{self, KeymapContext},
    options::UiOptions,
    screen::{Effect, Msg, Screen},
    terminal::TerminalGuard,
};

/// Terminal driver around a [`Screen`]. Effects run on the tokio runtime
/// behind `handle`; their completions are fed back through `inbox`.
pub(crate) struct App {
    screen: Screen,
    api: Arc<dyn UserApi>,
    saver: SaveOrchestrator,
    prefs: Arc<dyn PreferenceStore>,
    options: UiOptions,
    title: String,
    handle: Handle,
    outbox: UnboundedSender<Msg>,
    inbox: UnboundedReceiver<Msg>,
    focus: Focus,
    grid_cursor: usize,
    form_cursor: usize,
    role_cursor: usize,
    filter_editing: bool,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(
        screen: Screen,
        api: Arc<dyn UserApi>,
        prefs: Arc<dyn PreferenceStore>,
        options: UiOptions,
        title: String,
        handle: Handle,
    ) -> Self {
        let (outbox, inbox) = mpsc::unbounded_channel();
        Self {
            screen,
            saver: SaveOrchestrator::new(Arc::clone(&api)),
            api,
            prefs,
            options,
            title,
            handle,
            outbox,
            inbox,
            focus: Focus::Grid,
            grid_cursor: 0,
            form_cursor: 0,
            role_cursor: 0,
            filter_editing: false,
            should_quit: false,
        }
    }

    pub(crate) fn run(&mut self, initial: Vec<Effect>) -> Result<()> {
        let mut terminal = TerminalGuard::enter()?;
        self.execute(initial);
        while !self.should_quit {
            self.drain_inbox();
            let effects = self.screen.tick(Instant::now());
            self.execute(effects);
            terminal.draw(|frame| self.draw(frame))?;

            if !event::poll(self.poll_timeout(Instant::now()))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                Event::Resize(..) => terminal.autoresize()?,
                _ => {}
            }
        }
        Ok(())
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        match self.screen.next_deadline() {
            Some(due) => due.saturating_duration_since(now).min(self.options.tick_rate),
            None => self.options.tick_rate,
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let help = self
            .options
            .show_help
            .then(|| keymap::help_text(&self.contexts()))
            .flatten();
        let ctx = UiContext {
            title: &self.title,
            screen: &self.screen,
            focus: self.focus,
            grid_cursor: self.grid_cursor,
            form_cursor: self.form_cursor,
            role_cursor: self.role_cursor,
            filter_editing: self.filter_editing,
            help: help.as_deref(),
        };
        presentation::draw(frame, &ctx);
    }

    fn contexts(&self) -> Vec<KeymapContext> {
        if self.screen.pending().is_some() {
            return vec![KeymapContext::Dialog];
        }
        let local = if self.filter_editing {
            KeymapContext::Filter
        } else {
            match self.focus {
                Focus::Grid => KeymapContext::Grid,
                Focus::Form => KeymapContext::Form,
            }
        };
        vec![local, KeymapContext::Global]
    }

    fn drain_inbox(&mut self) {
        while let Ok(msg) = self.inbox.try_recv() {
            self.dispatch(msg);
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let effects = self.screen.update(msg, Instant::now());
        self.execute(effects);
        let rows = self.screen.rows().len();
        self.grid_cursor = self.grid_cursor.min(rows.saturating_sub(1));
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchList(ticket) => {
                    let api = Arc::clone(&self.api);
                    let outbox = self.outbox.clone();
                    self.handle.spawn(async move {
                        let result = api.list(&ticket.request()).await;
                        let _ = outbox.send(Msg::ListLoaded {
                            seq: ticket.seq,
                            result,
                        });
                    });
                }
                Effect::Save(request) => {
                    let saver = self.saver.clone();
                    let outbox = self.outbox.clone();
                    self.handle.spawn(async move {
                        let result = saver.save(&request).await;
                        let _ = outbox.send(Msg::SaveFinished {
                            token: request.token,
                            result,
                        });
                    });
                }
                Effect::LoadRecord { token, id } => {
                    let api = Arc::clone(&self.api);
                    let outbox = self.outbox.clone();
                    self.handle.spawn(async move {
                        let result = api.get(&id).await;
                        let _ = outbox.send(Msg::RecordLoaded { token, result });
                    });
                }
                Effect::StorePreference { key, value } => {
                    if let Err(error) = self.prefs.store_bool(key, value) {
                        warn!(%error, key, "failed to persist preference");
                    }
                }
                Effect::Exit => {
                    debug!("leaving user admin screen");
                    self.should_quit = true;
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match keymap::classify_key(&self.contexts(), &key) {
            Some(action) => self.apply_action(action),
            None => {
                if let Some(ch) = typed_char(&key) {
                    self.type_char(ch);
                }
            }
        }
    }

    fn apply_action(&mut self, action: KeyAction) {
        let query = self.screen.list().query().clone();
        match action {
            KeyAction::Save => self.dispatch(Msg::Save),
            KeyAction::NewUser => {
                self.dispatch(Msg::NewUser);
                if self.screen.pending().is_none() {
                    self.focus = Focus::Form;
                    self.form_cursor = 0;
                }
            }
            KeyAction::Reload => self.dispatch(Msg::ReloadRecord),
            KeyAction::Quit => self.dispatch(Msg::NavigateAway),
            KeyAction::SwitchPane => {
                self.filter_editing = false;
                if self.focus == Focus::Form {
                    self.dispatch(Msg::FieldBlurred(self.current_field()));
                    self.focus = Focus::Grid;
                } else {
                    self.focus = Focus::Form;
                }
            }
            KeyAction::CursorStep(delta) => {
                self.grid_cursor = step(self.grid_cursor, delta, self.screen.rows().len());
            }
            KeyAction::Select => {
                if let Some(user) = self.screen.rows().get(self.grid_cursor) {
                    let id = user.id.clone();
                    self.dispatch(Msg::SelectRow(id));
                }
            }
            KeyAction::PageStep(delta) => {
                let page = i64::from(query.page) + i64::from(delta);
                if let Ok(page) = u32::try_from(page)
                    && page >= 1
                {
                    self.grid_cursor = 0;
                    self.dispatch(Msg::SetPage(page));
                }
            }
            KeyAction::CycleSort => self.dispatch(Msg::SetSort(query.sort.field.next())),
            KeyAction::ToggleSortDir => self.dispatch(Msg::SetSort(query.sort.field)),
            KeyAction::CyclePageSize => self.dispatch(Msg::SetPageSize(query.page_size.next())),
            KeyAction::ToggleHideDisabled => {
                let hide = !self.screen.hides_disabled();
                self.dispatch(Msg::SetHideDisabled(hide));
            }
            KeyAction::EditFilter => self.filter_editing = true,
            KeyAction::FinishFilter => self.filter_editing = false,
            KeyAction::Refresh => self.dispatch(Msg::RefreshList),
            KeyAction::FieldStep(delta) => {
                let next = step(self.form_cursor, delta, UserField::ALL.len());
                if next != self.form_cursor {
                    self.dispatch(Msg::FieldBlurred(self.current_field()));
                    self.form_cursor = next;
                }
            }
            KeyAction::Toggle => self.toggle_current(),
            KeyAction::RoleStep(delta) => {
                if self.current_field() == UserField::Roles {
                    self.role_cursor = step(self.role_cursor, delta, Role::ALL.len());
                }
            }
            KeyAction::Erase => self.erase(),
            KeyAction::Discard => self.dispatch(Msg::ConfirmDiscard),
            KeyAction::Stay => self.dispatch(Msg::ConfirmStay),
        }
    }

    fn current_field(&self) -> UserField {
        UserField::ALL[self.form_cursor.min(UserField::ALL.len() - 1)]
    }

    fn toggle_current(&mut self) {
        let draft = self.screen.session().draft();
        match self.current_field() {
            UserField::Enabled => {
                let value = FieldValue::Flag(!draft.enabled);
                self.dispatch(Msg::EditField(UserField::Enabled, value));
            }
            UserField::Roles => {
                let role = Role::ALL[self.role_cursor.min(Role::ALL.len() - 1)];
                let mut roles = draft.roles.clone();
                if !roles.remove(&role) {
                    roles.insert(role);
                }
                self.dispatch(Msg::EditField(UserField::Roles, FieldValue::Roles(roles)));
            }
            _ => self.type_char(' '),
        }
    }

    fn type_char(&mut self, ch: char) {
        if self.screen.pending().is_some() {
            return;
        }
        if self.filter_editing {
            let mut text = self.screen.list().query().text.clone();
            text.push(ch);
            self.dispatch(Msg::SetTextFilter(text));
            return;
        }
        if self.focus != Focus::Form {
            return;
        }
        let field = self.current_field();
        if let Some(current) = self.screen.session().draft().text(field) {
            let mut text = current.to_string();
            text.push(ch);
            self.dispatch(Msg::EditField(field, FieldValue::Text(text)));
        }
    }

    fn erase(&mut self) {
        if self.filter_editing {
            let mut text = self.screen.list().query().text.clone();
            if text.pop().is_some() {
                self.dispatch(Msg::SetTextFilter(text));
            }
            return;
        }
        let field = self.current_field();
        if let Some(current) = self.screen.session().draft().text(field) {
            let mut text = current.to_string();
            if text.pop().is_some() {
                self.dispatch(Msg::EditField(field, FieldValue::Text(text)));
            }
        }
    }
}

fn step(index: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = index as i64 + i64::from(delta);
    next.clamp(0, len as i64 - 1) as usize
}
