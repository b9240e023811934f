use std::time::{Duration, Instant};

use crate::{
    api::{ApiError, ErrorPayload, codes},
    app::{Effect, Msg, Screen},
    domain::{FieldValue, ListQuery, SortField, User, UserField, UserId},
    form::FormMode,
    list::FetchTicket,
    prefs::HIDE_DISABLED,
    save::{NOT_FOUND_MESSAGE, SaveError},
    sync::{PendingChange, SyncPhase},
    tests::support::{page_of, user},
};

const DEBOUNCE: Duration = Duration::from_millis(300);

fn only_fetch(effects: Vec<Effect>) -> FetchTicket {
    match effects.as_slice() {
        [Effect::FetchList(ticket)] => ticket.clone(),
        other => panic!("expected a single fetch, got {other:?}"),
    }
}

/// Mounted screen showing `users` as page 1 of 3.
fn loaded(users: Vec<User>) -> (Screen, Instant) {
    let now = Instant::now();
    let (mut screen, effects) = Screen::mount(true, DEBOUNCE);
    let ticket = only_fetch(effects);
    screen.update(
        Msg::ListLoaded {
            seq: ticket.seq,
            result: Ok(page_of(users, 1, 60)),
        },
        now,
    );
    (screen, now)
}

fn default_rows() -> Vec<User> {
    vec![user("1", "ada"), user("2", "bob")]
}

fn dirty_on_ada() -> (Screen, Instant) {
    let (mut screen, now) = loaded(default_rows());
    screen.update(Msg::SelectRow(UserId::new("1")), now);
    screen.update(
        Msg::EditField(UserField::DisplayName, FieldValue::text("Ada L.")),
        now,
    );
    (screen, now)
}

#[test]
fn mount_issues_one_fetch_and_shows_loading() {
    let (screen, effects) = Screen::mount(true, DEBOUNCE);
    let ticket = only_fetch(effects);
    assert_eq!(ticket.query, ListQuery::initial(true));
    assert_eq!(screen.status(), "Loading users...");
    assert!(screen.rows().is_empty());
    assert_eq!(screen.session().mode(), FormMode::Create);
}

#[test]
fn preference_off_fetches_disabled_users_too() {
    let (screen, effects) = Screen::mount(false, DEBOUNCE);
    assert_eq!(only_fetch(effects).query.enabled, None);
    assert!(!screen.hides_disabled());
}

#[test]
fn newest_query_wins_when_responses_cross() {
    let (mut screen, now) = loaded(default_rows());
    let older = only_fetch(screen.update(Msg::SetSort(SortField::Username), now));
    let newer = only_fetch(screen.update(Msg::SetSort(SortField::Email), now));

    screen.update(
        Msg::ListLoaded {
            seq: newer.seq,
            result: Ok(page_of(vec![user("7", "eve")], 1, 1)),
        },
        now,
    );
    screen.update(
        Msg::ListLoaded {
            seq: older.seq,
            result: Ok(page_of(vec![user("8", "mallory")], 1, 1)),
        },
        now,
    );
    assert_eq!(screen.rows(), &[user("7", "eve")]);
    assert_eq!(screen.list().query().sort.field, SortField::Email);
}

#[test]
fn hide_disabled_toggle_fetches_and_persists() {
    let (mut screen, now) = loaded(default_rows());
    let effects = screen.update(Msg::SetHideDisabled(false), now);
    assert_eq!(effects.len(), 2);
    let Effect::FetchList(ticket) = &effects[0] else {
        panic!("expected a fetch first");
    };
    assert_eq!(ticket.query.enabled, None);
    assert_eq!(ticket.query.page, 1);
    assert_eq!(
        effects[1],
        Effect::StorePreference {
            key: HIDE_DISABLED,
            value: false
        }
    );

    assert!(screen.update(Msg::SetHideDisabled(false), now).is_empty());
}

#[test]
fn text_filter_waits_for_the_debounce() {
    let (mut screen, now) = loaded(default_rows());
    assert!(
        screen
            .update(Msg::SetTextFilter("ad".to_string()), now)
            .is_empty()
    );
    assert_eq!(screen.next_deadline(), Some(now + DEBOUNCE));
    assert!(screen.tick(now + Duration::from_millis(100)).is_empty());

    let ticket = only_fetch(screen.tick(now + DEBOUNCE));
    assert_eq!(ticket.query.text, "ad");
    assert_eq!(screen.next_deadline(), None);
}

#[test]
fn selecting_a_row_off_the_page_is_ignored() {
    let (mut screen, now) = loaded(default_rows());
    assert!(screen.update(Msg::SelectRow(UserId::new("99")), now).is_empty());
    assert_eq!(screen.selection(), None);
    assert_eq!(screen.session().mode(), FormMode::Create);
}

#[test]
fn clean_selection_binds_the_form() {
    let (mut screen, now) = loaded(default_rows());
    screen.update(Msg::SelectRow(UserId::new("2")), now);
    assert_eq!(screen.session().bound_id(), Some(&UserId::new("2")));
    assert_eq!(screen.session().draft().username, "bob");
    assert_eq!(screen.status(), "Editing bob");
}

#[test]
fn dirty_selection_opens_the_discard_prompt() {
    let (mut screen, now) = dirty_on_ada();
    screen.update(Msg::SelectRow(UserId::new("2")), now);

    assert_eq!(screen.phase(), SyncPhase::PendingDiscard);
    assert!(matches!(screen.pending(), Some(PendingChange::SelectRow(row)) if row.username == "bob"));
    assert_eq!(screen.session().draft().display_name, "Ada L.");
    assert!(!screen.can_save());

    screen.update(Msg::ConfirmDiscard, now);
    assert_eq!(screen.session().draft().username, "bob");
    assert_eq!(screen.phase(), SyncPhase::Clean);
}

#[test]
fn edits_and_saves_wait_for_the_prompt() {
    let (mut screen, now) = dirty_on_ada();
    screen.update(Msg::NewUser, now);

    screen.update(
        Msg::EditField(UserField::DisplayName, FieldValue::text("Other")),
        now,
    );
    assert_eq!(screen.session().draft().display_name, "Ada L.");
    assert!(screen.update(Msg::Save, now).is_empty());

    screen.update(Msg::ConfirmStay, now);
    assert_eq!(screen.phase(), SyncPhase::Dirty);
    assert_eq!(screen.selection(), Some(&UserId::new("1")));
    assert!(screen.can_save());
}

#[test]
fn field_error_shows_once_the_cursor_leaves_the_field() {
    let (mut screen, now) = dirty_on_ada();
    screen.update(
        Msg::EditField(UserField::Email, FieldValue::text("ada@")),
        now,
    );
    assert_eq!(screen.status(), "Editing Email");
    assert!(!screen.can_save());

    screen.update(Msg::FieldBlurred(UserField::Email), now);
    assert_eq!(
        screen.status(),
        "Email: Enter an address like name@example.com"
    );
    assert_eq!(
        screen.session().errors().get(UserField::Email),
        Some("Enter an address like name@example.com")
    );

    screen.update(
        Msg::EditField(UserField::Email, FieldValue::text("ada@example.org")),
        now,
    );
    assert!(screen.session().errors().is_empty());
    assert!(screen.can_save());
}

#[test]
fn leaving_exits_only_after_confirmation_when_dirty() {
    let (mut clean, now) = loaded(default_rows());
    assert_eq!(clean.update(Msg::NavigateAway, now), vec![Effect::Exit]);

    let (mut dirty, now) = dirty_on_ada();
    assert!(dirty.update(Msg::NavigateAway, now).is_empty());
    assert_eq!(dirty.pending(), Some(&PendingChange::Leave));
    assert_eq!(dirty.update(Msg::ConfirmDiscard, now), vec![Effect::Exit]);
}

#[test]
fn save_success_refreshes_the_same_query() {
    let (mut screen, now) = dirty_on_ada();
    let query = screen.list().query().clone();
    let effects = screen.update(Msg::Save, now);
    let [Effect::Save(request)] = effects.as_slice() else {
        panic!("expected a save, got {effects:?}");
    };
    assert_eq!(screen.status(), "Saving...");

    let mut saved = user("1", "ada");
    saved.display_name = "Ada L.".to_string();
    let ticket = only_fetch(screen.update(
        Msg::SaveFinished {
            token: request.token,
            result: Ok(saved),
        },
        now,
    ));
    assert_eq!(ticket.query, query);
    assert_eq!(screen.status(), "Saved ada");
    assert_eq!(screen.phase(), SyncPhase::Clean);
    assert!(!screen.session().is_dirty());
    assert_eq!(
        screen.session().bound().map(|user| user.display_name.as_str()),
        Some("Ada L.")
    );
}

#[test]
fn orphaned_save_still_refreshes_the_grid() {
    let (mut screen, now) = dirty_on_ada();
    let effects = screen.update(Msg::Save, now);
    let [Effect::Save(request)] = effects.as_slice() else {
        panic!("expected a save");
    };
    let token = request.token;
    screen.update(Msg::SelectRow(UserId::new("2")), now);
    screen.update(Msg::ConfirmDiscard, now);

    let effects = screen.update(
        Msg::SaveFinished {
            token,
            result: Ok(user("1", "ada")),
        },
        now,
    );
    only_fetch(effects);
    assert_eq!(screen.session().bound_id(), Some(&UserId::new("2")));
    assert!(!screen.session().is_saving());
}

#[test]
fn failed_save_keeps_the_draft_and_explains() {
    let (mut screen, now) = dirty_on_ada();
    let effects = screen.update(Msg::Save, now);
    let [Effect::Save(request)] = effects.as_slice() else {
        panic!("expected a save");
    };

    let effects = screen.update(
        Msg::SaveFinished {
            token: request.token,
            result: Err(SaveError::Transport {
                message: "offline".to_string(),
            }),
        },
        now,
    );
    assert!(effects.is_empty());
    assert_eq!(screen.session().draft().display_name, "Ada L.");
    assert_eq!(screen.status(), "Save failed. Press Ctrl+S to try again.");
    assert!(screen.can_save());
}

#[test]
fn reload_requires_a_clean_bound_form() {
    let (mut screen, now) = loaded(default_rows());
    assert!(screen.update(Msg::ReloadRecord, now).is_empty());

    screen.update(Msg::SelectRow(UserId::new("1")), now);
    let effects = screen.update(Msg::ReloadRecord, now);
    assert_eq!(
        effects,
        vec![Effect::LoadRecord {
            token: screen.session().token(),
            id: UserId::new("1"),
        }]
    );

    screen.update(
        Msg::EditField(UserField::DisplayName, FieldValue::text("Ada L.")),
        now,
    );
    assert!(screen.update(Msg::ReloadRecord, now).is_empty());
}

#[test]
fn reload_of_a_removed_user_reports_on_the_form() {
    let (mut screen, now) = loaded(default_rows());
    screen.update(Msg::SelectRow(UserId::new("1")), now);
    let token = screen.session().token();

    screen.update(
        Msg::RecordLoaded {
            token,
            result: Err(ApiError::rejected(404, ErrorPayload::new(codes::NOT_FOUND))),
        },
        now,
    );
    assert_eq!(screen.session().form_errors(), &[NOT_FOUND_MESSAGE.to_string()]);
    assert_eq!(screen.status(), "Reload failed: the user was removed.");
}

#[test]
fn reload_replaces_a_clean_form() {
    let (mut screen, now) = loaded(default_rows());
    screen.update(Msg::SelectRow(UserId::new("1")), now);
    let token = screen.session().token();

    let mut fresher = user("1", "ada");
    fresher.display_name = "Countess of Lovelace".to_string();
    screen.update(
        Msg::RecordLoaded {
            token,
            result: Ok(fresher),
        },
        now,
    );
    assert_eq!(screen.session().draft().display_name, "Countess of Lovelace");
    assert_eq!(screen.status(), "Reloaded ada");
}

#[test]
fn pages_past_the_end_are_ignored() {
    let (mut screen, now) = loaded(default_rows());
    assert!(screen.update(Msg::SetPage(4), now).is_empty());
    let ticket = only_fetch(screen.update(Msg::SetPage(3), now));
    assert_eq!(ticket.query.page, 3);
}

#[test]
fn list_failure_keeps_rows_and_offers_retry() {
    let (mut screen, now) = loaded(default_rows());
    let ticket = only_fetch(screen.update(Msg::RefreshList, now));
    screen.update(
        Msg::ListLoaded {
            seq: ticket.seq,
            result: Err(ApiError::Transport("timed out".to_string())),
        },
        now,
    );
    assert_eq!(screen.rows().len(), 2);
    assert!(screen.status().contains("Press r to retry"));
}
