use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Save,
    NewUser,
    Reload,
    Quit,
    SwitchPane,
    CursorStep(i32),
    Select,
    PageStep(i32),
    CycleSort,
    ToggleSortDir,
    CyclePageSize,
    ToggleHideDisabled,
    EditFilter,
    FinishFilter,
    Refresh,
    FieldStep(i32),
    Toggle,
    RoleStep(i32),
    Erase,
    Discard,
    Stay,
}

/// Printable character for free-text input, if the key carries one.
pub fn typed_char(key: &KeyEvent) -> Option<char> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Char(ch) if !ch.is_control() => Some(ch),
        _ => None,
    }
}
