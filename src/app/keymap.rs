use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use std::sync::LazyLock;

use super::input::KeyAction;

macro_rules! keymap_source {
    () => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/keymap/default.keymap.json"
        ))
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum KeymapContext {
    Global,
    Grid,
    Form,
    Filter,
    Dialog,
}

impl KeymapContext {
    fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "global" => Some(KeymapContext::Global),
            "grid" => Some(KeymapContext::Grid),
            "form" => Some(KeymapContext::Form),
            "filter" => Some(KeymapContext::Filter),
            "dialog" => Some(KeymapContext::Dialog),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    id: String,
    description: String,
    contexts: Vec<String>,
    action: RawAction,
    combos: Vec<String>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum RawAction {
    Save,
    NewUser,
    Reload,
    Quit,
    SwitchPane,
    CursorStep { delta: i32 },
    Select,
    PageStep { delta: i32 },
    CycleSort,
    ToggleSortDir,
    CyclePageSize,
    ToggleHideDisabled,
    EditFilter,
    FinishFilter,
    Refresh,
    FieldStep { delta: i32 },
    Toggle,
    RoleStep { delta: i32 },
    Erase,
    Discard,
    Stay,
}

impl RawAction {
    fn into_action(self) -> KeyAction {
        match self {
            RawAction::Save => KeyAction::Save,
            RawAction::NewUser => KeyAction::NewUser,
            RawAction::Reload => KeyAction::Reload,
            RawAction::Quit => KeyAction::Quit,
            RawAction::SwitchPane => KeyAction::SwitchPane,
            RawAction::CursorStep { delta } => KeyAction::CursorStep(delta),
            RawAction::Select => KeyAction::Select,
            RawAction::PageStep { delta } => KeyAction::PageStep(delta),
            RawAction::CycleSort => KeyAction::CycleSort,
            RawAction::ToggleSortDir => KeyAction::ToggleSortDir,
            RawAction::CyclePageSize => KeyAction::CyclePageSize,
            RawAction::ToggleHideDisabled => KeyAction::ToggleHideDisabled,
            RawAction::EditFilter => KeyAction::EditFilter,
            RawAction::FinishFilter => KeyAction::FinishFilter,
            RawAction::Refresh => KeyAction::Refresh,
            RawAction::FieldStep { delta } => KeyAction::FieldStep(delta),
            RawAction::Toggle => KeyAction::Toggle,
            RawAction::RoleStep { delta } => KeyAction::RoleStep(delta),
            RawAction::Erase => KeyAction::Erase,
            RawAction::Discard => KeyAction::Discard,
            RawAction::Stay => KeyAction::Stay,
        }
    }
}

struct KeyBinding {
    action: KeyAction,
    contexts: Vec<KeymapContext>,
    combos: Vec<KeyPattern>,
    snippet: String,
}

impl KeyBinding {
    fn from_raw(raw: RawEntry) -> Self {
        let contexts = raw
            .contexts
            .iter()
            .filter_map(|ctx| KeymapContext::from_str(ctx))
            .collect::<Vec<_>>();
        assert!(
            !contexts.is_empty(),
            "keymap entry {} must declare at least one context",
            raw.id
        );
        let combos = raw
            .combos
            .iter()
            .map(|combo| {
                KeyPattern::parse(combo).unwrap_or_else(|err| {
                    panic!("failed to parse combo '{combo}' for {}: {err}", raw.id)
                })
            })
            .collect::<Vec<_>>();
        assert!(
            !combos.is_empty(),
            "keymap entry {} must declare combos",
            raw.id
        );
        let combos_display = combos
            .iter()
            .map(|pattern| pattern.display.as_str())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            action: raw.action.into_action(),
            contexts,
            combos,
            snippet: format!("{combos_display} {}", raw.description),
        }
    }

    fn matches(&self, context: KeymapContext, key: &KeyEvent) -> Option<KeyAction> {
        if !self.contexts.contains(&context) {
            return None;
        }
        self.combos
            .iter()
            .any(|pattern| pattern.matches(key))
            .then_some(self.action)
    }
}

struct KeyPattern {
    matcher: CodeMatcher,
    required: KeyModifiers,
    allow_shift: bool,
    display: String,
}

impl KeyPattern {
    fn parse(combo: &str) -> Result<Self, String> {
        let display = combo.trim().to_string();
        let mut tokens = display
            .split('+')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();
        let Some(key_token) = tokens.pop() else {
            return Err("combo must contain a key".into());
        };
        let matcher = CodeMatcher::from_token(key_token)?;
        let mut required = KeyModifiers::empty();
        for token in tokens {
            match token.to_lowercase().as_str() {
                "ctrl" | "control" => required |= KeyModifiers::CONTROL,
                "shift" => required |= KeyModifiers::SHIFT,
                "alt" => required |= KeyModifiers::ALT,
                other => return Err(format!("unsupported modifier '{other}'")),
            }
        }
        let allow_shift = matcher.allows_extra_shift() && !required.contains(KeyModifiers::SHIFT);
        Ok(Self {
            matcher,
            required,
            allow_shift,
            display,
        })
    }

    fn matches(&self, key: &KeyEvent) -> bool {
        if !self.matcher.matches(&key.code) || !key.modifiers.contains(self.required) {
            return false;
        }
        let extra = key.modifiers - self.required;
        if self.allow_shift {
            (extra - KeyModifiers::SHIFT).is_empty()
        } else {
            extra.is_empty()
        }
    }
}

#[derive(Clone)]
enum CodeMatcher {
    Literal(KeyCode),
    Char(char),
}

impl CodeMatcher {
    fn from_token(token: &str) -> Result<Self, String> {
        let normalized = token.to_lowercase();
        let matcher = match normalized.as_str() {
            "tab" => CodeMatcher::Literal(KeyCode::Tab),
            "backtab" => CodeMatcher::Literal(KeyCode::BackTab),
            "enter" => CodeMatcher::Literal(KeyCode::Enter),
            "esc" | "escape" => CodeMatcher::Literal(KeyCode::Esc),
            "backspace" => CodeMatcher::Literal(KeyCode::Backspace),
            "left" => CodeMatcher::Literal(KeyCode::Left),
            "right" => CodeMatcher::Literal(KeyCode::Right),
            "up" => CodeMatcher::Literal(KeyCode::Up),
            "down" => CodeMatcher::Literal(KeyCode::Down),
            "space" => CodeMatcher::Char(' '),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => CodeMatcher::Char(ch),
                    _ => return Err(format!("unsupported key '{token}'")),
                }
            }
        };
        Ok(matcher)
    }

    fn matches(&self, code: &KeyCode) -> bool {
        match (self, code) {
            (CodeMatcher::Literal(expected), actual) => actual == expected,
            (CodeMatcher::Char(expected), KeyCode::Char(actual)) => {
                actual.to_ascii_lowercase() == *expected
            }
            _ => false,
        }
    }

    fn allows_extra_shift(&self) -> bool {
        matches!(
            self,
            CodeMatcher::Char(_) | CodeMatcher::Literal(KeyCode::BackTab)
        )
    }
}

static KEYMAP: LazyLock<Vec<KeyBinding>> = LazyLock::new(|| {
    let raw_entries: Vec<RawEntry> =
        serde_json::from_str(keymap_source!()).expect("invalid keymap/default.keymap.json");
    raw_entries.into_iter().map(KeyBinding::from_raw).collect()
});

/// Resolves `key` against the given contexts in priority order.
pub(crate) fn classify_key(contexts: &[KeymapContext], key: &KeyEvent) -> Option<KeyAction> {
    contexts.iter().find_map(|context| {
        KEYMAP
            .iter()
            .find_map(|binding| binding.matches(*context, key))
    })
}

pub(crate) fn help_text(contexts: &[KeymapContext]) -> Option<String> {
    let snippets = KEYMAP
        .iter()
        .filter(|binding| contexts.iter().any(|ctx| binding.contexts.contains(ctx)))
        .map(|binding| binding.snippet.as_str())
        .collect::<Vec<_>>();
    if snippets.is_empty() {
        None
    } else {
        Some(snippets.join(" • "))
    }
}
