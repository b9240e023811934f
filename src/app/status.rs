#[derive(Debug, Clone)]
pub struct StatusLine {
    message: String,
}

pub const READY_STATUS: &str = "Ready. Enter opens a user, Ctrl+N starts a new one.";
const LOADING_STATUS: &str = "Loading users...";

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: READY_STATUS.to_string(),
        }
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_raw(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }

    pub fn ready(&mut self) {
        self.message = READY_STATUS.to_string();
    }

    pub fn editing(&mut self, label: &str) {
        self.message = format!("Editing {label}");
    }

    pub fn loading(&mut self) {
        self.message = LOADING_STATUS.to_string();
    }

    /// Clears the loading notice; any other message stays.
    pub fn finish_loading(&mut self) {
        if self.message == LOADING_STATUS {
            self.ready();
        }
    }

    pub fn list_failed(&mut self, error: &str) {
        self.message = format!("Could not load users: {error}. Press r to retry.");
    }

    pub fn saving(&mut self) {
        self.message = "Saving...".to_string();
    }

    pub fn saved(&mut self, username: &str) {
        self.message = format!("Saved {username}");
    }

    pub fn save_failed(&mut self, retryable: bool) {
        self.message = if retryable {
            "Save failed. Press Ctrl+S to try again.".to_string()
        } else {
            "Save failed. Review the messages in the form.".to_string()
        };
    }

    pub fn issues_remaining(&mut self, count: usize) {
        self.message = format!("{count} issue(s) remaining");
    }

    pub fn pending_discard(&mut self) {
        self.message = "Unsaved changes. Discard them (y) or stay (n)?".to_string();
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
