use std::time::Duration;

use crate::list::DEFAULT_DEBOUNCE;

#[derive(Debug, Clone)]
pub struct UiOptions {
    pub tick_rate: Duration,
    /// Quiet period after the last keystroke in the text filter before the
    /// list is fetched.
    pub debounce: Duration,
    pub show_help: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
            debounce: DEFAULT_DEBOUNCE,
            show_help: true,
        }
    }
}

impl UiOptions {
    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }

    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}
