use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    api::UserApi,
    prefs::{self, MemoryPreferences, PreferenceStore},
};

use super::{options::UiOptions, runtime::App, screen::Screen};

const DEFAULT_TITLE: &str = "User administration";

/// Entry point for the terminal screen.
///
/// ```no_run
/// use usergrid::{InMemoryUserApi, UserAdmin};
///
/// UserAdmin::new(InMemoryUserApi::demo()).run()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct UserAdmin {
    api: Arc<dyn UserApi>,
    prefs: Arc<dyn PreferenceStore>,
    title: Option<String>,
    options: UiOptions,
}

impl UserAdmin {
    pub fn new(api: impl UserApi + 'static) -> Self {
        Self::with_shared_api(Arc::new(api))
    }

    pub fn with_shared_api(api: Arc<dyn UserApi>) -> Self {
        Self {
            api,
            prefs: Arc::new(MemoryPreferences::new()),
            title: None,
            options: UiOptions::default(),
        }
    }

    pub fn with_preferences(mut self, prefs: impl PreferenceStore + 'static) -> Self {
        self.prefs = Arc::new(prefs);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_options(mut self, options: UiOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs the screen until the user leaves it.
    pub fn run(self) -> Result<()> {
        let UserAdmin {
            api,
            prefs,
            title,
            options,
        } = self;

        let hide_disabled = prefs::load_hide_disabled(prefs.as_ref());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("usergrid-io")
            .enable_all()
            .build()
            .context("failed to start the async runtime")?;

        info!(hide_disabled, "mounting user admin screen");
        let (screen, initial) = Screen::mount(hide_disabled, options.debounce);
        let title = title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let mut app = App::new(screen, api, prefs, options, title, runtime.handle().clone());
        let outcome = app.run(initial);
        drop(app);
        runtime.shutdown_background();
        outcome
    }
}
