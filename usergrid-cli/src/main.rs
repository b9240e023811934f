use std::fmt::Write as FmtWrite;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use usergrid::{FilePreferences, HttpUserApi, InMemoryUserApi, UiOptions, UserAdmin, UserApi};

#[derive(Debug, Parser)]
#[command(
    name = "usergrid",
    version,
    about = "Browse and edit user accounts in the terminal"
)]
struct Cli {
    /// Base URL of the user service, e.g. https://admin.example.org/api
    #[arg(long = "server", env = "USERGRID_SERVER", value_name = "URL")]
    server: Option<String>,

    /// Bearer token sent with every request
    #[arg(
        long = "token",
        env = "USERGRID_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    token: Option<String>,

    /// Run against a populated in-memory service instead of a server
    #[arg(long = "demo")]
    demo: bool,

    /// Preferences file (defaults to the platform config directory)
    #[arg(long = "prefs", value_name = "PATH")]
    prefs: Option<PathBuf>,

    /// Quiet period after typing in the search box before the list is fetched
    #[arg(long = "debounce-ms", value_name = "MS", default_value_t = 300)]
    debounce_ms: u64,

    /// Title shown at the top of the UI
    #[arg(long = "title", value_name = "TEXT")]
    title: Option<String>,

    /// Hide the key help line in the footer
    #[arg(long = "no-help")]
    no_help: bool,

    /// Append logs to this file (the terminal belongs to the UI)
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-level", value_name = "FILTER", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut diagnostics = DiagnosticCollector::default();
    let api = build_api(&cli, &mut diagnostics);
    let prefs = build_preferences(&cli, &mut diagnostics);
    diagnostics.into_result()?;
    let (Some(api), Some(prefs)) = (api, prefs) else {
        return Err(eyre!("startup failed"));
    };

    init_logging(&cli)?;
    info!(
        prefs = %prefs.path().display(),
        debounce_ms = cli.debounce_ms,
        "starting usergrid"
    );

    let options = UiOptions::default()
        .with_debounce(Duration::from_millis(cli.debounce_ms))
        .with_help(!cli.no_help);
    let mut admin = UserAdmin::with_shared_api(api)
        .with_preferences(prefs)
        .with_options(options);
    if let Some(title) = cli.title.as_ref() {
        admin = admin.with_title(title.clone());
    }
    admin.run().map_err(|err| eyre!("{err:#}"))
}

fn build_api(cli: &Cli, diagnostics: &mut DiagnosticCollector) -> Option<Arc<dyn UserApi>> {
    if cli.demo {
        return Some(Arc::new(InMemoryUserApi::demo()));
    }
    let Some(server) = cli.server.as_deref() else {
        diagnostics.push("service", "provide --server <URL> (or USERGRID_SERVER), or --demo");
        return None;
    };
    if !(server.starts_with("http://") || server.starts_with("https://")) {
        diagnostics.push("service", format!("'{server}' is not an http(s) URL"));
        return None;
    }
    match HttpUserApi::new(server) {
        Ok(api) => {
            let api = match cli.token.as_ref() {
                Some(token) => api.with_token(token.clone()),
                None => api,
            };
            Some(Arc::new(api))
        }
        Err(err) => {
            diagnostics.push("service", err.to_string());
            None
        }
    }
}

fn build_preferences(
    cli: &Cli,
    diagnostics: &mut DiagnosticCollector,
) -> Option<FilePreferences> {
    if let Some(path) = cli.prefs.as_ref() {
        if path.is_dir() {
            diagnostics.push("prefs", format!("{} is a directory", path.display()));
            return None;
        }
        return Some(FilePreferences::new(path));
    }
    match FilePreferences::default_location() {
        Ok(prefs) => Some(prefs),
        Err(err) => {
            diagnostics.push("prefs", format!("{err}; pass --prefs <PATH>"));
            None
        }
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let Some(path) = cli.log_file.as_ref() else {
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .wrap_err("failed to install the log subscriber")?;
    Ok(())
}

#[derive(Debug, Default)]
struct DiagnosticCollector {
    messages: Vec<String>,
}

impl DiagnosticCollector {
    fn push(&mut self, label: &str, message: impl Into<String>) {
        self.messages.push(format!("{label}: {}", message.into()));
    }

    fn into_result(self) -> Result<()> {
        if self.messages.is_empty() {
            return Ok(());
        }
        let mut body = String::from("cannot start:\n");
        for (idx, msg) in self.messages.iter().enumerate() {
            let _ = writeln!(body, "  {}. {}", idx + 1, msg);
        }
        Err(eyre!(body))
    }
}
