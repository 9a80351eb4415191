use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context as _;
use directories::ProjectDirs;
use shelftrack_application::AppState;
use shelftrack_client::{BookApi, Executor, HttpBookApi};
use shelftrack_core::{MoveFailurePolicy, Settings};
use shelftrack_storage::SettingsStore;
use shelftrack_ui::Ui;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "shelftrack", "shelftrack").context("resolve project dirs")?;

    init_tracing(project_dirs.data_dir())?;

    let store = SettingsStore::open(project_dirs.config_dir().join("settings.json"))?;
    if !store.exists() {
        store.save_settings(&Settings::default())?;
    }
    let mut settings = store.load_settings()?;
    apply_env_overrides(&mut settings)?;
    tracing::info!(
        server = %settings.server_url,
        settings = %store.path().display(),
        "starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    let api: Arc<dyn BookApi> = Arc::new(HttpBookApi::new(&settings)?);
    let (executor, completions) = Executor::new(api, runtime.handle().clone());

    let state = AppState::new(settings);
    let state = Ui::new(state, executor, completions).run()?;
    tracing::info!(books = state.board.len(), "exiting");

    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}

/// Logs go to a file: stdout belongs to the terminal UI.
fn init_tracing(data_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    let log_path = data_dir.join("shelftrack.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open log {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_env("SHELFTRACK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

fn apply_env_overrides(settings: &mut Settings) -> anyhow::Result<()> {
    if let Ok(url) = std::env::var("SHELFTRACK_SERVER_URL") {
        settings.server_url = url;
    }
    if let Ok(cookie) = std::env::var("SHELFTRACK_SESSION") {
        settings.session_cookie = Some(cookie);
    }
    if let Ok(policy) = std::env::var("SHELFTRACK_MOVE_POLICY") {
        settings.move_failure_policy = policy
            .parse::<MoveFailurePolicy>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("SHELFTRACK_MOVE_POLICY={policy}"))?;
    }
    settings.normalize();
    Ok(())
}
