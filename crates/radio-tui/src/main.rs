mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod mpv;
mod theme;
mod widgets;

use radio_core::config::Config;
use radio_core::platform;
use radio_core::settings::SettingsStore;
use radio_core::supabase::SupabaseClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("radioplay.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but keep the
    // HTTP and websocket internals quiet.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "debug,hyper_util=warn,reqwest=warn,hyper=warn,tungstenite=warn,tokio_tungstenite=warn"
            .to_string()
    });
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("radioplay log: {}", log_path.display());
    tracing::info!("radioplay starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config unreadable ({}), using defaults", e);
            let mut c = Config::default();
            c.apply_env(|name| std::env::var(name).ok());
            c
        }
    };

    // A missing project leaves the player up with an inline notice.
    let client = SupabaseClient::new(&config.supabase);
    let settings = SettingsStore::open(config.paths.settings_file.clone());

    let app = app::App::new(config, client, settings);
    app.run().await?;

    tracing::info!("radioplay exiting");
    Ok(())
}
