use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let state_dir = std::env::var("EDUDESK_STATE_DIR").unwrap_or_else(|_| ".edudesk".to_string());
    info!(
        target: "edudesk",
        "edudesk starting: RUST_LOG='{}', state_dir='{}'",
        rust_log, state_dir
    );

    edudesk::cli::run(&state_dir).await
}
