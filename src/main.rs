use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use histrelay::config::{Options, OPTIONS_PATH};
use histrelay::schedule::Scheduler;
use histrelay::server::{self, AppState, BIND_ADDR};
use histrelay::supervisor::{SupervisorClient, SUPERVISOR_URL};

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    tracing::info!("Starting histrelay");

    // Startup validation: broken options, a missing credential, or an
    // unreachable controller is fatal here. Once the loop is running the
    // same failures only cost a cycle.
    let options = Options::load_default().context("Failed to load add-on options")?;
    let supervisor =
        SupervisorClient::from_env(SUPERVISOR_URL).context("Failed to create Supervisor client")?;
    let tz = supervisor
        .timezone()
        .await
        .context("Failed to resolve controller timezone")?;

    let addr = BIND_ADDR.parse().context("Invalid bind address")?;
    let state = AppState::new(OPTIONS_PATH, SUPERVISOR_URL);

    tokio::spawn(async move {
        if let Err(err) = server::serve(state, addr).await {
            tracing::error!(error = %err, "Trigger server exited");
        }
    });

    let scheduler = Scheduler::new(OPTIONS_PATH, SUPERVISOR_URL);
    scheduler.run(options, tz).await;

    Ok(())
}

fn setup_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("histrelay=info,warn"));

    let format = std::env::var("HISTRELAY_LOG_FORMAT").unwrap_or_default();

    match format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
