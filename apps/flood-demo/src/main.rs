//! # Flood Demo
//!
//! Bootstraps a flood controller from configuration and checks one user a
//! fixed number of times, printing each decision.

mod config;
mod state;
mod telemetry;

use config::AppConfig;
use telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::load()?;

    tracing::info!(
        window_secs = config.policy.window_seconds(),
        max_events = config.policy.max_events(),
        subject = config.demo.subject,
        attempts = config.demo.attempts,
        "Starting flood demo"
    );

    let limiter = state::build_flood_control(&config).await?;

    for attempt in 1..=config.demo.attempts {
        match limiter.check(config.demo.subject).await {
            Ok(allowed) => println!("attempt {attempt}: allowed={allowed}"),
            Err(e) => {
                tracing::error!(attempt, error = %e, "Flood check failed");
                println!("attempt {attempt}: error={e}");
            }
        }
    }

    Ok(())
}
