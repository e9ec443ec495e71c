use ans_agent::{AgentConfig, ReminderAgent};
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

async fn run(config: AgentConfig) -> Result<()> {
    let mut builder = ReminderAgent::builder(config.bundle_option());
    if let Some(store) = config.store() {
        builder = builder.with_store(store);
    }
    let agent = builder.build().context("failed to build reminder agent")?;
    let now = agent.now();
    let alerts = agent.tick(now).await?;
    tracing::info!(fired = alerts.len(), "due reminders processed");
    println!("{}", agent.dump());
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err:#}");
            return;
        }
    };
    if let Err(err) = run(config).await {
        eprintln!("Failed to dump reminders: {err:#}");
    }
}
