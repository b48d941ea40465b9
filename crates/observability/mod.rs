mod config;

use anyhow::{Context, Result};
use config::ObservabilityConfig;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber for one binary. Call once, before any other logging.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let env_filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("observability: invalid filter {:?}", config.filter))?;

    // ChronoLocal so a configured TZ shows up as the offset in log lines.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_timer(ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("observability: subscriber already installed")?;

    let context = &config.service_context;

    // Collected before a subscriber existed to print them.
    for warning in &config.warnings {
        warn!(component = %context.component, %warning, "observability: config warning");
    }

    info!(
        service = %context.service_name,
        environment = %context.environment,
        component = %context.component,
        filter = %config.filter,
        "observability: initialized"
    );

    Ok(())
}
