use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Debug)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) filter: String,
    /// Logged once tracing is up.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_values(
            component,
            env::var("SERVICE_NAME").ok(),
            env::var("STAGE").ok(),
            env::var(EnvFilter::DEFAULT_ENV).ok(),
        )
    }

    fn from_values(
        component: &str,
        service_name: Option<String>,
        stage: Option<String>,
        rust_log: Option<String>,
    ) -> Self {
        let component = component.trim().to_string();
        let mut warnings = Vec::new();

        let service_name = non_empty(service_name).unwrap_or_else(|| component.clone());
        let environment = non_empty(stage).unwrap_or_else(|| "unknown".to_string());

        let filter = match non_empty(rust_log) {
            Some(raw) if EnvFilter::try_new(&raw).is_ok() => raw,
            Some(raw) => {
                warnings.push(format!(
                    "RUST_LOG is invalid (value: {raw}); defaulting to {DEFAULT_FILTER}"
                ));
                DEFAULT_FILTER.to_string()
            }
            None => DEFAULT_FILTER.to_string(),
        };

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            filter,
            warnings,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_name_falls_back_to_component() {
        let config = ObservabilityConfig::from_values(" worker ", None, Some("".into()), None);

        assert_eq!(config.service_context.service_name, "worker");
        assert_eq!(config.service_context.environment, "unknown");
        assert_eq!(config.filter, "info");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn invalid_filter_is_reported_and_replaced() {
        let config = ObservabilityConfig::from_values(
            "backend",
            Some("mailing-backend".into()),
            Some("prod".into()),
            Some("crates=notalevel".into()),
        );

        assert_eq!(config.filter, "info");
        assert_eq!(config.warnings.len(), 1);
        assert_eq!(config.service_context.service_name, "mailing-backend");
    }

    #[test]
    fn valid_filter_is_kept() {
        let config =
            ObservabilityConfig::from_values("backend", None, None, Some("debug,diesel=warn".into()));

        assert_eq!(config.filter, "debug,diesel=warn");
    }
}
