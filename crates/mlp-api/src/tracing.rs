//! Log output: pretty and verbose in development, flattened JSON in production.
//!
//! `RUST_LOG` overrides the default filter, e.g. `RUST_LOG=mlp_api=trace,sqlx=info`.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

const DEV_FILTER: &str = "debug,mlp_api=debug,mlp_db=debug,tower_http=debug,sqlx=warn,hyper=info";
const PROD_FILTER: &str = "info,tower_http=info,sqlx=warn,hyper=warn";

pub fn default_filter(env: Environment) -> &'static str {
    if env.is_development() { DEV_FILTER } else { PROD_FILTER }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_tracing(env: Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(env)));

    let fmt_layer = if env.is_development() {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .pretty()
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .flatten_event(true)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    };

    if tracing_subscriber::registry().with(fmt_layer).try_init().is_ok() {
        tracing::info!(environment = ?env, "tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        for env in [Environment::Development, Environment::Production] {
            assert!(EnvFilter::try_new(default_filter(env)).is_ok());
        }
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing(Environment::Production);
        init_tracing(Environment::Production);
    }
}
