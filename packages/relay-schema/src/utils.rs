use crate::config::RelayConfig;
use std::{env, str::FromStr};
use tracing_subscriber::filter::EnvFilter;

const RUST_LOG: &str = "RUST_LOG";
const HUMAN_LOGGING: &str = "HUMAN_LOGGING";

/// Convert a snake_case name to the camelCase used in the schema:
/// `pub_date__gt` becomes `pubDateGt`.
pub fn to_camel_case(snake: &str) -> String {
    let mut parts = snake.split('_');
    let mut camel = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            camel.extend(first.to_uppercase());
            camel.push_str(&chars.as_str().to_lowercase());
        }
    }
    camel
}

/// Initialize the logging context.
pub fn init_logging(config: &RelayConfig) -> anyhow::Result<()> {
    let filter = match env::var_os(RUST_LOG) {
        Some(_) => EnvFilter::try_from_default_env()?,
        None if config.verbose => EnvFilter::new("debug"),
        None => EnvFilter::new("info"),
    };

    let human_logging = match env::var(HUMAN_LOGGING) {
        Ok(value) => bool::from_str(&value).map_err(|_| {
            anyhow::anyhow!("Expected `true` or `false` to be provided for `HUMAN_LOGGING`")
        })?,
        Err(_) => true,
    };

    let sub = tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    let installed = if human_logging {
        sub.with_ansi(true)
            .with_level(true)
            .with_line_number(true)
            .try_init()
    } else {
        sub.with_ansi(false)
            .with_level(true)
            .with_line_number(true)
            .json()
            .try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Could not install tracing subscriber: {e}"))
}
