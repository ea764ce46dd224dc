//! Tracing setup.
//!
//! Filter precedence: `TOMBO_LOG` env, then the configured directive,
//! then `info`. Safe to call more than once; later calls are no-ops.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};

pub fn init(config: &LoggingConfig) {
    if !config.stdout {
        return;
    }
    let filter = EnvFilter::try_from_env("TOMBO_LOG")
        .or_else(|_| match &config.filter {
            Some(directive) => EnvFilter::try_new(directive),
            None => EnvFilter::try_new("info"),
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
}
