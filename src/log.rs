//! Logging
//!
//! Components that report progress take a [`Logger`] instead of reaching for
//! a process-wide instance. [`TracingLogger`] forwards to `tracing`, and
//! [`init_tracing`] installs the subscriber for binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Logging capability handed to components
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Logger that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Returns an error
/// if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("nebula_client={}", config.level)))?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == LogFormat::Json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = TracingLogger;
        logger.info("info");
        logger.warn("warn");
        logger.error("error");
    }

    #[test]
    fn test_logger_is_object_safe() {
        let logger: Box<dyn Logger> = Box::new(TracingLogger);
        logger.info("boxed");
    }
}
