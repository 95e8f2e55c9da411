use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::{AppSection, LoggingConfig};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the process-wide subscriber. Call once from the binary.
pub fn init(logging: &LoggingConfig, app: &AppSection) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(logging, app)));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    let file_layer = logging.dir.as_ref().map(|log_dir| {
        let _ = std::fs::create_dir_all(log_dir);
        let file_appender = tracing_appender::rolling::daily(log_dir, "server.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(non_blocking)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

fn default_directive(logging: &LoggingConfig, app: &AppSection) -> String {
    if let Some(level) = logging.level.as_deref().filter(|l| !l.trim().is_empty()) {
        return level.to_string();
    }
    if app.is_development() {
        "debug".to_string()
    } else {
        "info".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_envs_default_to_debug() {
        let logging = LoggingConfig::default();
        let mut app = AppSection::default();

        app.env = "dev".to_string();
        assert_eq!(default_directive(&logging, &app), "debug");

        app.env = "prod".to_string();
        assert_eq!(default_directive(&logging, &app), "info");
    }

    #[test]
    fn explicit_level_wins() {
        let logging = LoggingConfig {
            dir: None,
            level: Some("warn,inquiry_backend=debug".to_string()),
        };
        assert_eq!(
            default_directive(&logging, &AppSection::default()),
            "warn,inquiry_backend=debug"
        );
    }
}
