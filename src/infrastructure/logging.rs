use crate::domain::settings::LogSettings;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub struct LoggingGuard {
    // Dropping the guard flushes and stops the file writer
    _guards: Vec<WorkerGuard>,
}

/// `RUST_LOG` wins over the configured level
fn level_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn rotation(name: &str) -> Rotation {
    match name.to_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

/// Relative log directories live next to the settings file
pub fn resolve_log_dir(settings: &LogSettings, settings_path: &Path) -> PathBuf {
    let dir = Path::new(&settings.log_dir);
    match settings_path.parent() {
        Some(base) if dir.is_relative() => base.join(dir),
        _ => dir.to_path_buf(),
    }
}

pub fn init_logger(settings: &LogSettings, log_dir: &Path) -> anyhow::Result<LoggingGuard> {
    let mut guards = Vec::new();

    let console_layer = settings.console_logging_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(settings.show_file_line)
            .with_line_number(settings.show_file_line)
            .with_thread_ids(settings.show_thread_ids)
            .with_target(settings.show_target)
            .with_ansi(settings.ansi_colors)
    });

    let file_layer = if settings.file_logging_enabled {
        let file_appender = tracing_appender::rolling::RollingFileAppender::new(
            rotation(&settings.rotation),
            log_dir,
            &settings.file_name_prefix,
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);
        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(settings.show_file_line)
                .with_line_number(settings.show_file_line)
                .with_thread_ids(settings.show_thread_ids)
                .with_target(settings.show_target),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(level_filter(settings))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("A global logger is already installed")?;

    tracing::info!(
        "Logging initialized (level: {}, file: {})",
        settings.level,
        if settings.file_logging_enabled {
            log_dir.display().to_string()
        } else {
            "off".to_string()
        }
    );

    Ok(LoggingGuard { _guards: guards })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation("Hourly"), Rotation::HOURLY);
        assert_eq!(rotation("never"), Rotation::NEVER);
        assert_eq!(rotation("weekly"), Rotation::DAILY);
    }

    #[test]
    fn test_relative_log_dir_follows_settings() {
        let settings = LogSettings::default();
        let dir = resolve_log_dir(&settings, Path::new("/cfg/DualCamRemote/settings.json"));
        assert_eq!(dir, Path::new("/cfg/DualCamRemote/logs"));

        let absolute = LogSettings {
            log_dir: "/var/log/remote".to_string(),
            ..LogSettings::default()
        };
        assert_eq!(
            resolve_log_dir(&absolute, Path::new("/cfg/settings.json")),
            Path::new("/var/log/remote")
        );
    }
}
