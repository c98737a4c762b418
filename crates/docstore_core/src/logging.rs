//! Process logging bootstrap.
//!
//! # Responsibility
//! - Initialize the `log` backend exactly once per process.
//! - Resolve level and sink from `DOCSTORE_LOG_LEVEL` / `DOCSTORE_LOG_DIR`.
//!
//! # Invariants
//! - Initialization is idempotent for identical settings.
//! - Re-initialization with different settings is rejected.
//! - Initialization never panics.
//!
//! Events use a flat `event=... module=... status=...` message shape so the
//! rotating files stay grep-friendly.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

pub const LOG_LEVEL_ENV: &str = "DOCSTORE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DOCSTORE_LOG_DIR";

const LOG_FILE_BASENAME: &str = "docstore";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    settings: LogSettings,
    _logger: LoggerHandle,
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: &'static str,
    /// Rotating files under this absolute directory; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl LogSettings {
    /// Resolves settings from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    ///
    /// A missing level falls back to [`default_log_level`]; a missing or
    /// blank directory selects stderr.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let level = match lookup(LOG_LEVEL_ENV) {
            Some(level) if !level.trim().is_empty() => normalize_level(&level)?,
            _ => default_log_level(),
        };
        let log_dir = match lookup(LOG_DIR_ENV) {
            Some(dir) if !dir.trim().is_empty() => Some(normalize_log_dir(&dir)?),
            _ => None,
        };
        Ok(Self { level, log_dir })
    }
}

/// Initializes process logging.
///
/// # Errors
/// - Returns an error when logging is already active with other settings.
/// - Returns an error when the log directory cannot be created.
/// - Returns an error when logger backend setup fails.
pub fn init_logging(settings: &LogSettings) -> Result<(), String> {
    if let Some(state) = LOGGING_STATE.get() {
        return check_same(&state.settings, settings);
    }

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let logger = Logger::try_with_str(settings.level)
            .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?;

        let logger = match &settings.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|err| {
                    format!("failed to create log directory `{}`: {err}", dir.display())
                })?;
                logger
                    .log_to_file(
                        FileSpec::default()
                            .directory(dir.as_path())
                            .basename(LOG_FILE_BASENAME),
                    )
                    .rotate(
                        Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                        Naming::Numbers,
                        Cleanup::KeepLogFiles(MAX_LOG_FILES),
                    )
                    .write_mode(WriteMode::BufferAndFlush)
                    .append()
                    .format_for_files(flexi_logger::detailed_format)
            }
            None => logger.log_to_stderr().format(flexi_logger::default_format),
        };

        let handle = logger
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        install_panic_hook_once();

        info!(
            "event=app_start module=core status=ok platform={} version={}",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION")
        );
        info!(
            "event=logging_init module=core status=ok level={} sink={}",
            settings.level,
            settings
                .log_dir
                .as_deref()
                .map_or_else(|| "stderr".to_string(), |dir| dir.display().to_string())
        );

        Ok(LoggingState {
            settings: settings.clone(),
            _logger: handle,
        })
    })?;

    check_same(&state.settings, settings)
}

/// Returns the active settings, or `None` before initialization.
pub fn logging_status() -> Option<LogSettings> {
    LOGGING_STATE.get().map(|state| state.settings.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn check_same(active: &LogSettings, requested: &LogSettings) -> Result<(), String> {
    if active == requested {
        return Ok(());
    }
    Err(format!(
        "logging already initialized with {active:?}; refusing to switch to {requested:?}"
    ))
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let path = Path::new(log_dir.trim());
    if !path.is_absolute() {
        return Err(format!(
            "{LOG_DIR_ENV} must be an absolute path, got `{}`",
            path.display()
        ));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may echo document contents; flatten and cap it.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, logging_status, normalize_level, sanitize_message, LogSettings,
        LOG_DIR_ENV, LOG_LEVEL_ENV,
    };
    use std::path::PathBuf;

    #[test]
    fn settings_fall_back_to_defaults() {
        let settings = LogSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.level, super::default_log_level());
        assert_eq!(settings.log_dir, None);
    }

    #[test]
    fn settings_reject_relative_dir_and_unknown_level() {
        let dir_err = LogSettings::from_lookup(|key| {
            (key == LOG_DIR_ENV).then(|| "logs/dev".to_string())
        })
        .unwrap_err();
        assert!(dir_err.contains("absolute"));

        let level_err = LogSettings::from_lookup(|key| {
            (key == LOG_LEVEL_ENV).then(|| "loud".to_string())
        })
        .unwrap_err();
        assert!(level_err.contains("unsupported log level"));
    }

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
    }

    #[test]
    fn sanitize_message_removes_newlines_and_truncates() {
        let sanitized = sanitize_message("line1\nline2\rline3", 8);
        assert!(!sanitized.contains('\n'));
        assert!(!sanitized.contains('\r'));
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            level: "info",
            log_dir: Some(dir.path().to_path_buf()),
        };

        init_logging(&settings).expect("first init should succeed");
        init_logging(&settings).expect("same settings should be idempotent");

        let other = LogSettings {
            level: "debug",
            log_dir: Some(PathBuf::from("/tmp/docstore-other-logs")),
        };
        let err = init_logging(&other).expect_err("conflicting settings should fail");
        assert!(err.contains("refusing to switch"));

        assert_eq!(logging_status(), Some(settings));
    }
}
