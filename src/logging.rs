// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Logging bootstrap.
//!
//! Library code logs through the `log` facade with metadata-only
//! `event=... module=... status=...` messages; note text and attachment bytes
//! never reach the log. The CLI prints its own output on stdout, so log lines
//! go to stderr.

use flexi_logger::{Logger, LoggerHandle};
use once_cell::sync::OnceCell;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    _logger: LoggerHandle,
}

/// Start logging to stderr at `level`.
///
/// Repeating the call with the same level is a no-op; asking for a different
/// level after initialization is rejected.
pub fn init_logging(level: &str) -> Result<(), String> {
    let normalized = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let logger = Logger::try_with_str(normalized)
            .map_err(|err| format!("invalid log level `{normalized}`: {err}"))?
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        log::debug!(
            "event=logging_init module=logging status=ok level={} version={}",
            normalized,
            env!("CARGO_PKG_VERSION")
        );
        Ok(LoggingState {
            level: normalized,
            _logger: logger,
        })
    })?;

    if state.level != normalized {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, normalized
        ));
    }
    Ok(())
}

/// Active level, or `None` before [`init_logging`] succeeded.
pub fn logging_level() -> Option<&'static str> {
    LOGGING_STATE.get().map(|state| state.level)
}

/// `debug` for debug builds, `warn` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "warn"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => Ok("off"),
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected off|trace|debug|info|warn|error"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_level, normalize_level};

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert_eq!(normalize_level("off").unwrap(), "off");
    }

    #[test]
    fn normalize_level_rejects_unknown_values() {
        let err = normalize_level("verbose").unwrap_err();
        assert!(err.contains("unsupported"));
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_level_switch() {
        init_logging("error").unwrap();
        init_logging("ERROR").unwrap();

        let err = init_logging("trace").unwrap_err();
        assert!(err.contains("refusing to switch"));
        assert_eq!(logging_level(), Some("error"));
    }
}
