//! Logging infrastructure - structured tracing for the bridge
//!
//! Events go through `tracing`; the subscriber installed here filters them
//! by level (`RUST_LOG` wins when set) and writes to stderr or, through a
//! non-blocking appender, to a file.
//!
//! Event helpers below keep targets and field names consistent:
//! `arena`, `marshal`, `identity`, `native`.

use once_cell::sync::OnceCell;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub use tracing::{debug, error, info, trace, warn, Level};

/// Set once logging is installed; holds the file writer guard when there is one
static LOGGER: OnceCell<Option<WorkerGuard>> = OnceCell::new();

/// Where and how bridge events are written
///
/// Built from `[logging]` in the TOML config or from `HANDLEWIRE_LOG_*`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub file_output: bool,
    /// Only read when `file_output` is set
    pub log_path: Option<String>,
    pub json_format: bool,
    /// Emit enter/close events for spans
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Read `HANDLEWIRE_LOG_LEVEL`, `HANDLEWIRE_LOG_FILE`, `HANDLEWIRE_LOG_JSON`
    /// and `HANDLEWIRE_LOG_SPANS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // HANDLEWIRE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("HANDLEWIRE_LOG_LEVEL") {
            config.level = parse_level(&level_str);
        }

        // HANDLEWIRE_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("HANDLEWIRE_LOG_FILE") {
            config.file_output = true;
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("HANDLEWIRE_LOG_JSON").is_ok();
        config.show_spans = std::env::var("HANDLEWIRE_LOG_SPANS").is_ok();

        config
    }

    /// Verbose config for debugging marshaling problems
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            file_output: false,
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

/// Parse a level name, falling back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Install the global subscriber for `config`
///
/// Idempotent; also tolerates a subscriber installed by someone else.
pub fn init_with_config(config: LogConfig) {
    LOGGER.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = config.level.as_str().to_lowercase();
            EnvFilter::new(format!(
                "handlewire={level},handlewire_runtime={level},arena={level},marshal={level},identity={level},native={level}"
            ))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let (writer, guard) = match config.log_path.as_deref().filter(|_| config.file_output) {
            Some(path) => {
                let path = Path::new(path);
                let directory = path.parent().unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "handlewire.log".to_string());
                let appender = tracing_appender::rolling::never(directory, file_name);
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                (BoxMakeWriter::new(non_blocking), Some(guard))
            }
            None => (BoxMakeWriter::new(std::io::stderr), None),
        };

        let layer = fmt::layer()
            .with_writer(writer)
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(cfg!(debug_assertions));

        let installed = if config.json_format {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer.json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer.compact())
                .try_init()
        };

        if installed.is_err() {
            debug!("global subscriber already installed, keeping it");
        }

        guard
    });
}

pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

// ============================================================================
// Bridge-specific logging functions
// ============================================================================

/// Log a new backing block chained into an arena
#[inline]
pub fn log_arena_grow(block_size: usize, block_count: usize) {
    debug!(
        target: "arena",
        block_size,
        block_count,
        "arena grew"
    );
}

/// Log a bulk release
#[inline]
pub fn log_arena_release(bytes_released: usize, generation: u64) {
    trace!(
        target: "arena",
        bytes_released,
        generation,
        "arena released"
    );
}

/// Log a marshaled chain
#[inline]
pub fn log_marshal(head_tag: i32, depth: usize, arena_offset: usize) {
    trace!(
        target: "marshal",
        head_tag,
        depth,
        arena_offset,
        "chain marshaled"
    );
}

/// Log a wrapper created for a newly observed handle
#[inline]
pub fn log_identity_create(handle: u64, tier: &str, type_name: &str) {
    trace!(
        target: "identity",
        handle,
        tier,
        wrapper = type_name,
        "wrapper created"
    );
}

/// Log an in-place tier promotion
#[inline]
pub fn log_identity_promote(handle: u64, from: &str, to: &str) {
    debug!(
        target: "identity",
        handle,
        from,
        to,
        "wrapper promoted"
    );
}

/// Log a handle dropped from the store
#[inline]
pub fn log_identity_forget(handle: u64, existed: bool) {
    trace!(
        target: "identity",
        handle,
        existed,
        "handle forgotten"
    );
}

/// Log a native entry point invocation
#[inline]
pub fn log_native_call(function: &str) {
    trace!(target: "native", function, "native call");
}

/// Log a native entry point result
#[inline]
pub fn log_native_return(function: &str, code: i32) {
    if code < 0 {
        warn!(target: "native", function, code, "native call failed");
    } else {
        trace!(target: "native", function, code, "native return");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;

    #[test]
    fn verbose_preset_traces_spans() {
        let verbose = LogConfig::debug();
        assert_eq!(verbose.level, Level::TRACE);
        assert!(verbose.show_spans);
        assert!(!LogConfig::default().show_spans);
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Warn"), Level::WARN);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn file_section_enables_file_output() {
        let section = LoggingConfig {
            level: "error".to_string(),
            json: true,
            file: Some("bridge.log".to_string()),
            spans: false,
        };
        let config = section.to_log_config();

        assert_eq!(config.level, Level::ERROR);
        assert!(config.file_output);
        assert_eq!(config.log_path.as_deref(), Some("bridge.log"));
        assert!(config.json_format);
    }

    #[test]
    fn repeated_init_keeps_first_subscriber() {
        init();
        init_with_config(LogConfig::debug());
        assert!(is_initialized());

        // Helpers are plain events once a subscriber exists
        log_arena_grow(4096, 2);
        log_marshal(8, 2, 96);
        log_identity_promote(0x10, "1.0", "1.2");
        log_native_return("vkCreateFence", -1);
    }
}
