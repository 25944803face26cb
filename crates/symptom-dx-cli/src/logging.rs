use clap::ValueEnum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides `--log-level` with a full filter.
pub const LOG_ENV_VAR: &str = "SYMPTOM_DX_LOG";

const LOG_TARGETS: [&str; 3] = ["symptom_dx", "symptom_dx_core", "symptom_dx_llm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Directive string applied when `SYMPTOM_DX_LOG` is unset.
pub fn default_directives(level: LogLevel) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the global subscriber. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_logging(level: LogLevel) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}
