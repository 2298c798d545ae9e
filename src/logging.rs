use crate::app_env;
use std::io;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*, registry};

/// Constructs a filter which uses [app_env::LOG_LEVEL] to configure per-module logging. Filters
/// to the "info" level by default.
pub fn init_env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(app_env::LOG_LEVEL)
        .from_env()
        .expect("building the logging filter failed")
}

/// Sets up the global logging sink. Logs are written as JSON to stderr so they don't get mixed
/// into the menus printed on stdout. [env_filter] decides which events are kept. Though the logger
/// is set up with the "tracing" crate, it also provides a bridge for libraries still using "log".
pub fn setup_logging(env_filter: EnvFilter) {
    registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_filter(env_filter),
        )
        .init();
}
