use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the stderr tracing subscriber. `RUST_LOG` wins over `log_level`.
pub fn initialize_tracing(log_level: &str) {
    let env_filter = build_env_filter(log_level);

    // Only fails when a subscriber is already installed.
    let _ = fmt::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}

fn build_env_filter(log_level: &str) -> EnvFilter {
    let default_level = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::WARN);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}

