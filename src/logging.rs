use std::env;
use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for the setup tool
///
/// This sets up colored output for terminals with automatic detection of:
/// - NO_COLOR environment variable (disables colors)
/// - FORCE_COLOR environment variable (colors even when stdout is not a terminal)
/// - RUST_LOG environment variable for filtering
pub fn init_logging() {
    let use_ansi = should_use_colors();

    // Defaults to "info" if RUST_LOG is not set or cannot be parsed
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .compact(),
        )
        .with(env_filter)
        .init();
}

/// Determine if we should use ANSI colors based on environment
fn should_use_colors() -> bool {
    let no_color = env::var("NO_COLOR").is_ok() || env::var("EDGE_SETUP_NO_COLOR").is_ok();
    let force_color =
        env::var("FORCE_COLOR").is_ok() || env::var("EDGE_SETUP_FORCE_COLOR").is_ok();

    decide_colors(no_color, force_color, std::io::stdout().is_terminal())
}

// NO_COLOR wins over FORCE_COLOR; without either, color only on a terminal
fn decide_colors(no_color: bool, force_color: bool, is_terminal: bool) -> bool {
    if no_color {
        return false;
    }
    force_color || is_terminal
}
