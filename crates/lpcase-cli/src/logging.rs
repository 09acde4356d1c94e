use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// `RUST_LOG` selects what is shown (default `warn`), e.g.
/// `RUST_LOG=lpcase_suite=info` to trace every scenario or
/// `RUST_LOG=lpcase_solver=debug` for simplex phases. Logs go to stderr so
/// they never mix with LP text or JSON on stdout.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
