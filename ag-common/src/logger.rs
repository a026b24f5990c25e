use tracing_subscriber::{EnvFilter, fmt};

/// Initializes a process-wide `tracing` subscriber.
///
/// Plays the same role as the teacher's `common::logger::init_logger`, but
/// targets `tracing` (already a dependency of the teacher's async crates)
/// since every binary in this workspace is async.
pub fn init_logger(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .ok();
}
