use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `SIDE_CHAT_LOG=side_chat=debug`.
pub const LOG_ENV: &str = "SIDE_CHAT_LOG";

/// Installs the stderr subscriber. Quiet (`warn`) unless `SIDE_CHAT_LOG` says
/// otherwise. A second call leaves the first subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("log subscriber already installed");
    }
}
