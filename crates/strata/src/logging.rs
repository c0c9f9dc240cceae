use tracing_subscriber::EnvFilter;

/// Initialise a `tracing_subscriber` writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise `info!` and above are reported, and
/// `debug!` too when `verbose` is set.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
