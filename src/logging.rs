use tracing_subscriber::EnvFilter;

/// Route tracing logs to stderr so stdout carries only the JSON response.
/// `RUST_LOG` overrides the default `recordpatch=info`.
pub fn setup_tracing_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recordpatch=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
