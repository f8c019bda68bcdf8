use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` picks the filter; without it
/// only warnings and errors are shown so stdout status lines stay readable.
pub fn init() {
  let filter: EnvFilter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}
