use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "FORELINE_LOG";

/// Diagnostics go to stderr so they never interleave with tagged output.
pub fn init() {
	let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();
}
