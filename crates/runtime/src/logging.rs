//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::LoggingConfig;

/// Filter directives, overriding the configured filter when set.
pub const LOG_ENV: &str = "CARDSTACK_LOG";
/// Directory to write `cardstack.<pid>.log` into instead of stderr.
pub const LOG_DIR_ENV: &str = "CARDSTACK_LOG_DIR";

/// Installs the global subscriber. Does nothing if one is already set.
pub fn init(config: &LoggingConfig) {
	let filter = || {
		EnvFilter::try_from_env(LOG_ENV)
			.or_else(|_| EnvFilter::try_new(&config.filter))
			.unwrap_or_else(|_| EnvFilter::new("info"))
	};

	if let Some(log_dir) = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from) {
		if std::fs::create_dir_all(&log_dir).is_ok() {
			let log_path = log_dir.join(format!("cardstack.{}.log", std::process::id()));
			if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
				let file_layer = tracing_subscriber::fmt::layer()
					.with_writer(std::sync::Mutex::new(file))
					.with_ansi(false)
					.with_thread_names(true)
					.with_target(true);
				if tracing_subscriber::registry().with(filter()).with(file_layer).try_init().is_ok() {
					tracing::info!(path = ?log_path, "logging.initialized");
				}
				return;
			}
		}
	}

	// Fallback to stderr
	let _ = tracing_subscriber::registry()
		.with(filter())
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.try_init();
}
