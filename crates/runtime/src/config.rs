//! Runtime configuration, read from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cardstack_dispatch::DispatchConfig;
use serde::Deserialize;
use thiserror::Error;

/// Errors loading a [`RuntimeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Malformed TOML or an unknown key.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value outside its allowed range.
	#[error("invalid value for {key}: {reason}")]
	Invalid {
		/// Dotted key of the offending option.
		key: &'static str,
		reason: String,
	},
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
	pub dispatch: DispatchSection,
	pub event_loop: EventLoopConfig,
	pub logging: LoggingConfig,
}

/// `[dispatch]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSection {
	pub max_script_depth: u32,
	/// Handler nesting across all objects.
	pub max_dispatch_depth: u32,
	pub no_ui: bool,
	pub program_name: String,
}

impl Default for DispatchSection {
	fn default() -> Self {
		let defaults = DispatchConfig::default();
		Self {
			max_script_depth: defaults.max_script_depth,
			max_dispatch_depth: defaults.max_dispatch_depth,
			no_ui: defaults.no_ui,
			program_name: defaults.program_name,
		}
	}
}

/// `[event_loop]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventLoopConfig {
	/// Upper bound on one sleep inside [`Runtime::wait`](crate::Runtime::wait).
	pub max_sleep_ms: u64,
	/// Ask the platform waker for a high-priority wake.
	pub high_priority_ping: bool,
}

impl EventLoopConfig {
	pub fn max_sleep(&self) -> Duration {
		Duration::from_millis(self.max_sleep_ms)
	}
}

impl Default for EventLoopConfig {
	fn default() -> Self {
		Self {
			max_sleep_ms: 250,
			high_priority_ping: false,
		}
	}
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
	/// `tracing` filter directive used when `CARDSTACK_LOG` is unset.
	pub filter: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			filter: String::from("info"),
		}
	}
}

impl RuntimeConfig {
	pub fn from_toml_str(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}

	fn validate(&self) -> Result<()> {
		if self.dispatch.max_script_depth == 0 {
			return Err(ConfigError::Invalid {
				key: "dispatch.max_script_depth",
				reason: String::from("must be at least 1"),
			});
		}
		if self.dispatch.max_dispatch_depth == 0 {
			return Err(ConfigError::Invalid {
				key: "dispatch.max_dispatch_depth",
				reason: String::from("must be at least 1"),
			});
		}
		if self.event_loop.max_sleep_ms == 0 {
			return Err(ConfigError::Invalid {
				key: "event_loop.max_sleep_ms",
				reason: String::from("must be at least 1"),
			});
		}
		Ok(())
	}

	pub fn dispatch_config(&self) -> DispatchConfig {
		DispatchConfig {
			max_script_depth: self.dispatch.max_script_depth,
			max_dispatch_depth: self.dispatch.max_dispatch_depth,
			no_ui: self.dispatch.no_ui,
			program_name: self.dispatch.program_name.clone(),
		}
	}
}

#[cfg(test)]
mod tests;
