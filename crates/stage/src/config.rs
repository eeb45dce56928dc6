//! TOML configuration for the admission stage.
//!
//! ```toml
//! rejection_body = "maintenance in progress"
//!
//! [drain]
//! max_wait_ms = 5000
//! log_diagnostics = true
//! label = "smoke"
//! ```
//!
//! Every key is optional; omitted keys fall back to [`DrainOptions::default`] and
//! [`Rejection::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use quiesce_gate::{DEFAULT_MAX_WAIT, DrainOptions};
use serde::Deserialize;
use thiserror::Error;

use crate::Rejection;

/// Errors that can occur while loading configuration.
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

	/// Error parsing TOML or an unknown key.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Stage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
	/// Body of the fixed rejection; [`Rejection::DEFAULT_BODY`] when unset.
	pub rejection_body: Option<String>,
	/// Drain settings.
	pub drain: DrainSection,
}

/// `[drain]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrainSection {
	/// Upper bound on the drain wait, in milliseconds.
	pub max_wait_ms: u64,
	/// Emit the "waiting on N requests" diagnostic.
	pub log_diagnostics: bool,
	/// Label attached to drain diagnostics.
	pub label: Option<String>,
}

impl Default for DrainSection {
	fn default() -> Self {
		Self {
			max_wait_ms: DEFAULT_MAX_WAIT.as_millis() as u64,
			log_diagnostics: true,
			label: None,
		}
	}
}

impl StageConfig {
	/// Parses configuration from a TOML string.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Reads and parses a TOML configuration file.
	pub fn load(path: &Path) -> Result<Self> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(path = %path.display(), "admission.config.loaded");
		Ok(config)
	}

	/// Returns the configured drain options.
	pub fn drain_options(&self) -> DrainOptions {
		DrainOptions {
			max_wait: Duration::from_millis(self.drain.max_wait_ms),
			label: self.drain.label.clone(),
			log_diagnostics: self.drain.log_diagnostics,
		}
	}

	/// Returns the configured rejection.
	pub fn rejection(&self) -> Rejection {
		match &self.rejection_body {
			Some(body) => Rejection::new(body.as_str()),
			None => Rejection::default(),
		}
	}
}
