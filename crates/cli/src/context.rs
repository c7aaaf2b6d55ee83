//! Per-invocation settings resolved from global flags.

use std::path::{Path, PathBuf};

use slashmem::{MemorySession, ScExe, ServiceProvisioner, SessionConfig};
use tracing::debug;

use crate::error::Result;

/// Session configuration shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
	config: SessionConfig,
}

impl CommandContext {
	/// Loads `--config` if given and applies `--driver` on top.
	pub fn new(config_path: Option<&Path>, driver: Option<PathBuf>) -> Result<Self> {
		let config = match config_path {
			Some(path) => {
				debug!(target = "slashmem", path = %path.display(), "loading config");
				SessionConfig::load(path)?
			}
			None => SessionConfig::default(),
		};
		Ok(Self::from_config(config.with_driver_path(driver)))
	}

	pub fn from_config(config: SessionConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Session against the real device.
	pub fn session(&self) -> MemorySession {
		MemorySession::with_config(self.config.clone())
	}

	/// Provisioner for install/uninstall outside a session.
	pub fn provisioner(&self) -> ServiceProvisioner<ScExe> {
		ServiceProvisioner::new(ScExe::new(), &self.config)
	}
}
