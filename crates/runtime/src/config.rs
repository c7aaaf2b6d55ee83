//! Session configuration, optionally loaded from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slashmem_protocol::{DEVICE_PATH, SERVICE_NAME};

use crate::error::{Error, Result};

/// Where to find the device and how to provision its driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
	/// Device path opened by the session.
	pub device_path: String,
	/// Service registration name of the driver.
	pub service_name: String,
	/// Driver binary to install; defaults to the one next to the executable.
	pub driver_path: Option<PathBuf>,
	/// Require elevation before stopping/removing the service.
	pub check_elevation_on_remove: bool,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			device_path: DEVICE_PATH.to_string(),
			service_name: SERVICE_NAME.to_string(),
			driver_path: None,
			check_elevation_on_remove: false,
		}
	}
}

impl SessionConfig {
	/// Reads a config file. Missing keys keep their defaults.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|err| Error::Config {
			path: path.to_path_buf(),
			message: err.to_string(),
		})?;
		let mut config: SessionConfig = serde_json::from_str(&text).map_err(|err| Error::Config {
			path: path.to_path_buf(),
			message: err.to_string(),
		})?;

		if config.device_path.trim().is_empty() || config.service_name.trim().is_empty() {
			return Err(Error::Config {
				path: path.to_path_buf(),
				message: "devicePath and serviceName must not be empty".to_string(),
			});
		}

		// A relative driver path is relative to the config file, not the cwd.
		if let Some(driver) = config.driver_path.take() {
			let resolved = match path.parent() {
				Some(dir) if driver.is_relative() => dir.join(driver),
				_ => driver,
			};
			config.driver_path = Some(resolved);
		}
		Ok(config)
	}

	pub fn with_driver_path(mut self, driver_path: Option<PathBuf>) -> Self {
		if driver_path.is_some() {
			self.driver_path = driver_path;
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn defaults_target_slash_memory() {
		let config = SessionConfig::default();
		assert_eq!(config.device_path, r"\\.\SlashMemory");
		assert_eq!(config.service_name, "SlashMemory");
		assert!(config.driver_path.is_none());
		assert!(!config.check_elevation_on_remove);
	}

	#[test]
	fn partial_file_keeps_defaults() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("slashmem.json");
		std::fs::write(&path, r#"{ "serviceName": "SlashMemoryDev", "driverPath": "drivers/sm.sys" }"#).unwrap();

		let config = SessionConfig::load(&path).unwrap();
		assert_eq!(config.service_name, "SlashMemoryDev");
		assert_eq!(config.device_path, r"\\.\SlashMemory");
		assert_eq!(config.driver_path, Some(dir.path().join("drivers/sm.sys")));
	}

	#[test]
	fn malformed_file_is_config_error() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("slashmem.json");
		std::fs::write(&path, "{ not json").unwrap();
		assert_eq!(SessionConfig::load(&path).unwrap_err().kind(), ErrorKind::Config);
	}

	#[test]
	fn empty_service_name_is_rejected() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("slashmem.json");
		std::fs::write(&path, r#"{ "serviceName": "  " }"#).unwrap();
		assert_eq!(SessionConfig::load(&path).unwrap_err().kind(), ErrorKind::Config);
	}

	#[test]
	fn missing_file_is_config_error() {
		let dir = TempDir::new().unwrap();
		let err = SessionConfig::load(&dir.path().join("absent.json")).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Config);
	}

	#[test]
	fn explicit_driver_overrides_file() {
		let config = SessionConfig::default().with_driver_path(Some(PathBuf::from("C:/drivers/sm.sys")));
		assert_eq!(config.driver_path, Some(PathBuf::from("C:/drivers/sm.sys")));
		let kept = config.clone().with_driver_path(None);
		assert_eq!(kept, config);
	}
}
