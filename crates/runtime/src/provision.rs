//! Install/start and stop/remove of the driver's kernel service.
//!
//! Every step shells out to the host service-control tool and looks only at
//! its exit code. The one recovery is on create: a stale registration
//! (`ERROR_SERVICE_EXISTS`) is deleted and creation retried once.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use slashmem_protocol::DRIVER_FILE_NAME;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::process::{resolve_sc_exe, run_for_exit_code};

/// `ERROR_SERVICE_EXISTS`, reported by create for a registration that is still present.
pub const ERROR_SERVICE_EXISTS: i32 = 1073;

/// Host service-manager verbs. Each returns the tool's exit code.
pub trait ServiceControl {
	/// Whether the current process runs elevated.
	fn is_elevated(&self) -> bool;
	/// Registers `name` as a kernel service backed by `binary`.
	fn create(&self, name: &str, binary: &Path) -> io::Result<i32>;
	fn start(&self, name: &str) -> io::Result<i32>;
	fn stop(&self, name: &str) -> io::Result<i32>;
	fn delete(&self, name: &str) -> io::Result<i32>;
}

/// [`ServiceControl`] backed by `sc.exe`.
#[derive(Debug, Clone)]
pub struct ScExe {
	program: PathBuf,
}

impl ScExe {
	pub fn new() -> Self {
		Self { program: resolve_sc_exe() }
	}

	pub fn with_program(program: impl Into<PathBuf>) -> Self {
		Self { program: program.into() }
	}
}

impl Default for ScExe {
	fn default() -> Self {
		Self::new()
	}
}

impl ServiceControl for ScExe {
	fn is_elevated(&self) -> bool {
		crate::sys::is_elevated()
	}

	fn create(&self, name: &str, binary: &Path) -> io::Result<i32> {
		run_for_exit_code(
			&self.program,
			[
				OsStr::new("create"),
				OsStr::new(name),
				OsStr::new("type="),
				OsStr::new("kernel"),
				OsStr::new("binPath="),
				binary.as_os_str(),
			],
		)
	}

	fn start(&self, name: &str) -> io::Result<i32> {
		run_for_exit_code(&self.program, ["start", name])
	}

	fn stop(&self, name: &str) -> io::Result<i32> {
		run_for_exit_code(&self.program, ["stop", name])
	}

	fn delete(&self, name: &str) -> io::Result<i32> {
		run_for_exit_code(&self.program, ["delete", name])
	}
}

/// Owns the driver service's install and removal.
#[derive(Debug, Clone)]
pub struct ServiceProvisioner<S: ServiceControl> {
	control: S,
	service_name: String,
	driver_path: Option<PathBuf>,
	check_elevation_on_remove: bool,
}

impl<S: ServiceControl> ServiceProvisioner<S> {
	pub fn new(control: S, config: &SessionConfig) -> Self {
		Self {
			control,
			service_name: config.service_name.clone(),
			driver_path: config.driver_path.clone(),
			check_elevation_on_remove: config.check_elevation_on_remove,
		}
	}

	pub fn control(&self) -> &S {
		&self.control
	}

	pub fn service_name(&self) -> &str {
		&self.service_name
	}

	/// Controls whether [`stop_and_remove`](Self::stop_and_remove) requires elevation up front.
	pub fn set_check_elevation_on_remove(&mut self, check: bool) {
		self.check_elevation_on_remove = check;
	}

	/// Driver binary to register: the configured override, or the packaged
	/// file next to the running executable.
	pub fn driver_path(&self) -> Result<PathBuf> {
		let path = match &self.driver_path {
			Some(path) => path.clone(),
			None => packaged_driver_path()?,
		};
		if !path.is_file() {
			return Err(Error::ProvisionFailed(format!("driver binary not found at {}", path.display())));
		}
		Ok(path)
	}

	/// Registers and starts the driver service.
	pub fn install_and_start(&self) -> Result<()> {
		if !self.control.is_elevated() {
			return Err(Error::PermissionDenied(format!("installing the {} driver requires elevated privileges", self.service_name)));
		}

		let driver = self.driver_path()?;
		let name = self.service_name.as_str();
		info!(target = "slashmem.provision", service = name, driver = %driver.display(), "installing driver service");

		let mut code = self.verb("create", self.control.create(name, &driver), Error::ProvisionFailed)?;
		if code == ERROR_SERVICE_EXISTS {
			warn!(target = "slashmem.provision", service = name, "stale service registration; deleting and retrying");
			let deleted = self.verb("delete", self.control.delete(name), Error::ProvisionFailed)?;
			if deleted != 0 {
				return Err(Error::ProvisionFailed(format!("cannot delete stale {name} registration (exit code {deleted})")));
			}
			code = self.verb("create", self.control.create(name, &driver), Error::ProvisionFailed)?;
		}
		if code != 0 {
			return Err(Error::ProvisionFailed(format!("failed to create {name} service (exit code {code})")));
		}

		let code = self.verb("start", self.control.start(name), Error::ProvisionFailed)?;
		if code != 0 {
			return Err(Error::ProvisionFailed(format!("failed to start {name} service (exit code {code})")));
		}

		info!(target = "slashmem.provision", service = name, "driver service started");
		Ok(())
	}

	/// Stops and deletes the driver service.
	///
	/// A failed stop is only logged: deleting marks the registration for
	/// removal either way. A failed delete is an error.
	pub fn stop_and_remove(&self) -> Result<()> {
		if self.check_elevation_on_remove && !self.control.is_elevated() {
			return Err(Error::PermissionDenied(format!("removing the {} driver requires elevated privileges", self.service_name)));
		}

		let name = self.service_name.as_str();
		info!(target = "slashmem.provision", service = name, "removing driver service");

		match self.control.stop(name) {
			Ok(0) => {}
			Ok(code) => warn!(target = "slashmem.provision", service = name, code, "stop returned non-zero"),
			Err(err) => warn!(target = "slashmem.provision", service = name, error = %err, "stop could not run"),
		}

		let code = self.verb("delete", self.control.delete(name), Error::DeprovisionFailed)?;
		if code != 0 {
			return Err(Error::DeprovisionFailed(format!("cannot delete {name} service (exit code {code})")));
		}
		Ok(())
	}

	fn verb(&self, verb: &str, outcome: io::Result<i32>, wrap: fn(String) -> Error) -> Result<i32> {
		match outcome {
			Ok(code) => {
				debug!(target = "slashmem.provision", verb, code, "service-control verb finished");
				Ok(code)
			}
			Err(err) => Err(wrap(format!("could not run service-control {verb}: {err}"))),
		}
	}
}

fn packaged_driver_path() -> Result<PathBuf> {
	let exe = std::env::current_exe().map_err(|err| Error::ProvisionFailed(format!("cannot locate running executable: {err}")))?;
	let dir = exe
		.parent()
		.ok_or_else(|| Error::ProvisionFailed(format!("executable {} has no parent directory", exe.display())))?;
	Ok(dir.join(DRIVER_FILE_NAME))
}
