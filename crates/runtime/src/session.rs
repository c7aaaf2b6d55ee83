//! Device session lifecycle: open, seek, word access, close.

use slashmem_protocol::{AccessDirection, CachingMode, MappingRequest};
use tracing::{debug, info, warn};

use crate::channel::ControlChannel;
use crate::config::SessionConfig;
use crate::device::{Device, is_device_absent};
use crate::error::{Error, Result};
use crate::guard::SessionGuard;
use crate::provision::{ScExe, ServiceControl, ServiceProvisioner};
use crate::sys::SystemDevice;
use crate::window::{PageWindow, check_word_offset};

/// How [`MemorySession::open`] obtained its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
	/// The driver was already running.
	Direct,
	/// The driver was missing and this session installed and started it.
	Provisioned,
}

/// The window produced by the most recent successful seek.
#[derive(Debug)]
pub struct Mapping {
	request: MappingRequest,
	window: PageWindow,
}

impl Mapping {
	pub fn request(&self) -> &MappingRequest {
		&self.request
	}

	pub fn physical_address(&self) -> u64 {
		self.request.physical_address
	}

	pub fn direction(&self) -> AccessDirection {
		self.request.direction
	}

	pub fn caching(&self) -> CachingMode {
		self.request.caching
	}

	/// User-mode address the driver mapped the page at.
	pub fn window_address(&self) -> usize {
		self.window.address()
	}
}

/// A session with the SlashMemory driver, giving word access to one page of
/// physical memory at a time.
///
/// The session owns its device handle and window exclusively. It does not
/// coordinate with other sessions: the driver service is a single
/// system-wide resource, and a session that provisioned it removes it on
/// close even if another session (in this or another process) still uses
/// it. Callers that run sessions concurrently must serialize them
/// externally, e.g. with a named system mutex.
///
/// Dropping an open session closes it; use [`open_scoped`](Self::open_scoped)
/// or [`with_session`](Self::with_session) to observe close errors.
pub struct MemorySession<D: Device = SystemDevice, S: ServiceControl = ScExe> {
	config: SessionConfig,
	device: D,
	provisioner: ServiceProvisioner<S>,
	handle: Option<D::Handle>,
	mapping: Option<Mapping>,
	provisioned_by_us: bool,
}

impl MemorySession {
	/// Session against the real device with default names.
	pub fn new() -> Self {
		Self::with_config(SessionConfig::default())
	}

	pub fn with_config(config: SessionConfig) -> Self {
		Self::with_backend(config, SystemDevice, ScExe::new())
	}
}

impl Default for MemorySession {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: Device, S: ServiceControl> MemorySession<D, S> {
	/// Session over an explicit device backend and service manager.
	pub fn with_backend(config: SessionConfig, device: D, control: S) -> Self {
		let provisioner = ServiceProvisioner::new(control, &config);
		Self {
			config,
			device,
			provisioner,
			handle: None,
			mapping: None,
			provisioned_by_us: false,
		}
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn provisioner(&self) -> &ServiceProvisioner<S> {
		&self.provisioner
	}

	pub fn is_open(&self) -> bool {
		self.handle.is_some()
	}

	/// Whether this session's open installed the driver service.
	pub fn provisioned_by_us(&self) -> bool {
		self.provisioned_by_us
	}

	/// Current window, if a seek has succeeded since open.
	pub fn mapping(&self) -> Option<&Mapping> {
		self.mapping.as_ref()
	}

	/// Opens the device, provisioning the driver if the device does not exist.
	///
	/// Only a missing device triggers provisioning; any other open failure
	/// is returned as [`Error::DeviceUnavailable`] straight away.
	pub fn open(&mut self) -> Result<OpenOutcome> {
		if self.is_open() {
			return Err(Error::AlreadyOpen);
		}
		let path = self.config.device_path.clone();

		match self.device.open(&path) {
			Ok(handle) => {
				self.handle = Some(handle);
				self.provisioned_by_us = false;
				info!(target = "slashmem.session", %path, "device opened");
				return Ok(OpenOutcome::Direct);
			}
			Err(err) if is_device_absent(&err) => {
				info!(target = "slashmem.session", %path, "device absent; provisioning driver");
			}
			Err(source) => return Err(Error::DeviceUnavailable { path, source }),
		}

		self.provisioner.install_and_start()?;

		match self.device.open(&path) {
			Ok(handle) => {
				self.handle = Some(handle);
				self.provisioned_by_us = true;
				info!(target = "slashmem.session", %path, "device opened after provisioning");
				Ok(OpenOutcome::Provisioned)
			}
			Err(source) => {
				warn!(target = "slashmem.session", %path, error = %source, "device still unavailable; removing driver we installed");
				if let Err(err) = self.provisioner.stop_and_remove() {
					warn!(target = "slashmem.session", error = %err, "rollback of driver service failed");
				}
				Err(Error::DeviceUnavailable { path, source })
			}
		}
	}

	/// Retargets the window to the page at `physical_address`.
	///
	/// The previous window is gone once this is called, whether or not the
	/// new mapping succeeds: the driver tears it down before mapping again.
	pub fn seek(&mut self, physical_address: u64, direction: AccessDirection, caching: CachingMode) -> Result<()> {
		let handle = self.handle.as_mut().ok_or(Error::NotOpen)?;
		let request = MappingRequest::new(physical_address, direction, caching);

		self.mapping = None;
		let window = ControlChannel::new(handle).seek(&request).inspect_err(|err| {
			warn!(target = "slashmem.session", error = %err, "seek failed; session has no window");
		})?;

		debug!(
			target = "slashmem.session",
			address = %format_args!("{physical_address:#x}"),
			%direction,
			%caching,
			"window retargeted"
		);
		self.mapping = Some(Mapping { request, window });
		Ok(())
	}

	/// Reads the 32-bit word at byte `offset` of the window.
	pub fn read_word(&self, offset: u16) -> Result<u32> {
		self.live_mapping()?.window.read_word(offset)
	}

	/// Writes the 32-bit word at byte `offset` of the window.
	///
	/// Fails with [`Error::ReadOnlyWindow`] when the window was mapped
	/// read-only: the driver maps such pages without write access, so the
	/// store would fault the process.
	pub fn write_word(&mut self, offset: u16, value: u32) -> Result<()> {
		if !self.is_open() {
			return Err(Error::NotOpen);
		}
		let mapping = self.mapping.as_mut().ok_or(Error::NotMapped)?;
		check_word_offset(offset)?;
		if !mapping.direction().is_writable() {
			return Err(Error::ReadOnlyWindow {
				address: mapping.physical_address(),
			});
		}
		mapping.window.write_word(offset, value)
	}

	/// Closes the handle and, if this session installed the driver, removes it.
	///
	/// The session always ends up closed; a failed removal is still returned.
	/// Closing a closed session does nothing.
	pub fn close(&mut self) -> Result<()> {
		let Some(handle) = self.handle.take() else {
			debug!(target = "slashmem.session", "close on closed session");
			return Ok(());
		};

		// The window dies with the handle; drop it first.
		self.mapping = None;
		drop(handle);
		let provisioned = std::mem::take(&mut self.provisioned_by_us);
		info!(target = "slashmem.session", provisioned, "device closed");

		if provisioned {
			self.provisioner.stop_and_remove()?;
		}
		Ok(())
	}

	/// Opens the session and returns a guard that closes it exactly once.
	pub fn open_scoped(&mut self) -> Result<SessionGuard<'_, D, S>> {
		let outcome = self.open()?;
		Ok(SessionGuard::new(self, outcome))
	}

	/// Opens, runs `f`, and closes, even when `f` fails.
	///
	/// An error from `f` takes precedence over a close error, which is then
	/// only logged.
	pub fn with_session<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
		let mut guard = self.open_scoped()?;
		let result = f(&mut guard);
		let closed = guard.close();

		match (result, closed) {
			(Ok(value), Ok(())) => Ok(value),
			(Ok(_), Err(err)) => Err(err),
			(Err(err), Ok(())) => Err(err),
			(Err(err), Err(close_err)) => {
				warn!(target = "slashmem.session", error = %close_err, "close failed after earlier error");
				Err(err)
			}
		}
	}

	fn live_mapping(&self) -> Result<&Mapping> {
		if !self.is_open() {
			return Err(Error::NotOpen);
		}
		self.mapping.as_ref().ok_or(Error::NotMapped)
	}
}

impl<D: Device, S: ServiceControl> Drop for MemorySession<D, S> {
	fn drop(&mut self) {
		if let Err(err) = self.close() {
			warn!(target = "slashmem.session", error = %err, "close on drop failed");
		}
	}
}

#[cfg(test)]
mod tests {
	use std::io;

	use super::*;
	use crate::error::ErrorKind;
	use crate::fake::{FakeDevice, FakeServiceControl, ServiceCall};

	fn session(device: &FakeDevice, control: &FakeServiceControl) -> MemorySession<FakeDevice, FakeServiceControl> {
		MemorySession::with_backend(SessionConfig::default(), device.clone(), control.clone())
	}

	#[test]
	fn starts_closed_and_unprovisioned() {
		let session = session(&FakeDevice::present(), &FakeServiceControl::new());
		assert!(!session.is_open());
		assert!(!session.provisioned_by_us());
		assert!(session.mapping().is_none());
	}

	#[test]
	fn reopen_is_rejected() {
		let device = FakeDevice::present();
		let mut session = session(&device, &FakeServiceControl::new());
		session.open().unwrap();

		assert_eq!(session.open().unwrap_err().kind(), ErrorKind::AlreadyOpen);
		assert_eq!(device.opens(), 1);
	}

	#[test]
	fn other_open_failures_do_not_provision() {
		let device = FakeDevice::absent();
		device.fail_next_open(io::ErrorKind::PermissionDenied);
		let control = FakeServiceControl::new();
		let mut session = session(&device, &control);

		assert_eq!(session.open().unwrap_err().kind(), ErrorKind::DeviceUnavailable);
		assert!(control.calls().is_empty());
		assert!(!session.is_open());
	}

	#[test]
	fn provisioning_errors_propagate() {
		let device = FakeDevice::absent();
		let control = FakeServiceControl::new();
		control.set_elevated(false);
		let mut session = session(&device, &control);

		assert_eq!(session.open().unwrap_err().kind(), ErrorKind::PermissionDenied);
		assert!(!session.is_open());
		assert!(!session.provisioned_by_us());
	}

	#[test]
	fn write_to_read_only_window_is_refused() {
		let device = FakeDevice::present();
		device.set_physical_word(0x1000, 0, 0x1234);
		let mut session = session(&device, &FakeServiceControl::new());
		session.open().unwrap();
		session.seek(0x1000, AccessDirection::ReadOnly, CachingMode::NoCache).unwrap();

		assert_eq!(session.write_word(0, 1).unwrap_err().kind(), ErrorKind::ReadOnlyWindow);
		assert_eq!(device.physical_word(0x1000, 0), 0x1234);
	}

	#[test]
	fn drop_closes_and_deprovisions() {
		let device = FakeDevice::absent();
		let control = FakeServiceControl::new();
		control.link_device(&device);
		{
			let mut session = session(&device, &control);
			assert_eq!(session.open().unwrap(), OpenOutcome::Provisioned);
			control.clear_calls();
		}
		assert_eq!(device.live_handles(), 0);
		assert_eq!(control.calls(), vec![ServiceCall::Stop, ServiceCall::Delete]);
	}
}
