//! Seams between the session and the privileged device.
//!
//! [`Device`] acquires handles to the device path; [`DeviceHandle`] issues
//! control requests against one open handle. The platform backend in
//! [`crate::sys`] implements both over the Win32 API, and [`crate::fake`]
//! implements them in memory for tests.

use std::io;

/// Opens handles to the privileged device.
pub trait Device {
	type Handle: DeviceHandle;

	/// Opens `path` for read/write with read/write sharing.
	///
	/// A missing device must surface as [`io::ErrorKind::NotFound`]: that is
	/// the one failure the session recovers from by provisioning the driver.
	fn open(&self, path: &str) -> io::Result<Self::Handle>;
}

/// One open handle to the privileged device. Dropping it closes the handle.
pub trait DeviceHandle {
	/// Issues `code` synchronously with buffered I/O.
	///
	/// Returns the number of bytes the driver wrote into `output`.
	fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> io::Result<usize>;
}

/// Whether an open failure means the device object does not exist yet.
pub(crate) fn is_device_absent(err: &io::Error) -> bool {
	err.kind() == io::ErrorKind::NotFound
}
