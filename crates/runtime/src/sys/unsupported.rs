//! Backend for targets without the SlashMemory driver.
//!
//! Opening always fails with [`io::ErrorKind::Unsupported`], which the
//! session does not treat as a missing device, so nothing is provisioned.

use std::io;

use crate::device::{Device, DeviceHandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDevice;

/// Never constructed on this target.
#[derive(Debug)]
pub enum SystemHandle {}

impl Device for SystemDevice {
	type Handle = SystemHandle;

	fn open(&self, path: &str) -> io::Result<SystemHandle> {
		Err(io::Error::new(io::ErrorKind::Unsupported, format!("{path} is only available on Windows")))
	}
}

impl DeviceHandle for SystemHandle {
	fn device_control(&mut self, _code: u32, _input: &[u8], _output: &mut [u8]) -> io::Result<usize> {
		match *self {}
	}
}

pub fn is_elevated() -> bool {
	false
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn open_reports_unsupported() {
		let err = SystemDevice.open(r"\\.\SlashMemory").unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::Unsupported);
	}
}
