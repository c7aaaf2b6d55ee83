//! Seek control requests over an open device handle.

use slashmem_protocol::{IOCTL_MEM_SEEK, MappingRequest};
use tracing::{debug, trace};

use crate::device::DeviceHandle;
use crate::error::{Error, Result};
use crate::window::PageWindow;

/// Encodes seek requests and turns the driver's reply into a [`PageWindow`].
pub struct ControlChannel<'a, H: DeviceHandle> {
	handle: &'a mut H,
}

impl<'a, H: DeviceHandle> ControlChannel<'a, H> {
	pub fn new(handle: &'a mut H) -> Self {
		Self { handle }
	}

	/// Asks the driver to remap its window onto `request.physical_address`.
	///
	/// The driver replies with the user-mode address of the page, written
	/// back through the buffered output.
	pub fn seek(&mut self, request: &MappingRequest) -> Result<PageWindow> {
		let address = request.physical_address;
		let input = request.encode();
		let mut output = [0u8; size_of::<usize>()];

		trace!(
			target = "slashmem.channel",
			code = %format_args!("{IOCTL_MEM_SEEK:#010x}"),
			address = %format_args!("{address:#x}"),
			caching = %request.caching,
			direction = %request.direction,
			"issuing seek"
		);

		let written = self
			.handle
			.device_control(IOCTL_MEM_SEEK, &input, &mut output)
			.map_err(|err| Error::MappingFailed {
				address,
				reason: err.to_string(),
			})?;

		if written < output.len() {
			return Err(Error::MappingFailed {
				address,
				reason: format!("driver returned {written} bytes, expected {}", output.len()),
			});
		}

		let user_address = usize::from_ne_bytes(output);
		// SAFETY: the driver keeps the page mapped into this process until the
		// next seek or until the handle closes; the session drops the window
		// before either happens.
		let window = unsafe { PageWindow::from_raw(user_address) }.ok_or_else(|| Error::MappingFailed {
			address,
			reason: format!("driver returned unusable window address {user_address:#x}"),
		})?;

		debug!(
			target = "slashmem.channel",
			address = %format_args!("{address:#x}"),
			window = %format_args!("{user_address:#x}"),
			"window mapped"
		);
		Ok(window)
	}
}

#[cfg(test)]
mod tests {
	use std::io;

	use slashmem_protocol::{AccessDirection, CachingMode};

	use super::*;
	use crate::error::ErrorKind;

	struct ScriptedHandle {
		reply: io::Result<Vec<u8>>,
		seen: Vec<(u32, Vec<u8>)>,
	}

	impl DeviceHandle for ScriptedHandle {
		fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> io::Result<usize> {
			self.seen.push((code, input.to_vec()));
			match &self.reply {
				Ok(bytes) => {
					let n = bytes.len().min(output.len());
					output[..n].copy_from_slice(&bytes[..n]);
					Ok(n)
				}
				Err(err) => Err(io::Error::new(err.kind(), err.to_string())),
			}
		}
	}

	fn request() -> MappingRequest {
		MappingRequest::new(0xF800_0000, AccessDirection::ReadOnly, CachingMode::NoCache)
	}

	#[test]
	fn sends_encoded_request_with_seek_code() {
		let mut page = Box::new([0u32; 1024]);
		let mut handle = ScriptedHandle {
			reply: Ok((page.as_mut_ptr() as usize).to_ne_bytes().to_vec()),
			seen: Vec::new(),
		};

		let window = ControlChannel::new(&mut handle).seek(&request()).unwrap();

		assert_eq!(window.address(), page.as_ptr() as usize);
		assert_eq!(handle.seen, vec![(IOCTL_MEM_SEEK, request().encode().to_vec())]);
	}

	#[test]
	fn io_failure_is_mapping_failed() {
		let mut handle = ScriptedHandle {
			reply: Err(io::Error::from(io::ErrorKind::InvalidInput)),
			seen: Vec::new(),
		};
		let err = ControlChannel::new(&mut handle).seek(&request()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::MappingFailed);
	}

	#[test]
	fn short_reply_is_mapping_failed() {
		let mut handle = ScriptedHandle {
			reply: Ok(vec![0x10, 0x00]),
			seen: Vec::new(),
		};
		let err = ControlChannel::new(&mut handle).seek(&request()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::MappingFailed);
	}

	#[test]
	fn null_window_is_mapping_failed() {
		let mut handle = ScriptedHandle {
			reply: Ok(0usize.to_ne_bytes().to_vec()),
			seen: Vec::new(),
		};
		let err = ControlChannel::new(&mut handle).seek(&request()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::MappingFailed);
	}
}
