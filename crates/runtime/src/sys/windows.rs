//! Win32 backend: `CreateFileW`, `DeviceIoControl`, `CloseHandle`.

use std::ffi::OsStr;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::ptr;

use tracing::debug;
use winapi::shared::minwindef::{DWORD, LPVOID};
use winapi::um::fileapi::{CreateFileW, OPEN_EXISTING};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::ioapiset::DeviceIoControl;
use winapi::um::shlobj::IsUserAnAdmin;
use winapi::um::winnt::{FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, GENERIC_READ, GENERIC_WRITE, HANDLE};

use crate::device::{Device, DeviceHandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDevice;

/// Owned device handle, closed on drop.
#[derive(Debug)]
pub struct SystemHandle(HANDLE);

// A HANDLE is an opaque kernel reference usable from any thread.
unsafe impl Send for SystemHandle {}

impl Device for SystemDevice {
	type Handle = SystemHandle;

	fn open(&self, path: &str) -> io::Result<SystemHandle> {
		let wide: Vec<u16> = OsStr::new(path).encode_wide().chain(Some(0)).collect();
		// SAFETY: `wide` is NUL-terminated and outlives the call.
		let handle = unsafe {
			CreateFileW(
				wide.as_ptr(),
				GENERIC_READ | GENERIC_WRITE,
				FILE_SHARE_READ | FILE_SHARE_WRITE,
				ptr::null_mut(),
				OPEN_EXISTING,
				FILE_ATTRIBUTE_NORMAL,
				ptr::null_mut(),
			)
		};
		if handle == INVALID_HANDLE_VALUE {
			return Err(io::Error::last_os_error());
		}
		Ok(SystemHandle(handle))
	}
}

impl DeviceHandle for SystemHandle {
	fn device_control(&mut self, code: u32, input: &[u8], output: &mut [u8]) -> io::Result<usize> {
		let in_len = DWORD::try_from(input.len()).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
		let out_len = DWORD::try_from(output.len()).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
		let mut returned: DWORD = 0;
		// SAFETY: both buffers are valid for their lengths for the duration of
		// this synchronous call; the driver only reads `input` and writes at
		// most `out_len` bytes into `output`.
		let ok = unsafe {
			DeviceIoControl(
				self.0,
				code,
				input.as_ptr() as LPVOID,
				in_len,
				output.as_mut_ptr() as LPVOID,
				out_len,
				&mut returned,
				ptr::null_mut(),
			)
		};
		if ok == 0 {
			return Err(io::Error::last_os_error());
		}
		Ok(returned as usize)
	}
}

impl Drop for SystemHandle {
	fn drop(&mut self) {
		// SAFETY: the handle came from a successful CreateFileW and is closed once.
		if unsafe { CloseHandle(self.0) } == 0 {
			debug!(target = "slashmem.device", error = %io::Error::last_os_error(), "CloseHandle failed");
		}
	}
}

pub fn is_elevated() -> bool {
	// SAFETY: no arguments, no preconditions.
	unsafe { IsUserAnAdmin() != 0 }
}
