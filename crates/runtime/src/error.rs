//! Error types for session, window, and provisioning operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`MemorySession`](crate::MemorySession) and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
	/// The device could not be opened, even after provisioning when that was attempted.
	#[error("device {path} unavailable: {source}")]
	DeviceUnavailable {
		path: String,
		#[source]
		source: io::Error,
	},

	#[error("session is already open")]
	AlreadyOpen,

	#[error("session is not open")]
	NotOpen,

	#[error("no window mapped; seek first")]
	NotMapped,

	/// Offset is misaligned or the word would cross the end of the page.
	#[error("invalid window offset {0:#x}: must be a multiple of 4 and at most {max:#x}", max = slashmem_protocol::MAX_WORD_OFFSET)]
	InvalidOffset(u16),

	#[error("window at {address:#x} is mapped read-only")]
	ReadOnlyWindow { address: u64 },

	#[error("mapping physical address {address:#x} failed: {reason}")]
	MappingFailed { address: u64, reason: String },

	#[error("permission denied: {0}")]
	PermissionDenied(String),

	#[error("driver provisioning failed: {0}")]
	ProvisionFailed(String),

	#[error("driver deprovisioning failed: {0}")]
	DeprovisionFailed(String),

	#[error("invalid configuration {}: {message}", .path.display())]
	Config { path: PathBuf, message: String },
}

/// Fieldless discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	DeviceUnavailable,
	AlreadyOpen,
	NotOpen,
	NotMapped,
	InvalidOffset,
	ReadOnlyWindow,
	MappingFailed,
	PermissionDenied,
	ProvisionFailed,
	DeprovisionFailed,
	Config,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::DeviceUnavailable { .. } => ErrorKind::DeviceUnavailable,
			Error::AlreadyOpen => ErrorKind::AlreadyOpen,
			Error::NotOpen => ErrorKind::NotOpen,
			Error::NotMapped => ErrorKind::NotMapped,
			Error::InvalidOffset(_) => ErrorKind::InvalidOffset,
			Error::ReadOnlyWindow { .. } => ErrorKind::ReadOnlyWindow,
			Error::MappingFailed { .. } => ErrorKind::MappingFailed,
			Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
			Error::ProvisionFailed(_) => ErrorKind::ProvisionFailed,
			Error::DeprovisionFailed(_) => ErrorKind::DeprovisionFailed,
			Error::Config { .. } => ErrorKind::Config,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_offset_message_names_bound() {
		let message = Error::InvalidOffset(0xffd).to_string();
		assert!(message.contains("0xffd"), "{message}");
		assert!(message.contains("0xffc"), "{message}");
	}

	#[test]
	fn device_unavailable_keeps_io_source() {
		let err = Error::DeviceUnavailable {
			path: r"\\.\SlashMemory".to_string(),
			source: io::Error::from(io::ErrorKind::NotFound),
		};
		assert_eq!(err.kind(), ErrorKind::DeviceUnavailable);
		assert!(std::error::Error::source(&err).is_some());
	}
}
