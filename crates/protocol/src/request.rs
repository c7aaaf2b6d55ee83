//! The seek request sent with [`IOCTL_MEM_SEEK`](crate::IOCTL_MEM_SEEK).

use serde::{Deserialize, Serialize};

/// Cacheability of the mapped window, as the driver's `MEMORY_CACHING_TYPE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum CachingMode {
	/// `MmNonCached`, the right choice for device registers.
	#[default]
	NoCache = 0,
	/// `MmCached`.
	Cached = 1,
	/// `MmWriteCombined`.
	WriteCombine = 2,
}

impl CachingMode {
	/// Code carried on the wire.
	pub const fn code(self) -> u32 {
		self as u32
	}

	pub const fn from_code(code: u32) -> Option<Self> {
		match code {
			0 => Some(CachingMode::NoCache),
			1 => Some(CachingMode::Cached),
			2 => Some(CachingMode::WriteCombine),
			_ => None,
		}
	}
}

impl std::str::FromStr for CachingMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"no-cache" | "nocache" => Ok(CachingMode::NoCache),
			"cached" | "cache" => Ok(CachingMode::Cached),
			"write-combine" | "writecombine" => Ok(CachingMode::WriteCombine),
			_ => Err(format!("unknown caching mode: {s}")),
		}
	}
}

impl std::fmt::Display for CachingMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CachingMode::NoCache => write!(f, "no-cache"),
			CachingMode::Cached => write!(f, "cached"),
			CachingMode::WriteCombine => write!(f, "write-combine"),
		}
	}
}

/// Whether the driver maps the window writable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessDirection {
	#[default]
	ReadOnly,
	ReadWrite,
}

impl AccessDirection {
	/// Flag carried on the wire: 1 for read-write, 0 for read-only.
	pub const fn flag(self) -> u32 {
		match self {
			AccessDirection::ReadOnly => 0,
			AccessDirection::ReadWrite => 1,
		}
	}

	pub const fn is_writable(self) -> bool {
		matches!(self, AccessDirection::ReadWrite)
	}
}

impl std::fmt::Display for AccessDirection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AccessDirection::ReadOnly => write!(f, "read-only"),
			AccessDirection::ReadWrite => write!(f, "read-write"),
		}
	}
}

/// Retargets the window to one page of physical memory.
///
/// Layout matches the driver's `INPUT_MEM_SEEK`:
///
/// | bytes  | field            |
/// |--------|------------------|
/// | 0..8   | physical address |
/// | 8..12  | caching code     |
/// | 12..16 | direction flag   |
///
/// All fields use native byte order; the driver runs on the same machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
	pub physical_address: u64,
	pub caching: CachingMode,
	pub direction: AccessDirection,
}

impl MappingRequest {
	/// Size of the encoded request.
	pub const ENCODED_LEN: usize = 16;

	pub fn new(physical_address: u64, direction: AccessDirection, caching: CachingMode) -> Self {
		Self {
			physical_address,
			caching,
			direction,
		}
	}

	/// Encodes the request into the buffer handed to the driver.
	pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
		let mut buf = [0u8; Self::ENCODED_LEN];
		buf[0..8].copy_from_slice(&self.physical_address.to_ne_bytes());
		buf[8..12].copy_from_slice(&self.caching.code().to_ne_bytes());
		buf[12..16].copy_from_slice(&self.direction.flag().to_ne_bytes());
		buf
	}

	/// Reads a request the way the driver does.
	///
	/// Returns `None` for a short buffer or an unknown caching code. Any
	/// non-zero direction flag means read-write.
	pub fn decode(buf: &[u8]) -> Option<Self> {
		let buf: &[u8; Self::ENCODED_LEN] = buf.get(..Self::ENCODED_LEN)?.try_into().ok()?;
		let physical_address = u64::from_ne_bytes(buf[0..8].try_into().ok()?);
		let caching = CachingMode::from_code(u32::from_ne_bytes(buf[8..12].try_into().ok()?))?;
		let direction = match u32::from_ne_bytes(buf[12..16].try_into().ok()?) {
			0 => AccessDirection::ReadOnly,
			_ => AccessDirection::ReadWrite,
		};
		Some(Self {
			physical_address,
			caching,
			direction,
		})
	}
}
