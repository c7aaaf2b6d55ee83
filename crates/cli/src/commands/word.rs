use std::io::Write;

use anyhow::Context;
use slashmem::{AccessDirection, CachingMode, Device, MemorySession, ServiceControl};
use tracing::{info, warn};

use crate::error::Result;

pub fn read<D: Device, S: ServiceControl>(
	session: &mut MemorySession<D, S>,
	address: u64,
	offset: u16,
	caching: CachingMode,
	out: &mut impl Write,
) -> Result<()> {
	let value = session.with_session(|session| {
		session.seek(address, AccessDirection::ReadOnly, caching)?;
		session.read_word(offset)
	})?;

	writeln!(out, "{:#x}+{offset:#05x}: {value:08x}", address).context("writing word")?;
	Ok(())
}

pub fn write<D: Device, S: ServiceControl>(
	session: &mut MemorySession<D, S>,
	address: u64,
	offset: u16,
	value: u32,
	caching: CachingMode,
	out: &mut impl Write,
) -> Result<()> {
	info!(target = "slashmem", address = %format_args!("{address:#x}"), offset, value = %format_args!("{value:#010x}"), "write");

	let read_back = session.with_session(|session| {
		session.seek(address, AccessDirection::ReadWrite, caching)?;
		session.write_word(offset, value)?;
		session.read_word(offset)
	})?;

	if read_back != value {
		// Registers may legitimately read back differently.
		warn!(target = "slashmem", expected = %format_args!("{value:08x}"), actual = %format_args!("{read_back:08x}"), "read-back differs");
	}
	writeln!(out, "{:#x}+{offset:#05x}: wrote {value:08x}, read back {read_back:08x}", address).context("writing word")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use slashmem::fake::{FakeDevice, FakeServiceControl};
	use slashmem::{ErrorKind, SessionConfig};

	use super::*;
	use crate::error::CliError;

	fn session(device: &FakeDevice) -> MemorySession<FakeDevice, FakeServiceControl> {
		MemorySession::with_backend(SessionConfig::default(), device.clone(), FakeServiceControl::new())
	}

	#[test]
	fn read_prints_word() {
		let device = FakeDevice::present();
		device.set_physical_word(0x2000, 0x10, 0xcafe_f00d);
		let mut out = Vec::new();

		read(&mut session(&device), 0x2000, 0x10, CachingMode::Cached, &mut out).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), "0x2000+0x010: cafef00d\n");
	}

	#[test]
	fn write_stores_and_reports_read_back() {
		let device = FakeDevice::present();
		let mut out = Vec::new();

		write(&mut session(&device), 0x3000, 0xffc, 0x1234_5678, CachingMode::NoCache, &mut out).unwrap();
		assert_eq!(device.physical_word(0x3000, 0xffc), 0x1234_5678);
		assert_eq!(String::from_utf8(out).unwrap(), "0x3000+0xffc: wrote 12345678, read back 12345678\n");
	}

	#[test]
	fn misaligned_offset_surfaces_session_error() {
		let device = FakeDevice::present();
		let mut out = Vec::new();

		let err = read(&mut session(&device), 0x3000, 2, CachingMode::NoCache, &mut out).unwrap_err();
		assert!(matches!(err, CliError::Session(ref e) if e.kind() == ErrorKind::InvalidOffset), "{err}");
		assert!(out.is_empty());
		assert_eq!(device.live_handles(), 0);
	}
}
