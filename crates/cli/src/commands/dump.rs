use std::io::Write;

use anyhow::Context;
use slashmem::{AccessDirection, CachingMode, Device, MemorySession, ServiceControl};
use tracing::info;

use crate::dump::{read_words, render};
use crate::error::Result;

pub fn execute<D: Device, S: ServiceControl>(
	session: &mut MemorySession<D, S>,
	address: u64,
	bytes: usize,
	caching: CachingMode,
	out: &mut impl Write,
) -> Result<()> {
	info!(target = "slashmem", address = %format_args!("{address:#x}"), bytes, %caching, "dump");

	let mut guard = session.open_scoped()?;
	guard.seek(address, AccessDirection::ReadOnly, caching)?;
	let words = read_words(&*guard, bytes)?;
	guard.close()?;

	out.write_all(render(address, &words).as_bytes()).context("writing memory dump")?;
	Ok(())
}
