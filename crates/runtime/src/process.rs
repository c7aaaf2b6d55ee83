//! Helpers for running the host service-control tool.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::trace;

/// Service-control tool shipped with Windows.
pub const SC_EXE: &str = "sc.exe";

/// Exit code a tool reports when it was terminated without one.
pub const NO_EXIT_CODE: i32 = -1;

/// Resolves the service-control tool on `PATH`, falling back to the bare name.
pub fn resolve_sc_exe() -> PathBuf {
	which::which(SC_EXE).unwrap_or_else(|_| PathBuf::from(SC_EXE))
}

/// Runs `program` with output discarded and returns its exit code.
///
/// The exit code is the only signal the service-control tool gives, so
/// stdout and stderr are not captured.
pub fn run_for_exit_code<I, S>(program: &Path, args: I) -> io::Result<i32>
where
	I: IntoIterator<Item = S>,
	S: AsRef<OsStr>,
{
	let mut command = Command::new(program);
	command.args(args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
	trace!(target = "slashmem.process", command = ?command, "spawning");

	let status = command.status()?;
	Ok(status.code().unwrap_or(NO_EXIT_CODE))
}
