//! Scoped session use: close exactly once on every exit path.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::device::Device;
use crate::error::Result;
use crate::provision::{ScExe, ServiceControl};
use crate::session::{MemorySession, OpenOutcome};
use crate::sys::SystemDevice;

/// Open session borrowed for a scope.
///
/// Call [`close`](Self::close) to see whether closing (and removing a
/// driver this session installed) succeeded. If the guard is dropped
/// instead, on early return, `?` or unwinding, it closes the session
/// itself and logs any failure.
pub struct SessionGuard<'a, D: Device = SystemDevice, S: ServiceControl = ScExe> {
	session: &'a mut MemorySession<D, S>,
	outcome: OpenOutcome,
}

impl<'a, D: Device, S: ServiceControl> SessionGuard<'a, D, S> {
	pub(crate) fn new(session: &'a mut MemorySession<D, S>, outcome: OpenOutcome) -> Self {
		Self { session, outcome }
	}

	/// How the guarded session was opened.
	pub fn outcome(&self) -> OpenOutcome {
		self.outcome
	}

	/// Closes the session and reports the result.
	pub fn close(self) -> Result<()> {
		let mut this = ManuallyDrop::new(self);
		this.session.close()
	}
}

impl<D: Device, S: ServiceControl> Deref for SessionGuard<'_, D, S> {
	type Target = MemorySession<D, S>;

	fn deref(&self) -> &Self::Target {
		self.session
	}
}

impl<D: Device, S: ServiceControl> DerefMut for SessionGuard<'_, D, S> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.session
	}
}

impl<D: Device, S: ServiceControl> Drop for SessionGuard<'_, D, S> {
	fn drop(&mut self) {
		if let Err(err) = self.session.close() {
			warn!(target = "slashmem.session", error = %err, "close on scope exit failed");
		}
	}
}
