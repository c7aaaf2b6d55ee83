use std::io::Write;

use anyhow::Context;
use slashmem::{ServiceControl, ServiceProvisioner};
use tracing::info;

use crate::error::Result;

pub fn install<S: ServiceControl>(provisioner: &ServiceProvisioner<S>, out: &mut impl Write) -> Result<()> {
	provisioner.install_and_start()?;
	info!(target = "slashmem", service = provisioner.service_name(), "driver installed");
	writeln!(out, "{} installed and started", provisioner.service_name()).context("writing status")?;
	Ok(())
}

pub fn uninstall<S: ServiceControl>(provisioner: &ServiceProvisioner<S>, out: &mut impl Write) -> Result<()> {
	provisioner.stop_and_remove()?;
	info!(target = "slashmem", service = provisioner.service_name(), "driver removed");
	writeln!(out, "{} stopped and removed", provisioner.service_name()).context("writing status")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use slashmem::fake::{FakeServiceControl, ServiceCall};
	use slashmem::{ErrorKind, SessionConfig};

	use super::*;
	use crate::error::CliError;

	#[test]
	fn uninstall_requires_elevation_when_checked() {
		let control = FakeServiceControl::new();
		control.set_elevated(false);
		let mut provisioner = ServiceProvisioner::new(control.clone(), &SessionConfig::default());
		provisioner.set_check_elevation_on_remove(true);

		let err = uninstall(&provisioner, &mut Vec::new()).unwrap_err();
		assert!(matches!(err, CliError::Session(ref e) if e.kind() == ErrorKind::PermissionDenied));
		assert!(control.calls().is_empty());
	}

	#[test]
	fn uninstall_stops_and_deletes() {
		let control = FakeServiceControl::new();
		let provisioner = ServiceProvisioner::new(control.clone(), &SessionConfig::default());
		let mut out = Vec::new();
		uninstall(&provisioner, &mut out).unwrap();
		assert_eq!(control.calls(), vec![ServiceCall::Stop, ServiceCall::Delete]);
		assert_eq!(String::from_utf8(out).unwrap(), "SlashMemory stopped and removed\n");
	}
}
