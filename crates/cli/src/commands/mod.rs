mod dump;
mod service;
mod word;

use crate::cli::Commands;
use crate::context::CommandContext;
use crate::error::Result;

pub fn dispatch(command: Commands, ctx: &CommandContext) -> Result<()> {
	let mut stdout = std::io::stdout().lock();
	match command {
		Commands::Dump { address, bytes, cache } => dump::execute(&mut ctx.session(), address, bytes, cache.into(), &mut stdout),
		Commands::Read { address, offset, cache } => word::read(&mut ctx.session(), address, offset, cache.into(), &mut stdout),
		Commands::Write { address, offset, value, cache } => word::write(&mut ctx.session(), address, offset, value, cache.into(), &mut stdout),
		Commands::Install => service::install(&ctx.provisioner(), &mut stdout),
		Commands::Uninstall { no_elevation_check } => {
			let mut provisioner = ctx.provisioner();
			provisioner.set_check_elevation_on_remove(!no_elevation_check);
			service::uninstall(&provisioner, &mut stdout)
		}
	}
}
