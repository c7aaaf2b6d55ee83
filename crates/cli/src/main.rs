use clap::Parser;
use slashmem_cli::{cli::Cli, commands, context::CommandContext, logging};
use tracing::error;

fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let result = CommandContext::new(cli.config.as_deref(), cli.driver.clone()).and_then(|ctx| commands::dispatch(cli.command, &ctx));

	if let Err(err) = result {
		error!(target = "slashmem", error = %err, "command failed");
		std::process::exit(1);
	}
}
