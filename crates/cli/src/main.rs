use clap::Parser;
use dagger_cli::{cli::Cli, commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		let message = format!("{err:#}");
		error!(target = "dgq", error = %message, "command failed");
		std::process::exit(1);
	}
}
