pub mod build;
pub mod query;

use anyhow::Result;
use dagger::ConnectOpts;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Query { document, flatten } => {
			let mut opts = ConnectOpts::new();
			if let Some(workdir) = cli.workdir {
				opts = opts.workdir(workdir);
			}
			if let Some(config) = cli.config {
				opts = opts.config_path(config);
			}
			query::run(&document, flatten, opts).await
		}
		Commands::Build { ops } => {
			println!("{}", build::build_document(&ops)?);
			Ok(())
		}
	}
}
