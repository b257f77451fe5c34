use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dgq")]
#[command(about = "Build and run Dagger engine GraphQL queries")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = ArgAction::Count)]
	pub verbose: u8,

	/// Working directory for a provisioned engine session
	#[arg(long, global = true, value_name = "DIR")]
	pub workdir: Option<PathBuf>,

	/// Project config passed to a provisioned engine session
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Execute a GraphQL document and print the response data
	#[command(alias = "q")]
	Query {
		/// Document text, `@FILE` to read a file, or `-` for stdin
		#[arg(default_value = "-")]
		document: String,

		/// Reduce the response to its single leaf value
		#[arg(long)]
		flatten: bool,
	},

	/// Print the document for a chain of fields without contacting an engine
	Build {
		/// Fields outermost first: `name` or `name:key=value,key=value`
		#[arg(required = true, value_name = "OP")]
		ops: Vec<String>,
	},
}
