use std::io::Read;

use anyhow::{Context, Result};
use dagger::{ConnectOpts, Transport, query_flatten};
use serde_json::Value;
use tracing::info;

pub async fn run(document: &str, flatten: bool, opts: ConnectOpts) -> Result<()> {
	let document = read_document(document)?;
	let data = dagger::connect_with_opts(opts, |client| async move {
		info!(target = "dgq", "executing document");
		client.selection().transport().execute(&document).await
	})
	.await?;

	println!("{}", render(data, flatten)?);
	Ok(())
}

/// Resolves the `DOCUMENT` argument: `-` reads stdin, `@path` reads a file, anything else is the document.
pub fn read_document(arg: &str) -> Result<String> {
	let text = if arg == "-" {
		let mut buf = String::new();
		std::io::stdin().read_to_string(&mut buf).context("reading document from stdin")?;
		buf
	} else if let Some(path) = arg.strip_prefix('@') {
		std::fs::read_to_string(path).with_context(|| format!("reading document from {path}"))?
	} else {
		arg.to_string()
	};

	let text = text.trim().to_string();
	anyhow::ensure!(!text.is_empty(), "empty GraphQL document");
	Ok(text)
}

/// Formats response data for stdout. A flattened string leaf is printed without quotes.
pub fn render(data: Value, flatten: bool) -> Result<String> {
	if !flatten {
		return Ok(serde_json::to_string_pretty(&data)?);
	}
	match query_flatten(data)? {
		Value::String(s) => Ok(s),
		leaf => Ok(serde_json::to_string_pretty(&leaf)?),
	}
}
