//! brokersite CLI: fetch and inspect the content feed, resolve page
//! metadata, emit sitemap/robots output, and send contact submissions.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
