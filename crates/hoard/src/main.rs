use anyhow::Context;
use clap::Parser;
use hoard_ingest::Config;

use crate::cli::App;

mod cli;
mod logging;
mod notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();

    let config = Config::load(&app.config)
        .with_context(|| format!("failed to load configuration from {}", app.config.display()))?;
    logging::init(&config.logging)?;

    app.cmd.run(config).await
}
