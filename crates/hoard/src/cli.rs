use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hoard_fetch::{Processor, ReqwestClient};
use hoard_ingest::{Config, IngestOptions, IngestRequest, Ingestor};
use tokio_util::sync::CancellationToken;

use crate::notify::StdoutNotifier;

#[derive(Debug, Parser)]
#[command(name = "hoard", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file.
    #[arg(short, long, env = "HOARD_CONFIG", default_value = "hoard.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "i", name = "ingest", about = "Bookmark a message, optionally with an image")]
    Ingest(IngestArg),
    #[command(name = "check", about = "Validate the configuration and print it")]
    Check,
}

#[derive(Debug, clap::Args)]
pub struct IngestArg {
    /// Link or note to bookmark. With `--image` it is the image caption.
    pub message: String,

    /// Image to attach as the bookmark banner.
    #[arg(long)]
    pub image: Option<String>,
}

impl Commands {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        match self {
            Commands::Ingest(arg) => arg.run(config).await,
            Commands::Check => {
                println!("{config:#?}");
                Ok(())
            }
        }
    }
}

impl IngestArg {
    async fn run(self, config: Config) -> anyhow::Result<()> {
        let request = IngestRequest::from_message(&self.message, self.image.as_deref())
            .context("nothing to bookmark: the message is blank")?;

        let processor = Processor::new(
            ReqwestClient::default(),
            config.fileprocessor.processor_options(),
        )
        .context("failed to prepare the temporary directory")?;
        let api = config
            .karakeep
            .api_client()
            .context("failed to build the API client")?;
        let options = IngestOptions {
            validator: config.fileprocessor.allow_list(),
            poll: config.karakeep.poll_options(),
        };
        let ingestor = Ingestor::new(processor, api, StdoutNotifier, options);

        let cancel = CancellationToken::new();
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupted, cancelling");
                    cancel.cancel();
                }
            }
        });

        match ingestor.ingest_cancellable(&request, &cancel).await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(stage = ?e.kind(), error = %e, "ingestion failed");
                Err(e).context("ingestion failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ingest_with_image() {
        let app = App::try_parse_from([
            "hoard",
            "--config",
            "/etc/hoard.toml",
            "ingest",
            "a caption",
            "--image",
            "https://cdn.example.com/x.png",
        ])
        .unwrap();

        assert_eq!(app.config, PathBuf::from("/etc/hoard.toml"));
        match app.cmd {
            Commands::Ingest(arg) => {
                assert_eq!(arg.message, "a caption");
                assert_eq!(arg.image.as_deref(), Some("https://cdn.example.com/x.png"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ingest_alias() {
        let app = App::try_parse_from(["hoard", "i", "https://example.com"]).unwrap();
        assert!(matches!(app.cmd, Commands::Ingest(ref arg) if arg.image.is_none()));
    }

    #[test]
    fn message_is_required() {
        assert!(App::try_parse_from(["hoard", "ingest"]).is_err());
    }
}
