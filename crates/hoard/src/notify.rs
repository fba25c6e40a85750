use std::io::{self, Write};

use hoard_ingest::{IngestOutcome, Notifier};

/// Prints the tagged reply on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    type Error = io::Error;

    async fn notify(&self, outcome: &IngestOutcome) -> Result<(), io::Error> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", outcome.reply)?;
        if let Some(asset) = &outcome.asset {
            writeln!(out, "asset: {} ({} bytes)", asset.id, asset.size_bytes)?;
        }
        writeln!(out, "bookmark: {}", outcome.bookmark.id)?;
        out.flush()
    }
}
