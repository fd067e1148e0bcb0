//! Subcommand handlers.
//!
//! Handlers write their report to the given writer and log per-document
//! failures, so one bad id does not stop a batch.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use docstash_client::{CommitOutcome, DocContext, Transport};

pub const DEFAULT_MIME_TYPE: &str = "text/html";

/// Arguments for the preload subcommand.
#[derive(Args, Debug)]
pub struct PreloadArgs {
    /// File ids to bring into the store.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Export format to cache.
    #[arg(long, default_value = DEFAULT_MIME_TYPE)]
    pub mime_type: String,
}

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File ids to compare against the store.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Export format whose cached copy is checked.
    #[arg(long, default_value = DEFAULT_MIME_TYPE)]
    pub mime_type: String,
}

/// Arguments for the export subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// File id to export.
    pub id: String,

    /// Export format.
    #[arg(long, default_value = DEFAULT_MIME_TYPE)]
    pub mime_type: String,

    /// Read from the store only, without any network call.
    #[arg(long)]
    pub offline: bool,

    /// Write the content here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Eagerly refresh each document; report `fresh` or `updated` per id.
pub fn preload<T: Transport>(ctx: &DocContext<T>, args: &PreloadArgs, out: &mut impl Write) -> Result<()> {
    let mut failed = 0;
    for id in &args.ids {
        let mut entity = ctx.entity(id.as_str(), args.mime_type.as_str());
        match entity.preload_sync() {
            Ok(()) => {
                let status = if entity.is_up_to_date() { "fresh" } else { "updated" };
                let title = entity.metadata().map(|m| m.title.as_str()).unwrap_or_default();
                writeln!(out, "{id}\t{status}\t{title}")?;
            }
            Err(e) => {
                tracing::error!(file_id = %id, error = %e, "preload failed");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} document(s) failed to preload", args.ids.len());
    }
    Ok(())
}

/// Compare fingerprints without downloading content or writing the store.
pub fn check<T: Transport>(ctx: &DocContext<T>, args: &CheckArgs, out: &mut impl Write) -> Result<()> {
    let mut failed = 0;
    for id in &args.ids {
        let mut entity = ctx.entity(id.as_str(), args.mime_type.as_str());
        match entity.preload_deferred() {
            Ok(()) => {
                let status = if entity.is_up_to_date() { "up-to-date" } else { "stale" };
                writeln!(out, "{id}\t{status}\t{}", entity.fingerprint().unwrap_or_default())?;
            }
            Err(e) => {
                tracing::error!(file_id = %id, error = %e, "check failed");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} document(s) could not be checked", args.ids.len());
    }
    Ok(())
}

/// Write one document's content, refreshing the store unless offline.
pub fn export<T: Transport>(ctx: &DocContext<T>, args: &ExportArgs, out: &mut impl Write) -> Result<()> {
    let mut entity = ctx.entity(args.id.as_str(), args.mime_type.as_str());
    let loaded = if args.offline { entity.preload_from_cache() } else { entity.preload_deferred() };
    loaded.with_context(|| format!("failed to load {}", args.id))?;

    let content = entity.get_content().with_context(|| format!("failed to read {}", args.id))?;

    if entity.commit() == CommitOutcome::Failed {
        tracing::warn!(file_id = %args.id, "content not cached");
    }

    match &args.output {
        Some(path) => std::fs::write(path, &content).with_context(|| format!("failed to write {}", path.display()))?,
        None => out.write_all(&content)?,
    }
    Ok(())
}
