#![forbid(unsafe_code)]

//! The local archive: which recordings are already on disk, and the pass
//! that fetches the ones that aren't.
//!
//! Front and rear recordings are mirrored into fixed subdirectories of the
//! archive root. A sync pass fetches the two categories concurrently; within
//! a category, recordings are fetched one at a time in listing order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::client::DashcamClient;
use crate::listing::{Listing, Recording};

pub const FRONT_SUBDIR: &str = "front";
pub const REAR_SUBDIR: &str = "rear";

/// Convenience wrapper around every directory a pass touches.
#[derive(Clone, Debug)]
pub struct ArchivePaths {
    pub root: PathBuf,
    pub front: PathBuf,
    pub rear: PathBuf,
}

impl ArchivePaths {
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            front: root.join(FRONT_SUBDIR),
            rear: root.join(REAR_SUBDIR),
        }
    }

    /// Creates both category directories so the fetch tasks can assume they
    /// exist. Failure here is a setup error that aborts the whole pass.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.front)
            .with_context(|| format!("creating {}", self.front.display()))?;
        fs::create_dir_all(&self.rear)
            .with_context(|| format!("creating {}", self.rear.display()))?;
        Ok(())
    }
}

/// An archived recording is one whose media file exists under `dir`.
///
/// Only the media file is inspected, and only for existence: a missing
/// thumbnail, or a zero-length file left by an interrupted transfer, still
/// counts as archived and is never re-fetched.
pub fn is_archived(dir: &Path, recording: &Recording) -> bool {
    dir.join(recording.media_name()).exists()
}

/// Filters `recordings` down to the ones not yet archived under `dir`,
/// preserving listing order.
pub fn missing_recordings(dir: &Path, recordings: &[Recording]) -> Vec<Recording> {
    recordings
        .iter()
        .filter(|recording| !is_archived(dir, recording))
        .cloned()
        .collect()
}

/// Per-category remote totals vs. locally missing counts, plus the listing
/// entries that matched neither orientation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub front_total: usize,
    pub front_missing: usize,
    pub rear_total: usize,
    pub rear_missing: usize,
    pub unknown_total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown: Vec<String>,
}

/// Compares a listing against the archive without touching the network.
pub fn summarize(listing: &Listing, paths: &ArchivePaths) -> Summary {
    Summary {
        front_total: listing.front.len(),
        front_missing: missing_recordings(&paths.front, &listing.front).len(),
        rear_total: listing.rear.len(),
        rear_missing: missing_recordings(&paths.rear, &listing.rear).len(),
        unknown_total: listing.unknown.len(),
        unknown: listing
            .unknown
            .iter()
            .map(|recording| recording.as_str().to_owned())
            .collect(),
    }
}

/// Lists the device and reports what the archive is missing. Works against
/// an archive whose directories don't exist yet; everything counts as
/// missing then.
pub async fn status(client: DashcamClient, paths: ArchivePaths) -> Result<Summary> {
    let listing = list_inventory(client).await?;
    Ok(summarize(&listing, &paths))
}

/// Runs one full sync pass: list the device, then fetch every missing
/// recording, front and rear concurrently.
///
/// Setup failures (directories, inventory request) abort the pass. A
/// recording that fails to fetch is logged and skipped; the pass completes
/// once every missing recording has been attempted, regardless of how many
/// attempts succeeded.
pub async fn sync(client: DashcamClient, paths: ArchivePaths) -> Result<()> {
    paths.prepare()?;
    let listing = list_inventory(client.clone()).await?;

    if !listing.unknown.is_empty() {
        println!(
            "Ignoring {} listing entries with no orientation tag",
            listing.unknown.len()
        );
    }

    let front = spawn_category_pass(
        FRONT_SUBDIR,
        client.clone(),
        paths.front.clone(),
        listing.front,
    );
    let rear = spawn_category_pass(REAR_SUBDIR, client, paths.rear, listing.rear);

    // Both tasks run to completion; neither is cancelled if the other fails.
    let (front, rear) = tokio::join!(front, rear);
    front.context("front sync task failed")?;
    rear.context("rear sync task failed")?;
    Ok(())
}

async fn list_inventory(client: DashcamClient) -> Result<Listing> {
    tokio::task::spawn_blocking(move || client.list())
        .await
        .context("inventory task failed")?
}

fn spawn_category_pass(
    label: &'static str,
    client: DashcamClient,
    dir: PathBuf,
    recordings: Vec<Recording>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || fetch_missing(label, &client, &dir, &recordings))
}

/// Fetches every missing recording into `dir`, in listing order. Both
/// artifacts are attempted for each recording even when the first one
/// fails; failures are logged with their cause and never retried.
fn fetch_missing(label: &str, client: &DashcamClient, dir: &Path, recordings: &[Recording]) {
    let missing = missing_recordings(dir, recordings);
    if missing.is_empty() {
        println!(
            "{label}: nothing to fetch, {} of {} archived",
            recordings.len(),
            recordings.len()
        );
        return;
    }

    println!(
        "{label}: fetching {} of {} recordings",
        missing.len(),
        recordings.len()
    );
    let total = missing.len();
    for (index, recording) in missing.iter().enumerate() {
        println!("[{}/{}] {label}: fetching {recording}", index + 1, total);
        for artifact in recording.artifact_names() {
            if let Err(err) = client.download(dir, &artifact) {
                eprintln!("  Warning: failed to fetch {artifact}: {err:#}");
            }
        }
    }
}
