//! Devtime cache — locally persisted snapshots of remote inspection data.
//!
//! Snapshots are disposable: each refresh rebuilds a subtree wholesale from
//! the backend, never merging incrementally. The rebuild writes into a
//! fresh temp directory and swaps it into place with an atomic rename, so
//! readers never observe a transient empty directory.

use crate::client::BuilderClient;
use crate::tree::devtime::{APPLICATIONS_DIR, DATA_SOURCES_DIR};
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct DevtimeCache {
    root: PathBuf,
}

impl DevtimeCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─── Refresh ──────────────────────────────────────────────────────────────

    /// Rebuild the data-source snapshots. Returns the snapshot count.
    pub async fn refresh_data_sources(&self, client: &BuilderClient) -> Result<usize> {
        let sources = client.get_data_sources().await?;
        let files = named_snapshots(sources.iter().map(|ds| (ds.name.clone(), ds)))?;
        let count = files.len();
        self.replace_subtree(DATA_SOURCES_DIR, files).await?;
        info!(count, "refreshed data-source snapshots");
        Ok(count)
    }

    /// Rebuild the application aggregate snapshots. Returns the count.
    pub async fn refresh_applications(&self, client: &BuilderClient) -> Result<usize> {
        let applications = client.get_applications().await?;
        let mut files = Vec::new();
        for app in &applications {
            let aggregate = client.get_application_aggregate(&app.name).await?;
            files.push((
                format!("{}.json", aggregate.name),
                serde_json::to_string_pretty(&aggregate)?,
            ));
        }
        let count = files.len();
        self.replace_subtree(APPLICATIONS_DIR, files).await?;
        info!(count, "refreshed application snapshots");
        Ok(count)
    }

    pub async fn refresh_all(&self, client: &BuilderClient) -> Result<()> {
        self.refresh_data_sources(client).await?;
        self.refresh_applications(client).await?;
        Ok(())
    }

    // ─── Clean ────────────────────────────────────────────────────────────────
    //
    // Remote clean first; the local mirror delete cascades only after the
    // backend accepted the operation.

    pub async fn clean_data_source(&self, client: &BuilderClient, name: &str) -> Result<()> {
        client.clean_data_source(name).await?;
        self.remove_snapshot(DATA_SOURCES_DIR, name).await
    }

    pub async fn clean_application(&self, client: &BuilderClient, app_uri: &str) -> Result<()> {
        client.clean_application(app_uri).await?;
        let name = app_uri.rsplit('/').next().unwrap_or(app_uri);
        self.remove_snapshot(APPLICATIONS_DIR, name).await
    }

    pub async fn clean_workspace(&self, client: &BuilderClient) -> Result<()> {
        client.clean_workspace().await?;
        if self.root.exists() {
            tokio::fs::remove_dir_all(&self.root)
                .await
                .with_context(|| format!("cannot remove cache {}", self.root.display()))?;
        }
        Ok(())
    }

    async fn remove_snapshot(&self, subdir: &str, name: &str) -> Result<()> {
        let path = self.root.join(subdir).join(format!("{name}.json"));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // mirror may never have been refreshed
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
        }
    }

    // ─── Replace-snapshot discipline ──────────────────────────────────────────

    /// Write `files` into a fresh temp directory, then atomically swap it
    /// into place as `{root}/{subdir}`.
    pub async fn replace_subtree(
        &self,
        subdir: &str,
        files: Vec<(String, String)>,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("cannot create cache root {}", self.root.display()))?;

        // Staged on the same filesystem so the final rename is atomic.
        let staging = tempfile::tempdir_in(&self.root).context("cannot create staging dir")?;
        for (name, contents) in &files {
            tokio::fs::write(staging.path().join(name), contents)
                .await
                .with_context(|| format!("cannot stage snapshot {name}"))?;
        }

        let target = self.root.join(subdir);
        let retired = self.root.join(format!(".{subdir}.old"));
        if retired.exists() {
            tokio::fs::remove_dir_all(&retired).await.ok();
        }
        if target.exists() {
            tokio::fs::rename(&target, &retired)
                .await
                .context("cannot retire old snapshot dir")?;
        }
        let staging = staging.keep();
        tokio::fs::rename(&staging, &target)
            .await
            .context("cannot swap snapshot dir into place")?;
        if retired.exists() {
            tokio::fs::remove_dir_all(&retired).await.ok();
        }
        debug!(subdir, "snapshot subtree replaced");
        Ok(())
    }
}

fn named_snapshots<'a, T: Serialize + 'a>(
    items: impl Iterator<Item = (String, &'a T)>,
) -> Result<Vec<(String, String)>> {
    items
        .map(|(name, value)| {
            Ok((
                format!("{name}.json"),
                serde_json::to_string_pretty(value)?,
            ))
        })
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_swaps_without_merging() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DevtimeCache::new(dir.path().join("devtime"));

        cache
            .replace_subtree(
                DATA_SOURCES_DIR,
                vec![
                    ("one.json".into(), "{}".into()),
                    ("two.json".into(), "{}".into()),
                ],
            )
            .await
            .unwrap();
        let target = cache.root().join(DATA_SOURCES_DIR);
        assert!(target.join("one.json").exists());
        assert!(target.join("two.json").exists());

        // A second refresh fully replaces — "one" must be gone.
        cache
            .replace_subtree(DATA_SOURCES_DIR, vec![("three.json".into(), "{}".into())])
            .await
            .unwrap();
        assert!(!target.join("one.json").exists());
        assert!(!target.join("two.json").exists());
        assert!(target.join("three.json").exists());
    }

    #[tokio::test]
    async fn remove_snapshot_tolerates_missing_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DevtimeCache::new(dir.path().join("devtime"));
        cache.remove_snapshot(DATA_SOURCES_DIR, "ghost").await.unwrap();
    }
}
