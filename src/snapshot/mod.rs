// SPDX-License-Identifier: MIT
//! Directory snapshots for deploy payloads.
//!
//! A deploy call carries a gzipped tar of the resource directory. The
//! transport and client layers only ever see the opaque bytes plus the
//! timeout budget appropriate to the granularity — archive transfer and
//! server-side processing are slower than plain JSON calls.

use anyhow::{Context as _, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Whole-application deploy budget.
pub const APPLICATION_DEPLOY_TIMEOUT: Duration = Duration::from_secs(60);
/// Module deploy budget.
pub const MODULE_DEPLOY_TIMEOUT: Duration = Duration::from_secs(30);
/// Single-service deploy budget.
pub const SERVICE_DEPLOY_TIMEOUT: Duration = Duration::from_secs(10);

/// Archive a directory tree into gzipped tar bytes.
///
/// Entries are added in sorted order so the same tree always produces the
/// same entry sequence. Paths inside the archive are relative to `dir`.
pub async fn archive_dir(dir: &Path) -> Result<Vec<u8>> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || archive_dir_sync(&dir))
        .await
        .context("archive task panicked")?
}

fn archive_dir_sync(dir: &Path) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for path in walk_sorted(dir)? {
        let rel = path
            .strip_prefix(dir)
            .expect("walk yields paths under the root");
        if path.is_dir() {
            builder
                .append_dir(rel, &path)
                .with_context(|| format!("cannot archive dir {}", path.display()))?;
        } else {
            builder
                .append_path_with_name(&path, rel)
                .with_context(|| format!("cannot archive file {}", path.display()))?;
        }
    }

    let encoder = builder.into_inner().context("tar finalize failed")?;
    encoder.finish().context("gzip finalize failed")
}

/// Depth-first walk with siblings in name order.
fn walk_sorted(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)
            .with_context(|| format!("cannot read dir {}", dir.display()))?
            .map(|e| e.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();
        // push in reverse so the stack pops in name order
        for entry in entries.iter().rev() {
            if entry.is_dir() {
                stack.push(entry.clone());
            }
        }
        out.extend(entries);
    }
    Ok(out)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                e.unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .trim_end_matches('/')
                    .to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn archives_relative_paths_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("src/a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("README.md"), "readme").unwrap();

        let bytes = archive_dir(dir.path()).await.unwrap();
        let names = entry_names(&bytes);
        assert_eq!(names, vec!["README.md", "src", "src/a.json", "src/b.json"]);
    }

    #[tokio::test]
    async fn same_tree_same_entry_sequence() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.json", "a.json", "m.json"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let first = entry_names(&archive_dir(dir.path()).await.unwrap());
        let second = entry_names(&archive_dir(dir.path()).await.unwrap());
        assert_eq!(first, second);
    }
}
