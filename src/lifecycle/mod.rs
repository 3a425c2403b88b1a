// SPDX-License-Identifier: MIT
//! Resource lifecycle operations.
//!
//! Create, rename, delete, copy, and duplicate operations on local project
//! resources, each paired with the matching remote deploy/undeploy call
//! where the operation requires one. Local files are mutated first; the
//! remote call follows. Failures propagate synchronously to the invoking
//! command handler, which reports and aborts just that command.

pub mod applications;
pub mod clipboard;
pub mod datasources;
pub mod modules;
pub mod services;
pub mod testcases;

use crate::templates::TemplateFile;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Creating a resource whose target path already exists — distinct
    /// from generic I/O failure so callers can show a specific message.
    #[error("name already exists: {0}")]
    NameExists(String),

    /// A copy/paste pairing outside the allowed relation. No mutation
    /// happened.
    #[error("wrong target: cannot paste {src} into {target}")]
    WrongTarget { src: String, target: String },
}

/// Fail with [`LifecycleError::NameExists`] when `path` is already taken.
pub(crate) fn ensure_absent(path: &Path) -> Result<()> {
    if path.exists() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Err(LifecycleError::NameExists(name).into());
    }
    Ok(())
}

/// Write scaffold files under `root`, creating parent directories as needed.
pub(crate) async fn write_template_files(root: &Path, files: &[TemplateFile]) -> Result<()> {
    for file in files {
        let dest = root.join(&file.path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create dir {}", parent.display()))?;
        }
        tokio::fs::write(&dest, &file.content)
            .await
            .with_context(|| format!("cannot write {}", dest.display()))?;
    }
    Ok(())
}

/// Recursively copy all files from `src` into `dst`.
pub(crate) async fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dst)
        .await
        .with_context(|| format!("cannot create dir {}", dst.display()))?;

    let mut entries = tokio::fs::read_dir(src)
        .await
        .with_context(|| format!("cannot read dir {}", src.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let entry_src = entry.path();
        let entry_dst = dst.join(entry.file_name());
        if entry_src.is_dir() {
            copy_dir_recursive_boxed(entry_src, entry_dst).await?;
        } else {
            tokio::fs::copy(&entry_src, &entry_dst)
                .await
                .with_context(|| format!("cannot copy {}", entry_src.display()))?;
        }
    }
    Ok(())
}

/// Boxed indirection so `copy_dir_recursive` can recurse from an async fn.
fn copy_dir_recursive_boxed(
    src: PathBuf,
    dst: PathBuf,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send>> {
    Box::pin(async move { copy_dir_recursive(&src, &dst).await })
}
