// SPDX-License-Identifier: MIT
//! Application lifecycle: create, rename, delete, deploy, undeploy.

use super::{ensure_absent, write_template_files};
use crate::client::RemoteBuilder;
use crate::model::{ApplicationManifest, VersionDescriptor, VERSIONS_FILE};
use crate::session::SessionState;
use crate::snapshot::archive_dir;
use crate::templates;
use crate::uri::ResourceUri;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Scaffold a new application under the workfolder.
///
/// Writes the application manifest, data-source skeleton, and README, plus
/// `src/.versions.json` populated from the last fetched version descriptor.
pub async fn create(
    workfolder: &Path,
    name: &str,
    db_type: &str,
    versions: &VersionDescriptor,
) -> Result<PathBuf> {
    let app_dir = workfolder.join(name);
    ensure_absent(&app_dir)?;

    write_template_files(&app_dir, &templates::application_files(name, db_type)).await?;
    let raw = serde_json::to_string_pretty(versions)?;
    tokio::fs::write(app_dir.join("src").join(VERSIONS_FILE), raw)
        .await
        .context("cannot write version descriptor")?;

    info!(name, db_type, "application created");
    Ok(app_dir)
}

/// Rename an application on disk and on the backend.
///
/// Moves the directory, writes the new name through to the manifest, then
/// undeploys the old URI and deploys the renamed archive — strictly in
/// that order. Any stored data-source credential is re-keyed under the new
/// URI.
pub async fn rename(
    workfolder: &Path,
    workspace: &str,
    old_name: &str,
    new_name: &str,
    remote: &dyn RemoteBuilder,
    session: &SessionState,
) -> Result<()> {
    let old_dir = workfolder.join(old_name);
    let new_dir = workfolder.join(new_name);
    ensure_absent(&new_dir)?;

    tokio::fs::rename(&old_dir, &new_dir)
        .await
        .with_context(|| format!("cannot move {}", old_dir.display()))?;

    let mut manifest = ApplicationManifest::load(&new_dir).await?;
    manifest.name = new_name.to_string();
    manifest.save(&new_dir).await?;

    let old_uri = format!("{workspace}/{old_name}");
    let new_uri = format!("{workspace}/{new_name}");
    remote.undeploy_application(&old_uri).await?;
    let archive = archive_dir(&new_dir).await?;
    remote.deploy_application(&new_uri, archive).await?;

    let old_ds = ResourceUri::parse(&old_uri)?.data_source_uri();
    let new_ds = ResourceUri::parse(&new_uri)?.data_source_uri();
    session.rename_ds_password(&old_ds, &new_ds)?;

    info!(old_name, new_name, "application renamed");
    Ok(())
}

/// Delete an application directory, cascading to all descendants.
pub async fn delete(workfolder: &Path, name: &str) -> Result<()> {
    let app_dir = workfolder.join(name);
    tokio::fs::remove_dir_all(&app_dir)
        .await
        .with_context(|| format!("cannot remove {}", app_dir.display()))?;
    info!(name, "application deleted");
    Ok(())
}

/// Deploy the whole application as an archived snapshot.
pub async fn deploy(
    workfolder: &Path,
    workspace: &str,
    name: &str,
    remote: &dyn RemoteBuilder,
) -> Result<()> {
    let archive = archive_dir(&workfolder.join(name)).await?;
    remote
        .deploy_application(&format!("{workspace}/{name}"), archive)
        .await
}

pub async fn undeploy(workspace: &str, name: &str, remote: &dyn RemoteBuilder) -> Result<()> {
    remote
        .undeploy_application(&format!("{workspace}/{name}"))
        .await
}
