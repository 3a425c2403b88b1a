//! Module lifecycle: create, rename, delete, deploy, undeploy.

use super::{ensure_absent, write_template_files};
use crate::client::RemoteBuilder;
use crate::model::ModuleManifest;
use crate::snapshot::archive_dir;
use crate::templates;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::info;

fn module_dir(workfolder: &Path, app: &str, module: &str) -> PathBuf {
    workfolder.join(app).join("src").join(module)
}

fn module_uri(workspace: &str, app: &str, module: &str) -> String {
    format!("{workspace}/{app}/src/{module}")
}

/// Scaffold a new module under an application's `src/`.
pub async fn create(workfolder: &Path, app: &str, name: &str) -> Result<PathBuf> {
    let dir = module_dir(workfolder, app, name);
    ensure_absent(&dir)?;
    write_template_files(&dir, &templates::module_files(name)).await?;
    info!(app, name, "module created");
    Ok(dir)
}

/// Rename a module on disk and on the backend.
///
/// Moves the directory, writes the new name into `module.json`, then
/// undeploys the old module URI and deploys the archived new directory —
/// the deploy is never issued before the undeploy completed.
pub async fn rename(
    workfolder: &Path,
    workspace: &str,
    app: &str,
    old_name: &str,
    new_name: &str,
    remote: &dyn RemoteBuilder,
) -> Result<()> {
    let old_dir = module_dir(workfolder, app, old_name);
    let new_dir = module_dir(workfolder, app, new_name);
    ensure_absent(&new_dir)?;

    tokio::fs::rename(&old_dir, &new_dir)
        .await
        .with_context(|| format!("cannot move {}", old_dir.display()))?;

    let mut manifest = ModuleManifest::load(&new_dir).await?;
    manifest.name = new_name.to_string();
    manifest.save(&new_dir).await?;

    remote
        .undeploy_module(&module_uri(workspace, app, old_name))
        .await?;
    let archive = archive_dir(&new_dir).await?;
    remote
        .deploy_module(&module_uri(workspace, app, new_name), archive)
        .await?;

    info!(app, old_name, new_name, "module renamed");
    Ok(())
}

/// Delete a module directory, cascading to its services.
pub async fn delete(workfolder: &Path, app: &str, name: &str) -> Result<()> {
    let dir = module_dir(workfolder, app, name);
    tokio::fs::remove_dir_all(&dir)
        .await
        .with_context(|| format!("cannot remove {}", dir.display()))?;
    info!(app, name, "module deleted");
    Ok(())
}

pub async fn deploy(
    workfolder: &Path,
    workspace: &str,
    app: &str,
    name: &str,
    remote: &dyn RemoteBuilder,
) -> Result<()> {
    let archive = archive_dir(&module_dir(workfolder, app, name)).await?;
    remote
        .deploy_module(&module_uri(workspace, app, name), archive)
        .await
}

pub async fn undeploy(
    workspace: &str,
    app: &str,
    name: &str,
    remote: &dyn RemoteBuilder,
) -> Result<()> {
    remote
        .undeploy_module(&module_uri(workspace, app, name))
        .await
}
