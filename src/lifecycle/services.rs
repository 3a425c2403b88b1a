//! Service lifecycle: create, rename, delete, deploy, undeploy, regenerate.

use super::{ensure_absent, write_template_files};
use crate::client::{BuilderClient, RemoteBuilder};
use crate::model::{ServiceManifest, TESTS_DIR};
use crate::snapshot::archive_dir;
use crate::templates::{self, ServiceVariant};
use anyhow::{Context as _, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

fn service_dir(workfolder: &Path, app: &str, module: &str, service: &str) -> PathBuf {
    workfolder.join(app).join("src").join(module).join(service)
}

fn service_uri(workspace: &str, app: &str, module: &str, service: &str) -> String {
    format!("{workspace}/{app}/src/{module}/{service}")
}

/// Scaffold a new service of the given variant, including its `tests/`
/// directory.
pub async fn create(
    workfolder: &Path,
    app: &str,
    module: &str,
    name: &str,
    variant: ServiceVariant,
) -> Result<PathBuf> {
    let dir = service_dir(workfolder, app, module, name);
    ensure_absent(&dir)?;
    write_template_files(&dir, &templates::service_files(name, variant)).await?;
    tokio::fs::create_dir_all(dir.join(TESTS_DIR))
        .await
        .context("cannot create tests dir")?;
    info!(app, module, name, variant = variant.as_str(), "service created");
    Ok(dir)
}

/// Rename a service on disk and on the backend: move, write the name
/// through the manifest, undeploy old, deploy new — in that order.
pub async fn rename(
    workfolder: &Path,
    workspace: &str,
    app: &str,
    module: &str,
    old_name: &str,
    new_name: &str,
    remote: &dyn RemoteBuilder,
) -> Result<()> {
    let old_dir = service_dir(workfolder, app, module, old_name);
    let new_dir = service_dir(workfolder, app, module, new_name);
    ensure_absent(&new_dir)?;

    tokio::fs::rename(&old_dir, &new_dir)
        .await
        .with_context(|| format!("cannot move {}", old_dir.display()))?;

    let mut manifest = ServiceManifest::load(&new_dir).await?;
    manifest.set_name(new_name);
    manifest.save(&new_dir).await?;

    remote
        .undeploy_service(&service_uri(workspace, app, module, old_name))
        .await?;
    let archive = archive_dir(&new_dir).await?;
    remote
        .deploy_service(&service_uri(workspace, app, module, new_name), archive)
        .await?;

    info!(app, module, old_name, new_name, "service renamed");
    Ok(())
}

pub async fn delete(workfolder: &Path, app: &str, module: &str, name: &str) -> Result<()> {
    let dir = service_dir(workfolder, app, module, name);
    tokio::fs::remove_dir_all(&dir)
        .await
        .with_context(|| format!("cannot remove {}", dir.display()))?;
    info!(app, module, name, "service deleted");
    Ok(())
}

pub async fn deploy(
    workfolder: &Path,
    workspace: &str,
    app: &str,
    module: &str,
    name: &str,
    remote: &dyn RemoteBuilder,
) -> Result<()> {
    let archive = archive_dir(&service_dir(workfolder, app, module, name)).await?;
    remote
        .deploy_service(&service_uri(workspace, app, module, name), archive)
        .await
}

pub async fn undeploy(
    workspace: &str,
    app: &str,
    module: &str,
    name: &str,
    remote: &dyn RemoteBuilder,
) -> Result<()> {
    remote
        .undeploy_service(&service_uri(workspace, app, module, name))
        .await
}

// ─── Regeneration ─────────────────────────────────────────────────────────────

/// Re-run the backend generation calls for a service and rewrite its
/// generated component files from the response.
///
/// The statement text is sent as-is; the backend infers schemas and
/// bindings from it. Response fields map onto the component paths declared
/// in the service manifest.
pub async fn regenerate(
    workfolder: &Path,
    app: &str,
    module: &str,
    name: &str,
    client: &BuilderClient,
) -> Result<()> {
    let dir = service_dir(workfolder, app, module, name);
    let manifest = ServiceManifest::load(&dir).await?;

    match &manifest {
        ServiceManifest::Query(m) => {
            let statement = read_text(&dir.join(&m.query)).await?;
            let generated = client
                .gen_query_input_output(&json!({ "query": statement }))
                .await?;
            write_component(&dir, &m.input, generated.get("input")).await?;
            write_component(&dir, &m.output, generated.get("output")).await?;

            let bound = client.bind_query(&json!({ "query": statement })).await?;
            write_component(&dir, &m.input_bindings, bound.get("inputBindings")).await?;
            write_component(&dir, &m.output_bindings, bound.get("outputBindings")).await?;
        }
        ServiceManifest::Sql(m) => {
            let statement = read_text(&dir.join(&m.sqls)).await?;
            let generated = client
                .gen_sql_input_output(&json!({ "sqls": statement }))
                .await?;
            write_component(&dir, &m.input, generated.get("input")).await?;
            write_component(&dir, &m.output, generated.get("output")).await?;

            let bound = client.bind_sql(&json!({ "sqls": statement })).await?;
            write_component(&dir, &m.input_bindings, bound.get("inputBindings")).await?;
            write_component(&dir, &m.output_bindings, bound.get("outputBindings")).await?;
        }
        ServiceManifest::Crud(m) => {
            let statement = read_text(&dir.join(&m.read.query)).await?;
            let generated = client
                .gen_crud_object(&json!({ "query": statement }))
                .await?;
            write_component(&dir, &m.object, generated.get("object")).await?;
            write_component(&dir, &m.read.input, generated.get("input")).await?;

            let bound = client
                .bind_crud_query(&json!({ "query": statement }))
                .await?;
            write_component(&dir, &m.read.input_bindings, bound.get("inputBindings")).await?;
            write_component(&dir, &m.read.output_bindings, bound.get("outputBindings")).await?;
        }
    }

    info!(app, module, name, "service regenerated");
    Ok(())
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

/// Write one generated component, skipping fields the backend omitted.
async fn write_component(dir: &Path, rel: &str, value: Option<&Value>) -> Result<()> {
    let Some(value) = value else { return Ok(()) };
    let dest = dir.join(rel);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&dest, serde_json::to_string_pretty(value)?)
        .await
        .with_context(|| format!("cannot write {}", dest.display()))
}
