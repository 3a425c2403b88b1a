// SPDX-License-Identifier: MIT
//! Test-case lifecycle: create from a template, duplicate with collision
//! avoidance.

use super::ensure_absent;
use crate::model::{CrudOperation, ServiceManifest, TestCase, TESTS_DIR};
use crate::templates;
use anyhow::{bail, Context as _, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Create a new test seeded with the service's current input schema
/// snapshot. Crud services require an operation; the others reject one.
pub async fn create(
    service_dir: &Path,
    name: &str,
    operation: Option<CrudOperation>,
) -> Result<PathBuf> {
    let manifest = ServiceManifest::load(service_dir).await?;
    match (&manifest, operation) {
        (ServiceManifest::Crud(_), None) => bail!("crud tests need an operation"),
        (ServiceManifest::Crud(_), Some(_)) | (_, None) => {}
        (_, Some(_)) => bail!("only crud tests carry an operation"),
    }

    let input = input_snapshot(service_dir, &manifest).await;
    let tests_dir = service_dir.join(TESTS_DIR);
    tokio::fs::create_dir_all(&tests_dir).await?;

    let path = tests_dir.join(format!("{name}.json"));
    ensure_absent(&path)?;
    templates::test_case(name, input, operation).save(&path).await?;
    info!(name, "test created");
    Ok(path)
}

/// Duplicate a test file with automatic name collision avoidance.
///
/// Candidates are probed in sequence — `name`, `name2`, `name3`, … — and
/// the first absent one wins, so no name is ever reused and no existing
/// file overwritten.
pub async fn duplicate(service_dir: &Path, test_file: &str) -> Result<PathBuf> {
    let tests_dir = service_dir.join(TESTS_DIR);
    let source = tests_dir.join(test_file);
    let mut case = TestCase::load(&source).await?;

    let base = test_file.strip_suffix(".json").unwrap_or(test_file);

    let mut n = 1u32;
    let (candidate_name, candidate_path) = loop {
        let candidate = if n == 1 {
            base.to_string()
        } else {
            format!("{base}{n}")
        };
        let path = tests_dir.join(format!("{candidate}.json"));
        if !path.exists() {
            break (candidate, path);
        }
        n += 1;
    };

    case.name = candidate_name;
    case.save(&candidate_path).await?;
    info!(from = test_file, to = %candidate_path.display(), "test duplicated");
    Ok(candidate_path)
}

/// The input schema the new test's input is seeded from: `input.json` for
/// query/sql services, `read/input.json` for crud. Missing or malformed
/// snapshots seed an empty object.
async fn input_snapshot(service_dir: &Path, manifest: &ServiceManifest) -> Value {
    let rel = match manifest {
        ServiceManifest::Query(m) => m.input.as_str(),
        ServiceManifest::Sql(m) => m.input.as_str(),
        ServiceManifest::Crud(m) => m.read.input.as_str(),
    };
    read_json_or_empty(&service_dir.join(rel)).await
}

async fn read_json_or_empty(path: &Path) -> Value {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|_| Value::Object(Default::default())),
        Err(_) => Value::Object(Default::default()),
    }
}

/// Delete a single test file.
pub async fn delete(service_dir: &Path, test_file: &str) -> Result<()> {
    let path = service_dir.join(TESTS_DIR).join(test_file);
    tokio::fs::remove_file(&path)
        .await
        .with_context(|| format!("cannot remove {}", path.display()))?;
    info!(test_file, "test deleted");
    Ok(())
}
