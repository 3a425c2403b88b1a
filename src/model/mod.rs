//! On-disk manifest types and remote mirror payloads.
//!
//! Every local entity is a JSON file in the fixed project layout:
//! `{workfolder}/{app}/src/application.json`, `.../src/{module}/module.json`,
//! `.../src/{module}/{service}/service.json`, and test files under a
//! service's `tests/` directory. Field names on disk are camelCase.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ─── Manifest file names ──────────────────────────────────────────────────────

pub const APPLICATION_MANIFEST: &str = "application.json";
pub const DATASOURCE_FILE: &str = "datasource.json";
pub const MODULE_MANIFEST: &str = "module.json";
pub const SERVICE_MANIFEST: &str = "service.json";
pub const VERSIONS_FILE: &str = ".versions.json";
pub const TESTS_DIR: &str = "tests";

// ─── Application ──────────────────────────────────────────────────────────────

/// `src/application.json` — the root manifest of an application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationManifest {
    pub name: String,
    pub description: String,
    pub db_type: String,
    pub data_source: String,
    pub schema: String,
}

impl ApplicationManifest {
    /// Load from an application directory (reads `src/application.json`).
    pub async fn load(app_dir: &Path) -> Result<Self> {
        let path = app_dir.join("src").join(APPLICATION_MANIFEST);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("malformed {}", path.display()))
    }

    pub async fn save(&self, app_dir: &Path) -> Result<()> {
        let path = app_dir.join("src").join(APPLICATION_MANIFEST);
        write_json(&path, self).await
    }
}

// ─── Module ───────────────────────────────────────────────────────────────────

/// `module.json` — manifest of a module directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    pub name: String,
    pub description: String,
}

impl ModuleManifest {
    pub async fn load(module_dir: &Path) -> Result<Self> {
        let path = module_dir.join(MODULE_MANIFEST);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("malformed {}", path.display()))
    }

    pub async fn save(&self, module_dir: &Path) -> Result<()> {
        write_json(&module_dir.join(MODULE_MANIFEST), self).await
    }
}

// ─── Service ──────────────────────────────────────────────────────────────────

/// `service.json` — one of three variants, each declaring the component
/// file paths specific to that variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServiceManifest {
    Query(QueryServiceManifest),
    Sql(SqlServiceManifest),
    Crud(CrudServiceManifest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryServiceManifest {
    pub name: String,
    pub input: String,
    pub output: String,
    pub query: String,
    pub input_bindings: String,
    pub output_bindings: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SqlServiceManifest {
    pub name: String,
    pub input: String,
    pub output: String,
    pub sqls: String,
    pub input_bindings: String,
    pub output_bindings: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrudServiceManifest {
    pub name: String,
    pub object: String,
    pub read: CrudReadPaths,
    pub write: CrudWritePaths,
}

/// Component paths of a crud service's nested read sub-resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrudReadPaths {
    pub input: String,
    pub query: String,
    pub input_bindings: String,
    pub output_bindings: String,
}

/// Component paths of a crud service's nested write sub-resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrudWritePaths {
    pub tables: String,
}

impl ServiceManifest {
    pub async fn load(service_dir: &Path) -> Result<Self> {
        let path = service_dir.join(SERVICE_MANIFEST);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("malformed {}", path.display()))
    }

    pub async fn save(&self, service_dir: &Path) -> Result<()> {
        write_json(&service_dir.join(SERVICE_MANIFEST), self).await
    }

    pub fn name(&self) -> &str {
        match self {
            ServiceManifest::Query(m) => &m.name,
            ServiceManifest::Sql(m) => &m.name,
            ServiceManifest::Crud(m) => &m.name,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        match self {
            ServiceManifest::Query(m) => m.name = name.to_string(),
            ServiceManifest::Sql(m) => m.name = name.to_string(),
            ServiceManifest::Crud(m) => m.name = name.to_string(),
        }
    }

    /// The `type` tag as it appears on disk.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ServiceManifest::Query(_) => "query",
            ServiceManifest::Sql(_) => "sql",
            ServiceManifest::Crud(_) => "crud",
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

/// Crud test operation. Absent for query/sql services.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CrudOperation {
    Read,
    Create,
    Update,
    Delete,
    Save,
}

/// A JSON file under a service's `tests/` directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub name: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<CrudOperation>,
    pub comments: String,
}

impl TestCase {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("malformed {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self).await
    }
}

// ─── Data sources ─────────────────────────────────────────────────────────────

/// A local `*.datasource.json` definition file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceDef {
    pub name: String,
    pub db_type: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub schema: String,
}

impl DataSourceDef {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("malformed {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self).await
    }
}

/// Structured success/failure payload from `test_data_source` — a failing
/// test is a normal result, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub succeed: bool,
    #[serde(default)]
    pub message: String,
}

// ─── Versions ─────────────────────────────────────────────────────────────────

/// Opaque version descriptor fetched from `get_versions` and persisted as
/// `src/.versions.json` when an application is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct VersionDescriptor(pub serde_json::Map<String, Value>);

// ─── Remote mirror payloads ───────────────────────────────────────────────────
//
// Read-only projections of the inspect API, cached under the devtime
// directory and fully replaced on each refresh.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDataSource {
    pub name: String,
    #[serde(default)]
    pub db_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteApplication {
    pub name: String,
    #[serde(default)]
    pub data_source: String,
    #[serde(default)]
    pub modules: Vec<RemoteModule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteModule {
    pub name: String,
    #[serde(default)]
    pub services: Vec<RemoteService>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteService {
    pub name: String,
    #[serde(rename = "type", default)]
    pub service_type: String,
    /// Validity state assigned by the backend.
    #[serde(default = "default_valid")]
    pub valid: bool,
    /// Reason the service was invalidated; surfaced on demand.
    #[serde(default)]
    pub invalid_message: Option<String>,
    #[serde(default)]
    pub tests: Vec<RemoteTest>,
}

fn default_valid() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTest {
    pub name: String,
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("cannot write {}", path.display()))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
