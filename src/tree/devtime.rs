//! Devtime tree — the deployed-state view.
//!
//! Mirrors the same conceptual hierarchy as the source tree (data sources,
//! applications → modules → services → tests) but sources its data from the
//! locally cached JSON snapshots of the remote inspection API rather than
//! the live project files. Services additionally carry a validity state
//! with an invalidated reason retrievable on demand.

use crate::model::{RemoteApplication, RemoteDataSource, RemoteModule, RemoteService, RemoteTest};
use anyhow::{Context as _, Result};
use std::path::Path;

/// Cache subdirectory holding data-source snapshots.
pub const DATA_SOURCES_DIR: &str = "dataSources";
/// Cache subdirectory holding application aggregate snapshots.
pub const APPLICATIONS_DIR: &str = "applications";

#[derive(Debug, Clone)]
pub enum DevtimeNode {
    Root,
    DataSources,
    DataSource(RemoteDataSource),
    Applications,
    Application(RemoteApplication),
    Module {
        application: String,
        module: RemoteModule,
    },
    Service {
        application: String,
        module: String,
        service: RemoteService,
    },
    Test {
        application: String,
        module: String,
        service: String,
        test: RemoteTest,
    },
}

/// Validity of a deployed service, surfaced on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceValidity {
    pub valid: bool,
    pub reason: Option<String>,
}

pub fn service_validity(service: &RemoteService) -> ServiceValidity {
    ServiceValidity {
        valid: service.valid,
        reason: service.invalid_message.clone(),
    }
}

/// Enumerate the children of a devtime node from the cache at `cache_dir`.
pub async fn children(cache_dir: &Path, node: &DevtimeNode) -> Result<Vec<DevtimeNode>> {
    Ok(match node {
        DevtimeNode::Root => vec![DevtimeNode::DataSources, DevtimeNode::Applications],
        DevtimeNode::DataSources => {
            read_snapshots::<RemoteDataSource>(&cache_dir.join(DATA_SOURCES_DIR))
                .await?
                .into_iter()
                .map(DevtimeNode::DataSource)
                .collect()
        }
        DevtimeNode::Applications => {
            read_snapshots::<RemoteApplication>(&cache_dir.join(APPLICATIONS_DIR))
                .await?
                .into_iter()
                .map(DevtimeNode::Application)
                .collect()
        }
        DevtimeNode::Application(app) => app
            .modules
            .iter()
            .map(|m| DevtimeNode::Module {
                application: app.name.clone(),
                module: m.clone(),
            })
            .collect(),
        DevtimeNode::Module {
            application,
            module,
        } => module
            .services
            .iter()
            .map(|s| DevtimeNode::Service {
                application: application.clone(),
                module: module.name.clone(),
                service: s.clone(),
            })
            .collect(),
        DevtimeNode::Service {
            application,
            module,
            service,
        } => service
            .tests
            .iter()
            .map(|t| DevtimeNode::Test {
                application: application.clone(),
                module: module.clone(),
                service: service.name.clone(),
                test: t.clone(),
            })
            .collect(),
        DevtimeNode::DataSource(_) | DevtimeNode::Test { .. } => Vec::new(),
    })
}

/// Read every `*.json` snapshot in a cache directory. A missing directory
/// is an empty view, not an error — the cache may simply never have been
/// refreshed.
async fn read_snapshots<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut out = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e).with_context(|| format!("cannot read cache {}", dir.display())),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read snapshot {}", path.display()))?;
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("malformed snapshot {}", path.display()))?;
        out.push(value);
    }
    Ok(out)
}
