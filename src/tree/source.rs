// SPDX-License-Identifier: MIT
//! Source tree — the live project files.
//!
//! Given a parent node, synchronously enumerate its on-disk children and
//! classify each into the closed node-type enumeration, in a stable display
//! order. Every expansion re-reads the directory from disk.

use super::{
    classify_crud_child, classify_query_sql_child, classify_read_child, classify_write_child,
    sort_siblings, Node, NodeType, UNCLASSIFIED_ORDER,
};
use crate::model::{APPLICATION_MANIFEST, DATASOURCE_FILE, MODULE_MANIFEST, SERVICE_MANIFEST};
use crate::templates::ServiceVariant;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// The root node for a workfolder path.
pub fn workfolder(path: &Path) -> Node {
    Node::new(path.to_path_buf(), NodeType::Workfolder, 0)
}

/// Enumerate and classify the children of `node`.
pub async fn children(node: &Node) -> Result<Vec<Node>> {
    let mut nodes = match node.node_type {
        NodeType::Workfolder => workfolder_children(&node.path).await?,
        NodeType::Application => application_children(&node.path).await?,
        NodeType::Module => module_children(&node.path).await?,
        NodeType::QueryService | NodeType::SqlService => {
            service_children(node, classify_query_sql_child).await?
        }
        NodeType::CrudService => service_children(node, classify_crud_child).await?,
        NodeType::Read => service_children(node, classify_read_child).await?,
        NodeType::Write => write_children(node).await?,
        NodeType::Tests => tests_children(&node.path).await?,
        // leaves
        _ => Vec::new(),
    };
    sort_siblings(&mut nodes);
    Ok(nodes)
}

// ─── Listing ──────────────────────────────────────────────────────────────────

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Directory entries in original filesystem listing order.
async fn list(dir: &Path) -> Result<Vec<Entry>> {
    let mut out = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot read dir {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        out.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: path.is_dir(),
            path,
        });
    }
    Ok(out)
}

// ─── Walkers ──────────────────────────────────────────────────────────────────

/// Workfolder → Application: directories containing `src/application.json`.
async fn workfolder_children(dir: &Path) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for (i, entry) in list(dir).await?.into_iter().enumerate() {
        if entry.is_dir && entry.path.join("src").join(APPLICATION_MANIFEST).is_file() {
            nodes.push(Node::new(entry.path, NodeType::Application, i as u32));
        }
    }
    Ok(nodes)
}

/// Application → {ApplicationFile, Module}: recurse into `src/`; also
/// surface `README.md` directly under the application.
async fn application_children(app_dir: &Path) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let src = app_dir.join("src");
    let mut module_order = 2u32;
    for entry in list(&src).await? {
        if entry.is_dir {
            nodes.push(Node::new(entry.path, NodeType::Module, module_order));
            module_order += 1;
        } else {
            let node = match entry.name.as_str() {
                APPLICATION_MANIFEST => Node::new(entry.path, NodeType::ApplicationFile, 0),
                DATASOURCE_FILE => Node::new(entry.path, NodeType::ApplicationFile, 1),
                _ => Node::new(entry.path, NodeType::Other, UNCLASSIFIED_ORDER),
            };
            nodes.push(node);
        }
    }

    let readme = app_dir.join("README.md");
    if readme.is_file() {
        nodes.push(Node::new(readme, NodeType::ApplicationFile, UNCLASSIFIED_ORDER));
    }
    Ok(nodes)
}

/// Module → services: subdirectories classified by their manifest's `type`
/// field, ordered by listing sequence starting at 1.
async fn module_children(module_dir: &Path) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut service_order = 1u32;
    for entry in list(module_dir).await? {
        if entry.is_dir {
            let node_type = match service_type_of(&entry.path).await {
                Some(ServiceVariant::Query) => NodeType::QueryService,
                Some(ServiceVariant::Sql) => NodeType::SqlService,
                Some(ServiceVariant::Crud) => NodeType::CrudService,
                None => NodeType::Other,
            };
            let mut node = Node::new(entry.path, node_type, service_order);
            if let Some(variant) = match node_type {
                NodeType::QueryService => Some(ServiceVariant::Query),
                NodeType::SqlService => Some(ServiceVariant::Sql),
                NodeType::CrudService => Some(ServiceVariant::Crud),
                _ => None,
            } {
                node = node.with_service(variant);
            }
            nodes.push(node);
            service_order += 1;
        } else if entry.name == MODULE_MANIFEST {
            nodes.push(Node::new(entry.path, NodeType::ModuleFile, 0));
        } else {
            nodes.push(Node::new(entry.path, NodeType::Other, UNCLASSIFIED_ORDER));
        }
    }
    Ok(nodes)
}

/// Peek at `service.json` for its `type` tag. A missing or malformed
/// manifest classifies the directory as Other.
async fn service_type_of(service_dir: &Path) -> Option<ServiceVariant> {
    let raw = tokio::fs::read_to_string(service_dir.join(SERVICE_MANIFEST))
        .await
        .ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    value
        .get("type")
        .and_then(|t| t.as_str())
        .and_then(ServiceVariant::parse)
}

/// Children of a service (or read sub-resource) classified by a fixed table.
async fn service_children(
    node: &Node,
    classify: fn(&str) -> (NodeType, Option<super::ComponentKind>, u32),
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for entry in list(&node.path).await? {
        let (node_type, component, order) = classify(&entry.name);
        let mut child = Node::new(entry.path, node_type, order);
        if let Some(component) = component {
            child = child.with_component(component);
        }
        if let Some(service) = node.service {
            child = child.with_service(service);
        }
        nodes.push(child);
    }
    Ok(nodes)
}

/// Write sub-resource: `...columns` files take incrementing orders in
/// listing sequence; every child surfaces as Bindings.
async fn write_children(node: &Node) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut columns_seen = 0u32;
    for entry in list(&node.path).await? {
        let (node_type, component, order) = classify_write_child(&entry.name, columns_seen);
        if component == Some(super::ComponentKind::Columns) {
            columns_seen += 1;
        }
        let mut child = Node::new(entry.path, node_type, order);
        if let Some(component) = component {
            child = child.with_component(component);
        }
        if let Some(service) = node.service {
            child = child.with_service(service);
        }
        nodes.push(child);
    }
    Ok(nodes)
}

/// Tests → TestFile: every file directly becomes a test node.
async fn tests_children(tests_dir: &Path) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for (i, entry) in list(tests_dir).await?.into_iter().enumerate() {
        if !entry.is_dir {
            nodes.push(Node::new(entry.path, NodeType::TestFile, i as u32));
        }
    }
    Ok(nodes)
}
