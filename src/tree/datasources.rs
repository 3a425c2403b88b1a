//! Data-source tree — a flat list of local data-source definition files.

use super::{Node, NodeType};
use anyhow::{Context as _, Result};
use std::path::Path;

/// Suffix identifying a standalone data-source definition file.
pub const DATASOURCE_SUFFIX: &str = ".datasource.json";

/// List `*.datasource.json` files directly under the workfolder, with no
/// nesting, in listing order.
pub async fn list(workfolder: &Path) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut entries = tokio::fs::read_dir(workfolder)
        .await
        .with_context(|| format!("cannot read workfolder {}", workfolder.display()))?;
    let mut order = 0u32;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_file() && name.ends_with(DATASOURCE_SUFFIX) {
            nodes.push(Node::new(path, NodeType::DataSource, order));
            order += 1;
        }
    }
    Ok(nodes)
}
