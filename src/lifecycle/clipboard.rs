// SPDX-License-Identifier: MIT
//! Copy/paste between tree nodes.
//!
//! The allowed pairings form a closed relation: an application pastes into
//! the workfolder root, a module into an application's `src/`, a service
//! (any variant) into a module. Every other pairing is rejected before any
//! filesystem mutation.

use super::{copy_dir_recursive, ensure_absent, LifecycleError};
use crate::tree::{Node, NodeType};
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Whether `source` may be pasted into `target`.
pub fn paste_allowed(source: NodeType, target: NodeType) -> bool {
    matches!(
        (source, target),
        (NodeType::Application, NodeType::Workfolder)
            | (NodeType::Module, NodeType::Application)
            | (NodeType::QueryService, NodeType::Module)
            | (NodeType::SqlService, NodeType::Module)
            | (NodeType::CrudService, NodeType::Module)
    )
}

/// Paste a copied node into a target node.
///
/// Returns the destination directory. A disallowed pairing or an existing
/// destination name fails with no mutation.
pub async fn paste(source: &Node, target: &Node) -> Result<PathBuf> {
    if !paste_allowed(source.node_type, target.node_type) {
        return Err(LifecycleError::WrongTarget {
            src: format!("{:?}", source.node_type),
            target: format!("{:?}", target.node_type),
        }
        .into());
    }

    let dest_root = match target.node_type {
        // modules land inside the application's src/
        NodeType::Application => target.path.join("src"),
        _ => target.path.clone(),
    };
    let dest = dest_root.join(&source.label);
    ensure_absent(&dest)?;

    copy_dir_recursive(&source.path, &dest).await?;
    info!(from = %source.path.display(), to = %dest.display(), "pasted");
    Ok(dest)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_is_closed() {
        let allowed = [
            (NodeType::Application, NodeType::Workfolder),
            (NodeType::Module, NodeType::Application),
            (NodeType::QueryService, NodeType::Module),
            (NodeType::SqlService, NodeType::Module),
            (NodeType::CrudService, NodeType::Module),
        ];
        for (source, target) in allowed {
            assert!(paste_allowed(source, target), "{source:?}→{target:?}");
        }

        let rejected = [
            (NodeType::Application, NodeType::Application),
            (NodeType::Module, NodeType::Module),
            (NodeType::Module, NodeType::Workfolder),
            (NodeType::QueryService, NodeType::Application),
            (NodeType::TestFile, NodeType::Tests),
            (NodeType::Workfolder, NodeType::Workfolder),
        ];
        for (source, target) in rejected {
            assert!(!paste_allowed(source, target), "{source:?}→{target:?}");
        }
    }
}
