//! Local resource tree models.
//!
//! Three independent views over the fixed project layout:
//! - [`source`] — the live project files under the workfolder;
//! - [`devtime`] — the deployed-state view read from cached remote snapshots;
//! - [`datasources`] — a flat list of local data-source definition files.
//!
//! Classification is a pure function from (parent type, file name, optional
//! manifest content) to a node variant plus an ordering key. Expansion
//! re-reads the directory on every call — there is no cache to invalidate.

pub mod datasources;
pub mod devtime;
pub mod source;

use crate::templates::ServiceVariant;
use std::path::PathBuf;

/// Sibling order of the `tests` directory under a service.
pub const TESTS_ORDER: u32 = 1_000;
/// Large sentinel for files no classification rule recognizes.
pub const UNCLASSIFIED_ORDER: u32 = 10_000;

// ─── Node ─────────────────────────────────────────────────────────────────────

/// Closed enumeration of tree node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Workfolder,
    Application,
    /// `application.json`, `datasource.json`, or `README.md` under an application.
    ApplicationFile,
    Module,
    /// `module.json` under a module.
    ModuleFile,
    QueryService,
    SqlService,
    CrudService,
    /// `service.json` under a service.
    ServiceFile,
    /// A schema / query / object component file.
    Component,
    /// A structural binding file.
    Bindings,
    /// Crud read sub-resource directory.
    Read,
    /// Crud write sub-resource directory.
    Write,
    /// The `tests` directory of a service.
    Tests,
    TestFile,
    DataSource,
    Other,
}

/// Component sub-classification, kept even where the surfaced node type is
/// `Bindings` (the write-folder dual tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Input,
    Output,
    Query,
    Sqls,
    Object,
    InputBindings,
    OutputBindings,
    Tables,
    Columns,
}

/// A transient projection over an on-disk entry, recomputed on demand.
#[derive(Debug, Clone)]
pub struct Node {
    pub path: PathBuf,
    pub label: String,
    pub node_type: NodeType,
    /// The owning service variant, carried down to service descendants.
    pub service: Option<ServiceVariant>,
    pub component: Option<ComponentKind>,
    /// Sibling display order; ties break on original listing order.
    pub order: u32,
}

impl Node {
    pub fn new(path: PathBuf, node_type: NodeType, order: u32) -> Self {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            label,
            node_type,
            service: None,
            component: None,
            order,
        }
    }

    pub fn with_service(mut self, service: ServiceVariant) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_component(mut self, component: ComponentKind) -> Self {
        self.component = Some(component);
        self
    }
}

/// Stable sort of siblings by their numeric order key.
pub fn sort_siblings(nodes: &mut [Node]) {
    nodes.sort_by_key(|n| n.order);
}

// ─── Classification tables ────────────────────────────────────────────────────
//
// Pure functions from a child's file name to (type, component, order).
// The walkers in `source` apply them to directory listings.

/// Children of a query or sql service.
pub fn classify_query_sql_child(name: &str) -> (NodeType, Option<ComponentKind>, u32) {
    match name {
        "service.json" => (NodeType::ServiceFile, None, 0),
        "input.json" => (NodeType::Component, Some(ComponentKind::Input), 1),
        "output.json" => (NodeType::Component, Some(ComponentKind::Output), 2),
        "sqls.sql" => (NodeType::Component, Some(ComponentKind::Sqls), 3),
        "query.sql" => (NodeType::Component, Some(ComponentKind::Query), 4),
        "input-bindings.json" => (NodeType::Bindings, Some(ComponentKind::InputBindings), 5),
        "output-bindings.json" => (NodeType::Bindings, Some(ComponentKind::OutputBindings), 6),
        "tests" => (NodeType::Tests, None, TESTS_ORDER),
        _ => (NodeType::Other, None, UNCLASSIFIED_ORDER),
    }
}

/// Children of a crud service.
pub fn classify_crud_child(name: &str) -> (NodeType, Option<ComponentKind>, u32) {
    match name {
        "service.json" => (NodeType::ServiceFile, None, 0),
        "object.json" => (NodeType::Component, Some(ComponentKind::Object), 1),
        "read" => (NodeType::Read, None, 2),
        "write" => (NodeType::Write, None, 3),
        "tests" => (NodeType::Tests, None, TESTS_ORDER),
        _ => (NodeType::Other, None, UNCLASSIFIED_ORDER),
    }
}

/// Children of a crud read sub-resource.
pub fn classify_read_child(name: &str) -> (NodeType, Option<ComponentKind>, u32) {
    match name {
        "input.json" => (NodeType::Component, Some(ComponentKind::Input), 1),
        "query.sql" => (NodeType::Component, Some(ComponentKind::Query), 2),
        "input-bindings.json" => (NodeType::Bindings, Some(ComponentKind::InputBindings), 3),
        "output-bindings.json" => (NodeType::Bindings, Some(ComponentKind::OutputBindings), 4),
        _ => (NodeType::Other, None, UNCLASSIFIED_ORDER),
    }
}

/// Children of a crud write sub-resource.
///
/// Every entry surfaces as `Bindings` regardless of its component
/// sub-classification — the dual tag is intentional labeling, preserved
/// from the original behavior. `columns_seen` counts the `...columns`
/// files already classified, which take incrementing orders from 2.
pub fn classify_write_child(name: &str, columns_seen: u32) -> (NodeType, Option<ComponentKind>, u32) {
    if name == "tables.json" {
        return (NodeType::Bindings, Some(ComponentKind::Tables), 0);
    }
    let stem = name.strip_suffix(".json").unwrap_or(name);
    if stem.ends_with("columns") {
        return (NodeType::Bindings, Some(ComponentKind::Columns), 2 + columns_seen);
    }
    (NodeType::Bindings, None, UNCLASSIFIED_ORDER)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_sql_table_matches_fixed_orders() {
        let expected = [
            ("service.json", 0),
            ("input.json", 1),
            ("output.json", 2),
            ("sqls.sql", 3),
            ("query.sql", 4),
            ("input-bindings.json", 5),
            ("output-bindings.json", 6),
            ("tests", TESTS_ORDER),
            ("notes.txt", UNCLASSIFIED_ORDER),
        ];
        for (name, order) in expected {
            assert_eq!(classify_query_sql_child(name).2, order, "{name}");
        }
    }

    #[test]
    fn bindings_files_surface_as_bindings_type() {
        let (ty, component, _) = classify_query_sql_child("input-bindings.json");
        assert_eq!(ty, NodeType::Bindings);
        assert_eq!(component, Some(ComponentKind::InputBindings));
    }

    #[test]
    fn write_children_are_all_bindings() {
        let (ty, component, order) = classify_write_child("tables.json", 0);
        assert_eq!((ty, component, order), (NodeType::Bindings, Some(ComponentKind::Tables), 0));

        let (ty, component, order) = classify_write_child("orders-columns.json", 0);
        assert_eq!(ty, NodeType::Bindings);
        assert_eq!(component, Some(ComponentKind::Columns));
        assert_eq!(order, 2);

        let (_, _, order) = classify_write_child("users-columns.json", 1);
        assert_eq!(order, 3);

        // even an unrecognized entry surfaces as Bindings
        let (ty, component, order) = classify_write_child("stray.txt", 2);
        assert_eq!(ty, NodeType::Bindings);
        assert_eq!(component, None);
        assert_eq!(order, UNCLASSIFIED_ORDER);
    }

    #[test]
    fn sibling_sort_is_stable() {
        let mut nodes = vec![
            Node::new(PathBuf::from("b.txt"), NodeType::Other, UNCLASSIFIED_ORDER),
            Node::new(PathBuf::from("service.json"), NodeType::ServiceFile, 0),
            Node::new(PathBuf::from("a.txt"), NodeType::Other, UNCLASSIFIED_ORDER),
        ];
        sort_siblings(&mut nodes);
        let labels: Vec<&str> = nodes.iter().map(|n| n.label.as_str()).collect();
        // ties keep the original listing order — b.txt before a.txt
        assert_eq!(labels, ["service.json", "b.txt", "a.txt"]);
    }
}
