/// Integration tests for the source tree — classification, ordering, and
/// the fixed project layout produced by the lifecycle scaffolds.
use std::path::Path;
use svcbuilder::lifecycle::{applications, modules, services, testcases};
use svcbuilder::model::VersionDescriptor;
use svcbuilder::templates::ServiceVariant;
use svcbuilder::tree::{source, Node, NodeType};
use tempfile::TempDir;

async fn scaffold_service(workfolder: &Path, variant: ServiceVariant) -> Node {
    applications::create(workfolder, "demo", "mysql", &VersionDescriptor::default())
        .await
        .unwrap();
    modules::create(workfolder, "demo", "m1").await.unwrap();
    services::create(workfolder, "demo", "m1", "svc", variant)
        .await
        .unwrap();

    let root = source::workfolder(workfolder);
    let apps = source::children(&root).await.unwrap();
    let app_children = source::children(&apps[0]).await.unwrap();
    let module = app_children
        .iter()
        .find(|n| n.node_type == NodeType::Module)
        .unwrap();
    let module_children = source::children(module).await.unwrap();
    module_children
        .into_iter()
        .find(|n| {
            matches!(
                n.node_type,
                NodeType::QueryService | NodeType::SqlService | NodeType::CrudService
            )
        })
        .unwrap()
}

// ─── Workfolder ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn workfolder_lists_only_application_directories() {
    let dir = TempDir::new().unwrap();
    applications::create(dir.path(), "demo", "mysql", &VersionDescriptor::default())
        .await
        .unwrap();
    // a directory without src/application.json is not an application
    std::fs::create_dir(dir.path().join("scratch")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

    let children = source::children(&source::workfolder(dir.path()))
        .await
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].node_type, NodeType::Application);
    assert_eq!(children[0].label, "demo");
}

// ─── Application ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn application_children_surface_src_and_readme() {
    let dir = TempDir::new().unwrap();
    applications::create(dir.path(), "demo", "mysql", &VersionDescriptor::default())
        .await
        .unwrap();
    modules::create(dir.path(), "demo", "m1").await.unwrap();
    modules::create(dir.path(), "demo", "m2").await.unwrap();

    let root = source::workfolder(dir.path());
    let apps = source::children(&root).await.unwrap();
    let children = source::children(&apps[0]).await.unwrap();

    // application.json first, datasource.json second, then the modules
    assert_eq!(children[0].label, "application.json");
    assert_eq!(children[0].node_type, NodeType::ApplicationFile);
    assert_eq!(children[1].label, "datasource.json");
    let modules: Vec<&Node> = children
        .iter()
        .filter(|n| n.node_type == NodeType::Module)
        .collect();
    assert_eq!(modules.len(), 2);
    assert!(modules.iter().all(|m| m.order >= 2));

    // README.md lives at the application root, not under src/
    let readme = children.iter().find(|n| n.label == "README.md").unwrap();
    assert_eq!(readme.node_type, NodeType::ApplicationFile);
    assert!(readme.path.parent().unwrap().ends_with("demo"));
}

// ─── Services ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn query_service_children_follow_fixed_order() {
    let dir = TempDir::new().unwrap();
    let service = scaffold_service(dir.path(), ServiceVariant::Query).await;
    assert_eq!(service.node_type, NodeType::QueryService);

    // add an unclassified file — must sort last
    std::fs::write(service.path.join("notes.txt"), "x").unwrap();

    let children = source::children(&service).await.unwrap();
    let labels: Vec<&str> = children.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "service.json",
            "input.json",
            "output.json",
            "query.sql",
            "input-bindings.json",
            "output-bindings.json",
            "tests",
            "notes.txt",
        ]
    );

    let bindings: Vec<&Node> = children
        .iter()
        .filter(|n| n.node_type == NodeType::Bindings)
        .collect();
    assert_eq!(bindings.len(), 2);
}

#[tokio::test]
async fn sql_service_carries_sqls_component() {
    let dir = TempDir::new().unwrap();
    let service = scaffold_service(dir.path(), ServiceVariant::Sql).await;
    assert_eq!(service.node_type, NodeType::SqlService);

    let children = source::children(&service).await.unwrap();
    let labels: Vec<&str> = children.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "service.json",
            "input.json",
            "output.json",
            "sqls.sql",
            "input-bindings.json",
            "output-bindings.json",
            "tests",
        ]
    );
}

#[tokio::test]
async fn crud_service_exposes_read_write_and_tests() {
    let dir = TempDir::new().unwrap();
    let service = scaffold_service(dir.path(), ServiceVariant::Crud).await;
    assert_eq!(service.node_type, NodeType::CrudService);

    let children = source::children(&service).await.unwrap();
    let labels: Vec<&str> = children.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        ["service.json", "object.json", "read", "write", "tests"]
    );
    assert_eq!(children[1].node_type, NodeType::Component);
    assert_eq!(children[2].node_type, NodeType::Read);
    assert_eq!(children[3].node_type, NodeType::Write);
}

#[tokio::test]
async fn write_folder_children_all_surface_as_bindings() {
    let dir = TempDir::new().unwrap();
    let service = scaffold_service(dir.path(), ServiceVariant::Crud).await;

    let write_dir = service.path.join("write");
    std::fs::write(write_dir.join("orders-columns.json"), "{}").unwrap();
    std::fs::write(write_dir.join("users-columns.json"), "{}").unwrap();

    let children = source::children(&service).await.unwrap();
    let write = children.iter().find(|n| n.label == "write").unwrap();
    let write_children = source::children(write).await.unwrap();

    assert!(write_children
        .iter()
        .all(|n| n.node_type == NodeType::Bindings));
    assert_eq!(write_children[0].label, "tables.json");
    assert_eq!(write_children[0].order, 0);
    // columns files take incrementing orders from 2 in listing sequence
    let columns: Vec<u32> = write_children
        .iter()
        .filter(|n| n.label.ends_with("columns.json"))
        .map(|n| n.order)
        .collect();
    assert_eq!(columns.len(), 2);
    assert!(columns.contains(&2) && columns.contains(&3));
}

#[tokio::test]
async fn unknown_service_type_classifies_as_other() {
    let dir = TempDir::new().unwrap();
    applications::create(dir.path(), "demo", "mysql", &VersionDescriptor::default())
        .await
        .unwrap();
    modules::create(dir.path(), "demo", "m1").await.unwrap();
    let odd = dir.path().join("demo/src/m1/odd");
    std::fs::create_dir_all(&odd).unwrap();
    std::fs::write(odd.join("service.json"), r#"{"type":"graphql"}"#).unwrap();

    let root = source::workfolder(dir.path());
    let apps = source::children(&root).await.unwrap();
    let app_children = source::children(&apps[0]).await.unwrap();
    let module = app_children
        .iter()
        .find(|n| n.node_type == NodeType::Module)
        .unwrap();
    let module_children = source::children(module).await.unwrap();
    let odd_node = module_children.iter().find(|n| n.label == "odd").unwrap();
    assert_eq!(odd_node.node_type, NodeType::Other);
}

// ─── Tests directory ──────────────────────────────────────────────────────────

#[tokio::test]
async fn tests_folder_children_are_test_files() {
    let dir = TempDir::new().unwrap();
    let service = scaffold_service(dir.path(), ServiceVariant::Query).await;
    testcases::create(&service.path, "smoke", None).await.unwrap();
    testcases::create(&service.path, "edge", None).await.unwrap();

    let children = source::children(&service).await.unwrap();
    let tests = children.iter().find(|n| n.node_type == NodeType::Tests).unwrap();
    let test_files = source::children(tests).await.unwrap();
    assert_eq!(test_files.len(), 2);
    assert!(test_files.iter().all(|n| n.node_type == NodeType::TestFile));
}
