//! Content templates for new artifacts.
//!
//! Pure constructors — no state, no I/O beyond serialization. Each template
//! reproduces the exact field set the backend's generation and binding
//! calls expect to parse, so a freshly scaffolded artifact is immediately
//! usable.

use crate::model::{
    ApplicationManifest, CrudOperation, CrudReadPaths, CrudServiceManifest, CrudWritePaths,
    DataSourceDef, ModuleManifest, QueryServiceManifest, ServiceManifest, SqlServiceManifest,
    TestCase,
};
use serde_json::Value;

/// A file to write during scaffolding, path relative to the artifact root.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    pub path: String,
    pub content: String,
}

fn json_file(path: &str, value: &impl serde::Serialize) -> TemplateFile {
    TemplateFile {
        path: path.to_string(),
        content: serde_json::to_string_pretty(value).expect("template serialization"),
    }
}

// ─── Application ──────────────────────────────────────────────────────────────

pub fn application_manifest(name: &str, db_type: &str) -> ApplicationManifest {
    ApplicationManifest {
        name: name.to_string(),
        description: String::new(),
        db_type: db_type.to_string(),
        data_source: String::new(),
        schema: String::new(),
    }
}

pub fn datasource_skeleton(db_type: &str) -> DataSourceDef {
    DataSourceDef {
        name: String::new(),
        db_type: db_type.to_string(),
        url: String::new(),
        username: String::new(),
        password: String::new(),
        schema: String::new(),
    }
}

/// All files of a new application, paths relative to the application root.
pub fn application_files(name: &str, db_type: &str) -> Vec<TemplateFile> {
    vec![
        json_file("src/application.json", &application_manifest(name, db_type)),
        json_file("src/datasource.json", &datasource_skeleton(db_type)),
        TemplateFile {
            path: "README.md".to_string(),
            content: format!("# {name}\n"),
        },
    ]
}

// ─── Module ───────────────────────────────────────────────────────────────────

pub fn module_manifest(name: &str) -> ModuleManifest {
    ModuleManifest {
        name: name.to_string(),
        description: String::new(),
    }
}

pub fn module_files(name: &str) -> Vec<TemplateFile> {
    vec![json_file("module.json", &module_manifest(name))]
}

// ─── Services ─────────────────────────────────────────────────────────────────

/// The three service variants a template exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceVariant {
    Query,
    Sql,
    Crud,
}

impl ServiceVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceVariant::Query => "query",
            ServiceVariant::Sql => "sql",
            ServiceVariant::Crud => "crud",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(ServiceVariant::Query),
            "sql" => Some(ServiceVariant::Sql),
            "crud" => Some(ServiceVariant::Crud),
            _ => None,
        }
    }
}

pub fn service_manifest(name: &str, variant: ServiceVariant) -> ServiceManifest {
    match variant {
        ServiceVariant::Query => ServiceManifest::Query(QueryServiceManifest {
            name: name.to_string(),
            input: "input.json".to_string(),
            output: "output.json".to_string(),
            query: "query.sql".to_string(),
            input_bindings: "input-bindings.json".to_string(),
            output_bindings: "output-bindings.json".to_string(),
        }),
        ServiceVariant::Sql => ServiceManifest::Sql(SqlServiceManifest {
            name: name.to_string(),
            input: "input.json".to_string(),
            output: "output.json".to_string(),
            sqls: "sqls.sql".to_string(),
            input_bindings: "input-bindings.json".to_string(),
            output_bindings: "output-bindings.json".to_string(),
        }),
        ServiceVariant::Crud => ServiceManifest::Crud(CrudServiceManifest {
            name: name.to_string(),
            object: "object.json".to_string(),
            read: CrudReadPaths {
                input: "read/input.json".to_string(),
                query: "read/query.sql".to_string(),
                input_bindings: "read/input-bindings.json".to_string(),
                output_bindings: "read/output-bindings.json".to_string(),
            },
            write: CrudWritePaths {
                tables: "write/tables.json".to_string(),
            },
        }),
    }
}

/// All files of a new service, paths relative to the service directory.
///
/// Component skeletons are empty JSON objects / empty SQL text; the
/// backend's gen calls fill them in.
pub fn service_files(name: &str, variant: ServiceVariant) -> Vec<TemplateFile> {
    let manifest = json_file("service.json", &service_manifest(name, variant));
    let empty = |path: &str| json_file(path, &Value::Object(Default::default()));
    let sql = |path: &str| TemplateFile {
        path: path.to_string(),
        content: String::new(),
    };

    match variant {
        ServiceVariant::Query => vec![
            manifest,
            empty("input.json"),
            empty("output.json"),
            sql("query.sql"),
            empty("input-bindings.json"),
            empty("output-bindings.json"),
        ],
        ServiceVariant::Sql => vec![
            manifest,
            empty("input.json"),
            empty("output.json"),
            sql("sqls.sql"),
            empty("input-bindings.json"),
            empty("output-bindings.json"),
        ],
        ServiceVariant::Crud => vec![
            manifest,
            empty("object.json"),
            empty("read/input.json"),
            sql("read/query.sql"),
            empty("read/input-bindings.json"),
            empty("read/output-bindings.json"),
            json_file("write/tables.json", &Value::Array(vec![])),
        ],
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

/// A new test case seeded with the service's current input schema snapshot.
pub fn test_case(name: &str, input: Value, operation: Option<CrudOperation>) -> TestCase {
    TestCase {
        name: name.to_string(),
        input,
        operation,
        comments: String::new(),
    }
}

// ─── Tests (unit) ─────────────────────────────────────────────────────────────
