use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use svcbuilder::config::WorkbenchConfig;
use svcbuilder::devtime::DevtimeCache;
use svcbuilder::lifecycle::{applications, datasources, modules, services, testcases};
use svcbuilder::model::{CrudOperation, VersionDescriptor};
use svcbuilder::templates::ServiceVariant;
use svcbuilder::tree::devtime::{service_validity, DevtimeNode};
use svcbuilder::tree::{self, source, Node};
use svcbuilder::WorkbenchContext;

#[derive(Parser)]
#[command(
    name = "svcb",
    about = "Service Builder workbench — local project tree + remote builder client",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Workfolder holding applications (default: current directory)
    #[arg(long, env = "SVCB_WORKFOLDER", global = true)]
    workfolder: Option<PathBuf>,

    /// Data directory for config, secrets, and the devtime cache
    #[arg(long, env = "SVCB_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Builder service base URL for register/connect
    #[arg(long, env = "SVCB_SERVICE_URL", global = true)]
    service_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SVCB_LOG", global = true)]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Register a brand-new workspace on the builder service.
    ///
    /// Examples:
    ///   svcb register
    Register,
    /// Connect to an existing workspace with its URL and access key.
    ///
    /// Examples:
    ///   svcb connect --workspace-url https://builder.example/ws/acme --access-key KEY
    Connect {
        #[arg(long)]
        workspace_url: String,
        #[arg(long)]
        access_key: String,
    },
    /// Refresh the bearer token of the stored workspace connection.
    RefreshToken,
    /// Show the builder service's version descriptor.
    Versions,
    /// Application lifecycle.
    App {
        #[command(subcommand)]
        action: AppAction,
    },
    /// Module lifecycle.
    Module {
        #[command(subcommand)]
        action: ModuleAction,
    },
    /// Service lifecycle.
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Test-case lifecycle.
    Test {
        #[command(subcommand)]
        action: TestAction,
    },
    /// Data-source operations.
    Ds {
        #[command(subcommand)]
        action: DsAction,
    },
    /// Print one of the three resource trees.
    ///
    /// Examples:
    ///   svcb tree
    ///   svcb tree --view devtime
    Tree {
        /// One of: source, devtime, datasources
        #[arg(long, default_value = "source")]
        view: String,
    },
    /// Devtime cache operations.
    Devtime {
        #[command(subcommand)]
        action: DevtimeAction,
    },
}

#[derive(Subcommand)]
enum AppAction {
    Create {
        name: String,
        #[arg(long, default_value = "mysql")]
        db_type: String,
    },
    Rename {
        old: String,
        new: String,
    },
    Delete {
        name: String,
    },
    Deploy {
        name: String,
    },
    Undeploy {
        name: String,
    },
}

#[derive(Subcommand)]
enum ModuleAction {
    Create { app: String, name: String },
    Rename { app: String, old: String, new: String },
    Delete { app: String, name: String },
    Deploy { app: String, name: String },
    Undeploy { app: String, name: String },
}

#[derive(Subcommand)]
enum ServiceAction {
    Create {
        app: String,
        module: String,
        name: String,
        /// One of: query, sql, crud
        #[arg(long, default_value = "query")]
        variant: String,
    },
    Rename {
        app: String,
        module: String,
        old: String,
        new: String,
    },
    Delete {
        app: String,
        module: String,
        name: String,
    },
    Deploy {
        app: String,
        module: String,
        name: String,
    },
    Undeploy {
        app: String,
        module: String,
        name: String,
    },
    /// Re-run the backend generation calls and rewrite generated components.
    Regen {
        app: String,
        module: String,
        name: String,
    },
}

#[derive(Subcommand)]
enum TestAction {
    Create {
        app: String,
        module: String,
        service: String,
        name: String,
        /// Crud operation: read, create, update, delete, save
        #[arg(long)]
        operation: Option<String>,
    },
    Duplicate {
        app: String,
        module: String,
        service: String,
        /// Test file name, e.g. smoke.json
        file: String,
    },
    Delete {
        app: String,
        module: String,
        service: String,
        file: String,
    },
}

#[derive(Subcommand)]
enum DsAction {
    /// List local data-source definition files.
    List,
    /// Probe a data-source file against the backend.
    Test { file: PathBuf },
    /// Deploy a data-source file.
    Deploy { file: PathBuf },
}

#[derive(Subcommand)]
enum DevtimeAction {
    /// Rebuild the devtime cache from the inspection API.
    Refresh,
    /// Clean a remote application and drop its local mirror.
    CleanApp { app: String },
    /// Clean a remote data source and drop its local mirror.
    CleanDs { name: String },
    /// Clean the whole remote workspace and drop the local cache.
    CleanWorkspace,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = WorkbenchConfig::new(
        args.workfolder,
        args.data_dir,
        args.service_url,
        args.log.clone(),
    );
    tracing_subscriber::fmt()
        .with_env_filter(config.log.clone())
        .compact()
        .init();

    let ctx = WorkbenchContext::new(config)?;
    run(args.command, &ctx).await
}

async fn run(command: Command, ctx: &WorkbenchContext) -> Result<()> {
    let workfolder = ctx.config.workfolder.clone();
    match command {
        Command::Register => {
            let connection = ctx.client.register(&ctx.config.service_url).await?;
            ctx.session.save(&connection)?;
            println!("registered workspace '{}'", connection.name);
        }
        Command::Connect {
            workspace_url,
            access_key,
        } => {
            match ctx
                .client
                .connect(&ctx.config.service_url, &workspace_url, &access_key)
                .await
            {
                Ok(connection) => {
                    ctx.session.save(&connection)?;
                    println!("connected to workspace '{}'", connection.name);
                }
                Err(e) => {
                    // connect is the one flow with a built-in retry affordance
                    eprintln!("connect failed: {e:#}");
                    eprintln!("retry with: svcb connect --workspace-url {workspace_url} --access-key <key>");
                    std::process::exit(1);
                }
            }
        }
        Command::RefreshToken => {
            let connection = ctx.session.current()?;
            let token = ctx
                .client
                .refresh_token(
                    &ctx.config.service_url,
                    &connection.name,
                    &connection.access_key,
                )
                .await?;
            ctx.session.save_token(token)?;
            println!("token refreshed");
        }
        Command::Versions => {
            let versions = ctx.client.get_versions(&ctx.config.service_url).await?;
            cache_versions(ctx, &versions).await?;
            println!("{}", serde_json::to_string_pretty(&versions)?);
        }

        Command::App { action } => match action {
            AppAction::Create { name, db_type } => {
                let versions = last_versions(ctx).await;
                applications::create(&workfolder, &name, &db_type, &versions).await?;
                println!("created application '{name}'");
            }
            AppAction::Rename { old, new } => {
                let workspace = ctx.session.current()?.name;
                applications::rename(
                    &workfolder,
                    &workspace,
                    &old,
                    &new,
                    ctx.client.as_ref(),
                    &ctx.session,
                )
                .await?;
                println!("renamed application '{old}' to '{new}'");
            }
            AppAction::Delete { name } => {
                applications::delete(&workfolder, &name).await?;
                println!("deleted application '{name}'");
            }
            AppAction::Deploy { name } => {
                let workspace = ctx.session.current()?.name;
                println!("deploying application '{name}' (this may take a while)...");
                applications::deploy(&workfolder, &workspace, &name, ctx.client.as_ref()).await?;
                println!("deployed application '{name}'");
            }
            AppAction::Undeploy { name } => {
                let workspace = ctx.session.current()?.name;
                applications::undeploy(&workspace, &name, ctx.client.as_ref()).await?;
                println!("undeployed application '{name}'");
            }
        },

        Command::Module { action } => match action {
            ModuleAction::Create { app, name } => {
                modules::create(&workfolder, &app, &name).await?;
                println!("created module '{name}'");
            }
            ModuleAction::Rename { app, old, new } => {
                let workspace = ctx.session.current()?.name;
                modules::rename(&workfolder, &workspace, &app, &old, &new, ctx.client.as_ref())
                    .await?;
                println!("renamed module '{old}' to '{new}'");
            }
            ModuleAction::Delete { app, name } => {
                modules::delete(&workfolder, &app, &name).await?;
                println!("deleted module '{name}'");
            }
            ModuleAction::Deploy { app, name } => {
                let workspace = ctx.session.current()?.name;
                modules::deploy(&workfolder, &workspace, &app, &name, ctx.client.as_ref()).await?;
                println!("deployed module '{name}'");
            }
            ModuleAction::Undeploy { app, name } => {
                let workspace = ctx.session.current()?.name;
                modules::undeploy(&workspace, &app, &name, ctx.client.as_ref()).await?;
                println!("undeployed module '{name}'");
            }
        },

        Command::Service { action } => match action {
            ServiceAction::Create {
                app,
                module,
                name,
                variant,
            } => {
                let variant = ServiceVariant::parse(&variant)
                    .with_context(|| format!("unknown service variant: {variant}"))?;
                services::create(&workfolder, &app, &module, &name, variant).await?;
                println!("created {} service '{name}'", variant.as_str());
            }
            ServiceAction::Rename {
                app,
                module,
                old,
                new,
            } => {
                let workspace = ctx.session.current()?.name;
                services::rename(
                    &workfolder,
                    &workspace,
                    &app,
                    &module,
                    &old,
                    &new,
                    ctx.client.as_ref(),
                )
                .await?;
                println!("renamed service '{old}' to '{new}'");
            }
            ServiceAction::Delete { app, module, name } => {
                services::delete(&workfolder, &app, &module, &name).await?;
                println!("deleted service '{name}'");
            }
            ServiceAction::Deploy { app, module, name } => {
                let workspace = ctx.session.current()?.name;
                services::deploy(
                    &workfolder,
                    &workspace,
                    &app,
                    &module,
                    &name,
                    ctx.client.as_ref(),
                )
                .await?;
                println!("deployed service '{name}'");
            }
            ServiceAction::Undeploy { app, module, name } => {
                let workspace = ctx.session.current()?.name;
                services::undeploy(&workspace, &app, &module, &name, ctx.client.as_ref()).await?;
                println!("undeployed service '{name}'");
            }
            ServiceAction::Regen { app, module, name } => {
                services::regenerate(&workfolder, &app, &module, &name, &ctx.client).await?;
                println!("regenerated service '{name}'");
            }
        },

        Command::Test { action } => match action {
            TestAction::Create {
                app,
                module,
                service,
                name,
                operation,
            } => {
                let operation = operation
                    .map(|op| parse_operation(&op))
                    .transpose()?;
                let dir = workfolder.join(&app).join("src").join(&module).join(&service);
                testcases::create(&dir, &name, operation).await?;
                println!("created test '{name}'");
            }
            TestAction::Duplicate {
                app,
                module,
                service,
                file,
            } => {
                let dir = workfolder.join(&app).join("src").join(&module).join(&service);
                let copy = testcases::duplicate(&dir, &file).await?;
                println!("duplicated '{file}' as '{}'", copy.display());
            }
            TestAction::Delete {
                app,
                module,
                service,
                file,
            } => {
                let dir = workfolder.join(&app).join("src").join(&module).join(&service);
                testcases::delete(&dir, &file).await?;
                println!("deleted test '{file}'");
            }
        },

        Command::Ds { action } => match action {
            DsAction::List => {
                for node in tree::datasources::list(&workfolder).await? {
                    println!("{}", node.label);
                }
            }
            DsAction::Test { file } => {
                let workspace = ctx.session.current()?.name;
                let outcome = datasources::test(&ctx.client, &ctx.session, &workspace, &file).await?;
                if outcome.succeed {
                    println!("data source ok");
                } else {
                    println!("data source failed: {}", outcome.message);
                }
            }
            DsAction::Deploy { file } => {
                let workspace = ctx.session.current()?.name;
                datasources::deploy(&ctx.client, &ctx.session, &workspace, &file).await?;
                println!("deployed data source");
            }
        },

        Command::Tree { view } => match view.as_str() {
            "source" => {
                let root = source::workfolder(&workfolder);
                print_source_tree(&root, 0).await?;
            }
            "devtime" => {
                let cache = ctx.config.devtime_dir();
                print_devtime_tree(&cache, &DevtimeNode::Root, 0).await?;
            }
            "datasources" => {
                for node in tree::datasources::list(&workfolder).await? {
                    println!("{}", node.label);
                }
            }
            other => anyhow::bail!("unknown view: {other}"),
        },

        Command::Devtime { action } => {
            let cache = DevtimeCache::new(ctx.config.devtime_dir());
            match action {
                DevtimeAction::Refresh => {
                    cache.refresh_all(&ctx.client).await?;
                    println!("devtime cache refreshed");
                }
                DevtimeAction::CleanApp { app } => {
                    let workspace = ctx.session.current()?.name;
                    cache
                        .clean_application(&ctx.client, &format!("{workspace}/{app}"))
                        .await?;
                    println!("cleaned application '{app}'");
                }
                DevtimeAction::CleanDs { name } => {
                    cache.clean_data_source(&ctx.client, &name).await?;
                    println!("cleaned data source '{name}'");
                }
                DevtimeAction::CleanWorkspace => {
                    cache.clean_workspace(&ctx.client).await?;
                    println!("cleaned workspace");
                }
            }
        }
    }
    Ok(())
}

fn parse_operation(raw: &str) -> Result<CrudOperation> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("unknown crud operation: {raw}"))
}

// ─── Version descriptor cache ────────────────────────────────────────────────

async fn cache_versions(ctx: &WorkbenchContext, versions: &VersionDescriptor) -> Result<()> {
    tokio::fs::create_dir_all(&ctx.config.data_dir).await?;
    let raw = serde_json::to_string_pretty(versions)?;
    tokio::fs::write(ctx.config.data_dir.join("versions.json"), raw).await?;
    Ok(())
}

/// The last fetched version descriptor: try the backend first, fall back
/// to the cached copy, then to an empty descriptor.
async fn last_versions(ctx: &WorkbenchContext) -> VersionDescriptor {
    if let Ok(versions) = ctx.client.get_versions(&ctx.config.service_url).await {
        let _ = cache_versions(ctx, &versions).await;
        return versions;
    }
    match tokio::fs::read_to_string(ctx.config.data_dir.join("versions.json")).await {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        Err(_) => VersionDescriptor::default(),
    }
}

// ─── Tree printing ────────────────────────────────────────────────────────────

async fn print_source_tree(node: &Node, depth: usize) -> Result<()> {
    if depth > 0 {
        println!("{}{} [{:?}]", "  ".repeat(depth - 1), node.label, node.node_type);
    }
    for child in source::children(node).await? {
        Box::pin(print_source_tree(&child, depth + 1)).await?;
    }
    Ok(())
}

async fn print_devtime_tree(
    cache: &std::path::Path,
    node: &DevtimeNode,
    depth: usize,
) -> Result<()> {
    let label = match node {
        DevtimeNode::Root => None,
        DevtimeNode::DataSources => Some("dataSources".to_string()),
        DevtimeNode::Applications => Some("applications".to_string()),
        DevtimeNode::DataSource(ds) => Some(ds.name.clone()),
        DevtimeNode::Application(app) => Some(app.name.clone()),
        DevtimeNode::Module { module, .. } => Some(module.name.clone()),
        DevtimeNode::Service { service, .. } => {
            let validity = service_validity(service);
            Some(if validity.valid {
                service.name.clone()
            } else {
                format!(
                    "{} (invalid: {})",
                    service.name,
                    validity.reason.unwrap_or_else(|| "unknown".to_string())
                )
            })
        }
        DevtimeNode::Test { test, .. } => Some(test.name.clone()),
    };
    if let Some(label) = label {
        println!("{}{}", "  ".repeat(depth.saturating_sub(1)), label);
    }
    for child in svcbuilder::tree::devtime::children(cache, node).await? {
        Box::pin(print_devtime_tree(cache, &child, depth + 1)).await?;
    }
    Ok(())
}
