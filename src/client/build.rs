//! Workspace/build operations: register, connect, token refresh, data-source
//! testing, bind/gen calls, and deploy/undeploy at application, module, and
//! service granularity.

use super::BuilderClient;
use crate::model::{DataSourceDef, TestOutcome, VersionDescriptor};
use crate::session::{Token, WorkspaceConnection};
use crate::snapshot::{APPLICATION_DEPLOY_TIMEOUT, MODULE_DEPLOY_TIMEOUT, SERVICE_DEPLOY_TIMEOUT};
use anyhow::{Context as _, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

impl BuilderClient {
    // ─── Workspace registration ───────────────────────────────────────────────

    /// Register a brand-new workspace on the backend at `endpoint`.
    pub async fn register(&self, endpoint: &str) -> Result<WorkspaceConnection> {
        let config = Self::endpoint_config(endpoint);
        let body = self
            .transport
            .post("/builder/register", &Value::Null, &config)
            .await
            .context("workspace registration failed")?;
        let connection: WorkspaceConnection =
            serde_json::from_value(body).context("malformed workspace descriptor")?;
        info!(workspace = %connection.name, "registered new workspace");
        Ok(connection)
    }

    /// Connect to an existing workspace. The backend echoes the access key
    /// back in the returned descriptor.
    pub async fn connect(
        &self,
        endpoint: &str,
        workspace_url: &str,
        access_key: &str,
    ) -> Result<WorkspaceConnection> {
        let config = Self::endpoint_config(endpoint);
        let body = self
            .transport
            .post(
                "/builder/connect",
                &json!({ "workspaceUrl": workspace_url, "accessKey": access_key }),
                &config,
            )
            .await
            .context("workspace connect failed")?;
        let mut connection: WorkspaceConnection =
            serde_json::from_value(body).context("malformed workspace descriptor")?;
        if connection.access_key.is_empty() {
            connection.access_key = access_key.to_string();
        }
        info!(workspace = %connection.name, "connected to workspace");
        Ok(connection)
    }

    pub async fn refresh_token(
        &self,
        endpoint: &str,
        workspace_name: &str,
        access_key: &str,
    ) -> Result<Token> {
        let config = Self::endpoint_config(endpoint);
        let body = self
            .transport
            .post(
                "/builder/refreshToken",
                &json!({ "workspaceName": workspace_name, "accessKey": access_key }),
                &config,
            )
            .await
            .context("token refresh failed")?;
        serde_json::from_value(body).context("malformed token")
    }

    pub async fn get_versions(&self, endpoint: &str) -> Result<VersionDescriptor> {
        let config = Self::endpoint_config(endpoint);
        let body = self
            .transport
            .get("/builder/getVersions", &config)
            .await
            .context("version query failed")?;
        serde_json::from_value(body).context("malformed version descriptor")
    }

    // ─── Data sources ─────────────────────────────────────────────────────────

    /// Probe a data-source definition against the backend.
    ///
    /// A failing probe is a normal structured result — only transport
    /// failures surface as errors.
    pub async fn test_data_source(&self, def: &DataSourceDef) -> Result<TestOutcome> {
        let config = self.backend_config()?;
        let body = self
            .transport
            .post("/test/dataSource", &serde_json::to_value(def)?, &config)
            .await?;
        serde_json::from_value(body).context("malformed test outcome")
    }

    pub async fn deploy_data_source(&self, def: &DataSourceDef) -> Result<()> {
        let config = self.backend_config()?;
        self.transport
            .post("/deploy/dataSource", &serde_json::to_value(def)?, &config)
            .await?;
        Ok(())
    }

    pub async fn get_table_list(&self, data_source: &str) -> Result<Value> {
        let config = self.backend_config()?;
        Ok(self
            .transport
            .post(
                "/sql/getTableList",
                &json!({ "dataSource": data_source }),
                &config,
            )
            .await?)
    }

    // ─── Bind (schema inference) ──────────────────────────────────────────────

    pub async fn bind_query(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/bind/query", payload).await
    }

    pub async fn bind_sql(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/bind/sql", payload).await
    }

    pub async fn bind_crud_query(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/bind/crudQuery", payload).await
    }

    pub async fn bind_crud_table(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/bind/crudTable", payload).await
    }

    // ─── Gen (code generation) ────────────────────────────────────────────────

    pub async fn gen_query_input_output(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/gen/queryInputOutput", payload).await
    }

    pub async fn gen_sql_input_output(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/gen/sqlInputOutput", payload).await
    }

    pub async fn gen_crud_object(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/gen/crudObject", payload).await
    }

    pub async fn gen_cruds(&self, payload: &Value) -> Result<Value> {
        self.bind_or_gen("/gen/cruds", payload).await
    }

    async fn bind_or_gen(&self, path: &str, payload: &Value) -> Result<Value> {
        let config = self.backend_config()?;
        Ok(self.transport.post(path, payload, &config).await?)
    }

    // ─── Deploy / undeploy ────────────────────────────────────────────────────

    pub async fn deploy_application(&self, uri: &str, archive: Vec<u8>) -> Result<()> {
        self.deploy("/deploy/application", uri, archive, APPLICATION_DEPLOY_TIMEOUT)
            .await
    }

    pub async fn deploy_module(&self, uri: &str, archive: Vec<u8>) -> Result<()> {
        self.deploy("/deploy/module", uri, archive, MODULE_DEPLOY_TIMEOUT)
            .await
    }

    pub async fn deploy_service(&self, uri: &str, archive: Vec<u8>) -> Result<()> {
        self.deploy("/deploy/service", uri, archive, SERVICE_DEPLOY_TIMEOUT)
            .await
    }

    async fn deploy(
        &self,
        path: &str,
        uri: &str,
        archive: Vec<u8>,
        timeout: Duration,
    ) -> Result<()> {
        let config = self.backend_config()?;
        let fields = [("uri", Self::remote_path(uri))];
        self.transport
            .post_archive(path, &fields, archive, timeout, &config)
            .await?;
        info!(uri, "deployed");
        Ok(())
    }

    pub async fn undeploy_application(&self, uri: &str) -> Result<()> {
        self.undeploy("/deploy/undeployApplication", uri).await
    }

    pub async fn undeploy_module(&self, uri: &str) -> Result<()> {
        self.undeploy("/deploy/undeployModule", uri).await
    }

    pub async fn undeploy_service(&self, uri: &str) -> Result<()> {
        self.undeploy("/deploy/undeployService", uri).await
    }

    async fn undeploy(&self, path: &str, uri: &str) -> Result<()> {
        let config = self.backend_config()?;
        self.transport
            .post(path, &json!({ "uri": Self::remote_path(uri) }), &config)
            .await?;
        info!(uri, "undeployed");
        Ok(())
    }
}
