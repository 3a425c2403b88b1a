//! Inspection operations: read-only projections of remote workspace state,
//! plus the clean operations that discard it.

use super::BuilderClient;
use crate::model::{RemoteApplication, RemoteDataSource, RemoteService, RemoteTest};
use anyhow::{Context as _, Result};
use serde_json::json;
use tracing::info;

impl BuilderClient {
    pub async fn get_data_sources(&self) -> Result<Vec<RemoteDataSource>> {
        let config = self.backend_config()?;
        let body = self.transport.get("/inspect/dataSources", &config).await?;
        serde_json::from_value(body).context("malformed data source list")
    }

    pub async fn get_data_source(&self, name: &str) -> Result<RemoteDataSource> {
        let config = self.backend_config()?;
        let body = self
            .transport
            .get(&format!("/inspect/dataSource/{name}"), &config)
            .await?;
        serde_json::from_value(body).context("malformed data source")
    }

    pub async fn get_applications(&self) -> Result<Vec<RemoteApplication>> {
        let config = self.backend_config()?;
        let body = self.transport.get("/inspect/applications", &config).await?;
        serde_json::from_value(body).context("malformed application list")
    }

    /// The full application aggregate: modules, services, and tests.
    pub async fn get_application_aggregate(&self, app_uri: &str) -> Result<RemoteApplication> {
        let config = self.backend_config()?;
        let body = self
            .transport
            .get(
                &format!("/inspect/application/{}", Self::remote_path(app_uri)),
                &config,
            )
            .await?;
        serde_json::from_value(body).context("malformed application aggregate")
    }

    pub async fn get_service(&self, service_uri: &str) -> Result<RemoteService> {
        let config = self.backend_config()?;
        let body = self
            .transport
            .get(
                &format!("/inspect/service/{}", Self::remote_path(service_uri)),
                &config,
            )
            .await?;
        serde_json::from_value(body).context("malformed service")
    }

    pub async fn get_tests(&self, service_uri: &str) -> Result<Vec<RemoteTest>> {
        let config = self.backend_config()?;
        let body = self
            .transport
            .get(
                &format!("/inspect/tests/{}", Self::remote_path(service_uri)),
                &config,
            )
            .await?;
        serde_json::from_value(body).context("malformed test list")
    }

    pub async fn get_data_source_for_application(
        &self,
        app_uri: &str,
    ) -> Result<RemoteDataSource> {
        let config = self.backend_config()?;
        let body = self
            .transport
            .get(
                &format!(
                    "/inspect/dataSourceForApplication/{}",
                    Self::remote_path(app_uri)
                ),
                &config,
            )
            .await?;
        serde_json::from_value(body).context("malformed data source")
    }

    // ─── Clean ────────────────────────────────────────────────────────────────
    //
    // The remote call only; cascading the local mirror delete is the
    // caller's job (see devtime).

    pub async fn clean_data_source(&self, name: &str) -> Result<()> {
        let config = self.backend_config()?;
        self.transport
            .post("/inspect/cleanDataSource", &json!({ "name": name }), &config)
            .await?;
        info!(name, "cleaned remote data source");
        Ok(())
    }

    pub async fn clean_application(&self, app_uri: &str) -> Result<()> {
        let config = self.backend_config()?;
        self.transport
            .post(
                "/inspect/cleanApplication",
                &json!({ "uri": Self::remote_path(app_uri) }),
                &config,
            )
            .await?;
        info!(uri = app_uri, "cleaned remote application");
        Ok(())
    }

    pub async fn clean_workspace(&self) -> Result<()> {
        let config = self.backend_config()?;
        self.transport
            .post("/inspect/cleanWorkspace", &serde_json::Value::Null, &config)
            .await?;
        info!("cleaned remote workspace");
        Ok(())
    }
}
