//! Backend client façade.
//!
//! Two logical surfaces over the same transport: build operations
//! (register/connect, token refresh, bind/gen, deploy/undeploy) in
//! [`build`], and inspection operations (list/read remote state, clean) in
//! [`inspect`]. Both are stateless wrappers — the only side effect of any
//! method is the network call itself.

mod build;
mod inspect;

use crate::model::VersionDescriptor;
use crate::session::SessionState;
use crate::transport::{RequestConfig, Transport};
use crate::uri::strip_workspace;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub struct BuilderClient {
    transport: Transport,
    session: Arc<SessionState>,
}

impl BuilderClient {
    pub fn new(transport: Transport, session: Arc<SessionState>) -> Self {
        Self { transport, session }
    }

    /// Request config for authenticated backend calls: base URL and bearer
    /// token read through from the current workspace connection.
    fn backend_config(&self) -> Result<RequestConfig> {
        let connection = self.session.current()?;
        Ok(RequestConfig::new(connection.builder_endpoint)
            .with_bearer(connection.token.map(|t| t.token)))
    }

    /// Request config for the pre-connection `/builder/*` calls, which are
    /// addressed to an explicit endpoint and carry no bearer token.
    fn endpoint_config(endpoint: &str) -> RequestConfig {
        RequestConfig::new(endpoint)
    }

    /// Remote path segment for a fully qualified local URI.
    fn remote_path(uri: &str) -> String {
        strip_workspace(uri).to_string()
    }
}

/// The subset of remote operations the lifecycle layer consumes.
///
/// Seam for tests: a recording fake can assert deploy/undeploy ordering
/// without a live backend.
#[async_trait]
pub trait RemoteBuilder: Send + Sync {
    async fn get_versions(&self, endpoint: &str) -> Result<VersionDescriptor>;

    async fn deploy_application(&self, uri: &str, archive: Vec<u8>) -> Result<()>;
    async fn deploy_module(&self, uri: &str, archive: Vec<u8>) -> Result<()>;
    async fn deploy_service(&self, uri: &str, archive: Vec<u8>) -> Result<()>;

    async fn undeploy_application(&self, uri: &str) -> Result<()>;
    async fn undeploy_module(&self, uri: &str) -> Result<()>;
    async fn undeploy_service(&self, uri: &str) -> Result<()>;
}

#[async_trait]
impl RemoteBuilder for BuilderClient {
    async fn get_versions(&self, endpoint: &str) -> Result<VersionDescriptor> {
        BuilderClient::get_versions(self, endpoint).await
    }

    async fn deploy_application(&self, uri: &str, archive: Vec<u8>) -> Result<()> {
        BuilderClient::deploy_application(self, uri, archive).await
    }

    async fn deploy_module(&self, uri: &str, archive: Vec<u8>) -> Result<()> {
        BuilderClient::deploy_module(self, uri, archive).await
    }

    async fn deploy_service(&self, uri: &str, archive: Vec<u8>) -> Result<()> {
        BuilderClient::deploy_service(self, uri, archive).await
    }

    async fn undeploy_application(&self, uri: &str) -> Result<()> {
        BuilderClient::undeploy_application(self, uri).await
    }

    async fn undeploy_module(&self, uri: &str) -> Result<()> {
        BuilderClient::undeploy_module(self, uri).await
    }

    async fn undeploy_service(&self, uri: &str) -> Result<()> {
        BuilderClient::undeploy_service(self, uri).await
    }
}
