//! Data-source operations: probe, deploy, and the password masking that
//! follows a successful probe.

use crate::client::BuilderClient;
use crate::model::{DataSourceDef, TestOutcome};
use crate::session::SessionState;
use anyhow::{Context as _, Result};
use std::path::Path;
use tracing::info;

/// The value written into a data-source file's password field once the
/// plaintext has been moved to the secret store.
pub const PASSWORD_MASK: &str = "******";

/// The remote URI a data-source file's credential is keyed by.
fn credential_uri(workspace: &str, path: &Path) -> String {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{workspace}/{file}")
}

/// Probe a data-source definition file against the backend.
///
/// On `succeed == true` the plaintext password moves into the secret store
/// and the on-disk field is masked. On any failure — a negative probe
/// result or a transport error — the file is left untouched.
pub async fn test(
    client: &BuilderClient,
    session: &SessionState,
    workspace: &str,
    path: &Path,
) -> Result<TestOutcome> {
    let mut def = DataSourceDef::load(path).await?;
    if def.password == PASSWORD_MASK {
        if let Some(stored) = session.get_ds_password(&credential_uri(workspace, path))? {
            def.password = stored;
        }
    }

    let outcome = client.test_data_source(&def).await?;
    if outcome.succeed && def.password != PASSWORD_MASK {
        session.put_ds_password(&credential_uri(workspace, path), &def.password)?;
        let mut masked = def.clone();
        masked.password = PASSWORD_MASK.to_string();
        masked
            .save(path)
            .await
            .with_context(|| format!("cannot mask password in {}", path.display()))?;
        info!(path = %path.display(), "data source verified, password moved to secret store");
    }
    Ok(outcome)
}

/// Deploy a data-source definition, substituting the stored plaintext
/// password when the file carries the mask.
pub async fn deploy(
    client: &BuilderClient,
    session: &SessionState,
    workspace: &str,
    path: &Path,
) -> Result<()> {
    let mut def = DataSourceDef::load(path).await?;
    if def.password == PASSWORD_MASK {
        if let Some(stored) = session.get_ds_password(&credential_uri(workspace, path))? {
            def.password = stored;
        }
    }
    client.deploy_data_source(&def).await?;
    info!(path = %path.display(), "data source deployed");
    Ok(())
}
