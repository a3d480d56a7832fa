//! # Azure Authentication
//!
//! Credential selection for Azure Resource Manager calls.

use crate::config::AzureConfig;
use crate::constants::ARM_SCOPE;
use crate::error::{Error, Result};
use anyhow::Context;
use azure_core::credentials::{TokenCredential, TokenRequestOptions};
use azure_identity::{ManagedIdentityCredential, WorkloadIdentityCredential};
use std::sync::Arc;
use tracing::info;

/// Create an ARM credential
///
/// Workload identity is used when a client id is configured (the federated token file and
/// tenant come from the standard `AZURE_*` variables injected by the webhook); otherwise the
/// node's managed identity is used.
///
/// # Errors
///
/// Fails when the selected credential cannot be constructed.
pub fn create_credential(config: &AzureConfig) -> anyhow::Result<Arc<dyn TokenCredential>> {
    let credential: Arc<dyn TokenCredential> = match &config.client_id {
        Some(client_id) => {
            info!(
                "Using Azure Workload Identity authentication with client ID: {}",
                client_id
            );
            let options = azure_identity::WorkloadIdentityCredentialOptions {
                client_id: Some(client_id.clone()),
                ..Default::default()
            };
            WorkloadIdentityCredential::new(Some(options))
                .context("Failed to create WorkloadIdentityCredential")?
        }
        None => {
            info!("No client ID configured, using Managed Identity");
            ManagedIdentityCredential::new(None)
                .context("Failed to create ManagedIdentityCredential")?
        }
    };

    Ok(credential)
}

/// Get an access token for Azure Resource Manager
pub async fn get_token(credential: &Arc<dyn TokenCredential>) -> Result<String> {
    let options = Some(TokenRequestOptions::default());
    let token_response = credential
        .get_token(&[ARM_SCOPE], options)
        .await
        .map_err(|e| Error::transport("acquire management token", e))?;
    Ok(token_response.token.secret().to_string())
}
