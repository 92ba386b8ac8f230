//! Azure AD client abstraction.
//!
//! The phases only depend on the [`AzureClient`] trait so tests can swap in
//! a fake; [`GraphClient`] is the Microsoft Graph implementation.

mod graph;

pub use graph::{GraphClient, DEFAULT_GRAPH_ENDPOINT};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Federated identity credential descriptor, assembled per invocation and
/// sent to the provider. Never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    /// Object ID of the AAD application the credential is attached to.
    pub object_id: String,
    /// OIDC issuer URL of the Kubernetes cluster.
    pub issuer: String,
    /// Subject claim to match against incoming tokens.
    pub subject: String,
    pub description: String,
    /// Accepted audience values. Always a single entry in practice.
    pub audiences: Vec<String>,
}

impl FederatedCredential {
    pub fn new(
        object_id: impl Into<String>,
        issuer: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
        audiences: Vec<String>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            issuer: issuer.into(),
            subject: subject.into(),
            description: description.into(),
            audiences,
        }
    }
}

/// AAD application as returned by the Graph applications endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    /// Object ID (not the client/app ID).
    pub id: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("federated credential already exists")]
    AlreadyExists,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("graph api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

impl CloudError {
    /// True when the provider reported the resource as a duplicate. The
    /// caller treats this as a success path.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, CloudError::AlreadyExists)
    }
}

/// Mutating operations the service account workflow performs against
/// Azure AD.
#[async_trait]
pub trait AzureClient: Send + Sync {
    /// Look up an AAD application by display name.
    async fn get_application(&self, display_name: &str) -> Result<Application, CloudError>;

    /// Register a federated identity credential on the application
    /// identified by `object_id`. Dropping the returned future cancels the
    /// underlying request.
    async fn add_federated_credential(
        &self,
        object_id: &str,
        credential: FederatedCredential,
    ) -> Result<(), CloudError>;
}
