use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Application, AzureClient, CloudError, FederatedCredential};

pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

/// Microsoft Graph implementation of [`AzureClient`].
///
/// Authenticates with a caller-supplied bearer token; acquiring the token
/// (device flow, managed identity, az CLI) is outside this tool's scope.
pub struct GraphClient {
    http: Client,
    endpoint: String,
    access_token: String,
}

#[derive(Debug, Serialize)]
struct AddFederatedCredentialRequest<'a> {
    name: &'a str,
    issuer: &'a str,
    subject: &'a str,
    description: &'a str,
    audiences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ApplicationListResponse {
    value: Vec<Application>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    code: String,
    message: String,
}

impl GraphClient {
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, CloudError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;

        let endpoint: String = endpoint.into();
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Map a non-success Graph response to our error taxonomy.
    ///
    /// Duplicate credentials surface as 409, or as 400 with an
    /// "already exists" message on some API versions; both are the
    /// idempotent-conflict case.
    fn classify_error(status: u16, body: &str) -> CloudError {
        let message = match serde_json::from_str::<GraphErrorBody>(body) {
            Ok(parsed) => format!("{}: {}", parsed.error.code, parsed.error.message),
            Err(_) => body.to_string(),
        };

        match status {
            409 => CloudError::AlreadyExists,
            400 if message.contains("already exists") => CloudError::AlreadyExists,
            401 | 403 => CloudError::Unauthorized(message),
            404 => CloudError::NotFound(message),
            _ => CloudError::Api { status, message },
        }
    }

    /// Graph credential names only allow letters, digits, '-' and '_'.
    /// Derive one from the subject so repeated runs target the same record.
    fn credential_name(subject: &str) -> String {
        subject
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }

    /// OData filter for an exact display name match, with single quotes
    /// escaped per the OData string literal rules.
    fn display_name_filter(display_name: &str) -> String {
        format!("displayName eq '{}'", display_name.replace('\'', "''"))
    }
}

#[async_trait]
impl AzureClient for GraphClient {
    async fn get_application(&self, display_name: &str) -> Result<Application, CloudError> {
        let url = format!("{}/applications", self.endpoint);
        let filter = Self::display_name_filter(display_name);

        let response = self
            .http
            .get(&url)
            .query(&[("$filter", filter.as_str())])
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::classify_error(status.as_u16(), &body));
        }

        let list: ApplicationListResponse = serde_json::from_str(&body).map_err(|e| {
            CloudError::Api {
                status: status.as_u16(),
                message: format!("failed to parse application list: {}", e),
            }
        })?;

        list.value.into_iter().next().ok_or_else(|| {
            CloudError::NotFound(format!("application '{}' not found", display_name))
        })
    }

    async fn add_federated_credential(
        &self,
        object_id: &str,
        credential: FederatedCredential,
    ) -> Result<(), CloudError> {
        let url = format!(
            "{}/applications/{}/federatedIdentityCredentials",
            self.endpoint, object_id
        );
        let name = Self::credential_name(&credential.subject);
        let request = AddFederatedCredentialRequest {
            name: &name,
            issuer: &credential.issuer,
            subject: &credential.subject,
            description: &credential.description,
            audiences: &credential.audiences,
        };

        debug!(
            object_id = %object_id,
            subject = %credential.subject,
            "adding federated credential"
        );

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&request)
            .send()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;
        Err(Self::classify_error(status.as_u16(), &body))
    }
}
