pub mod data;
pub mod phases;
pub mod workflow;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::config::Config;
use crate::cloud::GraphClient;

use data::ServiceAccountCreateData;
use phases::{AadApplicationPhase, FederatedIdentityPhase};
use workflow::Workflow;

/// Environment variable consulted when --access-token is not given.
const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Namespace of the Kubernetes service account
    #[arg(long, default_value = "")]
    pub service_account_namespace: String,

    /// Name of the Kubernetes service account
    #[arg(long, default_value = "")]
    pub service_account_name: String,

    /// OIDC issuer URL of the cluster the service account tokens come from
    #[arg(long, default_value = "")]
    pub service_account_issuer_url: String,

    /// Display name of the AAD application to federate with
    #[arg(long, default_value = "")]
    pub aad_application_name: String,

    /// Object ID of the AAD application (skips the lookup phase's work)
    #[arg(long, default_value = "")]
    pub aad_application_object_id: String,

    /// Phases to skip, by name or alias (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip_phases: Vec<String>,

    /// Microsoft Graph access token; falls back to AZURE_ACCESS_TOKEN
    #[arg(long)]
    pub access_token: Option<String>,
}

/// Run the `service-account create` workflow: resolve the AAD application,
/// then register the federated identity credential.
pub async fn handle_create(config: &Config, args: CreateArgs) -> Result<()> {
    let access_token = args
        .access_token
        .clone()
        .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
        .with_context(|| {
            format!("no Graph access token; pass --access-token or set {ACCESS_TOKEN_ENV}")
        })?;

    let client = GraphClient::with_endpoint(config.get_graph_endpoint(), access_token)
        .context("failed to build Graph client")?;

    let data = ServiceAccountCreateData::new(
        args.service_account_namespace,
        args.service_account_name,
        args.service_account_issuer_url,
        args.aad_application_name,
        args.aad_application_object_id,
        Arc::new(client),
    );

    let mut workflow = Workflow::new();
    workflow.register(Box::new(AadApplicationPhase));
    workflow.register(Box::new(FederatedIdentityPhase));

    workflow.execute(&data, &args.skip_phases).await
}
