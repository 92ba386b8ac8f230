use std::sync::{Arc, RwLock};

use crate::cloud::AzureClient;

/// Run-state handed to every phase by the workflow engine.
///
/// Phases narrow this to the capability set they need via
/// [`RunData::as_create_data`]; a `None` there is a wiring bug in the
/// engine, surfaced as a typed error by the phase rather than a panic.
pub trait RunData: Send + Sync {
    fn as_create_data(&self) -> Option<&dyn CreateData> {
        None
    }
}

/// Capabilities the service account creation phases require.
pub trait CreateData: Send + Sync {
    fn service_account_namespace(&self) -> String;
    fn service_account_name(&self) -> String;
    fn service_account_issuer_url(&self) -> String;
    fn aad_application_name(&self) -> String;
    /// Object ID of the AAD application. Empty until supplied by flag or
    /// resolved by the aad-application phase.
    fn aad_application_object_id(&self) -> String;
    fn set_aad_application_object_id(&self, object_id: String);
    fn azure_client(&self) -> Arc<dyn AzureClient>;
}

/// Concrete run-state for `wictl service-account create`, built from the
/// CLI flags. Lives for the whole workflow run.
pub struct ServiceAccountCreateData {
    service_account_namespace: String,
    service_account_name: String,
    service_account_issuer_url: String,
    aad_application_name: String,
    // Written by the aad-application phase, read by federated-identity.
    aad_application_object_id: RwLock<String>,
    azure_client: Arc<dyn AzureClient>,
}

impl ServiceAccountCreateData {
    pub fn new(
        service_account_namespace: impl Into<String>,
        service_account_name: impl Into<String>,
        service_account_issuer_url: impl Into<String>,
        aad_application_name: impl Into<String>,
        aad_application_object_id: impl Into<String>,
        azure_client: Arc<dyn AzureClient>,
    ) -> Self {
        Self {
            service_account_namespace: service_account_namespace.into(),
            service_account_name: service_account_name.into(),
            service_account_issuer_url: service_account_issuer_url.into(),
            aad_application_name: aad_application_name.into(),
            aad_application_object_id: RwLock::new(aad_application_object_id.into()),
            azure_client,
        }
    }
}

impl RunData for ServiceAccountCreateData {
    fn as_create_data(&self) -> Option<&dyn CreateData> {
        Some(self)
    }
}

impl CreateData for ServiceAccountCreateData {
    fn service_account_namespace(&self) -> String {
        self.service_account_namespace.clone()
    }

    fn service_account_name(&self) -> String {
        self.service_account_name.clone()
    }

    fn service_account_issuer_url(&self) -> String {
        self.service_account_issuer_url.clone()
    }

    fn aad_application_name(&self) -> String {
        self.aad_application_name.clone()
    }

    fn aad_application_object_id(&self) -> String {
        self.aad_application_object_id
            .read()
            .expect("object id lock poisoned")
            .clone()
    }

    fn set_aad_application_object_id(&self, object_id: String) {
        *self
            .aad_application_object_id
            .write()
            .expect("object id lock poisoned") = object_id;
    }

    fn azure_client(&self) -> Arc<dyn AzureClient> {
        Arc::clone(&self.azure_client)
    }
}
