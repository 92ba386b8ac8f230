//! Phase that registers the federated identity credential binding the
//! Kubernetes service account to the AAD application.

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::cloud::FederatedCredential;
use crate::util::federated_credential_subject;
use crate::webhook;

use super::super::data::{CreateData, RunData};
use super::super::workflow::{Phase, PhaseMetadata, WorkflowError};

pub const PHASE_NAME: &str = "federated-identity";

static METADATA: PhaseMetadata = PhaseMetadata {
    name: PHASE_NAME,
    aliases: &["fi"],
    description: "Create federated identity credential between the AAD application and the Kubernetes service account",
    flags: &[
        "service-account-namespace",
        "service-account-name",
        "service-account-issuer-url",
        "aad-application-name",
        "aad-application-object-id",
    ],
};

pub struct FederatedIdentityPhase;

fn narrow(data: &dyn RunData) -> Result<&dyn CreateData, WorkflowError> {
    data.as_create_data()
        .ok_or(WorkflowError::InvalidRunData { phase: PHASE_NAME })
}

#[async_trait]
impl Phase for FederatedIdentityPhase {
    fn metadata(&self) -> &PhaseMetadata {
        &METADATA
    }

    fn prerun(&self, data: &dyn RunData) -> Result<(), WorkflowError> {
        let data = narrow(data)?;

        if data.service_account_namespace().is_empty() {
            return Err(WorkflowError::MissingFlag {
                flag: "service-account-namespace",
            });
        }
        if data.service_account_name().is_empty() {
            return Err(WorkflowError::MissingFlag {
                flag: "service-account-name",
            });
        }
        if data.service_account_issuer_url().is_empty() {
            return Err(WorkflowError::MissingFlag {
                flag: "service-account-issuer-url",
            });
        }

        Ok(())
    }

    async fn run(&self, data: &dyn RunData) -> anyhow::Result<()> {
        let data = narrow(data)?;

        let namespace = data.service_account_namespace();
        let name = data.service_account_name();
        let subject = federated_credential_subject(&namespace, &name);
        let description = format!("Federated Service Account for {}/{}", namespace, name);
        let audiences = vec![webhook::DEFAULT_AUDIENCE.to_string()];

        // The object ID is expected to have been populated by an earlier
        // phase (or by flag); deliberately not re-validated here.
        let object_id = data.aad_application_object_id();
        let credential = FederatedCredential::new(
            object_id.as_str(),
            data.service_account_issuer_url(),
            subject.as_str(),
            description,
            audiences,
        );

        if let Err(err) = data
            .azure_client()
            .add_federated_credential(&object_id, credential)
            .await
        {
            if err.is_already_exists() {
                debug!(
                    object_id = %object_id,
                    subject = %subject,
                    "[{}] federated credential has been previously created",
                    PHASE_NAME
                );
            } else {
                return Err(err).context("failed to add federated credential");
            }
        }

        info!(
            object_id = %object_id,
            subject = %subject,
            "[{}] added federated credential",
            PHASE_NAME
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::super::data::ServiceAccountCreateData;
    use super::*;
    use crate::cloud::{Application, AzureClient, CloudError};

    struct FakeClient {
        add_result: Mutex<Option<CloudError>>,
        calls: Mutex<Vec<(String, FederatedCredential)>>,
    }

    impl FakeClient {
        fn succeeding() -> Arc<Self> {
            Self::with_result(None)
        }

        fn failing(err: CloudError) -> Arc<Self> {
            Self::with_result(Some(err))
        }

        fn with_result(err: Option<CloudError>) -> Arc<Self> {
            Arc::new(Self {
                add_result: Mutex::new(err),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, FederatedCredential)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AzureClient for FakeClient {
        async fn get_application(&self, display_name: &str) -> Result<Application, CloudError> {
            Err(CloudError::NotFound(display_name.to_string()))
        }

        async fn add_federated_credential(
            &self,
            object_id: &str,
            credential: FederatedCredential,
        ) -> Result<(), CloudError> {
            self.calls
                .lock()
                .unwrap()
                .push((object_id.to_string(), credential));
            match self.add_result.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn run_data(
        namespace: &str,
        name: &str,
        issuer_url: &str,
        object_id: &str,
        client: Arc<FakeClient>,
    ) -> ServiceAccountCreateData {
        ServiceAccountCreateData::new(namespace, name, issuer_url, "my-app", object_id, client)
    }

    struct WrongData;
    impl RunData for WrongData {}

    #[test]
    fn prerun_rejects_wrong_run_data_type() {
        let err = FederatedIdentityPhase.prerun(&WrongData).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRunData { .. }));
    }

    #[test]
    fn prerun_reports_first_missing_flag() {
        let client = FakeClient::succeeding();

        let data = run_data("", "", "", "obj-123", Arc::clone(&client));
        let err = FederatedIdentityPhase.prerun(&data).unwrap_err();
        assert_eq!(err.to_string(), "--service-account-namespace is required");

        let data = run_data("default", "", "", "obj-123", Arc::clone(&client));
        let err = FederatedIdentityPhase.prerun(&data).unwrap_err();
        assert_eq!(err.to_string(), "--service-account-name is required");

        let data = run_data("default", "my-sa", "", "obj-123", Arc::clone(&client));
        let err = FederatedIdentityPhase.prerun(&data).unwrap_err();
        assert_eq!(err.to_string(), "--service-account-issuer-url is required");
    }

    #[test]
    fn prerun_accepts_complete_inputs() {
        let client = FakeClient::succeeding();
        let data = run_data(
            "default",
            "my-sa",
            "https://issuer.example/",
            "obj-123",
            client,
        );
        assert!(FederatedIdentityPhase.prerun(&data).is_ok());
    }

    #[tokio::test]
    async fn run_sends_expected_credential() {
        let client = FakeClient::succeeding();
        let data = run_data(
            "default",
            "my-sa",
            "https://issuer.example/",
            "obj-123",
            Arc::clone(&client),
        );

        FederatedIdentityPhase.run(&data).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let (object_id, credential) = &calls[0];
        assert_eq!(object_id, "obj-123");
        assert_eq!(credential.object_id, "obj-123");
        assert_eq!(credential.issuer, "https://issuer.example/");
        assert_eq!(credential.subject, "system:serviceaccount:default:my-sa");
        assert_eq!(credential.audiences, vec![webhook::DEFAULT_AUDIENCE]);
        assert!(!credential.description.is_empty());
    }

    #[tokio::test]
    async fn run_treats_already_exists_as_success() {
        let client = FakeClient::failing(CloudError::AlreadyExists);
        let data = run_data(
            "default",
            "my-sa",
            "https://issuer.example/",
            "obj-123",
            Arc::clone(&client),
        );

        FederatedIdentityPhase.run(&data).await.unwrap();
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn run_wraps_other_client_errors() {
        let client = FakeClient::failing(CloudError::Api {
            status: 500,
            message: "InternalServerError: please retry".into(),
        });
        let data = run_data(
            "default",
            "my-sa",
            "https://issuer.example/",
            "obj-123",
            client,
        );

        let err = FederatedIdentityPhase.run(&data).await.unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("failed to add federated credential"));
        assert!(chain.contains("InternalServerError: please retry"));
    }

    #[tokio::test]
    async fn run_passes_object_id_through_unvalidated() {
        // An empty object ID still reaches the client; rejecting it is the
        // provider's job, and earlier phases normally populate it.
        let client = FakeClient::succeeding();
        let data = run_data(
            "default",
            "my-sa",
            "https://issuer.example/",
            "",
            Arc::clone(&client),
        );

        FederatedIdentityPhase.run(&data).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "");
    }
}
