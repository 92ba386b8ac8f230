//! Phase that resolves the target AAD application's object ID.
//!
//! When `--aad-application-object-id` is given the phase is a no-op;
//! otherwise it looks the application up by display name and stores the
//! object ID on the run-state for the phases that follow. It never
//! creates applications.

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};

use super::super::data::{CreateData, RunData};
use super::super::workflow::{Phase, PhaseMetadata, WorkflowError};

pub const PHASE_NAME: &str = "aad-application";

static METADATA: PhaseMetadata = PhaseMetadata {
    name: PHASE_NAME,
    aliases: &["app"],
    description: "Resolve the AAD application the federated credential will be attached to",
    flags: &["aad-application-name", "aad-application-object-id"],
};

pub struct AadApplicationPhase;

fn narrow(data: &dyn RunData) -> Result<&dyn CreateData, WorkflowError> {
    data.as_create_data()
        .ok_or(WorkflowError::InvalidRunData { phase: PHASE_NAME })
}

#[async_trait]
impl Phase for AadApplicationPhase {
    fn metadata(&self) -> &PhaseMetadata {
        &METADATA
    }

    fn prerun(&self, data: &dyn RunData) -> Result<(), WorkflowError> {
        let data = narrow(data)?;

        if data.aad_application_object_id().is_empty() && data.aad_application_name().is_empty() {
            return Err(WorkflowError::MissingFlag {
                flag: "aad-application-name",
            });
        }

        Ok(())
    }

    async fn run(&self, data: &dyn RunData) -> anyhow::Result<()> {
        let data = narrow(data)?;

        let object_id = data.aad_application_object_id();
        if !object_id.is_empty() {
            debug!(
                object_id = %object_id,
                "[{}] object id supplied, skipping lookup",
                PHASE_NAME
            );
            return Ok(());
        }

        let display_name = data.aad_application_name();
        let application = data
            .azure_client()
            .get_application(&display_name)
            .await
            .context("failed to resolve AAD application")?;

        info!(
            object_id = %application.id,
            app_id = %application.app_id,
            display_name = %display_name,
            "[{}] resolved AAD application",
            PHASE_NAME
        );
        data.set_aad_application_object_id(application.id);

        Ok(())
    }
}
