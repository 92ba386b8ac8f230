//! Minimal sequential phase engine for the service account workflow.
//!
//! Phases register in order; `execute` runs every prerun first (fail fast
//! on configuration errors before any network call), then every run.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::data::RunData;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The engine handed a phase a run-state that does not expose the
    /// capabilities the phase needs. Integration bug, not user error.
    #[error("invalid run data type for phase {phase}")]
    InvalidRunData { phase: &'static str },

    /// A required CLI flag was left empty.
    #[error("--{flag} is required")]
    MissingFlag { flag: &'static str },
}

/// Static description of a phase: how it is named on the command line and
/// which flags it consumes.
pub struct PhaseMetadata {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub flags: &'static [&'static str],
}

impl PhaseMetadata {
    fn matches(&self, needle: &str) -> bool {
        self.name == needle || self.aliases.contains(&needle)
    }
}

#[async_trait]
pub trait Phase: Send + Sync {
    fn metadata(&self) -> &PhaseMetadata;

    /// Validate inputs. Must not perform network calls or mutate state.
    fn prerun(&self, data: &dyn RunData) -> Result<(), WorkflowError>;

    /// Perform the phase's work. Only called after every selected phase's
    /// prerun succeeded.
    async fn run(&self, data: &dyn RunData) -> anyhow::Result<()>;
}

pub struct Workflow {
    phases: Vec<Box<dyn Phase>>,
}

impl Workflow {
    pub fn new() -> Self {
        Self { phases: Vec::new() }
    }

    pub fn register(&mut self, phase: Box<dyn Phase>) {
        self.phases.push(phase);
    }

    /// Run the workflow. Phases whose name or alias appears in
    /// `skip_phases` are dropped entirely (neither prerun nor run fires).
    pub async fn execute(&self, data: &dyn RunData, skip_phases: &[String]) -> anyhow::Result<()> {
        let mut selected = Vec::new();
        for phase in &self.phases {
            let meta = phase.metadata();
            if skip_phases.iter().any(|s| meta.matches(s)) {
                debug!(phase = meta.name, "skipping phase");
                continue;
            }
            selected.push(phase);
        }

        for phase in &selected {
            phase.prerun(data)?;
        }

        for phase in &selected {
            debug!(phase = phase.metadata().name, "running phase");
            phase.run(data).await?;
        }

        Ok(())
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}
