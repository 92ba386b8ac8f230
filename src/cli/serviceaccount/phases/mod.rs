pub mod aad_application;
pub mod federated_identity;

pub use aad_application::AadApplicationPhase;
pub use federated_identity::FederatedIdentityPhase;
