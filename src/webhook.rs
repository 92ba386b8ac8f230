//! Constants shared with the workload identity mutating webhook.

/// Audience the webhook injects into projected service account tokens.
/// Federated credentials must accept the same value or the token exchange
/// is rejected by Azure AD.
pub const DEFAULT_AUDIENCE: &str = "api://AzureADTokenExchange";
