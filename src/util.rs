/// Build the OIDC subject claim for a Kubernetes service account.
///
/// This is the `sub` value Azure AD matches against incoming service
/// account tokens when exchanging them for access tokens.
pub fn federated_credential_subject(namespace: &str, name: &str) -> String {
    format!("system:serviceaccount:{}:{}", namespace, name)
}
