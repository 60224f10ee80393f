//! Simple credential providers.

use crate::domain::CredentialError;
use crate::ports::CredentialProvider;

/// Fixed token, for tests and one-off runs.
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn access_token(&self) -> Result<String, CredentialError> {
        if self.token.is_empty() {
            return Err(CredentialError::Unauthenticated);
        }
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call, so a token
/// refreshed by an external authorization flow is picked up without restart.
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn access_token(&self) -> Result<String, CredentialError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            Ok(_) | Err(std::env::VarError::NotPresent) => Err(CredentialError::Unauthenticated),
            Err(e) => Err(CredentialError::Backend(e.to_string())),
        }
    }
}
