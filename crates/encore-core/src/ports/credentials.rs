//! Credential provider port.
//!
//! Injected at startup; the publisher asks it for a token before every
//! delivery. An unauthenticated state is an explicit error kind, not a
//! sentinel boolean, so callers can route it to the re-authorization flow.

use crate::domain::CredentialError;

pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> Result<String, CredentialError>;
}
