//! # Remote Collaborator Traits
//!
//! Seams between the remote-call client and the outside world: the transport
//! that reaches the generation service and the provider of short-lived
//! credentials.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;

use crate::resilience::RawFailure;

/// Short-lived authorization credential
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
}

impl Credential {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

// Tokens never reach log output
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Supplies a fresh credential for every attempt
///
/// `None` means no valid session exists. The remote-call client treats that
/// as terminal and never retries it.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credential(&self) -> Option<Credential>;
}

/// Delivers one operation to the remote service
///
/// Implementations report every failure as a [`RawFailure`] and leave
/// classification to the caller. Deadlines are enforced by the caller too, so
/// a transport may take arbitrarily long.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn invoke(
        &self,
        operation: &str,
        payload: &Value,
        credential: &Credential,
    ) -> Result<Value, RawFailure>;

    /// Transport name for logging
    fn transport_name(&self) -> &'static str {
        "remote"
    }
}

/// Credential provider backed by a replaceable in-memory session
#[derive(Debug, Default)]
pub struct StaticCredentialProvider {
    session: RwLock<Option<Credential>>,
}

impl StaticCredentialProvider {
    pub fn new(credential: Credential) -> Self {
        Self {
            session: RwLock::new(Some(credential)),
        }
    }

    /// Provider with no session
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, credential: Credential) {
        *self.session.write() = Some(credential);
    }

    pub fn sign_out(&self) {
        *self.session.write() = None;
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credential(&self) -> Option<Credential> {
        self.session.read().clone()
    }
}
