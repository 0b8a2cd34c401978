//! Per-client credential slot.

use drivekit_common::{Credential, Error, Result};

/// Holds the credential a [`DriveClient`](crate::DriveClient) authenticates with.
///
/// A single slot with last-write-wins semantics. Writing takes `&mut self`,
/// so sharing a store across tasks requires the caller to add its own
/// synchronization.
#[derive(Debug, Default)]
pub struct TokenStore {
    slot: Option<Credential>,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Some(credential),
        }
    }

    /// Replace the stored credential.
    pub fn set(&mut self, credential: Credential) {
        self.slot = Some(credential);
    }

    /// Get the stored credential.
    ///
    /// # Errors
    /// - `Unauthenticated` if nothing has been stored
    pub fn get(&self) -> Result<&Credential> {
        self.slot.as_ref().ok_or(Error::Unauthenticated)
    }

    /// Drop the stored credential.
    pub fn clear(&mut self) -> Option<Credential> {
        self.slot.take()
    }

    /// Check whether a credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.slot.is_some()
    }
}
