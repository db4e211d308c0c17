//! Globally unique identifiers used throughout OpenCustody.
//!
//! `AccountId` is a raw ed25519 public key; the string-keyed identifiers
//! (`VoucherId`, `OfferId`, `TransferId`) are opaque values chosen by the
//! voucher issuer, and `TokenId` is the sequential id of a minted item.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of a party (user, trusted authority, fee collector, treasury).
/// This is the raw ed25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<&ed25519_dalek::VerifyingKey> for AccountId {
    fn from(key: &ed25519_dalek::VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", hex::encode(&self.0[..8]))
    }
}

/// Arbitrary account bytes for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }
}

// ---------------------------------------------------------------------------
// VoucherId
// ---------------------------------------------------------------------------

/// Opaque voucher identifier, unique per issuance across all action kinds.
///
/// This is the nonce of the replay protocol: once consumed, any later voucher
/// bearing the same id is rejected regardless of its other fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct VoucherId(pub String);

impl VoucherId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Freshly issued random id (UUIDv4, matching the backend issuer).
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoucherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voucher:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// Unique id of a minted item within its item class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OfferId
// ---------------------------------------------------------------------------

/// Key of a marketplace offer, supplied by the offer voucher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl OfferId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offer:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TransferId
// ---------------------------------------------------------------------------

/// Key of a vault transfer, supplied by the charge-fee-transfer voucher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TransferId(pub String);

impl TransferId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
