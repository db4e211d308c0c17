//! Asset and party model shared by the custody ledger and the external
//! ledger collaborators.
//!
//! Custody distinguishes two escrow domains (game and vault); everything
//! else is a user account. Payments are either the chain's native
//! coin or a fungible token identified by its asset address.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Fungible asset identifier (token address / symbol).
pub type Asset = String;

/// Non-fungible collection identifier (item contract address / name).
pub type ItemClass = String;

/// The asset a payment is denominated in.
///
/// The original deployment encodes "native" as the zero address; here it is
/// an explicit variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PaymentAsset {
    /// The chain's native coin.
    Native,
    /// A fungible token.
    Token(Asset),
}

impl fmt::Display for PaymentAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token(asset) => write!(f, "token:{asset}"),
        }
    }
}

/// A payment attached to an action invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub asset: PaymentAsset,
    pub amount: u128,
}

impl Payment {
    #[must_use]
    pub fn new(asset: PaymentAsset, amount: u128) -> Self {
        Self { asset, amount }
    }

    /// Native-coin payment.
    #[must_use]
    pub fn native(amount: u128) -> Self {
        Self::new(PaymentAsset::Native, amount)
    }
}

/// One of the engine's escrow compartments.
///
/// The marketplace has no compartment of its own: a listed item stays with
/// the seller and a buy pays the seller and fee collector directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum EscrowDomain {
    /// In-game custody (token and item deposits).
    Game,
    /// Vault escrow for fee-charged transfers.
    Vault,
}

impl fmt::Display for EscrowDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Game => write!(f, "GAME"),
            Self::Vault => write!(f, "VAULT"),
        }
    }
}

/// A party that can hold assets, externally or in custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Holder {
    /// An end-user account.
    User(AccountId),
    /// The custody contract for one escrow domain.
    Escrow(EscrowDomain),
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(account) => write!(f, "user:{account}"),
            Self::Escrow(domain) => write!(f, "escrow:{domain}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_asset_display() {
        assert_eq!(format!("{}", PaymentAsset::Native), "native");
        assert_eq!(
            format!("{}", PaymentAsset::Token("RUNGEM".into())),
            "token:RUNGEM"
        );
    }

    #[test]
    fn holder_display() {
        let user = Holder::User(AccountId::from_pubkey([1u8; 32]));
        assert!(format!("{user}").starts_with("user:acct:"));
        assert_eq!(format!("{}", Holder::Escrow(EscrowDomain::Vault)), "escrow:VAULT");
    }

    #[test]
    fn holders_hash_distinctly() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Holder::Escrow(EscrowDomain::Game));
        set.insert(Holder::Escrow(EscrowDomain::Vault));
        set.insert(Holder::User(AccountId::from_pubkey([0u8; 32])));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn payment_serde_roundtrip() {
        let p = Payment::new(PaymentAsset::Token("RUNNOW".into()), 25);
        let json = serde_json::to_string(&p).unwrap();
        let back: Payment = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
