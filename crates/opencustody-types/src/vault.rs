//! # VaultTransfer — fee-charged escrow transfer state machine
//!
//! ```text
//!   ┌─────────┐  claim by `to`   ┌─────────┐
//!   │ PENDING ├─────────────────▶│ CLAIMED │
//!   └────┬────┘                  └─────────┘
//!        │ cancel by `from`
//!        ▼
//!   ┌───────────┐
//!   │ CANCELLED │
//!   └───────────┘
//! ```
//!
//! While a transfer is PENDING the item sits in vault escrow. CLAIMED and
//! CANCELLED are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, CustodyError, ItemClass, PaymentAsset, Result, TokenId, TransferId};

/// The lifecycle state of a vault transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaultTransferStatus {
    /// The item is escrowed, waiting for the destination party to claim.
    Pending,
    /// Claimed by the destination against payment. **Irreversible.**
    Claimed,
    /// Cancelled by the origin; the item went back. **Irreversible.**
    Cancelled,
}

impl VaultTransferStatus {
    /// Can this transfer transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Claimed | Self::Cancelled)
        )
    }
}

impl std::fmt::Display for VaultTransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Claimed => write!(f, "CLAIMED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// An item held in vault escrow for transfer from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultTransfer {
    pub id: TransferId,
    pub item_class: ItemClass,
    pub token_id: TokenId,
    pub from: AccountId,
    pub to: AccountId,
    /// Amount the claimant pays to `from`.
    pub price: u128,
    /// Amount the claimant pays to the treasury on top of the price.
    pub fee: u128,
    pub pay_with: PaymentAsset,
    pub status: VaultTransferStatus,
    pub created_at: DateTime<Utc>,
}

impl VaultTransfer {
    /// Create a freshly escrowed pending transfer.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        id: TransferId,
        item_class: ItemClass,
        token_id: TokenId,
        from: AccountId,
        to: AccountId,
        price: u128,
        fee: u128,
        pay_with: PaymentAsset,
    ) -> Self {
        Self {
            id,
            item_class,
            token_id,
            from,
            to,
            price,
            fee,
            pay_with,
            status: VaultTransferStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn transition(&mut self, target: VaultTransferStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(CustodyError::InvalidStateTransition {
                entity: self.id.to_string(),
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Mark claimed.
    ///
    /// # Errors
    /// Returns `InvalidStateTransition` unless the transfer is PENDING.
    pub fn mark_claimed(&mut self) -> Result<()> {
        self.transition(VaultTransferStatus::Claimed)
    }

    /// Mark cancelled.
    ///
    /// # Errors
    /// Returns `InvalidStateTransition` unless the transfer is PENDING.
    pub fn mark_cancelled(&mut self) -> Result<()> {
        self.transition(VaultTransferStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_transfer() -> VaultTransfer {
        VaultTransfer::pending(
            TransferId::new("t-1"),
            "box".into(),
            TokenId(1),
            AccountId::from_pubkey([1u8; 32]),
            AccountId::from_pubkey([2u8; 32]),
            1_000,
            10,
            PaymentAsset::Native,
        )
    }

    #[test]
    fn pending_can_claim_or_cancel() {
        assert!(VaultTransferStatus::Pending.can_transition_to(VaultTransferStatus::Claimed));
        assert!(VaultTransferStatus::Pending.can_transition_to(VaultTransferStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [VaultTransferStatus::Claimed, VaultTransferStatus::Cancelled] {
            assert!(!terminal.can_transition_to(VaultTransferStatus::Pending));
            assert!(!terminal.can_transition_to(VaultTransferStatus::Claimed));
            assert!(!terminal.can_transition_to(VaultTransferStatus::Cancelled));
        }
    }

    #[test]
    fn cancel_then_claim_fails() {
        let mut transfer = make_transfer();
        transfer.mark_cancelled().unwrap();
        let err = transfer.mark_claimed().unwrap_err();
        assert!(matches!(err, CustodyError::InvalidStateTransition { .. }));
        assert_eq!(transfer.status, VaultTransferStatus::Cancelled);
    }

    #[test]
    fn claim_then_cancel_fails() {
        let mut transfer = make_transfer();
        transfer.mark_claimed().unwrap();
        assert!(transfer.mark_cancelled().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let transfer = make_transfer();
        let json = serde_json::to_string(&transfer).unwrap();
        let back: VaultTransfer = serde_json::from_str(&json).unwrap();
        assert_eq!(transfer, back);
    }
}
