//! Action receipts — the audit record every successful handler emits.
//!
//! A receipt carries the event kind, the consumed voucher's id and
//! domain-bound digest, the acting party, and any values the handler
//! computed (minted token id, fee split).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, FeeSplit, TokenId, VoucherId};

/// The event a successful action emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Redeem,
    DepositToken,
    WithdrawToken,
    DepositItem,
    WithdrawItem,
    Offer,
    Buy,
    WithdrawOffer,
    /// A vault transfer was fee-charged and escrowed.
    VaultCharged,
    VaultCancelled,
    VaultClaimed,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redeem => write!(f, "REDEEM_EVENT"),
            Self::DepositToken => write!(f, "DEPOSIT_TOKEN_EVENT"),
            Self::WithdrawToken => write!(f, "WITHDRAW_TOKEN_EVENT"),
            Self::DepositItem => write!(f, "DEPOSIT_ITEM_EVENT"),
            Self::WithdrawItem => write!(f, "WITHDRAW_ITEM_EVENT"),
            Self::Offer => write!(f, "OFFER_EVENT"),
            Self::Buy => write!(f, "BUY_EVENT"),
            Self::WithdrawOffer => write!(f, "WITHDRAW_EVENT"),
            Self::VaultCharged => write!(f, "VAULT_CHARGED_EVENT"),
            Self::VaultCancelled => write!(f, "VAULT_CANCELLED_EVENT"),
            Self::VaultClaimed => write!(f, "VAULT_CLAIMED_EVENT"),
        }
    }
}

/// Result record of one fully applied action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    /// What happened.
    pub event: EventKind,
    /// The voucher consumed by this action.
    pub voucher_id: VoucherId,
    /// SHA-256 of the voucher's domain-bound signing payload.
    pub voucher_digest: [u8; 32],
    /// The party the action was performed for.
    pub actor: AccountId,
    /// The item touched, where applicable (mint, deposit, buy, ...).
    pub token_id: Option<TokenId>,
    /// Fee split applied, where a priced payment was involved.
    pub fee_split: Option<FeeSplit>,
    /// When the action committed.
    pub issued_at: DateTime<Utc>,
}

impl ActionReceipt {
    #[must_use]
    pub fn new(
        event: EventKind,
        voucher_id: VoucherId,
        voucher_digest: [u8; 32],
        actor: AccountId,
    ) -> Self {
        Self {
            event,
            voucher_id,
            voucher_digest,
            actor,
            token_id: None,
            fee_split: None,
            issued_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token_id: TokenId) -> Self {
        self.token_id = Some(token_id);
        self
    }

    #[must_use]
    pub fn with_fee_split(mut self, split: FeeSplit) -> Self {
        self.fee_split = Some(split);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_display() {
        assert_eq!(format!("{}", EventKind::Redeem), "REDEEM_EVENT");
        assert_eq!(format!("{}", EventKind::WithdrawOffer), "WITHDRAW_EVENT");
        assert_eq!(format!("{}", EventKind::VaultCharged), "VAULT_CHARGED_EVENT");
    }

    #[test]
    fn builder_attaches_computed_values() {
        let receipt = ActionReceipt::new(
            EventKind::Buy,
            VoucherId::new("n-1"),
            [0u8; 32],
            AccountId::from_pubkey([1u8; 32]),
        )
        .with_token(TokenId(4))
        .with_fee_split(FeeSplit {
            collector_share: 5,
            seller_share: 95,
        });

        assert_eq!(receipt.token_id, Some(TokenId(4)));
        assert_eq!(receipt.fee_split.unwrap().collector_share, 5);
    }

    #[test]
    fn serde_roundtrip() {
        let receipt = ActionReceipt::new(
            EventKind::DepositToken,
            VoucherId::random(),
            [7u8; 32],
            AccountId::from_pubkey([2u8; 32]),
        );
        let json = serde_json::to_string(&receipt).unwrap();
        let back: ActionReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(receipt, back);
    }
}
