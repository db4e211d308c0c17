//! # Offer — marketplace listing state machine
//!
//! ```text
//!   ┌──────┐   buy    ┌──────┐
//!   │ OPEN ├─────────▶│ SOLD │
//!   └──┬───┘          └──────┘
//!      │ withdraw
//!      ▼
//!   ┌───────────┐
//!   │ WITHDRAWN │
//!   └───────────┘
//! ```
//!
//! Terminal states are final: nothing transitions out of SOLD or WITHDRAWN.
//! The listed item never enters escrow; it stays with the seller until a
//! buy moves it directly to the buyer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, CustodyError, ItemClass, OfferId, PaymentAsset, Result, TokenId};

/// The lifecycle state of a marketplace offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferStatus {
    /// Listed and buyable.
    Open,
    /// Bought. **Irreversible.**
    Sold,
    /// Withdrawn by the seller. **Irreversible.**
    Withdrawn,
}

impl OfferStatus {
    /// Can this offer transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Open, Self::Sold | Self::Withdrawn))
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Sold => write!(f, "SOLD"),
            Self::Withdrawn => write!(f, "WITHDRAWN"),
        }
    }
}

/// A marketplace listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub seller: AccountId,
    pub item_class: ItemClass,
    pub token_id: TokenId,
    /// Asking price in `pay_with` units.
    pub price: u128,
    pub pay_with: PaymentAsset,
    pub status: OfferStatus,
    pub listed_at: DateTime<Utc>,
}

impl Offer {
    /// Create a freshly listed offer.
    #[must_use]
    pub fn open(
        id: OfferId,
        seller: AccountId,
        item_class: ItemClass,
        token_id: TokenId,
        price: u128,
        pay_with: PaymentAsset,
    ) -> Self {
        Self {
            id,
            seller,
            item_class,
            token_id,
            price,
            pay_with,
            status: OfferStatus::Open,
            listed_at: Utc::now(),
        }
    }

    fn transition(&mut self, target: OfferStatus) -> Result<()> {
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

    /// Mark sold.
    ///
    /// # Errors
    /// Returns `InvalidStateTransition` unless the offer is OPEN.
    pub fn mark_sold(&mut self) -> Result<()> {
        self.transition(OfferStatus::Sold)
    }

    /// Mark withdrawn.
    ///
    /// # Errors
    /// Returns `InvalidStateTransition` unless the offer is OPEN.
    pub fn mark_withdrawn(&mut self) -> Result<()> {
        self.transition(OfferStatus::Withdrawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_offer() -> Offer {
        Offer::open(
            OfferId::new("123"),
            AccountId::from_pubkey([3u8; 32]),
            "box".into(),
            TokenId(1),
            100,
            PaymentAsset::Native,
        )
    }

    #[test]
    fn open_can_sell_or_withdraw() {
        assert!(OfferStatus::Open.can_transition_to(OfferStatus::Sold));
        assert!(OfferStatus::Open.can_transition_to(OfferStatus::Withdrawn));
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [OfferStatus::Sold, OfferStatus::Withdrawn] {
            assert!(!terminal.can_transition_to(OfferStatus::Open));
            assert!(!terminal.can_transition_to(OfferStatus::Sold));
            assert!(!terminal.can_transition_to(OfferStatus::Withdrawn));
        }
    }

    #[test]
    fn sell_then_withdraw_fails() {
        let mut offer = make_offer();
        offer.mark_sold().unwrap();
        let err = offer.mark_withdrawn().unwrap_err();
        assert!(matches!(err, CustodyError::InvalidStateTransition { .. }));
        assert_eq!(offer.status, OfferStatus::Sold);
    }

    #[test]
    fn withdraw_then_sell_fails() {
        let mut offer = make_offer();
        offer.mark_withdrawn().unwrap();
        assert!(offer.mark_sold().is_err());
        assert_eq!(offer.status, OfferStatus::Withdrawn);
    }

    #[test]
    fn double_sell_blocked() {
        let mut offer = make_offer();
        offer.mark_sold().unwrap();
        assert!(offer.mark_sold().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let offer = make_offer();
        let json = serde_json::to_string(&offer).unwrap();
        let back: Offer = serde_json::from_str(&json).unwrap();
        assert_eq!(offer, back);
    }
}
