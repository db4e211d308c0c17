//! Marketplace handlers: offer, buy, withdraw-offer.
//!
//! The marketplace uses an approval model: a listed item never enters
//! escrow. It stays with the seller until a buy moves it directly to the
//! buyer, so withdrawing an offer only flips its status.
//!
//! Offers are keyed by the listing voucher's id, which the buy and
//! withdraw vouchers reference as `offer_id`.

use opencustody_types::{
    AccountId, ActionKind, ActionPayload, ActionReceipt, CustodyError, EventKind, Holder, Offer,
    OfferId, OfferStatus, Payment, Result, SignedVoucher,
};

use crate::{
    collaborators::{FungibleLedger, ItemLedger},
    engine::{require_exact_payment, require_no_payment, CustodyEngine},
};

impl<F: FungibleLedger, N: ItemLedger> CustodyEngine<F, N> {
    /// List an item for sale at the voucher's price terms.
    ///
    /// # Errors
    /// `AccountBanned` if the seller is banned; `AmountMustBePositive` for a
    /// zero price; `NotHeldByHolder` if the seller does not own the item;
    /// `InvalidStateTransition` if the offer id already exists.
    pub fn offer(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validate(signed, ActionKind::Offer)?;
        let ActionPayload::Offer(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "offer handler requires an OFFER payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.seller)?;
        require_no_payment(payment)?;
        if payload.price == 0 {
            return Err(CustodyError::AmountMustBePositive);
        }

        let offer_id = OfferId::new(signed.voucher.id.as_str());
        if let Some(existing) = self.offer_record(&offer_id) {
            return Err(CustodyError::InvalidStateTransition {
                entity: offer_id.to_string(),
                from: existing.status.to_string(),
                to: OfferStatus::Open.to_string(),
            });
        }
        self.require_owned_by(
            &Holder::User(payload.seller),
            &payload.item_class,
            payload.token_id,
        )?;

        let offer = Offer::open(
            offer_id.clone(),
            payload.seller,
            payload.item_class.clone(),
            payload.token_id,
            payload.price,
            payload.pay_with.clone(),
        );
        self.offers_mut().insert(offer_id.clone(), offer);
        self.consume(signed)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            offer_id = %offer_id,
            seller = %payload.seller,
            item_class = %payload.item_class,
            token_id = %payload.token_id,
            price = payload.price,
            "offer listed"
        );
        Ok(self
            .receipt(EventKind::Offer, signed, payload.seller)
            .with_token(payload.token_id))
    }

    /// Buy an open offer at its exact price terms.
    ///
    /// The price is fee-split: the collector share goes to the fee
    /// collector, the remainder to the seller, and the item moves directly
    /// seller → buyer.
    ///
    /// # Errors
    /// `OfferNotFound` / `InvalidStateTransition` for a missing or non-open
    /// offer; `AccountBanned` if the buyer or the listed seller is banned;
    /// `PaymentMismatch` if the voucher terms or the attachment differ from
    /// the offer; `InsufficientBalance` if the buyer cannot pay;
    /// `NotHeldByHolder` if the seller no longer owns the item.
    pub fn buy(
        &mut self,
        signed: &SignedVoucher,
        buyer: AccountId,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validate(signed, ActionKind::Buy)?;
        let ActionPayload::Buy(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "buy handler requires a BUY payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&buyer)?;

        let offer = self
            .offer_record(&payload.offer_id)
            .ok_or_else(|| CustodyError::OfferNotFound(payload.offer_id.clone()))?
            .clone();
        self.require_allowed(&offer.seller)?;
        if !offer.status.can_transition_to(OfferStatus::Sold) {
            return Err(CustodyError::InvalidStateTransition {
                entity: offer.id.to_string(),
                from: offer.status.to_string(),
                to: OfferStatus::Sold.to_string(),
            });
        }
        if payload.pay_with != offer.pay_with || payload.amount != offer.price {
            return Err(CustodyError::PaymentMismatch {
                reason: format!(
                    "voucher terms {} of {} do not match offer terms {} of {}",
                    payload.amount, payload.pay_with, offer.price, offer.pay_with
                ),
            });
        }
        require_exact_payment(payment, &offer.pay_with, offer.price)?;

        let buyer_holder = Holder::User(buyer);
        let seller_holder = Holder::User(offer.seller);
        self.require_funds(&buyer_holder, &offer.pay_with, offer.price)?;
        self.require_owned_by(&seller_holder, &offer.item_class, offer.token_id)?;

        let split = self.fees().split(offer.price);
        let collector = Holder::User(self.fees().collector);
        if split.collector_share > 0 {
            self.bank_mut().transfer(
                &buyer_holder,
                &collector,
                &offer.pay_with,
                split.collector_share,
            )?;
        }
        if split.seller_share > 0 {
            self.bank_mut().transfer(
                &buyer_holder,
                &seller_holder,
                &offer.pay_with,
                split.seller_share,
            )?;
        }
        self.items_mut().transfer(
            &seller_holder,
            &buyer_holder,
            &offer.item_class,
            offer.token_id,
        )?;
        // Cannot fail: transition checked above.
        if let Some(record) = self.offers_mut().get_mut(&payload.offer_id) {
            record.mark_sold()?;
        }
        self.consume(signed)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            offer_id = %offer.id,
            buyer = %buyer,
            seller = %offer.seller,
            price = offer.price,
            collector_share = split.collector_share,
            seller_share = split.seller_share,
            "offer bought"
        );
        Ok(self
            .receipt(EventKind::Buy, signed, buyer)
            .with_token(offer.token_id)
            .with_fee_split(split))
    }

    /// Withdraw an open offer. The item never moved, so only the status
    /// flips.
    ///
    /// # Errors
    /// `OfferNotFound` for a missing offer; `Unauthorized` if the voucher's
    /// seller is not the listed seller; `InvalidStateTransition` if the
    /// offer is not open.
    pub fn withdraw_offer(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validate(signed, ActionKind::WithdrawOffer)?;
        let ActionPayload::WithdrawOffer(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "withdraw-offer handler requires a WITHDRAW_OFFER payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.seller)?;
        require_no_payment(payment)?;

        let offer = self
            .offer_record(&payload.offer_id)
            .ok_or_else(|| CustodyError::OfferNotFound(payload.offer_id.clone()))?;
        if payload.seller != offer.seller {
            return Err(CustodyError::Unauthorized {
                signer: payload.seller,
            });
        }

        // The only mutation besides the nonce; fails cleanly if not open.
        if let Some(record) = self.offers_mut().get_mut(&payload.offer_id) {
            record.mark_withdrawn()?;
        }
        self.consume(signed)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            offer_id = %payload.offer_id,
            seller = %payload.seller,
            "offer withdrawn"
        );
        Ok(self.receipt(EventKind::WithdrawOffer, signed, payload.seller))
    }
}
