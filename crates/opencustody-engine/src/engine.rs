//! The custody engine — eleven voucher-gated action handlers over one state.
//!
//! Every handler follows the same sequence:
//!
//! 1. validate the signed voucher (kind, signature, authority, replay)
//! 2. run every fallible precondition check against current state
//! 3. apply the mutations (pre-checked, so they cannot fail midway)
//! 4. consume the nonce
//! 5. emit a structured log event and return the receipt
//!
//! A failure at any point leaves the custody ledger, the offer and
//! vault-transfer tables, the external ledgers, and the nonce registry
//! exactly as before the call: the voucher is consumed iff the entire
//! action commits.
//!
//! This file owns the engine state plus the mint/game-custody handlers;
//! the marketplace handlers live in `market` and the vault handlers in
//! `vault_ops`.

use std::collections::HashMap;

use opencustody_gate::{NonceRegistry, VoucherValidator};
use opencustody_types::{
    AccountId, ActionKind, ActionPayload, ActionReceipt, CustodyError, DeploymentContext,
    EscrowDomain, EventKind, FeeConfig, Holder, ItemClass, Offer, OfferId, Payment, PaymentAsset,
    Result, SignedVoucher, TokenId, TransferId, VaultTransfer,
};

use crate::{
    banlist::BanRegistry,
    collaborators::{FungibleLedger, ItemLedger},
    ledger::CustodyLedger,
};

/// The voucher-gated custody engine.
///
/// Owns all custody state and drives the two external ledger collaborators.
/// Strictly serialized: every handler takes `&mut self` and runs to
/// completion with no suspension point; a multi-threaded host wraps the
/// engine in its own mutual exclusion.
pub struct CustodyEngine<F: FungibleLedger, N: ItemLedger> {
    validator: VoucherValidator,
    nonces: NonceRegistry,
    bans: BanRegistry,
    ledger: CustodyLedger,
    offers: HashMap<OfferId, Offer>,
    transfers: HashMap<TransferId, VaultTransfer>,
    fees: FeeConfig,
    /// Receives redeem payments and vault fees.
    treasury: AccountId,
    bank: F,
    items: N,
}

impl<F: FungibleLedger, N: ItemLedger> CustodyEngine<F, N> {
    /// Create an engine over the given deployment and collaborators.
    pub fn new(
        ctx: DeploymentContext,
        fees: FeeConfig,
        treasury: AccountId,
        bank: F,
        items: N,
    ) -> Self {
        Self {
            validator: VoucherValidator::new(ctx),
            nonces: NonceRegistry::new(),
            bans: BanRegistry::new(),
            ledger: CustodyLedger::new(),
            offers: HashMap::new(),
            transfers: HashMap::new(),
            fees,
            treasury,
            bank,
            items,
        }
    }

    // =================================================================
    // Accessors
    // =================================================================

    #[must_use]
    pub fn context(&self) -> &DeploymentContext {
        self.validator.context()
    }

    #[must_use]
    pub fn ledger(&self) -> &CustodyLedger {
        &self.ledger
    }

    #[must_use]
    pub fn bank(&self) -> &F {
        &self.bank
    }

    #[must_use]
    pub fn items(&self) -> &N {
        &self.items
    }

    #[must_use]
    pub fn fees(&self) -> &FeeConfig {
        &self.fees
    }

    #[must_use]
    pub fn offer_record(&self, id: &OfferId) -> Option<&Offer> {
        self.offers.get(id)
    }

    #[must_use]
    pub fn transfer_record(&self, id: &TransferId) -> Option<&VaultTransfer> {
        self.transfers.get(id)
    }

    #[must_use]
    pub fn consumed_vouchers(&self) -> usize {
        self.nonces.len()
    }

    // =================================================================
    // Ban administration
    // =================================================================

    /// Ban an account from all custody actions.
    pub fn ban_account(&mut self, account: AccountId) {
        self.bans.ban(account);
        tracing::info!(account = %account, "account banned");
    }

    /// Lift a ban, returning whether the account was banned.
    pub fn lift_ban(&mut self, account: &AccountId) -> bool {
        let lifted = self.bans.lift(account);
        if lifted {
            tracing::info!(account = %account, "ban lifted");
        }
        lifted
    }

    #[must_use]
    pub fn is_banned(&self, account: &AccountId) -> bool {
        self.bans.is_banned(account)
    }

    // =================================================================
    // Mint
    // =================================================================

    /// Mint an item to the voucher's receiver, charging the payer the
    /// voucher's price when it is non-zero.
    ///
    /// # Errors
    /// Voucher errors per the validator; `AccountBanned` if the payer or
    /// receiver is banned; `PaymentMismatch` if the attachment does not match
    /// the price (or is present on a free mint); `InsufficientBalance` if the
    /// payer cannot cover the price.
    pub fn redeem(
        &mut self,
        signed: &SignedVoucher,
        payer: AccountId,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validator
            .validate(signed, ActionKind::Redeem, &self.nonces)?;
        let ActionPayload::Redeem(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "redeem handler requires a REDEEM payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payer)?;
        self.require_allowed(&payload.receiver)?;

        require_exact_payment(payment, &payload.pay_with, payload.price)?;
        if payload.price > 0 {
            self.require_funds(&Holder::User(payer), &payload.pay_with, payload.price)?;
        }

        if payload.price > 0 {
            self.bank.transfer(
                &Holder::User(payer),
                &Holder::User(self.treasury),
                &payload.pay_with,
                payload.price,
            )?;
        }
        let token_id = self
            .items
            .mint(&Holder::User(payload.receiver), &payload.item_class);
        self.nonces.consume(&signed.voucher.id)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            receiver = %payload.receiver,
            item_class = %payload.item_class,
            token_id = %token_id,
            price = payload.price,
            "item redeemed"
        );
        Ok(self
            .receipt(EventKind::Redeem, signed, payload.receiver)
            .with_token(token_id))
    }

    // =================================================================
    // Game custody: fungible tokens
    // =================================================================

    /// Move fungible tokens from the voucher's depositor into game custody.
    pub fn deposit_token(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validator
            .validate(signed, ActionKind::DepositToken, &self.nonces)?;
        let ActionPayload::DepositToken(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "deposit-token handler requires a DEPOSIT_TOKEN payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.depositor)?;
        require_no_payment(payment)?;
        if payload.amount == 0 {
            return Err(CustodyError::AmountMustBePositive);
        }

        let asset = PaymentAsset::Token(payload.asset.clone());
        let depositor = Holder::User(payload.depositor);
        let game = Holder::Escrow(EscrowDomain::Game);
        self.require_funds(&depositor, &asset, payload.amount)?;

        self.bank.transfer(&depositor, &game, &asset, payload.amount)?;
        self.ledger.deposit_fungible(&game, &asset, payload.amount)?;
        self.nonces.consume(&signed.voucher.id)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            depositor = %payload.depositor,
            asset = %asset,
            amount = payload.amount,
            "tokens deposited into game custody"
        );
        Ok(self.receipt(EventKind::DepositToken, signed, payload.depositor))
    }

    /// Move fungible tokens from game custody to the voucher's withdrawer.
    pub fn withdraw_token(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validator
            .validate(signed, ActionKind::WithdrawToken, &self.nonces)?;
        let ActionPayload::WithdrawToken(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "withdraw-token handler requires a WITHDRAW_TOKEN payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.withdrawer)?;
        require_no_payment(payment)?;
        if payload.amount == 0 {
            return Err(CustodyError::AmountMustBePositive);
        }

        let asset = PaymentAsset::Token(payload.asset.clone());
        let game = Holder::Escrow(EscrowDomain::Game);
        let held = self.ledger.balance(&game, &asset);
        if held < payload.amount {
            return Err(CustodyError::InsufficientBalance {
                needed: payload.amount,
                available: held,
            });
        }

        self.bank.transfer(
            &game,
            &Holder::User(payload.withdrawer),
            &asset,
            payload.amount,
        )?;
        // Cannot fail: custody balance checked above.
        self.ledger.withdraw_fungible(&game, &asset, payload.amount)?;
        self.nonces.consume(&signed.voucher.id)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            withdrawer = %payload.withdrawer,
            asset = %asset,
            amount = payload.amount,
            "tokens withdrawn from game custody"
        );
        Ok(self.receipt(EventKind::WithdrawToken, signed, payload.withdrawer))
    }

    // =================================================================
    // Game custody: items
    // =================================================================

    /// Move an item from the voucher's depositor into game custody.
    pub fn deposit_item(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validator
            .validate(signed, ActionKind::DepositItem, &self.nonces)?;
        let ActionPayload::DepositItem(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "deposit-item handler requires a DEPOSIT_ITEM payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.depositor)?;
        require_no_payment(payment)?;

        let depositor = Holder::User(payload.depositor);
        let game = Holder::Escrow(EscrowDomain::Game);
        self.require_owned_by(&depositor, &payload.item_class, payload.token_id)?;
        self.require_not_in_custody(&payload.item_class, payload.token_id)?;

        self.items
            .transfer(&depositor, &game, &payload.item_class, payload.token_id)?;
        // Cannot fail: absence checked above.
        self.ledger
            .deposit_item(&game, &payload.item_class, payload.token_id)?;
        self.nonces.consume(&signed.voucher.id)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            depositor = %payload.depositor,
            item_class = %payload.item_class,
            token_id = %payload.token_id,
            "item deposited into game custody"
        );
        Ok(self
            .receipt(EventKind::DepositItem, signed, payload.depositor)
            .with_token(payload.token_id))
    }

    /// Move an item from game custody to the voucher's withdrawer.
    pub fn withdraw_item(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validator
            .validate(signed, ActionKind::WithdrawItem, &self.nonces)?;
        let ActionPayload::WithdrawItem(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "withdraw-item handler requires a WITHDRAW_ITEM payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.withdrawer)?;
        require_no_payment(payment)?;

        let game = Holder::Escrow(EscrowDomain::Game);
        self.require_in_custody(&game, &payload.item_class, payload.token_id)?;
        self.require_owned_by(&game, &payload.item_class, payload.token_id)?;

        self.items.transfer(
            &game,
            &Holder::User(payload.withdrawer),
            &payload.item_class,
            payload.token_id,
        )?;
        self.ledger
            .withdraw_item(&game, &payload.item_class, payload.token_id)?;
        self.nonces.consume(&signed.voucher.id)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            withdrawer = %payload.withdrawer,
            item_class = %payload.item_class,
            token_id = %payload.token_id,
            "item withdrawn from game custody"
        );
        Ok(self
            .receipt(EventKind::WithdrawItem, signed, payload.withdrawer)
            .with_token(payload.token_id))
    }

    // =================================================================
    // Shared internals (also used by the market and vault handlers)
    // =================================================================

    pub(crate) fn receipt(
        &self,
        event: EventKind,
        signed: &SignedVoucher,
        actor: AccountId,
    ) -> ActionReceipt {
        ActionReceipt::new(
            event,
            signed.voucher.id.clone(),
            signed.voucher.digest(self.validator.context()),
            actor,
        )
    }

    pub(crate) fn validate(&self, signed: &SignedVoucher, expected: ActionKind) -> Result<()> {
        self.validator.validate(signed, expected, &self.nonces)
    }

    pub(crate) fn consume(&mut self, signed: &SignedVoucher) -> Result<()> {
        self.nonces.consume(&signed.voucher.id)
    }

    pub(crate) fn treasury(&self) -> AccountId {
        self.treasury
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut CustodyLedger {
        &mut self.ledger
    }

    pub(crate) fn bank_mut(&mut self) -> &mut F {
        &mut self.bank
    }

    pub(crate) fn items_mut(&mut self) -> &mut N {
        &mut self.items
    }

    pub(crate) fn offers_mut(&mut self) -> &mut HashMap<OfferId, Offer> {
        &mut self.offers
    }

    pub(crate) fn transfers_mut(&mut self) -> &mut HashMap<TransferId, VaultTransfer> {
        &mut self.transfers
    }

    /// No account the action names may be banned.
    pub(crate) fn require_allowed(&self, account: &AccountId) -> Result<()> {
        self.bans.require_allowed(account)
    }

    /// External balance must cover `amount`.
    pub(crate) fn require_funds(
        &self,
        holder: &Holder,
        asset: &PaymentAsset,
        amount: u128,
    ) -> Result<()> {
        let available = self.bank.balance_of(holder, asset);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// External item ledger must record `holder` as the owner.
    pub(crate) fn require_owned_by(
        &self,
        holder: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        match self.items.owner_of(item_class, token_id) {
            Some(owner) if owner == *holder => Ok(()),
            _ => Err(CustodyError::NotHeldByHolder {
                holder: *holder,
                item_class: item_class.clone(),
                token_id,
            }),
        }
    }

    /// Custody ledger must record `holder` as the item's custodian.
    pub(crate) fn require_in_custody(
        &self,
        holder: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        match self.ledger.item_holder(item_class, token_id) {
            Some(current) if current == *holder => Ok(()),
            _ => Err(CustodyError::NotHeldByHolder {
                holder: *holder,
                item_class: item_class.clone(),
                token_id,
            }),
        }
    }

    /// Custody ledger must not track the item at all.
    pub(crate) fn require_not_in_custody(
        &self,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        if let Some(current) = self.ledger.item_holder(item_class, token_id) {
            return Err(CustodyError::InvalidStateTransition {
                entity: format!("item {item_class}/{token_id}"),
                from: format!("held by {current}"),
                to: "escrowed".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payment attachment policy
// ---------------------------------------------------------------------------

/// The action takes no payment; an attachment is a caller error.
pub(crate) fn require_no_payment(payment: Option<&Payment>) -> Result<()> {
    match payment {
        None => Ok(()),
        Some(p) => Err(CustodyError::PaymentMismatch {
            reason: format!("no payment expected, got {} of {}", p.amount, p.asset),
        }),
    }
}

/// The action requires exactly `amount` of `asset` attached; a zero amount
/// means no attachment at all.
pub(crate) fn require_exact_payment(
    payment: Option<&Payment>,
    asset: &PaymentAsset,
    amount: u128,
) -> Result<()> {
    if amount == 0 {
        return require_no_payment(payment);
    }
    match payment {
        Some(p) if p.asset == *asset && p.amount == amount => Ok(()),
        Some(p) => Err(CustodyError::PaymentMismatch {
            reason: format!(
                "required {amount} of {asset}, got {} of {}",
                p.amount, p.asset
            ),
        }),
        None => Err(CustodyError::PaymentMismatch {
            reason: format!("required {amount} of {asset}, got none"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_payment_policy() {
        assert!(require_no_payment(None).is_ok());
        let err = require_no_payment(Some(&Payment::native(1))).unwrap_err();
        assert!(matches!(err, CustodyError::PaymentMismatch { .. }));
    }

    #[test]
    fn exact_payment_policy() {
        let native_100 = Payment::native(100);
        assert!(require_exact_payment(Some(&native_100), &PaymentAsset::Native, 100).is_ok());

        // Wrong amount.
        let err =
            require_exact_payment(Some(&native_100), &PaymentAsset::Native, 99).unwrap_err();
        assert!(matches!(err, CustodyError::PaymentMismatch { .. }));

        // Wrong asset.
        let token = PaymentAsset::Token("RUNGEM".into());
        let err = require_exact_payment(Some(&native_100), &token, 100).unwrap_err();
        assert!(matches!(err, CustodyError::PaymentMismatch { .. }));

        // Missing attachment.
        let err = require_exact_payment(None, &PaymentAsset::Native, 100).unwrap_err();
        assert!(matches!(err, CustodyError::PaymentMismatch { .. }));
    }

    #[test]
    fn zero_amount_means_no_attachment() {
        assert!(require_exact_payment(None, &PaymentAsset::Native, 0).is_ok());
        let err =
            require_exact_payment(Some(&Payment::native(0)), &PaymentAsset::Native, 0).unwrap_err();
        assert!(matches!(err, CustodyError::PaymentMismatch { .. }));
    }
}
