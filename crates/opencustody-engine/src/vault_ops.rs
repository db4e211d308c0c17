//! Vault handlers: fee-charged escrow transfers between two named parties.
//!
//! A vault transfer escrows the item while PENDING: the origin pays the
//! voucher's fee up front and the item moves into vault custody. The
//! destination then either claims it against payment of price + fee, or
//! the origin cancels and the item returns. Both outcomes are terminal.

use opencustody_types::{
    ActionKind, ActionPayload, ActionReceipt, CustodyError, EscrowDomain, EventKind, FeeSplit,
    Holder, Payment, Result, SignedVoucher, VaultTransfer, VaultTransferStatus,
};

use crate::{
    collaborators::{FungibleLedger, ItemLedger},
    engine::{require_exact_payment, require_no_payment, CustodyEngine},
};

impl<F: FungibleLedger, N: ItemLedger> CustodyEngine<F, N> {
    /// Escrow an item in the vault for a fee-charged transfer, charging the
    /// origin the voucher's fee.
    ///
    /// # Errors
    /// `AccountBanned` if either party is banned; `InvalidStateTransition`
    /// if the transfer id already exists or the item is already escrowed;
    /// `NotHeldByHolder` if the origin does not own the item;
    /// `PaymentMismatch` / `InsufficientBalance` on fee problems.
    pub fn vault_transfer(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validate(signed, ActionKind::VaultTransfer)?;
        let ActionPayload::VaultTransfer(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "vault-transfer handler requires a VAULT_TRANSFER payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.from)?;
        self.require_allowed(&payload.to)?;
        require_exact_payment(payment, &payload.pay_with, payload.fee)?;

        if let Some(existing) = self.transfer_record(&payload.transfer_id) {
            return Err(CustodyError::InvalidStateTransition {
                entity: payload.transfer_id.to_string(),
                from: existing.status.to_string(),
                to: VaultTransferStatus::Pending.to_string(),
            });
        }
        let from = Holder::User(payload.from);
        let vault = Holder::Escrow(EscrowDomain::Vault);
        self.require_owned_by(&from, &payload.item_class, payload.token_id)?;
        self.require_not_in_custody(&payload.item_class, payload.token_id)?;
        if payload.fee > 0 {
            self.require_funds(&from, &payload.pay_with, payload.fee)?;
        }

        let treasury = Holder::User(self.treasury());
        if payload.fee > 0 {
            self.bank_mut()
                .transfer(&from, &treasury, &payload.pay_with, payload.fee)?;
        }
        self.items_mut()
            .transfer(&from, &vault, &payload.item_class, payload.token_id)?;
        // Cannot fail: absence checked above.
        self.ledger_mut()
            .deposit_item(&vault, &payload.item_class, payload.token_id)?;
        let record = VaultTransfer::pending(
            payload.transfer_id.clone(),
            payload.item_class.clone(),
            payload.token_id,
            payload.from,
            payload.to,
            payload.price,
            payload.fee,
            payload.pay_with.clone(),
        );
        self.transfers_mut()
            .insert(payload.transfer_id.clone(), record);
        self.consume(signed)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            transfer_id = %payload.transfer_id,
            from = %payload.from,
            to = %payload.to,
            item_class = %payload.item_class,
            token_id = %payload.token_id,
            fee = payload.fee,
            "item escrowed for vault transfer"
        );
        Ok(self
            .receipt(EventKind::VaultCharged, signed, payload.from)
            .with_token(payload.token_id))
    }

    /// Cancel a pending vault transfer; the item returns to the origin.
    ///
    /// # Errors
    /// `TransferNotFound` for an unknown id; `AccountBanned` if the origin is
    /// banned; `Unauthorized` if the voucher's owner is not the transfer's
    /// origin; `InvalidStateTransition` if the transfer is not pending.
    pub fn vault_cancel(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validate(signed, ActionKind::VaultCancel)?;
        let ActionPayload::VaultCancel(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "vault-cancel handler requires a VAULT_CANCEL payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.owner)?;
        require_no_payment(payment)?;

        let record = self
            .transfer_record(&payload.transfer_id)
            .ok_or_else(|| CustodyError::TransferNotFound(payload.transfer_id.clone()))?
            .clone();
        if payload.owner != record.from {
            return Err(CustodyError::Unauthorized {
                signer: payload.owner,
            });
        }
        if payload.item_class != record.item_class || payload.token_id != record.token_id {
            return Err(CustodyError::SchemaError {
                reason: format!(
                    "voucher names item {}/{}, transfer {} escrowed {}/{}",
                    payload.item_class,
                    payload.token_id,
                    record.id,
                    record.item_class,
                    record.token_id
                ),
            });
        }
        if !record.status.can_transition_to(VaultTransferStatus::Cancelled) {
            return Err(CustodyError::InvalidStateTransition {
                entity: record.id.to_string(),
                from: record.status.to_string(),
                to: VaultTransferStatus::Cancelled.to_string(),
            });
        }
        let vault = Holder::Escrow(EscrowDomain::Vault);
        let owner = Holder::User(record.from);
        self.require_in_custody(&vault, &record.item_class, record.token_id)?;
        self.require_owned_by(&vault, &record.item_class, record.token_id)?;

        self.items_mut()
            .transfer(&vault, &owner, &record.item_class, record.token_id)?;
        self.ledger_mut()
            .withdraw_item(&vault, &record.item_class, record.token_id)?;
        // Cannot fail: transition checked above.
        if let Some(entry) = self.transfers_mut().get_mut(&payload.transfer_id) {
            entry.mark_cancelled()?;
        }
        self.consume(signed)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            transfer_id = %payload.transfer_id,
            owner = %record.from,
            token_id = %record.token_id,
            "vault transfer cancelled"
        );
        Ok(self
            .receipt(EventKind::VaultCancelled, signed, record.from)
            .with_token(record.token_id))
    }

    /// Claim a pending vault transfer: the destination pays price + fee and
    /// receives the escrowed item.
    ///
    /// # Errors
    /// `TransferNotFound` for an unknown id; `AccountBanned` if either party
    /// is banned; `Unauthorized` if the voucher's parties differ from the
    /// record; `PaymentMismatch` on term or
    /// attachment mismatch; `InsufficientBalance` if the claimant cannot
    /// pay; `InvalidStateTransition` if the transfer is not pending.
    pub fn vault_claim(
        &mut self,
        signed: &SignedVoucher,
        payment: Option<&Payment>,
    ) -> Result<ActionReceipt> {
        self.validate(signed, ActionKind::VaultClaim)?;
        let ActionPayload::VaultClaim(payload) = &signed.voucher.action else {
            return Err(CustodyError::SchemaError {
                reason: "vault-claim handler requires a VAULT_CLAIM payload".into(),
            });
        };
        let payload = payload.clone();
        self.require_allowed(&payload.from)?;
        self.require_allowed(&payload.to)?;

        let record = self
            .transfer_record(&payload.transfer_id)
            .ok_or_else(|| CustodyError::TransferNotFound(payload.transfer_id.clone()))?
            .clone();
        if payload.from != record.from || payload.to != record.to {
            return Err(CustodyError::Unauthorized { signer: payload.to });
        }
        if payload.item_class != record.item_class || payload.token_id != record.token_id {
            return Err(CustodyError::SchemaError {
                reason: format!(
                    "voucher names item {}/{}, transfer {} escrowed {}/{}",
                    payload.item_class,
                    payload.token_id,
                    record.id,
                    record.item_class,
                    record.token_id
                ),
            });
        }
        if payload.price != record.price
            || payload.fee != record.fee
            || payload.pay_with != record.pay_with
        {
            return Err(CustodyError::PaymentMismatch {
                reason: format!(
                    "voucher terms {} + {} of {} do not match transfer terms {} + {} of {}",
                    payload.price,
                    payload.fee,
                    payload.pay_with,
                    record.price,
                    record.fee,
                    record.pay_with
                ),
            });
        }
        if !record.status.can_transition_to(VaultTransferStatus::Claimed) {
            return Err(CustodyError::InvalidStateTransition {
                entity: record.id.to_string(),
                from: record.status.to_string(),
                to: VaultTransferStatus::Claimed.to_string(),
            });
        }
        let total = record.price.checked_add(record.fee).ok_or_else(|| {
            CustodyError::Internal(format!("price + fee overflows for {}", record.id))
        })?;
        require_exact_payment(payment, &record.pay_with, total)?;

        let claimant = Holder::User(record.to);
        let origin = Holder::User(record.from);
        let vault = Holder::Escrow(EscrowDomain::Vault);
        if total > 0 {
            self.require_funds(&claimant, &record.pay_with, total)?;
        }
        self.require_in_custody(&vault, &record.item_class, record.token_id)?;
        self.require_owned_by(&vault, &record.item_class, record.token_id)?;

        let treasury = Holder::User(self.treasury());
        if record.price > 0 {
            self.bank_mut()
                .transfer(&claimant, &origin, &record.pay_with, record.price)?;
        }
        if record.fee > 0 {
            self.bank_mut()
                .transfer(&claimant, &treasury, &record.pay_with, record.fee)?;
        }
        self.items_mut()
            .transfer(&vault, &claimant, &record.item_class, record.token_id)?;
        self.ledger_mut()
            .withdraw_item(&vault, &record.item_class, record.token_id)?;
        // Cannot fail: transition checked above.
        if let Some(entry) = self.transfers_mut().get_mut(&payload.transfer_id) {
            entry.mark_claimed()?;
        }
        self.consume(signed)?;

        tracing::info!(
            voucher_id = %signed.voucher.id,
            transfer_id = %payload.transfer_id,
            claimant = %record.to,
            origin = %record.from,
            token_id = %record.token_id,
            price = record.price,
            fee = record.fee,
            "vault transfer claimed"
        );
        Ok(self
            .receipt(EventKind::VaultClaimed, signed, record.to)
            .with_token(record.token_id)
            .with_fee_split(FeeSplit {
                collector_share: record.fee,
                seller_share: record.price,
            }))
    }
}
