//! External ledger collaborators.
//!
//! The engine never owns the real token or item ledgers; it drives them
//! through these traits. Implementations must be synchronous and
//! all-or-nothing: a `transfer` either fully applies or returns an error
//! having changed nothing. The party type is [`Holder`], so the engine's
//! escrow compartments can hold external balances and items themselves.
//!
//! [`InMemoryBank`] and [`InMemoryItems`] are the reference implementations
//! used by the tests and by embedders that keep everything in-process.

use std::collections::HashMap;

use opencustody_types::{
    CustodyError, Holder, ItemClass, PaymentAsset, Result, TokenId,
};

/// The external fungible-token ledger.
pub trait FungibleLedger {
    /// Current balance of a holder in one asset.
    fn balance_of(&self, holder: &Holder, asset: &PaymentAsset) -> u128;

    /// Move `amount` of `asset` between holders. All-or-nothing.
    fn transfer(
        &mut self,
        from: &Holder,
        to: &Holder,
        asset: &PaymentAsset,
        amount: u128,
    ) -> Result<()>;
}

/// The external item (non-fungible) ledger.
pub trait ItemLedger {
    /// Current owner of an item, if it exists.
    fn owner_of(&self, item_class: &ItemClass, token_id: TokenId) -> Option<Holder>;

    /// Move one item between holders. All-or-nothing.
    fn transfer(
        &mut self,
        from: &Holder,
        to: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()>;

    /// Mint a fresh item of `item_class` to `to`, returning its new id.
    fn mint(&mut self, to: &Holder, item_class: &ItemClass) -> TokenId;
}

// ---------------------------------------------------------------------------
// In-memory reference implementations
// ---------------------------------------------------------------------------

/// In-memory fungible ledger.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    balances: HashMap<(Holder, PaymentAsset), u128>,
}

impl InMemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a holder's balance directly (test/bootstrap convenience).
    /// Saturates at `u128::MAX`.
    pub fn credit(&mut self, holder: &Holder, asset: &PaymentAsset, amount: u128) {
        let entry = self.balances.entry((*holder, asset.clone())).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

impl FungibleLedger for InMemoryBank {
    fn balance_of(&self, holder: &Holder, asset: &PaymentAsset) -> u128 {
        self.balances
            .get(&(*holder, asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &Holder,
        to: &Holder,
        asset: &PaymentAsset,
        amount: u128,
    ) -> Result<()> {
        if amount == 0 {
            return Err(CustodyError::AmountMustBePositive);
        }
        let available = self.balance_of(from, asset);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        // A self-transfer nets to zero, so only a distinct recipient can
        // overflow. Checked before either entry is touched.
        let recipient = if from == to {
            available - amount
        } else {
            self.balance_of(to, asset)
        };
        let updated = recipient.checked_add(amount).ok_or_else(|| {
            CustodyError::Internal(format!("balance overflow for {to}/{asset}"))
        })?;
        self.balances.insert((*from, asset.clone()), available - amount);
        self.balances.insert((*to, asset.clone()), updated);
        Ok(())
    }
}

/// In-memory item ledger with sequential token ids.
#[derive(Debug, Default)]
pub struct InMemoryItems {
    owners: HashMap<(ItemClass, TokenId), Holder>,
    next_token_id: u64,
}

impl InMemoryItems {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemLedger for InMemoryItems {
    fn owner_of(&self, item_class: &ItemClass, token_id: TokenId) -> Option<Holder> {
        self.owners.get(&(item_class.clone(), token_id)).copied()
    }

    fn transfer(
        &mut self,
        from: &Holder,
        to: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        match self.owner_of(item_class, token_id) {
            Some(owner) if owner == *from => {
                self.owners.insert((item_class.clone(), token_id), *to);
                Ok(())
            }
            _ => Err(CustodyError::NotHeldByHolder {
                holder: *from,
                item_class: item_class.clone(),
                token_id,
            }),
        }
    }

    fn mint(&mut self, to: &Holder, item_class: &ItemClass) -> TokenId {
        let token_id = TokenId(self.next_token_id);
        self.next_token_id += 1;
        self.owners.insert((item_class.clone(), token_id), *to);
        token_id
    }
}

#[cfg(test)]
mod tests {
    use opencustody_types::{AccountId, EscrowDomain};

    use super::*;

    #[test]
    fn bank_transfer_moves_funds() {
        let mut bank = InMemoryBank::new();
        let alice = Holder::User(AccountId::random());
        let game = Holder::Escrow(EscrowDomain::Game);
        bank.credit(&alice, &PaymentAsset::Native, 1000);

        bank.transfer(&alice, &game, &PaymentAsset::Native, 300)
            .unwrap();
        assert_eq!(bank.balance_of(&alice, &PaymentAsset::Native), 700);
        assert_eq!(bank.balance_of(&game, &PaymentAsset::Native), 300);
    }

    #[test]
    fn bank_transfer_insufficient_changes_nothing() {
        let mut bank = InMemoryBank::new();
        let alice = Holder::User(AccountId::random());
        let bob = Holder::User(AccountId::random());
        bank.credit(&alice, &PaymentAsset::Native, 100);

        let err = bank
            .transfer(&alice, &bob, &PaymentAsset::Native, 200)
            .unwrap_err();
        assert!(matches!(err, CustodyError::InsufficientBalance { .. }));
        assert_eq!(bank.balance_of(&alice, &PaymentAsset::Native), 100);
        assert_eq!(bank.balance_of(&bob, &PaymentAsset::Native), 0);
    }

    #[test]
    fn bank_rejects_zero_transfer() {
        let mut bank = InMemoryBank::new();
        let alice = Holder::User(AccountId::random());
        let bob = Holder::User(AccountId::random());
        let err = bank
            .transfer(&alice, &bob, &PaymentAsset::Native, 0)
            .unwrap_err();
        assert!(matches!(err, CustodyError::AmountMustBePositive));
    }

    #[test]
    fn bank_transfer_into_full_recipient_changes_nothing() {
        let mut bank = InMemoryBank::new();
        let alice = Holder::User(AccountId::random());
        let bob = Holder::User(AccountId::random());
        bank.credit(&alice, &PaymentAsset::Native, 100);
        bank.credit(&bob, &PaymentAsset::Native, u128::MAX);

        let err = bank
            .transfer(&alice, &bob, &PaymentAsset::Native, 1)
            .unwrap_err();
        assert!(matches!(err, CustodyError::Internal(_)));
        assert_eq!(bank.balance_of(&alice, &PaymentAsset::Native), 100);
        assert_eq!(bank.balance_of(&bob, &PaymentAsset::Native), u128::MAX);
    }

    #[test]
    fn bank_self_transfer_is_a_net_noop() {
        let mut bank = InMemoryBank::new();
        let alice = Holder::User(AccountId::random());
        bank.credit(&alice, &PaymentAsset::Native, u128::MAX);

        bank.transfer(&alice, &alice, &PaymentAsset::Native, u128::MAX)
            .unwrap();
        assert_eq!(bank.balance_of(&alice, &PaymentAsset::Native), u128::MAX);
    }

    #[test]
    fn bank_credit_saturates_at_max() {
        let mut bank = InMemoryBank::new();
        let alice = Holder::User(AccountId::random());
        bank.credit(&alice, &PaymentAsset::Native, u128::MAX);
        bank.credit(&alice, &PaymentAsset::Native, 1);
        assert_eq!(bank.balance_of(&alice, &PaymentAsset::Native), u128::MAX);
    }

    #[test]
    fn mint_assigns_sequential_ids() {
        let mut items = InMemoryItems::new();
        let alice = Holder::User(AccountId::random());
        let class: ItemClass = "box".into();

        let a = items.mint(&alice, &class);
        let b = items.mint(&alice, &class);
        assert_ne!(a, b);
        assert_eq!(items.owner_of(&class, a), Some(alice));
        assert_eq!(items.owner_of(&class, b), Some(alice));
    }

    #[test]
    fn item_transfer_requires_ownership() {
        let mut items = InMemoryItems::new();
        let alice = Holder::User(AccountId::random());
        let bob = Holder::User(AccountId::random());
        let class: ItemClass = "box".into();
        let token = items.mint(&alice, &class);

        let err = items.transfer(&bob, &alice, &class, token).unwrap_err();
        assert!(matches!(err, CustodyError::NotHeldByHolder { .. }));

        items.transfer(&alice, &bob, &class, token).unwrap();
        assert_eq!(items.owner_of(&class, token), Some(bob));
    }
}
