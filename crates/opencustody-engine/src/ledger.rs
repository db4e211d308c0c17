//! In-memory custody ledger tracking what every holder has in custody.
//!
//! The [`CustodyLedger`] tracks two kinds of positions:
//! - **Fungible**: `(Holder, PaymentAsset) → amount` in smallest units
//! - **Items**: `(ItemClass, TokenId) → Holder` currently holding the item
//!
//! The ledger is strictly check-then-mutate: every operation validates all
//! preconditions before touching state, so a failed call leaves the ledger
//! exactly as it was.

use std::collections::HashMap;

use opencustody_types::{
    CustodyError, Holder, ItemClass, PaymentAsset, Result, TokenId,
};

/// In-memory custody positions for all holders.
#[derive(Debug, Default)]
pub struct CustodyLedger {
    /// `(Holder, PaymentAsset) → amount`
    fungible: HashMap<(Holder, PaymentAsset), u128>,
    /// `(ItemClass, TokenId) → Holder`
    items: HashMap<(ItemClass, TokenId), Holder>,
}

impl CustodyLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Fungible positions
    // =================================================================

    /// Current fungible position of a holder. Zero if absent.
    #[must_use]
    pub fn balance(&self, holder: &Holder, asset: &PaymentAsset) -> u128 {
        self.fungible
            .get(&(*holder, asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Credit `amount` to a holder's fungible position.
    ///
    /// # Errors
    /// Returns `AmountMustBePositive` for a zero amount.
    pub fn deposit_fungible(
        &mut self,
        holder: &Holder,
        asset: &PaymentAsset,
        amount: u128,
    ) -> Result<()> {
        if amount == 0 {
            return Err(CustodyError::AmountMustBePositive);
        }
        let entry = self.fungible.entry((*holder, asset.clone())).or_insert(0);
        *entry = entry.checked_add(amount).ok_or_else(|| {
            CustodyError::Internal(format!("fungible position overflow for {holder}/{asset}"))
        })?;
        Ok(())
    }

    /// Debit `amount` from a holder's fungible position.
    ///
    /// # Errors
    /// Returns `AmountMustBePositive` for a zero amount, `InsufficientBalance`
    /// if the position does not cover it. Nothing is mutated on error.
    pub fn withdraw_fungible(
        &mut self,
        holder: &Holder,
        asset: &PaymentAsset,
        amount: u128,
    ) -> Result<()> {
        if amount == 0 {
            return Err(CustodyError::AmountMustBePositive);
        }
        let available = self.balance(holder, asset);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let entry = self
            .fungible
            .entry((*holder, asset.clone()))
            .or_insert(0);
        *entry -= amount;
        Ok(())
    }

    /// Sum of one asset across all holders. Used to check conservation.
    #[must_use]
    pub fn total_fungible(&self, asset: &PaymentAsset) -> u128 {
        self.fungible
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| amount)
            .sum()
    }

    // =================================================================
    // Item positions
    // =================================================================

    /// Current holder of an item, if the ledger tracks it.
    #[must_use]
    pub fn item_holder(&self, item_class: &ItemClass, token_id: TokenId) -> Option<Holder> {
        self.items.get(&(item_class.clone(), token_id)).copied()
    }

    /// Record an item entering custody under `holder`.
    ///
    /// # Errors
    /// Returns `InvalidStateTransition` if the item is already tracked; an
    /// item must leave custody before it can enter again.
    pub fn deposit_item(
        &mut self,
        holder: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        if let Some(current) = self.item_holder(item_class, token_id) {
            return Err(CustodyError::InvalidStateTransition {
                entity: format!("item {item_class}/{token_id}"),
                from: format!("held by {current}"),
                to: format!("deposited by {holder}"),
            });
        }
        self.items.insert((item_class.clone(), token_id), *holder);
        Ok(())
    }

    /// Remove an item from custody. Fails closed if `holder` does not hold it.
    ///
    /// # Errors
    /// Returns `NotHeldByHolder` if the item is untracked or held by someone
    /// else.
    pub fn withdraw_item(
        &mut self,
        holder: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        self.require_held_by(holder, item_class, token_id)?;
        self.items.remove(&(item_class.clone(), token_id));
        Ok(())
    }

    /// Move an item between holders within custody.
    ///
    /// # Errors
    /// Returns `NotHeldByHolder` if `from` does not hold the item.
    pub fn transfer_item(
        &mut self,
        from: &Holder,
        to: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        self.require_held_by(from, item_class, token_id)?;
        self.items.insert((item_class.clone(), token_id), *to);
        Ok(())
    }

    fn require_held_by(
        &self,
        holder: &Holder,
        item_class: &ItemClass,
        token_id: TokenId,
    ) -> Result<()> {
        match self.item_holder(item_class, token_id) {
            Some(current) if current == *holder => Ok(()),
            _ => Err(CustodyError::NotHeldByHolder {
                holder: *holder,
                item_class: item_class.clone(),
                token_id,
            }),
        }
    }

    /// Number of items currently in custody.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use opencustody_types::{AccountId, EscrowDomain};

    use super::*;

    fn game() -> Holder {
        Holder::Escrow(EscrowDomain::Game)
    }

    fn user() -> Holder {
        Holder::User(AccountId::random())
    }

    #[test]
    fn deposit_and_query() {
        let mut ledger = CustodyLedger::new();
        ledger
            .deposit_fungible(&game(), &PaymentAsset::Native, 300)
            .unwrap();
        assert_eq!(ledger.balance(&game(), &PaymentAsset::Native), 300);
    }

    #[test]
    fn deposit_zero_fails() {
        let mut ledger = CustodyLedger::new();
        let result = ledger.deposit_fungible(&game(), &PaymentAsset::Native, 0);
        assert!(matches!(result, Err(CustodyError::AmountMustBePositive)));
    }

    #[test]
    fn withdraw_sufficient() {
        let mut ledger = CustodyLedger::new();
        let asset = PaymentAsset::Token("RUNGEM".into());
        ledger.deposit_fungible(&game(), &asset, 1000).unwrap();
        ledger.withdraw_fungible(&game(), &asset, 300).unwrap();
        assert_eq!(ledger.balance(&game(), &asset), 700);
    }

    #[test]
    fn withdraw_insufficient_leaves_balance() {
        let mut ledger = CustodyLedger::new();
        let asset = PaymentAsset::Native;
        ledger.deposit_fungible(&game(), &asset, 100).unwrap();
        let result = ledger.withdraw_fungible(&game(), &asset, 200);
        assert!(matches!(
            result,
            Err(CustodyError::InsufficientBalance {
                needed: 200,
                available: 100
            })
        ));
        assert_eq!(ledger.balance(&game(), &asset), 100);
    }

    #[test]
    fn total_fungible_sums_holders() {
        let mut ledger = CustodyLedger::new();
        let asset = PaymentAsset::Native;
        ledger.deposit_fungible(&game(), &asset, 100).unwrap();
        ledger
            .deposit_fungible(&Holder::Escrow(EscrowDomain::Vault), &asset, 50)
            .unwrap();
        ledger
            .deposit_fungible(&game(), &PaymentAsset::Token("X".into()), 999)
            .unwrap();
        assert_eq!(ledger.total_fungible(&asset), 150);
    }

    #[test]
    fn item_deposit_and_withdraw() {
        let mut ledger = CustodyLedger::new();
        let class: ItemClass = "box".into();
        ledger.deposit_item(&game(), &class, TokenId(7)).unwrap();
        assert_eq!(ledger.item_holder(&class, TokenId(7)), Some(game()));

        ledger.withdraw_item(&game(), &class, TokenId(7)).unwrap();
        assert_eq!(ledger.item_holder(&class, TokenId(7)), None);
    }

    #[test]
    fn double_deposit_rejected() {
        let mut ledger = CustodyLedger::new();
        let class: ItemClass = "box".into();
        ledger.deposit_item(&game(), &class, TokenId(1)).unwrap();
        let result = ledger.deposit_item(&user(), &class, TokenId(1));
        assert!(matches!(
            result,
            Err(CustodyError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn withdraw_by_wrong_holder_fails_closed() {
        let mut ledger = CustodyLedger::new();
        let class: ItemClass = "box".into();
        ledger.deposit_item(&game(), &class, TokenId(1)).unwrap();
        let stranger = user();
        let result = ledger.withdraw_item(&stranger, &class, TokenId(1));
        assert!(matches!(result, Err(CustodyError::NotHeldByHolder { .. })));
        assert_eq!(ledger.item_holder(&class, TokenId(1)), Some(game()));
    }

    #[test]
    fn withdraw_untracked_item_fails() {
        let mut ledger = CustodyLedger::new();
        let result = ledger.withdraw_item(&game(), &"box".into(), TokenId(42));
        assert!(matches!(result, Err(CustodyError::NotHeldByHolder { .. })));
    }

    #[test]
    fn transfer_moves_holder() {
        let mut ledger = CustodyLedger::new();
        let class: ItemClass = "box".into();
        let vault = Holder::Escrow(EscrowDomain::Vault);
        ledger.deposit_item(&game(), &class, TokenId(3)).unwrap();
        ledger
            .transfer_item(&game(), &vault, &class, TokenId(3))
            .unwrap();
        assert_eq!(ledger.item_holder(&class, TokenId(3)), Some(vault));
    }
}
