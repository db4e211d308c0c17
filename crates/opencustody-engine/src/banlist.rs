//! Ban registry — bars misbehaving accounts from every custody action.
//!
//! One registry covers the mint, game-custody, marketplace, and vault
//! handlers: an action is rejected in its precondition phase when any
//! account it names is on the list. Unlike a consumed nonce, a ban is
//! reversible; lifting it restores the account immediately.

use std::collections::HashSet;

use opencustody_types::{AccountId, CustodyError, Result};

/// Tracks which accounts are barred from custody actions.
#[derive(Debug, Default)]
pub struct BanRegistry {
    banned: HashSet<AccountId>,
}

impl BanRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banned: HashSet::new(),
        }
    }

    /// Check whether an account is banned.
    #[must_use]
    pub fn is_banned(&self, account: &AccountId) -> bool {
        self.banned.contains(account)
    }

    /// Ban an account. Idempotent.
    pub fn ban(&mut self, account: AccountId) {
        self.banned.insert(account);
    }

    /// Lift a ban, returning whether the account was on the list.
    pub fn lift(&mut self, account: &AccountId) -> bool {
        self.banned.remove(account)
    }

    /// Precondition check run by every handler for every account the
    /// action names.
    ///
    /// # Errors
    /// Returns [`CustodyError::AccountBanned`] if the account is on the list.
    pub fn require_allowed(&self, account: &AccountId) -> Result<()> {
        if self.is_banned(account) {
            return Err(CustodyError::AccountBanned { account: *account });
        }
        Ok(())
    }

    /// Number of banned accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.banned.len()
    }

    /// Whether no account is banned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.banned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ban_then_lift_round_trip() {
        let mut registry = BanRegistry::new();
        let account = AccountId::random();
        assert!(!registry.is_banned(&account));

        registry.ban(account);
        assert!(registry.is_banned(&account));
        let err = registry.require_allowed(&account).unwrap_err();
        assert!(
            matches!(err, CustodyError::AccountBanned { account: banned } if banned == account),
            "Expected AccountBanned, got: {err:?}"
        );

        assert!(registry.lift(&account));
        assert!(!registry.is_banned(&account));
        registry.require_allowed(&account).unwrap();
    }

    #[test]
    fn ban_is_idempotent() {
        let mut registry = BanRegistry::new();
        let account = AccountId::random();
        registry.ban(account);
        registry.ban(account);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lift_of_unbanned_account_is_false() {
        let mut registry = BanRegistry::new();
        assert!(!registry.lift(&AccountId::random()));
        assert!(registry.is_empty());
    }

    #[test]
    fn bans_are_per_account() {
        let mut registry = BanRegistry::new();
        let a = AccountId::random();
        let b = AccountId::random();
        registry.ban(a);
        assert!(registry.is_banned(&a));
        assert!(!registry.is_banned(&b));
        registry.require_allowed(&b).unwrap();
    }
}
