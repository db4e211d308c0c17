//! Nonce registry — records consumed voucher ids, preventing replay.
//!
//! A voucher id transitions false→true exactly once and is never reset. The
//! set is never pruned: evicting an entry would make the consumed voucher
//! replayable. All action kinds share one registry scope, so a voucher is
//! single-use regardless of which handler consumes it.

use std::collections::HashSet;

use opencustody_types::{CustodyError, Result, VoucherId};

/// Tracks which voucher ids have been consumed.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    consumed: HashSet<VoucherId>,
}

impl NonceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            consumed: HashSet::new(),
        }
    }

    /// Check whether a voucher id has already been consumed (without marking).
    #[must_use]
    pub fn is_consumed(&self, voucher_id: &VoucherId) -> bool {
        self.consumed.contains(voucher_id)
    }

    /// Mark a voucher id as consumed.
    ///
    /// Handlers call this as the *last* step of a fully applied action, so a
    /// failure anywhere earlier leaves the voucher usable by a corrected
    /// retry.
    ///
    /// # Errors
    /// Returns [`CustodyError::ReplayedVoucher`] if the id was already consumed.
    pub fn consume(&mut self, voucher_id: &VoucherId) -> Result<()> {
        if !self.consumed.insert(voucher_id.clone()) {
            return Err(CustodyError::ReplayedVoucher(voucher_id.clone()));
        }
        Ok(())
    }

    /// Number of consumed voucher ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    /// Whether no voucher has been consumed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_consume_ok() {
        let mut registry = NonceRegistry::new();
        let id = VoucherId::random();
        assert!(!registry.is_consumed(&id));
        registry.consume(&id).unwrap();
        assert!(registry.is_consumed(&id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn double_consume_blocked() {
        let mut registry = NonceRegistry::new();
        let id = VoucherId::random();
        registry.consume(&id).unwrap();

        let err = registry.consume(&id).unwrap_err();
        assert!(
            matches!(err, CustodyError::ReplayedVoucher(ref replayed) if *replayed == id),
            "Expected ReplayedVoucher, got: {err:?}"
        );
    }

    #[test]
    fn distinct_ids_independent() {
        let mut registry = NonceRegistry::new();
        let a = VoucherId::new("a");
        let b = VoucherId::new("b");
        registry.consume(&a).unwrap();
        assert!(!registry.is_consumed(&b));
        registry.consume(&b).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn empty_registry() {
        let registry = NonceRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.is_consumed(&VoucherId::new("x")));
    }
}
