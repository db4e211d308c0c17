//! Deployment context and fee configuration.
//!
//! The context is an explicit value threaded into every signature
//! verification rather than ambient global state: it binds a voucher to one
//! signing domain, one deployed instance, and one chain.

use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, CustodyError, Result};

/// Identifies one deployment of the custody engine for signing purposes.
///
/// A voucher signed for one `(domain_name, domain_version, verifying_context,
/// chain_id)` combination verifies under no other, so a voucher issued for
/// e.g. the vault of one deployment can never be replayed against the
/// marketplace of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentContext {
    /// Signing-domain name (e.g. "NFT-Voucher", "Vault-Item").
    pub domain_name: String,
    /// Signing-domain version.
    pub domain_version: String,
    /// Identity of the verifying instance (the deployed contract address).
    pub verifying_context: String,
    /// Chain the deployment lives on.
    pub chain_id: u64,
    /// The sole identity whose voucher signatures are accepted.
    pub trusted_authority: AccountId,
}

impl DeploymentContext {
    #[must_use]
    pub fn new(
        domain_name: impl Into<String>,
        domain_version: impl Into<String>,
        verifying_context: impl Into<String>,
        chain_id: u64,
        trusted_authority: AccountId,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            domain_version: domain_version.into(),
            verifying_context: verifying_context.into(),
            chain_id,
            trusted_authority,
        }
    }

    /// Context for an item/game/marketplace deployment under the default
    /// signing domain.
    #[must_use]
    pub fn item_domain(
        verifying_context: impl Into<String>,
        chain_id: u64,
        trusted_authority: AccountId,
    ) -> Self {
        Self::new(
            constants::ITEM_SIGNING_DOMAIN,
            constants::SIGNING_DOMAIN_VERSION,
            verifying_context,
            chain_id,
            trusted_authority,
        )
    }

    /// Context for a vault deployment.
    #[must_use]
    pub fn vault_domain(
        verifying_context: impl Into<String>,
        chain_id: u64,
        trusted_authority: AccountId,
    ) -> Self {
        Self::new(
            constants::VAULT_SIGNING_DOMAIN,
            constants::SIGNING_DOMAIN_VERSION,
            verifying_context,
            chain_id,
            trusted_authority,
        )
    }
}

/// Exact fee split of a gross payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// `floor(gross * cut_per_million / 1_000_000)`, paid to the collector.
    pub collector_share: u128,
    /// The remainder, paid to the seller.
    pub seller_share: u128,
}

/// Fee collector configuration.
///
/// The rate is validated when it is set; `split` itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// The account that receives the collector share.
    pub collector: AccountId,
    /// Fee rate in parts per million, in `[0, 1_000_000]`.
    cut_per_million: u32,
}

impl FeeConfig {
    /// Create a fee config, rejecting an out-of-range rate.
    pub fn new(collector: AccountId, cut_per_million: u32) -> Result<Self> {
        if cut_per_million > constants::FEE_DENOMINATOR {
            return Err(CustodyError::Configuration(format!(
                "fee rate {cut_per_million} exceeds {} parts per million",
                constants::FEE_DENOMINATOR
            )));
        }
        Ok(Self {
            collector,
            cut_per_million,
        })
    }

    /// Zero-fee config (everything goes to the seller).
    #[must_use]
    pub fn free(collector: AccountId) -> Self {
        Self {
            collector,
            cut_per_million: 0,
        }
    }

    #[must_use]
    pub fn cut_per_million(&self) -> u32 {
        self.cut_per_million
    }

    /// Split a gross amount into collector and seller shares.
    ///
    /// Exact for every `u128` gross amount: the quotient/remainder
    /// decomposition avoids the `gross * cut` intermediate overflow while
    /// preserving `floor(gross * cut / 1_000_000)` semantics, and
    /// `collector_share + seller_share == gross` always holds.
    #[must_use]
    pub fn split(&self, gross: u128) -> FeeSplit {
        let denom = u128::from(constants::FEE_DENOMINATOR);
        let cut = u128::from(self.cut_per_million);
        // floor((q*D + r) * c / D) == q*c + floor(r*c / D)
        let collector_share = (gross / denom) * cut + (gross % denom) * cut / denom;
        FeeSplit {
            collector_share,
            seller_share: gross - collector_share,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> AccountId {
        AccountId::from_pubkey([9u8; 32])
    }

    #[test]
    fn rejects_out_of_range_rate() {
        let err = FeeConfig::new(collector(), 1_000_001).unwrap_err();
        assert!(matches!(err, CustodyError::Configuration(_)));
    }

    #[test]
    fn five_percent_of_one_hundred() {
        // 5% == 50,000 parts per million
        let fees = FeeConfig::new(collector(), 50_000).unwrap();
        let split = fees.split(100);
        assert_eq!(split.collector_share, 5);
        assert_eq!(split.seller_share, 95);
    }

    #[test]
    fn rounding_floors_collector_share() {
        let fees = FeeConfig::new(collector(), 333_333).unwrap();
        let split = fees.split(10);
        // 10 * 333333 / 1e6 = 3.33333 -> 3
        assert_eq!(split.collector_share, 3);
        assert_eq!(split.seller_share, 7);
    }

    #[test]
    fn full_cut_takes_everything() {
        let fees = FeeConfig::new(collector(), 1_000_000).unwrap();
        let split = fees.split(12_345);
        assert_eq!(split.collector_share, 12_345);
        assert_eq!(split.seller_share, 0);
    }

    #[test]
    fn zero_cut_takes_nothing() {
        let fees = FeeConfig::free(collector());
        let split = fees.split(12_345);
        assert_eq!(split.collector_share, 0);
        assert_eq!(split.seller_share, 12_345);
    }

    #[test]
    fn split_is_exact_at_u128_extremes() {
        let fees = FeeConfig::new(collector(), 999_999).unwrap();
        for gross in [0u128, 1, 999_999, 1_000_000, u128::MAX] {
            let split = fees.split(gross);
            assert_eq!(split.collector_share + split.seller_share, gross);
        }
    }

    #[test]
    fn split_matches_naive_formula_for_small_values() {
        for cut in [0u32, 1, 49_999, 50_000, 500_000, 1_000_000] {
            let fees = FeeConfig::new(collector(), cut).unwrap();
            for gross in 0u128..200 {
                let split = fees.split(gross);
                assert_eq!(
                    split.collector_share,
                    gross * u128::from(cut) / 1_000_000,
                    "gross={gross} cut={cut}"
                );
                assert_eq!(split.collector_share + split.seller_share, gross);
            }
        }
    }

    #[test]
    fn context_constructors_pick_domains() {
        let auth = collector();
        let item = DeploymentContext::item_domain("0xabc", 97, auth);
        assert_eq!(item.domain_name, "NFT-Voucher");
        assert_eq!(item.domain_version, "1");

        let vault = DeploymentContext::vault_domain("0xdef", 97, auth);
        assert_eq!(vault.domain_name, "Vault-Item");
        assert_eq!(vault.trusted_authority, auth);
    }
}
