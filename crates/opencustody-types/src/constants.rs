//! System-wide constants.

/// Denominator of fee rates: cut-per-million, parts per 1,000,000.
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Domain-separation tag prefixed to every voucher signing payload.
pub const VOUCHER_DOMAIN_TAG: &[u8] = b"opencustody:voucher:v1:";

/// Signing-domain name used by the item/game/marketplace deployments.
pub const ITEM_SIGNING_DOMAIN: &str = "NFT-Voucher";

/// Signing-domain name used by the vault deployment.
pub const VAULT_SIGNING_DOMAIN: &str = "Vault-Item";

/// Current signing-domain version.
pub const SIGNING_DOMAIN_VERSION: &str = "1";
