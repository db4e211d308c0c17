//! # Voucher — the signed authorization primitive
//!
//! Every custody-changing capability is gated by a voucher: a structured,
//! action-specific message issued and signed off-core by the trusted
//! authority, consumed exactly once by the matching action handler.
//!
//! The payload is a **closed tagged union** keyed by action kind. Wire
//! decoding rejects unknown and extra fields outright, so a voucher can only
//! ever be interpreted as the single action it was issued for.
//!
//! ## Single-use
//!
//! `Voucher::id` is the nonce of the replay protocol: all action kinds share
//! one nonce registry scope, so a voucher is single-use regardless of which
//! handler consumes it.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    constants, AccountId, Asset, CustodyError, DeploymentContext, ItemClass, OfferId,
    PaymentAsset, Result, TokenId, TransferId, VoucherId,
};

/// The action a voucher authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Redeem,
    DepositToken,
    WithdrawToken,
    DepositItem,
    WithdrawItem,
    Offer,
    Buy,
    WithdrawOffer,
    VaultTransfer,
    VaultCancel,
    VaultClaim,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redeem => write!(f, "REDEEM"),
            Self::DepositToken => write!(f, "DEPOSIT_TOKEN"),
            Self::WithdrawToken => write!(f, "WITHDRAW_TOKEN"),
            Self::DepositItem => write!(f, "DEPOSIT_ITEM"),
            Self::WithdrawItem => write!(f, "WITHDRAW_ITEM"),
            Self::Offer => write!(f, "OFFER"),
            Self::Buy => write!(f, "BUY"),
            Self::WithdrawOffer => write!(f, "WITHDRAW_OFFER"),
            Self::VaultTransfer => write!(f, "VAULT_TRANSFER"),
            Self::VaultCancel => write!(f, "VAULT_CANCEL"),
            Self::VaultClaim => write!(f, "VAULT_CLAIM"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind payloads
// ---------------------------------------------------------------------------

/// Mint an item to `receiver`, optionally against payment.
///
/// A `price` of zero is a free mint and no payment may be attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedeemPayload {
    pub item_id: String,
    pub item_class: ItemClass,
    pub receiver: AccountId,
    pub price: u128,
    pub pay_with: PaymentAsset,
}

/// Move fungible tokens from the depositor into game custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepositTokenPayload {
    pub depositor: AccountId,
    pub asset: Asset,
    pub amount: u128,
}

/// Move fungible tokens from game custody to the withdrawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WithdrawTokenPayload {
    pub withdrawer: AccountId,
    pub asset: Asset,
    pub amount: u128,
}

/// Move an item from the depositor into game custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepositItemPayload {
    pub depositor: AccountId,
    pub item_id: String,
    pub item_class: ItemClass,
    pub token_id: TokenId,
}

/// Move an item from game custody to the withdrawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WithdrawItemPayload {
    pub withdrawer: AccountId,
    pub item_id: String,
    pub item_class: ItemClass,
    pub token_id: TokenId,
}

/// List an item for sale. The item stays with the seller until bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OfferPayload {
    pub seller: AccountId,
    pub item_id: String,
    pub item_class: ItemClass,
    pub token_id: TokenId,
    pub price: u128,
    pub pay_with: PaymentAsset,
}

/// Buy a listed item at its exact price terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuyPayload {
    pub offer_id: OfferId,
    pub pay_with: PaymentAsset,
    pub amount: u128,
}

/// Withdraw an open offer. Only the listed seller may withdraw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WithdrawOfferPayload {
    pub offer_id: OfferId,
    pub seller: AccountId,
}

/// Escrow an item in the vault for a fee-charged transfer to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultTransferPayload {
    pub transfer_id: TransferId,
    pub item_class: ItemClass,
    pub token_id: TokenId,
    pub from: AccountId,
    pub to: AccountId,
    pub price: u128,
    pub fee: u128,
    pub pay_with: PaymentAsset,
}

/// Cancel a pending vault transfer; the item returns to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultCancelPayload {
    pub transfer_id: TransferId,
    pub owner: AccountId,
    pub item_class: ItemClass,
    pub token_id: TokenId,
}

/// Claim a pending vault transfer against payment of price + fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultClaimPayload {
    pub transfer_id: TransferId,
    pub item_class: ItemClass,
    pub token_id: TokenId,
    pub from: AccountId,
    pub to: AccountId,
    pub price: u128,
    pub fee: u128,
    pub pay_with: PaymentAsset,
}

/// The closed union of all voucher payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum ActionPayload {
    Redeem(RedeemPayload),
    DepositToken(DepositTokenPayload),
    WithdrawToken(WithdrawTokenPayload),
    DepositItem(DepositItemPayload),
    WithdrawItem(WithdrawItemPayload),
    Offer(OfferPayload),
    Buy(BuyPayload),
    WithdrawOffer(WithdrawOfferPayload),
    VaultTransfer(VaultTransferPayload),
    VaultCancel(VaultCancelPayload),
    VaultClaim(VaultClaimPayload),
}

impl ActionPayload {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Redeem(_) => ActionKind::Redeem,
            Self::DepositToken(_) => ActionKind::DepositToken,
            Self::WithdrawToken(_) => ActionKind::WithdrawToken,
            Self::DepositItem(_) => ActionKind::DepositItem,
            Self::WithdrawItem(_) => ActionKind::WithdrawItem,
            Self::Offer(_) => ActionKind::Offer,
            Self::Buy(_) => ActionKind::Buy,
            Self::WithdrawOffer(_) => ActionKind::WithdrawOffer,
            Self::VaultTransfer(_) => ActionKind::VaultTransfer,
            Self::VaultCancel(_) => ActionKind::VaultCancel,
            Self::VaultClaim(_) => ActionKind::VaultClaim,
        }
    }
}

// ---------------------------------------------------------------------------
// Voucher
// ---------------------------------------------------------------------------

/// A structured, action-specific authorization message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Voucher {
    /// Unique per issuance; the nonce of the replay protocol.
    pub id: VoucherId,
    /// Kind-specific payload.
    pub action: ActionPayload,
}

impl Voucher {
    #[must_use]
    pub fn new(id: VoucherId, action: ActionPayload) -> Self {
        Self { id, action }
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    /// Decode a voucher from its JSON wire form.
    ///
    /// Unknown fields, extra fields, and unknown action kinds are all
    /// rejected as `SchemaError`.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CustodyError::SchemaError {
            reason: e.to_string(),
        })
    }

    /// Encode to the JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CustodyError::Internal(e.to_string()))
    }

    /// Canonical signing payload, domain-separated by deployment context
    /// and action kind.
    ///
    /// Format: `tag || name || version || verifying_context || chain_id
    /// || action_kind || voucher_id || payload_json`, with `\x00` separators
    /// between the variable-length header fields. A voucher signed for one
    /// context/kind combination verifies under no other.
    #[must_use]
    pub fn signing_payload(&self, ctx: &DeploymentContext) -> Vec<u8> {
        let mut payload = Vec::with_capacity(256);
        payload.extend_from_slice(constants::VOUCHER_DOMAIN_TAG);
        payload.extend_from_slice(ctx.domain_name.as_bytes());
        payload.push(0);
        payload.extend_from_slice(ctx.domain_version.as_bytes());
        payload.push(0);
        payload.extend_from_slice(ctx.verifying_context.as_bytes());
        payload.push(0);
        payload.extend_from_slice(&ctx.chain_id.to_le_bytes());
        payload.extend_from_slice(self.kind().to_string().as_bytes());
        payload.push(0);
        payload.extend_from_slice(self.id.as_str().as_bytes());
        payload.push(0);
        // Struct field order is fixed, so the JSON encoding is canonical.
        let body = serde_json::to_vec(&self.action)
            .expect("voucher payloads always serialize to JSON");
        payload.extend_from_slice(&body);
        payload
    }

    /// SHA-256 digest of the signing payload, carried on receipts.
    #[must_use]
    pub fn digest(&self, ctx: &DeploymentContext) -> [u8; 32] {
        Sha256::digest(self.signing_payload(ctx)).into()
    }
}

/// A voucher together with the issuer's identity and ed25519 signature.
///
/// Ephemeral: constructed off-core by the signer oracle, consumed exactly
/// once by an action handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedVoucher {
    pub voucher: Voucher,
    /// The public key the signature is claimed under. The validator checks
    /// it against the deployment's trusted authority.
    pub signer: AccountId,
    /// 64-byte ed25519 signature over `voucher.signing_payload(ctx)`.
    pub signature: Vec<u8>,
}
