//! Error types for the OpenCustody engine.
//!
//! All errors use the `OC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Voucher / authorization errors
//! - 2xx: Fungible balance errors
//! - 3xx: Item custody errors
//! - 4xx: State machine errors (offers, vault transfers)
//! - 5xx: Payment errors
//! - 6xx: External ledger errors
//! - 9xx: General / internal errors
//!
//! Every error is terminal and surfaced to the caller unmodified: a failing
//! handler leaves all ledgers, the offer/vault tables, and the nonce registry
//! exactly as before the call. Retry with a freshly issued voucher is a
//! caller-level concern.

use thiserror::Error;

use crate::{AccountId, Holder, ItemClass, OfferId, TokenId, TransferId, VoucherId};

/// Central error enum for all OpenCustody operations.
#[derive(Debug, Error)]
pub enum CustodyError {
    // =================================================================
    // Voucher / Authorization Errors (1xx)
    // =================================================================
    /// The voucher payload is malformed for the calling context
    /// (wrong action kind, unknown/extra fields, missing fields).
    #[error("OC_ERR_100: Malformed voucher payload: {reason}")]
    SchemaError { reason: String },

    /// The ed25519 signature on the voucher didn't verify.
    #[error("OC_ERR_101: Voucher signature verification failed")]
    BadSignature,

    /// The voucher's signer is not the trusted authority for this deployment.
    #[error("OC_ERR_102: Signer {signer} is not the trusted authority")]
    Unauthorized { signer: AccountId },

    /// The voucher id has already been consumed (replay prevention).
    #[error("OC_ERR_103: Voucher already consumed: {0}")]
    ReplayedVoucher(VoucherId),

    /// An account named by the action is on the ban list.
    #[error("OC_ERR_104: Account {account} is banned from custody actions")]
    AccountBanned { account: AccountId },

    // =================================================================
    // Fungible Balance Errors (2xx)
    // =================================================================
    /// Not enough balance to perform the operation.
    #[error("OC_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// A zero-value deposit or withdrawal is a user error, not a no-op.
    #[error("OC_ERR_201: Amount must be greater than zero")]
    AmountMustBePositive,

    // =================================================================
    // Item Custody Errors (3xx)
    // =================================================================
    /// The item is not held by the stated holder.
    #[error("OC_ERR_300: Item {item_class}/{token_id} is not held by {holder}")]
    NotHeldByHolder {
        holder: Holder,
        item_class: ItemClass,
        token_id: TokenId,
    },

    // =================================================================
    // State Machine Errors (4xx)
    // =================================================================
    /// An offer or vault transfer cannot make the requested transition.
    #[error("OC_ERR_400: Invalid state transition for {entity}: {from} -> {to}")]
    InvalidStateTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// The referenced offer does not exist.
    #[error("OC_ERR_401: Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// The referenced vault transfer does not exist.
    #[error("OC_ERR_402: Vault transfer not found: {0}")]
    TransferNotFound(TransferId),

    // =================================================================
    // Payment Errors (5xx)
    // =================================================================
    /// The attached payment does not match the required amount/asset.
    #[error("OC_ERR_500: Payment mismatch: {reason}")]
    PaymentMismatch { reason: String },

    // =================================================================
    // External Ledger Errors (6xx)
    // =================================================================
    /// An external fungible/item ledger call was rejected.
    #[error("OC_ERR_600: External ledger rejected the operation: {reason}")]
    LedgerRejected { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (e.g. out-of-range fee rate).
    #[error("OC_ERR_901: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CustodyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = CustodyError::ReplayedVoucher(VoucherId::new("abc"));
        let msg = format!("{err}");
        assert!(msg.starts_with("OC_ERR_103"), "Got: {msg}");
        assert!(msg.contains("abc"));
    }

    #[test]
    fn insufficient_balance_display() {
        let err = CustodyError::InsufficientBalance {
            needed: 300,
            available: 100,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OC_ERR_200"));
        assert!(msg.contains("300"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn not_held_display_names_item() {
        let err = CustodyError::NotHeldByHolder {
            holder: Holder::Escrow(crate::EscrowDomain::Game),
            item_class: "box".into(),
            token_id: TokenId(7),
        };
        let msg = format!("{err}");
        assert!(msg.contains("OC_ERR_300"));
        assert!(msg.contains("box"));
        assert!(msg.contains("token:7"));
        assert!(msg.contains("GAME"));
    }

    #[test]
    fn all_errors_have_oc_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(CustodyError::BadSignature),
            Box::new(CustodyError::AccountBanned {
                account: AccountId::from_pubkey([9u8; 32]),
            }),
            Box::new(CustodyError::AmountMustBePositive),
            Box::new(CustodyError::OfferNotFound(OfferId::new("1"))),
            Box::new(CustodyError::TransferNotFound(TransferId::new("2"))),
            Box::new(CustodyError::PaymentMismatch {
                reason: "test".into(),
            }),
            Box::new(CustodyError::Configuration("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OC_ERR_"),
                "Error missing OC_ERR_ prefix: {msg}"
            );
        }
    }
}
