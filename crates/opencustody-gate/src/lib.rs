//! # opencustody-gate
//!
//! **Authorization plane**: voucher signature verification, replay
//! protection, and validation.
//!
//! ## Architecture
//!
//! The gate sits between callers and the custody engine:
//! 1. **verifier**: pure ed25519 verification of the domain-separated
//!    voucher signing payload
//! 2. **NonceRegistry**: records consumed voucher ids (replay prevention)
//! 3. **VoucherValidator**: composes both with the schema and authority
//!    checks, in order
//!
//! ## Voucher flow
//!
//! ```text
//! caller → handler → VoucherValidator.validate() → ledger mutations
//!        → NonceRegistry.consume() → receipt
//! ```
//!
//! Consumption is the handler's last step: a voucher is consumed iff the
//! entire action commits.

pub mod nonce;
pub mod validator;
pub mod verifier;

pub use nonce::NonceRegistry;
pub use validator::VoucherValidator;
pub use verifier::recover_signer;

#[cfg(any(test, feature = "test-helpers"))]
pub use verifier::sign_voucher;
