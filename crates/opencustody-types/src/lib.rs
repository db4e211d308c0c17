//! # opencustody-types
//!
//! Shared types, errors, and configuration for the **OpenCustody**
//! voucher-gated custody engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`VoucherId`], [`TokenId`], [`OfferId`], [`TransferId`]
//! - **Voucher model**: [`Voucher`], [`SignedVoucher`], [`ActionKind`], [`ActionPayload`]
//! - **Custody model**: [`Holder`], [`EscrowDomain`], [`PaymentAsset`], [`Payment`]
//! - **Offer model**: [`Offer`], [`OfferStatus`]
//! - **Vault model**: [`VaultTransfer`], [`VaultTransferStatus`]
//! - **Receipt model**: [`ActionReceipt`], [`EventKind`]
//! - **Configuration**: [`DeploymentContext`], [`FeeConfig`], [`FeeSplit`]
//! - **Errors**: [`CustodyError`] with `OC_ERR_` prefix codes
//! - **Constants**: fee denominator and signing-domain names

pub mod asset;
pub mod constants;
pub mod context;
pub mod error;
pub mod ids;
pub mod offer;
pub mod receipt;
pub mod vault;
pub mod voucher;

// Re-export all primary types at crate root for ergonomic imports:
//   use opencustody_types::{Voucher, SignedVoucher, Offer, ...};

pub use asset::*;
pub use context::*;
pub use error::*;
pub use ids::*;
pub use offer::*;
pub use receipt::*;
pub use vault::*;
pub use voucher::*;

// Constants are accessed via `opencustody_types::constants::FOO`
// (not re-exported to avoid name collisions).
