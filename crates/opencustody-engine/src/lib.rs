//! # opencustody-engine
//!
//! **Custody plane**: the asset custody ledger, external ledger
//! collaborators, fee splitting, and the eleven voucher-gated action
//! handlers.
//!
//! ## Architecture
//!
//! [`CustodyEngine`] receives a [`SignedVoucher`](opencustody_types::SignedVoucher)
//! plus an optional payment attachment and:
//! 1. Validates it through the gate (kind, signature, authority, replay)
//! 2. Checks every precondition against current state, including the
//!    ban registry for each account the action names
//! 3. Applies the ledger and collaborator mutations
//! 4. Consumes the voucher's nonce
//! 5. Emits a structured log event and an [`ActionReceipt`](opencustody_types::ActionReceipt)
//!
//! ## Handlers
//!
//! - **Mint**: `redeem`
//! - **Game custody**: `deposit_token`, `withdraw_token`, `deposit_item`,
//!   `withdraw_item`
//! - **Marketplace**: `offer`, `buy`, `withdraw_offer`
//! - **Vault escrow**: `vault_transfer`, `vault_cancel`, `vault_claim`

pub mod banlist;
pub mod collaborators;
pub mod engine;
pub mod ledger;
mod market;
mod vault_ops;

pub use banlist::BanRegistry;
pub use collaborators::{FungibleLedger, InMemoryBank, InMemoryItems, ItemLedger};
pub use engine::CustodyEngine;
pub use ledger::CustodyLedger;
