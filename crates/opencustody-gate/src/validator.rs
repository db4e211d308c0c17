//! Voucher validation — the gate every action handler passes through.
//!
//! Checks run in a fixed order and short-circuit on the first failure:
//!
//! 1. payload shape matches the calling handler's action kind → `SchemaError`
//! 2. ed25519 signature verifies under the deployment context → `BadSignature`
//! 3. signer is the deployment's trusted authority → `Unauthorized`
//! 4. voucher id unconsumed → `ReplayedVoucher`
//!
//! The validator never consumes the nonce. The calling handler consumes it
//! after every other effect of the action has been applied, so the voucher
//! is consumed iff the entire action commits.

use opencustody_types::{ActionKind, CustodyError, DeploymentContext, Result, SignedVoucher};

use crate::{nonce::NonceRegistry, verifier};

/// Validates signed vouchers against one deployment context.
#[derive(Debug, Clone)]
pub struct VoucherValidator {
    ctx: DeploymentContext,
}

impl VoucherValidator {
    #[must_use]
    pub fn new(ctx: DeploymentContext) -> Self {
        Self { ctx }
    }

    /// The deployment context this validator is bound to.
    #[must_use]
    pub fn context(&self) -> &DeploymentContext {
        &self.ctx
    }

    /// Validate a signed voucher for the given action kind.
    ///
    /// # Errors
    /// See the module docs for the check order and error mapping.
    pub fn validate(
        &self,
        signed: &SignedVoucher,
        expected: ActionKind,
        nonces: &NonceRegistry,
    ) -> Result<()> {
        // 1. Schema: the payload must be the one this handler understands.
        let actual = signed.voucher.kind();
        if actual != expected {
            return Err(CustodyError::SchemaError {
                reason: format!("expected {expected} payload, got {actual}"),
            });
        }
        if signed.voucher.id.as_str().is_empty() {
            return Err(CustodyError::SchemaError {
                reason: "empty voucher id".into(),
            });
        }

        // 2. Signature.
        let signer = verifier::recover_signer(&self.ctx, signed)?;

        // 3. Authority.
        if signer != self.ctx.trusted_authority {
            tracing::warn!(
                voucher_id = %signed.voucher.id,
                signer = %signer,
                "voucher signed by non-authority key"
            );
            return Err(CustodyError::Unauthorized { signer });
        }

        // 4. Replay.
        if nonces.is_consumed(&signed.voucher.id) {
            return Err(CustodyError::ReplayedVoucher(signed.voucher.id.clone()));
        }

        Ok(())
    }
}
