//! Ed25519 voucher signature verification.
//!
//! Pure and deterministic: no state, no side effects. The signing payload is
//! domain-separated (deployment context + action kind + voucher id), so a
//! signature produced for one deployment or action kind verifies under no
//! other.
//!
//! Strict verification is used deliberately: we reject the edge-case
//! signatures that lenient implementations accept, and we have no legacy
//! verifiers to stay compatible with.

use ed25519_dalek::{Signature, VerifyingKey};
use opencustody_types::{AccountId, CustodyError, DeploymentContext, Result, SignedVoucher};

/// Verify the signature on a voucher and return the signer identity.
///
/// All failure modes (carried key not a valid curve point, signature not
/// 64 bytes, verification failure) collapse into [`CustodyError::BadSignature`];
/// callers get no oracle for *why* a forgery failed. Whether the recovered
/// signer is the trusted authority is the validator's concern, not ours.
pub fn recover_signer(ctx: &DeploymentContext, signed: &SignedVoucher) -> Result<AccountId> {
    let key = VerifyingKey::from_bytes(signed.signer.as_bytes())
        .map_err(|_| CustodyError::BadSignature)?;

    let sig_bytes: [u8; 64] = signed
        .signature
        .as_slice()
        .try_into()
        .map_err(|_| CustodyError::BadSignature)?;
    let signature = Signature::from_bytes(&sig_bytes);

    key.verify_strict(&signed.voucher.signing_payload(ctx), &signature)
        .map_err(|_| CustodyError::BadSignature)?;

    Ok(signed.signer)
}

/// Test stand-in for the off-core signer oracle. **Never use in production**:
/// the engine only ever verifies signatures.
#[cfg(any(test, feature = "test-helpers"))]
pub fn sign_voucher(
    ctx: &DeploymentContext,
    voucher: opencustody_types::Voucher,
    signing_key: &ed25519_dalek::SigningKey,
) -> SignedVoucher {
    use ed25519_dalek::Signer;

    let signature = signing_key.sign(&voucher.signing_payload(ctx));
    SignedVoucher {
        signer: AccountId::from(&signing_key.verifying_key()),
        signature: signature.to_bytes().to_vec(),
        voucher,
    }
}
