//! Recoverable ECDSA signatures over 32-byte digests.

use alloy::primitives::{Address, B256, Bytes, Signature};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;

use super::errors::{SdkError, SdkResult};

/// Sign a prehashed digest; returns the 65-byte `r ‖ s ‖ v` form (v = 27/28).
pub fn sign_digest(signer: &PrivateKeySigner, digest: B256) -> SdkResult<Bytes> {
    let signature = signer
        .sign_hash_sync(&digest)
        .map_err(|e| SdkError::validation(format!("signing failed: {e}")))?;
    Ok(Bytes::from(signature.as_bytes().to_vec()))
}

/// Address that produced `sign` over `digest`.
pub fn recover_signer(digest: B256, sign: &[u8]) -> SdkResult<Address> {
    let signature = Signature::from_raw(sign)
        .map_err(|e| SdkError::validation(format!("malformed signature: {e}")))?;
    signature
        .recover_address_from_prehash(&digest)
        .map_err(|e| SdkError::validation(format!("unrecoverable signature: {e}")))
}

/// Local check equivalent to the hub's ECDSA branch of `verifySignature`.
pub fn is_signed_by(digest: B256, sign: &[u8], expected: Address) -> bool {
    recover_signer(digest, sign).is_ok_and(|signer| signer == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_recover() {
        let signer = PrivateKeySigner::random();
        let digest = B256::repeat_byte(0x42);
        let sign = sign_digest(&signer, digest).unwrap();
        assert_eq!(sign.len(), 65);
        assert_eq!(recover_signer(digest, &sign).unwrap(), signer.address());
        assert!(is_signed_by(digest, &sign, signer.address()));
        assert!(!is_signed_by(digest, &sign, PrivateKeySigner::random().address()));
        assert!(!is_signed_by(B256::ZERO, &sign, signer.address()));
    }

    #[test]
    fn test_malformed_signature() {
        assert!(recover_signer(B256::ZERO, &[0u8; 10]).is_err());
    }
}
