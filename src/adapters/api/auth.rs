//! Gateway Authentication - Signed Challenge Authorization
//!
//! Writes to the gateway need an `Authorization` header of the form
//! `<hash>_<signature>_<address>`, where `hash` is the EIP-712 digest of a
//! typed challenge served by `GET /challenge` and `signature` is the
//! wallet's signature over it.

use alloy::dyn_abi::TypedData;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::signing::sign_digest;

/// Signs gateway challenges with the wallet key.
pub struct GatewayAuth {
    signer: PrivateKeySigner,
}

impl GatewayAuth {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Build the `Authorization` header value for `challenge`.
    pub fn authorize(&self, challenge: &TypedData) -> SdkResult<String> {
        let hash = challenge
            .eip712_signing_hash()
            .map_err(|e| SdkError::Gateway(format!("invalid challenge: {e}")))?;
        let sign = sign_digest(&self.signer, hash)?;
        Ok(format!("{hash}_{sign}_{}", self.address()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signing::recover_signer;

    fn challenge() -> TypedData {
        serde_json::from_value(serde_json::json!({
            "types": {
                "EIP712Domain": [
                    {"name": "name", "type": "string"},
                    {"name": "version", "type": "string"},
                    {"name": "chainId", "type": "uint256"}
                ],
                "Challenge": [{"name": "challenge", "type": "string"}]
            },
            "domain": {"name": "iExec Gateway", "version": "1", "chainId": "0x86"},
            "primaryType": "Challenge",
            "message": {"challenge": "xyz"}
        }))
        .unwrap()
    }

    #[test]
    fn test_header_recovers_to_wallet() {
        let signer = PrivateKeySigner::random();
        let auth = GatewayAuth::new(signer.clone());
        let typed = challenge();
        let header = auth.authorize(&typed).unwrap();

        let parts: Vec<&str> = header.split('_').collect();
        assert_eq!(parts.len(), 3);
        let hash = typed.eip712_signing_hash().unwrap();
        assert_eq!(parts[0], hash.to_string());
        let sign: alloy::primitives::Bytes = parts[1].parse().unwrap();
        assert_eq!(recover_signer(hash, &sign).unwrap(), signer.address());
        assert_eq!(parts[2].parse::<Address>().unwrap(), signer.address());
    }
}
