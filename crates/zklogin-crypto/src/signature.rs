//! Transaction signing and composite zkLogin signatures

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use zklogin_core::ProofBundle;

use crate::address::ZKLOGIN_FLAG;
use crate::ephemeral::{EphemeralKeypair, ED25519_FLAG};
use crate::error::CryptoError;
use crate::hash::blake2b256_multi;

/// Intent prefix for transaction data: scope, version, app id
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Serialized ephemeral signature: `flag || signature || public_key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSignature(Vec<u8>);

impl UserSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

/// Sign transaction bytes with the ephemeral key.
///
/// The signed message is `Blake2b-256(intent || tx_bytes)`.
pub fn sign_transaction(keypair: &EphemeralKeypair, tx_bytes: &[u8]) -> UserSignature {
    let digest = blake2b256_multi(&[&TRANSACTION_INTENT[..], tx_bytes]);
    let signature = keypair.sign(&digest);

    let mut out = Vec::with_capacity(1 + 64 + 32);
    out.push(ED25519_FLAG);
    out.extend_from_slice(&signature);
    out.extend_from_slice(keypair.public_key().as_bytes());
    UserSignature(out)
}

/// Groth16 proof points as returned by the proving service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZkLoginProofPoints {
    pub a: Vec<String>,
    pub b: Vec<Vec<String>>,
    pub c: Vec<String>,
}

/// The `iss` claim's position inside the base64 JWT payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssBase64Details {
    pub value: String,
    pub index_mod_4: u8,
}

/// Proof bundle fields plus the address seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginInputs {
    pub proof_points: ZkLoginProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
    pub address_seed: String,
}

/// Composite authorization: proof, address seed, max epoch and the
/// ephemeral signature. Field order is the BCS wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginSignature {
    pub inputs: ZkLoginInputs,
    pub max_epoch: u64,
    pub user_signature: Vec<u8>,
}

impl ZkLoginSignature {
    /// Merge the address seed into the proof bundle and attach the signature
    pub fn assemble(
        proof: &ProofBundle,
        address_seed: &BigUint,
        max_epoch: u64,
        user_signature: &UserSignature,
    ) -> Result<Self, CryptoError> {
        let merged = proof
            .merged_with(
                "addressSeed",
                serde_json::Value::String(address_seed.to_str_radix(10)),
            )
            .ok_or_else(|| CryptoError::MalformedProof("not a JSON object".into()))?;

        let inputs: ZkLoginInputs = serde_json::from_value(merged)
            .map_err(|e| CryptoError::MalformedProof(e.to_string()))?;

        Ok(Self {
            inputs,
            max_epoch,
            user_signature: user_signature.as_bytes().to_vec(),
        })
    }

    /// `flag || bcs(signature)`
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        let body = bcs::to_bytes(self).map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(ZKLOGIN_FLAG);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Base64 form submitted to the ledger
    pub fn to_base64(&self) -> Result<String, CryptoError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::blake2b256;
    use serde_json::json;

    fn sample_bundle() -> ProofBundle {
        ProofBundle::new(json!({
            "proofPoints": {
                "a": ["1", "2", "1"],
                "b": [["1", "2"], ["3", "4"], ["1", "0"]],
                "c": ["5", "6", "1"]
            },
            "issBase64Details": {
                "value": "wiaXNzIjoiaHR0cHM6Ly9hY2NvdW50cy5nb29nbGUuY29tIiw",
                "indexMod4": 1
            },
            "headerBase64": "eyJhbGciOiJSUzI1NiJ9"
        }))
    }

    #[test]
    fn test_user_signature_layout() {
        let keypair = EphemeralKeypair::generate().unwrap();
        let tx_bytes = b"transaction bytes";
        let sig = sign_transaction(&keypair, tx_bytes);

        assert_eq!(sig.as_bytes().len(), 97);
        assert_eq!(sig.as_bytes()[0], ED25519_FLAG);
        assert_eq!(&sig.as_bytes()[65..], keypair.public_key().as_bytes());

        let mut intent_msg = TRANSACTION_INTENT.to_vec();
        intent_msg.extend_from_slice(tx_bytes);
        let digest = blake2b256(&intent_msg);

        let mut raw = [0u8; 64];
        raw.copy_from_slice(&sig.as_bytes()[1..65]);
        assert!(keypair.public_key().verify(&digest, &raw));
    }

    #[test]
    fn test_assemble_merges_address_seed() {
        let keypair = EphemeralKeypair::generate().unwrap();
        let user_sig = sign_transaction(&keypair, b"tx");
        let seed = BigUint::from(123456789u64);

        let zk_sig = ZkLoginSignature::assemble(&sample_bundle(), &seed, 42, &user_sig).unwrap();

        assert_eq!(zk_sig.inputs.address_seed, "123456789");
        assert_eq!(zk_sig.inputs.iss_base64_details.index_mod_4, 1);
        assert_eq!(zk_sig.max_epoch, 42);

        let bytes = zk_sig.to_bytes().unwrap();
        assert_eq!(bytes[0], ZKLOGIN_FLAG);
        assert!(!zk_sig.to_base64().unwrap().is_empty());
    }

    #[test]
    fn test_assemble_rejects_opaque_bundle() {
        let keypair = EphemeralKeypair::generate().unwrap();
        let user_sig = sign_transaction(&keypair, b"tx");

        let result = ZkLoginSignature::assemble(
            &ProofBundle::new(json!({ "proof": "p" })),
            &BigUint::from(1u8),
            1,
            &user_sig,
        );
        assert!(matches!(result, Err(CryptoError::MalformedProof(_))));
    }
}
