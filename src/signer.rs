//! Local-key order signing.
//!
//! Signs the EIP-712 digest of an [`Order`] with a caller-supplied secp256k1
//! key. Key storage is the caller's business.

use alloy_primitives::Address;
use secp256k1::{ecdsa::RecoverableSignature, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::eip712::{domain_separator, keccak256, order_digest};
use crate::error::{EngineError, Result};
use crate::order::{Order, OrderPayload};

/// Transport payload plus its `0x`-prefixed 65-byte signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
    #[serde(flatten)]
    pub order: OrderPayload,
    pub signature: String,
}

/// Ethereum address of a secp256k1 public key
pub fn address_of(public_key: &PublicKey) -> Address {
    // Drop the 0x04 uncompressed prefix
    let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
    Address::from_slice(&hash[12..])
}

pub struct LocalSigner {
    secp: Secp256k1<secp256k1::All>,
    secret_key: SecretKey,
    address: Address,
}

impl LocalSigner {
    /// Parse a hex private key, with or without `0x`.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let private_key = private_key.trim();
        let private_key = private_key.strip_prefix("0x").unwrap_or(private_key);
        let key_bytes = hex::decode(private_key)
            .map_err(|e| EngineError::Signing(format!("failed to decode private key: {}", e)))?;
        let secret_key = SecretKey::from_slice(&key_bytes)
            .map_err(|e| EngineError::Signing(format!("invalid private key: {}", e)))?;

        let secp = Secp256k1::new();
        let address = address_of(&PublicKey::from_secret_key(&secp, &secret_key));
        Ok(Self {
            secp,
            secret_key,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest, returning r || s || v with v = 27 + recovery id
    pub fn sign_digest(&self, digest: [u8; 32]) -> [u8; 65] {
        let msg = Message::from_digest(digest);
        let sig = self.secp.sign_ecdsa_recoverable(&msg, &self.secret_key);
        let (rec_id, sig_bytes) = sig.serialize_compact();

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&sig_bytes);
        out[64] = 27 + rec_id.to_i32() as u8;
        out
    }

    /// Sign `order` for the exchange at `verifying_contract` on `chain_id`.
    ///
    /// The order's signer field must be this key's address.
    pub fn sign_order(
        &self,
        order: &Order,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Result<SignedOrder> {
        if order.signer != self.address {
            return Err(EngineError::Signing(format!(
                "order signer {} does not match key address {}",
                order.signer, self.address
            )));
        }

        let domain = domain_separator(chain_id, verifying_contract);
        let signature = self.sign_digest(order_digest(order, &domain));

        info!("Signed order for maker {} (signer {})", order.maker, order.signer);

        Ok(SignedOrder {
            order: order.to_payload(),
            signature: format!("0x{}", hex::encode(signature)),
        })
    }
}

/// Recover the signing address from an r || s || v signature over `digest`
pub fn recover_address(digest: [u8; 32], signature: &[u8; 65]) -> Result<Address> {
    let rec_id = secp256k1::ecdsa::RecoveryId::from_i32(signature[64] as i32 - 27)
        .map_err(|e| EngineError::Signing(e.to_string()))?;
    let sig = RecoverableSignature::from_compact(&signature[..64], rec_id)
        .map_err(|e| EngineError::Signing(e.to_string()))?;
    let secp = Secp256k1::verification_only();
    let public_key = secp
        .recover_ecdsa(&Message::from_digest(digest), &sig)
        .map_err(|e| EngineError::Signing(e.to_string()))?;
    Ok(address_of(&public_key))
}
