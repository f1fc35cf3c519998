//! EIP-712 hashing for CTF exchange orders

use alloy_primitives::{Address, U256};
use sha3::{Digest, Keccak256};

use crate::order::Order;

pub const DOMAIN_NAME: &str = "Polymarket CTF Exchange";
pub const DOMAIN_VERSION: &str = "1";

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const ORDER_TYPE: &[u8] = b"Order(uint256 salt,address maker,address signer,address taker,uint256 tokenId,uint256 makerAmount,uint256 takerAmount,uint256 expiration,uint256 nonce,uint256 feeRateBps,uint8 side,uint8 signatureType)";

/// Keccak256 hash helper
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

fn word_u256(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

fn word_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_address(address: Address) -> [u8; 32] {
    // left-padded to 32 bytes
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// Domain separator of the exchange contract on `chain_id`
pub fn domain_separator(chain_id: u64, verifying_contract: Address) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(32 * 5);
    encoded.extend_from_slice(&keccak256(DOMAIN_TYPE));
    encoded.extend_from_slice(&keccak256(DOMAIN_NAME.as_bytes()));
    encoded.extend_from_slice(&keccak256(DOMAIN_VERSION.as_bytes()));
    encoded.extend_from_slice(&word_u64(chain_id));
    encoded.extend_from_slice(&word_address(verifying_contract));
    keccak256(&encoded)
}

/// hashStruct(Order)
pub fn order_struct_hash(order: &Order) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(32 * 13);
    encoded.extend_from_slice(&keccak256(ORDER_TYPE));
    encoded.extend_from_slice(&word_u256(order.salt));
    encoded.extend_from_slice(&word_address(order.maker));
    encoded.extend_from_slice(&word_address(order.signer));
    encoded.extend_from_slice(&word_address(order.taker));
    encoded.extend_from_slice(&word_u256(order.token_id));
    encoded.extend_from_slice(&word_u256(order.maker_amount));
    encoded.extend_from_slice(&word_u256(order.taker_amount));
    encoded.extend_from_slice(&word_u256(order.expiration));
    encoded.extend_from_slice(&word_u256(order.nonce));
    encoded.extend_from_slice(&word_u256(order.fee_rate_bps));
    encoded.extend_from_slice(&word_u64(order.side.as_u8() as u64));
    encoded.extend_from_slice(&word_u64(order.signature_type as u64));
    keccak256(&encoded)
}

/// keccak256(0x1901 || domainSeparator || hashStruct(order))
pub fn order_digest(order: &Order, domain_separator: &[u8; 32]) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(66);
    encoded.extend_from_slice(&[0x19, 0x01]);
    encoded.extend_from_slice(domain_separator);
    encoded.extend_from_slice(&order_struct_hash(order));
    keccak256(&encoded)
}
