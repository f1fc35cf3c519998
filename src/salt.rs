//! Order salt generation.
//!
//! Salts make otherwise identical orders hash differently. Production code
//! uses [`OsSaltSource`]; tests inject a [`FixedSalt`].

use alloy_primitives::U256;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::error::{EngineError, Result};

/// Source of non-zero 256-bit salts. Implementations must never return zero.
pub trait SaltSource {
    fn next_salt(&mut self) -> U256;
}

/// Salts drawn from the operating system's CSPRNG
#[derive(Debug, Default)]
pub struct OsSaltSource {
    _private: (),
}

impl OsSaltSource {
    /// Probe the OS random source once. A missing source is a startup error.
    pub fn new() -> Result<Self> {
        let mut probe = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut probe)
            .map_err(|e| EngineError::RandomSource(e.to_string()))?;
        Ok(Self { _private: () })
    }
}

impl SaltSource for OsSaltSource {
    fn next_salt(&mut self) -> U256 {
        let mut bytes = [0u8; 32];
        loop {
            if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
                // Source failed after the startup probe
                warn!("OS random source failed ({}), using time-seeded salt", e);
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(1);
                StdRng::seed_from_u64(nanos).fill_bytes(&mut bytes);
            }
            let salt = U256::from_be_bytes(bytes);
            if !salt.is_zero() {
                return salt;
            }
        }
    }
}

/// Always returns the same salt
#[derive(Debug, Clone, Copy)]
pub struct FixedSalt(U256);

impl FixedSalt {
    /// Zero is replaced by one.
    pub fn new(salt: U256) -> Self {
        Self(salt.max(U256::from(1u8)))
    }
}

impl SaltSource for FixedSalt {
    fn next_salt(&mut self) -> U256 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_salts_are_non_zero_and_distinct() {
        let mut source = OsSaltSource::new().unwrap();
        let a = source.next_salt();
        let b = source.next_salt();
        assert!(!a.is_zero());
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_salt_never_zero() {
        assert_eq!(FixedSalt::new(U256::ZERO).next_salt(), U256::from(1u8));
        assert_eq!(FixedSalt::new(U256::from(42u8)).next_salt(), U256::from(42u8));
    }
}
