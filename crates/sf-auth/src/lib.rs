//! Session tokens and verification codes for Sound Factory.
//!
//! Two small concerns shared by the API service and the operator tooling:
//! generating/hashing the 6-digit SMS codes, and signing/verifying the HS256
//! session tokens issued once a phone number is verified.

use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};

mod token;
pub use token::{Claims, SessionKeys, TokenError};

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// Generate a random verification code, zero-padded to [`CODE_LENGTH`]
/// digits.
///
/// Drawn uniformly from `000000..=999999` using the operating system RNG.
#[must_use]
pub fn generate_code() -> String {
    let n: u32 = OsRng.gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Hash a verification code for storage.
///
/// Computed as lowercase hex of `SHA-256("{code}:{phone}:{pepper}")`. Binding
/// the phone into the preimage ties each hash to one recipient; the pepper
/// keeps leaked rows useless without the server config.
#[must_use]
pub fn hash_code(code: &str, phone: &str, pepper: &str) -> String {
    let digest = Sha256::digest(format!("{code}:{phone}:{pepper}").as_bytes());
    format!("{digest:x}")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every generated code is exactly six ASCII digits.
        #[test]
        fn generated_codes_are_well_formed(_seed in 0u8..32) {
            let code = generate_code();
            prop_assert_eq!(code.len(), CODE_LENGTH);
            prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
        }

        /// Hashing never panics and always yields 64 hex characters.
        #[test]
        fn hash_output_shape(code in "[0-9]{6}", phone in "\\+[0-9]{8,15}", pepper in ".{0,32}") {
            let hash = hash_code(&code, &phone, &pepper);
            prop_assert_eq!(hash.len(), 64);
            prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
