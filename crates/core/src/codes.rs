//! Reward and welcome code generation.
//!
//! Codes are promotional tokens, not credentials, so a non-cryptographic
//! generator is used and collisions are tolerated.

use rand::{Rng, seq::SliceRandom, thread_rng};
use serde::{Deserialize, Serialize};

/// Prefix for the one-time welcome code issued at session start.
pub const WELCOME_PREFIX: &str = "WELCOME-";

/// Prefix for the reward coupon issued after a qualifying checkout.
pub const REWARD_PREFIX: &str = "MAKI-";

/// Number of random characters following the prefix.
pub const CODE_SUFFIX_LEN: usize = 6;

/// Characters a code suffix is drawn from.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate `prefix` followed by [`CODE_SUFFIX_LEN`] characters from
/// [`CODE_ALPHABET`], using the thread-local generator.
pub fn generate(prefix: &str) -> String {
    generate_with(prefix, &mut thread_rng())
}

/// Generate a code from the given random source.
pub fn generate_with<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let mut code = String::with_capacity(prefix.len() + CODE_SUFFIX_LEN);

    code.push_str(prefix);
    code.extend(
        (0..CODE_SUFFIX_LEN)
            .filter_map(|_| CODE_ALPHABET.choose(rng))
            .map(|byte| char::from(*byte)),
    );

    code
}

/// Whether `code` has the shape of a generated code for `prefix`.
pub fn is_generated_code(prefix: &str, code: &str) -> bool {
    code.strip_prefix(prefix).is_some_and(|suffix| {
        suffix.len() == CODE_SUFFIX_LEN && suffix.bytes().all(|byte| CODE_ALPHABET.contains(&byte))
    })
}

/// A reward coupon generated at checkout. It is only ever shown to the
/// customer and announced in the order message; it is not written to the
/// coupon store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCoupon {
    /// The generated code.
    pub code: String,
}

impl RewardCoupon {
    /// Issue a new reward coupon with the given prefix.
    pub fn issue(prefix: &str) -> Self {
        Self {
            code: generate(prefix),
        }
    }

    /// Issue a reward coupon from a specific random source.
    pub fn issue_with<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> Self {
        Self {
            code: generate_with(prefix, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn generated_codes_have_prefix_and_six_alphanumerics() {
        for prefix in [WELCOME_PREFIX, REWARD_PREFIX] {
            let code = generate(prefix);

            assert!(
                is_generated_code(prefix, &code),
                "{code} is not a well-formed {prefix} code"
            );
            assert_eq!(code.len(), prefix.len() + CODE_SUFFIX_LEN);
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let first = generate_with(REWARD_PREFIX, &mut StdRng::seed_from_u64(7));
        let second = generate_with(REWARD_PREFIX, &mut StdRng::seed_from_u64(7));

        assert_eq!(first, second);
    }

    #[test]
    fn shape_check_rejects_malformed_codes() {
        assert!(!is_generated_code(REWARD_PREFIX, "MAKI-ABC"));
        assert!(!is_generated_code(REWARD_PREFIX, "MAKI-abcdef"));
        assert!(!is_generated_code(REWARD_PREFIX, "WELCOME-ABCDEF"));
        assert!(is_generated_code(REWARD_PREFIX, "MAKI-A1B2C3"));
    }
}
