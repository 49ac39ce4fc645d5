use crate::Generator;
use parking_lot::Mutex;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snip_core::ShortCode;

/// Length of generated short codes.
pub const DEFAULT_LENGTH: usize = 6;

/// Draws codes uniformly from `[a-zA-Z0-9]`.
///
/// 62^6 (about 5.7e10) possible six-character codes.
#[derive(Debug)]
pub struct RandomGenerator {
    length: usize,
    rng: Mutex<StdRng>,
}

impl RandomGenerator {
    /// Six-character codes from an OS-seeded generator.
    pub fn new() -> Self {
        Self::from_rng(DEFAULT_LENGTH, StdRng::from_os_rng())
    }

    /// Six-character codes from a fixed seed, for reproducible sequences.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(DEFAULT_LENGTH, StdRng::seed_from_u64(seed))
    }

    /// Codes of `length` characters from an OS-seeded generator.
    pub fn with_length(length: usize) -> Self {
        Self::from_rng(length, StdRng::from_os_rng())
    }

    fn from_rng(length: usize, rng: StdRng) -> Self {
        Self {
            length,
            rng: Mutex::new(rng),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let mut rng = self.rng.lock();
        let code: String = (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        ShortCode::new_unchecked(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generates_six_alphanumeric_characters() {
        let generator = RandomGenerator::new();

        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
            // generated codes also satisfy the custom-code rules
            assert!(ShortCode::new(code.as_str()).is_ok());
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = RandomGenerator::with_seed(42);
        let b = RandomGenerator::with_seed(42);

        for _ in 0..10 {
            assert_eq!(a.generate(), b.generate());
        }
    }

    #[test]
    fn codes_rarely_repeat() {
        let generator = RandomGenerator::with_seed(7);
        let codes: HashSet<_> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn uses_the_whole_alphabet() {
        let generator = RandomGenerator::with_seed(1);
        let seen: HashSet<char> = (0..2000)
            .flat_map(|_| generator.generate().as_str().chars().collect::<Vec<_>>())
            .collect();

        assert!(seen.iter().any(|c| c.is_ascii_lowercase()));
        assert!(seen.iter().any(|c| c.is_ascii_uppercase()));
        assert!(seen.iter().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn custom_length() {
        let generator = RandomGenerator::with_length(8);
        assert_eq!(generator.length(), 8);
        assert_eq!(generator.generate().as_str().len(), 8);
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomGenerator>();
    }
}
