//! Unique-uid generation behind an injected randomness capability.
//!
//! The catalog never talks to a process-global RNG; callers pass a
//! [`UidSource`] so tests can wire a deterministic sequence and production
//! code seeds a [`RandomUidSource`] once at startup.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::ModelError;
use crate::model::Uid;

/// Attempt budget before unique-uid generation gives up.
///
/// Exhausting it on a 64-bit space means something is broken, so the
/// resulting error is classified as internal rather than user error.
pub const UID_GENERATION_ATTEMPTS: usize = 1000;

/// Source of candidate 64-bit uids.
pub trait UidSource {
    /// Returns the next candidate uid. Candidates equal to zero or already
    /// in use in the relevant scope are discarded by the caller.
    fn next_uid(&mut self) -> Uid;
}

/// Entropy-seeded source producing positive 63-bit values.
#[derive(Debug)]
pub struct RandomUidSource {
    rng: StdRng,
}

impl RandomUidSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed-seed variant, useful to make a generator run reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomUidSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UidSource for RandomUidSource {
    fn next_uid(&mut self) -> Uid {
        // Top bit cleared: uids stay in the positive 63-bit range so they
        // survive being handled as signed integers by other tooling.
        self.rng.next_u64() >> 1
    }
}

/// Deterministic source counting up from a start value.
#[derive(Debug, Clone)]
pub struct SequenceUidSource {
    next: Uid,
}

impl SequenceUidSource {
    pub fn starting_at(next: Uid) -> Self {
        Self { next }
    }
}

impl UidSource for SequenceUidSource {
    fn next_uid(&mut self) -> Uid {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }
}

/// Draws candidates from `source` until one is nonzero and not `in_use`,
/// giving up after [`UID_GENERATION_ATTEMPTS`] draws.
pub fn generate_unique_uid(
    source: &mut dyn UidSource,
    mut in_use: impl FnMut(Uid) -> bool,
) -> Result<Uid, ModelError> {
    for _ in 0..UID_GENERATION_ATTEMPTS {
        let candidate = source.next_uid();
        if candidate != 0 && !in_use(candidate) {
            return Ok(candidate);
        }
    }

    Err(ModelError::UidExhausted {
        attempts: UID_GENERATION_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that returns the same value forever.
    struct Constant(Uid);

    impl UidSource for Constant {
        fn next_uid(&mut self) -> Uid {
            self.0
        }
    }

    #[test]
    fn test_skips_zero_and_used() {
        let mut source = SequenceUidSource::starting_at(0);
        // 0 is reserved, 1 and 2 are taken, 3 is the first free candidate.
        let uid = generate_unique_uid(&mut source, |uid| uid == 1 || uid == 2).unwrap();
        assert_eq!(uid, 3);
    }

    #[test]
    fn test_exhaustion_is_internal_error() {
        let mut source = Constant(42);
        let err = generate_unique_uid(&mut source, |_| true).unwrap_err();
        assert_eq!(
            err,
            ModelError::UidExhausted {
                attempts: UID_GENERATION_ATTEMPTS
            }
        );
    }

    #[test]
    fn test_zero_only_source_exhausts() {
        let mut source = Constant(0);
        assert!(generate_unique_uid(&mut source, |_| false).is_err());
    }

    #[test]
    fn test_random_source_is_positive_63_bit() {
        let mut source = RandomUidSource::seeded(7);
        for _ in 0..64 {
            assert_eq!(source.next_uid() >> 63, 0);
        }
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = RandomUidSource::seeded(123);
        let mut b = RandomUidSource::seeded(123);
        for _ in 0..8 {
            assert_eq!(a.next_uid(), b.next_uid());
        }
    }
}
