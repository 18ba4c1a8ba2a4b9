//! Uniform bits and integers for the dealers and the parties.

use rand::{CryptoRng, Rng, SeedableRng, rngs::OsRng};
use scuttlebutt::{AesRng, ring::FiniteRing};
use swanky_field_binary::F2;

use crate::error::MpcError;

/// Source of uniform randomness used by both engines.
///
/// Implemented for every cryptographically secure generator, so callers pass
/// their `Rng + CryptoRng` around the way they normally would.
pub trait RandomBitSource {
    /// A uniform bit.
    fn next_bit(&mut self) -> F2;

    /// A uniform integer in `[0, bound)`. `bound` must be non-zero.
    fn next_int(&mut self, bound: u64) -> u64;
}

impl<R: Rng + CryptoRng> RandomBitSource for R {
    fn next_bit(&mut self) -> F2 {
        F2::random(self)
    }

    fn next_int(&mut self, bound: u64) -> u64 {
        debug_assert!(bound > 0);
        self.gen_range(0..bound)
    }
}

/// Seed a fresh [AesRng] from the operating system.
///
/// There is no fallback: if the OS cannot provide entropy the run is aborted.
pub fn entropy_rng() -> Result<AesRng, MpcError> {
    let rng = AesRng::from_rng(OsRng)?;
    Ok(rng)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_next_int_in_range() {
        let mut rng = AesRng::seed_from_u64(7);
        for bound in [1u64, 2, 8, 1000] {
            for _ in 0..200 {
                assert!(rng.next_int(bound) < bound);
            }
        }
    }

    #[test]
    fn test_next_bit_takes_both_values() {
        let mut rng = entropy_rng().unwrap();
        let ones = (0..256).filter(|_| rng.next_bit() == F2::ONE).count();
        assert!(ones > 0 && ones < 256);
    }
}
