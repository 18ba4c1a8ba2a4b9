use rand::{CryptoRng, Rng};
use scuttlebutt::ring::FiniteRing;
use swanky_field_binary::F2;

use crate::random::RandomBitSource;

/// One party's share of a Beaver triple (u, v, w) where w = u * v.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TripleShare {
    pub u: F2,
    pub v: F2,
    pub w: F2,
}

/// Split `secret` into two XOR-shares.
/// The first share is uniform, the second one completes the secret.
pub fn secret_share<R>(secret: F2, rng: &mut R) -> (F2, F2)
where
    R: Rng + CryptoRng,
{
    let pad = rng.next_bit();
    (pad, secret + pad)
}

pub fn reconstruct(a: F2, b: F2) -> F2 {
    a + b
}

pub fn f2_from_bool(bit: bool) -> F2 {
    if bit { F2::ONE } else { F2::ZERO }
}

pub fn f2_to_u8(bit: F2) -> u8 {
    if bit == F2::ZERO { 0 } else { 1 }
}

/// Little-endian bit decomposition of the low `N` bits of `value`.
pub fn bit_decompose<const N: usize>(value: u64) -> [F2; N] {
    std::array::from_fn(|i| f2_from_bool((value >> i) & 1 == 1))
}
