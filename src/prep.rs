//! Offline preprocessing by a trusted dealer.
//!
//! The dealer never sees a private input. It runs before the online phase,
//! hands each party its own share of the correlated randomness and is not
//! involved afterwards.

use itertools::Itertools;
use rand::{CryptoRng, Rng};
use swanky_field_binary::F2;
use tracing::{Level, debug, instrument};

use crate::{error::MpcError, random::RandomBitSource, sharing::TripleShare};

/// Largest input bit width the table dealer accepts, the table has `4^n` cells.
pub const MAX_TABLE_BITS: u32 = 12;

/// Beaver triples for the circuit engine, index aligned between the parties.
pub struct BeaverDealer {
    triples_a: Vec<TripleShare>,
    triples_b: Vec<TripleShare>,
}

impl BeaverDealer {
    #[instrument(level = Level::DEBUG, skip(rng))]
    pub fn new<R>(rng: &mut R, count: usize) -> Self
    where
        R: Rng + CryptoRng,
    {
        let (triples_a, triples_b) = (0..count)
            .map(|_| {
                let ua = rng.next_bit();
                let ub = rng.next_bit();
                let va = rng.next_bit();
                let vb = rng.next_bit();
                let wa = rng.next_bit();
                let wb = (ua + ub) * (va + vb) + wa;
                (
                    TripleShare {
                        u: ua,
                        v: va,
                        w: wa,
                    },
                    TripleShare {
                        u: ub,
                        v: vb,
                        w: wb,
                    },
                )
            })
            .unzip();
        debug!("dealt {count} Beaver triples");
        Self {
            triples_a,
            triples_b,
        }
    }

    pub fn shares_a(&self) -> &[TripleShare] {
        &self.triples_a
    }

    pub fn shares_b(&self) -> &[TripleShare] {
        &self.triples_b
    }

    pub fn into_stores(self) -> (TripleStore, TripleStore) {
        (
            TripleStore::new(self.triples_a),
            TripleStore::new(self.triples_b),
        )
    }
}

/// A party's triples with a cursor that only moves forward.
///
/// Both parties must take triples in the same order,
/// otherwise every following AND gate is silently wrong.
#[derive(Clone, Debug)]
pub struct TripleStore {
    triples: Vec<TripleShare>,
    cursor: usize,
}

impl TripleStore {
    pub fn new(triples: Vec<TripleShare>) -> Self {
        Self { triples, cursor: 0 }
    }

    pub fn next_triple(&mut self) -> Result<TripleShare, MpcError> {
        let triple = self
            .triples
            .get(self.cursor)
            .copied()
            .ok_or(MpcError::TripleExhaustion {
                requested: self.cursor,
                available: self.triples.len(),
            })?;
        self.cursor += 1;
        Ok(triple)
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.triples.len() - self.cursor
    }
}

/// A `2^n x 2^n` bit matrix, row major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskedTable {
    bits: u32,
    cells: Vec<F2>,
}

impl MaskedTable {
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn size(&self) -> u64 {
        1 << self.bits
    }

    pub fn get(&self, row: u64, col: u64) -> Result<F2, MpcError> {
        let size = self.size();
        for index in [row, col] {
            if index >= size {
                return Err(MpcError::IndexOutOfRange { index, bound: size });
            }
        }
        Ok(self.cells[(row * size + col) as usize])
    }
}

/// What the table dealer gives to one party: the secret offset and its table.
#[derive(Clone, Debug)]
pub struct TableShare {
    pub offset: u64,
    pub table: MaskedTable,
}

/// One-time truth tables for the masked lookup engine.
///
/// `Ma[i][j] + Mb[i][j] = f((i - r) mod 2^n, (j - s) mod 2^n)`, where the
/// initiator gets `(r, Ma)` and the responder gets `(s, Mb)`.
pub struct TableDealer {
    initiator: TableShare,
    responder: TableShare,
}

impl TableDealer {
    #[instrument(level = Level::DEBUG, skip(rng, predicate), err)]
    pub fn new<R, F>(rng: &mut R, bits: u32, predicate: F) -> Result<Self, MpcError>
    where
        R: Rng + CryptoRng,
        F: Fn(u64, u64) -> F2,
    {
        if bits == 0 || bits > MAX_TABLE_BITS {
            return Err(MpcError::UnsupportedParameter(format!(
                "table bit width {bits} must be in [1, {MAX_TABLE_BITS}]"
            )));
        }
        let size: u64 = 1 << bits;
        let r = rng.next_int(size);
        let s = rng.next_int(size);

        let (cells_a, cells_b): (Vec<F2>, Vec<F2>) = (0..size)
            .cartesian_product(0..size)
            .map(|(i, j)| {
                let t1 = rng.next_bit();
                let t2 = predicate((i + size - r) % size, (j + size - s) % size);
                (t1 + t2, t1)
            })
            .unzip();
        debug!(size, "dealt masked truth tables");

        Ok(Self {
            initiator: TableShare {
                offset: r,
                table: MaskedTable {
                    bits,
                    cells: cells_a,
                },
            },
            responder: TableShare {
                offset: s,
                table: MaskedTable {
                    bits,
                    cells: cells_b,
                },
            },
        })
    }

    pub fn initiator_share(&self) -> &TableShare {
        &self.initiator
    }

    pub fn responder_share(&self) -> &TableShare {
        &self.responder
    }

    pub fn into_shares(self) -> (TableShare, TableShare) {
        (self.initiator, self.responder)
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use scuttlebutt::{AesRng, ring::FiniteRing};

    use super::*;
    use crate::oracle::{INPUT_BITS, compatibility_bit};

    #[test]
    fn test_beaver_invariant() {
        let mut rng = AesRng::seed_from_u64(3);
        // fresh randomness every round, the invariant must always hold
        for _ in 0..20 {
            let dealer = BeaverDealer::new(&mut rng, 64);
            assert_eq!(dealer.shares_a().len(), 64);
            assert_eq!(dealer.shares_b().len(), 64);
            for (a, b) in dealer.shares_a().iter().zip(dealer.shares_b()) {
                assert_eq!(a.w + b.w, (a.u + b.u) * (a.v + b.v));
            }
        }
    }

    #[test]
    fn test_triple_store_exhaustion() {
        let mut rng = AesRng::seed_from_u64(4);
        let (mut store, _) = BeaverDealer::new(&mut rng, 2).into_stores();
        assert!(store.next_triple().is_ok());
        assert!(store.next_triple().is_ok());
        assert_eq!(store.consumed(), 2);
        assert_eq!(store.remaining(), 0);
        assert!(matches!(
            store.next_triple(),
            Err(MpcError::TripleExhaustion {
                requested: 2,
                available: 2
            })
        ));
        // the cursor does not move past the end
        assert_eq!(store.consumed(), 2);
    }

    #[test]
    fn test_triple_store_order() {
        let mut rng = AesRng::seed_from_u64(5);
        let dealer = BeaverDealer::new(&mut rng, 5);
        let expected = dealer.shares_a().to_vec();
        let (mut store, _) = dealer.into_stores();
        for triple in expected {
            assert_eq!(store.next_triple().unwrap(), triple);
        }
    }

    #[test]
    fn test_table_invariant() {
        let mut rng = AesRng::seed_from_u64(6);
        for _ in 0..20 {
            let dealer = TableDealer::new(&mut rng, INPUT_BITS, compatibility_bit).unwrap();
            let (a, b) = dealer.into_shares();
            let size = a.table.size();
            assert_eq!(size, 8);
            assert!(a.offset < size && b.offset < size);
            for i in 0..size {
                for j in 0..size {
                    let cell = a.table.get(i, j).unwrap() + b.table.get(i, j).unwrap();
                    let expected =
                        compatibility_bit((i + size - a.offset) % size, (j + size - b.offset) % size);
                    assert_eq!(cell, expected);
                }
            }
        }
    }

    #[test]
    fn test_table_bounds() {
        let mut rng = AesRng::seed_from_u64(7);
        assert!(matches!(
            TableDealer::new(&mut rng, 0, |_, _| F2::ZERO),
            Err(MpcError::UnsupportedParameter(_))
        ));
        assert!(matches!(
            TableDealer::new(&mut rng, MAX_TABLE_BITS + 1, |_, _| F2::ZERO),
            Err(MpcError::UnsupportedParameter(_))
        ));
        let dealer = TableDealer::new(&mut rng, 2, |_, _| F2::ZERO).unwrap();
        let table = &dealer.initiator_share().table;
        assert_eq!(table.bits(), 2);
        assert!(matches!(
            table.get(4, 0),
            Err(MpcError::IndexOutOfRange { index: 4, bound: 4 })
        ));
        assert!(table.get(3, 3).is_ok());
    }
}
