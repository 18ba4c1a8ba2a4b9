use std::marker::PhantomData;

use itertools::Itertools;
use rand::{CryptoRng, Rng};
use scuttlebutt::ring::FiniteRing;
use swanky_field_binary::F2;
use tracing::trace;

use crate::{
    error::MpcError,
    oracle::{BloodType, INPUT_BITS},
    prep::TripleStore,
    sharing::secret_share,
};

use super::{
    CircuitParty, InputMsg, InputWire, Opening, PendingAnd, Phase1Msg, Phase2Msg, Phase3Msg, Role,
};

const N: usize = INPUT_BITS as usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Input { shared: bool, received: bool },
    Phase1,
    Phase2,
    Phase3,
    Phase4,
    Done,
}

/// A circuit party for role `R`.
pub struct GmwParty<R: Role> {
    triples: TripleStore,
    /// Shares of the recipient bits.
    x: [F2; N],
    /// Shares of the donor bits.
    y: [F2; N],
    /// Shares of the gate outputs of the current layer.
    z: [F2; N],
    pending: Vec<PendingAnd>,
    stage: Stage,
    _role: PhantomData<R>,
}

impl<R: Role> GmwParty<R> {
    pub fn new(triples: TripleStore) -> Self {
        Self {
            triples,
            x: [F2::ZERO; N],
            y: [F2::ZERO; N],
            z: [F2::ZERO; N],
            pending: Vec::with_capacity(N),
            stage: Stage::Input {
                shared: false,
                received: false,
            },
            _role: PhantomData,
        }
    }

    /// Triples left in this party's store.
    pub fn remaining_triples(&self) -> usize {
        self.triples.remaining()
    }

    fn check_stage(&self, expected: Stage, what: &'static str) -> Result<(), MpcError> {
        if self.stage != expected {
            return Err(MpcError::PhaseOrder(what));
        }
        Ok(())
    }

    fn input_done(&mut self, shared: bool, received: bool) {
        self.stage = if shared && received {
            Stage::Phase1
        } else {
            Stage::Input { shared, received }
        };
    }

    fn own_wire(&mut self) -> &mut [F2; N] {
        match R::INPUT {
            InputWire::Recipient => &mut self.x,
            InputWire::Donor => &mut self.y,
        }
    }

    fn peer_wire(&mut self) -> &mut [F2; N] {
        match R::INPUT {
            InputWire::Recipient => &mut self.y,
            InputWire::Donor => &mut self.x,
        }
    }

    fn open_and(&mut self, a: F2, b: F2) -> Result<Opening, MpcError> {
        let gate = PendingAnd::open(a, b, self.triples.next_triple()?);
        self.pending.push(gate);
        Ok(gate.opening())
    }

    fn finish_single(&mut self, peer: Opening) -> F2 {
        debug_assert_eq!(self.pending.len(), 1);
        let gate = self.pending.remove(0);
        gate.finish::<R>(peer)
    }
}

impl<R: Role> CircuitParty for GmwParty<R> {
    fn share_input<G>(&mut self, rng: &mut G, input: BloodType) -> Result<InputMsg, MpcError>
    where
        G: Rng + CryptoRng,
    {
        let Stage::Input { shared, received } = self.stage else {
            return Err(MpcError::PhaseOrder("input shared after the input phase"));
        };
        if shared {
            return Err(MpcError::PhaseOrder("input shared twice"));
        }

        // the pad is the peer's share, the padded bit is ours
        let mut pads = [F2::ZERO; N];
        let own = self.own_wire();
        for ((share, pad), bit) in own.iter_mut().zip_eq(pads.iter_mut()).zip_eq(input.bits()) {
            (*pad, *share) = secret_share(bit, rng);
        }
        trace!(role = R::NAME, "input blinded");
        self.input_done(true, received);
        Ok(InputMsg { pads })
    }

    fn receive_input(&mut self, msg: InputMsg) -> Result<(), MpcError> {
        let Stage::Input { shared, received } = self.stage else {
            return Err(MpcError::PhaseOrder("input received after the input phase"));
        };
        if received {
            return Err(MpcError::PhaseOrder("input received twice"));
        }
        *self.peer_wire() = msg.pads;
        self.input_done(shared, true);
        Ok(())
    }

    fn phase1(&mut self) -> Result<Phase1Msg, MpcError> {
        self.check_stage(Stage::Phase1, "phase 1 before the input phase finished")?;
        self.z = self.x.map(R::not);

        let mut openings = [Opening {
            d: F2::ZERO,
            e: F2::ZERO,
        }; N];
        for (i, opening) in openings.iter_mut().enumerate() {
            *opening = self.open_and(self.z[i], self.y[i])?;
        }
        trace!(role = R::NAME, "phase 1 done");
        self.stage = Stage::Phase2;
        Ok(Phase1Msg { openings })
    }

    fn phase2(&mut self, peer: Phase1Msg) -> Result<Phase2Msg, MpcError> {
        self.check_stage(Stage::Phase2, "phase 2 before phase 1")?;
        debug_assert_eq!(self.pending.len(), N);
        for ((z, gate), peer) in self
            .z
            .iter_mut()
            .zip_eq(self.pending.drain(..))
            .zip_eq(peer.openings)
        {
            *z = R::not(gate.finish::<R>(peer));
        }

        let opening = self.open_and(self.z[0], self.z[1])?;
        trace!(role = R::NAME, "phase 2 done");
        self.stage = Stage::Phase3;
        Ok(Phase2Msg { opening })
    }

    fn phase3(&mut self, peer: Phase2Msg) -> Result<Phase3Msg, MpcError> {
        self.check_stage(Stage::Phase3, "phase 3 before phase 2")?;
        self.z[0] = self.finish_single(peer.opening);

        let opening = self.open_and(self.z[0], self.z[2])?;
        trace!(role = R::NAME, "phase 3 done");
        self.stage = Stage::Phase4;
        Ok(Phase3Msg { opening })
    }

    fn phase4(&mut self, peer: Phase3Msg) -> Result<F2, MpcError> {
        self.check_stage(Stage::Phase4, "phase 4 before phase 3")?;
        self.z[0] = self.finish_single(peer.opening);
        trace!(role = R::NAME, "phase 4 done");
        self.stage = Stage::Done;
        Ok(self.z[0])
    }
}
