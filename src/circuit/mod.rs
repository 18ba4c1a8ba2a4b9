//! Compatibility as a boolean circuit over XOR-shared wires (GMW),
//! with AND gates evaluated using Beaver triples.
//!
//! The circuit is `AND_i NOT(NOT x_i AND y_i)` for the three antigen bits:
//! three independent AND gates, then two AND gates reducing their outputs.

use rand::{CryptoRng, Rng};
use scuttlebutt::ring::FiniteRing;
use swanky_field_binary::F2;
use tracing::{Level, debug, instrument};

use crate::{
    channel::Channel,
    error::MpcError,
    oracle::{BloodType, INPUT_BITS},
    sharing::TripleShare,
};

pub mod gmw;

pub use gmw::GmwParty;

/// Number of AND gates in the circuit, which is the number of triples
/// each party needs.
pub const AND_GATE_COUNT: usize = INPUT_BITS as usize + (INPUT_BITS as usize - 1);

/// Which circuit input a party's private value is fed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputWire {
    Recipient,
    Donor,
}

/// The per-role behaviour of a circuit party.
///
/// NOT gates and the Beaver correction term both add a public value to the
/// shared wire, which must happen at exactly one of the two parties.
/// They are separate methods so they can be assigned independently.
pub trait Role: Send + 'static {
    const NAME: &'static str;
    const INPUT: InputWire;

    /// This party's share of `NOT a`, given its share of `a`.
    fn not(share: F2) -> F2;

    /// The public term `d * e` of a Beaver multiplication, or zero.
    fn correction(d: F2, e: F2) -> F2;
}

/// Holds the recipient input, applies NOT gates and the correction term.
pub struct Primary;

/// Holds the donor input.
pub struct Secondary;

impl Role for Primary {
    const NAME: &'static str = "primary";
    const INPUT: InputWire = InputWire::Recipient;

    fn not(share: F2) -> F2 {
        share + F2::ONE
    }

    fn correction(d: F2, e: F2) -> F2 {
        d * e
    }
}

impl Role for Secondary {
    const NAME: &'static str = "secondary";
    const INPUT: InputWire = InputWire::Donor;

    fn not(share: F2) -> F2 {
        share
    }

    fn correction(_d: F2, _e: F2) -> F2 {
        F2::ZERO
    }
}

pub type PrimaryParty = GmwParty<Primary>;
pub type SecondaryParty = GmwParty<Secondary>;

/// The pads a party used to blind its input bits,
/// which become the peer's shares of those bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputMsg {
    pub pads: [F2; INPUT_BITS as usize],
}

/// Shares of `d = a + u` and `e = b + v` for one AND gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opening {
    pub d: F2,
    pub e: F2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phase1Msg {
    pub openings: [Opening; INPUT_BITS as usize],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phase2Msg {
    pub opening: Opening,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phase3Msg {
    pub opening: Opening,
}

/// An AND gate that has been opened but not yet finished.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingAnd {
    triple: TripleShare,
    opening: Opening,
}

impl PendingAnd {
    pub(crate) fn open(a: F2, b: F2, triple: TripleShare) -> Self {
        Self {
            triple,
            opening: Opening {
                d: a + triple.u,
                e: b + triple.v,
            },
        }
    }

    pub(crate) fn opening(&self) -> Opening {
        self.opening
    }

    /// Combine with the peer's opening and return this party's share of `a * b`.
    ///
    /// a * b = (d + u)(e + v) = d*e + d*v + e*u + w
    pub(crate) fn finish<R: Role>(self, peer: Opening) -> F2 {
        let d = self.opening.d + peer.d;
        let e = self.opening.e + peer.e;
        self.triple.w + e * self.triple.u + d * self.triple.v + R::correction(d, e)
    }
}

/// A party of the circuit engine. The phases must be called in order and each
/// phase's message must reach the peer before the peer runs the next phase.
pub trait CircuitParty {
    /// Blind the private input. Keeps one share of every input bit and returns
    /// the pads for the peer.
    fn share_input<G>(&mut self, rng: &mut G, input: BloodType) -> Result<InputMsg, MpcError>
    where
        G: Rng + CryptoRng;

    /// Store the peer's pads as this party's shares of the peer's input.
    fn receive_input(&mut self, msg: InputMsg) -> Result<(), MpcError>;

    /// Open the three gates `NOT x_i AND y_i`.
    fn phase1(&mut self) -> Result<Phase1Msg, MpcError>;

    /// Finish the first layer and open `z0 AND z1`.
    fn phase2(&mut self, peer: Phase1Msg) -> Result<Phase2Msg, MpcError>;

    /// Finish `z0 AND z1` and open `(z0 AND z1) AND z2`.
    fn phase3(&mut self, peer: Phase2Msg) -> Result<Phase3Msg, MpcError>;

    /// Finish the last gate. Returns this party's share of the output bit.
    fn phase4(&mut self, peer: Phase3Msg) -> Result<F2, MpcError>;
}

/// Everything the circuit parties send each other over a [Channel].
#[derive(Clone, Copy, Debug)]
pub enum CircuitMsg {
    Input(InputMsg),
    Phase1(Phase1Msg),
    Phase2(Phase2Msg),
    Phase3(Phase3Msg),
}

impl CircuitMsg {
    fn expect_input(self) -> Result<InputMsg, MpcError> {
        match self {
            CircuitMsg::Input(msg) => Ok(msg),
            other => Err(MpcError::UnexpectedMessageType(format!(
                "expected input, got {other:?}"
            ))),
        }
    }

    fn expect_phase1(self) -> Result<Phase1Msg, MpcError> {
        match self {
            CircuitMsg::Phase1(msg) => Ok(msg),
            other => Err(MpcError::UnexpectedMessageType(format!(
                "expected phase 1, got {other:?}"
            ))),
        }
    }

    fn expect_phase2(self) -> Result<Phase2Msg, MpcError> {
        match self {
            CircuitMsg::Phase2(msg) => Ok(msg),
            other => Err(MpcError::UnexpectedMessageType(format!(
                "expected phase 2, got {other:?}"
            ))),
        }
    }

    fn expect_phase3(self) -> Result<Phase3Msg, MpcError> {
        match self {
            CircuitMsg::Phase3(msg) => Ok(msg),
            other => Err(MpcError::UnexpectedMessageType(format!(
                "expected phase 3, got {other:?}"
            ))),
        }
    }
}

/// Run all phases of one party against its peer on the other end of `channel`.
/// Returns this party's output share.
#[instrument(level = Level::DEBUG, skip_all, fields(input = %input), err)]
pub fn run_party<P, C, G>(
    party: &mut P,
    channel: &C,
    rng: &mut G,
    input: BloodType,
) -> Result<F2, MpcError>
where
    P: CircuitParty,
    C: Channel<CircuitMsg>,
    G: Rng + CryptoRng,
{
    channel.send(CircuitMsg::Input(party.share_input(rng, input)?))?;
    party.receive_input(channel.recv()?.expect_input()?)?;
    debug!("input phase done");

    channel.send(CircuitMsg::Phase1(party.phase1()?))?;
    let peer = channel.recv()?.expect_phase1()?;
    channel.send(CircuitMsg::Phase2(party.phase2(peer)?))?;
    let peer = channel.recv()?.expect_phase2()?;
    channel.send(CircuitMsg::Phase3(party.phase3(peer)?))?;
    let peer = channel.recv()?.expect_phase3()?;
    let share = party.phase4(peer)?;
    debug!("all phases done");
    Ok(share)
}
