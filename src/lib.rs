//! Blood-type compatibility computed by two parties that do not reveal their
//! blood types to each other, with two engines:
//!
//! - [circuit]: a boolean circuit over XOR-shared bits, AND gates via Beaver triples.
//! - [lookup]: a single masked lookup into a one-time truth table.
//!
//! Both rely on a trusted dealer ([prep]) for correlated randomness.

use std::thread;

use rand::{CryptoRng, Rng};
use swanky_field_binary::F2;
use tracing::{Level, debug, info, instrument};

use crate::{
    channel::mem_channel_pair,
    circuit::{AND_GATE_COUNT, CircuitParty, PrimaryParty, SecondaryParty},
    error::MpcError,
    lookup::{Initiator, Responder},
    oracle::{BloodType, INPUT_BITS, compatibility_bit},
    prep::{BeaverDealer, TableDealer},
    random::entropy_rng,
    sharing::{f2_from_bool, f2_to_u8, reconstruct},
};

pub mod channel;
pub mod circuit;
pub mod error;
pub mod lookup;
pub mod oracle;
pub mod prep;
pub mod random;
pub mod sharing;

/// Run the circuit engine with both parties driven from the calling thread,
/// one phase at a time. `progress` is called after every completed round.
#[instrument(level = Level::DEBUG, skip_all, fields(%recipient, %donor), err)]
pub fn simulate_circuit_lockstep<G, F>(
    rng: &mut G,
    recipient: BloodType,
    donor: BloodType,
    mut progress: F,
) -> Result<F2, MpcError>
where
    G: Rng + CryptoRng,
    F: FnMut(&'static str),
{
    let (store_a, store_b) = BeaverDealer::new(rng, AND_GATE_COUNT).into_stores();
    let mut a = PrimaryParty::new(store_a);
    let mut b = SecondaryParty::new(store_b);
    progress("Parties initialized");

    b.receive_input(a.share_input(rng, recipient)?)?;
    a.receive_input(b.share_input(rng, donor)?)?;
    progress("Input phase done");

    let (msg_a, msg_b) = (a.phase1()?, b.phase1()?);
    progress("Phase1 done");
    let (msg_a, msg_b) = (a.phase2(msg_b)?, b.phase2(msg_a)?);
    progress("Phase2 done");
    let (msg_a, msg_b) = (a.phase3(msg_b)?, b.phase3(msg_a)?);
    progress("Phase3 done");
    let (out_a, out_b) = (a.phase4(msg_b)?, b.phase4(msg_a)?);
    progress("Phase4 done");

    Ok(reconstruct(out_a, out_b))
}

/// Run the circuit engine with every party on its own thread,
/// talking over an in-memory channel.
#[instrument(level = Level::DEBUG, skip_all, fields(%recipient, %donor), err)]
pub fn simulate_circuit(recipient: BloodType, donor: BloodType) -> Result<F2, MpcError> {
    let mut rng = entropy_rng()?;
    let (store_a, store_b) = BeaverDealer::new(&mut rng, AND_GATE_COUNT).into_stores();
    let (chan_a, chan_b) = mem_channel_pair();

    let secondary = thread::spawn(move || -> Result<F2, MpcError> {
        let mut rng = entropy_rng()?;
        let mut party = SecondaryParty::new(store_b);
        circuit::run_party(&mut party, &chan_b, &mut rng, donor)
    });

    let mut party = PrimaryParty::new(store_a);
    let share_a = circuit::run_party(&mut party, &chan_a, &mut rng, recipient);
    // a failed primary must not leave the secondary blocked on recv
    drop(chan_a);
    let share_b = secondary.join().map_err(|_| MpcError::PartyPanicked)?;
    Ok(reconstruct(share_a?, share_b?))
}

/// Run the lookup engine from the calling thread.
#[instrument(level = Level::DEBUG, skip_all, fields(%recipient, %donor), err)]
pub fn simulate_table_lockstep<G, F>(
    rng: &mut G,
    recipient: BloodType,
    donor: BloodType,
    mut progress: F,
) -> Result<F2, MpcError>
where
    G: Rng + CryptoRng,
    F: FnMut(&'static str),
{
    let (share_a, share_b) = TableDealer::new(rng, INPUT_BITS, compatibility_bit)?.into_shares();
    let mut a = Initiator::new(share_a, recipient.code().into())?;
    let mut b = Responder::new(share_b, donor.code().into())?;
    progress("Parties initialized");

    b.receive(a.send())?;
    progress("Masked index sent");
    a.receive(b.send()?)?;
    progress("Lookup reply sent");

    a.output()
}

/// Run the lookup engine with the responder on its own thread.
#[instrument(level = Level::DEBUG, skip_all, fields(%recipient, %donor), err)]
pub fn simulate_table(recipient: BloodType, donor: BloodType) -> Result<F2, MpcError> {
    let mut rng = entropy_rng()?;
    let (share_a, share_b) =
        TableDealer::new(&mut rng, INPUT_BITS, compatibility_bit)?.into_shares();
    let mut initiator = Initiator::new(share_a, recipient.code().into())?;
    let mut responder = Responder::new(share_b, donor.code().into())?;
    let (chan_a, chan_b) = mem_channel_pair();

    let responder_thread = thread::spawn(move || lookup::run_responder(&mut responder, &chan_b));
    let output = lookup::run_initiator(&mut initiator, &chan_a);
    drop(chan_a);
    responder_thread.join().map_err(|_| MpcError::PartyPanicked)??;
    output
}

/// Compare a securely computed bit with the plaintext oracle.
pub fn check_output(recipient: BloodType, donor: BloodType, computed: F2) -> Result<(), MpcError> {
    let expected = f2_from_bool(oracle::lookup(recipient, donor));
    if computed != expected {
        return Err(MpcError::CorrectnessMismatch {
            recipient: recipient.code(),
            donor: donor.code(),
            expected: f2_to_u8(expected),
            computed: f2_to_u8(computed),
        });
    }
    Ok(())
}

/// Check the oracle against itself and both engines, in both drivers,
/// on every pair of inputs. Returns the number of checks.
pub fn self_test<G>(rng: &mut G) -> Result<usize, MpcError>
where
    G: Rng + CryptoRng,
{
    let mut checks = 0;
    for recipient in BloodType::ALL {
        for donor in BloodType::ALL {
            if oracle::formula(recipient, donor) != oracle::lookup(recipient, donor) {
                return Err(MpcError::CorrectnessMismatch {
                    recipient: recipient.code(),
                    donor: donor.code(),
                    expected: oracle::lookup(recipient, donor).into(),
                    computed: oracle::formula(recipient, donor).into(),
                });
            }
            let outputs = [
                simulate_circuit_lockstep(rng, recipient, donor, |_| {})?,
                simulate_circuit(recipient, donor)?,
                simulate_table_lockstep(rng, recipient, donor, |_| {})?,
                simulate_table(recipient, donor)?,
            ];
            for computed in outputs {
                check_output(recipient, donor, computed)?;
            }
            checks += 1 + outputs.len();
            debug!(%recipient, %donor, "checked");
        }
    }
    info!(checks, "self test passed");
    Ok(checks)
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use scuttlebutt::{AesRng, ring::FiniteRing};

    use super::*;

    fn bt(code: u8) -> BloodType {
        BloodType::new(code).unwrap()
    }

    const SCENARIOS: [(u8, u8, bool); 5] = [
        (0, 0, true),
        (7, 7, true),
        (0, 7, false),
        (4, 0, true),
        (1, 4, false),
    ];

    #[test]
    fn test_scenarios() {
        let mut rng = AesRng::seed_from_u64(30);
        for (x, y, expected) in SCENARIOS {
            let expected = f2_from_bool(expected);
            let (x, y) = (bt(x), bt(y));
            assert_eq!(simulate_circuit_lockstep(&mut rng, x, y, |_| {}).unwrap(), expected);
            assert_eq!(simulate_circuit(x, y).unwrap(), expected);
            assert_eq!(simulate_table_lockstep(&mut rng, x, y, |_| {}).unwrap(), expected);
            assert_eq!(simulate_table(x, y).unwrap(), expected);
        }
    }

    #[test]
    fn test_progress_markers() {
        let mut rng = AesRng::seed_from_u64(31);
        let mut stages = vec![];
        simulate_circuit_lockstep(&mut rng, bt(3), bt(1), |s| stages.push(s)).unwrap();
        assert_eq!(
            stages,
            [
                "Parties initialized",
                "Input phase done",
                "Phase1 done",
                "Phase2 done",
                "Phase3 done",
                "Phase4 done"
            ]
        );
    }

    #[test]
    fn test_check_output() {
        assert!(check_output(bt(0), bt(0), F2::ONE).is_ok());
        assert!(matches!(
            check_output(bt(0), bt(7), F2::ONE),
            Err(MpcError::CorrectnessMismatch {
                recipient: 0,
                donor: 7,
                expected: 0,
                computed: 1
            })
        ));
    }

    #[test]
    fn test_self_test() {
        let mut rng = AesRng::seed_from_u64(32);
        assert_eq!(self_test(&mut rng).unwrap(), 64 * 5);
    }
}
