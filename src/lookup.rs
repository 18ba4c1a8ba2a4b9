//! Compatibility by a masked lookup into a one-time truth table.
//!
//! The initiator sends `u = x + r`, the responder answers with `v = y + s` and
//! its table entry `Mb[u][v]`. The initiator outputs `Ma[u][v] + Mb[u][v]`.
//! `u` and `v` are uniform as long as the offsets stay secret.

use swanky_field_binary::F2;
use tracing::{Level, debug, instrument};

use crate::{
    channel::Channel,
    error::MpcError,
    prep::{MaskedTable, TableShare},
};

/// `u = (x + r) mod 2^n`, sent by the initiator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskedIndex(pub u64);

/// `v = (y + s) mod 2^n` together with the responder's cell `Mb[u][v]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupReply {
    pub v: u64,
    pub z: F2,
}

fn check_index(index: u64, table: &MaskedTable) -> Result<u64, MpcError> {
    let bound = table.size();
    if index >= bound {
        return Err(MpcError::IndexOutOfRange { index, bound });
    }
    Ok(index)
}

/// Holds the recipient input `x`, the row offset `r` and the table `Ma`.
pub struct Initiator {
    x: u64,
    share: TableShare,
    u: Option<u64>,
    reply: Option<LookupReply>,
}

impl Initiator {
    pub fn new(share: TableShare, x: u64) -> Result<Self, MpcError> {
        let x = check_index(x, &share.table)?;
        Ok(Self {
            x,
            share,
            u: None,
            reply: None,
        })
    }

    pub fn send(&mut self) -> MaskedIndex {
        let u = (self.x + self.share.offset) % self.share.table.size();
        self.u = Some(u);
        MaskedIndex(u)
    }

    pub fn receive(&mut self, reply: LookupReply) -> Result<(), MpcError> {
        check_index(reply.v, &self.share.table)?;
        self.reply = Some(reply);
        Ok(())
    }

    /// The output bit, only available once the reply arrived.
    pub fn output(&self) -> Result<F2, MpcError> {
        let (Some(u), Some(reply)) = (self.u, self.reply) else {
            return Err(MpcError::PhaseOrder("output before the lookup round trip"));
        };
        Ok(self.share.table.get(u, reply.v)? + reply.z)
    }
}

/// Holds the donor input `y`, the column offset `s` and the table `Mb`.
pub struct Responder {
    y: u64,
    share: TableShare,
    u: Option<u64>,
}

impl Responder {
    pub fn new(share: TableShare, y: u64) -> Result<Self, MpcError> {
        let y = check_index(y, &share.table)?;
        Ok(Self { y, share, u: None })
    }

    pub fn receive(&mut self, msg: MaskedIndex) -> Result<(), MpcError> {
        self.u = Some(check_index(msg.0, &self.share.table)?);
        Ok(())
    }

    pub fn send(&self) -> Result<LookupReply, MpcError> {
        let u = self
            .u
            .ok_or(MpcError::PhaseOrder("reply before the masked index arrived"))?;
        let v = (self.y + self.share.offset) % self.share.table.size();
        let z = self.share.table.get(u, v)?;
        Ok(LookupReply { v, z })
    }
}

/// Everything the lookup parties send each other over a [Channel].
#[derive(Clone, Copy, Debug)]
pub enum LookupMsg {
    Index(MaskedIndex),
    Reply(LookupReply),
}

impl LookupMsg {
    fn expect_index(self) -> Result<MaskedIndex, MpcError> {
        match self {
            LookupMsg::Index(msg) => Ok(msg),
            other => Err(MpcError::UnexpectedMessageType(format!(
                "expected masked index, got {other:?}"
            ))),
        }
    }

    fn expect_reply(self) -> Result<LookupReply, MpcError> {
        match self {
            LookupMsg::Reply(msg) => Ok(msg),
            other => Err(MpcError::UnexpectedMessageType(format!(
                "expected lookup reply, got {other:?}"
            ))),
        }
    }
}

#[instrument(level = Level::DEBUG, skip_all, err)]
pub fn run_initiator<C>(party: &mut Initiator, channel: &C) -> Result<F2, MpcError>
where
    C: Channel<LookupMsg>,
{
    channel.send(LookupMsg::Index(party.send()))?;
    party.receive(channel.recv()?.expect_reply()?)?;
    debug!("lookup round trip done");
    party.output()
}

#[instrument(level = Level::DEBUG, skip_all, err)]
pub fn run_responder<C>(party: &mut Responder, channel: &C) -> Result<(), MpcError>
where
    C: Channel<LookupMsg>,
{
    party.receive(channel.recv()?.expect_index()?)?;
    channel.send(LookupMsg::Reply(party.send()?))?;
    debug!("lookup reply sent");
    Ok(())
}
