//! Message transport between the two parties.
//!
//! Every phase boundary is a message. The in-memory channel blocks on `recv`,
//! so a party cannot start a phase before the peer's message for the previous
//! phase has arrived, and messages arrive in the order they were sent.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::MpcError;

pub trait Channel<M> {
    fn send(&self, msg: M) -> Result<(), MpcError>;
    fn recv(&self) -> Result<M, MpcError>;
}

/// One end of an in-process duplex channel.
pub struct MemChannel<M> {
    send_chan: Sender<M>,
    recv_chan: Receiver<M>,
}

impl<M> Channel<M> for MemChannel<M> {
    fn send(&self, msg: M) -> Result<(), MpcError> {
        self.send_chan.send(msg)?;
        Ok(())
    }

    fn recv(&self) -> Result<M, MpcError> {
        let msg = self.recv_chan.recv()?;
        Ok(msg)
    }
}

/// Create two connected channel ends.
pub fn mem_channel_pair<M>() -> (MemChannel<M>, MemChannel<M>) {
    let (send_a, recv_b) = mpsc::channel();
    let (send_b, recv_a) = mpsc::channel();
    (
        MemChannel {
            send_chan: send_a,
            recv_chan: recv_a,
        },
        MemChannel {
            send_chan: send_b,
            recv_chan: recv_b,
        },
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fifo_duplex() {
        let (a, b) = mem_channel_pair::<u32>();
        a.send(1).unwrap();
        a.send(2).unwrap();
        b.send(3).unwrap();
        assert_eq!(b.recv().unwrap(), 1);
        assert_eq!(b.recv().unwrap(), 2);
        assert_eq!(a.recv().unwrap(), 3);
    }

    #[test]
    fn test_closed() {
        let (a, b) = mem_channel_pair::<u32>();
        drop(b);
        assert!(matches!(a.send(1), Err(MpcError::ChannelClosed)));
        assert!(matches!(a.recv(), Err(MpcError::ChannelClosed)));
    }
}
