use thiserror::Error;

#[derive(Error, Debug)]
pub enum MpcError {
    #[error("invalid input: {0}")]
    InputParse(String),
    #[error("Beaver triples exhausted: requested triple {requested} but only {available} were dealt")]
    TripleExhaustion { requested: usize, available: usize },
    #[error("index {index} is outside of [0, {bound})")]
    IndexOutOfRange { index: u64, bound: u64 },
    #[error(
        "f({recipient},{donor}) computed as {computed} but the oracle says {expected}"
    )]
    CorrectnessMismatch {
        recipient: u8,
        donor: u8,
        expected: u8,
        computed: u8,
    },
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error),
    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),
    #[error("unexpected message type {0}")]
    UnexpectedMessageType(String),
    #[error("called out of order: {0}")]
    PhaseOrder(&'static str),
    #[error("channel to the peer is closed")]
    ChannelClosed,
    #[error("a party thread panicked")]
    PartyPanicked,
}

impl<T> From<std::sync::mpsc::SendError<T>> for MpcError {
    fn from(_: std::sync::mpsc::SendError<T>) -> Self {
        MpcError::ChannelClosed
    }
}

impl From<std::sync::mpsc::RecvError> for MpcError {
    fn from(_: std::sync::mpsc::RecvError) -> Self {
        MpcError::ChannelClosed
    }
}
