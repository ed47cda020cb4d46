use thiserror::Error;

use crate::preprocessing::ItemKind;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error raised while building or evaluating a protocol.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("malicious behaviour detected: {0}")]
    Malicious(#[from] MaliciousError),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("preprocessing material exhausted: no {0} left")]
    PreprocessingExhausted(ItemKind),

    #[error("computation graph cannot make progress")]
    Stalled,

    #[error("deferred value has unexpected type")]
    TypeMismatch,

    #[error("deferred value was discarded after an earlier evaluation")]
    Discarded,
}

impl Error {
    /// Errors that indicate a corrupted peer. The session must be aborted.
    pub fn is_malicious(&self) -> bool {
        matches!(self, Self::Malicious(_))
    }

    /// Errors caused by the environment rather than by a peer. Retrying in a fresh
    /// session may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Invalid parameters passed to a constructor or protocol.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max open value {max_open_value} exceeds modulus {modulus}")]
    MaxOpenValueTooLarge { max_open_value: u128, modulus: u128 },

    #[error("max open value must be positive")]
    ZeroMaxOpenValue,

    #[error("party {party_id} is out of range for {num_parties} parties")]
    InvalidParty { party_id: usize, num_parties: usize },

    #[error("at least one party is required")]
    NoParties,

    #[error("masked values of {bits} bits do not fit a field of {field_bits} bits")]
    MaskTooWide { bits: usize, field_bits: u32 },

    #[error("shift amount {0} is out of range")]
    ShiftOutOfRange(usize),

    #[error("exponentiation pipe length must be positive")]
    EmptyPipe,

    #[error("bit length must be positive")]
    ZeroBitLength,

    #[error("operand lists differ in length: {left} and {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Failures of field arithmetic.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("element has no multiplicative inverse")]
    NotInvertible,
}

/// A peer sent a message that violates the protocol.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MaliciousError {
    #[error("party {party} sent {actual} shares, expected {expected}")]
    ShareCountMismatch {
        party: usize,
        expected: usize,
        actual: usize,
    },

    #[error("party {0} sent an unexpected message")]
    UnexpectedMessage(usize),
}

/// Error type for channels.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("error while sending message to {0}")]
    Send(usize),

    #[error("error while receiving message from {0}")]
    Recv(usize),

    #[error("no channel to party {0}")]
    MissingChannel(usize),
}
