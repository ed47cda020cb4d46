//! Contracts for secret sharing and for the preprocessing material consumed by online protocols.
//!
//! Every item handed out by a [`PreprocessingSupplier`] is single-use. Feeding the same triple
//! or mask into two protocol instances breaks privacy, and suppliers do not try to detect it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::Result, fields::MpcField, spdz::SpdzShare, MpcContext};

mod dummy;
mod precomputed;

pub use dummy::{DummySecretSharer, InsecureDummySupplier, StockRequest};
pub use precomputed::{PrecomputedSupplier, PreprocessingStock};

/// Kinds of preprocessing items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ItemKind {
    RandomElement,
    RandomBit,
    MultiplicationTriple,
    BitTriple,
    TruncationPair,
    ExponentiationPipe,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RandomElement => "random elements",
            Self::RandomBit => "random bits",
            Self::MultiplicationTriple => "multiplication triples",
            Self::BitTriple => "bit triples",
            Self::TruncationPair => "truncation pairs",
            Self::ExponentiationPipe => "exponentiation pipes",
        };
        f.write_str(name)
    }
}

/// Splits values into additive shares and recombines them.
pub trait SecretSharer<T> {
    /// Split `value` into `num_parties` shares summing to `value`.
    fn share(&mut self, value: T, num_parties: usize) -> Vec<T>;

    /// Inverse of [`SecretSharer::share`].
    fn recombine(&self, shares: &[T]) -> T;
}

/// Preprocessing item together with its opened value.
/// Only insecure suppliers can produce these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opened<T, S> {
    pub open: T,
    pub share: S,
}

/// Shares of a random triple `(a, b, c)` with `c = a * b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound = "S: Serialize + for<'a> Deserialize<'a>")]
pub struct MultiplicationTriple<S> {
    pub a: S,
    pub b: S,
    pub c: S,
}

/// Shares of a random `r'` and `r = r' >> d` for a public shift `d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound = "S: Serialize + for<'a> Deserialize<'a>")]
pub struct TruncationPair<S> {
    pub r_prime: S,
    pub r: S,
}

/// Shares of `r^-1, r, r^2, ..., r^L` for a random non-zero `r`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound = "S: Serialize + for<'a> Deserialize<'a>")]
pub struct ExponentiationPipe<S>(pub Vec<S>);

impl<S> ExponentiationPipe<S> {
    /// Share of `r^-1`.
    pub fn inverse(&self) -> &S {
        &self.0[0]
    }

    /// Shares of `r, r^2, ..., r^L`.
    pub fn powers(&self) -> &[S] {
        &self.0[1..]
    }

    /// Requested pipe length `L`.
    pub fn pipe_length(&self) -> usize {
        self.0.len() - 1
    }
}

/// Source of preprocessing material for SPDZ-style protocols.
///
/// Implementations mutate internal state on every call and must be driven from the single
/// thread that builds the party's computation.
pub trait PreprocessingSupplier: MpcContext {
    /// This party's share of the global authentication key.
    fn mac_key_share(&self) -> Self::Field;

    /// Share of a uniformly random element.
    fn next_random_element(&mut self) -> Result<SpdzShare<Self::Field>>;

    /// Share of a uniformly random bit.
    fn next_random_bit(&mut self) -> Result<SpdzShare<Self::Field>>;

    /// Random multiplication triple.
    fn next_multiplication_triple(&mut self) -> Result<MultiplicationTriple<SpdzShare<Self::Field>>>;

    /// Random multiplication triple over bits: `a, b` are bits and `c = a AND b`.
    fn next_bit_triple(&mut self) -> Result<MultiplicationTriple<SpdzShare<Self::Field>>>;

    /// Random truncation pair for shift `d`.
    fn next_truncation_pair(&mut self, d: usize) -> Result<TruncationPair<SpdzShare<Self::Field>>>;

    /// Exponentiation pipe of length `len`.
    fn next_exponentiation_pipe(
        &mut self,
        len: usize,
    ) -> Result<ExponentiationPipe<SpdzShare<Self::Field>>>;

    /// Sharing of a public constant.
    fn share_public(&self, x: Self::Field) -> SpdzShare<Self::Field> {
        SpdzShare::from_public(x, self.mac_key_share(), self.party_id())
    }
}

/// Sum of shares modulo `p`.
pub(crate) fn sum_shares<T: MpcField>(shares: &[T]) -> T {
    shares.iter().fold(T::zero(), |acc, &x| acc + x)
}
