use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    fields::MpcField,
    spdz::SpdzShare,
    MpcContext,
};

use super::{
    ExponentiationPipe, ItemKind, MultiplicationTriple, PreprocessingSupplier, TruncationPair,
};

/// Finite stock of preprocessing material of a single party.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound = "T: MpcField")]
pub struct PreprocessingStock<T> {
    pub party_id: usize,
    pub num_parties: usize,
    pub mac_key_share: T,
    pub random_elements: Vec<SpdzShare<T>>,
    pub random_bits: Vec<SpdzShare<T>>,
    pub multiplication_triples: Vec<MultiplicationTriple<SpdzShare<T>>>,
    pub bit_triples: Vec<MultiplicationTriple<SpdzShare<T>>>,
    /// Truncation pairs grouped by shift amount.
    pub truncation_pairs: BTreeMap<usize, Vec<TruncationPair<SpdzShare<T>>>>,
    /// Exponentiation pipes grouped by pipe length.
    pub exponentiation_pipes: BTreeMap<usize, Vec<ExponentiationPipe<SpdzShare<T>>>>,
}

impl<T: MpcField> PreprocessingStock<T> {
    /// Stock without any items.
    pub fn empty(party_id: usize, num_parties: usize, mac_key_share: T) -> Self {
        Self {
            party_id,
            num_parties,
            mac_key_share,
            random_elements: Vec::new(),
            random_bits: Vec::new(),
            multiplication_triples: Vec::new(),
            bit_triples: Vec::new(),
            truncation_pairs: BTreeMap::new(),
            exponentiation_pipes: BTreeMap::new(),
        }
    }

    /// Encode stock with bincode.
    pub fn to_bytes(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    /// Decode stock encoded with [`PreprocessingStock::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

/// Supplier that serves a precomputed stock. Running out of any item is an error.
pub struct PrecomputedSupplier<T> {
    stock: PreprocessingStock<T>,
}

impl<T: MpcField> PrecomputedSupplier<T> {
    /// Create new supplier given precomputed stock.
    pub fn new(stock: PreprocessingStock<T>) -> Self {
        Self { stock }
    }

    /// Remaining stock.
    pub fn stock(&self) -> &PreprocessingStock<T> {
        &self.stock
    }
}

fn take<I>(items: Option<&mut Vec<I>>, kind: ItemKind) -> Result<I> {
    items
        .and_then(|items| items.pop())
        .ok_or(Error::PreprocessingExhausted(kind))
}

impl<T: MpcField> MpcContext for PrecomputedSupplier<T> {
    type Field = T;

    fn num_parties(&self) -> usize {
        self.stock.num_parties
    }

    fn party_id(&self) -> usize {
        self.stock.party_id
    }
}

impl<T: MpcField> PreprocessingSupplier for PrecomputedSupplier<T> {
    fn mac_key_share(&self) -> T {
        self.stock.mac_key_share
    }

    fn next_random_element(&mut self) -> Result<SpdzShare<T>> {
        take(Some(&mut self.stock.random_elements), ItemKind::RandomElement)
    }

    fn next_random_bit(&mut self) -> Result<SpdzShare<T>> {
        take(Some(&mut self.stock.random_bits), ItemKind::RandomBit)
    }

    fn next_multiplication_triple(&mut self) -> Result<MultiplicationTriple<SpdzShare<T>>> {
        take(
            Some(&mut self.stock.multiplication_triples),
            ItemKind::MultiplicationTriple,
        )
    }

    fn next_bit_triple(&mut self) -> Result<MultiplicationTriple<SpdzShare<T>>> {
        take(Some(&mut self.stock.bit_triples), ItemKind::BitTriple)
    }

    fn next_truncation_pair(&mut self, d: usize) -> Result<TruncationPair<SpdzShare<T>>> {
        take(
            self.stock.truncation_pairs.get_mut(&d),
            ItemKind::TruncationPair,
        )
    }

    fn next_exponentiation_pipe(&mut self, len: usize) -> Result<ExponentiationPipe<SpdzShare<T>>> {
        take(
            self.stock.exponentiation_pipes.get_mut(&len),
            ItemKind::ExponentiationPipe,
        )
    }
}
