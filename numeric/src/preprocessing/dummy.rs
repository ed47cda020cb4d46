use std::marker::PhantomData;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    fields::MpcField,
    spdz::SpdzShare,
    MpcContext,
};

use super::{
    sum_shares, ExponentiationPipe, MultiplicationTriple, Opened, PreprocessingStock,
    PreprocessingSupplier, SecretSharer, TruncationPair,
};

/// Insecure additive secret sharer driven by a seeded random number generator.
///
/// All shares but the last are uniformly random, the last one makes the sum match.
/// Anyone who knows the seed can predict every share.
pub struct DummySecretSharer<T> {
    rng: SmallRng,
    _phantom: PhantomData<T>,
}

impl<T: MpcField> DummySecretSharer<T> {
    /// Create new sharer with deterministic randomness.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            _phantom: PhantomData,
        }
    }

    /// Get underlying random number generator.
    fn rng(&mut self) -> &mut impl Rng {
        &mut self.rng
    }
}

impl<T: MpcField> SecretSharer<T> for DummySecretSharer<T> {
    fn share(&mut self, value: T, num_parties: usize) -> Vec<T> {
        let mut shares: Vec<_> = (1..num_parties)
            .map(|_| T::random(&mut self.rng))
            .collect();
        let sum = sum_shares(&shares);
        shares.push(value - sum);
        shares
    }

    fn recombine(&self, shares: &[T]) -> T {
        sum_shares(shares)
    }
}

/// Insecure supplier of preprocessing material that can be used for tests.
///
/// Every party constructs its own instance with the same seed. All instances then draw the same
/// random stream, so each party can pick its own share of a common sharing. Opened values of all
/// items are available through the `*_opened` methods.
pub struct InsecureDummySupplier<T> {
    party_id: usize,
    num_parties: usize,
    max_open_value: u128,
    mac_key: T,
    mac_key_share: T,
    sharer: DummySecretSharer<T>,
}

impl<T: MpcField> InsecureDummySupplier<T> {
    /// Create new instance serving random elements from the whole field.
    pub fn new(party_id: usize, num_parties: usize, seed: u64) -> Result<Self> {
        Self::with_max_open_value(party_id, num_parties, seed, T::modulus())
    }

    /// Create new instance with random elements sampled from `[0, max_open_value)`.
    pub fn with_max_open_value(
        party_id: usize,
        num_parties: usize,
        seed: u64,
        max_open_value: u128,
    ) -> Result<Self> {
        if num_parties == 0 {
            return Err(ConfigError::NoParties.into());
        }
        if party_id >= num_parties {
            return Err(ConfigError::InvalidParty {
                party_id,
                num_parties,
            }
            .into());
        }
        if max_open_value > T::modulus() {
            return Err(ConfigError::MaxOpenValueTooLarge {
                max_open_value,
                modulus: T::modulus(),
            }
            .into());
        }
        if max_open_value == 0 {
            return Err(ConfigError::ZeroMaxOpenValue.into());
        }

        let mut sharer = DummySecretSharer::new(seed);
        let mac_key = T::random(sharer.rng());
        let mac_key_share = sharer.share(mac_key, num_parties)[party_id];
        debug!(party_id, num_parties, "created insecure dummy supplier");

        Ok(Self {
            party_id,
            num_parties,
            max_open_value,
            mac_key,
            mac_key_share,
            sharer,
        })
    }

    /// The global authentication key in plain.
    pub fn mac_key(&self) -> T {
        self.mac_key
    }

    /// Authenticated share of a value known to the caller.
    /// All parties have to call this with the same value in the same order.
    pub fn share_input(&mut self, value: T) -> SpdzShare<T> {
        let value_shares = self.sharer.share(value, self.num_parties);
        let mac_shares = self.sharer.share(value * self.mac_key, self.num_parties);
        SpdzShare::new(value_shares[self.party_id], mac_shares[self.party_id])
    }

    /// Random element and its share.
    pub fn next_random_element_opened(&mut self) -> Opened<T, SpdzShare<T>> {
        let value = self.sample_element();
        self.opened(value)
    }

    /// Random bit and its share.
    pub fn next_random_bit_opened(&mut self) -> Opened<T, SpdzShare<T>> {
        let value = self.sample_bit();
        self.opened(value)
    }

    /// Random multiplication triple with its opened values.
    pub fn next_multiplication_triple_opened(
        &mut self,
    ) -> MultiplicationTriple<Opened<T, SpdzShare<T>>> {
        let a = self.sample_element();
        let b = self.sample_element();
        self.triple(a, b)
    }

    /// Random bit triple with its opened values.
    pub fn next_bit_triple_opened(&mut self) -> MultiplicationTriple<Opened<T, SpdzShare<T>>> {
        let a = self.sample_bit();
        let b = self.sample_bit();
        self.triple(a, b)
    }

    /// Random truncation pair with its opened values.
    pub fn next_truncation_pair_opened(
        &mut self,
        d: usize,
    ) -> Result<TruncationPair<Opened<T, SpdzShare<T>>>> {
        if d >= 128 {
            return Err(ConfigError::ShiftOutOfRange(d).into());
        }
        let r_prime = self.sample_element();
        let r = T::from_u128(r_prime.to_u128_truncated() >> d);
        Ok(TruncationPair {
            r_prime: self.opened(r_prime),
            r: self.opened(r),
        })
    }

    /// Exponentiation pipe `r^-1, r, r^2, ..., r^len` with its opened values.
    pub fn next_exponentiation_pipe_opened(
        &mut self,
        len: usize,
    ) -> Result<ExponentiationPipe<Opened<T, SpdzShare<T>>>> {
        if len == 0 {
            return Err(ConfigError::EmptyPipe.into());
        }
        let r = self.sample_element();
        let mut powers = Vec::with_capacity(len + 1);
        powers.push(r.mod_inverse()?);
        powers.push(r);
        for _ in 1..len {
            let previous = powers[powers.len() - 1];
            powers.push(previous * r);
        }
        Ok(ExponentiationPipe(
            powers.into_iter().map(|x| self.opened(x)).collect(),
        ))
    }

    /// Fill a stock of preprocessing material for [`super::PrecomputedSupplier`].
    pub fn stock(&mut self, request: &StockRequest) -> Result<PreprocessingStock<T>> {
        let mut stock = PreprocessingStock::empty(self.party_id, self.num_parties, self.mac_key_share);
        for _ in 0..request.random_elements {
            let item = self.next_random_element()?;
            stock.random_elements.push(item);
        }
        for _ in 0..request.random_bits {
            let item = self.next_random_bit()?;
            stock.random_bits.push(item);
        }
        for _ in 0..request.multiplication_triples {
            let item = self.next_multiplication_triple()?;
            stock.multiplication_triples.push(item);
        }
        for _ in 0..request.bit_triples {
            let item = self.next_bit_triple()?;
            stock.bit_triples.push(item);
        }
        for &(d, count) in &request.truncation_pairs {
            for _ in 0..count {
                let item = self.next_truncation_pair(d)?;
                stock.truncation_pairs.entry(d).or_default().push(item);
            }
        }
        for &(len, count) in &request.exponentiation_pipes {
            for _ in 0..count {
                let item = self.next_exponentiation_pipe(len)?;
                stock.exponentiation_pipes.entry(len).or_default().push(item);
            }
        }
        Ok(stock)
    }

    /// Share `value` and pair it with its opened value.
    fn opened(&mut self, value: T) -> Opened<T, SpdzShare<T>> {
        Opened {
            open: value,
            share: self.share_input(value),
        }
    }

    fn triple(&mut self, a: T, b: T) -> MultiplicationTriple<Opened<T, SpdzShare<T>>> {
        MultiplicationTriple {
            a: self.opened(a),
            b: self.opened(b),
            c: self.opened(a * b),
        }
    }

    /// Random element in `[0, max_open_value)`.
    fn sample_element(&mut self) -> T {
        if self.max_open_value == T::modulus() {
            T::random(self.sharer.rng())
        } else {
            let bound = self.max_open_value;
            T::from_u128(self.sharer.rng().gen_range(0..bound))
        }
    }

    fn sample_bit(&mut self) -> T {
        if self.sharer.rng().gen() {
            T::one()
        } else {
            T::zero()
        }
    }
}

impl<T: MpcField> MpcContext for InsecureDummySupplier<T> {
    type Field = T;

    fn num_parties(&self) -> usize {
        self.num_parties
    }

    fn party_id(&self) -> usize {
        self.party_id
    }
}

impl<T: MpcField> PreprocessingSupplier for InsecureDummySupplier<T> {
    fn mac_key_share(&self) -> T {
        self.mac_key_share
    }

    fn next_random_element(&mut self) -> Result<SpdzShare<T>> {
        Ok(self.next_random_element_opened().share)
    }

    fn next_random_bit(&mut self) -> Result<SpdzShare<T>> {
        Ok(self.next_random_bit_opened().share)
    }

    fn next_multiplication_triple(&mut self) -> Result<MultiplicationTriple<SpdzShare<T>>> {
        Ok(strip_triple(self.next_multiplication_triple_opened()))
    }

    fn next_bit_triple(&mut self) -> Result<MultiplicationTriple<SpdzShare<T>>> {
        Ok(strip_triple(self.next_bit_triple_opened()))
    }

    fn next_truncation_pair(&mut self, d: usize) -> Result<TruncationPair<SpdzShare<T>>> {
        let pair = self.next_truncation_pair_opened(d)?;
        Ok(TruncationPair {
            r_prime: pair.r_prime.share,
            r: pair.r.share,
        })
    }

    fn next_exponentiation_pipe(&mut self, len: usize) -> Result<ExponentiationPipe<SpdzShare<T>>> {
        let pipe = self.next_exponentiation_pipe_opened(len)?;
        Ok(ExponentiationPipe(
            pipe.0.into_iter().map(|x| x.share).collect(),
        ))
    }
}

/// Amounts of material to put into a [`PreprocessingStock`].
#[derive(Clone, Debug, Default)]
pub struct StockRequest {
    pub random_elements: usize,
    pub random_bits: usize,
    pub multiplication_triples: usize,
    pub bit_triples: usize,
    /// Pairs of (shift, count).
    pub truncation_pairs: Vec<(usize, usize)>,
    /// Pairs of (pipe length, count).
    pub exponentiation_pipes: Vec<(usize, usize)>,
}

fn strip_triple<T, S>(triple: MultiplicationTriple<Opened<T, S>>) -> MultiplicationTriple<S> {
    MultiplicationTriple {
        a: triple.a.share,
        b: triple.b.share,
        c: triple.c.share,
    }
}
