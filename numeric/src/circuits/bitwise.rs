use crate::{
    error::Result,
    executor::{DeferredShare, ProtocolBuilder},
    fields::MpcField,
    spdz::SpdzShare,
};

use super::{
    fold_tree,
    logical::{or, xor_known},
    mul, negate,
};

/// Random integer given by shares of its individual bits, least significant first.
/// Used as a statistically hiding mask for openings.
#[derive(Clone, Debug)]
pub struct RandomBitMask<F: MpcField> {
    bits: Vec<SpdzShare<F>>,
    value: SpdzShare<F>,
}

impl<F: MpcField> RandomBitMask<F> {
    /// Draw `num_bits` random bits from the supplier.
    pub fn draw(ctx: &ProtocolBuilder<'_, F>, num_bits: usize) -> Result<Self> {
        let mut supplier = ctx.supplier();
        let bits = (0..num_bits)
            .map(|_| supplier.next_random_bit())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_bits(bits))
    }

    /// Compose mask from shared bits.
    pub fn from_bits(bits: Vec<SpdzShare<F>>) -> Self {
        let value = bits
            .iter()
            .rev()
            .fold(SpdzShare::zero(), |acc, &bit| acc.double() + bit);
        Self { bits, value }
    }

    /// Mask made of the lowest `num_bits` bits. Draws no new randomness.
    pub fn low(&self, num_bits: usize) -> Self {
        Self::from_bits(self.bits[..num_bits.min(self.bits.len())].to_vec())
    }

    pub fn bits(&self) -> &[SpdzShare<F>] {
        &self.bits
    }

    /// Share of `sum(bit_i * 2^i)`.
    pub fn value(&self) -> SpdzShare<F> {
        self.value
    }

    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }
}

/// Compare public unsigned integer with a hidden integer, provided sharings of its individual bits.
/// Returns pair of bits ([lhs < rhs], [lhs > rhs]). Bits of `lhs` above the length of `rhs`
/// are ignored.
pub fn bitwise_compare<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    lhs: u128,
    rhs: &[SpdzShare<F>],
) -> Result<(DeferredShare<F>, DeferredShare<F>)> {
    // Given bit sequences L and R, let us define f(L, R) to be a pair (cmp, neq) such that
    // a) if L < R, then cmp = -1, neq = 1;
    // b) if L > R, then cmp = 1, neq = 1;
    // c) if L = R, then cmp = 0, neq = 0.
    // f(AB, CD) can be computed from f(A, C) and f(B, D) using 2 multiplications and
    // 1 communication round, so the result takes log_2(bits) rounds in binary-tree fashion.

    // 1. Map individual bits into pairs (cmp, neq).
    let base_cases: Vec<_> = rhs
        .iter()
        .enumerate()
        .map(|(i, &rhs_bit)| {
            let lhs_bit = lhs.checked_shr(i as u32).unwrap_or(0) & 1 == 1;
            let rhs_bit = ctx.known(rhs_bit);
            let neq = xor_known(ctx, lhs_bit, rhs_bit);
            let cmp = if lhs_bit { neq } else { negate(ctx, rhs_bit) };
            (cmp, neq)
        })
        .collect();

    // 2. Fold the sequence of pairs, higher bits decide.
    let zero = ctx.known(SpdzShare::zero());
    let (cmp, neq) = fold_tree(base_cases, (zero, zero), |low, high| {
        let a = mul(ctx, low.0, high.1)?;
        let neq = or(ctx, low.1, high.1)?;
        Ok((ctx.map((low.0, high.0, a), |(x, y, a)| x + y - a), neq))
    })?;

    // 3. Convert aggregated pair (cmp, neq) into sharings of [lhs < rhs] and [lhs > rhs].
    let scale = F::power_of_two_inverse(1);
    let is_less = ctx.map((cmp, neq), move |(cmp, neq)| (neq - cmp) * scale);
    let is_greater = ctx.map((cmp, neq), move |(cmp, neq)| (neq + cmp) * scale);
    Ok((is_less, is_greater))
}
