//! Logical operations on bits represented as field elements `0` and `1`.
//!
//! Inputs must be sharings of bits, results are undefined otherwise.

use crate::{
    error::{ConfigError, Result},
    executor::{DeferredShare, ProtocolBuilder},
    fields::MpcField,
    spdz::SpdzShare,
};

use super::{
    fold_tree, mul,
    sequences::{batch_pairs, SingleOrPair},
    sub_from_public,
};

/// `1 - x`.
pub fn not<F: MpcField>(ctx: &ProtocolBuilder<'_, F>, x: DeferredShare<F>) -> DeferredShare<F> {
    sub_from_public(ctx, F::one(), x)
}

/// XOR with a public bit.
pub fn xor_known<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    known: bool,
    x: DeferredShare<F>,
) -> DeferredShare<F> {
    if known {
        not(ctx, x)
    } else {
        x
    }
}

/// AND with a public bit.
pub fn and_known<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    known: bool,
    x: DeferredShare<F>,
) -> DeferredShare<F> {
    if known {
        x
    } else {
        ctx.known(SpdzShare::zero())
    }
}

/// AND of two shared bits. One multiplication.
pub fn and<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    y: DeferredShare<F>,
) -> Result<DeferredShare<F>> {
    mul(ctx, x, y)
}

/// OR of two shared bits, `x + y - xy`. One multiplication.
pub fn or<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    y: DeferredShare<F>,
) -> Result<DeferredShare<F>> {
    let xy = mul(ctx, x, y)?;
    Ok(ctx.map((x, y, xy), |(x, y, xy)| x + y - xy))
}

/// OR of every two neighbours: `[b0 | b1, b2 | b3, ...]`. A trailing odd element is kept as is.
/// All multiplications share a single round.
pub fn or_neighbors<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    bits: &[DeferredShare<F>],
) -> Result<Vec<DeferredShare<F>>> {
    batch_pairs(bits.iter().copied())
        .map(|p| match p {
            SingleOrPair::Single(x) => Ok(x),
            SingleOrPair::Pair(x, y) => or(ctx, x, y),
        })
        .collect()
}

/// OR of all bits, zero for an empty list. Takes log_2(n) rounds.
pub fn or_of_list<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    bits: impl IntoIterator<Item = DeferredShare<F>>,
) -> Result<DeferredShare<F>> {
    let zero = ctx.known(SpdzShare::zero());
    fold_tree(bits, zero, |x, y| or(ctx, x, y))
}

fn check_lengths(left: usize, right: usize) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(ConfigError::LengthMismatch { left, right }.into())
    }
}

/// Element-wise [`xor_known`].
pub fn pairwise_xor_known<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    known: &[bool],
    bits: &[DeferredShare<F>],
) -> Result<Vec<DeferredShare<F>>> {
    check_lengths(known.len(), bits.len())?;
    Ok(known
        .iter()
        .zip(bits)
        .map(|(&known, &x)| xor_known(ctx, known, x))
        .collect())
}

/// Element-wise [`and_known`].
pub fn pairwise_and_known<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    known: &[bool],
    bits: &[DeferredShare<F>],
) -> Result<Vec<DeferredShare<F>>> {
    check_lengths(known.len(), bits.len())?;
    Ok(known
        .iter()
        .zip(bits)
        .map(|(&known, &x)| and_known(ctx, known, x))
        .collect())
}

/// Element-wise [`and`]. One round.
pub fn pairwise_and<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    left: &[DeferredShare<F>],
    right: &[DeferredShare<F>],
) -> Result<Vec<DeferredShare<F>>> {
    check_lengths(left.len(), right.len())?;
    left.iter().zip(right).map(|(&x, &y)| and(ctx, x, y)).collect()
}

/// Element-wise [`or`]. One round.
pub fn pairwise_or<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    left: &[DeferredShare<F>],
    right: &[DeferredShare<F>],
) -> Result<Vec<DeferredShare<F>>> {
    check_lengths(left.len(), right.len())?;
    left.iter().zip(right).map(|(&x, &y)| or(ctx, x, y)).collect()
}
