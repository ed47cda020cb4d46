use itertools::Itertools;

use crate::{
    error::Result,
    executor::{DeferredShare, ProtocolBuilder},
    fields::MpcField,
};

use super::mul;

/// Single element or pair of elements of the same type.
pub(super) enum SingleOrPair<T> {
    Single(T),
    Pair(T, T),
}

/// Batch iterator into pairs and maybe a leftover single element.
pub(super) fn batch_pairs<T>(it: impl IntoIterator<Item = T>) -> impl Iterator<Item = SingleOrPair<T>> {
    it.into_iter().batching(|it| {
        it.next().map(|first| match it.next() {
            Some(second) => SingleOrPair::Pair(first, second),
            None => SingleOrPair::Single(first),
        })
    })
}

/// Aggregate a sequence by combining distinct neighbouring pairs, level by level.
/// Combined pairs of one level are independent, so deferred combinations of depth one
/// resolve in log_2(n) rounds. Order of elements is preserved: `combine` always gets the
/// earlier element first.
pub fn fold_tree<T, C>(items: impl IntoIterator<Item = T>, default: T, mut combine: C) -> Result<T>
where
    C: FnMut(T, T) -> Result<T>,
{
    let mut elems: Vec<_> = items.into_iter().collect();

    while elems.len() > 1 {
        elems = batch_pairs(elems)
            .map(|p| match p {
                SingleOrPair::Single(value) => Ok(value),
                SingleOrPair::Pair(first, second) => combine(first, second),
            })
            .collect::<Result<_>>()?;
    }

    Ok(elems.into_iter().next().unwrap_or(default))
}

/// Compute product of given sequence of shares.
/// Cost: n-1 multiplications, log_2(n) communication rounds, where n is sequence length.
pub fn product<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    elems: impl IntoIterator<Item = DeferredShare<F>>,
) -> Result<DeferredShare<F>> {
    let one = ctx.known(ctx.public_share(F::one()));
    fold_tree(elems, one, |a, b| mul(ctx, a, b))
}
