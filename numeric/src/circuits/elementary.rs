use crate::{
    error::Result,
    executor::{DeferredShare, ProtocolBuilder},
    fields::MpcField,
    preprocessing::MultiplicationTriple,
    MpcContext,
};

pub fn add<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    y: DeferredShare<F>,
) -> DeferredShare<F> {
    ctx.map((x, y), |(x, y)| x + y)
}

pub fn sub<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    y: DeferredShare<F>,
) -> DeferredShare<F> {
    ctx.map((x, y), |(x, y)| x - y)
}

pub fn negate<F: MpcField>(ctx: &ProtocolBuilder<'_, F>, x: DeferredShare<F>) -> DeferredShare<F> {
    ctx.map(x, |x| -x)
}

/// Multiply share by public constant.
pub fn scale<F: MpcField>(ctx: &ProtocolBuilder<'_, F>, x: DeferredShare<F>, c: F) -> DeferredShare<F> {
    ctx.map(x, move |x| x * c)
}

/// `x + c` for public `c`.
pub fn add_public<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    c: F,
) -> DeferredShare<F> {
    let (key, party_id) = (ctx.mac_key_share(), ctx.party_id());
    ctx.map(x, move |x| x.add_public(c, key, party_id))
}

/// `c - x` for public `c`.
pub fn sub_from_public<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    c: F,
    x: DeferredShare<F>,
) -> DeferredShare<F> {
    let (key, party_id) = (ctx.mac_key_share(), ctx.party_id());
    ctx.map(x, move |x| x.sub_from_public(c, key, party_id))
}

/// Multiply shared values with a Beaver triple. Costs one round with two openings.
pub fn mul<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    y: DeferredShare<F>,
) -> Result<DeferredShare<F>> {
    let MultiplicationTriple { a, b, c } = ctx.supplier().next_multiplication_triple()?;
    let e = ctx.open(ctx.map(x, move |x| x - a));
    let d = ctx.open(ctx.map(y, move |y| y - b));
    let (key, party_id) = (ctx.mac_key_share(), ctx.party_id());
    Ok(ctx.map((e, d), move |(e, d)| {
        (c + b * e + a * d).add_public(e * d, key, party_id)
    }))
}

#[cfg(test)]
mod tests {
    use crate::circuits::{testing::*, *};
    use crate::config::NumericConfig;

    #[tokio::test]
    async fn test_linear_fn() {
        let result = test_circuit(|ctx| {
            let (a, b, c, d) = (plain(ctx, 5), plain(ctx, 7), plain(ctx, 3), plain(ctx, 2));
            let (ab, cd) = (mul(ctx, a, b)?, mul(ctx, c, d)?);
            Ok(open_signed(ctx, add(ctx, ab, cd)))
        })
        .await;
        assert_eq!(result, 41);
    }

    #[tokio::test]
    async fn test_public_constants() {
        let result = test_circuit(|ctx| {
            let x = plain(ctx, 10);
            let y = add_public(ctx, x, TestField::from(5u64));
            let y = sub_from_public(ctx, TestField::from(100u64), y);
            let y = scale(ctx, negate(ctx, y), TestField::from(2u64));
            Ok(open_signed(ctx, sub(ctx, y, x)))
        })
        .await;
        assert_eq!(result, -180);
    }

    #[tokio::test]
    async fn test_mul_between_parties() {
        let run = run_parties(3, &[-6, 7], NumericConfig::default(), |ctx, x| {
            mul(ctx, x[0], x[1])
        })
        .await
        .unwrap();
        assert_eq!(run.value, -42);
        assert_eq!(run.stats.rounds, 2);
        assert_eq!(run.stats.openings, 3);
    }
}
