use std::cmp;

use crate::{
    config::check_mask_width,
    error::{ConfigError, Result},
    executor::{DeferredShare, ProtocolBuilder},
    fields::MpcField,
    MpcContext,
};

use super::{bitwise_compare, RandomBitMask};

/// Remainder of a k-bit integer modulo 2^m. Result is given in range [0;2^m).
///
/// `x` has to be a sharing of an integer in `(-2^(k-1), 2^(k-1))` or `[0, 2^k)`. The opened
/// masked value hides `x` statistically with `kappa` bits. For `m >= k` the input itself is
/// returned without reduction.
///
/// Fails with a configuration error if a `k + kappa` bit mask does not fit the field.
pub fn mod2m<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    m: usize,
    k: usize,
    kappa: usize,
) -> Result<DeferredShare<F>> {
    if m >= k {
        return Ok(x);
    }
    check_mask_width::<F>(k, kappa)?;

    // Mod2M algorithm from "Improved Primitives for Secure Multiparty Integer Computation"
    // (https://citeseerx.ist.psu.edu/viewdoc/download?doi=10.1.1.220.9499&rep=rep1&type=pdf)
    let mask = RandomBitMask::draw(ctx, k + kappa)?;
    let low = mask.low(m);
    let (key, party_id) = (ctx.mac_key_share(), ctx.party_id());

    let mask_value = mask.value();
    let offset = F::power_of_two(k - 1);
    let masked = ctx.map(x, move |x| (x + mask_value).add_public(offset, key, party_id));
    let masked = ctx.open(masked);

    Ok(ctx.seq(masked, move |ctx, masked: F| {
        let masked = masked.to_u128_truncated() % (1u128 << m);
        let (masked_less, _) = bitwise_compare(ctx, masked, low.bits())?;
        let low_value = low.value();
        let correction = F::power_of_two(m);
        Ok(ctx.map(masked_less, move |u| {
            low_value.sub_from_public(F::from_u128(masked), key, party_id) + u * correction
        }))
    }))
}

/// Floor division of a k-bit signed integer by 2^m. Shifts of at least `k - 1` bits are
/// clamped, which gives the same result for inputs in range.
pub fn div_power_of_two<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    m: usize,
    k: usize,
    kappa: usize,
) -> Result<DeferredShare<F>> {
    if k == 0 {
        return Err(ConfigError::ZeroBitLength.into());
    }
    let m = cmp::min(m, k - 1);
    let remainder = mod2m(ctx, x, m, k, kappa)?;
    let scale = F::power_of_two_inverse(m);
    Ok(ctx.map((x, remainder), move |(x, remainder)| (x - remainder) * scale))
}

/// Sharing of `[x < 0]` for a k-bit signed integer.
pub fn less_than_zero<F: MpcField>(
    ctx: &ProtocolBuilder<'_, F>,
    x: DeferredShare<F>,
    k: usize,
    kappa: usize,
) -> Result<DeferredShare<F>> {
    if k == 0 {
        return Err(ConfigError::ZeroBitLength.into());
    }
    let shifted = div_power_of_two(ctx, x, k - 1, k, kappa)?;
    Ok(ctx.map(shifted, |x| -x))
}

#[cfg(test)]
mod tests {
    use crate::circuits::{testing::*, *};
    use crate::config::NumericConfig;
    use crate::error::{ConfigError, Error};
    use crate::executor::ProtocolBuilder;
    use crate::fields::Mersenne61;
    use crate::preprocessing::InsecureDummySupplier;

    const KAPPA: usize = 40;
    const CASES: [i128; 7] = [0, 1, -1, 123, -123, 17, -17];

    #[tokio::test]
    async fn test_mod2m_scenario() {
        let run = run_parties(3, &[173], NumericConfig::default(), |ctx, x| {
            mod2m(ctx, x[0], 3, 8, KAPPA)
        })
        .await
        .unwrap();
        assert_eq!(run.value, 5);
        // Masked opening, two levels of bitwise comparison, final opening.
        assert_eq!(run.stats.rounds, 4);
    }

    #[tokio::test]
    async fn test_mod_power_of_two() {
        for power in 0..8 {
            for value in CASES {
                let reduced = test_circuit(|ctx| {
                    let reduced = mod2m(ctx, plain(ctx, value), power, 8, KAPPA)?;
                    Ok(open_signed(ctx, reduced))
                })
                .await;
                assert_eq!(reduced, value.rem_euclid(1 << power), "{} mod 2^{}", value, power);
            }
        }
    }

    #[tokio::test]
    async fn test_unsigned_inputs() {
        for value in [0, 1, 77, 128, 200, 255] {
            let reduced = test_circuit(|ctx| {
                let reduced = mod2m(ctx, plain(ctx, value), 5, 8, KAPPA)?;
                Ok(open_signed(ctx, reduced))
            })
            .await;
            assert_eq!(reduced, value % 32);
        }
    }

    #[tokio::test]
    async fn test_fast_path_returns_input() {
        // 300 does not fit into 8 bits and is still returned as is.
        let run = run_parties(2, &[300], NumericConfig::default(), |ctx, x| {
            let reduced = mod2m(ctx, x[0], 8, 8, KAPPA)?;
            assert_eq!(reduced.id(), x[0].id());
            Ok(reduced)
        })
        .await
        .unwrap();
        assert_eq!(run.value, 300);
        assert_eq!(run.stats.rounds, 1);
    }

    #[tokio::test]
    async fn test_div_power_of_two() {
        for power in 0..10 {
            for value in CASES {
                let reduced = test_circuit(|ctx| {
                    let reduced = div_power_of_two(ctx, plain(ctx, value), power, 8, KAPPA)?;
                    Ok(open_signed(ctx, reduced))
                })
                .await;
                assert_eq!(reduced, value >> power, "{} >> {}", value, power);
            }
        }
    }

    #[tokio::test]
    async fn test_less_than_zero() {
        for value in CASES {
            let bit = test_circuit(|ctx| {
                let bit = less_than_zero(ctx, plain(ctx, value), 8, KAPPA)?;
                Ok(open_signed(ctx, bit))
            })
            .await;
            assert_eq!(bit == 1, value < 0);
        }
    }

    #[tokio::test]
    async fn test_less_than_zero_between_parties() {
        for value in [-100, 0, 100] {
            let run = run_parties(3, &[value], NumericConfig::default(), |ctx, x| {
                less_than_zero(ctx, x[0], 8, KAPPA)
            })
            .await
            .unwrap();
            assert_eq!(run.value, i128::from(value < 0));
        }
    }

    #[test]
    fn test_mask_too_wide() {
        let supplier = InsecureDummySupplier::<Mersenne61>::new(0, 1, SEED).unwrap();
        let ctx = ProtocolBuilder::new(supplier, DefaultComparison::default());
        let x = ctx.known(ctx.public_share(Mersenne61::from(3u64)));
        assert_eq!(
            mod2m(&ctx, x, 3, 30, KAPPA).unwrap_err(),
            Error::Configuration(ConfigError::MaskTooWide {
                bits: 71,
                field_bits: 61
            })
        );
        assert_eq!(
            less_than_zero(&ctx, x, 0, KAPPA).unwrap_err(),
            Error::Configuration(ConfigError::ZeroBitLength)
        );
    }
}
