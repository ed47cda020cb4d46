use crate::{
    config::{check_mask_width, NumericConfig},
    error::{ConfigError, Result},
    executor::{DeferredShare, ProtocolBuilder},
    fields::MpcField,
    MpcContext,
};

use super::{
    less_than_zero,
    logical::{not, xor_known},
    product, sub, RandomBitMask,
};

/// Comparison protocols on shared integers.
///
/// A strategy object is chosen when the [`ProtocolBuilder`] is created and every protocol built
/// on it reaches comparisons through [`ProtocolBuilder::comparison`]. Operands are integers with
/// `|x| < 2^max_bit_length` of [`Comparison::config`]. All results are shares of `0` or `1`,
/// except [`Comparison::sign`].
pub trait Comparison<F: MpcField> {
    /// Bit-length bound and statistical security of this strategy.
    fn config(&self) -> NumericConfig;

    /// `[x == 0]` for `|x| < 2^bit_length`.
    fn compare_zero(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x: DeferredShare<F>,
        bit_length: usize,
    ) -> Result<DeferredShare<F>>;

    /// `[x1 <= x2]`.
    fn compare_leq(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x1: DeferredShare<F>,
        x2: DeferredShare<F>,
    ) -> Result<DeferredShare<F>>;

    /// `[x1 <= x2]` for operands up to twice the configured bit length.
    fn compare_leq_long(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x1: DeferredShare<F>,
        x2: DeferredShare<F>,
    ) -> Result<DeferredShare<F>>;

    /// `1` if `x >= 0`, `-1` otherwise.
    fn sign(&self, ctx: &ProtocolBuilder<'_, F>, x: DeferredShare<F>) -> Result<DeferredShare<F>>;

    /// `[x == y]` for `|x|, |y| < 2^bit_length`.
    fn equals_with_bit_length(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x: DeferredShare<F>,
        y: DeferredShare<F>,
        bit_length: usize,
    ) -> Result<DeferredShare<F>> {
        self.compare_zero(ctx, sub(ctx, x, y), bit_length + 1)
    }

    /// `[x == y]`.
    fn equals(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x: DeferredShare<F>,
        y: DeferredShare<F>,
    ) -> Result<DeferredShare<F>> {
        self.equals_with_bit_length(ctx, x, y, self.config().max_bit_length)
    }
}

/// Comparisons by masked openings, as in Mod2m.
///
/// The default strategy uses [`NumericConfig::default`], which fits [`crate::fields::Mersenne127`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultComparison {
    config: NumericConfig,
}

impl DefaultComparison {
    /// Strategy for operands bounded by `config`. Fails if their comparisons can not be masked
    /// in field `F`.
    pub fn new<F: MpcField>(config: NumericConfig) -> Result<Self, ConfigError> {
        config.validate::<F>()?;
        Ok(Self { config })
    }

    fn kappa(&self) -> usize {
        self.config.statistical_security
    }

    /// `1 - [x2 - x1 < 0]` for a difference of `bits + 1` bits.
    fn leq_with_bits<F: MpcField>(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x1: DeferredShare<F>,
        x2: DeferredShare<F>,
        bits: usize,
    ) -> Result<DeferredShare<F>> {
        let negative = less_than_zero(ctx, sub(ctx, x2, x1), bits + 1, self.kappa())?;
        Ok(not(ctx, negative))
    }
}

impl<F: MpcField> Comparison<F> for DefaultComparison {
    fn config(&self) -> NumericConfig {
        self.config
    }

    fn compare_zero(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x: DeferredShare<F>,
        bit_length: usize,
    ) -> Result<DeferredShare<F>> {
        let k = bit_length + 1;
        check_mask_width::<F>(k, self.kappa())?;

        // Opened c = 2^k + x + r is positive. Its low k bits match those of r iff x = 0.
        let mask = RandomBitMask::draw(ctx, k + self.kappa())?;
        let low = mask.low(k);
        let (key, party_id) = (ctx.mac_key_share(), ctx.party_id());
        let mask_value = mask.value();
        let offset = F::power_of_two(k);
        let masked = ctx.map(x, move |x| (x + mask_value).add_public(offset, key, party_id));
        let masked = ctx.open(masked);

        Ok(ctx.seq(masked, move |ctx, masked: F| {
            let masked = masked.to_u128_truncated();
            let equal_bits: Vec<_> = low
                .bits()
                .iter()
                .enumerate()
                .map(|(i, &bit)| {
                    let differs = xor_known(ctx, (masked >> i) & 1 == 1, ctx.known(bit));
                    not(ctx, differs)
                })
                .collect();
            product(ctx, equal_bits)
        }))
    }

    fn compare_leq(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x1: DeferredShare<F>,
        x2: DeferredShare<F>,
    ) -> Result<DeferredShare<F>> {
        self.leq_with_bits(ctx, x1, x2, self.config.max_bit_length + 1)
    }

    /// Fails with a configuration error unless `2 * max_bit_length + 2` bit operands can be
    /// masked in `F`.
    fn compare_leq_long(
        &self,
        ctx: &ProtocolBuilder<'_, F>,
        x1: DeferredShare<F>,
        x2: DeferredShare<F>,
    ) -> Result<DeferredShare<F>> {
        let bits = 2 * self.config.max_bit_length + 1;
        check_mask_width::<F>(bits + 1, self.kappa())?;
        self.leq_with_bits(ctx, x1, x2, bits)
    }

    fn sign(&self, ctx: &ProtocolBuilder<'_, F>, x: DeferredShare<F>) -> Result<DeferredShare<F>> {
        let negative = less_than_zero(ctx, x, self.config.max_bit_length + 1, self.kappa())?;
        let (key, party_id) = (ctx.mac_key_share(), ctx.party_id());
        Ok(ctx.map(negative, move |negative| {
            negative.double().sub_from_public(F::one(), key, party_id)
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use crate::circuits::{testing::*, *};
    use crate::config::NumericConfig;
    use crate::error::{ConfigError, Error, Result};
    use crate::executor::{DeferredShare, ProtocolBuilder};
    use crate::fields::Mersenne61;
    use crate::preprocessing::InsecureDummySupplier;

    fn config() -> NumericConfig {
        NumericConfig::new(8, 40)
    }

    async fn leq(x1: i128, x2: i128) -> i128 {
        run_parties(3, &[x1, x2], config(), |ctx, x| {
            ctx.comparison().compare_leq(ctx, x[0], x[1])
        })
        .await
        .unwrap()
        .value
    }

    #[tokio::test]
    async fn test_compare_leq_scenario() {
        assert_eq!(leq(5, 9).await, 1);
        assert_eq!(leq(9, 5).await, 0);
    }

    #[tokio::test]
    async fn test_compare_leq() {
        let cases = [(0, 0), (-255, 255), (255, -255), (-3, -3), (-4, -3), (100, 99)];
        for (x1, x2) in cases {
            let result = test_circuit(|ctx| {
                let (a, b) = (plain(ctx, x1), plain(ctx, x2));
                let result = DefaultComparison::new::<TestField>(config())?.compare_leq(ctx, a, b)?;
                Ok(open_signed(ctx, result))
            })
            .await;
            assert_eq!(result == 1, x1 <= x2, "{} <= {}", x1, x2);
        }
    }

    #[tokio::test]
    async fn test_compare_leq_long() {
        let cases = [(60000, -60000), (-60000, 60000), (65535, 65535), (3, 4)];
        for (x1, x2) in cases {
            let result = run_parties(2, &[x1, x2], config(), |ctx, x| {
                ctx.comparison().compare_leq_long(ctx, x[0], x[1])
            })
            .await
            .unwrap();
            assert_eq!(result.value == 1, x1 <= x2, "{} <= {}", x1, x2);
        }
    }

    #[tokio::test]
    async fn test_compare_leq_long_precondition() {
        let err = run_parties(2, &[1, 2], NumericConfig::new(48, 40), |ctx, x| {
            ctx.comparison().compare_leq_long(ctx, x[0], x[1])
        })
        .await
        .unwrap_err();
        assert_eq!(
            err,
            Error::Configuration(ConfigError::MaskTooWide {
                bits: 139,
                field_bits: 127
            })
        );
    }

    #[tokio::test]
    async fn test_equals() {
        for (x, y, expected) in [(7, 7, 1), (7, -7, 0), (-255, -255, 1), (0, 1, 0)] {
            let run = run_parties(3, &[x, y], config(), |ctx, v| {
                ctx.comparison().equals(ctx, v[0], v[1])
            })
            .await
            .unwrap();
            assert_eq!(run.value, expected, "{} == {}", x, y);
        }
    }

    #[tokio::test]
    async fn test_equals_with_bit_length() {
        let result = test_circuit(|ctx| {
            let (a, b) = (plain(ctx, 1 << 20), plain(ctx, 1 << 20));
            let result = ctx.comparison().equals_with_bit_length(ctx, a, b, 21)?;
            Ok(open_signed(ctx, result))
        })
        .await;
        assert_eq!(result, 1);
    }

    #[tokio::test]
    async fn test_sign() {
        for (x, expected) in [(0, 1), (5, 1), (-5, -1), (255, 1), (-255, -1)] {
            let run = run_parties(2, &[x], config(), |ctx, v| ctx.comparison().sign(ctx, v[0]))
                .await
                .unwrap();
            assert_eq!(run.value, expected, "sign({})", x);
        }
    }

    #[tokio::test]
    async fn test_compare_zero() {
        for x in [0, 1, -1, 200, -200] {
            let result = test_circuit(|ctx| {
                let result = ctx.comparison().compare_zero(ctx, plain(ctx, x), 8)?;
                Ok(open_signed(ctx, result))
            })
            .await;
            assert_eq!(result == 1, x == 0, "{} == 0", x);
        }
    }

    #[test]
    fn test_config_is_validated() {
        assert!(DefaultComparison::new::<TestField>(NumericConfig::default()).is_ok());
        assert_eq!(
            DefaultComparison::new::<Mersenne61>(NumericConfig::default()),
            Err(ConfigError::MaskTooWide {
                bits: 75,
                field_bits: 61
            })
        );
        assert_eq!(
            DefaultComparison::new::<TestField>(NumericConfig::new(0, 40)),
            Err(ConfigError::ZeroBitLength)
        );
    }

    /// Strategy that counts calls and delegates to the default one.
    struct CountingComparison {
        inner: DefaultComparison,
        calls: Rc<Cell<usize>>,
    }

    impl Comparison<TestField> for CountingComparison {
        fn config(&self) -> NumericConfig {
            Comparison::<TestField>::config(&self.inner)
        }

        fn compare_zero(
            &self,
            ctx: &ProtocolBuilder<'_, TestField>,
            x: DeferredShare<TestField>,
            bit_length: usize,
        ) -> Result<DeferredShare<TestField>> {
            self.calls.set(self.calls.get() + 1);
            self.inner.compare_zero(ctx, x, bit_length)
        }

        fn compare_leq(
            &self,
            ctx: &ProtocolBuilder<'_, TestField>,
            x1: DeferredShare<TestField>,
            x2: DeferredShare<TestField>,
        ) -> Result<DeferredShare<TestField>> {
            self.calls.set(self.calls.get() + 1);
            self.inner.compare_leq(ctx, x1, x2)
        }

        fn compare_leq_long(
            &self,
            ctx: &ProtocolBuilder<'_, TestField>,
            x1: DeferredShare<TestField>,
            x2: DeferredShare<TestField>,
        ) -> Result<DeferredShare<TestField>> {
            self.inner.compare_leq_long(ctx, x1, x2)
        }

        fn sign(
            &self,
            ctx: &ProtocolBuilder<'_, TestField>,
            x: DeferredShare<TestField>,
        ) -> Result<DeferredShare<TestField>> {
            self.inner.sign(ctx, x)
        }
    }

    #[test]
    fn test_strategy_is_chosen_at_construction() {
        let calls = Rc::new(Cell::new(0));
        let supplier = InsecureDummySupplier::<TestField>::new(0, 1, SEED).unwrap();
        let strategy = CountingComparison {
            inner: DefaultComparison::new::<TestField>(config()).unwrap(),
            calls: calls.clone(),
        };
        let ctx = ProtocolBuilder::new(supplier, strategy);
        let (a, b) = (plain(&ctx, 1), plain(&ctx, 2));

        ctx.comparison().compare_leq(&ctx, a, b).unwrap();
        ctx.comparison().equals(&ctx, a, b).unwrap();
        assert_eq!(calls.get(), 2);
    }
}
