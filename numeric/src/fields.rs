use ff::PrimeField;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ArithmeticError;

mod mersenne_61 {
    use ff::PrimeField;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Finite field mod 2^61-1.
    #[derive(PrimeField)]
    #[PrimeFieldModulus = "2305843009213693951"]
    #[PrimeFieldGenerator = "37"]
    #[PrimeFieldReprEndianness = "little"]
    pub struct Mersenne61([u64; 1]);

    impl Serialize for Mersenne61 {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.to_repr().0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Mersenne61 {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = Mersenne61Repr(Deserialize::deserialize(deserializer)?);
            Self::from_repr_vartime(repr)
                .ok_or_else(|| serde::de::Error::custom("Invalid field element"))
        }
    }
}

mod mersenne_127 {
    use ff::PrimeField;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Finite field mod 2^127-1.
    #[derive(PrimeField)]
    #[PrimeFieldModulus = "170141183460469231731687303715884105727"]
    #[PrimeFieldGenerator = "43"]
    #[PrimeFieldReprEndianness = "little"]
    pub struct Mersenne127([u64; 2]);

    impl Serialize for Mersenne127 {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.to_repr().0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Mersenne127 {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = Mersenne127Repr(Deserialize::deserialize(deserializer)?);
            Self::from_repr_vartime(repr)
                .ok_or_else(|| serde::de::Error::custom("Invalid field element"))
        }
    }
}

pub use mersenne_127::{Mersenne127, Mersenne127Repr};
pub use mersenne_61::{Mersenne61, Mersenne61Repr};

/// Prime field usable by the protocols in this crate.
///
/// Elements are canonically represented by integers in `[0, p)`. Integer conversions assume
/// the modulus fits into 128 bits, which holds for every field defined in this module.
pub trait MpcField: PrimeField + Serialize + DeserializeOwned {
    /// The modulus `p` as an integer.
    fn modulus() -> u128 {
        (-Self::one()).to_u128_truncated() + 1
    }

    /// Embed unsigned integer, reducing it modulo `p`.
    fn from_u128(value: u128) -> Self {
        let low = Self::from(value as u64);
        let high = Self::from((value >> 64) as u64);
        low + high * Self::power_of_two(64)
    }

    /// Embed signed integer. Negative values map to `p - |value|`.
    fn from_i128(value: i128) -> Self {
        let elem = Self::from_u128(value.unsigned_abs());
        if value < 0 {
            -elem
        } else {
            elem
        }
    }

    /// Canonical integer representative, truncated to its low 128 bits.
    fn to_u128_truncated(&self) -> u128 {
        let repr = self.to_repr();
        repr.as_ref()
            .iter()
            .take(16)
            .enumerate()
            .fold(0u128, |acc, (i, &byte)| acc | (byte as u128) << (8 * i))
    }

    /// Signed representative in range `[-(p-1)/2, (p-1)/2]`.
    fn to_signed(&self) -> i128 {
        let value = self.to_u128_truncated();
        let modulus = Self::modulus();
        if value > modulus / 2 {
            -((modulus - value) as i128)
        } else {
            value as i128
        }
    }

    /// Multiplicative inverse. Fails for zero.
    fn mod_inverse(&self) -> Result<Self, ArithmeticError> {
        Option::from(self.invert()).ok_or(ArithmeticError::NotInvertible)
    }

    /// Element `2^k`.
    fn power_of_two(k: usize) -> Self {
        Self::from(2u64).pow_vartime([k as u64])
    }

    /// Element `2^-k`.
    fn power_of_two_inverse(k: usize) -> Self {
        // (p + 1) / 2 is the inverse of 2 for odd p.
        Self::from_u128(Self::modulus() / 2 + 1).pow_vartime([k as u64])
    }
}

impl<T: PrimeField + Serialize + DeserializeOwned> MpcField for T {}
