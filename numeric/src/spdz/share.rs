use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::{Add, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};

use crate::{fields::MpcField, DESIGNATED_PARTY};

/// Value share in SPDZ protocol.
///
/// Summed over all parties, `value` gives the secret `v` and `mac` gives `alpha * v`,
/// where `alpha` is the global authentication key.
///
/// Equality and hashing compare the local share only. Two shares of the same secret are
/// usually different, so never branch on it outside of tests.
#[derive(Copy, Clone, Deserialize, Serialize)]
#[serde(bound = "T: MpcField")]
pub struct SpdzShare<T> {
    pub(crate) value: T,
    pub(crate) mac: T,
}

impl<T: MpcField> SpdzShare<T> {
    /// Wrap raw value and MAC shares.
    pub fn new(value: T, mac: T) -> Self {
        Self { value, mac }
    }

    /// Sharing of zero.
    pub fn zero() -> Self {
        Self {
            value: T::zero(),
            mac: T::zero(),
        }
    }

    /// Sharing of a public constant. Only the designated party holds the value itself.
    pub fn from_public(x: T, mac_key_share: T, party_id: usize) -> Self {
        Self::zero().add_public(x, mac_key_share, party_id)
    }

    /// Local share of the secret value.
    pub fn value(&self) -> T {
        self.value
    }

    /// Local share of the MAC of the secret value.
    pub fn mac(&self) -> T {
        self.mac
    }

    /// Add public constant without communication.
    pub fn add_public(self, x: T, mac_key_share: T, party_id: usize) -> Self {
        Self {
            value: if party_id == DESIGNATED_PARTY {
                self.value + x
            } else {
                self.value
            },
            mac: self.mac + x * mac_key_share,
        }
    }

    /// Subtract share from public constant, i.e. compute `x - self`.
    pub fn sub_from_public(self, x: T, mac_key_share: T, party_id: usize) -> Self {
        (-self).add_public(x, mac_key_share, party_id)
    }

    /// Multiply share by two.
    pub fn double(&self) -> Self {
        Self {
            value: self.value.double(),
            mac: self.mac.double(),
        }
    }
}

impl<T: MpcField> PartialEq for SpdzShare<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.mac == other.mac
    }
}

impl<T: MpcField> Eq for SpdzShare<T> {}

impl<T: MpcField> Hash for SpdzShare<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.to_repr().as_ref().hash(state);
        self.mac.to_repr().as_ref().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for SpdzShare<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spdz({:?}, {:?})", self.value, self.mac)
    }
}

impl<T: MpcField> Add for SpdzShare<T> {
    type Output = SpdzShare<T>;
    fn add(self, rhs: Self) -> Self::Output {
        SpdzShare {
            value: self.value + rhs.value,
            mac: self.mac + rhs.mac,
        }
    }
}

impl<T: MpcField> Sub for SpdzShare<T> {
    type Output = SpdzShare<T>;
    fn sub(self, rhs: Self) -> Self::Output {
        SpdzShare {
            value: self.value - rhs.value,
            mac: self.mac - rhs.mac,
        }
    }
}

impl<T: MpcField> Neg for SpdzShare<T> {
    type Output = SpdzShare<T>;
    fn neg(self) -> Self::Output {
        SpdzShare {
            value: -self.value,
            mac: -self.mac,
        }
    }
}

impl<T: MpcField> Mul<T> for SpdzShare<T> {
    type Output = SpdzShare<T>;
    fn mul(self, rhs: T) -> Self::Output {
        SpdzShare {
            value: self.value * rhs,
            mac: self.mac * rhs,
        }
    }
}
