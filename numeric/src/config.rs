use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, fields::MpcField};

/// Parameters of the numeric protocols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NumericConfig {
    /// Bound on the magnitude of secret integers: `|x| < 2^max_bit_length`.
    pub max_bit_length: usize,

    /// Statistical security parameter (kappa). Masked openings leak with probability
    /// about `2^-statistical_security`.
    pub statistical_security: usize,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            max_bit_length: 32,
            statistical_security: 40,
        }
    }
}

impl NumericConfig {
    pub fn new(max_bit_length: usize, statistical_security: usize) -> Self {
        Self {
            max_bit_length,
            statistical_security,
        }
    }

    /// Check that every comparison of `max_bit_length`-bit operands fits field `F`.
    pub fn validate<F: MpcField>(&self) -> Result<(), ConfigError> {
        if self.max_bit_length == 0 {
            return Err(ConfigError::ZeroBitLength);
        }
        // Widest mask is taken by the difference of two operands.
        check_mask_width::<F>(self.max_bit_length + 2, self.statistical_security)
    }
}

/// Check that `2^(k-1) + x + r` with a `k + kappa` bit mask `r` cannot wrap around modulo `p`.
pub fn check_mask_width<F: MpcField>(k: usize, kappa: usize) -> Result<(), ConfigError> {
    let bits = k + kappa + 1;
    if bits >= F::NUM_BITS as usize {
        Err(ConfigError::MaskTooWide {
            bits,
            field_bits: F::NUM_BITS,
        })
    } else {
        Ok(())
    }
}
