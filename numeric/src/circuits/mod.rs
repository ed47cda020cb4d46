//! Arithmetic protocols over deferred SPDZ shares.
//!
//! Every function here only extends the step graph of a [`crate::executor::ProtocolBuilder`];
//! nothing is sent until the graph is evaluated. Preprocessing items are drawn while building,
//! so all parties must build the same protocols in the same order.

mod bitwise;
mod comparison;
mod elementary;
pub mod logical;
mod mod2m;
mod sequences;

pub use bitwise::{bitwise_compare, RandomBitMask};
pub use comparison::{Comparison, DefaultComparison};
pub use elementary::{add, add_public, mul, negate, scale, sub, sub_from_public};
pub use mod2m::{div_power_of_two, less_than_zero, mod2m};
pub use sequences::{fold_tree, product};

#[cfg(test)]
pub(crate) mod testing;
