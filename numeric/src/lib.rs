//! Arithmetic core of an SPDZ-style secure multi-party computation framework.
//!
//! Secret values live in a prime field as [`spdz::SpdzShare`]s. Protocols are built as graphs of
//! deferred steps with [`executor::ProtocolBuilder`] and evaluated round by round by
//! [`executor::MpcExecutor`], which batches all openings that are ready at the same time.

use async_trait::async_trait;

pub mod circuits;
pub mod config;
pub mod error;
pub mod executor;
pub mod fields;
pub mod plaintext;
pub mod preprocessing;
pub mod spdz;
pub mod transport;

pub use error::{Error, Result};
pub use fields::MpcField;

use spdz::SpdzShare;

/// Party that adds public constants into its share.
pub const DESIGNATED_PARTY: usize = 0;

/// Sharing-based MPC computation context.
pub trait MpcContext {
    /// Field type used by this MPC protocol.
    type Field: MpcField;

    /// Number of parties participating in MPC computation.
    fn num_parties(&self) -> usize;

    /// ID of current party.
    fn party_id(&self) -> usize;
}

/// Low-level interface of sharing-based MPC protocol.
#[async_trait(?Send)]
pub trait MpcEngine: MpcContext {
    /// Process bundle of partial open requests. Responses are returned in request order.
    async fn process_openings_bundle(
        &mut self,
        requests: Vec<SpdzShare<Self::Field>>,
    ) -> Result<Vec<Self::Field>>;
}
