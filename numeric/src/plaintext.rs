use std::marker::PhantomData;

use async_trait::async_trait;

use crate::{
    error::Result, fields::MpcField, spdz::OpenedValue, spdz::SpdzShare, MpcContext, MpcEngine,
};

/// Mock MPC engine that computes result in plain on a single node.
///
/// With a single party every share holds the whole secret, so opening just reads it.
/// Pair it with a supplier created for one party.
pub struct MockMpcEngine<T> {
    _phantom: PhantomData<T>,
    num_openings: usize,
    num_rounds: usize,
    opened_values: Vec<OpenedValue<T>>,
}

impl<T: MpcField> MockMpcEngine<T> {
    /// Create a new instance of mock.
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
            num_openings: 0,
            num_rounds: 0,
            opened_values: Vec::new(),
        }
    }

    /// Get total count of open requests.
    pub fn num_openings(&self) -> usize {
        self.num_openings
    }

    /// Get total number of rounds.
    pub fn num_rounds(&self) -> usize {
        self.num_rounds
    }

    /// Drain values opened since the last call.
    pub fn take_opened_values(&mut self) -> Vec<OpenedValue<T>> {
        std::mem::take(&mut self.opened_values)
    }
}

impl<T: MpcField> Default for MockMpcEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MpcField> MpcContext for MockMpcEngine<T> {
    type Field = T;

    fn num_parties(&self) -> usize {
        1
    }

    fn party_id(&self) -> usize {
        0
    }
}

#[async_trait(?Send)]
impl<T: MpcField> MpcEngine for MockMpcEngine<T> {
    async fn process_openings_bundle(&mut self, requests: Vec<SpdzShare<T>>) -> Result<Vec<T>> {
        self.num_openings += requests.len();
        self.num_rounds += 1;
        self.opened_values
            .extend(requests.iter().map(|share| OpenedValue {
                value: share.value(),
                mac_share: share.mac(),
            }));
        Ok(requests.iter().map(SpdzShare::value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Mersenne61;

    type Fp = Mersenne61;

    #[tokio::test]
    async fn test_opening_reveals_plain_value() {
        let key = Fp::from(9u64);
        let mut engine = MockMpcEngine::new();
        let shares = vec![
            SpdzShare::from_public(Fp::from(4u64), key, 0),
            SpdzShare::from_public(Fp::from(8u64), key, 0),
        ];
        let opened = engine.process_openings_bundle(shares).await.unwrap();
        assert_eq!(opened, vec![Fp::from(4u64), Fp::from(8u64)]);
        assert_eq!(engine.num_rounds(), 1);
        assert_eq!(engine.num_openings(), 2);

        let log = engine.take_opened_values();
        assert!(log.iter().all(|x| x.mac_share == key * x.value));
        assert!(engine.take_opened_values().is_empty());
    }
}
