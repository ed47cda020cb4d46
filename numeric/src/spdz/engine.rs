use async_trait::async_trait;
use futures::{Sink, Stream};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::{
    error::{MaliciousError, Result},
    fields::MpcField,
    transport::MultipartyTransport,
    MpcContext, MpcEngine,
};

use super::SpdzShare;

/// SPDZ protocol message.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound = "T: MpcField")]
pub enum SpdzMessage<T> {
    PartialOpenShares(Vec<T>),
    PartialOpenSum(Vec<T>),
}

/// Opened value with this party's MAC share, kept for the MAC check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenedValue<T> {
    pub value: T,
    pub mac_share: T,
}

/// SPDZ protocol implementation.
///
/// Openings are not verified here. Every opened value is logged together with the local MAC
/// share, and the caller has to run a MAC check over [`SpdzEngine::take_opened_values`] before
/// any opened value influences a public decision.
pub struct SpdzEngine<T, Channel> {
    transport: MultipartyTransport<SpdzMessage<T>, Channel>,
    opened_values: Vec<OpenedValue<T>>,
}

impl<T, Channel> SpdzEngine<T, Channel> {
    pub fn new(transport: MultipartyTransport<SpdzMessage<T>, Channel>) -> Self {
        Self {
            transport,
            opened_values: Vec::new(),
        }
    }

    /// Drain values opened since the last call.
    pub fn take_opened_values(&mut self) -> Vec<OpenedValue<T>> {
        std::mem::take(&mut self.opened_values)
    }
}

impl<T: MpcField, Channel> MpcContext for SpdzEngine<T, Channel> {
    type Field = T;

    fn num_parties(&self) -> usize {
        self.transport.num_parties()
    }

    fn party_id(&self) -> usize {
        self.transport.party_id()
    }
}

impl<T, E, Channel> SpdzEngine<T, Channel>
where
    T: MpcField,
    Channel: Stream<Item = std::result::Result<SpdzMessage<T>, E>> + Sink<SpdzMessage<T>> + Unpin,
{
    /// Party 0 sums all partial openings and broadcasts the result.
    async fn open_as_collector(&mut self, mut values: Vec<T>) -> Result<Vec<T>> {
        for (other_id, msg) in self.transport.receive_from_all().await? {
            let parts = match msg {
                SpdzMessage::PartialOpenShares(parts) => parts,
                _ => return Err(malicious(MaliciousError::UnexpectedMessage(other_id))),
            };
            if parts.len() != values.len() {
                return Err(malicious(MaliciousError::ShareCountMismatch {
                    party: other_id,
                    expected: values.len(),
                    actual: parts.len(),
                }));
            }
            for (value, part) in values.iter_mut().zip(parts) {
                *value += part;
            }
        }
        self.transport
            .send_to_all(SpdzMessage::PartialOpenSum(values.clone()))
            .await?;
        Ok(values)
    }

    /// Every other party sends its shares to party 0 and waits for the sum.
    async fn open_as_contributor(&mut self, values: Vec<T>) -> Result<Vec<T>> {
        let expected = values.len();
        self.transport
            .send_to(0, SpdzMessage::PartialOpenShares(values))
            .await?;
        match self.transport.receive_from(0).await? {
            SpdzMessage::PartialOpenSum(sums) if sums.len() == expected => Ok(sums),
            SpdzMessage::PartialOpenSum(sums) => {
                Err(malicious(MaliciousError::ShareCountMismatch {
                    party: 0,
                    expected,
                    actual: sums.len(),
                }))
            }
            _ => Err(malicious(MaliciousError::UnexpectedMessage(0))),
        }
    }
}

#[async_trait(?Send)]
impl<T, E, Channel> MpcEngine for SpdzEngine<T, Channel>
where
    T: MpcField,
    Channel: Stream<Item = std::result::Result<SpdzMessage<T>, E>> + Sink<SpdzMessage<T>> + Unpin,
{
    async fn process_openings_bundle(&mut self, requests: Vec<SpdzShare<T>>) -> Result<Vec<T>> {
        trace!(
            party_id = self.party_id(),
            count = requests.len(),
            "opening shares"
        );
        let values: Vec<_> = requests.iter().map(|x| x.value).collect();
        let opened = if self.party_id() == 0 {
            self.open_as_collector(values).await?
        } else {
            self.open_as_contributor(values).await?
        };

        self.opened_values
            .extend(opened.iter().zip(&requests).map(|(&value, share)| OpenedValue {
                value,
                mac_share: share.mac,
            }));
        Ok(opened)
    }
}

fn malicious(err: MaliciousError) -> crate::Error {
    warn!(%err, "peer violated the opening protocol");
    err.into()
}

#[cfg(test)]
mod tests {
    use ff::Field;

    use super::*;
    use crate::{
        circuits::DefaultComparison,
        error::{Error, TransportError},
        executor::{MpcExecutor, ProtocolBuilder},
        fields::Mersenne127,
        preprocessing::{InsecureDummySupplier, PreprocessingSupplier},
        transport::mock_multiparty_channels,
    };

    type Fp = Mersenne127;

    #[tokio::test]
    async fn test_opening_across_parties() {
        let num_parties = 3;
        let transports = mock_multiparty_channels::<SpdzMessage<Fp>>(num_parties, 1 << 16);
        let mut suppliers: Vec<_> = (0..num_parties)
            .map(|id| InsecureDummySupplier::<Fp>::new(id, num_parties, 42).unwrap())
            .collect();
        let mac_key = suppliers[0].mac_key();

        let runs = transports
            .into_iter()
            .zip(suppliers.iter_mut())
            .map(|(transport, supplier)| async move {
                let mut engine = SpdzEngine::new(transport);
                let x = supplier.share_input(Fp::from(1337u64));
                let y = supplier.share_input(Fp::from(42u64));
                let sum = x + supplier.share_public(Fp::from(3u64)) - y;
                let opened = engine.process_openings_bundle(vec![x, sum]).await.unwrap();
                (opened, engine.take_opened_values())
            });
        let results = futures::future::join_all(runs).await;

        for (opened, _) in &results {
            assert_eq!(opened, &vec![Fp::from(1337u64), Fp::from(1298u64)]);
        }
        for i in 0..2 {
            let mac = results
                .iter()
                .fold(Fp::zero(), |acc, (_, log)| acc + log[i].mac_share);
            assert_eq!(mac, mac_key * results[0].1[i].value);
        }
    }

    #[tokio::test]
    async fn test_mismatched_share_count_is_malicious() {
        let mut transports = mock_multiparty_channels::<SpdzMessage<Fp>>(2, 1 << 16);
        let mut cheater = transports.pop().unwrap();
        let mut engine = SpdzEngine::new(transports.pop().unwrap());

        let share = SpdzShare::new(Fp::one(), Fp::one());
        let (result, sent) = futures::join!(
            engine.process_openings_bundle(vec![share, share]),
            cheater.send_to(0, SpdzMessage::PartialOpenShares(vec![Fp::one()])),
        );
        sent.unwrap();
        let err = result.unwrap_err();
        assert!(err.is_malicious());
        assert_eq!(
            err,
            Error::Malicious(MaliciousError::ShareCountMismatch {
                party: 1,
                expected: 2,
                actual: 1
            })
        );
    }

    #[tokio::test]
    async fn test_peer_leaving_mid_protocol_is_transient() {
        let mut transports = mock_multiparty_channels::<SpdzMessage<Fp>>(2, 1 << 16);
        let leaving = transports.pop().unwrap();
        let staying = transports.pop().unwrap();

        let builder = |party_id| {
            let supplier = InsecureDummySupplier::<Fp>::new(party_id, 2, 42).unwrap();
            ProtocolBuilder::new(supplier, DefaultComparison::default())
        };
        let (ctx0, ctx1) = (builder(0), builder(1));

        // Both parties take part in the first opening, only party 0 continues.
        let first = ctx0.open(ctx0.known(ctx0.public_share(Fp::from(3u64))));
        let second = ctx0.seq(first, |ctx, first: Fp| {
            Ok(ctx.open(ctx.known(ctx.public_share(first.double()))))
        });
        let first1 = ctx1.open(ctx1.known(ctx1.public_share(Fp::from(3u64))));

        let collector = async {
            let mut executor = MpcExecutor::new(SpdzEngine::new(staying));
            let result = executor.run(&ctx0, second).await;
            let logged = executor.engine_mut().take_opened_values();
            (result, logged, executor.stats())
        };
        let contributor = async {
            let mut executor = MpcExecutor::new(SpdzEngine::new(leaving));
            let value = executor.run(&ctx1, first1).await;
            drop(executor);
            value
        };
        let ((result, logged, stats), value) = futures::join!(collector, contributor);

        assert_eq!(value.unwrap(), Fp::from(3u64));
        let err = result.unwrap_err();
        assert_eq!(err, Error::Transport(TransportError::Recv(1)));
        assert!(err.is_transient());
        assert!(!err.is_malicious());
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].value, Fp::from(3u64));
        assert_eq!(stats.rounds, 1);
    }
}
