use ff::Field;
use futures::future::join_all;

use crate::{
    config::NumericConfig,
    error::{Error, Result},
    executor::{Deferred, DeferredShare, EvaluationStats, MpcExecutor, ProtocolBuilder},
    fields::{Mersenne127, MpcField},
    plaintext::MockMpcEngine,
    preprocessing::InsecureDummySupplier,
    spdz::{SpdzEngine, SpdzMessage},
    transport::mock_multiparty_channels,
};

use super::DefaultComparison;

pub type TestField = Mersenne127;

pub const SEED: u64 = 42;

/// Sharing of a public integer.
pub fn plain(ctx: &ProtocolBuilder<TestField>, value: i128) -> DeferredShare<TestField> {
    ctx.known(ctx.public_share(TestField::from_i128(value)))
}

/// Open share and interpret it as a signed integer.
pub fn open_signed(ctx: &ProtocolBuilder<TestField>, share: DeferredShare<TestField>) -> Deferred<i128> {
    ctx.map(ctx.open(share), |x: TestField| x.to_signed())
}

/// Evaluate protocol on a single party with a mock engine.
pub async fn test_circuit<T, B>(build: B) -> T
where
    T: Clone + 'static,
    B: FnOnce(&ProtocolBuilder<TestField>) -> Result<Deferred<T>>,
{
    let supplier = InsecureDummySupplier::new(0, 1, SEED).unwrap();
    let ctx = ProtocolBuilder::new(supplier, DefaultComparison::default());
    let root = build(&ctx).unwrap();
    MpcExecutor::new(MockMpcEngine::new())
        .run(&ctx, root)
        .await
        .unwrap()
}

/// Outcome of a protocol run on all parties.
#[derive(Debug)]
pub struct TestRun {
    pub value: i128,
    pub stats: EvaluationStats,
}

/// Run protocol on `num_parties` parties connected by in-process channels.
///
/// `inputs` are secret-shared among the parties and handed to `build`, which returns the share
/// to open. Asserts that all parties agree on the output and that every opened value carries
/// a consistent MAC.
pub async fn run_parties<B>(
    num_parties: usize,
    inputs: &[i128],
    config: NumericConfig,
    build: B,
) -> Result<TestRun>
where
    B: Fn(&ProtocolBuilder<TestField>, &[DeferredShare<TestField>]) -> Result<DeferredShare<TestField>>,
{
    let transports = mock_multiparty_channels::<SpdzMessage<TestField>>(num_parties, 1 << 20);
    let build = &build;
    let runs = transports
        .into_iter()
        .enumerate()
        .map(|(party_id, transport)| async move {
            let mut supplier = InsecureDummySupplier::new(party_id, num_parties, SEED)?;
            let mac_key = supplier.mac_key();
            let shares: Vec<_> = inputs
                .iter()
                .map(|&x| supplier.share_input(TestField::from_i128(x)))
                .collect();

            let ctx = ProtocolBuilder::new(supplier, DefaultComparison::new::<TestField>(config)?);
            let shares: Vec<_> = shares.into_iter().map(|x| ctx.known(x)).collect();
            let output = ctx.open(build(&ctx, &shares)?);

            let mut executor = MpcExecutor::new(SpdzEngine::new(transport));
            let value = executor.run(&ctx, output).await?;
            let stats = executor.stats();
            let opened = executor.into_engine().take_opened_values();
            Ok::<_, Error>((value, stats, mac_key, opened))
        });
    let results = join_all(runs)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let (value, stats, mac_key, opened) = &results[0];
    for (other_value, other_stats, _, other_opened) in &results[1..] {
        assert_eq!(other_value, value);
        assert_eq!(other_stats, stats);
        assert_eq!(other_opened.len(), opened.len());
    }
    for (i, entry) in opened.iter().enumerate() {
        let mac = results
            .iter()
            .fold(TestField::zero(), |acc, (_, _, _, log)| acc + log[i].mac_share);
        assert_eq!(mac, *mac_key * entry.value, "MAC check failed for opening {}", i);
    }

    Ok(TestRun {
        value: value.to_signed(),
        stats: *stats,
    })
}
