//! Deferred protocol composition.
//!
//! A protocol is described as a graph of steps. Each [`Deferred`] names a node whose value
//! becomes available either by running a local step once its dependencies are known or by
//! opening a share in a network round. [`MpcExecutor`] evaluates the graph and batches every
//! opening that is ready at the same time into a single round.
//!
//! All parties must build the same graph. Node IDs are assigned in creation order, so
//! protocols whose structure only depends on public values yield identical batches on every
//! party.

use std::{
    cell::{RefCell, RefMut},
    fmt,
    marker::PhantomData,
    rc::Rc,
};

use tracing::{debug, trace, warn};

use crate::{
    circuits::Comparison,
    error::{Error, Result},
    fields::MpcField,
    preprocessing::PreprocessingSupplier,
    spdz::SpdzShare,
    MpcContext, MpcEngine,
};

mod graph;
mod inputs;

use graph::{Advance, Graph};
pub use graph::NodeId;
pub use inputs::Inputs;

/// Handle to a value that will be known at some later round.
pub struct Deferred<T> {
    id: NodeId,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Deferred<T> {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Graph node holding the value.
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Deferred<T> {}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deferred({})", self.id.0)
    }
}

/// Deferred share of a secret field element.
pub type DeferredShare<F> = Deferred<SpdzShare<F>>;

type Step<'a, F> = Box<dyn FnOnce(&ProtocolBuilder<'a, F>) -> Result<NodeId> + 'a>;

/// Builds the step graph of one party.
///
/// Holds the party's preprocessing supplier and the comparison strategy used by the protocols
/// built on it. Steps run later, during evaluation, and may extend the graph themselves.
pub struct ProtocolBuilder<'a, F: MpcField> {
    graph: RefCell<Graph<Step<'a, F>>>,
    supplier: RefCell<Box<dyn PreprocessingSupplier<Field = F> + 'a>>,
    comparison: Box<dyn Comparison<F> + 'a>,
    mac_key_share: F,
    party_id: usize,
    num_parties: usize,
}

impl<'a, F: MpcField> ProtocolBuilder<'a, F> {
    /// Create builder for the party served by `supplier`.
    pub fn new<S, C>(supplier: S, comparison: C) -> Self
    where
        S: PreprocessingSupplier<Field = F> + 'a,
        C: Comparison<F> + 'a,
    {
        let (party_id, num_parties) = (supplier.party_id(), supplier.num_parties());
        debug!(party_id, num_parties, "creating protocol builder");
        Self {
            graph: RefCell::new(Graph::new()),
            mac_key_share: supplier.mac_key_share(),
            supplier: RefCell::new(Box::new(supplier)),
            comparison: Box::new(comparison),
            party_id,
            num_parties,
        }
    }

    /// This party's share of the global authentication key.
    pub fn mac_key_share(&self) -> F {
        self.mac_key_share
    }

    /// Preprocessing supplier. The borrow must end before the builder is used again.
    pub fn supplier(&self) -> RefMut<'_, dyn PreprocessingSupplier<Field = F> + 'a> {
        RefMut::map(self.supplier.borrow_mut(), |supplier| &mut **supplier)
    }

    /// Comparison strategy chosen at construction.
    pub fn comparison(&self) -> &(dyn Comparison<F> + 'a) {
        self.comparison.as_ref()
    }

    /// Sharing of a public constant.
    pub fn public_share(&self, x: F) -> SpdzShare<F> {
        SpdzShare::from_public(x, self.mac_key_share, self.party_id)
    }

    /// Number of nodes not yet discarded.
    pub fn num_nodes(&self) -> usize {
        self.graph.borrow().len()
    }

    /// Already known value.
    pub fn known<T: 'static>(&self, value: T) -> Deferred<T> {
        Deferred::new(self.push_value(value))
    }

    /// Apply local function once all inputs are known.
    pub fn map<I, T, M>(&self, inputs: I, f: M) -> Deferred<T>
    where
        I: Inputs + 'a,
        T: 'static,
        M: FnOnce(I::Values) -> T + 'a,
    {
        self.try_map(inputs, move |values| Ok(f(values)))
    }

    /// Apply fallible local function once all inputs are known.
    pub fn try_map<I, T, M>(&self, inputs: I, f: M) -> Deferred<T>
    where
        I: Inputs + 'a,
        T: 'static,
        M: FnOnce(I::Values) -> Result<T> + 'a,
    {
        self.push_step(inputs, move |ctx, values| Ok(ctx.push_value(f(values)?)))
    }

    /// Continue with a sub-protocol built from the values of `inputs`.
    /// The result resolves once the returned sub-protocol resolves.
    pub fn seq<I, T, M>(&self, inputs: I, f: M) -> Deferred<T>
    where
        I: Inputs + 'a,
        T: 'static,
        M: FnOnce(&Self, I::Values) -> Result<Deferred<T>> + 'a,
    {
        self.push_step(inputs, move |ctx, values| Ok(f(ctx, values)?.id))
    }

    /// Collect independent values. Their openings share rounds.
    pub fn par<T: Clone + 'static>(&self, items: Vec<Deferred<T>>) -> Deferred<Vec<T>> {
        self.map(items, |values| values)
    }

    /// Reveal a shared value to all parties. Costs one round, shared with all other openings
    /// ready at the same time.
    pub fn open(&self, share: DeferredShare<F>) -> Deferred<F> {
        Deferred::new(self.graph.borrow_mut().push_open(share.id))
    }

    fn push_value<T: 'static>(&self, value: T) -> NodeId {
        self.graph.borrow_mut().push_resolved(Rc::new(value))
    }

    fn push_step<I, T, M>(&self, inputs: I, step: M) -> Deferred<T>
    where
        I: Inputs + 'a,
        M: FnOnce(&Self, I::Values) -> Result<NodeId> + 'a,
    {
        let mut deps = Vec::new();
        inputs.node_ids(&mut deps);
        let step: Step<'a, F> = Box::new(move |ctx: &ProtocolBuilder<'a, F>| {
            let values = inputs.fetch(&ctx.graph.borrow())?;
            step(ctx, values)
        });
        Deferred::new(self.graph.borrow_mut().push_pending(deps, step))
    }

    /// Run local steps until none of the remaining ones is ready.
    fn expand(&self) -> Result<()> {
        loop {
            let mut progress = false;
            let mut index = {
                let mut graph = self.graph.borrow_mut();
                graph.update_frontier();
                graph.frontier().0
            };
            while index < self.graph.borrow().end().0 {
                let id = NodeId(index);
                let advance = self.graph.borrow_mut().advance(id);
                match advance {
                    Advance::Idle => {}
                    Advance::Resolved => progress = true,
                    Advance::Run(step) => {
                        trace!(node = index, "running step");
                        let target = step(self)?;
                        self.graph.borrow_mut().complete(id, target)?;
                        progress = true;
                    }
                }
                index += 1;
            }
            if !progress {
                return Ok(());
            }
        }
    }
}

impl<'a, F: MpcField> MpcContext for ProtocolBuilder<'a, F> {
    type Field = F;

    fn num_parties(&self) -> usize {
        self.num_parties
    }

    fn party_id(&self) -> usize {
        self.party_id
    }
}

/// Communication cost of evaluated protocols.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Number of opening rounds.
    pub rounds: usize,
    /// Number of opened values.
    pub openings: usize,
}

/// Evaluates protocol graphs on an MPC engine.
pub struct MpcExecutor<Engine> {
    engine: Engine,
    stats: EvaluationStats,
}

impl<Engine: MpcEngine> MpcExecutor<Engine> {
    /// Create new executor on top of given engine.
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            stats: EvaluationStats::default(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Cost accumulated over all runs of this executor.
    pub fn stats(&self) -> EvaluationStats {
        self.stats
    }

    /// Evaluate the graph of `ctx` until `root` resolves.
    ///
    /// Each round runs every ready local step, then opens all shares whose openings are
    /// ready, in node creation order. Fails with [`Error::Stalled`] when `root` cannot
    /// be resolved.
    ///
    /// If nothing else is left to evaluate afterwards, all nodes of `ctx` are discarded and
    /// handles created so far can not be used in later protocols.
    pub async fn run<T: Clone + 'static>(
        &mut self,
        ctx: &ProtocolBuilder<'_, Engine::Field>,
        root: Deferred<T>,
    ) -> Result<T> {
        loop {
            ctx.expand()?;
            let value = ctx.graph.borrow().value::<T>(root.id)?;
            if let Some(value) = value {
                let discarded = ctx.graph.borrow_mut().discard_resolved();
                trace!(party_id = ctx.party_id(), discarded, "evaluation finished");
                return Ok(value);
            }

            let openings = ctx.graph.borrow().ready_openings();
            if openings.is_empty() {
                warn!(
                    party_id = ctx.party_id(),
                    nodes = ctx.num_nodes(),
                    "protocol cannot make progress"
                );
                return Err(Error::Stalled);
            }
            let shares = {
                let graph = ctx.graph.borrow();
                openings
                    .iter()
                    .map(|&(_, share)| graph.expect_value::<SpdzShare<Engine::Field>>(share))
                    .collect::<Result<Vec<_>>>()?
            };

            debug!(
                party_id = ctx.party_id(),
                round = self.stats.rounds,
                openings = shares.len(),
                "opening round"
            );
            let values = self.engine.process_openings_bundle(shares).await?;
            self.stats.rounds += 1;
            self.stats.openings += values.len();

            let mut graph = ctx.graph.borrow_mut();
            for (&(id, _), value) in openings.iter().zip(values) {
                graph.resolve(id, Rc::new(value));
            }
        }
    }
}
