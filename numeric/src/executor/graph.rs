use std::{any::Any, mem, rc::Rc};

use crate::error::{Error, Result};

/// Index of a node in the computation graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(super) usize);

/// Type-erased value of a resolved node.
pub type Value = Rc<dyn Any>;

/// State of a single node.
enum Node<S> {
    /// Value is known.
    Resolved(Value),
    /// Local step waiting for its dependencies.
    Pending { deps: Vec<NodeId>, step: S },
    /// Step was taken out for execution.
    Running,
    /// Node takes the value of another node once that one resolves.
    Forward(NodeId),
    /// Opening of the share held by given node. Resolved by a network round.
    Open(NodeId),
}

/// What the evaluator should do with a node.
pub enum Advance<S> {
    /// Nothing to do for now.
    Idle,
    /// Node got resolved.
    Resolved,
    /// All dependencies are resolved, the step has to be run.
    Run(S),
}

/// Dependency graph of protocol steps. Node IDs grow in creation order, which is the same
/// for every party building the same protocol.
///
/// Once every node is resolved the graph can be discarded. IDs keep growing afterwards, and
/// values of discarded nodes can no longer be read.
pub struct Graph<S> {
    nodes: Vec<Node<S>>,
    /// ID of `nodes[0]`. Nodes below were discarded.
    base: usize,
    /// All nodes below this ID are resolved.
    frontier: usize,
}

impl<S> Graph<S> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            base: 0,
            frontier: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// ID the next node will get.
    pub fn end(&self) -> NodeId {
        NodeId(self.base + self.nodes.len())
    }

    /// First node that may still be unresolved.
    pub fn frontier(&self) -> NodeId {
        NodeId(self.frontier)
    }

    fn push(&mut self, node: Node<S>) -> NodeId {
        let id = self.end();
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node<S>> {
        id.0.checked_sub(self.base).and_then(|i| self.nodes.get(i))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<S>> {
        match id.0.checked_sub(self.base) {
            Some(i) => self.nodes.get_mut(i),
            None => None,
        }
    }

    fn set(&mut self, id: NodeId, node: Node<S>) {
        if let Some(slot) = self.node_mut(id) {
            *slot = node;
        }
    }

    pub fn is_discarded(&self, id: NodeId) -> bool {
        id.0 < self.base
    }

    /// Move the frontier past resolved nodes.
    pub fn update_frontier(&mut self) {
        while let Some(Node::Resolved(_)) = self.node(NodeId(self.frontier)) {
            self.frontier += 1;
        }
    }

    /// Drop all nodes if every one of them is resolved. Returns number of dropped nodes.
    pub fn discard_resolved(&mut self) -> usize {
        self.update_frontier();
        if self.frontier < self.end().0 {
            return 0;
        }
        let count = self.nodes.len();
        self.base += count;
        self.nodes.clear();
        count
    }

    pub fn push_resolved(&mut self, value: Value) -> NodeId {
        self.push(Node::Resolved(value))
    }

    pub fn push_pending(&mut self, deps: Vec<NodeId>, step: S) -> NodeId {
        self.push(Node::Pending { deps, step })
    }

    pub fn push_open(&mut self, share: NodeId) -> NodeId {
        self.push(Node::Open(share))
    }

    fn resolved(&self, id: NodeId) -> Option<&Value> {
        match self.node(id) {
            Some(Node::Resolved(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_resolved(&self, id: NodeId) -> bool {
        self.resolved(id).is_some()
    }

    /// Nothing more will happen to the node: it is resolved or already discarded.
    fn is_settled(&self, id: NodeId) -> bool {
        self.is_discarded(id) || self.is_resolved(id)
    }

    /// Typed value of a node, if already resolved.
    pub fn value<T: Clone + 'static>(&self, id: NodeId) -> Result<Option<T>> {
        if self.is_discarded(id) {
            return Err(Error::Discarded);
        }
        match self.resolved(id) {
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or(Error::TypeMismatch),
            None => Ok(None),
        }
    }

    /// Typed value of a node that must already be resolved.
    pub fn expect_value<T: Clone + 'static>(&self, id: NodeId) -> Result<T> {
        self.value(id)?.ok_or(Error::Stalled)
    }

    /// Try to make progress on a single node without communication.
    ///
    /// A step whose dependencies were discarded is handed out as well, reading its inputs
    /// then fails.
    pub fn advance(&mut self, id: NodeId) -> Advance<S> {
        let ready = match self.node(id) {
            Some(Node::Pending { deps, .. }) => deps.iter().all(|&dep| self.is_settled(dep)),
            Some(Node::Forward(target)) => {
                if let Some(value) = self.resolved(*target).cloned() {
                    self.set(id, Node::Resolved(value));
                    return Advance::Resolved;
                }
                false
            }
            _ => false,
        };
        if !ready {
            return Advance::Idle;
        }
        let slot = match self.node_mut(id) {
            Some(slot) => slot,
            None => return Advance::Idle,
        };
        match mem::replace(slot, Node::Running) {
            Node::Pending { step, .. } => Advance::Run(step),
            other => {
                *slot = other;
                Advance::Idle
            }
        }
    }

    /// Record that the step of node `id` produced node `target`.
    pub fn complete(&mut self, id: NodeId, target: NodeId) -> Result<()> {
        if self.is_discarded(target) {
            return Err(Error::Discarded);
        }
        let node = match self.resolved(target) {
            Some(value) => Node::Resolved(value.clone()),
            None => Node::Forward(target),
        };
        self.set(id, node);
        Ok(())
    }

    /// Openings whose shares are available, in creation order.
    /// Returns pairs of (open node, share node).
    pub fn ready_openings(&self) -> Vec<(NodeId, NodeId)> {
        let skip = self.frontier.saturating_sub(self.base);
        self.nodes
            .iter()
            .enumerate()
            .skip(skip)
            .filter_map(|(i, node)| match node {
                Node::Open(share) if self.is_settled(*share) => {
                    Some((NodeId(self.base + i), *share))
                }
                _ => None,
            })
            .collect()
    }

    /// Resolve node with externally computed value.
    pub fn resolve(&mut self, id: NodeId, value: Value) {
        self.set(id, Node::Resolved(value));
    }
}
