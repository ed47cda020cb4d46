use crate::error::Result;

use super::{
    graph::{Graph, NodeId},
    Deferred,
};

/// Collection of deferred values a step depends on.
///
/// Implemented for single deferred values, tuples of inputs and vectors of inputs. Once all
/// dependencies are resolved, the step receives [`Inputs::Values`] with the same shape.
pub trait Inputs {
    /// Resolved values handed to the step.
    type Values;

    /// Append IDs of all nodes this input depends on.
    fn node_ids(&self, ids: &mut Vec<NodeId>);

    /// Read resolved values from the graph.
    fn fetch<S>(&self, graph: &Graph<S>) -> Result<Self::Values>;
}

impl<T: Clone + 'static> Inputs for Deferred<T> {
    type Values = T;

    fn node_ids(&self, ids: &mut Vec<NodeId>) {
        ids.push(self.id());
    }

    fn fetch<S>(&self, graph: &Graph<S>) -> Result<T> {
        graph.expect_value(self.id())
    }
}

impl Inputs for () {
    type Values = ();

    fn node_ids(&self, _ids: &mut Vec<NodeId>) {}

    fn fetch<S>(&self, _graph: &Graph<S>) -> Result<()> {
        Ok(())
    }
}

impl<I: Inputs> Inputs for Vec<I> {
    type Values = Vec<I::Values>;

    fn node_ids(&self, ids: &mut Vec<NodeId>) {
        for input in self {
            input.node_ids(ids);
        }
    }

    fn fetch<S>(&self, graph: &Graph<S>) -> Result<Self::Values> {
        self.iter().map(|input| input.fetch(graph)).collect()
    }
}

macro_rules! impl_inputs_for_tuple {
    ($($name:ident: $index:tt),+) => {
        impl<$($name: Inputs),+> Inputs for ($($name,)+) {
            type Values = ($($name::Values,)+);

            fn node_ids(&self, ids: &mut Vec<NodeId>) {
                $(self.$index.node_ids(ids);)+
            }

            fn fetch<S>(&self, graph: &Graph<S>) -> Result<Self::Values> {
                Ok(($(self.$index.fetch(graph)?,)+))
            }
        }
    };
}

impl_inputs_for_tuple!(A: 0, B: 1);
impl_inputs_for_tuple!(A: 0, B: 1, C: 2);
impl_inputs_for_tuple!(A: 0, B: 1, C: 2, D: 3);
