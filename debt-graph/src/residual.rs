//! Residual view of a debt ledger
//!
//! A capacity-only copy of the ledger that keeps only positive forward debts.
//! Used as the flow network by the blocking-flow builder.

use crate::{
    graph::WeightedGraph,
    ledger::DebtGraph,
    types::{Cents, DebtEdge, UserId},
};
use std::collections::BTreeMap;

/// Flow network derived from a [`DebtGraph`].
///
/// `debt(u, v) > 0` is the capacity for moving money from `u` to `v`.
/// Net positions are frozen when the view is built: pushing flow changes
/// capacities but never the value returned by [`AugmentedDebtGraph::total_debt`].
#[derive(Debug, Clone, Default)]
pub struct AugmentedDebtGraph {
    /// Positive forward capacities
    graph: WeightedGraph,

    /// Net debt of every user at construction time
    net_positions: Vec<Cents>,
}

impl AugmentedDebtGraph {
    /// Build from a ledger snapshot, dropping every entry <= 0
    pub fn new(ledger: &DebtGraph) -> Self {
        let mut graph = ledger.graph().clone();
        let net_positions = (0..graph.num_users())
            .map(|id| graph.total_debt(id))
            .collect();
        graph.strip_credits();

        Self {
            graph,
            net_positions,
        }
    }

    /// Number of users
    pub fn num_users(&self) -> usize {
        self.graph.num_users()
    }

    /// Remaining capacity from `receiver_id` to `lender_id`
    pub fn debt(&self, receiver_id: UserId, lender_id: UserId) -> Cents {
        self.graph.debt(receiver_id, lender_id)
    }

    /// Net debt of `id` as it stood in the source ledger
    pub fn total_debt(&self, id: UserId) -> Cents {
        self.net_positions[id]
    }

    /// Push `amount` along `from -> to`, lowering its capacity and raising
    /// the reverse capacity `to -> from`
    pub fn push_flow(&mut self, from: UserId, to: UserId, amount: Cents) {
        self.graph.push_flow(from, to, amount);
    }

    /// Erase both directions between two users
    pub fn erase_edge(&mut self, user1_id: UserId, user2_id: UserId) {
        self.graph.erase_edge(user1_id, user2_id);
    }

    /// Outgoing capacities of `user_id`, ordered by neighbour id
    pub fn debts_of(&self, user_id: UserId) -> &BTreeMap<UserId, Cents> {
        self.graph.debts_of(user_id)
    }

    /// Every edge with positive capacity
    pub fn all_debts(&self) -> Vec<DebtEdge> {
        self.graph
            .edges()
            .into_iter()
            .filter(|edge| edge.debt > 0)
            .collect()
    }
}

impl From<DebtGraph> for AugmentedDebtGraph {
    fn from(ledger: DebtGraph) -> Self {
        Self::new(&ledger)
    }
}

impl From<&DebtGraph> for AugmentedDebtGraph {
    fn from(ledger: &DebtGraph) -> Self {
        Self::new(ledger)
    }
}
