//! Weighted adjacency store shared by the ledger and the residual view
//!
//! Users are dense indices into a node arena. Each node maps counterparty id
//! to the signed net debt this user owes that counterparty and caches the sum
//! of its entries.
//!
//! Adjacency is kept in a `BTreeMap` so every enumeration (edge listing, BFS
//! neighbour order) is ordered by counterparty id. Simplification results are
//! therefore a pure function of the ingested transaction sequence.

use crate::types::{Cents, DebtEdge, UserId};
use std::collections::BTreeMap;

/// Per-user debts against every counterparty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebtGraphNode {
    /// Counterparty id -> amount this user owes them (negative = credit)
    debts: BTreeMap<UserId, Cents>,

    /// Sum of all entries: positive = net debtor, negative = net creditor
    total_debt: Cents,
}

impl DebtGraphNode {
    /// Create empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the debt owed to `lender_id`
    pub fn add_debt(&mut self, lender_id: UserId, amount: Cents) {
        *self.debts.entry(lender_id).or_insert(0) += amount;
        self.total_debt += amount;
    }

    /// Amount this user owes `user_id` (0 when no entry exists)
    pub fn debt(&self, user_id: UserId) -> Cents {
        self.debts.get(&user_id).copied().unwrap_or(0)
    }

    /// Net amount owed across all counterparties
    pub fn total_debt(&self) -> Cents {
        self.total_debt
    }

    /// Remove every entry <= 0, leaving `total_debt` untouched
    pub fn clear_credits(&mut self) {
        self.debts.retain(|_, debt| *debt > 0);
    }

    /// Remove the entry for `user_id`, if any
    pub fn erase_debt(&mut self, user_id: UserId) {
        if let Some(debt) = self.debts.remove(&user_id) {
            self.total_debt -= debt;
        }
    }

    /// Drop all entries and zero the total
    pub fn clear(&mut self) {
        self.debts.clear();
        self.total_debt = 0;
    }

    /// All counterparties and amounts, ordered by counterparty id
    pub fn debts(&self) -> &BTreeMap<UserId, Cents> {
        &self.debts
    }
}

/// Arena of [`DebtGraphNode`]s indexed by user id.
///
/// Ids are minted by [`WeightedGraph::add_user`] only; passing an id outside
/// `[0, num_users())` is a programming error and panics like any slice index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightedGraph {
    nodes: Vec<DebtGraphNode>,
}

impl WeightedGraph {
    /// Create empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new user and return their id
    pub fn add_user(&mut self) -> UserId {
        let id = self.nodes.len();
        self.nodes.push(DebtGraphNode::new());
        id
    }

    /// Number of users; ids span `[0, num_users())`
    pub fn num_users(&self) -> usize {
        self.nodes.len()
    }

    /// Debt `receiver_id` owes `lender_id`
    pub fn debt(&self, receiver_id: UserId, lender_id: UserId) -> Cents {
        self.nodes[receiver_id].debt(lender_id)
    }

    /// Net debt of a user across all counterparties
    pub fn total_debt(&self, id: UserId) -> Cents {
        self.nodes[id].total_debt()
    }

    /// Moves `amount` of money from `from` to `to`.
    ///
    /// `to` owes `from` an extra `amount`, which offsets any debt `from`
    /// owed `to`. In a residual view this lowers `from`'s forward capacity to
    /// `to` and raises the reverse capacity by the same amount.
    pub fn push_flow(&mut self, from: UserId, to: UserId, amount: Cents) {
        self.nodes[to].add_debt(from, amount);
        self.nodes[from].add_debt(to, -amount);
    }

    /// Erase both directions of the edge between two users
    pub fn erase_edge(&mut self, user1_id: UserId, user2_id: UserId) {
        self.nodes[user1_id].erase_debt(user2_id);
        self.nodes[user2_id].erase_debt(user1_id);
    }

    /// Zero every balance while keeping all users
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.clear();
        }
    }

    /// Everyone `user_id` has an entry for, with the amount owed
    pub fn debts_of(&self, user_id: UserId) -> &BTreeMap<UserId, Cents> {
        self.nodes[user_id].debts()
    }

    /// Every stored entry, ordered by receiver id then lender id
    pub fn edges(&self) -> Vec<DebtEdge> {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(receiver_id, node)| {
                node.debts().iter().map(move |(&lender_id, &debt)| DebtEdge {
                    receiver_id,
                    lender_id,
                    debt,
                })
            })
            .collect()
    }

    /// Delete every non-positive entry of every user, keeping totals frozen
    pub fn strip_credits(&mut self) {
        for node in &mut self.nodes {
            node.clear_credits();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_add_debt_tracks_total() {
        let mut node = DebtGraphNode::new();
        node.add_debt(1, 100);
        node.add_debt(2, -40);
        node.add_debt(1, 25);

        assert_eq!(node.debt(1), 125);
        assert_eq!(node.debt(2), -40);
        assert_eq!(node.debt(3), 0);
        assert_eq!(node.total_debt(), 85);
    }

    #[test]
    fn test_node_clear_credits_keeps_total() {
        let mut node = DebtGraphNode::new();
        node.add_debt(1, 100);
        node.add_debt(2, -40);
        node.add_debt(3, 0);

        node.clear_credits();

        assert_eq!(node.debts().len(), 1);
        assert_eq!(node.debt(1), 100);
        assert_eq!(node.total_debt(), 60);
    }

    #[test]
    fn test_push_flow_is_symmetric() {
        let mut graph = WeightedGraph::new();
        let a = graph.add_user();
        let b = graph.add_user();

        // Money moves from a to b: b owes a
        graph.push_flow(a, b, 70);

        assert_eq!(graph.debt(b, a), 70);
        assert_eq!(graph.debt(a, b), -70);
        assert_eq!(graph.total_debt(a), -70);
        assert_eq!(graph.total_debt(b), 70);
    }

    #[test]
    fn test_erase_edge_adjusts_totals() {
        let mut graph = WeightedGraph::new();
        let a = graph.add_user();
        let b = graph.add_user();
        let c = graph.add_user();
        graph.push_flow(a, b, 70);
        graph.push_flow(c, b, 30);

        graph.erase_edge(b, a);

        assert_eq!(graph.debt(b, a), 0);
        assert_eq!(graph.debt(a, b), 0);
        assert_eq!(graph.total_debt(a), 0);
        assert_eq!(graph.total_debt(b), 30);
        assert!(!graph.debts_of(a).contains_key(&b));
    }

    #[test]
    fn test_edges_ordered() {
        let mut graph = WeightedGraph::new();
        let a = graph.add_user();
        let b = graph.add_user();
        let c = graph.add_user();
        graph.push_flow(c, a, 5);
        graph.push_flow(b, a, 3);

        let edges = graph.edges();
        let keys: Vec<_> = edges.iter().map(|e| (e.receiver_id, e.lender_id)).collect();
        assert_eq!(keys, vec![(a, b), (a, c), (b, a), (c, a)]);
    }

    #[test]
    fn test_clear_keeps_users() {
        let mut graph = WeightedGraph::new();
        let a = graph.add_user();
        let b = graph.add_user();
        graph.push_flow(a, b, 10);

        graph.clear();

        assert_eq!(graph.num_users(), 2);
        assert_eq!(graph.debt(b, a), 0);
        assert_eq!(graph.total_debt(b), 0);
        assert!(graph.edges().is_empty());
    }
}
