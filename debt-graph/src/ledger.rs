//! Debt ledger keyed by username
//!
//! Accumulates raw transactions into per-user signed balances against every
//! counterparty and owns the username <-> id bijection.
//!
//! # Example
//!
//! ```
//! use debt_graph::{DebtGraph, Transaction};
//!
//! let graph: DebtGraph = vec![
//!     Transaction::new("alice", "bob", 200),
//!     Transaction::new("bob", "alice", 150),
//! ]
//! .into_iter()
//! .collect();
//!
//! assert_eq!(graph.amount_owed("alice", "bob").unwrap(), 50);
//! assert_eq!(graph.total_debt("bob").unwrap(), 50);
//! ```

use crate::{
    graph::WeightedGraph,
    types::{Cents, DebtEdge, DebtList, Transaction, UserId},
    Error, Result,
};
use std::collections::{BTreeMap, HashMap};

/// Ledger of net debts between named users.
///
/// Every mutation goes through [`WeightedGraph::push_flow`], so
/// `debt[a][b] == -debt[b][a]` holds after each call.
#[derive(Debug, Clone, Default)]
pub struct DebtGraph {
    /// Balances indexed by user id
    graph: WeightedGraph,

    /// Username -> id
    id_map: HashMap<String, UserId>,

    /// Id -> username
    usernames: Vec<String>,
}

impl DebtGraph {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger by ingesting every transaction in order
    pub fn from_debt_list(debt_list: &DebtList) -> Self {
        let mut graph = Self::new();
        for t in debt_list {
            graph.add_transaction(&t.lender, &t.receiver, t.cents);
        }
        tracing::debug!(
            users = graph.num_users(),
            transactions = debt_list.len(),
            "Built debt graph"
        );
        graph
    }

    /// Record that `receiver` owes `lender` an additional `amount`.
    ///
    /// Unknown names are assigned the next free id. `amount` may be zero or
    /// negative.
    pub fn add_transaction(&mut self, lender: &str, receiver: &str, amount: Cents) {
        let lender_id = self.find_or_assign_user_id(lender);
        let receiver_id = self.find_or_assign_user_id(receiver);

        self.graph.push_flow(lender_id, receiver_id, amount);
    }

    /// Look up the id of a known user
    pub fn find_user_id(&self, username: &str) -> Result<UserId> {
        self.id_map
            .get(username)
            .copied()
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    /// Username bound to `id`, if any
    pub fn username(&self, id: UserId) -> Option<&str> {
        self.usernames.get(id).map(String::as_str)
    }

    /// All usernames in id order
    pub fn usernames(&self) -> impl Iterator<Item = &str> + '_ {
        self.usernames.iter().map(String::as_str)
    }

    /// Amount of money `receiver` owes `lender` (negative if `lender` owes)
    pub fn amount_owed(&self, lender: &str, receiver: &str) -> Result<Cents> {
        let lender_id = self.find_user_id(lender)?;
        let receiver_id = self.find_user_id(receiver)?;

        Ok(self.graph.debt(receiver_id, lender_id))
    }

    /// Net amount `user` owes everyone else. Negative if they are owed money.
    pub fn total_debt(&self, user: &str) -> Result<Cents> {
        let id = self.find_user_id(user)?;
        Ok(self.graph.total_debt(id))
    }

    /// Every positive debt as a `lender -> receiver` transaction
    pub fn all_debts(&self) -> DebtList {
        self.debt_edges()
            .filter_map(|edge| {
                let lender = self.username(edge.lender_id)?;
                let receiver = self.username(edge.receiver_id)?;
                Some(Transaction::new(lender, receiver, edge.debt))
            })
            .collect()
    }

    /// Every positive id-level debt edge, ordered by receiver then lender
    pub fn debt_edges(&self) -> impl Iterator<Item = DebtEdge> {
        self.graph.edges().into_iter().filter(|edge| edge.debt > 0)
    }

    /// Zero all balances while keeping every user and their id
    pub fn clear(&mut self) {
        self.graph.clear();
    }

    /// Delete both directions of the pairwise entry between two users
    pub fn erase_edge(&mut self, user1_id: UserId, user2_id: UserId) {
        self.graph.erase_edge(user1_id, user2_id);
    }

    /// Move `amount` from `from` to `to`: `to` owes `from` `amount` more
    pub fn push_flow(&mut self, from: UserId, to: UserId, amount: Cents) {
        self.graph.push_flow(from, to, amount);
    }

    /// Number of users; ids span `[0, num_users())`
    pub fn num_users(&self) -> usize {
        self.graph.num_users()
    }

    /// Debt `receiver_id` owes `lender_id`
    pub fn debt(&self, receiver_id: UserId, lender_id: UserId) -> Cents {
        self.graph.debt(receiver_id, lender_id)
    }

    /// Counterparty entries of a single user
    pub fn debts_of(&self, user_id: UserId) -> &BTreeMap<UserId, Cents> {
        self.graph.debts_of(user_id)
    }

    /// Underlying id-indexed store
    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    fn find_or_assign_user_id(&mut self, username: &str) -> UserId {
        if let Some(&id) = self.id_map.get(username) {
            return id;
        }

        let id = self.graph.add_user();
        self.id_map.insert(username.to_string(), id);
        self.usernames.push(username.to_string());
        tracing::trace!(user = username, id, "Assigned user id");
        id
    }
}

impl Extend<Transaction> for DebtGraph {
    fn extend<I: IntoIterator<Item = Transaction>>(&mut self, iter: I) {
        for t in iter {
            self.add_transaction(&t.lender, &t.receiver, t.cents);
        }
    }
}

impl FromIterator<Transaction> for DebtGraph {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}

impl From<&DebtList> for DebtGraph {
    fn from(debt_list: &DebtList) -> Self {
        Self::from_debt_list(debt_list)
    }
}
