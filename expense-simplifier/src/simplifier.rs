//! Debt simplification
//!
//! Rewrites a ledger into an equivalent one with fewer, larger transactions.
//! Every user's net balance is preserved, and nobody ends up owing someone
//! they were not already connected to through a chain of debts.
//!
//! # Algorithm
//!
//! Every positive debt `receiver -> lender` is taken in priority order. While
//! the residual view still holds a path from the receiver to the lender,
//! blocking flows are routed along the shortest paths and pushed back into
//! the residual view. The accumulated flow becomes a single transaction
//! between the pair, and the pair is erased from the residual view.
//!
//! A pair resolved early cannot see chains that only form once later pairs
//! are recorded. A final sweep over the output moves every debt that still
//! has another route between its two users onto the direct transaction.
//! Each such move zeroes at least one output debt and creates none, and
//! removing debts never opens a route, so one sweep reaches a ledger that
//! simplifies to itself.

use crate::{
    layered_graph::LayeredGraph,
    types::{EdgeOrdering, SimplificationStats},
};
use debt_graph::{AugmentedDebtGraph, Cents, DebtEdge, DebtGraph, UserId};

/// Minimal transaction set for a ledger
#[derive(Debug, Clone)]
pub struct ExpenseSimplifier {
    /// Output ledger; same users and ids as the input
    simplified_expenses: DebtGraph,

    /// Run statistics
    stats: SimplificationStats,
}

impl ExpenseSimplifier {
    /// Simplify `graph` with the default edge ordering
    pub fn new(graph: DebtGraph) -> Self {
        Self::with_ordering(graph, EdgeOrdering::default())
    }

    /// Simplify `graph`, resolving edges in the given order
    pub fn with_ordering(mut graph: DebtGraph, ordering: EdgeOrdering) -> Self {
        let mut residual = AugmentedDebtGraph::new(&graph);
        graph.clear();

        let mut simplifier = Self {
            simplified_expenses: graph,
            stats: SimplificationStats::default(),
        };
        simplifier.build_minimal_transactions(&mut residual, ordering);
        simplifier
    }

    /// The simplified ledger
    pub fn minimal_transactions(&self) -> &DebtGraph {
        &self.simplified_expenses
    }

    /// Consume the simplifier, returning the simplified ledger
    pub fn into_minimal_transactions(self) -> DebtGraph {
        self.simplified_expenses
    }

    /// Statistics of the run
    pub fn stats(&self) -> &SimplificationStats {
        &self.stats
    }

    fn build_minimal_transactions(
        &mut self,
        residual: &mut AugmentedDebtGraph,
        ordering: EdgeOrdering,
    ) {
        let mut edges = residual.all_debts();

        self.stats.user_count = residual.num_users();
        self.stats.input_edge_count = edges.len();
        self.stats.gross_amount = edges.iter().map(|edge| edge.debt).sum();

        if ordering == EdgeOrdering::Priority {
            sort_by_priority(&mut edges, residual);
        }

        // Highest priority sits at the end
        while let Some(DebtEdge {
            receiver_id,
            lender_id,
            ..
        }) = edges.pop()
        {
            if residual.debt(receiver_id, lender_id) <= 0 {
                // Already settled through an intermediary
                residual.erase_edge(receiver_id, lender_id);
                continue;
            }

            let (total_flow, phases) =
                Self::max_flow(residual, receiver_id, lender_id, |_, _, _| {});
            self.stats.phase_count += phases;

            residual.erase_edge(receiver_id, lender_id);
            self.simplified_expenses
                .push_flow(lender_id, receiver_id, total_flow);

            tracing::debug!(
                receiver = receiver_id,
                lender = lender_id,
                total_flow,
                phases,
                "Resolved debt edge"
            );
        }

        self.settle_alternative_routes();

        let output: Vec<DebtEdge> = self.simplified_expenses.debt_edges().collect();
        self.stats.output_edge_count = output.len();
        self.stats.net_amount = output.iter().map(|edge| edge.debt).sum();
    }

    /// Move every output debt that has another route between its two users
    /// onto the direct transaction.
    fn settle_alternative_routes(&mut self) {
        for receiver_id in 0..self.simplified_expenses.num_users() {
            let lenders: Vec<UserId> = self
                .simplified_expenses
                .debts_of(receiver_id)
                .iter()
                .filter(|&(_, &debt)| debt > 0)
                .map(|(&lender_id, _)| lender_id)
                .collect();

            for lender_id in lenders {
                // Zeroed by an earlier reroute
                if self.simplified_expenses.debt(receiver_id, lender_id) <= 0 {
                    continue;
                }

                let mut residual = AugmentedDebtGraph::new(&self.simplified_expenses);
                residual.erase_edge(receiver_id, lender_id);

                let output = &mut self.simplified_expenses;
                let (rerouted, phases) =
                    Self::max_flow(&mut residual, receiver_id, lender_id, |from, to, flow| {
                        output.push_flow(from, to, flow)
                    });

                if rerouted > 0 {
                    output.push_flow(lender_id, receiver_id, rerouted);
                    self.stats.phase_count += phases;

                    tracing::debug!(
                        receiver = receiver_id,
                        lender = lender_id,
                        rerouted,
                        phases,
                        "Settled alternative route"
                    );
                }
            }
        }
    }

    /// Route blocking flows from `source` to `sink` until none remain,
    /// reporting every edge flow to `on_flow`.
    /// Returns the total flow and the number of phases run.
    fn max_flow(
        residual: &mut AugmentedDebtGraph,
        source: UserId,
        sink: UserId,
        mut on_flow: impl FnMut(UserId, UserId, Cents),
    ) -> (Cents, usize) {
        let mut total_flow = 0;
        let mut phases = 0;

        loop {
            let blocking_flow = LayeredGraph::construct_blocking_flow(residual, source, sink);
            if blocking_flow.is_empty() {
                break;
            }

            blocking_flow.apply_flow(residual);
            for (from, to, flow) in blocking_flow.flows() {
                on_flow(from, to, flow);
            }
            let flow = blocking_flow.compute_flow();

            tracing::trace!(
                source,
                sink,
                layered_graph_size = blocking_flow.len(),
                flow,
                "Blocking flow phase"
            );

            total_flow += flow;
            phases += 1;
        }

        (total_flow, phases)
    }
}

/// Ascending sort; the edge to resolve first ends up last.
///
/// Key: how many endpoints sit on the "right" side (lender owed money,
/// receiver in debt), then the gap between their net positions, then the
/// amount of the edge itself.
fn sort_by_priority(edges: &mut [DebtEdge], residual: &AugmentedDebtGraph) {
    edges.sort_by_key(|edge| {
        let lender_total = residual.total_debt(edge.lender_id);
        let receiver_total = residual.total_debt(edge.receiver_id);

        let score = u8::from(lender_total < 0) + u8::from(receiver_total > 0);
        (score, lender_total.abs_diff(receiver_total), edge.debt)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use debt_graph::Transaction;

    fn create(transactions: &[(&str, &str, Cents)]) -> DebtGraph {
        transactions
            .iter()
            .map(|&(lender, receiver, cents)| Transaction::new(lender, receiver, cents))
            .collect()
    }

    fn assert_owed(graph: &DebtGraph, expected: &[(&str, &str, Cents)]) {
        for &(lender, receiver, cents) in expected {
            assert_eq!(
                graph.amount_owed(lender, receiver).unwrap(),
                cents,
                "{} -> {}",
                lender,
                receiver
            );
        }
    }

    fn assert_conserved(before: &DebtGraph, after: &DebtGraph) {
        for user in before.usernames() {
            assert_eq!(
                before.total_debt(user).unwrap(),
                after.total_debt(user).unwrap(),
                "net balance of {}",
                user
            );
        }
    }

    #[test]
    fn test_single_transaction() {
        let solver = ExpenseSimplifier::new(create(&[("alice", "bob", 100)]));

        assert_owed(
            solver.minimal_transactions(),
            &[("alice", "bob", 100), ("bob", "alice", -100)],
        );
        assert_eq!(solver.stats().input_edge_count, 1);
        assert_eq!(solver.stats().output_edge_count, 1);
        assert_eq!(solver.stats().phase_count, 1);
    }

    #[test]
    fn test_empty() {
        let solver = ExpenseSimplifier::new(DebtGraph::new());

        assert_eq!(solver.minimal_transactions().num_users(), 0);
        assert_eq!(solver.stats(), &SimplificationStats::default());
    }

    #[test]
    fn test_transaction_chain_unchanged() {
        let solver = ExpenseSimplifier::new(create(&[
            ("a", "b", 100),
            ("b", "c", 100),
            ("c", "d", 100),
        ]));

        assert_owed(
            solver.minimal_transactions(),
            &[("a", "b", 100), ("b", "c", 100), ("c", "d", 100), ("a", "d", 0)],
        );
        assert_eq!(solver.stats().edges_eliminated(), 0);
    }

    #[test]
    fn test_triangle_reduced() {
        let input = create(&[("a", "b", 100), ("b", "c", 100), ("a", "c", 100)]);
        let solver = ExpenseSimplifier::new(input.clone());

        assert_owed(
            solver.minimal_transactions(),
            &[("a", "b", 0), ("b", "c", 0), ("a", "c", 200)],
        );
        assert_conserved(&input, solver.minimal_transactions());

        let stats = solver.stats();
        assert_eq!(stats.user_count, 3);
        assert_eq!(stats.input_edge_count, 3);
        assert_eq!(stats.output_edge_count, 1);
        assert_eq!(stats.gross_amount, 300);
        assert_eq!(stats.net_amount, 200);
    }

    #[test]
    fn test_largest_debtor_chosen_first() {
        let solver = ExpenseSimplifier::new(create(&[
            ("sink", "largest", 1),
            ("sink", "x", 2),
            ("sink", "y", 3),
            ("x", "largest", 2),
            ("y", "largest", 3),
        ]));

        assert_owed(
            solver.minimal_transactions(),
            &[
                ("sink", "largest", 6),
                ("sink", "x", 0),
                ("sink", "y", 0),
                ("x", "largest", 0),
                ("y", "largest", 0),
            ],
        );
        assert_eq!(solver.stats().output_edge_count, 1);
    }

    #[test]
    fn test_two_minimal_transactions() {
        let solver =
            ExpenseSimplifier::new(create(&[("a", "b", 1), ("b", "c", 2), ("a", "c", 2)]));

        assert_owed(
            solver.minimal_transactions(),
            &[("a", "b", 0), ("a", "c", 3), ("b", "c", 1)],
        );
    }

    #[test]
    fn test_users_and_ids_preserved() {
        let input = create(&[("a", "b", 100), ("b", "c", 100), ("a", "c", 100)]);
        let solver = ExpenseSimplifier::new(input.clone());
        let output = solver.into_minimal_transactions();

        assert_eq!(output.num_users(), input.num_users());
        for user in input.usernames() {
            assert_eq!(output.find_user_id(user).unwrap(), input.find_user_id(user).unwrap());
        }
    }

    #[test]
    fn test_idempotent() {
        let scenarios: [&[(&str, &str, Cents)]; 3] = [
            &[("a", "b", 100), ("b", "c", 100), ("a", "c", 100)],
            &[
                ("sink", "largest", 1),
                ("sink", "x", 2),
                ("sink", "y", 3),
                ("x", "largest", 2),
                ("y", "largest", 3),
            ],
            &[("a", "b", 1), ("b", "c", 2), ("a", "c", 2)],
        ];

        for scenario in scenarios {
            let once = ExpenseSimplifier::new(create(scenario)).into_minimal_transactions();
            let twice = ExpenseSimplifier::new(once.clone()).into_minimal_transactions();

            assert_eq!(once.all_debts(), twice.all_debts());
        }
    }

    #[test]
    fn test_settle_alternative_routes() {
        // e -> c -> a -> f runs alongside the direct debt e -> f
        let ledger = create(&[
            ("a", "c", 1),
            ("g", "a", 2),
            ("b", "a", 1),
            ("f", "a", 1),
            ("c", "e", 248),
            ("f", "e", 343),
        ]);
        let mut solver = ExpenseSimplifier {
            simplified_expenses: ledger.clone(),
            stats: SimplificationStats::default(),
        };

        solver.settle_alternative_routes();

        assert_eq!(
            solver.minimal_transactions().all_debts().transactions,
            vec![
                Transaction::new("g", "a", 2),
                Transaction::new("b", "a", 1),
                Transaction::new("c", "e", 247),
                Transaction::new("f", "e", 344),
            ]
        );
        assert_conserved(&ledger, solver.minimal_transactions());
        assert_eq!(solver.stats().phase_count, 1);
    }

    #[test]
    fn test_settled_output_is_stable() {
        let ledger = create(&[
            ("a", "c", 1),
            ("g", "a", 2),
            ("b", "a", 1),
            ("f", "a", 1),
            ("c", "e", 248),
            ("f", "e", 343),
        ]);

        let once = ExpenseSimplifier::new(ledger.clone()).into_minimal_transactions();
        let twice = ExpenseSimplifier::new(once.clone()).into_minimal_transactions();

        assert_owed(
            &once,
            &[("g", "a", 2), ("b", "a", 1), ("c", "e", 247), ("f", "e", 344), ("a", "c", 0)],
        );
        assert_conserved(&ledger, &once);
        assert_eq!(once.all_debts(), twice.all_debts());
    }

    #[test]
    fn test_input_ordering_conserves_balances() {
        let input = create(&[
            ("a", "b", 40),
            ("b", "c", 25),
            ("c", "a", 10),
            ("d", "a", 7),
            ("b", "d", 3),
            ("c", "d", 12),
        ]);
        let solver = ExpenseSimplifier::with_ordering(input.clone(), EdgeOrdering::Input);

        assert_conserved(&input, solver.minimal_transactions());
        assert!(solver.stats().output_edge_count <= solver.stats().input_edge_count);
        assert!(solver
            .minimal_transactions()
            .all_debts()
            .iter()
            .all(|t| t.cents > 0));
    }

    #[test]
    fn test_cancelling_debts() {
        let solver = ExpenseSimplifier::new(create(&[("a", "b", 50), ("b", "a", 50)]));

        assert_owed(solver.minimal_transactions(), &[("a", "b", 0)]);
        assert!(solver.minimal_transactions().all_debts().is_empty());
        assert_eq!(solver.stats().input_edge_count, 0);
    }
}
