//! Debt Graph
//!
//! Ledger of pairwise IOUs between named participants and the residual flow
//! network derived from it.
//!
//! # Architecture
//!
//! - **Arena storage**: users are dense ids indexing a node vector
//! - **Composition**: ledger and residual view both wrap one [`WeightedGraph`]
//! - **Residual transform**: the view is produced by stripping non-positive edges
//!
//! # Invariants
//!
//! - Symmetry: `debt[a][b] == -debt[b][a]` in the ledger at all times
//! - `total_debt[u]` equals the sum of `u`'s ledger entries
//! - User ids are dense across `[0, num_users())` and never renumbered

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod graph;
pub mod ledger;
pub mod residual;
pub mod error;

// Re-exports
pub use error::{Error, Result};
pub use types::{Cents, DebtEdge, DebtList, Transaction, UserId};
pub use graph::{DebtGraphNode, WeightedGraph};
pub use ledger::DebtGraph;
pub use residual::AugmentedDebtGraph;
