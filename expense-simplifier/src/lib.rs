//! Expense Simplifier
//!
//! Rewrites a ledger of debts between users into an equivalent ledger with
//! fewer, larger transactions.
//!
//! # Architecture
//!
//! 1. **Ledger**: raw transactions accumulate into a [`DebtGraph`](debt_graph::DebtGraph)
//! 2. **Residual view**: positive debts become capacities of a flow network
//! 3. **Blocking flow**: [`LayeredGraph`] runs one phase of Dinic's algorithm
//! 4. **Simplification**: [`ExpenseSimplifier`] settles each debt edge through
//!    max flow and records one transaction per pair
//!
//! # Guarantees
//!
//! - Every user's net balance is unchanged
//! - Money only moves along chains of existing debts
//! - The output is a deterministic function of the input sequence
//!
//! # Example
//!
//! ```
//! use debt_graph::{DebtList, Transaction};
//! use expense_simplifier::{SimplificationEngine, SimplifierConfig};
//!
//! fn main() -> expense_simplifier::Result<()> {
//!     let engine = SimplificationEngine::new(SimplifierConfig::default())?;
//!
//!     let debts: DebtList = vec![
//!         Transaction::new("a", "b", 100),
//!         Transaction::new("b", "c", 100),
//!         Transaction::new("a", "c", 100),
//!     ]
//!     .into_iter()
//!     .collect();
//!
//!     let report = engine.simplify_debt_list(&debts)?;
//!     assert_eq!(report.transactions.transactions, vec![Transaction::new("a", "c", 200)]);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod layered_graph;
pub mod metrics;
pub mod simplifier;
pub mod types;

// Re-exports
pub use config::SimplifierConfig;
pub use engine::SimplificationEngine;
pub use error::{Error, Result};
pub use layered_graph::{LayeredGraph, LayeredGraphNode};
pub use metrics::Metrics;
pub use simplifier::ExpenseSimplifier;
pub use types::*;
