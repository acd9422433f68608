//! Core types for the expense simplifier

use crate::{Error, Result};
use debt_graph::{Cents, DebtList};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order in which debt edges are resolved.
///
/// Every ordering conserves net balances; the ordering only affects how many
/// transactions remain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeOrdering {
    /// Most indebted receiver / most owed lender first, then largest
    /// imbalance, then largest amount
    #[default]
    Priority,
    /// Reverse enumeration order (receiver id, then lender id)
    Input,
}

impl EdgeOrdering {
    /// Config string
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeOrdering::Priority => "priority",
            EdgeOrdering::Input => "input",
        }
    }
}

impl FromStr for EdgeOrdering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "priority" => Ok(EdgeOrdering::Priority),
            "input" => Ok(EdgeOrdering::Input),
            other => Err(Error::Config(format!("Unknown edge ordering: {}", other))),
        }
    }
}

impl fmt::Display for EdgeOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Simplification statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplificationStats {
    /// Number of users in the ledger
    pub user_count: usize,

    /// Positive debt edges before simplification
    pub input_edge_count: usize,

    /// Positive debt edges after simplification
    pub output_edge_count: usize,

    /// Blocking-flow phases run
    pub phase_count: usize,

    /// Sum of all debts before simplification
    pub gross_amount: Cents,

    /// Sum of all debts after simplification
    pub net_amount: Cents,
}

impl SimplificationStats {
    /// Number of transactions removed
    pub fn edges_eliminated(&self) -> usize {
        self.input_edge_count.saturating_sub(self.output_edge_count)
    }

    /// Fraction of gross debt volume removed (0.0 - 1.0)
    pub fn efficiency(&self) -> f64 {
        if self.gross_amount == 0 {
            return 0.0;
        }

        (self.gross_amount - self.net_amount) as f64 / self.gross_amount as f64
    }
}

/// Result of simplifying a debt list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplificationReport {
    /// Minimal transactions settling every balance
    pub transactions: DebtList,

    /// Run statistics
    pub stats: SimplificationStats,
}

impl SimplificationReport {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
