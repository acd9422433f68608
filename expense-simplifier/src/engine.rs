//! Simplification engine
//!
//! Wraps the simplifier with configuration, balance verification and
//! metrics.

use crate::{
    config::SimplifierConfig,
    metrics::Metrics,
    simplifier::ExpenseSimplifier,
    types::SimplificationReport,
    Error, Result,
};
use debt_graph::{Cents, DebtGraph, DebtList};
use std::path::Path;
use std::time::Instant;

/// Simplification engine
#[derive(Debug)]
pub struct SimplificationEngine {
    /// Metrics (when enabled)
    metrics: Option<Metrics>,

    /// Configuration
    config: SimplifierConfig,
}

impl SimplificationEngine {
    /// Create new simplification engine
    pub fn new(config: SimplifierConfig) -> Result<Self> {
        let metrics = if config.metrics_enabled {
            Some(Metrics::new()?)
        } else {
            None
        };

        Ok(Self { metrics, config })
    }

    /// Simplify a ledger
    pub fn simplify(&self, graph: DebtGraph) -> Result<ExpenseSimplifier> {
        tracing::info!(
            service = %self.config.service_name,
            users = graph.num_users(),
            ordering = %self.config.edge_ordering,
            "Starting simplification"
        );

        let start = Instant::now();

        // Net positions before the input is consumed
        let expected: Option<Vec<Cents>> = self
            .config
            .verify_conservation
            .then(|| (0..graph.num_users()).map(|id| graph.graph().total_debt(id)).collect());

        let simplifier = ExpenseSimplifier::with_ordering(graph, self.config.edge_ordering);

        if let Some(expected) = expected {
            Self::verify_conservation(&expected, simplifier.minimal_transactions())?;
        }

        let elapsed = start.elapsed();
        let stats = simplifier.stats();

        if let Some(metrics) = &self.metrics {
            metrics.record_run(stats, elapsed.as_secs_f64());
        }

        tracing::info!(
            "Simplification complete: {} -> {} transactions ({:.1}% efficiency, {} phases, {:?})",
            stats.input_edge_count,
            stats.output_edge_count,
            stats.efficiency() * 100.0,
            stats.phase_count,
            elapsed
        );

        Ok(simplifier)
    }

    /// Build a ledger from `debt_list` and simplify it
    pub fn simplify_debt_list(&self, debt_list: &DebtList) -> Result<SimplificationReport> {
        let simplifier = self.simplify(DebtGraph::from_debt_list(debt_list))?;

        Ok(SimplificationReport {
            transactions: simplifier.minimal_transactions().all_debts(),
            stats: simplifier.stats().clone(),
        })
    }

    /// Load a JSON debt list from `path` and simplify it
    pub fn simplify_file(&self, path: impl AsRef<Path>) -> Result<SimplificationReport> {
        let debt_list = DebtList::from_json_file(path)?;
        self.simplify_debt_list(&debt_list)
    }

    /// Compare every user's net balance against the pre-run snapshot
    fn verify_conservation(expected: &[Cents], output: &DebtGraph) -> Result<()> {
        if output.num_users() != expected.len() {
            tracing::error!(
                expected = expected.len(),
                actual = output.num_users(),
                "User count changed during simplification"
            );
            return Err(Error::InvariantViolation(format!(
                "user count changed: {} -> {}",
                expected.len(),
                output.num_users()
            )));
        }

        for (id, &before) in expected.iter().enumerate() {
            let after = output.graph().total_debt(id);
            if before != after {
                let user = output.username(id).unwrap_or("<unknown>");
                tracing::warn!(user, before, after, "Net balance not conserved");
                return Err(Error::InvariantViolation(format!(
                    "net balance of {} changed: {} -> {}",
                    user, before, after
                )));
            }
        }

        Ok(())
    }

    /// Metrics collector, if enabled
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &SimplifierConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeOrdering;
    use debt_graph::Transaction;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("expense_simplifier=debug")
            .with_test_writer()
            .try_init();
    }

    fn triangle() -> DebtList {
        vec![
            Transaction::new("a", "b", 100),
            Transaction::new("b", "c", 100),
            Transaction::new("a", "c", 100),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_engine_creation() {
        let engine = SimplificationEngine::new(SimplifierConfig::default()).unwrap();
        assert!(engine.metrics().is_some());
        assert_eq!(engine.config().edge_ordering, EdgeOrdering::Priority);

        let config = SimplifierConfig {
            metrics_enabled: false,
            ..Default::default()
        };
        let engine = SimplificationEngine::new(config).unwrap();
        assert!(engine.metrics().is_none());
    }

    #[test]
    fn test_simplify_debt_list() {
        init_tracing();
        let engine = SimplificationEngine::new(SimplifierConfig::default()).unwrap();

        let report = engine.simplify_debt_list(&triangle()).unwrap();

        assert_eq!(report.transactions.transactions, vec![Transaction::new("a", "c", 200)]);
        assert_eq!(report.stats.input_edge_count, 3);
        assert_eq!(report.stats.output_edge_count, 1);

        let metrics = engine.metrics().unwrap();
        assert_eq!(metrics.runs_total.get(), 1);
        assert_eq!(metrics.edges_eliminated_total.get(), 2);
    }

    #[test]
    fn test_simplify_empty() {
        let engine = SimplificationEngine::new(SimplifierConfig::default()).unwrap();

        let report = engine.simplify_debt_list(&DebtList::new()).unwrap();

        assert!(report.transactions.is_empty());
        assert_eq!(report.stats.user_count, 0);
    }

    #[test]
    fn test_report_json() {
        let config = SimplifierConfig {
            metrics_enabled: false,
            edge_ordering: EdgeOrdering::Input,
            ..Default::default()
        };
        let engine = SimplificationEngine::new(config).unwrap();

        let report = engine.simplify_debt_list(&triangle()).unwrap();
        let json = report.to_json().unwrap();
        let parsed: SimplificationReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, report);
    }

    #[test]
    fn test_simplify_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debts.json");
        std::fs::write(&path, triangle().to_json().unwrap()).unwrap();

        let engine = SimplificationEngine::new(SimplifierConfig::default()).unwrap();
        let report = engine.simplify_file(&path).unwrap();
        assert_eq!(report.transactions.transactions, vec![Transaction::new("a", "c", 200)]);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            engine.simplify_file(&path),
            Err(Error::Ledger(debt_graph::Error::Serialization(_)))
        ));
        assert!(matches!(
            engine.simplify_file(dir.path().join("missing.json")),
            Err(Error::Ledger(debt_graph::Error::Io(_)))
        ));
    }

    #[test]
    fn test_verify_conservation_detects_mismatch() {
        let output: DebtGraph = vec![Transaction::new("a", "b", 10)].into_iter().collect();

        assert!(SimplificationEngine::verify_conservation(&[-10, 10], &output).is_ok());
        assert!(matches!(
            SimplificationEngine::verify_conservation(&[-20, 20], &output),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            SimplificationEngine::verify_conservation(&[0], &output),
            Err(Error::InvariantViolation(_))
        ));
    }
}
