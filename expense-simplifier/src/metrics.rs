//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `simplifier_runs_total` - Total number of simplification runs
//! - `simplifier_phases_total` - Total number of blocking-flow phases
//! - `simplifier_edges_eliminated_total` - Debt edges removed by simplification
//! - `simplifier_output_edges` - Histogram of transactions left per run
//! - `simplifier_run_duration_seconds` - Histogram of run latencies
//!
//! Every [`Metrics`] owns its registry, so collectors never clash in the
//! process-wide default registry.

use crate::types::SimplificationStats;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total runs
    pub runs_total: IntCounter,

    /// Total blocking-flow phases
    pub phases_total: IntCounter,

    /// Total edges eliminated
    pub edges_eliminated_total: IntCounter,

    /// Output edges per run
    pub output_edges: Histogram,

    /// Run duration histogram
    pub run_duration: Histogram,

    /// Prometheus registry
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let runs_total = IntCounter::new(
            "simplifier_runs_total",
            "Total number of simplification runs",
        )?;
        registry.register(Box::new(runs_total.clone()))?;

        let phases_total = IntCounter::new(
            "simplifier_phases_total",
            "Total number of blocking-flow phases",
        )?;
        registry.register(Box::new(phases_total.clone()))?;

        let edges_eliminated_total = IntCounter::new(
            "simplifier_edges_eliminated_total",
            "Debt edges removed by simplification",
        )?;
        registry.register(Box::new(edges_eliminated_total.clone()))?;

        let output_edges = Histogram::with_opts(
            HistogramOpts::new(
                "simplifier_output_edges",
                "Histogram of transactions left per run",
            )
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]),
        )?;
        registry.register(Box::new(output_edges.clone()))?;

        let run_duration = Histogram::with_opts(
            HistogramOpts::new(
                "simplifier_run_duration_seconds",
                "Histogram of run latencies",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0, 5.0]),
        )?;
        registry.register(Box::new(run_duration.clone()))?;

        Ok(Self {
            runs_total,
            phases_total,
            edges_eliminated_total,
            output_edges,
            run_duration,
            registry,
        })
    }

    /// Record a finished run
    pub fn record_run(&self, stats: &SimplificationStats, duration_seconds: f64) {
        self.runs_total.inc();
        self.phases_total.inc_by(stats.phase_count as u64);
        self.edges_eliminated_total
            .inc_by(stats.edges_eliminated() as u64);
        self.output_edges.observe(stats.output_edge_count as f64);
        self.run_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("runs_total", &self.runs_total.get())
            .field("phases_total", &self.phases_total.get())
            .field("edges_eliminated_total", &self.edges_eliminated_total.get())
            .finish_non_exhaustive()
    }
}
