//! OpenTelemetry instruments for statement execution.
//!
//! Recorded against the global meter provider; exporting (Prometheus, OTLP, ...) is set up
//! by the application.

use once_cell::sync::Lazy;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};
use std::time::Duration;

pub static METRICS: Lazy<RelmetaMetrics> = Lazy::new(RelmetaMetrics::init);

pub struct RelmetaMetrics {
    pub statements_total: Counter<u64>,
    pub statement_duration: Histogram<f64>,
    pub conflicts_total: Counter<u64>,
    pub reconciliations_total: Counter<u64>,
}

impl RelmetaMetrics {
    pub fn init() -> Self {
        let meter = global::meter("relmeta");

        let statements_total = meter
            .u64_counter("relmeta_statements_total")
            .with_description("Statements handed to the executor")
            .build();

        let statement_duration = meter
            .f64_histogram("relmeta_statement_duration_seconds")
            .with_description("Executor time per statement")
            .build();

        let conflicts_total = meter
            .u64_counter("relmeta_conflicts_total")
            .with_description("Keyed writes that did not affect exactly one row")
            .build();

        let reconciliations_total = meter
            .u64_counter("relmeta_reconciliations_total")
            .with_description("Join table reconciliations applied")
            .build();

        Self {
            statements_total,
            statement_duration,
            conflicts_total,
            reconciliations_total,
        }
    }

    pub fn record_statement(&self, kind: &'static str, elapsed: Duration) {
        let attrs = [KeyValue::new("kind", kind)];
        self.statements_total.add(1, &attrs);
        self.statement_duration.record(elapsed.as_secs_f64(), &attrs);
    }

    pub fn record_conflict(&self) {
        self.conflicts_total.add(1, &[]);
    }

    pub fn record_reconciliation(&self) {
        self.reconciliations_total.add(1, &[]);
    }
}
