use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("orders_created_total").absolute(0);
    counter!("orders_delivered_total").absolute(0);
    counter!("orders_cancelled_total").absolute(0);
    counter!("rider_assign_conflicts_total").absolute(0);
    counter!("ledger_create_failures_total").absolute(0);
    counter!("ledger_reconciled_total").absolute(0);
    counter!("admin_overrides_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("ledger_outbox_pending").set(0.0);

    handle
}
