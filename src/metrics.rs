use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();
    let handle = builder.install_recorder()?;
    metrics::describe_counter!(
        "matchbook_orders_matched_total",
        "Orders consumed in full by matching rounds"
    );
    metrics::describe_counter!(
        "matchbook_orders_partial_total",
        "Partial fill fragments produced by matching rounds"
    );
    metrics::describe_gauge!("matchbook_resting_orders", "Orders resting in the book");
    Ok(handle)
}
