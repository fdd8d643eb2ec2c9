use once_cell::sync::Lazy;
use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, GaugeVec, HistogramVec,
    IntCounterVec,
};

pub static OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("rigcat_ops_total", "Requests by operation", &["op"]).unwrap()
});

pub static FILTER_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "filter_seconds",
        "Facet filter pass latency",
        &["category"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]
    )
    .unwrap()
});

pub static FILTER_RESULTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "filter_results_total",
        "Filtered views by outcome",
        &["state"]
    )
    .unwrap()
});

pub static SNAPSHOT_ITEMS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("snapshot_items", "Items per category snapshot", &["category"]).unwrap()
});
