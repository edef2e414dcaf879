use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

lazy_static! {
    pub static ref POLL_REQUESTS: IntCounter =
        IntCounter::new("prop_monitor_poll_requests", "waitForUpdates calls issued")
            .expect("metric can not be created");

    pub static ref POLL_TIMEOUT_RETRIES: IntCounter = IntCounter::new(
        "prop_monitor_poll_timeout_retries",
        "waitForUpdates receive timeouts retried on a live session"
    )
    .expect("metric can not be created");

    pub static ref UPDATE_BATCHES: IntCounter =
        IntCounter::new("prop_monitor_update_batches", "non-empty update batches received")
            .expect("metric can not be created");

    pub static ref OBJECT_UPDATES: IntCounterVec = IntCounterVec::new(
        Opts::new("prop_monitor_object_updates", "object updates dispatched to the handler"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref UNRECOGNIZED_UPDATES: IntCounter = IntCounter::new(
        "prop_monitor_unrecognized_updates",
        "object updates skipped because of an unknown kind"
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

fn register_custom_metrics() {
    REGISTRY
        .register(Box::new(POLL_REQUESTS.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(POLL_TIMEOUT_RETRIES.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(UPDATE_BATCHES.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(OBJECT_UPDATES.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(UNRECOGNIZED_UPDATES.clone()))
        .expect("collector can be registered");
}

/// Prometheus text exposition of the monitor counters.
pub fn gather_metrics() -> String {
    use prometheus::Encoder;

    REGISTER.call_once(register_custom_metrics);

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
