use tracing::trace;

// Lightweight metrics helpers emitted as trace events; the Prometheus
// recorder in main exposes the scrape endpoint.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "hawker.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "hawker.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}
