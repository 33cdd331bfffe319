use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bids_resolved_total: IntCounterVec,
    pub orders_created_total: IntCounter,
    pub locations_published_total: IntCounter,
    pub tracking_subscribers: IntGauge,
    pub resolution_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bids_resolved_total = IntCounterVec::new(
            Opts::new("bids_resolved_total", "Bid resolutions by outcome"),
            &["outcome"],
        )
        .expect("valid bids_resolved_total metric");

        let orders_created_total = IntCounter::new(
            "orders_created_total",
            "Orders materialized from accepted bids",
        )
        .expect("valid orders_created_total metric");

        let locations_published_total = IntCounter::new(
            "locations_published_total",
            "Location samples published to tracking groups",
        )
        .expect("valid locations_published_total metric");

        let tracking_subscribers = IntGauge::new(
            "tracking_subscribers",
            "Currently connected tracking subscribers",
        )
        .expect("valid tracking_subscribers metric");

        let resolution_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "resolution_latency_seconds",
                "Latency of the bid accept/reject transition in seconds",
            ),
            &["outcome"],
        )
        .expect("valid resolution_latency_seconds metric");

        registry
            .register(Box::new(bids_resolved_total.clone()))
            .expect("register bids_resolved_total");
        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(locations_published_total.clone()))
            .expect("register locations_published_total");
        registry
            .register(Box::new(tracking_subscribers.clone()))
            .expect("register tracking_subscribers");
        registry
            .register(Box::new(resolution_latency_seconds.clone()))
            .expect("register resolution_latency_seconds");

        Self {
            registry,
            bids_resolved_total,
            orders_created_total,
            locations_published_total,
            tracking_subscribers,
            resolution_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
