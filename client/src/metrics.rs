//! # Flow Metrics
//!
//! Counters and a latency histogram for the confirmation flow, registered in
//! a dedicated [`prometheus::Registry`] so embedding applications can merge
//! or expose them however they like.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

/// Metric handles for one confirmation flow (or a group of them).
///
/// Cheap to clone; the prometheus handles are reference counted.
#[derive(Clone)]
pub struct FlowMetrics {
    registry: Registry,
    /// Transfers created on the backend.
    pub transfers_initiated_total: IntCounter,
    /// Creation requests the backend rejected or that failed in transport.
    pub initiation_failures_total: IntCounter,
    /// Codes sent to the backend for verification.
    pub otp_submissions_total: IntCounter,
    /// Codes rejected locally (too short), never sent.
    pub otp_local_rejections_total: IntCounter,
    /// Codes the backend refused.
    pub otp_verification_failures_total: IntCounter,
    /// Transfers confirmed.
    pub transfers_confirmed_total: IntCounter,
    /// Latency of backend calls made by the flow, in seconds.
    pub backend_latency_seconds: Histogram,
}

impl FlowMetrics {
    /// Creates and registers all metrics under the `ledgerline` prefix.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledgerline".into()), None)?;

        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let transfers_initiated_total = counter(
            "transfers_initiated_total",
            "Transfers created and awaiting OTP confirmation",
        )?;
        let initiation_failures_total = counter(
            "initiation_failures_total",
            "Transfer creation requests that failed",
        )?;
        let otp_submissions_total = counter(
            "otp_submissions_total",
            "OTP codes sent to the backend for verification",
        )?;
        let otp_local_rejections_total = counter(
            "otp_local_rejections_total",
            "OTP codes rejected locally for being too short",
        )?;
        let otp_verification_failures_total = counter(
            "otp_verification_failures_total",
            "OTP codes refused by the backend",
        )?;
        let transfers_confirmed_total =
            counter("transfers_confirmed_total", "Transfers confirmed with an OTP")?;

        let backend_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "backend_latency_seconds",
                "Latency of backend calls issued by the confirmation flow",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(backend_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            transfers_initiated_total,
            initiation_failures_total,
            otp_submissions_total,
            otp_local_rejections_total,
            otp_verification_failures_total,
            transfers_confirmed_total,
            backend_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// The registry, for embedding applications that serve `/metrics`.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for FlowMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowMetrics")
            .field("transfers_initiated_total", &self.transfers_initiated_total.get())
            .field("transfers_confirmed_total", &self.transfers_confirmed_total.get())
            .finish_non_exhaustive()
    }
}
