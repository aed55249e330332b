//! Prometheus metrics collection for flowstated.
//!
//! Tracks connection and room population, message throughput by type, edit
//! volume, and broadcast fan-out/drop behavior. Exposed on the HTTP
//! sidecar's `/metrics` endpoint.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Messages accepted from clients, by type tag.
pub static MESSAGES_ROUTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Document edits applied (last-writer-wins accepts all of them).
pub static EDITS_APPLIED: OnceLock<IntCounter> = OnceLock::new();

/// Broadcast copies dropped because a recipient's outbound queue was
/// full or closed.
pub static BROADCAST_DROPPED: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently connected clients.
pub static CONNECTED_CLIENTS: OnceLock<IntGauge> = OnceLock::new();

/// Rooms currently present in the Hub.
pub static ACTIVE_ROOMS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Broadcast fan-out: recipients per relayed message.
pub static BROADCAST_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        MESSAGES_ROUTED,
        IntCounterVec::new(
            Opts::new("flowstate_messages_total", "Messages accepted by type"),
            &["type"]
        )
    );
    register!(
        EDITS_APPLIED,
        IntCounter::new("flowstate_edits_applied_total", "Document edits applied")
    );
    register!(
        BROADCAST_DROPPED,
        IntCounter::new(
            "flowstate_broadcast_dropped_total",
            "Broadcast copies dropped due to backpressure"
        )
    );
    register!(
        CONNECTED_CLIENTS,
        IntGauge::new("flowstate_connected_clients", "Currently connected clients")
    );
    register!(
        ACTIVE_ROOMS,
        IntGauge::new("flowstate_active_rooms", "Rooms present in the Hub")
    );
    register!(
        BROADCAST_FANOUT,
        Histogram::with_opts(
            HistogramOpts::new("flowstate_broadcast_fanout", "Recipients per relayed message")
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0])
        )
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record an accepted message by type tag.
#[inline]
pub fn record_message(kind: &str) {
    if let Some(c) = MESSAGES_ROUTED.get() {
        c.with_label_values(&[kind]).inc();
    }
}

/// Record an applied document edit.
#[inline]
pub fn record_edit() {
    if let Some(c) = EDITS_APPLIED.get() {
        c.inc();
    }
}

/// Record one dropped broadcast copy.
#[inline]
pub fn record_dropped_send() {
    if let Some(c) = BROADCAST_DROPPED.get() {
        c.inc();
    }
}

/// Record broadcast fan-out (how many recipients received a relayed message).
#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(h) = BROADCAST_FANOUT.get() {
        h.observe(recipients as f64);
    }
}

/// Adjust the connected-clients gauge.
#[inline]
pub fn client_connected() {
    if let Some(g) = CONNECTED_CLIENTS.get() {
        g.inc();
    }
}

/// Adjust the connected-clients gauge.
#[inline]
pub fn client_disconnected() {
    if let Some(g) = CONNECTED_CLIENTS.get() {
        g.dec();
    }
}

/// Set the active-rooms gauge to the Hub's current room count.
#[inline]
pub fn set_active_rooms(count: usize) {
    if let Some(g) = ACTIVE_ROOMS.get() {
        g.set(count as i64);
    }
}
