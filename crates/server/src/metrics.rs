//! Lock-free request counters.
//!
//! Handlers update these via atomic operations: no locks, no allocations,
//! never blocking a request. `/stats` reads them at its own pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

/// Which endpoint served a chunk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Surface,
    Chunk,
}

/// Atomic request counters. A handful of `fetch_add`s per request.
pub struct Metrics {
    // Monotonic counters
    surface_requests: AtomicU64,
    chunk_requests: AtomicU64,
    bytes_served: AtomicU64,
    edits_applied: AtomicU64,
    rejected_payloads: AtomicU64,
    request_ns_sum: AtomicU64,

    // Latency histogram buckets (store lookup, including generation on miss)
    hist_under_10us: AtomicU64,
    hist_10_100us: AtomicU64,
    hist_100us_1ms: AtomicU64,
    hist_1_10ms: AtomicU64,
    hist_over_10ms: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            surface_requests: AtomicU64::new(0),
            chunk_requests: AtomicU64::new(0),
            bytes_served: AtomicU64::new(0),
            edits_applied: AtomicU64::new(0),
            rejected_payloads: AtomicU64::new(0),
            request_ns_sum: AtomicU64::new(0),
            hist_under_10us: AtomicU64::new(0),
            hist_10_100us: AtomicU64::new(0),
            hist_100us_1ms: AtomicU64::new(0),
            hist_1_10ms: AtomicU64::new(0),
            hist_over_10ms: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called after each chunk or surface request has been answered.
    pub fn record_request(&self, kind: RequestKind, bytes: usize, duration: Duration) {
        match kind {
            RequestKind::Surface => self.surface_requests.fetch_add(1, Relaxed),
            RequestKind::Chunk => self.chunk_requests.fetch_add(1, Relaxed),
        };
        self.bytes_served.fetch_add(bytes as u64, Relaxed);
        self.request_ns_sum
            .fetch_add(duration.as_nanos() as u64, Relaxed);

        let us = duration.as_micros() as u64;
        match us {
            0..=9 => {
                self.hist_under_10us.fetch_add(1, Relaxed);
            }
            10..=99 => {
                self.hist_10_100us.fetch_add(1, Relaxed);
            }
            100..=999 => {
                self.hist_100us_1ms.fetch_add(1, Relaxed);
            }
            1_000..=9_999 => {
                self.hist_1_10ms.fetch_add(1, Relaxed);
            }
            _ => {
                self.hist_over_10ms.fetch_add(1, Relaxed);
            }
        }
    }

    pub fn record_edits(&self, count: usize) {
        self.edits_applied.fetch_add(count as u64, Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_payloads.fetch_add(1, Relaxed);
    }

    /// Read all counters into a serializable snapshot.
    pub fn snapshot(&self, chunks_loaded: u64, chunks_generated: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            surface_requests: self.surface_requests.load(Relaxed),
            chunk_requests: self.chunk_requests.load(Relaxed),
            bytes_served: self.bytes_served.load(Relaxed),
            edits_applied: self.edits_applied.load(Relaxed),
            rejected_payloads: self.rejected_payloads.load(Relaxed),
            request_ns_sum: self.request_ns_sum.load(Relaxed),
            chunks_loaded,
            chunks_generated,
            hist: [
                self.hist_under_10us.load(Relaxed),
                self.hist_10_100us.load(Relaxed),
                self.hist_100us_1ms.load(Relaxed),
                self.hist_1_10ms.load(Relaxed),
                self.hist_over_10ms.load(Relaxed),
            ],
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all metrics at a point in time.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub surface_requests: u64,
    pub chunk_requests: u64,
    pub bytes_served: u64,
    pub edits_applied: u64,
    pub rejected_payloads: u64,
    pub request_ns_sum: u64,
    pub chunks_loaded: u64,
    pub chunks_generated: u64,
    /// `[<10μs, 10-100μs, 100μs-1ms, 1-10ms, >10ms]`
    pub hist: [u64; 5],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_land_in_histogram_buckets() {
        let m = Metrics::new();
        m.record_request(RequestKind::Surface, 2048, Duration::from_micros(3));
        m.record_request(RequestKind::Surface, 2048, Duration::from_micros(50));
        m.record_request(RequestKind::Chunk, 900, Duration::from_millis(4));
        m.record_request(RequestKind::Chunk, 900, Duration::from_millis(40));

        let snap = m.snapshot(3, 2);
        assert_eq!(snap.surface_requests, 2);
        assert_eq!(snap.chunk_requests, 2);
        assert_eq!(snap.bytes_served, 2 * 2048 + 2 * 900);
        assert_eq!(snap.hist, [1, 1, 0, 1, 1]);
        assert_eq!(snap.chunks_loaded, 3);
        assert_eq!(snap.chunks_generated, 2);
    }

    #[test]
    fn edits_and_rejections_accumulate() {
        let m = Metrics::new();
        m.record_edits(3);
        m.record_edits(4);
        m.record_rejected();
        let snap = m.snapshot(0, 0);
        assert_eq!(snap.edits_applied, 7);
        assert_eq!(snap.rejected_payloads, 1);
    }
}
