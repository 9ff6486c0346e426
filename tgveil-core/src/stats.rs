//! Run-long statistics (§3).
//!
//! Stored as atomics even though the intercept loop itself is single
//! threaded (§5) — mutation only ever happens between the loop's two
//! suspension points — so that the optional metrics-scrape listener
//! (§10.3), which does run on its own OS thread, can read a consistent
//! snapshot without taking a lock.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SizeBuckets {
    pub small: AtomicU64,
    pub medium: AtomicU64,
    pub large: AtomicU64,
    pub huge: AtomicU64,
}

impl SizeBuckets {
    fn record(&self, payload_len: usize) {
        let counter = if payload_len < 1024 {
            &self.small
        } else if payload_len < 50 * 1024 {
            &self.medium
        } else if payload_len < 500 * 1024 {
            &self.large
        } else {
            &self.huge
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SizeBucketsSnapshot {
        SizeBucketsSnapshot {
            small: self.small.load(Ordering::Relaxed),
            medium: self.medium.load(Ordering::Relaxed),
            large: self.large.load(Ordering::Relaxed),
            huge: self.huge.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SizeBucketsSnapshot {
    pub small: u64,
    pub medium: u64,
    pub large: u64,
    pub huge: u64,
}

/// Monotonically non-decreasing counters for the intercept loop and the
/// splitter. Reset only by [`Stats::reset`] or a process restart.
#[derive(Debug, Default)]
pub struct Stats {
    pub total: AtomicU64,
    pub tls_records_seen: AtomicU64,
    pub target_flagged: AtomicU64,
    pub errors: AtomicU64,
    pub udp_seen: AtomicU64,
    pub rst_blocked: AtomicU64,

    pub fragmented: AtomicU64,
    pub passed: AtomicU64,
    pub split_errors: AtomicU64,
    pub size_buckets: SizeBuckets,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub total: u64,
    pub tls_records_seen: u64,
    pub target_flagged: u64,
    pub errors: u64,
    pub udp_seen: u64,
    pub rst_blocked: u64,
    pub fragmented: u64,
    pub passed: u64,
    pub split_errors: u64,
    pub size_buckets: SizeBucketsSnapshot,
}

impl Stats {
    pub fn record_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tls_record_seen(&self) {
        self.tls_records_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_target_flagged(&self) {
        self.target_flagged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_udp_seen(&self) {
        self.udp_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rst_blocked(&self) {
        self.rst_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fragmented(&self, payload_len: usize) {
        self.fragmented.fetch_add(1, Ordering::Relaxed);
        self.size_buckets.record(payload_len);
    }

    pub fn record_passed(&self) {
        self.passed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_split_error(&self) {
        self.split_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            tls_records_seen: self.tls_records_seen.load(Ordering::Relaxed),
            target_flagged: self.target_flagged.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            udp_seen: self.udp_seen.load(Ordering::Relaxed),
            rst_blocked: self.rst_blocked.load(Ordering::Relaxed),
            fragmented: self.fragmented.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            split_errors: self.split_errors.load(Ordering::Relaxed),
            size_buckets: self.size_buckets.snapshot(),
        }
    }

    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.tls_records_seen.store(0, Ordering::Relaxed);
        self.target_flagged.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.udp_seen.store(0, Ordering::Relaxed);
        self.rst_blocked.store(0, Ordering::Relaxed);
        self.fragmented.store(0, Ordering::Relaxed);
        self.passed.store(0, Ordering::Relaxed);
        self.split_errors.store(0, Ordering::Relaxed);
    }
}

impl StatsSnapshot {
    /// Render the snapshot in Prometheus text exposition format (§10.3).
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP tgveil_packets_total Packets seen by the intercept loop.\n\
             # TYPE tgveil_packets_total counter\n\
             tgveil_packets_total {}\n\
             tgveil_tls_records_seen_total {}\n\
             tgveil_target_flagged_total {}\n\
             tgveil_errors_total {}\n\
             tgveil_udp_seen_total {}\n\
             tgveil_rst_blocked_total {}\n\
             tgveil_fragmented_total {}\n\
             tgveil_passed_total {}\n\
             tgveil_split_errors_total {}\n\
             tgveil_fragmented_bucket{{size=\"small\"}} {}\n\
             tgveil_fragmented_bucket{{size=\"medium\"}} {}\n\
             tgveil_fragmented_bucket{{size=\"large\"}} {}\n\
             tgveil_fragmented_bucket{{size=\"huge\"}} {}\n",
            self.total,
            self.tls_records_seen,
            self.target_flagged,
            self.errors,
            self.udp_seen,
            self.rst_blocked,
            self.fragmented,
            self.passed,
            self.split_errors,
            self.size_buckets.small,
            self.size_buckets.medium,
            self.size_buckets.large,
            self.size_buckets.huge,
        )
    }

    pub fn to_human_summary(&self) -> String {
        format!(
            "total={} tls_records_seen={} target_flagged={} errors={} udp_seen={} \
             rst_blocked={} fragmented={} passed={} split_errors={}",
            self.total,
            self.tls_records_seen,
            self.target_flagged,
            self.errors,
            self.udp_seen,
            self.rst_blocked,
            self.fragmented,
            self.passed,
            self.split_errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_monotonic() {
        let stats = Stats::default();
        stats.record_total();
        stats.record_total();
        stats.record_fragmented(10);
        let snap = stats.snapshot();
        assert_eq!(snap.total, 2);
        assert_eq!(snap.fragmented, 1);
        assert_eq!(snap.size_buckets.small, 1);
    }

    #[test]
    fn size_buckets_route_correctly() {
        let stats = Stats::default();
        stats.record_fragmented(10);
        stats.record_fragmented(2000);
        stats.record_fragmented(100_000);
        stats.record_fragmented(1_000_000);
        let snap = stats.snapshot();
        assert_eq!(snap.size_buckets.small, 1);
        assert_eq!(snap.size_buckets.medium, 1);
        assert_eq!(snap.size_buckets.large, 1);
        assert_eq!(snap.size_buckets.huge, 1);
    }

    #[test]
    fn reset_zeroes_all_counters() {
        let stats = Stats::default();
        stats.record_total();
        stats.record_rst_blocked();
        stats.reset();
        let snap = stats.snapshot();
        assert_eq!(snap.total, 0);
        assert_eq!(snap.rst_blocked, 0);
    }

    #[test]
    fn prometheus_rendering_contains_all_counters() {
        let stats = Stats::default();
        let text = stats.snapshot().to_prometheus();
        assert!(text.contains("tgveil_packets_total"));
        assert!(text.contains("tgveil_rst_blocked_total"));
    }
}
