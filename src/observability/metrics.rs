// Verification metrics
//
// Counters, gauges and latency histograms for:
// - verification calls and how they ended (all passed, syntax or extraction rejection)
// - case outcomes (passed, mismatch, runtime failure, timeout)
// - missing toolchains
// - call and case latency

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::types::{CallFailure, CaseOutcome, VerificationReport};

/// Counter metric (monotonically increasing)
#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

/// Gauge metric (can go up or down)
#[derive(Debug)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements its gauge when dropped
pub struct GaugeGuard<'a> {
    gauge: &'a Gauge,
}

impl<'a> GaugeGuard<'a> {
    pub fn new(gauge: &'a Gauge) -> Self {
        gauge.inc();
        Self { gauge }
    }
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Histogram bucket for latency tracking
#[derive(Debug)]
pub struct HistogramBucket {
    pub le: f64, // upper bound in seconds
    pub count: AtomicU64,
}

/// Histogram metric for latency/duration tracking
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<HistogramBucket>,
    sum: AtomicU64, // microseconds
    count: AtomicU64,
}

impl Histogram {
    /// Buckets sized for interpreter start-up through multi-second timeouts
    pub fn new_latency() -> Self {
        let bucket_bounds = [0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

        let buckets = bucket_bounds
            .into_iter()
            .map(|le| HistogramBucket {
                le,
                count: AtomicU64::new(0),
            })
            .collect();

        Self {
            buckets,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: Duration) {
        let seconds = value.as_secs_f64();
        self.sum
            .fetch_add(value.as_micros() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for bucket in &self.buckets {
            if seconds <= bucket.le {
                bucket.count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn get_sum_micros(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn get_bucket_count(&self, le: f64) -> u64 {
        self.buckets
            .iter()
            .find(|b| (b.le - le).abs() < 0.0001)
            .map(|b| b.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn export(&self, name: &str, help: &str, output: &mut String) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} histogram\n", name));
        for bucket in &self.buckets {
            output.push_str(&format!(
                "{}_bucket{{le=\"{}\"}} {}\n",
                name,
                bucket.le,
                bucket.count.load(Ordering::Relaxed)
            ));
        }
        output.push_str(&format!("{}_bucket{{le=\"+Inf\"}} {}\n", name, self.get_count()));
        output.push_str(&format!(
            "{}_sum {}\n",
            name,
            self.get_sum_micros() as f64 / 1_000_000.0
        ));
        output.push_str(&format!("{}_count {}\n", name, self.get_count()));
    }
}

/// Global metrics registry
#[derive(Debug)]
pub struct MetricsRegistry {
    // Call outcomes
    pub verifications_total: Counter,
    pub verifications_all_passed: Counter,
    pub syntax_rejections: Counter,
    pub extraction_rejections: Counter,
    pub runtime_unavailable: Counter,

    // Case outcomes
    pub cases_total: Counter,
    pub cases_passed: Counter,
    pub cases_mismatch: Counter,
    pub cases_runtime_failure: Counter,
    pub cases_timeout: Counter,

    pub active_verifications: Gauge,

    pub verification_duration: Histogram,
    pub case_duration: Histogram,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            verifications_total: Counter::new(),
            verifications_all_passed: Counter::new(),
            syntax_rejections: Counter::new(),
            extraction_rejections: Counter::new(),
            runtime_unavailable: Counter::new(),

            cases_total: Counter::new(),
            cases_passed: Counter::new(),
            cases_mismatch: Counter::new(),
            cases_runtime_failure: Counter::new(),
            cases_timeout: Counter::new(),

            active_verifications: Gauge::new(),

            verification_duration: Histogram::new_latency(),
            case_duration: Histogram::new_latency(),
        }
    }

    /// Record one finished case
    pub fn record_case(&self, outcome: &CaseOutcome, elapsed: Duration) {
        self.cases_total.inc();
        self.case_duration.observe(elapsed);

        match outcome {
            CaseOutcome::Passed => self.cases_passed.inc(),
            CaseOutcome::Mismatch { .. } => self.cases_mismatch.inc(),
            CaseOutcome::RuntimeFailure { .. } => self.cases_runtime_failure.inc(),
            CaseOutcome::Timeout { .. } => self.cases_timeout.inc(),
        }
    }

    /// Record one finished verification call
    pub fn record_report(&self, report: &VerificationReport, elapsed: Duration) {
        self.verifications_total.inc();
        self.verification_duration.observe(elapsed);

        match &report.failure {
            Some(CallFailure::Syntax(_)) => self.syntax_rejections.inc(),
            Some(CallFailure::Extraction { .. }) => self.extraction_rejections.inc(),
            None if report.all_passed() => self.verifications_all_passed.inc(),
            None => {}
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP solvebox_verifications_total Total verification calls\n");
        output.push_str("# TYPE solvebox_verifications_total counter\n");
        output.push_str(&format!(
            "solvebox_verifications_total {}\n",
            self.verifications_total.get()
        ));

        output.push_str("# HELP solvebox_verifications_by_result Verification calls by result\n");
        output.push_str("# TYPE solvebox_verifications_by_result counter\n");
        for (result, counter) in [
            ("all_passed", &self.verifications_all_passed),
            ("syntax_rejected", &self.syntax_rejections),
            ("extraction_rejected", &self.extraction_rejections),
            ("runtime_unavailable", &self.runtime_unavailable),
        ] {
            output.push_str(&format!(
                "solvebox_verifications_by_result{{result=\"{}\"}} {}\n",
                result,
                counter.get()
            ));
        }

        output.push_str("# HELP solvebox_cases_by_outcome Test cases by outcome\n");
        output.push_str("# TYPE solvebox_cases_by_outcome counter\n");
        for (outcome, counter) in [
            ("passed", &self.cases_passed),
            ("mismatch", &self.cases_mismatch),
            ("runtime_failure", &self.cases_runtime_failure),
            ("timeout", &self.cases_timeout),
        ] {
            output.push_str(&format!(
                "solvebox_cases_by_outcome{{outcome=\"{}\"}} {}\n",
                outcome,
                counter.get()
            ));
        }

        output.push_str("# HELP solvebox_active_verifications Verification calls in flight\n");
        output.push_str("# TYPE solvebox_active_verifications gauge\n");
        output.push_str(&format!(
            "solvebox_active_verifications {}\n",
            self.active_verifications.get()
        ));

        self.verification_duration.export(
            "solvebox_verification_duration_seconds",
            "Wall time of whole verification calls",
            &mut output,
        );
        self.case_duration.export(
            "solvebox_case_duration_seconds",
            "Wall time of single test case executions",
            &mut output,
        );

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global metrics instance
static METRICS: once_cell::sync::Lazy<Arc<MetricsRegistry>> =
    once_cell::sync::Lazy::new(|| Arc::new(MetricsRegistry::new()));

/// Get global metrics registry
pub fn get_metrics() -> Arc<MetricsRegistry> {
    Arc::clone(&METRICS)
}
