// Latency benchmark for literal parsing and end-to-end verification
// Parsing must stay far below process spawn cost; verification is dominated
// by interpreter start-up.
// Target: parse p95 < 1ms for a 1000-element list, verify p50 < 500ms per case

use solvebox::judge::find_on_path;
use solvebox::{literal, RawTestCase, Verifier};
use std::time::{Duration, Instant};

const ITERATIONS: usize = 200;
const WARMUP_ITERATIONS: usize = 20;
const VERIFY_ITERATIONS: usize = 10;

/// Latency percentiles
struct LatencyStats {
    p50: Duration,
    p95: Duration,
    min: Duration,
    max: Duration,
    mean: Duration,
}

impl LatencyStats {
    fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let len = samples.len();

        let p50_idx = (len as f64 * 0.50) as usize;
        let p95_idx = ((len as f64 * 0.95) as usize).min(len - 1);

        let sum: Duration = samples.iter().sum();
        let mean = sum / len as u32;

        Self {
            p50: samples[p50_idx],
            p95: samples[p95_idx],
            min: samples[0],
            max: samples[len - 1],
            mean,
        }
    }

    fn print(&self, label: &str) {
        println!("\n{}", label);
        println!("  p50: {:?}", self.p50);
        println!("  p95: {:?}", self.p95);
        println!("  min: {:?}", self.min);
        println!("  max: {:?}", self.max);
        println!("  mean: {:?}", self.mean);
    }
}

struct BenchmarkResult {
    scenario: String,
    stats: LatencyStats,
    passed: bool,
    reason: Option<String>,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n=== {} ===", self.scenario);
        self.stats.print("Latency");

        match &self.reason {
            None => println!("✅ PASS"),
            Some(reason) => println!("❌ FAIL: {}", reason),
        }
    }
}

fn measure<F: FnMut()>(warmup: usize, iterations: usize, mut f: F) -> LatencyStats {
    for _ in 0..warmup {
        f();
    }
    let samples = (0..iterations)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .collect();
    LatencyStats::from_samples(samples)
}

fn benchmark_large_list_parse() -> BenchmarkResult {
    let text = format!(
        "[{}]",
        (0..1000).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    );

    let stats = measure(WARMUP_ITERATIONS, ITERATIONS, || {
        let _ = literal::parse(&text);
    });

    let passed = stats.p95 < Duration::from_millis(1);
    let reason = (!passed).then(|| format!("p95={:?} (target <1ms)", stats.p95));
    BenchmarkResult {
        scenario: "Parse 1000-element list".to_string(),
        stats,
        passed,
        reason,
    }
}

fn benchmark_assignment_parse() -> BenchmarkResult {
    let text = r#"grid = [["1","1","0"],["0","1","0"]], words = {"a": [1, 2.5, null], "b": true}, k = -3"#;

    let stats = measure(WARMUP_ITERATIONS, ITERATIONS, || {
        let _ = literal::parse_case_input(text);
    });

    let passed = stats.p95 < Duration::from_millis(1);
    let reason = (!passed).then(|| format!("p95={:?} (target <1ms)", stats.p95));
    BenchmarkResult {
        scenario: "Parse nested assignments".to_string(),
        stats,
        passed,
        reason,
    }
}

fn benchmark_python_verify() -> Option<BenchmarkResult> {
    if find_on_path("python3").is_none() {
        println!("\nSkipping Python verification benchmark: python3 not found");
        return None;
    }

    let source = "class Solution:\n    def add(self, a, b):\n        return a + b\n";
    let cases = vec![RawTestCase::new("a = 1\nb = 2", "3")];
    let verifier = Verifier::default();

    let stats = measure(1, VERIFY_ITERATIONS, || {
        let _ = verifier.verify(source, "python3", &cases);
    });

    let passed = stats.p50 < Duration::from_millis(500);
    let reason = (!passed).then(|| format!("p50={:?} (target <500ms)", stats.p50));
    Some(BenchmarkResult {
        scenario: "Python verify (syntax check + one case)".to_string(),
        stats,
        passed,
        reason,
    })
}

fn main() {
    println!("solvebox latency benchmark");
    println!("==========================");

    let mut results = vec![benchmark_large_list_parse(), benchmark_assignment_parse()];
    results.extend(benchmark_python_verify());

    for result in &results {
        result.print();
    }

    let failed = results.iter().filter(|r| !r.passed).count();
    println!("\n{} scenario(s), {} failed", results.len(), failed);
}
