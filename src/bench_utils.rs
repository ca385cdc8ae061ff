use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;

use crate::run::{MeasurementRecord, Run};

/// Shape of a synthetic nightly used by benches and tests.
#[derive(Clone, Debug)]
pub struct RunShape {
    pub benchmarks: usize,
    pub modes: usize,
    /// Fraction of (benchmark, mode) pairs left out, in `[0, 1)`.
    pub missing: f64,
}

impl RunShape {
    pub fn dense(benchmarks: usize, modes: usize) -> Self {
        Self {
            benchmarks,
            modes,
            missing: 0.0,
        }
    }

    pub fn pairs(&self) -> usize {
        self.benchmarks * self.modes
    }
}

pub fn benchmark_name(idx: usize) -> String {
    format!("bench_{idx:04}")
}

pub fn mode_name(idx: usize) -> String {
    format!("mode_{idx:02}")
}

/// Deterministic run for `seed`. Means are hyperfine-shaped and strictly positive.
pub fn generate_run(shape: &RunShape, seed: u64) -> Run {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(shape.pairs());
    for b in 0..shape.benchmarks {
        for m in 0..shape.modes {
            if shape.missing > 0.0 && rng.gen_bool(shape.missing.min(0.99)) {
                continue;
            }
            let mean: f64 = rng.gen_range(0.001..5.0);
            let stddev = mean * rng.gen_range(0.0..0.05);
            records.push(
                MeasurementRecord::new(benchmark_name(b), mode_name(m)).with_metric(
                    "hyperfine",
                    json!({ "results": [{ "mean": mean, "stddev": stddev }] }),
                ),
            );
        }
    }
    Run::new(records)
}
