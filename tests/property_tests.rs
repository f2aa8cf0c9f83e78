//! Property-based tests for por-engine
//!
//! Pattern:
//! - Test mathematical invariants
//! - Test batch shape and isolation properties
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use por_engine::batch::{BatchEvaluator, FnDistribution, SamplingRanges, UniformDistribution};
use por_engine::scoring::{self, ScoreSample};
use por_engine::Config;
use proptest::prelude::*;
use quickcheck::quickcheck;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Finite value in a range wide enough to exercise rounding
fn arb_finite() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

/// Mostly-finite value with an occasional NaN
fn arb_maybe_nan() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => -100.0f64..100.0,
        1 => Just(f64::NAN),
    ]
}

/// Valid inclusive range `[min, min + width]`
fn arb_range() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..10.0, 0.0f64..10.0).prop_map(|(min, width)| (min, min + width))
}

fn arb_ranges() -> impl Strategy<Value = SamplingRanges> {
    (arb_range(), arb_range(), arb_range()).prop_map(|(q, s_q, t)| SamplingRanges { q, s_q, t })
}

fn evaluator() -> BatchEvaluator {
    BatchEvaluator::new(&Config::default())
}

fn in_range(value: f64, (min, max): (f64, f64)) -> bool {
    value >= min && value <= max
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Scoring Properties
    // ========================================================================

    /// Property: existence is exactly the product of its inputs
    #[test]
    fn prop_existence_is_exact_product(q in arb_finite(), s_q in arb_finite(), t in arb_finite()) {
        let e = scoring::existence(q, s_q, t).unwrap();
        prop_assert_eq!(e.to_bits(), (q * s_q * t).to_bits());
    }

    /// Property: collapse frequency strictly decreases in t for λ > 0
    #[test]
    fn prop_collapse_frequency_strictly_decreasing(
        lambda in 0.01f64..10.0,
        t in 0.0f64..10.0,
        dt in 0.01f64..10.0
    ) {
        let earlier = scoring::collapse_frequency(lambda, t).unwrap();
        let later = scoring::collapse_frequency(lambda, t + dt).unwrap();
        prop_assert!(later < earlier, "f({}) = {} !< f({}) = {}", t + dt, later, t, earlier);
    }

    /// Property: sigmoid stays within [0, 1] and is 0.5 at 0
    #[test]
    fn prop_sigmoid_bounded(x in -50.0f64..50.0) {
        let y = scoring::sigmoid(x).unwrap();
        prop_assert!((0.0..=1.0).contains(&y));
    }

    /// Property: gravity tensor is symmetric in its arguments
    #[test]
    fn prop_gravity_tensor_symmetric(
        pairs in proptest::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 0..50)
    ) {
        let (a, b): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let ab = scoring::gravity_tensor(&a, &b).unwrap();
        let ba = scoring::gravity_tensor(&b, &a).unwrap();
        prop_assert_eq!(ab.to_bits(), ba.to_bits());
    }

    // ========================================================================
    // Batch Properties
    // ========================================================================

    /// Property: sampling returns exactly n rows, all within their ranges
    #[test]
    fn prop_sample_params_count_and_bounds(
        n in 0usize..300,
        ranges in arb_ranges(),
        seed in any::<u64>()
    ) {
        let mut dist = UniformDistribution::new(Some(seed));
        let samples = evaluator().sample_params(n, ranges, &mut dist).unwrap();

        prop_assert_eq!(samples.len(), n);
        for sample in &samples {
            prop_assert!(in_range(sample.q, ranges.q));
            prop_assert!(in_range(sample.s_q, ranges.s_q));
            prop_assert!(in_range(sample.t, ranges.t));
        }
    }

    /// Property: scalar-only distributions give the same shape guarantees
    #[test]
    fn prop_scalar_fallback_count_and_bounds(n in 0usize..100, ranges in arb_ranges()) {
        let mut lower = FnDistribution(|low: f64, _high: f64| low);
        let samples = evaluator().sample_params(n, ranges, &mut lower).unwrap();

        prop_assert_eq!(samples.len(), n);
        prop_assert!(samples.iter().all(|s| s.q == ranges.q.0 && s.t == ranges.t.0));
    }

    /// Property: run keeps length; a row is missing iff its formula fails
    #[test]
    fn prop_run_isolates_failures(
        rows in proptest::collection::vec((arb_maybe_nan(), arb_maybe_nan(), arb_maybe_nan()), 0..100)
    ) {
        let samples: Vec<ScoreSample> =
            rows.iter().map(|&(q, s_q, t)| ScoreSample::new(q, s_q, t)).collect();
        let results = evaluator().run(&samples, None).unwrap();

        prop_assert_eq!(results.len(), samples.len());
        for (sample, result) in samples.iter().zip(&results) {
            prop_assert_eq!(result.is_none(), sample.existence().is_err());
        }
    }

    /// Property: summary counts partition the results
    #[test]
    fn prop_summary_partitions_results(
        results in proptest::collection::vec(proptest::option::of(0.0f64..2.0), 0..100)
    ) {
        let summary = evaluator().summarize(&results);
        prop_assert_eq!(summary.total, results.len());
        prop_assert!(summary.fired + summary.missing <= summary.total);
        prop_assert_eq!(summary.mean.is_none(), summary.missing == summary.total);
    }
}

// ============================================================================
// QuickCheck Properties
// ============================================================================

quickcheck! {
    /// Bulk and scalar sampling give the same shape and range guarantees
    fn qc_bulk_and_scalar_sampling_agree_on_shape(seed: u64, n: u8) -> bool {
        let n = usize::from(n);
        let ranges = SamplingRanges { q: (0.0, 2.0), s_q: (0.5, 1.0), t: (1.0, 1.0) };
        let ok = |samples: &[ScoreSample]| {
            samples.len() == n
                && samples.iter().all(|s| {
                    in_range(s.q, ranges.q) && in_range(s.s_q, ranges.s_q) && in_range(s.t, ranges.t)
                })
        };

        let bulk = evaluator()
            .sample_params(n, ranges, &mut UniformDistribution::new(Some(seed)))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scalar = FnDistribution(move |low: f64, high: f64| rng.gen_range(low..=high));
        let scalar = evaluator().sample_params(n, ranges, &mut scalar).unwrap();

        ok(&bulk) && ok(&scalar)
    }

    /// Same seed, same table
    fn qc_seeded_sampling_reproducible(seed: u64, n: u8) -> bool {
        let ranges = SamplingRanges::default();
        let a = evaluator()
            .sample_params(usize::from(n), ranges, &mut UniformDistribution::new(Some(seed)))
            .unwrap();
        let b = evaluator()
            .sample_params(usize::from(n), ranges, &mut UniformDistribution::new(Some(seed)))
            .unwrap();
        a == b
    }

    /// A text is PoR-null exactly when no keyword occurs in it
    fn qc_null_iff_no_keyword(text: String) -> bool {
        let keywords = ["semantic", "gravity"];
        let lower = text.to_lowercase();
        let any = keywords.iter().any(|k| lower.contains(k));
        scoring::is_por_null(&text, &keywords) == !any
    }
}
