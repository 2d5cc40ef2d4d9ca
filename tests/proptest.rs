// Copyright 2019 int08h LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property-based tests for bucket lookup, estimation, merging and serialization.

use proptest::collection::vec as prop_vec;
use proptest::prelude::*;

use eq_width_histogram::{EqWidthHistogram, HistogramEstimator, ValueType};

// =============================================================================
// Generators
// =============================================================================

/// An `Int64` histogram seeded with a random layout and filled with `values`.
fn arb_int64_histogram() -> impl Strategy<Value = (EqWidthHistogram, Vec<i64>)> {
    (
        1usize..64,
        -1_000_000i64..1_000_000,
        1i64..10_000,
        prop_vec(-2_000_000i64..2_000_000, 0..200),
    )
        .prop_map(|(num_buckets, start, width, values)| {
            let mut hist = EqWidthHistogram::new(num_buckets, ValueType::Int64);
            hist.initialize_buckets(start, start + width);
            for v in &values {
                hist.add_element(&v.to_le_bytes());
            }
            (hist, values)
        })
}

fn arb_double_histogram() -> impl Strategy<Value = EqWidthHistogram> {
    (
        1usize..32,
        -1e6f64..1e6,
        0.5f64..1e3,
        prop_vec(-1e7f64..1e7, 0..100),
    )
        .prop_map(|(num_buckets, start, width, values)| {
            let mut hist = EqWidthHistogram::new(num_buckets, ValueType::Double);
            hist.initialize_buckets(start, start + width);
            for v in values {
                hist.add_element_typed(v);
            }
            hist
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn serialization_round_trips((hist, _) in arb_int64_histogram()) {
        let bytes = hist.serialize();
        prop_assert_eq!(bytes.len(), EqWidthHistogram::binary_size(hist.num_buckets()));

        let copy = EqWidthHistogram::deserialize(&bytes).unwrap();
        prop_assert_eq!(copy.value_type(), hist.value_type());
        prop_assert_eq!(copy.num_buckets(), hist.num_buckets());
        for i in 0..hist.num_buckets() {
            prop_assert_eq!(copy.num_elements_in_bucket(i), hist.num_elements_in_bucket(i));
            prop_assert_eq!(
                copy.bucket_start_boundary::<i64>(i),
                hist.bucket_start_boundary::<i64>(i)
            );
        }
    }

    #[test]
    fn double_serialization_round_trips(hist in arb_double_histogram()) {
        let copy = EqWidthHistogram::deserialize(&hist.serialize()).unwrap();
        prop_assert_eq!(copy, hist);
    }

    #[test]
    fn lookup_is_monotonic_and_in_range(
        (hist, _) in arb_int64_histogram(),
        a in any::<i64>(),
        b in any::<i64>(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo_idx = hist.find_bucket_index(lo);
        let hi_idx = hist.find_bucket_index(hi);

        prop_assert!(lo_idx <= hi_idx);
        prop_assert!(hi_idx < hist.num_buckets());
        prop_assert_eq!(hist.find_bucket_index(i64::MIN), 0);
        prop_assert_eq!(hist.find_bucket_index(i64::MAX), hist.num_buckets() - 1);
    }

    #[test]
    fn lookup_finds_last_start_not_above_value((hist, values) in arb_int64_histogram()) {
        for v in values {
            let idx = hist.find_bucket_index(v);
            if idx > 0 {
                prop_assert!(hist.bucket_start_boundary::<i64>(idx) <= v);
            }
            if idx + 1 < hist.num_buckets() {
                prop_assert!(hist.bucket_start_boundary::<i64>(idx + 1) > v);
            }
        }
    }

    #[test]
    fn every_element_is_counted((hist, values) in arb_int64_histogram()) {
        prop_assert_eq!(hist.num_elements(), values.len() as u64);

        let estimator = HistogramEstimator::new(hist.freeze());
        prop_assert_eq!(estimator.num_elements(), values.len() as u64);
    }

    #[test]
    fn cumulative_sums_are_consistent((hist, _) in arb_int64_histogram()) {
        let total = hist.num_elements();
        let layout: Vec<(i64, u64)> = (0..hist.num_buckets())
            .map(|i| (hist.bucket_start_boundary::<i64>(i), hist.num_elements_in_bucket(i)))
            .collect();

        let estimator = HistogramEstimator::new(hist.freeze());
        for (start, count) in layout {
            let le = estimator.estimate_less_or_equal(start);
            let ge = estimator.estimate_greater_or_equal(start);
            prop_assert_eq!(le + ge, total + count);
            prop_assert!(estimator.estimate_less(start) <= le);
            prop_assert!(estimator.estimate_greater(start) <= ge);
            prop_assert!(estimator.estimate_equal(start) >= 1);
        }
    }

    #[test]
    fn aggregate_with_copy_doubles_counts((hist, _) in arb_int64_histogram()) {
        let mut merged = hist.clone();
        merged.aggregate(&hist).unwrap();

        for i in 0..hist.num_buckets() {
            prop_assert_eq!(merged.num_elements_in_bucket(i), 2 * hist.num_elements_in_bucket(i));
            prop_assert_eq!(
                merged.bucket_start_boundary::<i64>(i),
                hist.bucket_start_boundary::<i64>(i)
            );
        }
    }

    #[test]
    fn aggregate_failure_leaves_histogram_untouched(
        (hist, _) in arb_int64_histogram(),
        extra in 1usize..8,
    ) {
        let mut target = hist.clone();
        let other = EqWidthHistogram::new(hist.num_buckets() + extra, ValueType::Int64);

        prop_assert!(target.aggregate(&other).is_err());
        prop_assert_eq!(target, hist);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop_vec(any::<u8>(), 0..128)) {
        if let Ok(hist) = EqWidthHistogram::deserialize(&bytes) {
            prop_assert_eq!(hist.serialize(), bytes);
        }
    }
}
