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

use alloc::vec::Vec;
use core::cmp;

use crate::histogram::FrozenHistogram;
use crate::value::HistogramValue;

///
/// Answers range and equality cardinality questions against a frozen histogram in
/// constant time.
///
/// Prefix and suffix sums of the bucket counts are computed once in
/// [`new()`](#method.new). `prefix_sum[i]` covers buckets `0..=i` and `suffix_sum[i]`
/// covers buckets `i..`.
///
#[derive(Debug, Clone)]
pub struct HistogramEstimator {
    histogram: FrozenHistogram,
    prefix_sum: Vec<u64>,
    suffix_sum: Vec<u64>,
}

impl HistogramEstimator {
    pub fn new(histogram: FrozenHistogram) -> Self {
        let prefix_sum = histogram
            .iter()
            .scan(0u64, |total, b| {
                *total = total.saturating_add(b.count());
                Some(*total)
            })
            .collect();

        let mut suffix_sum: Vec<u64> = histogram
            .iter()
            .rev()
            .scan(0u64, |total, b| {
                *total = total.saturating_add(b.count());
                Some(*total)
            })
            .collect();
        suffix_sum.reverse();

        HistogramEstimator {
            histogram,
            prefix_sum,
            suffix_sum,
        }
    }

    /// The histogram this estimator reads from
    #[inline]
    pub fn histogram(&self) -> &FrozenHistogram {
        &self.histogram
    }

    /// Values in the bucket holding `val` and every bucket below it
    pub fn estimate_less_or_equal<T: HistogramValue>(&self, val: T) -> u64 {
        self.prefix_sum[self.histogram.find_bucket_index(val)]
    }

    /// Values in the bucket holding `val` and every bucket above it
    pub fn estimate_greater_or_equal<T: HistogramValue>(&self, val: T) -> u64 {
        self.suffix_sum[self.histogram.find_bucket_index(val)]
    }

    /// Values in the buckets below the one holding `val`. In the first bucket this is the
    /// same as [`estimate_less_or_equal()`](#method.estimate_less_or_equal).
    pub fn estimate_less<T: HistogramValue>(&self, val: T) -> u64 {
        let index = self.histogram.find_bucket_index(val);
        match index {
            0 => self.prefix_sum[0],
            _ => self.prefix_sum[index - 1],
        }
    }

    /// Values in the buckets above the one holding `val`. In the last bucket this is the
    /// same as [`estimate_greater_or_equal()`](#method.estimate_greater_or_equal).
    ///
    /// Unlike [`estimate_less()`](#method.estimate_less), the first bucket is not special:
    /// a `val` in bucket 0 still excludes that bucket and reports buckets `1..`.
    pub fn estimate_greater<T: HistogramValue>(&self, val: T) -> u64 {
        let index = self.histogram.find_bucket_index(val);
        let last = self.suffix_sum.len() - 1;
        if index == last {
            self.suffix_sum[last]
        } else {
            self.suffix_sum[index + 1]
        }
    }

    /// Values equal to `val`, assuming values are spread uniformly across their bucket.
    /// Never less than `1`.
    pub fn estimate_equal<T: HistogramValue>(&self, val: T) -> u64 {
        let index = self.histogram.find_bucket_index(val);
        let count = self.histogram.num_elements_in_bucket(index);
        // An unseeded histogram has zero width
        let width = cmp::max(1, self.histogram.bucket_width::<T>());
        cmp::max(1, count / width)
    }

    /// Total number of values in the histogram, useful to rescale estimates against a
    /// known row count.
    #[inline]
    pub fn num_elements(&self) -> u64 {
        self.prefix_sum.last().copied().unwrap_or(0)
    }
}
