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

//! An equal-width histogram summarizing a numeric column, and an estimator that answers
//! selectivity questions from it without touching the data.
//!
//! * Six value types: `i16`, `i32`, `i64`, `u16`, `u32`, `u64` and `f64`
//! * `O(log n)` insertion, `O(1)` range and equality estimates
//! * Stable little-endian binary serialization
//! * Merging of histograms that share a bucket layout
//! * `no_std` support (requires `alloc`)
//!
//! # Example
//!
//! ```rust
//! use eq_width_histogram::{EqWidthHistogram, HistogramEstimator, ValueType};
//!
//! let mut hist = EqWidthHistogram::new(5, ValueType::Int32);
//! hist.initialize_buckets(0i32, 10i32); // buckets start at 0, 10, 20, 30, 40
//!
//! for v in &[5i32, 15, 15, 25, 49, 49, 49] {
//!     hist.add_element(&v.to_le_bytes());
//! }
//!
//! let estimator = HistogramEstimator::new(hist.freeze());
//! assert_eq!(estimator.estimate_less_or_equal(25i32), 4);
//! assert_eq!(estimator.estimate_greater(25i32), 3);
//! assert_eq!(estimator.estimate_equal(49i32), 1);
//! assert_eq!(estimator.num_elements(), 7);
//! ```
//!
//! # Building a Histogram
//!
//! [`EqWidthHistogram::new(num_buckets, value_type)`](struct.EqWidthHistogram.html#method.new)
//! allocates empty buckets. [`initialize_buckets(start, end)`](struct.EqWidthHistogram.html#method.initialize_buckets)
//! then makes every bucket `end - start` wide, the first one starting at `start`. Values are
//! recorded one at a time with [`add_element()`](struct.EqWidthHistogram.html#method.add_element)
//! (raw little-endian column bytes) or
//! [`add_element_typed()`](struct.EqWidthHistogram.html#method.add_element_typed).
//!
//! Each bucket covers `[start_i, start_i+1)`. Values below the first start are counted in
//! the first bucket and values past the last start in the last bucket.
//!
//! # Sharing and Estimating
//!
//! A histogram is mutable while it is being built. [`freeze()`](struct.EqWidthHistogram.html#method.freeze)
//! turns it into a [`FrozenHistogram`](struct.FrozenHistogram.html), a cheaply cloneable
//! read-only snapshot. Only a frozen histogram can back a
//! [`HistogramEstimator`](struct.HistogramEstimator.html), so the estimator's cumulative sums
//! can never go stale.
//!
//! # Errors and Panics
//!
//! Problems with external data (malformed serialized bytes, merging histograms with
//! different layouts) are reported as [`HistogramError`](enum.HistogramError.html).
//! Contract violations by the caller (an empty range, a bucket index out of range, asking
//! for `i64` values from an `Int32` histogram) panic.
//!
//! # Serialization Format
//!
//! All integers are little-endian. Every bucket boundary occupies an 8-byte slot whatever
//! the value type; narrower types use the low bytes and leave the rest zero.
//!
//! ```text
//!   +------------+------------------+
//!   | type (u8)  | num_buckets (u64)|                    header, 9 bytes
//!   +------------+------------------+-----------------+
//!   | bucket[0].count (u64)         | bucket[0].start |  16 bytes per bucket
//!   +-------------------------------+-----------------+
//!   |   ...                         |   ...           |
//!   +-------------------------------+-----------------+
//!   | bucket[n-1].count (u64)       | bucket[n-1].start
//!   +-------------------------------+-----------------+
//! ```
//!
//! The total size is always `9 + 16 * num_buckets` bytes. Type tags are listed on
//! [`ValueType`](enum.ValueType.html).

#![no_std]

extern crate alloc;

mod error;
mod estimator;
mod histogram;
mod value;

pub use crate::error::{HistogramError, Result};
pub use crate::estimator::HistogramEstimator;
pub use crate::histogram::{Bucket, EqWidthHistogram, FrozenHistogram, BUCKET_SIZE, HEADER_SIZE};
pub use crate::value::{HistogramValue, Storage, ValueType, BUCKET_STORAGE_SIZE};
