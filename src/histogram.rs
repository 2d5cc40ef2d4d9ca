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

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Deref;
use core::slice;

use log::{debug, trace, warn};

use crate::error::{HistogramError, Result};
use crate::value::{HistogramValue, Storage, ValueType, BUCKET_STORAGE_SIZE};

/// Serialized header size: one byte value type tag followed by a `u64` bucket count.
pub const HEADER_SIZE: usize = 1 + 8;

/// Serialized size of one bucket: a `u64` count followed by the start boundary slot.
pub const BUCKET_SIZE: usize = 8 + BUCKET_STORAGE_SIZE;

/// A bucket holds the `count` of values in `[start, next bucket's start)`.
///
/// The last bucket of a histogram has no upper bound.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    count: u64,
    start: Storage,
}

impl Bucket {
    /// Number of values recorded in this bucket
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Encoded start boundary, little-endian in the low bytes
    #[inline]
    pub fn raw_start(&self) -> &Storage {
        &self.start
    }
}

///
/// An equal-width histogram in its building phase.
///
/// Create one with a bucket count and value type, seed the bucket boundaries with
/// [`initialize_buckets()`](#method.initialize_buckets), then record values with
/// [`add_element()`](#method.add_element). When population is done,
/// [`freeze()`](#method.freeze) it to share it with estimators.
///
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "Vec<u8>", try_from = "Vec<u8>")
)]
pub struct EqWidthHistogram {
    value_type: ValueType,
    buckets: Vec<Bucket>,
}

impl Default for EqWidthHistogram {
    fn default() -> Self {
        EqWidthHistogram::new(1, ValueType::Int32)
    }
}

impl EqWidthHistogram {
    /// Create a histogram of `num_buckets` empty buckets, all starting at zero.
    ///
    /// # Panics
    ///
    /// If `num_buckets` is zero.
    pub fn new(num_buckets: usize, value_type: ValueType) -> Self {
        assert!(num_buckets > 0, "histogram needs at least one bucket");

        EqWidthHistogram {
            value_type,
            buckets: vec![Bucket::default(); num_buckets],
        }
    }

    /// Number of buckets in the histogram
    #[inline]
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// The type of the values this histogram records
    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Number of values recorded in the bucket at `index`.
    ///
    /// # Panics
    ///
    /// If `index >= num_buckets()`.
    pub fn num_elements_in_bucket(&self, index: usize) -> u64 {
        self.check_index(index);
        self.buckets[index].count
    }

    /// Start boundary of the bucket at `index`.
    ///
    /// # Panics
    ///
    /// If `index >= num_buckets()` or `T` is not the histogram's value type.
    pub fn bucket_start_boundary<T: HistogramValue>(&self, index: usize) -> T {
        self.check_type::<T>();
        self.check_index(index);
        T::load(&self.buckets[index].start)
    }

    /// Total number of values recorded across all buckets
    pub fn num_elements(&self) -> u64 {
        self.buckets
            .iter()
            .fold(0u64, |total, b| total.saturating_add(b.count))
    }

    /// Iterate through all buckets in boundary order
    pub fn iter(&self) -> slice::Iter<'_, Bucket> {
        self.buckets.iter()
    }

    /// Seed bucket boundaries so that every bucket is `range_end - range_start` wide,
    /// the first one starting at `range_start`. Counts are left alone.
    ///
    /// # Panics
    ///
    /// If `range_start` is not less than `range_end` or `T` is not the histogram's
    /// value type.
    pub fn initialize_buckets<T: HistogramValue>(&mut self, range_start: T, range_end: T) {
        self.check_type::<T>();
        assert!(
            range_start.cmp_less(range_end),
            "bucket range start {:?} must be less than range end {:?}",
            range_start,
            range_end
        );

        let width = range_end.distance(range_start);
        range_start.store(&mut self.buckets[0].start);

        for i in 1..self.buckets.len() {
            let prev_start = T::load(&self.buckets[i - 1].start);
            prev_start.step(width).store(&mut self.buckets[i].start);
        }

        trace!(
            "seeded {} {} buckets from {:?} with width {:?}",
            self.buckets.len(),
            self.value_type,
            range_start,
            width
        );
    }

    /// Returns the index of the last bucket whose start is not greater than `val`, or `0`
    /// when `val` is below every bucket. The result is always in `[0, num_buckets() - 1]`.
    ///
    /// # Panics
    ///
    /// If `T` is not the histogram's value type.
    pub fn find_bucket_index<T: HistogramValue>(&self, val: T) -> usize {
        self.check_type::<T>();

        let mut start = 0;
        let mut end = self.buckets.len() - 1;

        // Midpoint rounds up, otherwise a two element interval never shrinks
        while start < end {
            let mid = start + (end - start + 1) / 2;
            if val.cmp_less(T::load(&self.buckets[mid].start)) {
                end = mid - 1;
            } else {
                start = mid;
            }
        }

        start
    }

    /// Record a single raw column value, decoded from the low bytes of `data` according to
    /// the histogram's value type.
    ///
    /// # Panics
    ///
    /// If `data` is narrower than the value type, or the histogram's type is
    /// `ValueType::Unsupported`.
    pub fn add_element(&mut self, data: &[u8]) {
        match self.value_type {
            ValueType::Int16 => self.add_element_typed(i16::from_bytes(data)),
            ValueType::Int32 => self.add_element_typed(i32::from_bytes(data)),
            ValueType::Int64 => self.add_element_typed(i64::from_bytes(data)),
            ValueType::Uint16 => self.add_element_typed(u16::from_bytes(data)),
            ValueType::Uint32 => self.add_element_typed(u32::from_bytes(data)),
            ValueType::Uint64 => self.add_element_typed(u64::from_bytes(data)),
            ValueType::Double => self.add_element_typed(f64::from_bytes(data)),
            ValueType::Unsupported => panic!("cannot add elements to an unsupported histogram"),
        }
    }

    /// Record a single value. Bucket counts saturate at `u64::MAX`.
    ///
    /// # Panics
    ///
    /// If `T` is not the histogram's value type.
    pub fn add_element_typed<T: HistogramValue>(&mut self, val: T) {
        let index = self.find_bucket_index(val);
        let bucket_start = T::load(&self.buckets[index].start);

        // A value that is neither equal to nor above the found start (NaN) is counted in
        // the previous bucket, except at index 0.
        let target = if index == 0 || bucket_start.cmp_equal(val) || bucket_start.cmp_less(val)
        {
            index
        } else {
            index - 1
        };

        let count = &mut self.buckets[target].count;
        *count = count.saturating_add(1);
    }

    /// Width shared by every bucket.
    ///
    /// Always `1` for `Double` histograms. A single-bucket histogram reports its start
    /// value, or `1` if the start is not positive.
    ///
    /// # Panics
    ///
    /// If the histogram's type is `ValueType::Unsupported` or `T` is not the histogram's
    /// value type.
    pub fn bucket_width<T: HistogramValue>(&self) -> u64 {
        if self.value_type == ValueType::Unsupported {
            panic!("unsupported histogram type");
        }
        self.check_type::<T>();
        if self.value_type == ValueType::Double {
            return 1;
        }

        if self.buckets.len() == 1 {
            let start = T::load(&self.buckets[0].start);
            if start.is_positive() {
                start.as_u64()
            } else {
                1
            }
        } else {
            let first = T::load(&self.buckets[0].start);
            let second = T::load(&self.buckets[1].start);
            second.distance(first).as_u64()
        }
    }

    /// Add the bucket counts of `other` into this histogram.
    ///
    /// Both histograms must share value type, bucket count, width, and every bucket
    /// boundary. Otherwise an error is returned and `self` is left untouched.
    pub fn aggregate(&mut self, other: &EqWidthHistogram) -> Result<()> {
        let mismatch = match self.value_type {
            ValueType::Int16 => self.bucket_mismatch::<i16>(other),
            ValueType::Int32 => self.bucket_mismatch::<i32>(other),
            ValueType::Int64 => self.bucket_mismatch::<i64>(other),
            ValueType::Uint16 => self.bucket_mismatch::<u16>(other),
            ValueType::Uint32 => self.bucket_mismatch::<u32>(other),
            ValueType::Uint64 => self.bucket_mismatch::<u64>(other),
            ValueType::Double => self.bucket_mismatch::<f64>(other),
            ValueType::Unsupported => {
                warn!("refusing to aggregate unsupported histograms");
                return Err(HistogramError::UnsupportedValueType(self.value_type));
            }
        };

        if let Some(reason) = mismatch {
            warn!("refusing to aggregate {} histograms: {}", self.value_type, reason);
            return Err(HistogramError::IncompatibleHistograms(reason));
        }

        for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            mine.count = mine.count.saturating_add(theirs.count);
        }

        debug!(
            "aggregated {} {} buckets, {} elements total",
            self.buckets.len(),
            self.value_type,
            self.num_elements()
        );
        Ok(())
    }

    /// Serialize to the binary representation described in the crate docs
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::binary_size(self.buckets.len()));

        out.push(self.value_type.tag());
        out.extend_from_slice(&(self.buckets.len() as u64).to_le_bytes());
        for bucket in &self.buckets {
            out.extend_from_slice(&bucket.count.to_le_bytes());
            out.extend_from_slice(&bucket.start);
        }

        out
    }

    /// Rebuild a histogram from the output of [`serialize()`](#method.serialize).
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let result = Self::decode(data);
        if let Err(ref e) = result {
            warn!("rejecting serialized histogram: {}", e);
        }
        result
    }

    /// Serialized size of a histogram with `num_buckets` buckets
    #[inline]
    pub fn binary_size(num_buckets: usize) -> usize {
        HEADER_SIZE + num_buckets * BUCKET_SIZE
    }

    /// Move the histogram into an immutable, shareable snapshot
    pub fn freeze(self) -> FrozenHistogram {
        FrozenHistogram {
            inner: Arc::new(self),
        }
    }

    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(HistogramError::Truncated {
                len: data.len(),
                header: HEADER_SIZE,
            });
        }

        let value_type = ValueType::try_from(data[0])?;
        let num_buckets = read_u64(&data[1..HEADER_SIZE]);
        if num_buckets == 0 {
            return Err(HistogramError::EmptyHistogram);
        }

        let expected = num_buckets
            .checked_mul(BUCKET_SIZE as u64)
            .and_then(|len| len.checked_add(HEADER_SIZE as u64));
        if expected != Some(data.len() as u64) {
            return Err(HistogramError::SizeMismatch {
                num_buckets,
                expected: expected.unwrap_or(u64::MAX),
                actual: data.len(),
            });
        }

        let buckets: Vec<Bucket> = data[HEADER_SIZE..]
            .chunks_exact(BUCKET_SIZE)
            .map(|chunk| {
                let mut start = [0u8; BUCKET_STORAGE_SIZE];
                start.copy_from_slice(&chunk[8..]);
                Bucket {
                    count: read_u64(&chunk[..8]),
                    start,
                }
            })
            .collect();

        debug!("decoded {} {} buckets", buckets.len(), value_type);
        Ok(EqWidthHistogram {
            value_type,
            buckets,
        })
    }

    /// Why `other` can't be merged into `self`, or `None` if the layouts match.
    fn bucket_mismatch<T: HistogramValue>(&self, other: &EqWidthHistogram) -> Option<&'static str> {
        if self.buckets.len() != other.num_buckets() {
            return Some("bucket counts differ");
        }
        if self.value_type != other.value_type() {
            return Some("value types differ");
        }
        if self.bucket_width::<T>() != other.bucket_width::<T>() {
            return Some("bucket widths differ");
        }

        let boundaries_match = (0..self.buckets.len()).all(|i| {
            T::load(&self.buckets[i].start).cmp_equal(other.bucket_start_boundary::<T>(i))
        });
        if !boundaries_match {
            return Some("bucket boundaries differ");
        }

        None
    }

    #[inline]
    fn check_type<T: HistogramValue>(&self) {
        assert_eq!(
            T::VALUE_TYPE,
            self.value_type,
            "value type mismatch: histogram holds {} values",
            self.value_type
        );
    }

    #[inline]
    fn check_index(&self, index: usize) {
        assert!(
            index < self.buckets.len(),
            "bucket index {} out of range for {} buckets",
            index,
            self.buckets.len()
        );
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}

impl TryFrom<&[u8]> for EqWidthHistogram {
    type Error = HistogramError;

    fn try_from(data: &[u8]) -> Result<Self> {
        EqWidthHistogram::deserialize(data)
    }
}

impl TryFrom<Vec<u8>> for EqWidthHistogram {
    type Error = HistogramError;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        EqWidthHistogram::deserialize(&data)
    }
}

impl From<EqWidthHistogram> for Vec<u8> {
    fn from(histogram: EqWidthHistogram) -> Self {
        histogram.serialize()
    }
}

impl<'a> IntoIterator for &'a EqWidthHistogram {
    type Item = &'a Bucket;
    type IntoIter = slice::Iter<'a, Bucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A finished histogram that can no longer be mutated.
///
/// Cloning is cheap and shares the same buckets. All read-only methods of
/// [`EqWidthHistogram`](struct.EqWidthHistogram.html) are available through `Deref`.
#[derive(Debug, Clone)]
pub struct FrozenHistogram {
    inner: Arc<EqWidthHistogram>,
}

impl FrozenHistogram {
    /// Recover the mutable histogram if this is the last handle to it, otherwise hand the
    /// snapshot back.
    pub fn thaw(self) -> core::result::Result<EqWidthHistogram, FrozenHistogram> {
        Arc::try_unwrap(self.inner).map_err(|inner| FrozenHistogram { inner })
    }
}

impl Deref for FrozenHistogram {
    type Target = EqWidthHistogram;

    #[inline]
    fn deref(&self) -> &EqWidthHistogram {
        &self.inner
    }
}

impl From<EqWidthHistogram> for FrozenHistogram {
    fn from(histogram: EqWidthHistogram) -> Self {
        histogram.freeze()
    }
}
