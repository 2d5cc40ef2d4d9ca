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

use thiserror::Error;

use crate::value::ValueType;

/// Recoverable failures caused by external data: malformed serialized histograms and
/// attempts to merge histograms that don't share a bucket layout.
///
/// Caller contract violations (bad ranges, out-of-range indices, type confusion) panic
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistogramError {
    #[error("serialized histogram is truncated: {len} bytes is shorter than the {header} byte header")]
    Truncated { len: usize, header: usize },

    #[error("unknown histogram value type tag {0}")]
    UnknownValueType(u8),

    #[error("serialized histogram has zero buckets")]
    EmptyHistogram,

    #[error("serialized histogram of {num_buckets} buckets needs {expected} bytes, found {actual}")]
    SizeMismatch {
        num_buckets: u64,
        expected: u64,
        actual: usize,
    },

    #[error("histograms cannot be aggregated: {0}")]
    IncompatibleHistograms(&'static str),

    #[error("operation not supported for {0} histograms")]
    UnsupportedValueType(ValueType),
}

pub type Result<T> = core::result::Result<T, HistogramError>;
