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

//! Value types understood by the histogram and the fixed-width codec used to
//! keep them in bucket storage.

use core::fmt;
use core::mem::size_of;

use crate::error::HistogramError;

/// Size in bytes of the slot holding a bucket's start boundary, for every value type.
pub const BUCKET_STORAGE_SIZE: usize = 8;

/// Raw storage for one encoded value.
pub type Storage = [u8; BUCKET_STORAGE_SIZE];

/// Numeric types a histogram can be built over.
///
/// The discriminant is the tag written by
/// [`serialize()`](struct.EqWidthHistogram.html#method.serialize) and must never change.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Int16 = 0,
    Int32 = 1,
    Int64 = 2,
    Uint16 = 3,
    Uint32 = 4,
    Uint64 = 5,
    Double = 6,
    Unsupported = 7,
}

impl ValueType {
    /// Natural width in bytes of a value of this type.
    ///
    /// # Panics
    ///
    /// If called on `ValueType::Unsupported`.
    pub fn width(self) -> usize {
        match self {
            ValueType::Int16 | ValueType::Uint16 => 2,
            ValueType::Int32 | ValueType::Uint32 => 4,
            ValueType::Int64 | ValueType::Uint64 | ValueType::Double => 8,
            ValueType::Unsupported => panic!("unsupported histogram value type"),
        }
    }

    /// Wire tag of this type.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ValueType {
    type Error = HistogramError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        let value_type = match tag {
            0 => ValueType::Int16,
            1 => ValueType::Int32,
            2 => ValueType::Int64,
            3 => ValueType::Uint16,
            4 => ValueType::Uint32,
            5 => ValueType::Uint64,
            6 => ValueType::Double,
            7 => ValueType::Unsupported,
            _ => return Err(HistogramError::UnknownValueType(tag)),
        };
        Ok(value_type)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int16 => "int16",
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Uint16 => "uint16",
            ValueType::Uint32 => "uint32",
            ValueType::Uint64 => "uint64",
            ValueType::Double => "double",
            ValueType::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

mod private {
    pub trait Sealed {}
}

/// A numeric type that can be stored in histogram buckets.
///
/// Implemented for `i16`, `i32`, `i64`, `u16`, `u32`, `u64` and `f64` only. All values are
/// encoded little-endian into the low bytes of an 8-byte [`Storage`] slot; the remaining
/// high bytes are zero.
pub trait HistogramValue: Copy + PartialOrd + fmt::Debug + private::Sealed {
    /// The `ValueType` tag this Rust type corresponds to.
    const VALUE_TYPE: ValueType;

    /// Decode a value from the low bytes of `storage`.
    fn load(storage: &Storage) -> Self;

    /// Encode `self` into `storage`, zeroing the unused high bytes.
    fn store(self, storage: &mut Storage);

    /// Decode a raw column value from the low bytes of `data`. A full [`Storage`] slot is
    /// accepted for every type.
    ///
    /// # Panics
    ///
    /// If `data` is shorter than the type's natural width.
    fn from_bytes(data: &[u8]) -> Self;

    /// Equality as the histogram sees it. Exact for integers, epsilon-tolerant for `f64`.
    #[inline]
    fn cmp_equal(self, other: Self) -> bool {
        self == other
    }

    #[inline]
    fn cmp_less(self, other: Self) -> bool {
        self < other
    }

    /// `self + width`, wrapping for integer types.
    fn step(self, width: Self) -> Self;

    /// `self - other`, wrapping for integer types.
    fn distance(self, other: Self) -> Self;

    /// `self as u64`.
    fn as_u64(self) -> u64;

    fn is_positive(self) -> bool;
}

macro_rules! impl_integer_value {
    ($($t:ty => $vt:ident),* $(,)?) => {
        $(
            impl private::Sealed for $t {}

            impl HistogramValue for $t {
                const VALUE_TYPE: ValueType = ValueType::$vt;

                #[inline]
                fn load(storage: &Storage) -> Self {
                    let mut bytes = [0u8; size_of::<$t>()];
                    bytes.copy_from_slice(&storage[..size_of::<$t>()]);
                    <$t>::from_le_bytes(bytes)
                }

                #[inline]
                fn store(self, storage: &mut Storage) {
                    *storage = [0u8; BUCKET_STORAGE_SIZE];
                    storage[..size_of::<$t>()].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn from_bytes(data: &[u8]) -> Self {
                    assert!(
                        data.len() >= size_of::<$t>(),
                        "{} value needs at least {} bytes, got {}",
                        ValueType::$vt,
                        size_of::<$t>(),
                        data.len()
                    );
                    let mut bytes = [0u8; size_of::<$t>()];
                    bytes.copy_from_slice(&data[..size_of::<$t>()]);
                    <$t>::from_le_bytes(bytes)
                }

                #[inline]
                fn step(self, width: Self) -> Self {
                    self.wrapping_add(width)
                }

                #[inline]
                fn distance(self, other: Self) -> Self {
                    self.wrapping_sub(other)
                }

                #[inline]
                fn as_u64(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn is_positive(self) -> bool {
                    self > 0
                }
            }
        )*
    };
}

impl_integer_value! {
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
}

impl private::Sealed for f64 {}

impl HistogramValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Double;

    #[inline]
    fn load(storage: &Storage) -> Self {
        f64::from_le_bytes(*storage)
    }

    #[inline]
    fn store(self, storage: &mut Storage) {
        *storage = self.to_le_bytes();
    }

    #[inline]
    fn from_bytes(data: &[u8]) -> Self {
        assert!(
            data.len() >= size_of::<f64>(),
            "double value needs at least 8 bytes, got {}",
            data.len()
        );
        let mut bytes = [0u8; size_of::<f64>()];
        bytes.copy_from_slice(&data[..size_of::<f64>()]);
        f64::from_le_bytes(bytes)
    }

    #[inline]
    fn cmp_equal(self, other: Self) -> bool {
        let diff = if self > other { self - other } else { other - self };
        diff < f64::EPSILON
    }

    #[inline]
    fn step(self, width: Self) -> Self {
        self + width
    }

    #[inline]
    fn distance(self, other: Self) -> Self {
        self - other
    }

    #[inline]
    fn as_u64(self) -> u64 {
        self as u64
    }

    #[inline]
    fn is_positive(self) -> bool {
        self > 0.0
    }
}
