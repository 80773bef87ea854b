// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Attribute identifiers, type tags, and the tagged value container.
//!
//! Locally an attribute value is the closed sum type [`AttrValue`]; on the
//! wire it travels as [`AttrValueMsg`], a record with one optional field per
//! value shape. Both are generated from a single table so the mapping between
//! them (and the [`AttrType`] tag selecting an arm) lives in one place.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::wire_enum;

/// Fixed attribute identifier understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(pub u32);

impl AttributeId {
    /// No attribute.
    pub const A_UNKNOWN: Self = Self(0);
    /// Primary value of a value node.
    pub const A_VALUE: Self = Self(1);
    /// File path of a file-backed item.
    pub const A_FILENAME: Self = Self(2);
    /// Reload trigger for file-backed items.
    pub const A_RELOAD: Self = Self(3);
    /// Enabled flag.
    pub const A_ENABLED: Self = Self(4);
    /// Item position in its graph editor.
    pub const A_POSITION: Self = Self(5);
    /// Transform matrix.
    pub const A_TRANSFORM: Self = Self(6);
    /// Image resolution.
    pub const A_RESOLUTION: Self = Self(7);
    /// Colour value.
    pub const A_COLOR: Self = Self(8);
    /// Raw data buffer.
    pub const A_BUFFER: Self = Self(9);
    /// Element count or size.
    pub const A_SIZE: Self = Self(10);
    /// Current time.
    pub const A_TIME: Self = Self(11);
    /// Script source.
    pub const A_SCRIPT: Self = Self(12);
    /// Label list.
    pub const A_LABELS: Self = Self(13);
}

wire_enum! {
    /// Declared type of an attribute value.
    ///
    /// Scalar tags are below 100; array tags are the scalar tag plus 100.
    pub enum AttrType {
        /// `bool`.
        Bool = 1,
        /// `i32`.
        Int = 2,
        /// Two `i32` components.
        Int2 = 3,
        /// Three `i32` components.
        Int3 = 4,
        /// Four `i32` components.
        Int4 = 5,
        /// `i64`.
        Long = 6,
        /// Two `i64` components.
        Long2 = 7,
        /// `f32`.
        Float = 8,
        /// Two `f32` components.
        Float2 = 9,
        /// Three `f32` components.
        Float3 = 10,
        /// Four `f32` components.
        Float4 = 11,
        /// 4×4 `f32` matrix.
        Matrix = 12,
        /// UTF-8 string.
        String = 13,
        /// Raw byte blob.
        ByteArray = 14,
        /// Array of `bool`.
        BoolArray = 101,
        /// Array of `i32`.
        IntArray = 102,
        /// Array of [`Int2`].
        Int2Array = 103,
        /// Array of [`Int3`].
        Int3Array = 104,
        /// Array of [`Int4`].
        Int4Array = 105,
        /// Array of `i64`.
        LongArray = 106,
        /// Array of [`Long2`].
        Long2Array = 107,
        /// Array of `f32`.
        FloatArray = 108,
        /// Array of [`Float2`].
        Float2Array = 109,
        /// Array of [`Float3`].
        Float3Array = 110,
        /// Array of [`Float4`].
        Float4Array = 111,
        /// Array of [`Matrix`].
        MatrixArray = 112,
        /// Array of strings.
        StringArray = 113,
    }
}

impl AttrType {
    /// True for the array-flavoured tags.
    pub fn is_array(self) -> bool {
        u32::from(self) > 100
    }

    /// Array tag for a scalar tag (`None` for arrays and byte blobs).
    pub fn array_of(self) -> Option<AttrType> {
        if self.is_array() {
            return None;
        }
        AttrType::try_from(u32::from(self) + 100).ok()
    }

    /// Scalar tag for an array tag; scalars map to themselves.
    pub fn element(self) -> AttrType {
        if self.is_array() {
            AttrType::try_from(u32::from(self) - 100).unwrap_or(self)
        } else {
            self
        }
    }
}

/// Two `i32` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Int2 {
    /// X component.
    pub x: i32,
    /// Y component.
    pub y: i32,
}

/// Three `i32` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Int3 {
    /// X component.
    pub x: i32,
    /// Y component.
    pub y: i32,
    /// Z component.
    pub z: i32,
}

/// Four `i32` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Int4 {
    /// X component.
    pub x: i32,
    /// Y component.
    pub y: i32,
    /// Z component.
    pub z: i32,
    /// W component.
    pub w: i32,
}

/// Two `i64` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Long2 {
    /// X component.
    pub x: i64,
    /// Y component.
    pub y: i64,
}

/// Two `f32` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Float2 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

/// Three `f32` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Float3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

/// Four `f32` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Float4 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W component.
    pub w: f32,
}

/// Row-major 4×4 matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Rows, each holding four columns.
    pub m: [[f32; 4]; 4],
}

impl Matrix {
    /// Identity matrix.
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { m }
    }
}

/// Repeated field wrapper used by the array arms of [`AttrValueMsg`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayMsg<T> {
    /// Elements.
    pub data: Vec<T>,
}

/// Raw byte field used by the byte-array arm of [`AttrValueMsg`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteArrayMsg {
    /// Bytes.
    pub data: Bytes,
}

// One row per value shape: variant(element type) => wire field.
macro_rules! attr_values {
    (
        scalars { $($s:ident($sty:ty) => $sfield:ident),+ $(,)? }
        bytes { $b:ident => $bfield:ident }
        arrays { $($a:ident($aty:ty) => $afield:ident),+ $(,)? }
    ) => {
        /// Attribute value of any supported shape.
        #[derive(Debug, Clone, PartialEq)]
        pub enum AttrValue {
            $(
                #[doc = concat!("`", stringify!($s), "` value.")]
                $s($sty),
            )+
            /// Raw byte blob.
            $b(Bytes),
            $(
                #[doc = concat!("`", stringify!($a), "` value.")]
                $a(Vec<$aty>),
            )+
        }

        impl AttrValue {
            /// Type tag of this value.
            pub fn attr_type(&self) -> AttrType {
                match self {
                    $( AttrValue::$s(_) => AttrType::$s, )+
                    AttrValue::$b(_) => AttrType::$b,
                    $( AttrValue::$a(_) => AttrType::$a, )+
                }
            }

            /// Element count for array and byte values, `None` for scalars.
            pub fn array_len(&self) -> Option<usize> {
                match self {
                    $( AttrValue::$s(_) => None, )+
                    AttrValue::$b(data) => Some(data.len()),
                    $( AttrValue::$a(data) => Some(data.len()), )+
                }
            }
        }

        /// Wire container: exactly one field is populated per message.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct AttrValueMsg {
            $(
                #[doc = concat!("Populated for [`AttrType::", stringify!($s), "`].")]
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $sfield: Option<$sty>,
            )+
            /// Populated for [`AttrType::ByteArray`].
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub $bfield: Option<ByteArrayMsg>,
            $(
                #[doc = concat!("Populated for [`AttrType::", stringify!($a), "`].")]
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $afield: Option<ArrayMsg<$aty>>,
            )+
        }

        impl From<AttrValue> for AttrValueMsg {
            fn from(value: AttrValue) -> Self {
                let mut msg = AttrValueMsg::default();
                match value {
                    $( AttrValue::$s(v) => msg.$sfield = Some(v), )+
                    AttrValue::$b(data) => msg.$bfield = Some(ByteArrayMsg { data }),
                    $( AttrValue::$a(data) => msg.$afield = Some(ArrayMsg { data }), )+
                }
                msg
            }
        }

        impl AttrValueMsg {
            /// Read the arm selected by `expected`; `None` when that arm is empty.
            pub fn take(self, expected: AttrType) -> Option<AttrValue> {
                match expected {
                    $( AttrType::$s => self.$sfield.map(AttrValue::$s), )+
                    AttrType::$b => self.$bfield.map(|b| AttrValue::$b(b.data)),
                    $( AttrType::$a => self.$afield.map(|a| AttrValue::$a(a.data)), )+
                }
            }

            /// Tag of the first populated arm.
            pub fn populated(&self) -> Option<AttrType> {
                $( if self.$sfield.is_some() { return Some(AttrType::$s); } )+
                if self.$bfield.is_some() {
                    return Some(AttrType::$b);
                }
                $( if self.$afield.is_some() { return Some(AttrType::$a); } )+
                None
            }
        }
    };
}

attr_values! {
    scalars {
        Bool(bool) => bool_value,
        Int(i32) => int_value,
        Int2(Int2) => int2_value,
        Int3(Int3) => int3_value,
        Int4(Int4) => int4_value,
        Long(i64) => long_value,
        Long2(Long2) => long2_value,
        Float(f32) => float_value,
        Float2(Float2) => float2_value,
        Float3(Float3) => float3_value,
        Float4(Float4) => float4_value,
        Matrix(Matrix) => matrix_value,
        String(String) => string_value,
    }
    bytes { ByteArray => byte_array }
    arrays {
        BoolArray(bool) => bool_array,
        IntArray(i32) => int_array,
        Int2Array(Int2) => int2_array,
        Int3Array(Int3) => int3_array,
        Int4Array(Int4) => int4_array,
        LongArray(i64) => long_array,
        Long2Array(Long2) => long2_array,
        FloatArray(f32) => float_array,
        Float2Array(Float2) => float2_array,
        Float3Array(Float3) => float3_array,
        Float4Array(Float4) => float4_array,
        MatrixArray(Matrix) => matrix_array,
        StringArray(String) => string_array,
    }
}

impl AttrValueMsg {
    /// Convert the single populated arm back into a value.
    pub fn into_value(self) -> Option<AttrValue> {
        let ty = self.populated()?;
        self.take(ty)
    }
}

/// Rust types that map onto exactly one attribute type tag.
pub trait AttrKind: Sized {
    /// Tag requested from / sent to the host.
    const TYPE: AttrType;
    /// Wrap into the tagged value.
    fn into_value(self) -> AttrValue;
    /// Unwrap from the tagged value; `None` on a different arm.
    fn from_value(value: AttrValue) -> Option<Self>;
}

/// Scalar kinds that also have an array form (and can therefore be animated).
pub trait AttrScalar: AttrKind {
    /// Tag of the array form.
    const ARRAY_TYPE: AttrType;
    /// Wrap a slice of scalars into the array arm.
    fn into_array(values: Vec<Self>) -> AttrValue;
    /// Unwrap the array arm.
    fn from_array(value: AttrValue) -> Option<Vec<Self>>;
}

macro_rules! scalar_kinds {
    ($($ty:ty => $s:ident, $a:ident;)+) => {
        $(
            impl AttrKind for $ty {
                const TYPE: AttrType = AttrType::$s;

                fn into_value(self) -> AttrValue {
                    AttrValue::$s(self)
                }

                fn from_value(value: AttrValue) -> Option<Self> {
                    match value {
                        AttrValue::$s(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl AttrScalar for $ty {
                const ARRAY_TYPE: AttrType = AttrType::$a;

                fn into_array(values: Vec<Self>) -> AttrValue {
                    AttrValue::$a(values)
                }

                fn from_array(value: AttrValue) -> Option<Vec<Self>> {
                    match value {
                        AttrValue::$a(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )+
    };
}

scalar_kinds! {
    bool => Bool, BoolArray;
    i32 => Int, IntArray;
    Int2 => Int2, Int2Array;
    Int3 => Int3, Int3Array;
    Int4 => Int4, Int4Array;
    i64 => Long, LongArray;
    Long2 => Long2, Long2Array;
    f32 => Float, FloatArray;
    Float2 => Float2, Float2Array;
    Float3 => Float3, Float3Array;
    Float4 => Float4, Float4Array;
    Matrix => Matrix, MatrixArray;
    String => String, StringArray;
}

impl AttrKind for Bytes {
    const TYPE: AttrType = AttrType::ByteArray;

    fn into_value(self) -> AttrValue {
        AttrValue::ByteArray(self)
    }

    fn from_value(value: AttrValue) -> Option<Self> {
        match value {
            AttrValue::ByteArray(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: AttrScalar> AttrKind for Vec<T> {
    const TYPE: AttrType = T::ARRAY_TYPE;

    fn into_value(self) -> AttrValue {
        T::into_array(self)
    }

    fn from_value(value: AttrValue) -> Option<Self> {
        T::from_array(value)
    }
}

/// Sample times of an animated attribute.
///
/// The values array of an animation holds `sample_count() * n` elements, `n`
/// values per sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSampling {
    /// Sample times, ascending.
    pub pattern: Vec<f32>,
    /// End of the animated range.
    pub end_time: f32,
}

impl TimeSampling {
    /// Sampling with explicit times.
    pub fn new(pattern: Vec<f32>, end_time: f32) -> Self {
        Self { pattern, end_time }
    }

    /// `count` samples spaced `period` apart starting at zero.
    pub fn regular(period: f32, count: usize) -> Self {
        let pattern = (0..count).map(|i| i as f32 * period).collect();
        Self {
            pattern,
            end_time: count as f32 * period,
        }
    }

    /// Number of samples.
    pub fn sample_count(&self) -> usize {
        self.pattern.len()
    }

    /// True when there are no samples (the attribute is not animated).
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Values per sample for `value_count` values, or `None` if the lengths
    /// do not line up.
    pub fn values_per_sample(&self, value_count: usize) -> Option<usize> {
        let samples = self.sample_count();
        if samples == 0 {
            return (value_count == 0).then_some(0);
        }
        if value_count < samples || value_count % samples != 0 {
            return None;
        }
        Some(value_count / samples)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn array_tags_pair_with_scalars() {
        assert_eq!(AttrType::Float.array_of(), Some(AttrType::FloatArray));
        assert_eq!(AttrType::FloatArray.element(), AttrType::Float);
        assert_eq!(AttrType::ByteArray.array_of(), None);
        assert_eq!(AttrType::StringArray.array_of(), None);
        assert!(AttrType::MatrixArray.is_array());
        assert!(!AttrType::Matrix.is_array());
    }

    #[test]
    fn every_value_populates_exactly_its_own_arm() {
        let samples = vec![
            AttrValue::Bool(true),
            AttrValue::Int2(Int2 { x: 1, y: -2 }),
            AttrValue::Matrix(Matrix::identity()),
            AttrValue::ByteArray(Bytes::from_static(b"\x00\x01")),
            AttrValue::StringArray(vec!["a".into(), "b".into()]),
            AttrValue::Long2Array(vec![Long2 { x: i64::MAX, y: 3 }]),
        ];
        for value in samples {
            let ty = value.attr_type();
            let msg = AttrValueMsg::from(value.clone());
            assert_eq!(msg.populated(), Some(ty));
            assert_eq!(msg.take(ty), Some(value));
        }
    }

    #[test]
    fn take_on_wrong_arm_is_none() {
        let msg = AttrValueMsg::from(AttrValue::Float(1.5));
        assert_eq!(msg.clone().take(AttrType::Int), None);
        assert_eq!(msg.take(AttrType::Float), Some(AttrValue::Float(1.5)));
        assert_eq!(AttrValueMsg::default().into_value(), None);
    }

    #[test]
    fn kinds_route_vectors_to_array_arms() {
        assert_eq!(<Vec<f32> as AttrKind>::TYPE, AttrType::FloatArray);
        assert_eq!(<Bytes as AttrKind>::TYPE, AttrType::ByteArray);
        let v = vec![Float3 {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        }]
        .into_value();
        assert_eq!(v.attr_type(), AttrType::Float3Array);
        assert_eq!(v.array_len(), Some(1));
        assert_eq!(i32::from_value(AttrValue::Int(4)), Some(4));
        assert_eq!(i32::from_value(AttrValue::Long(4)), None);
    }

    #[test]
    fn sampling_length_rules() {
        let two = TimeSampling::regular(0.5, 2);
        assert_eq!(two.pattern, vec![0.0, 0.5]);
        assert_eq!(two.end_time, 1.0);
        assert_eq!(two.values_per_sample(2), Some(1));
        assert_eq!(two.values_per_sample(6), Some(3));
        assert_eq!(two.values_per_sample(3), None);
        assert_eq!(two.values_per_sample(0), None);

        let empty = TimeSampling::default();
        assert!(empty.is_empty());
        assert_eq!(empty.values_per_sample(0), Some(0));
        assert_eq!(empty.values_per_sample(1), None);
    }
}
