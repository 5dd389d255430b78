//! [`JsonValue`] — the closed set of value kinds the encoder dispatches on.
//!
//! Every type stored in an [`OrderedObject`](crate::OrderedObject) implements
//! [`AsJsonValue`] and hands the encoder one of these variants. Primitives are
//! written directly; a [`MarshalJson`] value supplies its own bytes; anything
//! else goes through serde as [`JsonValue::Structural`].

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use ordered_object_buffers::Writer;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::config::JsonConfig;
use crate::error::EncodeError;
use crate::stream::HtmlSafeFormatter;

/// A value ready to be written as JSON.
///
/// Variants are matched in declaration order by
/// [`JsonStream::write_value`](crate::JsonStream::write_value). A type that
/// has its own encoding must return [`JsonValue::Marshaler`] from
/// [`AsJsonValue::as_json_value`] even when it also looks like a number or a
/// string: the variant a type picks is what decides its encoding.
#[derive(Clone, Copy)]
pub enum JsonValue<'a> {
    Null,
    Str(&'a str),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    /// Self-describing value; its bytes are spliced in verbatim.
    Marshaler(&'a dyn MarshalJson),
    /// Anything serde can encode (arrays, maps, structs, ...).
    Structural(&'a dyn SerializeJson),
}

impl std::fmt::Debug for JsonValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonValue::Null => f.write_str("Null"),
            JsonValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            JsonValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            JsonValue::I8(v) => f.debug_tuple("I8").field(v).finish(),
            JsonValue::I16(v) => f.debug_tuple("I16").field(v).finish(),
            JsonValue::I32(v) => f.debug_tuple("I32").field(v).finish(),
            JsonValue::I64(v) => f.debug_tuple("I64").field(v).finish(),
            JsonValue::Isize(v) => f.debug_tuple("Isize").field(v).finish(),
            JsonValue::U8(v) => f.debug_tuple("U8").field(v).finish(),
            JsonValue::U16(v) => f.debug_tuple("U16").field(v).finish(),
            JsonValue::U32(v) => f.debug_tuple("U32").field(v).finish(),
            JsonValue::U64(v) => f.debug_tuple("U64").field(v).finish(),
            JsonValue::Usize(v) => f.debug_tuple("Usize").field(v).finish(),
            JsonValue::F32(v) => f.debug_tuple("F32").field(v).finish(),
            JsonValue::F64(v) => f.debug_tuple("F64").field(v).finish(),
            JsonValue::Marshaler(_) => f.write_str("Marshaler(..)"),
            JsonValue::Structural(_) => f.write_str("Structural(..)"),
        }
    }
}

impl JsonValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }
}

/// Bridges any value into serde, so a [`JsonValue`] can sit inside a
/// structure encoded by another serde serializer.
impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            JsonValue::Null => serializer.serialize_unit(),
            JsonValue::Str(s) => serializer.serialize_str(s),
            JsonValue::Bool(b) => serializer.serialize_bool(b),
            JsonValue::I8(v) => serializer.serialize_i8(v),
            JsonValue::I16(v) => serializer.serialize_i16(v),
            JsonValue::I32(v) => serializer.serialize_i32(v),
            JsonValue::I64(v) => serializer.serialize_i64(v),
            JsonValue::Isize(v) => serializer.serialize_i64(v as i64),
            JsonValue::U8(v) => serializer.serialize_u8(v),
            JsonValue::U16(v) => serializer.serialize_u16(v),
            JsonValue::U32(v) => serializer.serialize_u32(v),
            JsonValue::U64(v) => serializer.serialize_u64(v),
            JsonValue::Usize(v) => serializer.serialize_u64(v as u64),
            JsonValue::F32(v) if v.is_finite() => serializer.serialize_f32(v),
            JsonValue::F64(v) if v.is_finite() => serializer.serialize_f64(v),
            JsonValue::F32(v) => {
                let err = EncodeError::UnsupportedFloat(f64::from(v));
                Err(S::Error::custom(err))
            }
            JsonValue::F64(v) => Err(S::Error::custom(EncodeError::UnsupportedFloat(v))),
            JsonValue::Marshaler(m) => {
                let data = m.marshal_json().map_err(S::Error::custom)?;
                let parsed: serde_json::Value =
                    serde_json::from_slice(&data).map_err(S::Error::custom)?;
                parsed.serialize(serializer)
            }
            JsonValue::Structural(v) => v
                .to_json_value()
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

/// A value that produces its own JSON encoding.
///
/// The returned bytes are written to the output unchanged and must form a
/// single valid JSON value. An error aborts the whole enclosing
/// serialization.
pub trait MarshalJson {
    fn marshal_json(&self) -> Result<Vec<u8>, EncodeError>;

    /// Encodes with the settings of the stream the value is written into.
    ///
    /// Values that nest other values (an ordered object inside another one)
    /// override this so the enclosing config reaches every level. The default
    /// ignores `config`.
    fn marshal_json_with(&self, config: &JsonConfig) -> Result<Vec<u8>, EncodeError> {
        let _ = config;
        self.marshal_json()
    }
}

/// Structural encoding through serde. Implemented for every
/// [`Serialize`] type.
pub trait SerializeJson {
    /// Encodes `self` into `out`, escaping HTML characters when asked.
    fn write_json(&self, out: &mut Writer, escape_html: bool) -> Result<(), serde_json::Error>;

    fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<T: Serialize + ?Sized> SerializeJson for T {
    fn write_json(&self, out: &mut Writer, escape_html: bool) -> Result<(), serde_json::Error> {
        if escape_html {
            let mut ser = serde_json::Serializer::with_formatter(out, HtmlSafeFormatter);
            self.serialize(&mut ser)
        } else {
            serde_json::to_writer(out, self)
        }
    }

    fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Maps a value onto the [`JsonValue`] kind it is encoded as.
pub trait AsJsonValue {
    fn as_json_value(&self) -> JsonValue<'_>;
}

macro_rules! impl_as_json_value_for_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl AsJsonValue for $ty {
                #[inline]
                fn as_json_value(&self) -> JsonValue<'_> {
                    JsonValue::$variant(*self)
                }
            }
        )*
    };
}

impl_as_json_value_for_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

impl AsJsonValue for () {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Null
    }
}

impl AsJsonValue for str {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Str(self)
    }
}

impl AsJsonValue for String {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Str(self)
    }
}

impl<T: AsJsonValue> AsJsonValue for Option<T> {
    fn as_json_value(&self) -> JsonValue<'_> {
        match self {
            Some(v) => v.as_json_value(),
            None => JsonValue::Null,
        }
    }
}

impl<T: AsJsonValue + ?Sized> AsJsonValue for &T {
    fn as_json_value(&self) -> JsonValue<'_> {
        (**self).as_json_value()
    }
}

impl<T: AsJsonValue + ?Sized> AsJsonValue for Box<T> {
    fn as_json_value(&self) -> JsonValue<'_> {
        (**self).as_json_value()
    }
}

impl<T: AsJsonValue + ?Sized> AsJsonValue for Rc<T> {
    fn as_json_value(&self) -> JsonValue<'_> {
        (**self).as_json_value()
    }
}

impl<T: AsJsonValue + ?Sized> AsJsonValue for Arc<T> {
    fn as_json_value(&self) -> JsonValue<'_> {
        (**self).as_json_value()
    }
}

impl<T: Serialize> AsJsonValue for Vec<T> {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Structural(self)
    }
}

impl<K, V, S> AsJsonValue for HashMap<K, V, S>
where
    K: Serialize + Eq + Hash,
    V: Serialize,
    S: BuildHasher,
{
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Structural(self)
    }
}

impl<K: Serialize, V: Serialize> AsJsonValue for BTreeMap<K, V> {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Structural(self)
    }
}

impl AsJsonValue for serde_json::Map<String, serde_json::Value> {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Structural(self)
    }
}

impl AsJsonValue for serde_json::Value {
    fn as_json_value(&self) -> JsonValue<'_> {
        match self {
            serde_json::Value::Null => JsonValue::Null,
            serde_json::Value::Bool(b) => JsonValue::Bool(*b),
            serde_json::Value::String(s) => JsonValue::Str(s),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    JsonValue::I64(i)
                } else if let Some(u) = n.as_u64() {
                    JsonValue::U64(u)
                } else if let Some(f) = n.as_f64() {
                    JsonValue::F64(f)
                } else {
                    JsonValue::Structural(n)
                }
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                JsonValue::Structural(self)
            }
        }
    }
}
