//! [`AnyValue`] — a value of any encodable type, for heterogeneous objects.

use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::object::OrderedObject;
use crate::value::{AsJsonValue, JsonValue};

/// Shared value of any [`AsJsonValue`] type; the default is JSON `null`.
///
/// Cloning is cheap: clones share the wrapped value, which is never mutated.
///
/// ```
/// use ordered_object::{AnyValue, OrderedObject};
///
/// let mut person: OrderedObject<AnyValue> = OrderedObject::new();
/// person.set("name", AnyValue::new("Ada"));
/// person.set("age", AnyValue::new(36));
/// person.set("email", AnyValue::null());
/// assert_eq!(person.to_json_string().unwrap(), r#"{"name":"Ada","age":36,"email":null}"#);
/// ```
#[derive(Clone, Default)]
pub struct AnyValue(Option<Rc<dyn AsJsonValue>>);

impl AnyValue {
    pub fn new<T: AsJsonValue + 'static>(value: T) -> Self {
        AnyValue(Some(Rc::new(value)))
    }

    pub const fn null() -> Self {
        AnyValue(None)
    }

    /// True for an empty value and for a wrapped value that encodes as `null`.
    pub fn is_null(&self) -> bool {
        self.as_json_value().is_null()
    }
}

impl AsJsonValue for AnyValue {
    fn as_json_value(&self) -> JsonValue<'_> {
        match &self.0 {
            Some(value) => value.as_json_value(),
            None => JsonValue::Null,
        }
    }
}

impl std::fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyValue").field(&self.as_json_value()).finish()
    }
}

impl Serialize for AnyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_json_value().serialize(serializer)
    }
}

/// Objects are read into nested `OrderedObject<AnyValue>`s so their member
/// order survives; every other value is kept as a `serde_json::Value`.
impl<'de> Deserialize<'de> for AnyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(AnyValue::from)
    }
}

impl From<serde_json::Value> for AnyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AnyValue::null(),
            serde_json::Value::Object(map) => AnyValue::new(
                map.into_iter()
                    .map(|(k, v)| (k, AnyValue::from(v)))
                    .collect::<OrderedObject<AnyValue>>(),
            ),
            other => AnyValue::new(other),
        }
    }
}

macro_rules! impl_from_for_any_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AnyValue {
                fn from(value: $ty) -> Self {
                    AnyValue::new(value)
                }
            }
        )*
    };
}

impl_from_for_any_value!(
    &'static str,
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    OrderedObject<AnyValue>,
);
