//! serde integration for [`OrderedObject`].

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::object::OrderedObject;
use crate::value::AsJsonValue;

/// Serialized as a map in insertion order.
impl<V: AsJsonValue> Serialize for OrderedObject<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, &value.as_json_value())?;
        }
        map.end()
    }
}

/// Members are inserted in document order. A repeated key keeps the rank of
/// its first occurrence and the value of its last.
impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedObject<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedObjectVisitor(PhantomData))
    }
}

struct OrderedObjectVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedObjectVisitor<V> {
    type Value = OrderedObject<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut obj = OrderedObject::with_size_hint(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            obj.set(key, value);
        }
        Ok(obj)
    }
}
