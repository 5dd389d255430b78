use std::collections::HashMap;

use ordered_object::{
    AnyValue, AsJsonValue, EncodeError, JsonConfig, JsonValue, MarshalJson, OrderedObject,
};
use pretty_assertions::assert_eq;
use serde::Serialize;

fn marshal<V: AsJsonValue>(obj: &OrderedObject<V>) -> String {
    String::from_utf8(obj.marshal_json().expect("marshal_json")).expect("utf-8")
}

fn round_trip_len(json: &str) -> usize {
    let generic: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).expect("output parses as a JSON object");
    generic.len()
}

#[test]
fn set_get_has_delete_order() {
    let mut obj = OrderedObject::with_capacity(3);
    obj.set("a", 1);
    obj.set("b", 2);
    obj.set("a", 3);

    assert!(obj.has("a"));
    assert!(obj.has("b"));
    assert_eq!(obj.get("a"), 3);

    obj.delete("a");
    assert!(!obj.has("a"));
    assert_eq!(obj.get("a"), 0);

    obj.set("c", 4);
    obj.set("d", 5);
    assert_eq!(marshal(&obj), r#"{"b":2,"c":4,"d":5}"#);
}

#[test]
fn distinct_keys_serialize_in_insertion_order() {
    let mut obj = OrderedObject::new();
    for (i, key) in ["zeta", "alpha", "mid", "0", "_"].iter().enumerate() {
        obj.set(*key, i);
    }
    assert_eq!(marshal(&obj), r#"{"zeta":0,"alpha":1,"mid":2,"0":3,"_":4}"#);
}

#[test]
fn update_in_place_keeps_rank() {
    let mut obj = OrderedObject::new();
    obj.set("k", "v1");
    obj.set("k", "v2");
    obj.set("k2", "x");
    assert_eq!(marshal(&obj), r#"{"k":"v2","k2":"x"}"#);
    assert_eq!(obj.get("k"), "v2");
}

#[test]
fn delete_preserves_survivor_order() {
    let mut obj = OrderedObject::new();
    obj.set("a", 1);
    obj.set("b", 2);
    obj.set("c", 3);
    obj.delete("b");
    assert_eq!(marshal(&obj), r#"{"a":1,"c":3}"#);
}

#[test]
fn reinsert_after_delete_goes_last() {
    let mut obj = OrderedObject::new();
    obj.set("a", 1);
    obj.set("b", 2);
    obj.delete("a");
    obj.set("a", 3);
    assert_eq!(marshal(&obj), r#"{"b":2,"a":3}"#);
}

#[test]
fn deleted_key_reads_as_zero_value() {
    let mut obj = OrderedObject::new();
    obj.set("s", String::from("text"));
    obj.delete("s");
    assert!(!obj.has("s"));
    assert_eq!(obj.get("s"), String::new());
}

#[test]
fn nested_object() {
    let mut address = OrderedObject::with_capacity(3);
    address.set("street", AnyValue::new("123 Main St"));
    address.set("city", AnyValue::new("New York"));
    address.set("zipcode", AnyValue::new("10001"));

    let mut person = OrderedObject::with_capacity(4);
    person.set("name", AnyValue::new("John Doe"));
    person.set("age", AnyValue::new(30));
    person.set("address", AnyValue::new(address));
    person.set("active", AnyValue::new(true));

    let json = marshal(&person);
    assert_eq!(
        json,
        r#"{"name":"John Doe","age":30,"address":{"street":"123 Main St","city":"New York","zipcode":"10001"},"active":true}"#
    );
    assert_eq!(round_trip_len(&json), 4);
}

#[test]
fn special_characters_are_not_html_escaped() {
    let mut obj: OrderedObject<AnyValue> = OrderedObject::with_capacity(3);
    obj.set("url", "https://example.com/path?param=value".into());
    obj.set("html", "<div>test & demo</div>".into());
    obj.set("path", "/usr/local/bin".into());
    obj.set("quote", "say \"hi\" \\ bye".into());

    let json = marshal(&obj);
    assert_eq!(
        json,
        r#"{"url":"https://example.com/path?param=value","html":"<div>test & demo</div>","path":"/usr/local/bin","quote":"say \"hi\" \\ bye"}"#
    );
    assert_eq!(round_trip_len(&json), 4);
}

#[test]
fn empty_is_two_bytes() {
    let obj: OrderedObject<AnyValue> = OrderedObject::with_capacity(0);
    let bytes = obj.marshal_json().unwrap();
    assert_eq!(bytes, b"{}");
    assert_eq!(round_trip_len("{}"), 0);
}

#[test]
fn emptied_object_is_two_bytes() {
    let mut obj = OrderedObject::new();
    obj.set("a", 1);
    obj.delete("a");
    assert_eq!(marshal(&obj), "{}");
}

#[test]
fn keys_are_escaped() {
    let mut obj = OrderedObject::new();
    obj.set("we\"ird\nkey", 1);
    let json = marshal(&obj);
    assert_eq!(json, r#"{"we\"ird\nkey":1}"#);
    assert_eq!(round_trip_len(&json), 1);
}

#[test]
fn every_primitive_width() {
    let mut obj: OrderedObject<AnyValue> = OrderedObject::new();
    obj.set("nil", AnyValue::null());
    obj.set("i8", AnyValue::new(-8i8));
    obj.set("i16", AnyValue::new(-16i16));
    obj.set("i32", AnyValue::new(-32i32));
    obj.set("i64", AnyValue::new(i64::MIN));
    obj.set("isize", AnyValue::new(-1isize));
    obj.set("u8", AnyValue::new(u8::MAX));
    obj.set("u16", AnyValue::new(16u16));
    obj.set("u32", AnyValue::new(32u32));
    obj.set("u64", AnyValue::new(u64::MAX));
    obj.set("usize", AnyValue::new(7usize));
    obj.set("f32", AnyValue::new(1.5f32));
    obj.set("f64", AnyValue::new(100.0f64));
    obj.set("opt", AnyValue::new(Some(false)));
    assert_eq!(
        marshal(&obj),
        r#"{"nil":null,"i8":-8,"i16":-16,"i32":-32,"i64":-9223372036854775808,"isize":-1,"u8":255,"u16":16,"u32":32,"u64":18446744073709551615,"usize":7,"f32":1.5,"f64":100,"opt":false}"#
    );
}

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
    label: Option<String>,
}

impl AsJsonValue for Point {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Structural(self)
    }
}

#[test]
fn structural_values() {
    let mut scores = HashMap::new();
    scores.insert("only", 1);

    let mut obj: OrderedObject<AnyValue> = OrderedObject::new();
    obj.set("point", AnyValue::new(Point { x: 1, y: -2, label: None }));
    obj.set("list", AnyValue::new(vec!["a&b", "c"]));
    obj.set("scores", AnyValue::new(scores));
    obj.set("json", AnyValue::new(serde_json::json!({"z": [1, {"y": null}]})));
    assert_eq!(
        marshal(&obj),
        r#"{"point":{"x":1,"y":-2,"label":null},"list":["a&b","c"],"scores":{"only":1},"json":{"z":[1,{"y":null}]}}"#
    );
}

struct Failing;

impl MarshalJson for Failing {
    fn marshal_json(&self) -> Result<Vec<u8>, EncodeError> {
        Err(EncodeError::custom("refusing to encode"))
    }
}

impl AsJsonValue for Failing {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Marshaler(self)
    }
}

struct Raw(&'static str);

impl MarshalJson for Raw {
    fn marshal_json(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.0.as_bytes().to_vec())
    }
}

impl AsJsonValue for Raw {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Marshaler(self)
    }
}

#[test]
fn marshaler_bytes_are_spliced_verbatim() {
    let mut obj: OrderedObject<AnyValue> = OrderedObject::new();
    obj.set("raw", AnyValue::new(Raw("[1, 2,  3]")));
    assert_eq!(marshal(&obj), r#"{"raw":[1, 2,  3]}"#);
}

#[test]
fn marshaler_failure_aborts_and_returns_writer() {
    let config = JsonConfig::new();
    let mut obj: OrderedObject<AnyValue> = OrderedObject::new();
    obj.set("ok", AnyValue::new(1));
    obj.set("bad", AnyValue::new(Failing));
    obj.set("after", AnyValue::new(2));

    let err = obj.marshal_json_with(&config).unwrap_err();
    assert!(matches!(err, EncodeError::Marshaler(_)));
    assert_eq!(err.to_string(), "marshal_json failed: refusing to encode");
    assert_eq!(config.pool().idle(), 1);

    // The returned writer carries nothing over into the next call.
    obj.delete("bad");
    assert_eq!(
        obj.marshal_json_with(&config).unwrap(),
        br#"{"ok":1,"after":2}"#
    );
    assert_eq!(config.pool().idle(), 1);
}

#[test]
fn nested_failure_propagates_unchanged() {
    let mut inner: OrderedObject<AnyValue> = OrderedObject::new();
    inner.set("bad", AnyValue::new(Failing));
    let mut outer: OrderedObject<AnyValue> = OrderedObject::new();
    outer.set("inner", AnyValue::new(inner));
    let err = outer.marshal_json().unwrap_err();
    assert_eq!(err.to_string(), "marshal_json failed: refusing to encode");
}

#[test]
fn nan_is_an_error() {
    let config = JsonConfig::new();
    let mut obj = OrderedObject::new();
    obj.set("a", 1.0);
    obj.set("b", f64::NAN);
    let err = obj.marshal_json_with(&config).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedFloat(_)));
    assert_eq!(config.pool().idle(), 1);
}

#[test]
fn structural_failure_is_an_error() {
    let mut bad = HashMap::new();
    bad.insert((1, 2), "tuple keys are not strings");
    let mut obj: OrderedObject<AnyValue> = OrderedObject::new();
    obj.set("bad", AnyValue::new(bad));
    assert!(matches!(obj.marshal_json(), Err(EncodeError::Structural(_))));
}

#[test]
fn escape_html_config_covers_strings_and_structural_values() {
    let config = JsonConfig::new().with_escape_html(true);
    let mut obj: OrderedObject<AnyValue> = OrderedObject::new();
    obj.set("<k>", AnyValue::new("a&b"));
    obj.set("list", AnyValue::new(vec!["<i>"]));
    let json = String::from_utf8(obj.marshal_json_with(&config).unwrap()).unwrap();
    assert_eq!(
        json,
        r#"{"\u003ck\u003e":"a\u0026b","list":["\u003ci\u003e"]}"#
    );
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["<k>"], "a&b");
}

#[test]
fn escape_html_config_reaches_nested_objects() {
    let config = JsonConfig::new().with_escape_html(true);
    let mut deepest: OrderedObject<AnyValue> = OrderedObject::new();
    deepest.set("<tag>", AnyValue::new(vec!["&amp;"]));
    let mut inner: OrderedObject<AnyValue> = OrderedObject::new();
    inner.set("html", AnyValue::new("<script>"));
    inner.set("deeper", AnyValue::new(deepest));
    let mut outer: OrderedObject<AnyValue> = OrderedObject::new();
    outer.set("top", AnyValue::new("<b>"));
    outer.set("inner", AnyValue::new(inner));

    let json = String::from_utf8(outer.marshal_json_with(&config).unwrap()).unwrap();
    assert_eq!(
        json,
        concat!(
            r#"{"top":"\u003cb\u003e","inner":{"html":"\u003cscript\u003e","#,
            r#""deeper":{"\u003ctag\u003e":["\u0026amp;"]}}}"#,
        )
    );
    assert!(!json.contains('<') && !json.contains('&'));

    // The default config leaves every level alone.
    assert_eq!(
        marshal(&outer),
        r#"{"top":"<b>","inner":{"html":"<script>","deeper":{"<tag>":["&amp;"]}}}"#
    );
    assert_eq!(config.pool().idle(), 3);
}

#[test]
fn large_object_round_trips() {
    let mut obj = OrderedObject::with_capacity(1);
    for i in (0..2_000).rev() {
        obj.set(format!("key-{i}"), format!("value {i} {}", "x".repeat(i % 17)));
    }
    let json = marshal(&obj);
    assert_eq!(round_trip_len(&json), 2_000);
    let back: OrderedObject<String> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, obj);
}
