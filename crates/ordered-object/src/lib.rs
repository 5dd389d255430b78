//! Insertion-ordered JSON objects.
//!
//! [`OrderedObject`] is a string-keyed map that keeps keys in the order they
//! were first inserted and encodes itself as a JSON object in that order.
//! Values are written by matching the [`JsonValue`] kind they report through
//! [`AsJsonValue`], so primitives skip the generic serde path entirely.
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | `object` | [`OrderedObject`], its iterators |
//! | `value` | [`JsonValue`], [`AsJsonValue`], [`MarshalJson`], [`SerializeJson`] |
//! | `stream` | [`JsonStream`] — token writer over a pooled buffer |
//! | `config` | [`JsonConfig`] — HTML escaping flag and writer pool |
//! | `any` | [`AnyValue`] — heterogeneous values |
//! | `error` | [`EncodeError`] |

mod any;
mod config;
mod error;
mod object;
mod serde_impl;
mod stream;
mod value;

pub use any::AnyValue;
pub use config::JsonConfig;
pub use error::{BoxError, EncodeError};
pub use object::{IntoIter, Iter, IterMut, OrderedObject};
pub use stream::JsonStream;
pub use value::{AsJsonValue, JsonValue, MarshalJson, SerializeJson};
