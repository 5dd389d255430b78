//! [`OrderedObject`] — string-keyed map that remembers insertion order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::config::JsonConfig;
use crate::error::EncodeError;
use crate::value::{AsJsonValue, JsonValue, MarshalJson};

/// Upper bound on what an untrusted length hint may pre-allocate.
const MAX_PREALLOC_BYTES: usize = 1024 * 1024;

#[derive(Clone, PartialEq, Eq)]
struct Pair<V> {
    key: String,
    value: V,
}

/// An insertion-ordered map from `String` keys to `V`, encoded as a JSON
/// object whose members follow insertion order.
///
/// Pairs live in a dense vector in rank order; a hash index maps each key to
/// its position. Re-setting a key updates it in place and keeps its rank.
/// Deleting a key shifts every later pair one slot left, so survivors keep
/// their relative order; a deleted key that is set again goes to the end.
///
/// Not synchronized: share it across threads behind a `Mutex` or `RwLock`.
///
/// ```
/// use ordered_object::OrderedObject;
///
/// let mut obj = OrderedObject::with_capacity(3);
/// obj.set("a", 1);
/// obj.set("b", 2);
/// obj.set("a", 3);
/// obj.delete("a");
/// obj.set("c", 4);
/// obj.set("d", 5);
/// assert_eq!(obj.marshal_json().unwrap(), br#"{"b":2,"c":4,"d":5}"#);
/// ```
#[derive(Clone)]
pub struct OrderedObject<V> {
    pairs: Vec<Pair<V>>,
    idx: HashMap<String, usize>,
}

impl<V> Default for OrderedObject<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OrderedObject<V> {
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Pre-allocates room for `capacity` pairs (at least one). The hint is
    /// not a limit.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let idx_capacity = capacity.saturating_add(capacity >> 1);
        Self {
            pairs: Vec::with_capacity(capacity),
            idx: HashMap::with_capacity(idx_capacity),
        }
    }

    /// Like [`with_capacity`](Self::with_capacity) for a hint that comes from
    /// input (an iterator, a deserializer) rather than from the caller. The
    /// pre-allocation is capped; the object still grows past it as needed.
    pub(crate) fn with_size_hint(hint: usize) -> Self {
        let max = MAX_PREALLOC_BYTES / std::mem::size_of::<Pair<V>>().max(1);
        Self::with_capacity(hint.min(max))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of pairs held without reallocating.
    pub fn capacity(&self) -> usize {
        self.pairs.capacity()
    }

    /// Sets `key` to `value`.
    ///
    /// An existing key keeps its position and the old value is returned; a
    /// new key is appended.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        match self.idx.entry(key.into()) {
            Entry::Occupied(entry) => {
                let slot = &mut self.pairs[*entry.get()].value;
                Some(std::mem::replace(slot, value))
            }
            Entry::Vacant(entry) => {
                let key = entry.key().clone();
                entry.insert(self.pairs.len());
                self.pairs.push(Pair { key, value });
                None
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.idx.contains_key(key)
    }

    /// Returns a copy of the value at `key`, or `V::default()` if absent.
    ///
    /// Use [`has`](Self::has) or [`get_ref`](Self::get_ref) to tell an
    /// absent key from one holding the default value.
    pub fn get(&self, key: &str) -> V
    where
        V: Clone + Default,
    {
        self.get_ref(key).cloned().unwrap_or_default()
    }

    pub fn get_ref(&self, key: &str) -> Option<&V> {
        let &i = self.idx.get(key)?;
        Some(&self.pairs[i].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let &i = self.idx.get(key)?;
        Some(&mut self.pairs[i].value)
    }

    /// Rank of `key` in insertion order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.idx.get(key).copied()
    }

    /// The pair at rank `index`.
    pub fn get_index(&self, index: usize) -> Option<(&str, &V)> {
        self.pairs.get(index).map(|p| (p.key.as_str(), &p.value))
    }

    /// Removes `key` and returns its value; absent keys are a no-op.
    ///
    /// Later pairs shift left by one and their index entries are rewritten,
    /// which is O(n) but keeps the order of the remaining keys.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let i = self.idx.remove(key)?;
        let removed = self.pairs.remove(i);
        for (j, pair) in self.pairs.iter().enumerate().skip(i) {
            if let Some(pos) = self.idx.get_mut(&pair.key) {
                *pos = j;
            }
        }
        Some(removed.value)
    }

    /// Removes every pair, keeping the allocations.
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.idx.clear();
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.pairs.iter().map(|p| p.key.as_str())
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.pairs.iter().map(|p| &p.value)
    }

    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator {
        self.pairs.iter_mut().map(|p| &mut p.value)
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter(self.pairs.iter())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut(self.pairs.iter_mut())
    }
}

impl<V: AsJsonValue> OrderedObject<V> {
    /// Encodes the object with [`JsonConfig::standard`].
    pub fn marshal_json(&self) -> Result<Vec<u8>, EncodeError> {
        self.marshal_json_with(JsonConfig::standard())
    }

    /// Encodes the object as a JSON object with members in insertion order.
    ///
    /// The first value that fails to encode aborts the call; nothing of the
    /// partial output is returned and the pooled buffer goes back to
    /// `config`'s pool either way.
    pub fn marshal_json_with(&self, config: &JsonConfig) -> Result<Vec<u8>, EncodeError> {
        if self.pairs.is_empty() {
            return Ok(b"{}".to_vec());
        }

        let mut stream = config.borrow_stream();
        stream.write_object_start();
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                stream.write_more();
            }
            stream.write_object_field(&pair.key);
            if let Err(err) = stream.write_value(&pair.value.as_json_value()) {
                debug!("discarding partial object encoding at key {:?}: {}", pair.key, err);
                return Err(err);
            }
        }
        stream.write_object_end();

        match stream.take_error() {
            Some(err) => Err(err),
            None => Ok(stream.to_vec()),
        }
    }

    /// [`marshal_json`](Self::marshal_json) as a `String`.
    pub fn to_json_string(&self) -> Result<String, EncodeError> {
        Ok(String::from_utf8(self.marshal_json()?)?)
    }
}

impl<V: AsJsonValue> MarshalJson for OrderedObject<V> {
    fn marshal_json(&self) -> Result<Vec<u8>, EncodeError> {
        OrderedObject::marshal_json(self)
    }

    fn marshal_json_with(&self, config: &JsonConfig) -> Result<Vec<u8>, EncodeError> {
        OrderedObject::marshal_json_with(self, config)
    }
}

impl<V: AsJsonValue> AsJsonValue for OrderedObject<V> {
    fn as_json_value(&self) -> JsonValue<'_> {
        JsonValue::Marshaler(self)
    }
}

impl<V: fmt::Debug> fmt::Debug for OrderedObject<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Order-sensitive: equal objects hold the same pairs in the same order.
impl<V: PartialEq> PartialEq for OrderedObject<V> {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs
    }
}

impl<V: Eq> Eq for OrderedObject<V> {}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedObject<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut obj = Self::with_size_hint(iter.size_hint().0);
        obj.extend(iter);
        obj
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for OrderedObject<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

/// Borrowing iterator over `(key, value)` in insertion order.
pub struct Iter<'a, V>(std::slice::Iter<'a, Pair<V>>);

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|p| (p.key.as_str(), &p.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|p| (p.key.as_str(), &p.value))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// Iterator over `(key, &mut value)` in insertion order. Keys stay immutable.
pub struct IterMut<'a, V>(std::slice::IterMut<'a, Pair<V>>);

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a str, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|p| (p.key.as_str(), &mut p.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

/// Owning iterator over `(key, value)` in insertion order.
pub struct IntoIter<V>(std::vec::IntoIter<Pair<V>>);

impl<V> Iterator for IntoIter<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|p| (p.key, p.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> IntoIterator for OrderedObject<V> {
    type Item = (String, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> IntoIter<V> {
        IntoIter(self.pairs.into_iter())
    }
}

impl<'a, V> IntoIterator for &'a OrderedObject<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<'a, V> IntoIterator for &'a mut OrderedObject<V> {
    type Item = (&'a str, &'a mut V);
    type IntoIter = IterMut<'a, V>;

    fn into_iter(self) -> IterMut<'a, V> {
        self.iter_mut()
    }
}
