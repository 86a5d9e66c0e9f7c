use std::collections::BTreeMap;

use bytes::Bytes;

/// A bencode value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string (not necessarily UTF-8).
    Bytes(Bytes),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary keyed by byte strings, always iterated in sorted key order.
    Dict(BTreeMap<Bytes, Value>),
}

impl Value {
    /// Creates a byte string value from UTF-8 text.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_ref().as_bytes()))
    }

    /// Creates an integer from an unsigned size.
    ///
    /// Sizes beyond `i64::MAX` cannot be expressed in bencode and saturate.
    pub fn size(n: u64) -> Self {
        Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Exact number of bytes [`encode`](super::encode) will produce.
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Integer(i) => 2 + decimal_len(*i),
            Value::Bytes(b) => string_len(b.len()),
            Value::List(items) => 2 + items.iter().map(Value::encoded_len).sum::<usize>(),
            Value::Dict(entries) => {
                2 + entries
                    .iter()
                    .map(|(k, v)| string_len(k.len()) + v.encoded_len())
                    .sum::<usize>()
            }
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Looks up a key if this value is a dictionary.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(d) => d.get(key.as_bytes()),
            _ => None,
        }
    }
}

fn decimal_len(i: i64) -> usize {
    let sign = usize::from(i < 0);
    let mut n = i.unsigned_abs();
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    sign + digits
}

fn string_len(len: usize) -> usize {
    decimal_len(len as i64) + 1 + len
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(Bytes::from(s))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

/// Incrementally builds a dictionary value.
///
/// ```
/// use torrent_forge::bencode::{DictBuilder, Value};
///
/// let dict = DictBuilder::new()
///     .with("b", 2i64)
///     .with_opt("skipped", None::<i64>)
///     .with("a", 1i64)
///     .build();
///
/// assert_eq!(dict.get("a"), Some(&Value::Integer(1)));
/// assert_eq!(dict.get("skipped"), None);
/// ```
#[derive(Debug, Default)]
pub struct DictBuilder {
    entries: BTreeMap<Bytes, Value>,
}

impl DictBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, replacing any previous value.
    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.entries
            .insert(Bytes::from_static(key.as_bytes()), value.into());
        self
    }

    /// Inserts `value` under `key` when it is present.
    pub fn with_opt<V: Into<Value>>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn build(self) -> Value {
        Value::Dict(self.entries)
    }
}
