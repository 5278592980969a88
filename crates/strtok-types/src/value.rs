use std::collections::BTreeMap;
use std::{fmt, mem};

use bytes::Bytes;

use crate::error::TypeError;

/// Smallest integer the wire format can carry (`int32`).
pub const INTEGER_MIN: i64 = i32::MIN as i64;
/// Largest integer the wire format can carry (`uint32`).
pub const INTEGER_MAX: i64 = u32::MAX as i64;

/// A self-describing format value.
///
/// This is what the decoder produces and the encoder consumes. The set of
/// shapes is closed:
///
/// ```text
///   Value
///   ├── Nil
///   ├── Bool(bool)
///   ├── Integer(i64)          ← only [-2^31, 2^32 - 1] is encodable
///   ├── Raw(Bytes)            ← byte strings; text is stored as UTF-8
///   ├── Array(Vec<Value>)
///   └── Map(BTreeMap<Value, Value>)
/// ```
///
/// Maps compare as key/value sets: the order pairs appeared on the wire is
/// not kept. Iteration (and therefore encoding) follows key order, so the
/// same map always encodes to the same bytes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Raw(Bytes),
    Array(Vec<Value>),
    Map(BTreeMap<Value, Value>),
}

impl Value {
    /// Build an integer, checking it fits the wire range.
    ///
    /// # Errors
    ///
    /// [`TypeError::IntegerOutOfRange`] outside `[-2^31, 2^32 - 1]`.
    pub fn integer(value: i64) -> Result<Self, TypeError> {
        if (INTEGER_MIN..=INTEGER_MAX).contains(&value) {
            Ok(Self::Integer(value))
        } else {
            Err(TypeError::IntegerOutOfRange { value })
        }
    }

    /// Build a raw byte string from text or bytes.
    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Self::Raw(bytes.into())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// Build a map. A repeated key keeps its last value.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Name of the value's shape, for diagnostics.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Raw(_) => "raw",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Whether this is an array or map with at least one entry.
    #[must_use]
    pub fn has_children(&self) -> bool {
        match self {
            Self::Array(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Self::Raw(b) => Some(b),
            _ => None,
        }
    }

    /// The raw bytes as text, if they are valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_raw().and_then(|b| std::str::from_utf8(b).ok())
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

// ── Drop ─────────────────────────────────────────────────────────────────────

/// Containers are torn down through a heap worklist so that dropping a
/// deeply nested value never recurses.
impl Drop for Value {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut value) = pending.pop() {
            detach_children(&mut value, &mut pending);
            // `value` now holds no children and drops in constant stack
        }
    }
}

fn detach_children(value: &mut Value, pending: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            pending.extend(mem::take(items).into_iter().filter(Value::has_children));
        }
        Value::Map(map) => {
            for (k, v) in mem::take(map) {
                if k.has_children() {
                    pending.push(k);
                }
                if v.has_children() {
                    pending.push(v);
                }
            }
        }
        _ => {}
    }
}

// ── Conversions ──────────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! from_small_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Integer(i64::from(v))
                }
            }
        )*
    };
}

from_small_int!(u8, u16, u32, i8, i16, i32);

impl TryFrom<i64> for Value {
    type Error = TypeError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        Self::integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Raw(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Raw(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Raw(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Raw(Bytes::from(b))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Raw(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(map: BTreeMap<Value, Value>) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

// ── Display ──────────────────────────────────────────────────────────────────

/// Compact, JSON-like rendering. Raw strings print quoted when they are
/// UTF-8 and as `<hex>` otherwise.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Raw(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "{s:?}"),
                Err(_) => {
                    f.write_str("<")?;
                    for byte in b.iter() {
                        write!(f, "{byte:02x}")?;
                    }
                    f.write_str(">")
                }
            },
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
