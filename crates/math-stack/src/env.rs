use rustc_hash::FxHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A value stored in an environment record or handed to an item builder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Value<N> {
    Bool(bool),
    Number(f64),
    Str(Box<str>),
    Node(N),
    Record(EnvList<N>),
}

impl<N> Value<N> {
    /// `false`, `0` and the empty string are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Node(_) | Value::Record(_) => true,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_node(&self) -> Option<&N> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    #[inline]
    pub fn into_node(self) -> Option<N> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&EnvList<N>> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl<N> From<bool> for Value<N> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<N> From<f64> for Value<N> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<N> From<&str> for Value<N> {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl<N> From<String> for Value<N> {
    fn from(s: String) -> Self {
        Value::Str(s.into_boxed_str())
    }
}

impl<N> From<EnvList<N>> for Value<N> {
    fn from(record: EnvList<N>) -> Self {
        Value::Record(record)
    }
}

/// An open key-value record of parser state.
///
/// One record is global to a parse; the others are scoped to the items on the stack and are
/// inherited by the items pushed above them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EnvList<N>(FxHashMap<String, Value<N>>);

impl<N> Default for EnvList<N> {
    fn default() -> Self {
        EnvList(FxHashMap::default())
    }
}

impl<N> EnvList<N> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value<N>> {
        self.0.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value<N>> {
        self.0.get_mut(key)
    }

    /// Set `key`, returning the value it held before.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value<N>>) -> Option<Value<N>> {
        self.0.insert(key.into(), value.into())
    }

    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value<N>> {
        self.0.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// `true` if `key` is present and truthy.
    #[inline]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_truthy)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<N>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<N: Clone> EnvList<N> {
    /// Copy every entry of `other` whose key is not yet set here.
    ///
    /// Keys already present in `self` keep their values.
    pub fn overlay(&mut self, other: &EnvList<N>) {
        for (key, value) in other.0.iter() {
            if !self.0.contains_key(key) {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }
}

impl<N, K, V> FromIterator<(K, V)> for EnvList<N>
where
    K: Into<String>,
    V: Into<Value<N>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        EnvList(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
