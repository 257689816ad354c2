//! Cache key derivation
//!
//! Keys are `<namespace>:<digest>` where the digest is taken over the
//! canonical (name-sorted) JSON form of the parameter set.

use std::collections::BTreeMap;
use std::fmt::Debug;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A single parameter value participating in key derivation
///
/// `Absent` is a sentinel distinct from every present value, including the
/// empty string and zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    Absent,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
}

impl KeyValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Absent => Value::Null,
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            // 10, 10.0 and 10.00 are the same price
            Self::Decimal(d) => Value::String(d.normalize().to_string()),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for KeyValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<i64> for KeyValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u32> for KeyValue {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<Decimal> for KeyValue {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Parameters for cache key generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeyParams {
    /// Components keyed by parameter name; the map keeps them sorted
    pub components: BTreeMap<String, KeyValue>,
}

impl CacheKeyParams {
    /// Creates an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Canonical serialized form: a JSON object with members in name order
    pub fn canonical_form(&self) -> String {
        let map: Map<String, Value> = self
            .components
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        Value::Object(map).to_string()
    }
}

impl<K, V> FromIterator<(K, V)> for CacheKeyParams
where
    K: Into<String>,
    V: Into<KeyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            components: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Trait for deriving cache keys from a namespace and a parameter set
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Reduces the canonical parameter form to a fixed-length digest
    fn digest(&self, params: &CacheKeyParams) -> String;

    /// Derives `<namespace>:<digest>`
    fn derive_key(&self, namespace: &str, params: &CacheKeyParams) -> String {
        format!("{}:{}", namespace, self.digest(params))
    }
}

/// SHA-256 key generator producing 64 hex characters
///
/// For n live keys the collision probability is roughly n^2 / 2^257,
/// about 4e-60 at a billion keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256KeyGenerator;

impl Sha256KeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CacheKeyGenerator for Sha256KeyGenerator {
    fn digest(&self, params: &CacheKeyParams) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params.canonical_form().as_bytes());
        hex::encode(hasher.finalize())
    }
}
