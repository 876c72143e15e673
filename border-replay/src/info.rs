//! Auxiliary information attached to transitions.
//!
//! An [`Info`] maps string keys to [`InfoValue`]s. Policies typically store values computed
//! while acting, e.g., the log-probability of the sampled action or a value estimate.
//! Values of the same key can later be read back as a column with
//! [`ExperienceReplay::field`](crate::replay_buffer::ExperienceReplay::field).
//!
//! ```rust
//! use border_replay::{Info, InfoValue};
//!
//! let mut info = Info::empty();
//! info.insert("log_prob", InfoValue::Float(-0.7));
//! info.insert("episode", InfoValue::Int(3));
//!
//! assert_eq!(info.get_float("log_prob").unwrap(), -0.7);
//! assert!(info.get_float("episode").is_err());
//! ```
use crate::{error::ReplayError, Tensor};
use ndarray::{Array, Dimension};
use serde::{Deserialize, Serialize};
use std::{
    collections::{
        hash_map::{Iter, Keys},
        BTreeMap, HashMap,
    },
    iter::FromIterator,
};

/// Represents possible types of values in an [`Info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InfoValue {
    /// A boolean flag.
    Bool(bool),

    /// An integer, e.g., an episode id.
    Int(i64),

    /// A float, e.g., a log-probability.
    Float(f64),

    /// A text value.
    Str(String),

    /// A numeric array.
    Tensor(Tensor),

    /// A sequence of values.
    List(Vec<InfoValue>),

    /// Nested key-value pairs.
    Map(BTreeMap<String, InfoValue>),
}

impl InfoValue {
    /// Converts the value into a canonical [`Tensor`], if it is numeric.
    ///
    /// Integers and floats become zero-dimensional `i64` and `f64` tensors. Tensors lose
    /// a leading singleton batch dimension. Other variants are not numeric.
    pub fn to_tensor(&self) -> Option<Tensor> {
        match self {
            InfoValue::Int(v) => Some(Tensor::from(*v)),
            InfoValue::Float(v) => Some(Tensor::from(*v)),
            InfoValue::Tensor(t) => Some(t.clone().squeeze_first_dim()),
            _ => None,
        }
    }
}

impl From<bool> for InfoValue {
    fn from(v: bool) -> Self {
        InfoValue::Bool(v)
    }
}

impl From<i64> for InfoValue {
    fn from(v: i64) -> Self {
        InfoValue::Int(v)
    }
}

impl From<i32> for InfoValue {
    fn from(v: i32) -> Self {
        InfoValue::Int(v as _)
    }
}

impl From<usize> for InfoValue {
    fn from(v: usize) -> Self {
        InfoValue::Int(v as _)
    }
}

impl From<f64> for InfoValue {
    fn from(v: f64) -> Self {
        InfoValue::Float(v)
    }
}

impl From<f32> for InfoValue {
    fn from(v: f32) -> Self {
        InfoValue::Float(v as _)
    }
}

impl From<&str> for InfoValue {
    fn from(v: &str) -> Self {
        InfoValue::Str(v.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(v: String) -> Self {
        InfoValue::Str(v)
    }
}

impl From<Tensor> for InfoValue {
    fn from(v: Tensor) -> Self {
        InfoValue::Tensor(v)
    }
}

impl<D: Dimension> From<Array<f32, D>> for InfoValue {
    fn from(a: Array<f32, D>) -> Self {
        InfoValue::Tensor(a.into())
    }
}

impl<D: Dimension> From<Array<f64, D>> for InfoValue {
    fn from(a: Array<f64, D>) -> Self {
        InfoValue::Tensor(a.into())
    }
}

impl From<Vec<InfoValue>> for InfoValue {
    fn from(v: Vec<InfoValue>) -> Self {
        InfoValue::List(v)
    }
}

/// Key-value pairs attached to a single transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info(HashMap<String, InfoValue>);

impl Info {
    /// Construct empty info.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Create `Info` from slice of `(Into<String>, InfoValue)`.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, InfoValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Get keys.
    pub fn keys(&self) -> Keys<String, InfoValue> {
        self.0.keys()
    }

    /// Insert a key-value pair.
    pub fn insert(&mut self, k: impl Into<String>, v: impl Into<InfoValue>) {
        self.0.insert(k.into(), v.into());
    }

    /// Insert a key-value pair and return `self`.
    pub fn with(mut self, k: impl Into<String>, v: impl Into<InfoValue>) -> Self {
        self.insert(k, v);
        self
    }

    /// Return an iterator over key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, InfoValue> {
        self.0.iter()
    }

    /// Get the value of the given key.
    pub fn get(&self, k: &str) -> Option<&InfoValue> {
        self.0.get(k)
    }

    /// Returns `true` if the key exists.
    pub fn contains_key(&self, k: &str) -> bool {
        self.0.contains_key(k)
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges two infos. Values of `info` win on conflicting keys.
    pub fn merge(self, info: Info) -> Self {
        Info(self.0.into_iter().chain(info.0).collect())
    }

    /// Get a float value.
    pub fn get_float(&self, k: &str) -> Result<f64, ReplayError> {
        match self.0.get(k) {
            Some(InfoValue::Float(v)) => Ok(*v),
            Some(_) => Err(ReplayError::InfoValueType("Float".to_string())),
            None => Err(ReplayError::InfoKey(k.to_string())),
        }
    }

    /// Get an integer value.
    pub fn get_int(&self, k: &str) -> Result<i64, ReplayError> {
        match self.0.get(k) {
            Some(InfoValue::Int(v)) => Ok(*v),
            Some(_) => Err(ReplayError::InfoValueType("Int".to_string())),
            None => Err(ReplayError::InfoKey(k.to_string())),
        }
    }

    /// Get a tensor value.
    pub fn get_tensor(&self, k: &str) -> Result<&Tensor, ReplayError> {
        match self.0.get(k) {
            Some(InfoValue::Tensor(t)) => Ok(t),
            Some(_) => Err(ReplayError::InfoValueType("Tensor".to_string())),
            None => Err(ReplayError::InfoKey(k.to_string())),
        }
    }

    /// Get a string value.
    pub fn get_str(&self, k: &str) -> Result<&str, ReplayError> {
        match self.0.get(k) {
            Some(InfoValue::Str(s)) => Ok(s),
            Some(_) => Err(ReplayError::InfoValueType("Str".to_string())),
            None => Err(ReplayError::InfoKey(k.to_string())),
        }
    }
}

impl<K: Into<String>, V: Into<InfoValue>> FromIterator<(K, V)> for Info {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_to_tensor() {
        assert_eq!(InfoValue::Int(3).to_tensor(), Some(Tensor::from(3i64)));
        assert_eq!(InfoValue::Float(0.5).to_tensor(), Some(Tensor::from(0.5f64)));
        assert_eq!(
            InfoValue::from(Array2::<f32>::ones((1, 4))).to_tensor().unwrap().shape(),
            &[4]
        );
        assert!(InfoValue::Str("a".into()).to_tensor().is_none());
        assert!(InfoValue::Bool(true).to_tensor().is_none());
        assert!(InfoValue::List(vec![InfoValue::Int(1)]).to_tensor().is_none());
    }

    #[test]
    fn test_typed_getters() {
        let info = Info::empty()
            .with("id", 7i64)
            .with("value", 1.5f64)
            .with("name", "walker");

        assert_eq!(info.get_int("id").unwrap(), 7);
        assert_eq!(info.get_float("value").unwrap(), 1.5);
        assert_eq!(info.get_str("name").unwrap(), "walker");
        assert!(matches!(info.get_int("value"), Err(ReplayError::InfoValueType(_))));
        assert!(matches!(info.get_tensor("missing"), Err(ReplayError::InfoKey(_))));
    }

    #[test]
    fn test_collect_and_iter() {
        let info = vec![("value", 0.25f64), ("log_prob", -1.5)]
            .into_iter()
            .collect::<Info>();
        assert_eq!(info.len(), 2);
        assert_eq!(info.get_float("log_prob").unwrap(), -1.5);

        let mut pairs = info
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect::<Vec<_>>();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        assert_eq!(
            pairs,
            vec![
                ("log_prob", InfoValue::Float(-1.5)),
                ("value", InfoValue::Float(0.25))
            ]
        );
    }

    #[test]
    fn test_merge() {
        let a = Info::from_slice(&[("x", InfoValue::Int(1)), ("y", InfoValue::Int(2))]);
        let b = Info::from_slice(&[("y", InfoValue::Int(3))]);
        let merged = a.merge(b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get_int("y").unwrap(), 3);
    }
}
