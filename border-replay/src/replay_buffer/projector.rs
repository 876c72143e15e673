//! Columns derived from the info of transitions.
use super::ExperienceReplay;
use crate::{Info, InfoValue, Tensor};
use log::trace;
use std::collections::BTreeSet;

/// Values of one info key across all transitions of a buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Every transition holds a numeric value of the same element type and shape.
    /// The values are stacked into shape `[len, ..]`.
    Stacked(Tensor),

    /// The values as they were stored, in buffer order. `None` marks transitions
    /// without the key.
    List(Vec<Option<InfoValue>>),
}

impl Field {
    /// Returns the number of values.
    pub fn len(&self) -> usize {
        match self {
            Field::Stacked(t) => t.shape()[0],
            Field::List(values) => values.len(),
        }
    }

    /// Returns `true` if there is no value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for [`Field::Stacked`].
    pub fn is_stacked(&self) -> bool {
        matches!(self, Field::Stacked(_))
    }

    /// Returns the stacked tensor, if any.
    pub fn as_stacked(&self) -> Option<&Tensor> {
        match self {
            Field::Stacked(t) => Some(t),
            Field::List(_) => None,
        }
    }

    /// Returns the raw values, if the field was not stacked.
    pub fn as_list(&self) -> Option<&[Option<InfoValue>]> {
        match self {
            Field::Stacked(_) => None,
            Field::List(values) => Some(values),
        }
    }
}

impl ExperienceReplay {
    /// Returns the values of info key `name` as a column.
    ///
    /// The column is stacked if every transition holds an integer, a float or a tensor under
    /// the key and all of them share one element type and shape after canonicalization.
    /// Otherwise the raw values are returned; a single transition without the key is
    /// enough to fall back to a list. The decision is made on every call from the
    /// current content of the buffer.
    ///
    /// If no transition holds `name` but `name` ends with `s`, the singular key is used
    /// instead, so `field("log_probs")` reads the values stored under `log_prob`.
    ///
    /// # Arguments
    ///
    /// * `name` - Info key, or its plural
    ///
    /// # Returns
    ///
    /// The column of values, or `None` if no transition holds the key
    pub fn field(&self, name: &str) -> Option<Field> {
        let key = self.resolve_field_key(name)?;
        Some(project(&self.infos, key))
    }

    /// Returns every info key present in the buffer, sorted.
    pub fn field_names(&self) -> Vec<String> {
        self.infos
            .iter()
            .flat_map(|info| info.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn resolve_field_key<'a>(&self, name: &'a str) -> Option<&'a str> {
        let present = |key: &str| self.infos.iter().any(|info| info.contains_key(key));
        if present(name) {
            Some(name)
        } else {
            name.strip_suffix('s').filter(|key| present(*key))
        }
    }
}

fn project(infos: &[Info], key: &str) -> Field {
    let values = infos.iter().map(|info| info.get(key)).collect::<Vec<_>>();
    match stack_values(&values) {
        Some(t) => Field::Stacked(t),
        None => {
            trace!("Info key `{}` is not homogeneous, returning raw values", key);
            Field::List(values.into_iter().map(|v| v.cloned()).collect())
        }
    }
}

fn stack_values(values: &[Option<&InfoValue>]) -> Option<Tensor> {
    let tensors = values
        .iter()
        .map(|v| v.and_then(InfoValue::to_tensor))
        .collect::<Option<Vec<_>>>()?;
    Tensor::stack(&tensors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Info};
    use ndarray::{Array1, Array2};

    const NUM_SAMPLES: usize = 100;

    fn replay_with(value: impl Fn(usize) -> Option<InfoValue>) -> ExperienceReplay {
        let mut replay = ExperienceReplay::new();
        let v = Array1::<f32>::zeros(5);
        for i in 0..NUM_SAMPLES {
            let mut info = Info::empty();
            if let Some(value) = value(i) {
                info.insert("test", value);
            }
            replay.add(v.clone(), v.clone(), i as f32, v.clone(), false, info).unwrap();
        }
        replay
    }

    #[test]
    fn test_stacked_matrices() {
        let m = Array2::<f64>::from_shape_fn((3, 3), |(i, j)| (i * 3 + j) as f64);
        let replay = replay_with(|_| Some(m.clone().into()));

        let field = replay.field("test").unwrap();
        let stacked = field.as_stacked().unwrap();
        assert_eq!(stacked.shape(), &[NUM_SAMPLES, 3, 3]);
        assert_eq!(stacked.dtype(), DType::F64);
        assert_eq!(stacked.as_f64().unwrap()[[7, 1, 2]], 5.0);

        // Plural access reaches the same key
        assert_eq!(replay.field("tests"), Some(field));
    }

    #[test]
    fn test_scalar_breaks_stacking() {
        let m = Array2::<f64>::ones((3, 3));
        let replay = replay_with(|_| Some(m.clone().into()));

        for odd in [InfoValue::Int(1000), InfoValue::Float(9.8981)].iter() {
            let mut extended = replay.slice(..);
            let v = Array1::<f32>::zeros(5);
            extended
                .add(v.clone(), v.clone(), 0., v, false, Info::empty().with("test", odd.clone()))
                .unwrap();

            let values = match extended.field("tests").unwrap() {
                Field::List(values) => values,
                f => panic!("expected a list, got {:?}", f),
            };
            assert_eq!(values.len(), NUM_SAMPLES + 1);
            assert_eq!(values[NUM_SAMPLES].as_ref(), Some(odd));
            assert!(matches!(values[0], Some(InfoValue::Tensor(_))));

            // Dropping the odd value restores the stacked column
            let restored = extended.slice(..-1);
            assert!(restored.field("test").unwrap().is_stacked());
        }
    }

    #[test]
    fn test_scalars() {
        let ints = replay_with(|i| Some(InfoValue::Int(i as i64)));
        let stacked = ints.field("test").unwrap();
        assert_eq!(stacked.as_stacked().unwrap().as_i64().unwrap().shape(), &[NUM_SAMPLES]);

        let mixed = replay_with(|i| {
            Some(if i == 50 {
                InfoValue::Float(1.0)
            } else {
                InfoValue::Int(1)
            })
        });
        let values = mixed.field("test").unwrap();
        let values = values.as_list().unwrap();
        assert_eq!(values[50], Some(InfoValue::Float(1.0)));
        assert_eq!(values[49], Some(InfoValue::Int(1)));
    }

    #[test]
    fn test_squeezed_tensors_stack() {
        let replay = replay_with(|i| {
            Some(if i % 2 == 0 {
                Array1::<f32>::ones(4).into()
            } else {
                Array2::<f32>::ones((1, 4)).into()
            })
        });
        let field = replay.field("test").unwrap();
        assert_eq!(field.as_stacked().unwrap().shape(), &[NUM_SAMPLES, 4]);
    }

    #[test]
    fn test_missing_key_forces_list() {
        let replay = replay_with(|i| if i == 3 { None } else { Some(InfoValue::Float(0.)) });
        let field = replay.field("test").unwrap();
        let values = field.as_list().unwrap();
        assert_eq!(values.len(), NUM_SAMPLES);
        assert_eq!(values[3], None);
        assert_eq!(values[4], Some(InfoValue::Float(0.)));
    }

    #[test]
    fn test_non_numeric_values() {
        let replay = replay_with(|_| Some(InfoValue::Str("x".into())));
        assert!(!replay.field("test").unwrap().is_stacked());
    }

    #[test]
    fn test_unknown_field() {
        let replay = replay_with(|_| None);
        assert!(replay.field("test").is_none());
        assert!(replay.field("tests").is_none());
        assert!(replay.field_names().is_empty());
        assert!(ExperienceReplay::new().field("anything").is_none());
    }

    #[test]
    fn test_field_names() {
        let mut replay = ExperienceReplay::new();
        replay
            .add(0f32, 0i64, 0., 0f32, false, Info::empty().with("value", 0.1f64).with("log_prob", -1.0f64))
            .unwrap();
        replay
            .add(0f32, 0i64, 0., 0f32, true, Info::empty().with("episode", 0i64))
            .unwrap();
        assert_eq!(replay.field_names(), vec!["episode", "log_prob", "value"]);
    }
}
