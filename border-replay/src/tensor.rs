//! Canonical numeric values.
//!
//! States, actions and next states pushed into
//! [`ExperienceReplay`](crate::replay_buffer::ExperienceReplay) are converted into [`Tensor`]s.
//! A leading singleton batch dimension is removed on conversion, so a value of shape
//! `[1, D]` is stored exactly like the same value of shape `[D]`.
//!
//! ```rust
//! use border_replay::{Normalizer, Tensor};
//! use ndarray::Array2;
//!
//! let mut normalizer = Normalizer::new("states");
//! let a = normalizer.normalize(vec![1f32, 2.0, 3.0]).unwrap();
//! let b = normalizer.normalize(Array2::<f32>::ones((1, 3))).unwrap();
//! assert_eq!(a.shape(), b.shape());
//! assert!(normalizer.normalize(vec![1f32, 2.0]).is_err());
//! ```
use crate::error::ReplayError;
use ndarray::{arr0, Array, ArrayD, Axis, Dimension, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a [`Tensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// 64-bit signed integer.
    I64,
}

/// Element type and shape shared by every value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    /// Element type.
    pub dtype: DType,

    /// Shape of a single value, without the batch dimension.
    pub shape: Vec<usize>,
}

impl fmt::Display for FieldLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.dtype, self.shape)
    }
}

/// Applies an expression to the array inside a tensor.
macro_rules! with_array {
    ($tensor:expr, $a:ident => $body:expr) => {
        match $tensor {
            Tensor::F32($a) => $body,
            Tensor::F64($a) => $body,
            Tensor::I64($a) => $body,
        }
    };
}

/// Maps the array inside a tensor, keeping the element type.
macro_rules! map_array {
    ($tensor:expr, $a:ident => $body:expr) => {
        match $tensor {
            Tensor::F32($a) => Tensor::F32($body),
            Tensor::F64($a) => Tensor::F64($body),
            Tensor::I64($a) => Tensor::I64($body),
        }
    };
}

/// Stacks the arrays of one variant along a new leading axis.
macro_rules! stack_variant {
    ($tensors:expr, $variant:ident) => {{
        let views = $tensors
            .iter()
            .filter_map(|t| match t {
                Tensor::$variant(a) => Some(a.view()),
                _ => None,
            })
            .collect::<Vec<_>>();
        ndarray::stack(Axis(0), &views).ok().map(Tensor::$variant)
    }};
}

/// A dynamically shaped numeric array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tensor {
    /// Array of `f32`.
    F32(ArrayD<f32>),

    /// Array of `f64`.
    F64(ArrayD<f64>),

    /// Array of `i64`.
    I64(ArrayD<i64>),
}

impl Tensor {
    /// Returns the element type.
    pub fn dtype(&self) -> DType {
        match self {
            Tensor::F32(_) => DType::F32,
            Tensor::F64(_) => DType::F64,
            Tensor::I64(_) => DType::I64,
        }
    }

    /// Returns the shape.
    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    /// Returns the number of dimensions.
    pub fn ndim(&self) -> usize {
        with_array!(self, a => a.ndim())
    }

    /// Returns the element type and shape.
    pub fn layout(&self) -> FieldLayout {
        FieldLayout {
            dtype: self.dtype(),
            shape: self.shape().to_vec(),
        }
    }

    /// Removes the first axis if it is a singleton batch dimension.
    ///
    /// Zero- and one-dimensional values are returned as they are.
    pub fn squeeze_first_dim(self) -> Self {
        if self.ndim() >= 2 && self.shape()[0] == 1 {
            map_array!(self, a => a.remove_axis(Axis(0)))
        } else {
            self
        }
    }

    /// Creates a batch of zero values with the given layout.
    ///
    /// Without a layout, the result is an `f32` array of shape `[0]`.
    pub fn empty(layout: Option<&FieldLayout>) -> Self {
        let (dtype, shape) = match layout {
            Some(layout) => (layout.dtype, layout.shape.as_slice()),
            None => (DType::F32, &[][..]),
        };
        let mut dims = vec![0];
        dims.extend_from_slice(shape);
        match dtype {
            DType::F32 => Tensor::F32(ArrayD::zeros(IxDyn(&dims))),
            DType::F64 => Tensor::F64(ArrayD::zeros(IxDyn(&dims))),
            DType::I64 => Tensor::I64(ArrayD::zeros(IxDyn(&dims))),
        }
    }

    /// Stacks tensors along a new leading batch axis.
    ///
    /// Returns `None` if `tensors` is empty or the tensors differ in element type or shape.
    pub fn stack(tensors: &[Tensor]) -> Option<Tensor> {
        let first = tensors.first()?;
        if tensors
            .iter()
            .any(|t| t.dtype() != first.dtype() || t.shape() != first.shape())
        {
            return None;
        }

        match first {
            Tensor::F32(_) => stack_variant!(tensors, F32),
            Tensor::F64(_) => stack_variant!(tensors, F64),
            Tensor::I64(_) => stack_variant!(tensors, I64),
        }
    }

    /// Returns the array if the element type is `f32`.
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Tensor::F32(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the array if the element type is `f64`.
    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            Tensor::F64(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the array if the element type is `i64`.
    pub fn as_i64(&self) -> Option<&ArrayD<i64>> {
        match self {
            Tensor::I64(a) => Some(a),
            _ => None,
        }
    }

    /// Converts the values into `f32`.
    pub fn to_f32(&self) -> ArrayD<f32> {
        match self {
            Tensor::F32(a) => a.clone(),
            Tensor::F64(a) => a.mapv(|x| x as f32),
            Tensor::I64(a) => a.mapv(|x| x as f32),
        }
    }
}

impl From<f32> for Tensor {
    fn from(v: f32) -> Self {
        Tensor::F32(arr0(v).into_dyn())
    }
}

impl From<f64> for Tensor {
    fn from(v: f64) -> Self {
        Tensor::F64(arr0(v).into_dyn())
    }
}

impl From<i64> for Tensor {
    fn from(v: i64) -> Self {
        Tensor::I64(arr0(v).into_dyn())
    }
}

impl From<i32> for Tensor {
    fn from(v: i32) -> Self {
        Tensor::I64(arr0(v as i64).into_dyn())
    }
}

impl From<Vec<f32>> for Tensor {
    fn from(v: Vec<f32>) -> Self {
        Tensor::F32(Array::from(v).into_dyn())
    }
}

impl From<Vec<f64>> for Tensor {
    fn from(v: Vec<f64>) -> Self {
        Tensor::F64(Array::from(v).into_dyn())
    }
}

impl From<Vec<i64>> for Tensor {
    fn from(v: Vec<i64>) -> Self {
        Tensor::I64(Array::from(v).into_dyn())
    }
}

impl From<&[f32]> for Tensor {
    fn from(v: &[f32]) -> Self {
        v.to_vec().into()
    }
}

impl<D: Dimension> From<Array<f32, D>> for Tensor {
    fn from(a: Array<f32, D>) -> Self {
        Tensor::F32(a.into_dyn())
    }
}

impl<D: Dimension> From<Array<f64, D>> for Tensor {
    fn from(a: Array<f64, D>) -> Self {
        Tensor::F64(a.into_dyn())
    }
}

impl<D: Dimension> From<Array<i64, D>> for Tensor {
    fn from(a: Array<i64, D>) -> Self {
        Tensor::I64(a.into_dyn())
    }
}

/// Canonicalizes the values of one field and pins the field's layout.
///
/// The first committed value establishes the layout. Later values with a different
/// element type or shape are rejected with [`ReplayError::Shape`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    field: &'static str,
    layout: Option<FieldLayout>,
}

impl Normalizer {
    /// Creates a normalizer without an established layout.
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            layout: None,
        }
    }

    /// Returns the name of the field.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Returns the established layout, if any.
    pub fn layout(&self) -> Option<&FieldLayout> {
        self.layout.as_ref()
    }

    /// Converts a raw value into its canonical form without committing its layout.
    pub fn canonicalize(&self, value: impl Into<Tensor>) -> Result<Tensor, ReplayError> {
        let value = value.into().squeeze_first_dim();
        self.check(&value)?;
        Ok(value)
    }

    /// Checks a canonical value against the established layout.
    pub fn check(&self, value: &Tensor) -> Result<(), ReplayError> {
        match &self.layout {
            Some(expected) if expected.dtype != value.dtype() || expected.shape != value.shape() => {
                Err(ReplayError::Shape {
                    field: self.field.to_string(),
                    expected: expected.clone(),
                    found: value.layout(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Establishes the layout from `value` if none is set yet.
    pub fn commit(&mut self, value: &Tensor) {
        if self.layout.is_none() {
            self.layout = Some(value.layout());
        }
    }

    /// Canonicalizes `value` and commits its layout.
    pub fn normalize(&mut self, value: impl Into<Tensor>) -> Result<Tensor, ReplayError> {
        let value = self.canonicalize(value)?;
        self.commit(&value);
        Ok(value)
    }

    /// Combines the layouts of two normalizers of the same field.
    pub fn merge(&self, other: &Normalizer) -> Result<Normalizer, ReplayError> {
        match (&self.layout, &other.layout) {
            (Some(expected), Some(found)) if expected != found => Err(ReplayError::Shape {
                field: self.field.to_string(),
                expected: expected.clone(),
                found: found.clone(),
            }),
            _ => Ok(Self {
                field: self.field,
                layout: self.layout.clone().or_else(|| other.layout.clone()),
            }),
        }
    }

    /// Forgets the established layout.
    pub fn reset(&mut self) {
        self.layout = None;
    }
}
