//! Errors in the library.
use crate::FieldLayout;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// A value does not match the layout already established for its field.
    #[error("Shape error in field `{field}`: expected {expected}, found {found}")]
    Shape {
        /// Name of the field.
        field: String,
        /// Layout established by earlier values.
        expected: FieldLayout,
        /// Layout of the rejected value.
        found: FieldLayout,
    },

    /// More items were requested than the buffer holds.
    #[error("Sampling error: requested {requested} {unit}, but only {available} available")]
    Sampling {
        /// Requested sample size.
        requested: usize,
        /// Number of items available for sampling.
        available: usize,
        /// Unit of the sample, `transitions` or `episodes`.
        unit: &'static str,
    },

    /// A persisted buffer could not be written or restored.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Info key error.
    #[error("Info key error: {0}")]
    InfoKey(String),

    /// Info value type error.
    #[error("Info value type error: {0}")]
    InfoValueType(String),

    /// Rewards and done flags differ in length.
    #[error("Length mismatch: {rewards} rewards, {dones} done flags")]
    LengthMismatch {
        /// Number of rewards.
        rewards: usize,
        /// Number of done flags.
        dones: usize,
    },
}
