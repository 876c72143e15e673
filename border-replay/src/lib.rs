#![warn(missing_docs)]
//! Experience replay for reinforcement learning.
//!
//! The main entry point is [`ExperienceReplay`](replay_buffer::ExperienceReplay), an ordered
//! log of transitions that feeds policy updates. Discounted returns are computed with
//! [`rewards::discount`].
pub mod error;
pub mod replay_buffer;
pub mod rewards;

mod base;
pub use base::{ExperienceBufferBase, ReplayBufferBase};

mod info;
pub use info::{Info, InfoValue};

mod tensor;
pub use tensor::{DType, FieldLayout, Normalizer, Tensor};
