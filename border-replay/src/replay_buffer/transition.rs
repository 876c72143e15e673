//! A single interaction step.
use crate::{Info, Tensor};

/// One transition `(s_t, a_t, r_t, s_t+1, done_t)` with auxiliary information.
///
/// Transitions returned by [`ExperienceReplay::get`](super::ExperienceReplay::get) are copies;
/// modifying them does not affect the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State.
    pub state: Tensor,

    /// Action taken in `state`.
    pub action: Tensor,

    /// Reward.
    pub reward: f32,

    /// State after the action.
    pub next_state: Tensor,

    /// Flag denoting if the episode terminated with this transition.
    pub done: bool,

    /// Information defined by user.
    pub info: Info,
}

impl Transition {
    /// Constructs a [`Transition`] object.
    pub fn new(
        state: impl Into<Tensor>,
        action: impl Into<Tensor>,
        reward: f32,
        next_state: impl Into<Tensor>,
        done: bool,
        info: Info,
    ) -> Self {
        Self {
            state: state.into(),
            action: action.into(),
            reward,
            next_state: next_state.into(),
            done,
            info,
        }
    }
}
