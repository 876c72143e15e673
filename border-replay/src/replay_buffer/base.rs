//! Append-only log of transitions.
use super::{ExperienceReplayConfig, Transition, TransitionBatch};
use crate::{
    error::ReplayError, rewards, ExperienceBufferBase, Info, Normalizer, ReplayBufferBase, Tensor,
};
use ndarray::Array1;
use rand::{rngs::StdRng, SeedableRng};
use std::ops::{Bound, Range, RangeBounds};

/// An ordered log of transitions for on-policy and off-policy training.
///
/// Transitions are stored column-wise in insertion order. States, actions and next states are
/// canonicalized on [`add`](Self::add): a leading singleton batch dimension is removed and the
/// first value of each field fixes the element type and shape of that field. Values of the
/// [`Info`] attached to each transition can be read back as columns with
/// [`field`](Self::field).
///
/// Slices, samples and concatenations are independent copies of the source buffer.
///
/// ```rust
/// use border_replay::{replay_buffer::ExperienceReplay, Info};
///
/// let mut replay = ExperienceReplay::new();
/// for i in 0..10 {
///     let state = vec![i as f32; 4];
///     let info = Info::empty().with("value", 0.5f64);
///     replay.add(state.clone(), 0i64, 1.0, state, i % 5 == 4, info).unwrap();
/// }
/// assert_eq!(replay.len(), 10);
/// assert_eq!(replay.states().shape(), &[10, 4]);
/// assert_eq!(replay.slice(-3..).len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ExperienceReplay {
    pub(super) states: Vec<Tensor>,
    pub(super) actions: Vec<Tensor>,
    pub(super) rewards: Vec<f32>,
    pub(super) next_states: Vec<Tensor>,
    pub(super) dones: Vec<bool>,
    pub(super) infos: Vec<Info>,
    pub(super) state_normalizer: Normalizer,
    pub(super) action_normalizer: Normalizer,
    pub(super) next_state_normalizer: Normalizer,
    pub(super) rng: StdRng,
}

impl Default for ExperienceReplay {
    fn default() -> Self {
        Self::build(&ExperienceReplayConfig::default())
    }
}

/// Resolves a possibly end-relative index.
fn resolve_index(ix: isize, len: usize) -> isize {
    if ix < 0 {
        ix + len as isize
    } else {
        ix
    }
}

fn clamp_index(ix: isize, len: usize) -> usize {
    ix.max(0).min(len as isize) as usize
}

fn stack_column(values: &[Tensor], normalizer: &Normalizer) -> Tensor {
    match Tensor::stack(values) {
        Some(t) => t,
        None => {
            debug_assert!(
                values.is_empty(),
                "column `{}` holds values of different layouts",
                normalizer.field()
            );
            Tensor::empty(normalizer.layout())
        }
    }
}

impl ExperienceReplay {
    /// Creates an empty buffer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transition.
    ///
    /// # Arguments
    ///
    /// * `state` - State, with or without a leading batch dimension of size 1
    /// * `action` - Action taken in `state`
    /// * `reward` - Reward of the step
    /// * `next_state` - State after the action
    /// * `done` - `true` if the episode terminated with this step
    /// * `info` - Auxiliary values, e.g., the log-probability of the action
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Shape`] if `state`, `action` or `next_state` does not match the
    /// layout established for its field. The buffer is unchanged in that case.
    pub fn add(
        &mut self,
        state: impl Into<Tensor>,
        action: impl Into<Tensor>,
        reward: f32,
        next_state: impl Into<Tensor>,
        done: bool,
        info: Info,
    ) -> Result<(), ReplayError> {
        let state = self.state_normalizer.canonicalize(state)?;
        let action = self.action_normalizer.canonicalize(action)?;
        let next_state = self.next_state_normalizer.canonicalize(next_state)?;

        self.state_normalizer.commit(&state);
        self.action_normalizer.commit(&action);
        self.next_state_normalizer.commit(&next_state);

        self.states.push(state);
        self.actions.push(action);
        self.rewards.push(reward);
        self.next_states.push(next_state);
        self.dones.push(done);
        self.infos.push(info);
        Ok(())
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if the buffer holds no transition.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Removes all transitions and forgets the layouts of the fields.
    pub fn empty(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.next_states.clear();
        self.dones.clear();
        self.infos.clear();
        self.state_normalizer.reset();
        self.action_normalizer.reset();
        self.next_state_normalizer.reset();
    }

    pub(super) fn transition(&self, ix: usize) -> Transition {
        Transition {
            state: self.states[ix].clone(),
            action: self.actions[ix].clone(),
            reward: self.rewards[ix],
            next_state: self.next_states[ix].clone(),
            done: self.dones[ix],
            info: self.infos[ix].clone(),
        }
    }

    /// Returns a copy of the transition at `index`.
    ///
    /// Negative indices count from the end, `-1` being the last transition.
    pub fn get(&self, index: isize) -> Option<Transition> {
        let ix = resolve_index(index, self.len());
        if ix < 0 || ix as usize >= self.len() {
            None
        } else {
            Some(self.transition(ix as usize))
        }
    }

    /// Returns an iterator over copies of the stored transitions.
    pub fn iter(&self) -> impl Iterator<Item = Transition> + '_ {
        (0..self.len()).map(move |ix| self.transition(ix))
    }

    /// Returns a new buffer with the transitions in `range`.
    ///
    /// Negative bounds count from the end and bounds beyond the buffer are clamped, so
    /// `replay.slice(-5..)` holds the last five transitions, or fewer if the buffer is shorter.
    pub fn slice<R: RangeBounds<isize>>(&self, range: R) -> Self {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => resolve_index(s, len),
            Bound::Excluded(&s) => resolve_index(s, len).saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => resolve_index(e, len).saturating_add(1),
            Bound::Excluded(&e) => resolve_index(e, len),
            Bound::Unbounded => len as isize,
        };
        let (start, end) = (clamp_index(start, len), clamp_index(end, len));
        let ixs = (start..end.max(start)).collect::<Vec<_>>();
        self.select(&ixs)
    }

    /// Returns a new buffer with the transitions at `ixs`, in that order.
    ///
    /// Panics if an index is out of range.
    pub(crate) fn select(&self, ixs: &[usize]) -> Self {
        Self {
            states: ixs.iter().map(|&ix| self.states[ix].clone()).collect(),
            actions: ixs.iter().map(|&ix| self.actions[ix].clone()).collect(),
            rewards: ixs.iter().map(|&ix| self.rewards[ix]).collect(),
            next_states: ixs.iter().map(|&ix| self.next_states[ix].clone()).collect(),
            dones: ixs.iter().map(|&ix| self.dones[ix]).collect(),
            infos: ixs.iter().map(|&ix| self.infos[ix].clone()).collect(),
            state_normalizer: self.state_normalizer.clone(),
            action_normalizer: self.action_normalizer.clone(),
            next_state_normalizer: self.next_state_normalizer.clone(),
            rng: self.rng.clone(),
        }
    }

    /// Returns a new buffer with the transitions of `self` followed by those of `other`.
    ///
    /// Both inputs are left unchanged.
    pub fn concatenated(&self, other: &Self) -> Result<Self, ReplayError> {
        let mut replay = self.clone();
        replay.extend_in_place(other)?;
        Ok(replay)
    }

    /// Appends the transitions of `other` to `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Shape`] if the two buffers established different layouts for a
    /// field. Nothing is appended in that case.
    pub fn extend_in_place(&mut self, other: &Self) -> Result<(), ReplayError> {
        let state_normalizer = self.state_normalizer.merge(&other.state_normalizer)?;
        let action_normalizer = self.action_normalizer.merge(&other.action_normalizer)?;
        let next_state_normalizer = self
            .next_state_normalizer
            .merge(&other.next_state_normalizer)?;

        self.states.extend_from_slice(&other.states);
        self.actions.extend_from_slice(&other.actions);
        self.rewards.extend_from_slice(&other.rewards);
        self.next_states.extend_from_slice(&other.next_states);
        self.dones.extend_from_slice(&other.dones);
        self.infos.extend_from_slice(&other.infos);
        self.state_normalizer = state_normalizer;
        self.action_normalizer = action_normalizer;
        self.next_state_normalizer = next_state_normalizer;
        Ok(())
    }

    /// Builds a buffer from transitions, stopping at the first one that fails to normalize.
    pub fn from_transitions(
        config: &ExperienceReplayConfig,
        transitions: impl IntoIterator<Item = Transition>,
    ) -> Result<Self, ReplayError> {
        let mut replay = Self::build(config);
        for Transition {
            state,
            action,
            reward,
            next_state,
            done,
            info,
        } in transitions
        {
            replay.add(state, action, reward, next_state, done, info)?;
        }
        Ok(replay)
    }

    /// Returns all states stacked into shape `[len, ..]`.
    pub fn states(&self) -> Tensor {
        stack_column(&self.states, &self.state_normalizer)
    }

    /// Returns all actions stacked into shape `[len, ..]`.
    pub fn actions(&self) -> Tensor {
        stack_column(&self.actions, &self.action_normalizer)
    }

    /// Returns all next states stacked into shape `[len, ..]`.
    pub fn next_states(&self) -> Tensor {
        stack_column(&self.next_states, &self.next_state_normalizer)
    }

    /// Returns all rewards.
    pub fn rewards(&self) -> Array1<f32> {
        Array1::from(self.rewards.clone())
    }

    /// Returns all done flags as `1.0` (terminal) or `0.0`.
    pub fn dones(&self) -> Array1<f32> {
        self.dones
            .iter()
            .map(|&done| if done { 1.0 } else { 0.0 })
            .collect()
    }

    /// Returns the info of every transition.
    pub fn infos(&self) -> &[Info] {
        &self.infos
    }

    /// Returns the number of terminal transitions in the buffer.
    pub fn num_terminated_flags(&self) -> usize {
        self.dones.iter().filter(|&&done| done).count()
    }

    /// Returns the sum of all rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Splits the buffer into episodes.
    ///
    /// Each range ends with a terminal transition, except the last one when the buffer ends
    /// in the middle of an episode.
    pub fn episode_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for (ix, &done) in self.dones.iter().enumerate() {
            if done {
                ranges.push(start..ix + 1);
                start = ix + 1;
            }
        }
        if start < self.len() {
            ranges.push(start..self.len());
        }
        ranges
    }

    /// Computes discounted returns that do not cross episode boundaries.
    ///
    /// See [`rewards::discount`].
    pub fn discounted_returns(&self, gamma: f32) -> Result<Array1<f32>, ReplayError> {
        rewards::discount(gamma, &self.rewards(), &self.dones())
    }

    /// Stacks every transition into a [`TransitionBatch`].
    pub fn to_batch(&self) -> TransitionBatch {
        TransitionBatch {
            states: self.states(),
            actions: self.actions(),
            next_states: self.next_states(),
            rewards: self.rewards(),
            dones: self.dones(),
            ix_sample: (0..self.len()).collect(),
        }
    }
}

impl ExperienceBufferBase for ExperienceReplay {
    type Item = Transition;

    fn push(&mut self, tr: Self::Item) -> anyhow::Result<()> {
        let Transition {
            state,
            action,
            reward,
            next_state,
            done,
            info,
        } = tr;
        self.add(state, action, reward, next_state, done, info)?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.rewards.len()
    }
}

impl ReplayBufferBase for ExperienceReplay {
    type Config = ExperienceReplayConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;
        Self {
            states: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            next_states: Vec::with_capacity(capacity),
            dones: Vec::with_capacity(capacity),
            infos: Vec::with_capacity(capacity),
            state_normalizer: Normalizer::new("states"),
            action_normalizer: Normalizer::new("actions"),
            next_state_normalizer: Normalizer::new("next_states"),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Samples `size` transitions uniformly with replacement and stacks them.
    fn batch(&mut self, size: usize) -> anyhow::Result<Self::Batch> {
        let ixs = self.uniform_indices(size)?;
        let mut batch = self.select(&ixs).to_batch();
        batch.ix_sample = ixs;
        Ok(batch)
    }
}
