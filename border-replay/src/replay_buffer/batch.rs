//! Stacked transitions for gradient computation.
use crate::Tensor;
use ndarray::Array1;

/// Transitions stacked along a leading batch axis.
///
/// Each field has shape `[batch_size, ..]`, where the trailing dimensions are the layout of
/// the corresponding field in the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// States.
    pub states: Tensor,

    /// Actions.
    pub actions: Tensor,

    /// Next states.
    pub next_states: Tensor,

    /// Rewards.
    pub rewards: Array1<f32>,

    /// Done flags, `1.0` for terminal transitions.
    pub dones: Array1<f32>,

    /// Indices of the sampled transitions in the source buffer.
    pub ix_sample: Vec<usize>,
}

impl TransitionBatch {
    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Unpack the data `(s_t, a_t, s_t+1, r_t, done_t, ix_sample)`.
    pub fn unpack(self) -> (Tensor, Tensor, Tensor, Array1<f32>, Array1<f32>, Vec<usize>) {
        (
            self.states,
            self.actions,
            self.next_states,
            self.rewards,
            self.dones,
            self.ix_sample,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{replay_buffer::ExperienceReplay, Info};

    #[test]
    fn test_unpack() {
        let mut replay = ExperienceReplay::new();
        for i in 0..3 {
            replay
                .add(vec![i as f32; 2], i as i64, 0.5, vec![i as f32 + 1.; 2], i == 2, Info::empty())
                .unwrap();
        }
        let batch = replay.slice(1..).to_batch();
        assert_eq!(batch.len(), 2);

        let (states, actions, next_states, rewards, dones, ix_sample) = batch.unpack();
        assert_eq!(states.shape(), &[2, 2]);
        assert_eq!(states.as_f32().unwrap()[[0, 0]], 1.0);
        assert_eq!(actions.as_i64().unwrap()[[1]], 2);
        assert_eq!(next_states.as_f32().unwrap()[[1, 1]], 3.0);
        assert_eq!(rewards.to_vec(), vec![0.5, 0.5]);
        assert_eq!(dones.to_vec(), vec![0.0, 1.0]);
        assert_eq!(ix_sample, vec![0, 1]);
    }
}
