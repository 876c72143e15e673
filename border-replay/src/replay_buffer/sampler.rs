//! Sampling transitions, windows and episodes.
use super::ExperienceReplay;
use crate::error::ReplayError;
use log::debug;
use rand::{rngs::StdRng, seq::index, Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{default::Default, ops::Range};

/// Request for [`ExperienceReplay::sample`].
///
/// | `episodes` | `contiguous` | result |
/// |---|---|---|
/// | `false` | `false` | `size` transitions drawn uniformly with replacement |
/// | `false` | `true` | `size` consecutive transitions |
/// | `true` | `false` | `size` distinct episodes drawn without replacement |
/// | `true` | `true` | `size` consecutive episodes |
///
/// ```rust
/// use border_replay::replay_buffer::SampleOptions;
///
/// let opts = SampleOptions::default().size(16).contiguous(true);
/// assert!(!opts.episodes);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SampleOptions {
    /// Number of transitions, or of episodes if `episodes` is set.
    pub size: usize,

    /// Keep the sampled items adjacent and in their original order.
    pub contiguous: bool,

    /// Sample whole episodes instead of transitions.
    pub episodes: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            size: 1,
            contiguous: false,
            episodes: false,
        }
    }
}

impl SampleOptions {
    /// Sets the number of items to sample.
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Sets whether sampled items are adjacent.
    pub fn contiguous(mut self, contiguous: bool) -> Self {
        self.contiguous = contiguous;
        self
    }

    /// Sets whether whole episodes are sampled.
    pub fn episodes(mut self, episodes: bool) -> Self {
        self.episodes = episodes;
        self
    }
}

impl ExperienceReplay {
    /// Samples a new buffer according to `opts`.
    ///
    /// A request with `size == 0`, or the default single transition request on an empty
    /// buffer, returns an empty buffer.
    ///
    /// Only terminated episodes are eligible for episode sampling. A trailing episode that
    /// has not terminated yet is eligible only if the buffer holds no terminated episode.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Sampling`] if `opts.size` exceeds the number of transitions or
    /// eligible episodes. The buffer is not modified in that case.
    ///
    /// # Arguments
    ///
    /// * `opts` - Number of items and sampling mode
    ///
    /// # Returns
    ///
    /// A new buffer holding copies of the sampled transitions
    pub fn sample(&mut self, opts: &SampleOptions) -> Result<Self, ReplayError> {
        if opts.size == 0 || (self.is_empty() && *opts == SampleOptions::default()) {
            return Ok(self.select(&[]));
        }

        let ixs = match (opts.episodes, opts.contiguous) {
            (false, false) => self.uniform_indices(opts.size)?,
            (false, true) => self.contiguous_indices(opts.size)?,
            (true, false) => self.episode_indices(opts.size)?,
            (true, true) => self.contiguous_episode_indices(opts.size)?,
        };
        debug!(
            "Sampled {} of {} transitions with {:?}",
            ixs.len(),
            self.len(),
            opts
        );

        let mut sample = self.select(&ixs);
        sample.rng = StdRng::seed_from_u64(self.rng.next_u64());
        Ok(sample)
    }

    /// Draws `size` indices uniformly with replacement.
    pub(super) fn uniform_indices(&mut self, size: usize) -> Result<Vec<usize>, ReplayError> {
        let len = self.len();
        check_size(size, len, "transitions")?;
        Ok((0..size).map(|_| self.rng.gen_range(0..len)).collect())
    }

    /// Draws the indices of a window of `size` consecutive transitions.
    fn contiguous_indices(&mut self, size: usize) -> Result<Vec<usize>, ReplayError> {
        let len = self.len();
        check_size(size, len, "transitions")?;
        let start = self.rng.gen_range(0..=len - size);
        Ok((start..start + size).collect())
    }

    /// Draws `size` distinct episodes and returns their indices in draw order.
    fn episode_indices(&mut self, size: usize) -> Result<Vec<usize>, ReplayError> {
        let episodes = self.eligible_episodes();
        check_size(size, episodes.len(), "episodes")?;
        Ok(index::sample(&mut self.rng, episodes.len(), size)
            .into_iter()
            .flat_map(|i| episodes[i].clone())
            .collect())
    }

    /// Draws the indices of `size` consecutive episodes.
    fn contiguous_episode_indices(&mut self, size: usize) -> Result<Vec<usize>, ReplayError> {
        let episodes = self.eligible_episodes();
        check_size(size, episodes.len(), "episodes")?;
        let first = self.rng.gen_range(0..=episodes.len() - size);
        Ok((episodes[first].start..episodes[first + size - 1].end).collect())
    }

    fn eligible_episodes(&self) -> Vec<Range<usize>> {
        let mut episodes = self.episode_ranges();
        let terminated = |r: &Range<usize>| self.dones[r.end - 1];
        if episodes.iter().any(terminated) {
            episodes.retain(terminated);
        }
        episodes
    }
}

fn check_size(requested: usize, available: usize, unit: &'static str) -> Result<(), ReplayError> {
    if requested > available {
        Err(ReplayError::Sampling {
            requested,
            available,
            unit,
        })
    } else {
        Ok(())
    }
}
