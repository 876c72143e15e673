//! Configuration of [`ExperienceReplay`](super::ExperienceReplay).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ExperienceReplay`](super::ExperienceReplay).
///
/// ```rust
/// use border_replay::replay_buffer::ExperienceReplayConfig;
///
/// let config = ExperienceReplayConfig::default().capacity(4096).seed(7);
/// assert_eq!(config.seed, 7);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ExperienceReplayConfig {
    /// Number of transitions to preallocate. The buffer grows beyond it when needed.
    pub capacity: usize,

    /// Random seed used for sampling.
    pub seed: u64,
}

impl Default for ExperienceReplayConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            seed: 42,
        }
    }
}

impl ExperienceReplayConfig {
    /// Sets the number of transitions to preallocate.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Constructs [`ExperienceReplayConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ExperienceReplayConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_experience_replay_config() -> Result<()> {
        let config = ExperienceReplayConfig::default().capacity(100).seed(1234);

        let dir = TempDir::new("experience_replay_config")?;
        let path = dir.path().join("experience_replay_config.yaml");

        config.save(&path)?;
        let config_ = ExperienceReplayConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
