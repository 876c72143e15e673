//! Saving and loading buffers.
//!
//! A buffer is written as a single bincode artifact holding every column. Floats are stored
//! bit for bit and info values keep their nesting. Field layouts are not stored; they are
//! rebuilt from the loaded values.
use super::ExperienceReplay;
use crate::{error::ReplayError, Info, Normalizer, Tensor};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    states: &'a [Tensor],
    actions: &'a [Tensor],
    rewards: &'a [f32],
    next_states: &'a [Tensor],
    dones: &'a [bool],
    infos: &'a [Info],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    states: Vec<Tensor>,
    actions: Vec<Tensor>,
    rewards: Vec<f32>,
    next_states: Vec<Tensor>,
    dones: Vec<bool>,
    infos: Vec<Info>,
}

/// Rebuilds the layout of a column from its values.
fn restore_normalizer(field: &'static str, values: &[Tensor]) -> Result<Normalizer, ReplayError> {
    let mut normalizer = Normalizer::new(field);
    for value in values {
        normalizer
            .check(value)
            .map_err(|e| ReplayError::Persistence(e.to_string()))?;
        normalizer.commit(value);
    }
    Ok(normalizer)
}

impl ExperienceReplay {
    /// Writes all transitions to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ReplayError> {
        let snapshot = SnapshotRef {
            version: FORMAT_VERSION,
            states: &self.states,
            actions: &self.actions,
            rewards: &self.rewards,
            next_states: &self.next_states,
            dones: &self.dones,
            infos: &self.infos,
        };
        bincode::serialize_into(writer, &snapshot)
            .map_err(|e| ReplayError::Persistence(format!("Failed to serialize buffer: {}", e)))
    }

    /// Replaces the content of the buffer with transitions read from `reader`.
    ///
    /// The buffer is unchanged if reading fails.
    pub fn read_from<R: Read>(&mut self, reader: R) -> Result<(), ReplayError> {
        let snapshot: Snapshot = bincode::deserialize_from(reader)
            .map_err(|e| ReplayError::Persistence(format!("Corrupt artifact: {}", e)))?;

        if snapshot.version != FORMAT_VERSION {
            return Err(ReplayError::Persistence(format!(
                "Unsupported format version {}, expected {}",
                snapshot.version, FORMAT_VERSION
            )));
        }

        let len = snapshot.rewards.len();
        let lens = [
            snapshot.states.len(),
            snapshot.actions.len(),
            snapshot.next_states.len(),
            snapshot.dones.len(),
            snapshot.infos.len(),
        ];
        if lens.iter().any(|&l| l != len) {
            return Err(ReplayError::Persistence(format!(
                "Columns differ in length: {} rewards, {:?} others",
                len, lens
            )));
        }

        let state_normalizer = restore_normalizer("states", &snapshot.states)?;
        let action_normalizer = restore_normalizer("actions", &snapshot.actions)?;
        let next_state_normalizer = restore_normalizer("next_states", &snapshot.next_states)?;

        self.states = snapshot.states;
        self.actions = snapshot.actions;
        self.rewards = snapshot.rewards;
        self.next_states = snapshot.next_states;
        self.dones = snapshot.dones;
        self.infos = snapshot.infos;
        self.state_normalizer = state_normalizer;
        self.action_normalizer = action_normalizer;
        self.next_state_normalizer = next_state_normalizer;
        Ok(())
    }

    /// Saves all transitions to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            ReplayError::Persistence(format!("Failed to create {:?}: {}", path, e))
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer
            .flush()
            .map_err(|e| ReplayError::Persistence(format!("Failed to write {:?}: {}", path, e)))?;
        info!("Saved {} transitions to {:?}", self.len(), path);
        Ok(())
    }

    /// Replaces the content of the buffer with transitions loaded from a file.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ReplayError::Persistence(format!("Failed to open {:?}: {}", path, e)))?;
        self.read_from(BufReader::new(file))?;
        info!("Loaded {} transitions from {:?}", self.len(), path);
        Ok(())
    }
}
