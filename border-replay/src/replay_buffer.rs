//! Experience replay for actor-critic and related algorithms.
//!
//! [`ExperienceReplay`] records transitions in the order they are collected, exposes them
//! as stacked arrays, samples transitions, windows or whole episodes, and persists itself
//! to a single file.
//!
//! ```rust
//! use border_replay::{
//!     replay_buffer::{ExperienceReplay, Field, SampleOptions},
//!     rewards, Info,
//! };
//!
//! let mut replay = ExperienceReplay::new();
//! for step in 0..20 {
//!     let state = vec![step as f32; 3];
//!     let info = Info::empty().with("log_prob", -0.5f64);
//!     replay.add(state.clone(), 1i64, 1.0, state, step % 5 == 4, info).unwrap();
//! }
//!
//! let returns = rewards::normalize(&replay.discounted_returns(0.99).unwrap(), 1e-8);
//! assert_eq!(returns.len(), 20);
//!
//! match replay.field("log_probs").unwrap() {
//!     Field::Stacked(t) => assert_eq!(t.shape(), &[20]),
//!     Field::List(_) => unreachable!(),
//! }
//!
//! let episodes = replay.sample(&SampleOptions::default().size(2).episodes(true)).unwrap();
//! assert_eq!(episodes.num_terminated_flags(), 2);
//! ```
mod base;
mod batch;
mod config;
mod persistence;
mod projector;
mod sampler;
mod transition;
pub use base::ExperienceReplay;
pub use batch::TransitionBatch;
pub use config::ExperienceReplayConfig;
pub use projector::Field;
pub use sampler::SampleOptions;
pub use transition::Transition;
