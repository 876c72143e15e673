//! Reward processing for policy gradient methods.
//!
//! ```rust
//! use border_replay::rewards::{discount, normalize};
//! use ndarray::array;
//!
//! let rewards = array![1f32, 1., 5.];
//! let dones = array![0f32, 1., 0.];
//! let returns = discount(0.99, &rewards, &dones).unwrap();
//! assert!((returns[0] - 1.99).abs() < 1e-6);
//! assert_eq!(returns[2], 5.0);
//!
//! let targets = normalize(&returns, 1e-8);
//! assert!(targets.sum().abs() < 1e-5);
//! ```
use crate::error::ReplayError;
use ndarray::Array1;

/// Computes discounted returns `G_t = r_t + gamma * G_t+1`.
///
/// The accumulator is reset at every transition whose done flag is non-zero, so returns
/// never mix rewards of different episodes. The last transition is treated as followed
/// by a zero return.
pub fn discount(
    gamma: f32,
    rewards: &Array1<f32>,
    dones: &Array1<f32>,
) -> Result<Array1<f32>, ReplayError> {
    discount_with_bootstrap(gamma, rewards, dones, 0.0)
}

/// Computes discounted returns starting from a value estimate of the state following the
/// last transition.
///
/// `bootstrap` is ignored when the last transition is terminal.
pub fn discount_with_bootstrap(
    gamma: f32,
    rewards: &Array1<f32>,
    dones: &Array1<f32>,
    bootstrap: f32,
) -> Result<Array1<f32>, ReplayError> {
    if rewards.len() != dones.len() {
        return Err(ReplayError::LengthMismatch {
            rewards: rewards.len(),
            dones: dones.len(),
        });
    }

    let mut returns = Array1::zeros(rewards.len());
    let mut g = bootstrap;
    for ix in (0..rewards.len()).rev() {
        g = rewards[ix] + gamma * g * (1.0 - dones[ix]);
        returns[ix] = g;
    }
    Ok(returns)
}

/// Scales `values` to zero mean and unit variance.
///
/// The standard deviation is the unbiased estimate; `epsilon` keeps the division finite.
/// Fewer than two values are only centered.
pub fn normalize(values: &Array1<f32>, epsilon: f32) -> Array1<f32> {
    let n = values.len();
    let mean = match values.mean() {
        Some(mean) => mean,
        None => return values.clone(),
    };
    let centered = values.mapv(|v| v - mean);
    if n < 2 {
        return centered;
    }
    let std = (centered.mapv(|v| v * v).sum() / (n - 1) as f32).sqrt();
    centered / (std + epsilon)
}
