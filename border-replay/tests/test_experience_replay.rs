use anyhow::Result;
use border_replay::{
    replay_buffer::{ExperienceReplay, ExperienceReplayConfig, Field, SampleOptions},
    rewards, ExperienceBufferBase, Info, InfoValue, ReplayBufferBase,
};
use ndarray::{Array1, Array2};
use tempdir::TempDir;

const DIM_OBS: usize = 4;
const EPISODE_LEN: usize = 8;
const N_EPISODES: usize = 5;
const DISCOUNT_FACTOR: f32 = 0.99;

/// Fills a buffer the way a rollout loop would, with a batched observation every other step.
fn rollout(replay: &mut ExperienceReplay) -> Result<()> {
    for episode in 0..N_EPISODES {
        for step in 0..EPISODE_LEN {
            let obs = Array1::<f32>::from_elem(DIM_OBS, step as f32);
            let next_obs = Array1::<f32>::from_elem(DIM_OBS, step as f32 + 1.);
            let info = Info::empty()
                .with("log_prob", -0.1f64 * step as f64)
                .with("value", Array2::<f32>::from_elem((1, 1), 0.5))
                .with("episode", episode);
            let done = step == EPISODE_LEN - 1;
            if step % 2 == 0 {
                replay.add(obs, 1i64, 1.0, next_obs, done, info)?;
            } else {
                let obs = obs.insert_axis(ndarray::Axis(0));
                replay.add(obs, 0i64, 1.0, next_obs, done, info)?;
            }
        }
    }
    Ok(())
}

#[test]
fn test_policy_gradient_update() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut replay = ExperienceReplay::build(&ExperienceReplayConfig::default().capacity(64));
    rollout(&mut replay)?;

    assert_eq!(replay.len(), N_EPISODES * EPISODE_LEN);
    assert_eq!(replay.states().shape(), &[N_EPISODES * EPISODE_LEN, DIM_OBS]);
    assert_eq!(replay.actions().shape(), &[N_EPISODES * EPISODE_LEN]);
    assert_eq!(replay.num_terminated_flags(), N_EPISODES);

    let returns = replay.discounted_returns(DISCOUNT_FACTOR)?;
    let first = (0..EPISODE_LEN).fold(0., |g, _| 1. + DISCOUNT_FACTOR * g);
    assert!((returns[0] - first).abs() < 1e-4);
    assert_eq!(returns[EPISODE_LEN - 1], 1.0);
    assert!((returns[EPISODE_LEN] - first).abs() < 1e-4);

    let log_probs = replay.field("log_probs").unwrap();
    assert_eq!(log_probs.as_stacked().unwrap().shape(), &[N_EPISODES * EPISODE_LEN]);
    let values = replay.field("values").unwrap();
    assert_eq!(values.as_stacked().unwrap().shape(), &[N_EPISODES * EPISODE_LEN, 1]);

    let values = values.as_stacked().unwrap().to_f32().into_shape(returns.len())?;
    let advantages = rewards::normalize(&(&returns - &values), 1e-8);
    assert_eq!(advantages.len(), replay.len());

    replay.empty();
    assert!(replay.is_empty());
    Ok(())
}

#[test]
fn test_sample_episodes_for_update() -> Result<()> {
    let mut replay = ExperienceReplay::new();
    rollout(&mut replay)?;

    let batch = replay.sample(&SampleOptions::default().size(2).episodes(true))?;
    assert_eq!(batch.len(), 2 * EPISODE_LEN);
    assert_eq!(batch.num_terminated_flags(), 2);
    let episodes = match batch.field("episode").unwrap() {
        Field::Stacked(t) => t.as_i64().unwrap().iter().copied().collect::<Vec<_>>(),
        Field::List(_) => panic!("episode ids should stack"),
    };
    assert_ne!(episodes[0], episodes[EPISODE_LEN]);

    let window = replay.sample(&SampleOptions::default().size(3).contiguous(true))?;
    assert_eq!(window.len(), 3);

    let minibatch = replay.batch(16)?;
    assert_eq!(minibatch.states.shape(), &[16, DIM_OBS]);
    assert_eq!(minibatch.ix_sample.len(), 16);
    Ok(())
}

#[test]
fn test_collect_in_parts_and_concatenate() -> Result<()> {
    let mut a = ExperienceReplay::new();
    let mut b = ExperienceReplay::new();
    rollout(&mut a)?;
    rollout(&mut b)?;

    let all = a.concatenated(&b)?;
    assert_eq!(all.len(), a.len() + b.len());
    assert_eq!(all.sum_rewards(), a.sum_rewards() + b.sum_rewards());

    let mut pushed = ExperienceReplay::new();
    for tr in all.slice(-(EPISODE_LEN as isize)..).iter() {
        pushed.push(tr)?;
    }
    assert_eq!(ExperienceBufferBase::len(&pushed), EPISODE_LEN);
    assert!(pushed.get(-1).unwrap().done);
    Ok(())
}

#[test]
fn test_save_and_resume() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new("experience_replay")?;

    let config = ExperienceReplayConfig::default().seed(7);
    config.save(dir.path().join("config.yaml"))?;

    let mut replay = ExperienceReplay::build(&config);
    rollout(&mut replay)?;
    replay.save(dir.path().join("replay.bin"))?;

    let config = ExperienceReplayConfig::load(dir.path().join("config.yaml"))?;
    let mut resumed = ExperienceReplay::build(&config);
    resumed.load(dir.path().join("replay.bin"))?;

    assert_eq!(resumed.len(), replay.len());
    assert_eq!(resumed.states(), replay.states());
    assert_eq!(resumed.dones(), replay.dones());
    assert_eq!(resumed.field("log_prob"), replay.field("log_prob"));
    assert_eq!(
        resumed.get(3).unwrap().info.get("episode"),
        Some(&InfoValue::Int(0))
    );

    // The loaded buffer keeps collecting with the same layouts
    rollout(&mut resumed)?;
    assert_eq!(resumed.len(), 2 * replay.len());
    Ok(())
}
