// The pattern generator behind the matrix fill loop.
//
// The real collaborator contract is `forward(batch, note_dropout)` returning
// raw onset probabilities; everything downstream only sees that trait. The
// default implementation is a weight-table generator: a per-cell onset
// probability prior, blended with whatever onsets survive note dropout on
// the input batch.

use std::path::Path;

use anyhow::{Context, ensure};
use rand::Rng;

use crate::pattern::Pattern;
use crate::shared::{LOOP_DURATION, NUM_CHANNELS, PATTERN_SHAPE};

pub struct ModelOutput {
    /// Raw onset probabilities, shape [batch, steps, NUM_CHANNELS].
    pub onsets: Pattern,
}

pub trait Inference {
    fn forward(&self, batch: &Pattern, note_dropout: f32) -> anyhow::Result<ModelOutput>;
}

/// Weight-table generator. `weights[step * NUM_CHANNELS + channel]` is the
/// prior probability of an onset in that cell.
pub struct SyncopateModel {
    weights: Vec<f32>,
}

impl SyncopateModel {
    /// Built-in prior: a loose 808 groove with the backbeat strong and
    /// everything else sparse enough that dropout noise matters.
    pub fn builtin() -> Self {
        let mut weights = vec![0.05; LOOP_DURATION * NUM_CHANNELS];
        // channel order matches the sample map: kick, snare, closed hat,
        // open hat, high tom, mid tom, low tom, crash, ride
        let accents: [(usize, &[usize], f32); 6] = [
            (0, &[0, 8], 0.9),        // kick on the downbeats
            (0, &[6, 10, 14], 0.3),   // syncopated kick candidates
            (1, &[4, 12], 0.85),      // snare backbeat
            (2, &[0, 2, 4, 6, 8, 10, 12, 14], 0.6), // eighth-note hats
            (3, &[7, 15], 0.25),      // open hat pickups
            (8, &[0], 0.2),           // occasional ride on the one
        ];
        for (channel, steps, p) in accents {
            for &step in steps {
                weights[step * NUM_CHANNELS + channel] = p;
            }
        }
        Self { weights }
    }

    /// Load a weight table from a JSON file: a flat array of
    /// LOOP_DURATION * NUM_CHANNELS probabilities.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model weights from {}", path.display()))?;
        let weights: Vec<f32> =
            serde_json::from_str(&raw).context("model weights are not a JSON float array")?;
        ensure!(
            weights.len() == LOOP_DURATION * NUM_CHANNELS,
            "model weight table has {} entries, expected {}",
            weights.len(),
            LOOP_DURATION * NUM_CHANNELS
        );
        ensure!(
            weights.iter().all(|w| (0.0..=1.0).contains(w)),
            "model weights out of [0, 1]"
        );
        Ok(Self { weights })
    }
}

impl Inference for SyncopateModel {
    fn forward(&self, batch: &Pattern, note_dropout: f32) -> anyhow::Result<ModelOutput> {
        let [batch_size, steps, in_channels] = batch.shape();
        ensure!(steps == LOOP_DURATION, "input batch has {steps} steps");
        ensure!(
            in_channels >= NUM_CHANNELS,
            "input batch has {in_channels} channels, expected at least {NUM_CHANNELS}"
        );

        let mut rng = rand::thread_rng();
        let mut out = Vec::with_capacity(batch_size * steps * NUM_CHANNELS);
        for b in 0..batch_size {
            for step in 0..steps {
                for channel in 0..NUM_CHANNELS {
                    // only the onset block of the input matters; velocity
                    // and offset channels ride along as zeros
                    let onset = batch.get(b, step, channel);
                    let kept = if rng.r#gen::<f32>() < note_dropout { 0.0 } else { onset };
                    let prior = self.weights[step * NUM_CHANNELS + channel];
                    let jitter = rng.r#gen::<f32>() * 0.3;
                    let p = (prior + 0.5 * kept + jitter - 0.15).clamp(0.0, 1.0);
                    out.push(p);
                }
            }
        }
        Ok(ModelOutput {
            onsets: Pattern::new(out, [batch_size, steps, NUM_CHANNELS])?,
        })
    }
}

/// Random seed onsets for the first forward pass, density 0.5.
pub fn random_onsets() -> Pattern {
    let mut rng = rand::thread_rng();
    let data = (0..PATTERN_SHAPE.iter().product::<usize>())
        .map(|_| if rng.r#gen::<f32>() > 0.5 { 1.0 } else { 0.0 })
        .collect();
    Pattern::new(data, PATTERN_SHAPE).expect("seed shape is constant")
}

/// Stack onsets with zeroed velocity and offset blocks along the channel
/// axis, then repeat along the batch axis to fill one inference batch.
pub fn build_input_batch(onsets: &Pattern, batch_size: usize) -> anyhow::Result<Pattern> {
    let velocities = Pattern::zeros(onsets.shape());
    let offsets = Pattern::zeros(onsets.shape());
    let input = onsets.concatenate(&velocities, 2)?.concatenate(&offsets, 2)?;

    let mut batch = input.clone();
    for _ in 0..batch_size.saturating_sub(1) {
        batch = batch.concatenate(&input, 0)?;
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::BATCH_SIZE;

    #[test]
    fn input_batch_has_three_channel_blocks() {
        let batch = build_input_batch(&random_onsets(), BATCH_SIZE).unwrap();
        assert_eq!(batch.shape(), [BATCH_SIZE, LOOP_DURATION, NUM_CHANNELS * 3]);
        // velocity and offset blocks stay zero
        for step in 0..LOOP_DURATION {
            for channel in NUM_CHANNELS..NUM_CHANNELS * 3 {
                assert_eq!(batch.get(0, step, channel), 0.0);
            }
        }
    }

    #[test]
    fn forward_outputs_probabilities_of_batch_shape() {
        let model = SyncopateModel::builtin();
        let batch = build_input_batch(&random_onsets(), BATCH_SIZE).unwrap();
        let out = model.forward(&batch, 0.4).unwrap();
        assert_eq!(out.onsets.shape(), [BATCH_SIZE, LOOP_DURATION, NUM_CHANNELS]);
        assert!(out.onsets.data().iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn missing_weight_file_is_an_error() {
        assert!(SyncopateModel::from_file(Path::new("/nonexistent/weights.json")).is_err());
    }
}
