// The session controller: owns the pattern matrix, the model phase, the
// part binder and the playing flag. All operations degrade to logged
// diagnostics rather than hard failures so the transport never stops on
// an error.

use crossbeam_channel::Sender;
use log::{debug, error, warn};
use rand::Rng;

use crate::audio_api::AudioCommand;
use crate::model::{Inference, build_input_batch, random_onsets};
use crate::notes::{DrumMap, extract_notes};
use crate::pattern::{Pattern, PatternMatrix, apply_onset_threshold};
use crate::sched::{PartBinder, PartScheduler};
use crate::shared::{BATCH_SIZE, LOOP_DURATION, NUM_CHANNELS, NUM_SAMPLES, PATTERN_SHAPE};
use crate::vis::{VAR_NOTE_ON, VAR_PLAYING, VisValue, Visualization, to_one_hot_grid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelPhase {
    /// Model constructed, matrix still filling.
    Loading,
    /// Matrix fully populated; sampling is allowed.
    Ready,
    /// Model construction or inference failed; permanently not ready.
    Failed,
}

pub struct Session {
    phase: ModelPhase,
    model: Option<Box<dyn Inference>>,
    matrix: PatternMatrix,
    input_batch: Option<Pattern>,
    next_row: usize,
    binder: PartBinder,
    playing: bool,
    note_dropout: f32,
    onset_threshold: f32,
    drum_map: DrumMap,
    instrument_names: Vec<&'static str>,
}

impl Session {
    pub fn new(
        model: anyhow::Result<Box<dyn Inference>>,
        drum_map: DrumMap,
        instrument_names: Vec<&'static str>,
        note_dropout: f32,
        onset_threshold: f32,
    ) -> Self {
        let rows = NUM_SAMPLES / BATCH_SIZE;
        let matrix = PatternMatrix::new(PATTERN_SHAPE, rows, BATCH_SIZE);

        let (phase, model, input_batch) = match model {
            Ok(model) => match build_input_batch(&random_onsets(), BATCH_SIZE) {
                Ok(batch) => {
                    debug!("model loaded");
                    (ModelPhase::Loading, Some(model), Some(batch))
                }
                Err(e) => {
                    error!("could not build input batch: {e:#}");
                    (ModelPhase::Failed, None, None)
                }
            },
            Err(e) => {
                error!("model failed to load: {e:#}");
                (ModelPhase::Failed, None, None)
            }
        };

        Self {
            phase,
            model,
            matrix,
            input_batch,
            next_row: 0,
            binder: PartBinder::new(),
            playing: true,
            note_dropout,
            onset_threshold,
            drum_map,
            instrument_names,
        }
    }

    pub fn phase(&self) -> ModelPhase {
        self.phase
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    /// One generation batch per call, so the fill interleaves with the
    /// event loop instead of blocking it. No-op once ready or failed.
    pub fn tick_fill(&mut self) {
        if self.phase != ModelPhase::Loading || self.next_row >= self.matrix.rows() {
            return;
        }
        let (Some(model), Some(batch)) = (self.model.as_ref(), self.input_batch.as_ref()) else {
            return;
        };

        let row = self.next_row;
        let result = model.forward(batch, self.note_dropout).and_then(|output| {
            let onsets = apply_onset_threshold(
                output.onsets.data(),
                [BATCH_SIZE, LOOP_DURATION, NUM_CHANNELS],
                self.onset_threshold,
            )?;
            for col in 0..BATCH_SIZE {
                self.matrix.append(onsets.batch_item(col).to_vec(), row, col)?;
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                self.next_row += 1;
                if self.matrix.is_ready() {
                    self.phase = ModelPhase::Ready;
                    debug!("data matrix ready");
                }
            }
            Err(e) => {
                error!("pattern generation failed: {e:#}");
                self.phase = ModelPhase::Failed;
            }
        }
    }

    /// Pick a random cell from the matrix. Warns and returns None until
    /// the matrix is fully populated.
    pub fn sample_pattern(&mut self) -> Option<Pattern> {
        if self.phase != ModelPhase::Ready {
            warn!("pattern data has not finished generating yet");
            return None;
        }
        let mut rng = rand::thread_rng();
        let row = rng.gen_range(0..self.matrix.rows());
        let col = rng.gen_range(0..self.matrix.cols());
        self.matrix.cell(row, col)
    }

    /// The global trigger: sample, extract, rebind playback, push the grid.
    pub fn syncopate(&mut self, sched: &mut dyn PartScheduler, vis: &mut dyn Visualization) {
        let Some(pattern) = self.sample_pattern() else {
            return;
        };
        let notes = extract_notes(&pattern, &self.drum_map);
        self.binder.bind(sched, &notes);

        let grid = to_one_hot_grid(&notes, &self.instrument_names);
        vis.set_variable(VAR_NOTE_ON, VisValue::Grid(grid));
    }

    /// Stop or start the transport loop and the active part in lockstep.
    pub fn play_pause(&mut self, transport: &Sender<AudioCommand>, vis: &mut dyn Visualization) {
        self.playing = !self.playing;
        let cmd = if self.playing {
            AudioCommand::TransportStart
        } else {
            AudioCommand::TransportStop
        };
        let _ = transport.try_send(cmd);
        vis.set_variable(VAR_PLAYING, VisValue::Flag(self.playing));
    }

    /// Status line for the view.
    pub fn status(&self) -> String {
        match self.phase {
            ModelPhase::Loading => {
                format!("generating {}/{}", self.matrix.filled(), NUM_SAMPLES)
            }
            ModelPhase::Ready => String::from("ready - enter to syncopate"),
            ModelPhase::Failed => String::from("model failed to load"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelOutput;
    use crate::players::instrument_names;
    use crate::sched::{PartId, TriggerEvent, next_part_id};

    /// Deterministic stand-in: every cell comes back as a certain onset.
    struct AllOnsets;

    impl Inference for AllOnsets {
        fn forward(&self, batch: &Pattern, _note_dropout: f32) -> anyhow::Result<ModelOutput> {
            let [b, s, _] = batch.shape();
            Ok(ModelOutput {
                onsets: Pattern::new(vec![0.9; b * s * NUM_CHANNELS], [b, s, NUM_CHANNELS])?,
            })
        }
    }

    #[derive(Default)]
    struct RecordingScheduler {
        started: Vec<Vec<TriggerEvent>>,
        stopped: Vec<PartId>,
    }

    impl PartScheduler for RecordingScheduler {
        fn start(&mut self, events: Vec<TriggerEvent>) -> PartId {
            self.started.push(events);
            next_part_id()
        }

        fn stop(&mut self, id: PartId) {
            self.stopped.push(id);
        }
    }

    #[derive(Default)]
    struct RecordingVis {
        vars: Vec<(String, VisValue)>,
    }

    impl Visualization for RecordingVis {
        fn set_variable(&mut self, name: &str, value: VisValue) {
            self.vars.push((name.to_string(), value));
        }
    }

    fn ready_session() -> Session {
        let mut session = Session::new(
            Ok(Box::new(AllOnsets)),
            DrumMap::standard(),
            instrument_names(),
            0.4,
            0.4,
        );
        for _ in 0..NUM_SAMPLES / BATCH_SIZE {
            session.tick_fill();
        }
        session
    }

    #[test]
    fn fill_progresses_one_batch_per_tick() {
        let mut session = Session::new(
            Ok(Box::new(AllOnsets)),
            DrumMap::standard(),
            instrument_names(),
            0.4,
            0.4,
        );
        assert_eq!(session.phase(), ModelPhase::Loading);
        session.tick_fill();
        assert_eq!(session.phase(), ModelPhase::Loading);
        for _ in 1..NUM_SAMPLES / BATCH_SIZE {
            session.tick_fill();
        }
        assert_eq!(session.phase(), ModelPhase::Ready);
    }

    #[test]
    fn sampling_before_ready_is_a_warning_not_a_panic() {
        let mut session = Session::new(
            Ok(Box::new(AllOnsets)),
            DrumMap::standard(),
            instrument_names(),
            0.4,
            0.4,
        );
        assert!(session.sample_pattern().is_none());
    }

    #[test]
    fn syncopate_before_ready_touches_nothing() {
        let mut session = Session::new(
            Ok(Box::new(AllOnsets)),
            DrumMap::standard(),
            instrument_names(),
            0.4,
            0.4,
        );
        let mut sched = RecordingScheduler::default();
        let mut vis = RecordingVis::default();
        session.syncopate(&mut sched, &mut vis);
        assert!(sched.started.is_empty());
        assert!(vis.vars.is_empty());
    }

    #[test]
    fn syncopate_binds_a_part_and_pushes_the_grid() {
        let mut session = ready_session();
        let mut sched = RecordingScheduler::default();
        let mut vis = RecordingVis::default();

        session.syncopate(&mut sched, &mut vis);
        // every cell is an onset under AllOnsets
        assert_eq!(sched.started.len(), 1);
        assert_eq!(sched.started[0].len(), LOOP_DURATION * NUM_CHANNELS);
        match &vis.vars[..] {
            [(name, VisValue::Grid(grid))] => {
                assert_eq!(name, VAR_NOTE_ON);
                assert_eq!(grid.len(), NUM_CHANNELS * LOOP_DURATION);
                assert!(grid.iter().all(|&v| v == 1));
            }
            other => panic!("unexpected pushes: {other:?}"),
        }

        // rebinding stops the first part exactly once
        session.syncopate(&mut sched, &mut vis);
        assert_eq!(sched.started.len(), 2);
        assert_eq!(sched.stopped.len(), 1);
    }

    #[test]
    fn failed_model_is_permanent() {
        let mut session = Session::new(
            Err(anyhow::anyhow!("weights missing")),
            DrumMap::standard(),
            instrument_names(),
            0.4,
            0.4,
        );
        assert_eq!(session.phase(), ModelPhase::Failed);
        for _ in 0..20 {
            session.tick_fill();
        }
        assert_eq!(session.phase(), ModelPhase::Failed);
        assert!(session.sample_pattern().is_none());
    }

    #[test]
    fn play_pause_toggles_transport_and_flag() {
        let mut session = ready_session();
        let (tx, rx) = crossbeam_channel::bounded(8);
        let mut vis = RecordingVis::default();

        session.play_pause(&tx, &mut vis);
        assert!(!session.playing());
        assert!(matches!(rx.try_recv(), Ok(AudioCommand::TransportStop)));

        session.play_pause(&tx, &mut vis);
        assert!(session.playing());
        assert!(matches!(rx.try_recv(), Ok(AudioCommand::TransportStart)));
    }
}
