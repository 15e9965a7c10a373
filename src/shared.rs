// Fixed dimensions of the regroove-style pattern format. The generator,
// the sequencer, and the grid view all agree on a 1-bar, 16-step,
// 9-channel drum grid.

pub const NUM_CHANNELS: usize = 9;
pub const LOOP_DURATION: usize = 16; // steps per bar
pub const STEPS_PER_QUARTER: usize = 4;

// Generation batching: the matrix holds NUM_SAMPLES patterns, filled
// BATCH_SIZE at a time.
pub const BATCH_SIZE: usize = 10;
pub const NUM_SAMPLES: usize = 100;

pub const DEFAULT_BPM: f32 = 140.0;
pub const DEFAULT_NOTE_DROPOUT: f32 = 0.4;
pub const DEFAULT_ONSET_THRESHOLD: f32 = 0.4;

/// Shape of a single generated pattern: [batch, steps, channels].
pub const PATTERN_SHAPE: [usize; 3] = [1, LOOP_DURATION, NUM_CHANNELS];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// Resample a pattern from the matrix and rebind playback.
    Syncopate,
    /// Toggle the transport and the active part together.
    PlayPause,
    Quit,
}

/// What the TUI renders each frame. The session pushes into this through
/// the `Visualization` trait; the view only reads it.
#[derive(Clone, Debug)]
pub struct DisplayState {
    /// Flat one-hot grid, row-major: instrument row * LOOP_DURATION + step.
    pub note_on: Vec<u8>,
    /// Step cursor column, driven by the audio clock.
    pub step: usize,
    pub playing: bool,
    /// Status line text, e.g. "generating 30/100" or "ready".
    pub status: String,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            note_on: vec![0; NUM_CHANNELS * LOOP_DURATION],
            step: 0,
            playing: true,
            status: String::from("loading model"),
        }
    }
}
