// Visualization bridge: the one-hot grid derivation plus the named-variable
// surface the session pushes through. Pushes are fire-and-forget; nothing
// here reports back.

use crate::notes::NoteEvent;
use crate::shared::{DisplayState, LOOP_DURATION};

/// Variable names the session publishes.
pub const VAR_NOTE_ON: &str = "noteOnArr";
pub const VAR_STEP: &str = "step";
pub const VAR_STATUS: &str = "status";
pub const VAR_PLAYING: &str = "playing";

#[derive(Clone, Debug, PartialEq)]
pub enum VisValue {
    Grid(Vec<u8>),
    Step(usize),
    Text(String),
    Flag(bool),
}

pub trait Visualization {
    fn set_variable(&mut self, name: &str, value: VisValue);
}

/// Derive the flat one-hot activity grid from a note list. Row order is
/// the sample map's insertion order; unplayable instrument names simply
/// never match a row. Pure and deterministic.
pub fn to_one_hot_grid(notes: &[NoteEvent], instrument_names: &[&str]) -> Vec<u8> {
    let mut grid = vec![0u8; instrument_names.len() * LOOP_DURATION];
    for (row, name) in instrument_names.iter().enumerate() {
        for step in 0..LOOP_DURATION {
            let hit = notes.iter().any(|n| n.step == step && n.instrument == *name);
            grid[row * LOOP_DURATION + step] = u8::from(hit);
        }
    }
    grid
}

/// The TUI's display state is the visualization surface: variables land
/// in whatever field the view reads them from, unknown names are ignored.
impl Visualization for DisplayState {
    fn set_variable(&mut self, name: &str, value: VisValue) {
        match (name, value) {
            (VAR_NOTE_ON, VisValue::Grid(grid)) => self.note_on = grid,
            (VAR_STEP, VisValue::Step(step)) => self.step = step,
            (VAR_STATUS, VisValue::Text(text)) => self.status = text,
            (VAR_PLAYING, VisValue::Flag(playing)) => self.playing = playing,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{DrumMap, extract_notes};
    use crate::pattern::Pattern;

    fn note(step: usize, instrument: &str) -> NoteEvent {
        NoteEvent {
            time: crate::notes::step_to_transport_time(step),
            instrument: instrument.into(),
            step,
            velocity: 1.0,
        }
    }

    #[test]
    fn grid_length_is_fixed_regardless_of_notes() {
        let names = ["Kick", "Snare"];
        assert_eq!(to_one_hot_grid(&[], &names).len(), 2 * LOOP_DURATION);
        let notes: Vec<NoteEvent> = (0..40).map(|i| note(i % 16, "Kick")).collect();
        assert_eq!(to_one_hot_grid(&notes, &names).len(), 2 * LOOP_DURATION);
    }

    #[test]
    fn grid_is_deterministic() {
        let names = ["Kick", "Snare"];
        let notes = vec![note(3, "Snare"), note(0, "Kick"), note(3, "Snare")];
        let a = to_one_hot_grid(&notes, &names);
        let b = to_one_hot_grid(&notes, &names);
        assert_eq!(a, b);
        assert_eq!(a[0], 1); // Kick at step 0
        assert_eq!(a[LOOP_DURATION + 3], 1); // Snare at step 3
        assert_eq!(a.iter().map(|&v| v as usize).sum::<usize>(), 2);
    }

    #[test]
    fn end_to_end_grid_from_pattern() {
        let mut data = vec![0.0; 16 * 9];
        data[0] = 1.0; // step 0, channel 0 (Kick Drum)
        data[5 * 9 + 3] = 1.0; // step 5, channel 3 (Hi-Hat Open)
        let pattern = Pattern::new(data, [1, 16, 9]).unwrap();

        let kit = DrumMap::standard();
        let notes = extract_notes(&pattern, &kit);
        let names: Vec<&str> = (0..9).map(|c| kit.resolve(c).unwrap()).collect();
        let grid = to_one_hot_grid(&notes, &names);

        for (i, &v) in grid.iter().enumerate() {
            let expected = u8::from(i == 0 || i == 3 * LOOP_DURATION + 5);
            assert_eq!(v, expected, "grid index {i}");
        }
    }

    #[test]
    fn unknown_variables_are_ignored() {
        let mut state = DisplayState::default();
        state.set_variable("bogus", VisValue::Step(7));
        assert_eq!(state.step, 0);
        state.set_variable(VAR_STEP, VisValue::Step(7));
        assert_eq!(state.step, 7);
    }
}
