// Note extraction: turning a binarized pattern into the ordered event list
// the part binder and the grid view both consume.

use log::error;

use crate::pattern::Pattern;
use crate::shared::STEPS_PER_QUARTER;

#[derive(Clone, Debug, PartialEq)]
pub struct NoteEvent {
    /// Transport position as "bar:quarter:sixteenth".
    pub time: String,
    /// Instrument display name, may have no registered player.
    pub instrument: String,
    /// Original step index, kept for one-hot derivation.
    pub step: usize,
    /// Onset-only patterns carry no dynamics.
    pub velocity: f32,
}

/// Convert a step index to a transport time string, 16 steps to the bar.
/// Steps past 15 wrap into later bars; with a 1-bar transport loop those
/// events simply never fire.
pub fn step_to_transport_time(step: usize) -> String {
    let bars = step / 16;
    let rest = step % 16;
    let quarters = rest / STEPS_PER_QUARTER;
    let sixteenths = step % STEPS_PER_QUARTER;
    format!("{bars}:{quarters}:{sixteenths}")
}

/// Two-stage instrument lookup: channel index -> drum class tag -> display
/// name. Both tables are injected so tests can run a two-instrument kit.
pub struct DrumMap {
    channel_classes: Vec<&'static str>,
    display_names: Vec<(&'static str, &'static str)>,
}

impl DrumMap {
    pub fn new(
        channel_classes: Vec<&'static str>,
        display_names: Vec<(&'static str, &'static str)>,
    ) -> Self {
        Self { channel_classes, display_names }
    }

    /// The standard 9-channel 808 kit, channel order matching the sample map.
    pub fn standard() -> Self {
        Self::new(
            vec!["KD", "SD", "CH", "OH", "HT", "MT", "LT", "CY", "RD"],
            vec![
                ("KD", "Kick Drum"),
                ("SD", "Snare Drum"),
                ("CH", "Hi-Hat Closed"),
                ("OH", "Hi-Hat Open"),
                ("HT", "High Tom"),
                ("MT", "High-Mid Tom"),
                ("LT", "Low Tom"),
                ("CY", "Crash Cymbal"),
                ("RD", "Ride Cymbal"),
            ],
        )
    }

    pub fn resolve(&self, channel: usize) -> Option<&'static str> {
        let class = self.channel_classes.get(channel)?;
        self.display_names
            .iter()
            .find(|(tag, _)| tag == class)
            .map(|&(_, name)| name)
    }
}

/// Walk the pattern in (step ascending, channel ascending) order and emit
/// one event per onset. Unresolvable channels still produce an event (so
/// the grid stays honest about what was generated) under a placeholder
/// name no player will ever match.
pub fn extract_notes(pattern: &Pattern, drum_map: &DrumMap) -> Vec<NoteEvent> {
    let [_, steps, channels] = pattern.shape();
    let mut notes = Vec::new();
    for step in 0..steps {
        for channel in 0..channels {
            if pattern.get(0, step, channel) != 1.0 {
                continue;
            }
            let instrument = match drum_map.resolve(channel) {
                Some(name) => name.to_string(),
                None => {
                    error!("no drum class mapping for channel {channel}");
                    format!("channel-{channel}")
                }
            };
            notes.push(NoteEvent {
                time: step_to_transport_time(step),
                instrument,
                step,
                velocity: 1.0,
            });
        }
    }
    notes
}
