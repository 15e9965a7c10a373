// Part scheduling: binding an extracted note list to the playback clock.
//
// The binder owns the no-overlap invariant: at most one part is ever
// active, and rebinding stops the old part before the new one starts.
// The scheduler itself is a trait so the binder can be exercised against
// a recording fake instead of the live audio thread.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;

use crate::audio_api::AudioCommand;
use crate::notes::NoteEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartId(pub u64);

static NEXT_PART_ID: AtomicU64 = AtomicU64::new(0);

pub fn next_part_id() -> PartId {
    PartId(NEXT_PART_ID.fetch_add(1, Ordering::Relaxed))
}

/// One scheduled firing within the 16-step loop.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerEvent {
    pub step: usize,
    pub instrument: String,
    pub velocity: f32,
}

pub trait PartScheduler {
    /// Schedule a part starting at transport position zero.
    fn start(&mut self, events: Vec<TriggerEvent>) -> PartId;
    fn stop(&mut self, id: PartId);
}

#[derive(Default)]
pub struct PartBinder {
    active: Option<PartId>,
}

impl PartBinder {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn active(&self) -> Option<PartId> {
        self.active
    }

    /// Replace the active part with one built from `notes`. The previous
    /// part is stopped exactly once before the new one starts.
    pub fn bind(&mut self, sched: &mut dyn PartScheduler, notes: &[NoteEvent]) -> PartId {
        if let Some(prev) = self.active.take() {
            sched.stop(prev);
        }
        let events = notes
            .iter()
            .map(|n| TriggerEvent {
                step: n.step,
                instrument: n.instrument.clone(),
                velocity: n.velocity,
            })
            .collect();
        let id = sched.start(events);
        self.active = Some(id);
        id
    }
}

/// Live scheduler: forwards part lifecycles to the audio engine. Fire
/// timing and the missing-player check both happen on the audio thread.
pub struct AudioScheduler {
    tx: Sender<AudioCommand>,
}

impl AudioScheduler {
    pub fn new(tx: Sender<AudioCommand>) -> Self {
        Self { tx }
    }
}

impl PartScheduler for AudioScheduler {
    fn start(&mut self, events: Vec<TriggerEvent>) -> PartId {
        let id = next_part_id();
        let _ = self.tx.try_send(AudioCommand::StartPart { id, events });
        id
    }

    fn stop(&mut self, id: PartId) {
        let _ = self.tx.try_send(AudioCommand::StopPart(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingScheduler {
        log: Vec<String>,
    }

    impl PartScheduler for RecordingScheduler {
        fn start(&mut self, events: Vec<TriggerEvent>) -> PartId {
            let id = next_part_id();
            self.log.push(format!("start {} ({} events)", id.0, events.len()));
            id
        }

        fn stop(&mut self, id: PartId) {
            self.log.push(format!("stop {}", id.0));
        }
    }

    fn note(step: usize) -> NoteEvent {
        NoteEvent {
            time: crate::notes::step_to_transport_time(step),
            instrument: "Kick Drum".into(),
            step,
            velocity: 1.0,
        }
    }

    #[test]
    fn first_bind_starts_without_stopping() {
        let mut sched = RecordingScheduler::default();
        let mut binder = PartBinder::new();
        let id = binder.bind(&mut sched, &[note(0)]);
        assert_eq!(sched.log, vec![format!("start {} (1 events)", id.0)]);
        assert_eq!(binder.active(), Some(id));
    }

    #[test]
    fn rebind_stops_previous_exactly_once_before_starting() {
        let mut sched = RecordingScheduler::default();
        let mut binder = PartBinder::new();
        let first = binder.bind(&mut sched, &[note(0)]);
        let second = binder.bind(&mut sched, &[note(1), note(2)]);

        assert_ne!(first, second);
        assert_eq!(
            sched.log,
            vec![
                format!("start {} (1 events)", first.0),
                format!("stop {}", first.0),
                format!("start {} (2 events)", second.0),
            ]
        );
        assert_eq!(binder.active(), Some(second));
    }
}
