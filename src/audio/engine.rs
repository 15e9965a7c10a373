// The playback engine that lives inside the audio callback: a player
// registry keyed by instrument display name, a 16-step transport loop at a
// fixed bpm, and the currently bound part. Step ticks go back to the UI
// over the draw channel so the cursor follows the audio clock, not the
// render loop.

use std::collections::HashMap;

use crossbeam_channel::Sender;
use log::error;

use crate::audio_api::AudioCommand;
use crate::sched::{PartId, TriggerEvent};
use crate::shared::{DEFAULT_BPM, LOOP_DURATION, STEPS_PER_QUARTER};

use super::effect::{self, Effect};
use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;
use super::voice::Voice;

const MAX_VOICES: usize = 32; // hard cap so we won't malloc in the audio callback

pub struct Engine {
    sample_rate: f32,
    bpm: f32,
    playing: bool,
    step: usize,
    samples_to_next_step: usize,
    players: HashMap<String, SampleId>,
    buffers: HashMap<SampleId, SampleBuffer>,
    voices: [Option<Voice>; MAX_VOICES],
    active_part: Option<(PartId, Vec<TriggerEvent>)>,
    master: Vec<Box<dyn Effect>>,
    draw_tx: Sender<usize>,
}

impl Engine {
    pub fn new(sample_rate: u32, draw_tx: Sender<usize>) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            bpm: DEFAULT_BPM,
            // the transport loop runs from process start
            playing: true,
            step: 0,
            samples_to_next_step: 0,
            players: HashMap::new(),
            buffers: HashMap::new(),
            voices: [None; MAX_VOICES],
            active_part: None,
            master: effect::master_chain(),
            draw_tx,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterPlayer { name, id, buffer } => {
                self.players.insert(name, id);
                self.buffers.insert(id, buffer);
            }
            AudioCommand::StartPart { id, events } => {
                // the binder stops the old part first; replacing here keeps
                // the no-overlap invariant even if a stop got dropped
                self.active_part = Some((id, events));
            }
            AudioCommand::StopPart(id) => {
                if self.active_part.as_ref().is_some_and(|(active, _)| *active == id) {
                    self.active_part = None;
                }
            }
            AudioCommand::TransportStart => {
                self.playing = true;
                self.step = 0;
                self.samples_to_next_step = 0;
            }
            AudioCommand::TransportStop => {
                self.playing = false;
            }
            AudioCommand::SetBpm(bpm) => {
                if bpm > 0.0 {
                    self.bpm = bpm;
                }
            }
        }
    }

    fn samples_per_step(&self) -> usize {
        (self.sample_rate * 60.0 / self.bpm / STEPS_PER_QUARTER as f32).round() as usize
    }

    /// Fire everything bound to the current step, push the step cursor,
    /// advance the loop.
    fn fire_step(&mut self) {
        let _ = self.draw_tx.try_send(self.step);

        if let Some((_, events)) = &self.active_part {
            for event in events {
                // events wrapped past the bar never fire under the 1-bar loop
                if event.step != self.step {
                    continue;
                }
                match self.players.get(&event.instrument) {
                    Some(&id) => {
                        let voice = Voice::new(id, event.velocity);
                        let slot = self
                            .voices
                            .iter()
                            .position(|v| v.is_none_or(|v| !v.active))
                            .unwrap_or(0);
                        self.voices[slot] = Some(voice);
                    }
                    // one missing player must not take down the rest of
                    // the part
                    None => error!("no player with name {}", event.instrument),
                }
            }
        }

        self.step = (self.step + 1) % LOOP_DURATION;
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            *frame = StereoFrame::zero();

            if self.playing {
                if self.samples_to_next_step == 0 {
                    self.fire_step();
                    self.samples_to_next_step = self.samples_per_step();
                }
                self.samples_to_next_step -= 1;
            }

            for voice in self.voices.iter_mut().flatten() {
                if let Some(buffer) = self.buffers.get(&voice.sample_id) {
                    voice.render_frame(buffer, frame);
                }
            }
        }

        // master chain colors the mixed block, not individual voices
        for effect in self.master.iter_mut() {
            effect.process(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sample_id::next_sample_id;
    use crate::sched::next_part_id;

    fn engine_with_kick() -> (Engine, crossbeam_channel::Receiver<usize>, SampleId) {
        let (draw_tx, draw_rx) = crossbeam_channel::bounded(64);
        let mut engine = Engine::new(44100, draw_tx);
        let id = next_sample_id();
        engine.handle_cmd(AudioCommand::RegisterPlayer {
            name: "Kick Drum".into(),
            id,
            buffer: SampleBuffer {
                data: vec![StereoFrame { left: 0.5, right: 0.5 }; 64],
            },
        });
        (engine, draw_rx, id)
    }

    fn part(steps: &[usize], instrument: &str) -> AudioCommand {
        AudioCommand::StartPart {
            id: next_part_id(),
            events: steps
                .iter()
                .map(|&step| TriggerEvent {
                    step,
                    instrument: instrument.into(),
                    velocity: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn step_zero_fires_bound_note_and_draw_tick() {
        let (mut engine, draw_rx, _) = engine_with_kick();
        engine.handle_cmd(part(&[0], "Kick Drum"));

        let mut block = vec![StereoFrame::zero(); 16];
        engine.render_block(&mut block);

        assert_eq!(draw_rx.try_recv(), Ok(0));
        assert!(block[0].left > 0.0);
    }

    #[test]
    fn missing_player_is_skipped_without_stopping_the_part() {
        let (mut engine, _draw_rx, _) = engine_with_kick();
        engine.handle_cmd(AudioCommand::StartPart {
            id: next_part_id(),
            events: vec![
                TriggerEvent { step: 0, instrument: "Cowbell".into(), velocity: 1.0 },
                TriggerEvent { step: 0, instrument: "Kick Drum".into(), velocity: 1.0 },
            ],
        });

        let mut block = vec![StereoFrame::zero(); 4];
        engine.render_block(&mut block);
        // the unplayable note is skipped, the kick after it still fires
        assert!(block[0].left > 0.0);
    }

    #[test]
    fn master_chain_colors_the_mix() {
        let (mut engine, _draw_rx, _) = engine_with_kick(); // 0.5 amplitude kick
        engine.handle_cmd(part(&[0], "Kick Drum"));

        let mut block = vec![StereoFrame::zero(); 4];
        engine.render_block(&mut block);
        // 0.5 survives the 10-bit crusher nearly intact, the makeup gain
        // doubles it
        assert!((block[0].left - 1.0).abs() < 0.01);
    }

    #[test]
    fn stopped_transport_fires_nothing() {
        let (mut engine, draw_rx, _) = engine_with_kick();
        engine.handle_cmd(part(&[0], "Kick Drum"));
        engine.handle_cmd(AudioCommand::TransportStop);

        let mut block = vec![StereoFrame::zero(); 64];
        engine.render_block(&mut block);

        assert!(draw_rx.try_recv().is_err());
        assert!(block.iter().all(|f| f.left == 0.0));
    }

    #[test]
    fn transport_restart_rewinds_to_step_zero() {
        let (mut engine, draw_rx, _) = engine_with_kick();
        let mut block = vec![StereoFrame::zero(); 44100]; // well past step 0
        engine.render_block(&mut block);
        while draw_rx.try_recv().is_ok() {}

        engine.handle_cmd(AudioCommand::TransportStop);
        engine.handle_cmd(AudioCommand::TransportStart);
        engine.render_block(&mut block[..16]);
        assert_eq!(draw_rx.try_recv(), Ok(0));
    }

    #[test]
    fn events_past_the_bar_never_fire() {
        let (mut engine, _draw_rx, _) = engine_with_kick();
        engine.handle_cmd(part(&[16], "Kick Drum"));

        // render well past one bar of audio
        let mut block = vec![StereoFrame::zero(); 44100 * 2];
        engine.render_block(&mut block);
        assert!(block.iter().all(|f| f.left == 0.0));
    }
}
