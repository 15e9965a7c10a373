// The sample map: instrument display name -> 808 one-shot, fixed at
// startup. Its insertion order is load-bearing: it defines the row order
// of the one-hot grid and must line up with the DrumMap channel order.

use std::path::Path;

use log::{debug, warn};

use crate::audio::AudioHandle;
use crate::audio_api::AudioCommand;
use crate::loader::sample_loader;

pub const SAMPLE_MAP: [(&str, &str); 9] = [
    ("Kick Drum", "808/kick.wav"),
    ("Snare Drum", "808/snare.wav"),
    ("Hi-Hat Closed", "808/hh.wav"),
    ("Hi-Hat Open", "808/oh.wav"),
    ("High Tom", "808/ht.wav"),
    ("High-Mid Tom", "808/mt.wav"),
    ("Low Tom", "808/lt.wav"),
    ("Crash Cymbal", "808/cym.wav"),
    ("Ride Cymbal", "808/rim.wav"),
];

/// Row order for the one-hot grid.
pub fn instrument_names() -> Vec<&'static str> {
    SAMPLE_MAP.iter().map(|&(name, _)| name).collect()
}

/// Load every mapped sample under `sample_dir` and register it with the
/// engine. A missing file costs that one instrument its player (its notes
/// will be skipped at fire time), not the rest of the kit.
pub fn register_players(audio: &AudioHandle, sample_dir: &Path, sample_rate: u32) {
    for (name, rel_path) in SAMPLE_MAP {
        let path = sample_dir.join(rel_path);
        match sample_loader::load(&path, sample_rate) {
            Ok((id, buffer)) => {
                debug!("registered player {name} from {}", path.display());
                audio.send(AudioCommand::RegisterPlayer {
                    name: name.to_string(),
                    id,
                    buffer,
                });
            }
            Err(e) => warn!("could not load sample for {name}: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::DrumMap;

    #[test]
    fn sample_map_order_matches_drum_channels() {
        let kit = DrumMap::standard();
        for (channel, (name, _)) in SAMPLE_MAP.iter().enumerate() {
            assert_eq!(kit.resolve(channel), Some(*name));
        }
    }
}
