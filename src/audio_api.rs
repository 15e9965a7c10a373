pub use crate::audio::{SampleBuffer, SampleId};
use crate::sched::{PartId, TriggerEvent};

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't load files (interrupts the audio thread), so buffers
    // are preloaded (see loader/sample_loader.rs) and registered under the
    // instrument's display name.
    RegisterPlayer {
        name: String,
        id: SampleId,
        buffer: SampleBuffer,
    },

    // Part lifecycle, driven by the binder through AudioScheduler.
    StartPart { id: PartId, events: Vec<TriggerEvent> },
    StopPart(PartId),

    // Global transport. Start always rewinds to step 0, matching the
    // play/pause toggle semantics.
    TransportStart,
    TransportStop,
    SetBpm(f32),
}
