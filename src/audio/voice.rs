use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;

/// One playing drum hit: a cursor into a registered sample buffer.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    pub sample_id: SampleId,
    pub pos: usize,
    pub gain: f32,
    pub active: bool,
}

impl Voice {
    pub fn new(sample_id: SampleId, gain: f32) -> Self {
        Self {
            sample_id,
            pos: 0,
            gain,
            active: true,
        }
    }

    /// Accumulate one frame of this voice into `out`, advancing the cursor.
    #[inline]
    pub fn render_frame(&mut self, buffer: &SampleBuffer, out: &mut StereoFrame) {
        if !self.active {
            return;
        }
        match buffer.data.get(self.pos) {
            Some(s) => {
                out.left += s.left * self.gain;
                out.right += s.right * self.gain;
                self.pos += 1;
            }
            None => self.active = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_goes_inactive_past_buffer_end() {
        let buffer = SampleBuffer {
            data: vec![StereoFrame { left: 0.5, right: 0.5 }; 2],
        };
        let mut voice = Voice::new(SampleId(0), 1.0);
        let mut out = StereoFrame::zero();
        for _ in 0..3 {
            voice.render_frame(&buffer, &mut out);
        }
        assert!(!voice.active);
        assert!((out.left - 1.0).abs() < 1e-6);
    }
}
