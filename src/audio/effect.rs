use super::frame::StereoFrame;

// The master chain is fixed: every mixed block runs through a bitcrusher
// and a makeup gain before it reaches the device, the same coloring the
// 808 kit gets in the original demo.

pub trait Effect: Send {
    fn process(&mut self, buf: &mut [StereoFrame]);
}

/// Crush then boost, in that order.
pub fn master_chain() -> Vec<Box<dyn Effect>> {
    vec![
        Box::new(Bitcrusher::from_bits(10)),
        Box::new(Gain::new(2.0)),
    ]
}

pub struct Bitcrusher {
    levels: f32,
}

impl Bitcrusher {
    pub fn new(levels: u32) -> Self {
        Self {
            levels: levels.clamp(2, 65536) as f32,
        }
    }

    pub fn from_bits(bits: u32) -> Self {
        Self::new(1u32 << bits.clamp(1, 16))
    }
}

impl Effect for Bitcrusher {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        let scale = (self.levels - 1.0) * 0.5;
        let inv = 1.0 / scale;
        for f in buf.iter_mut() {
            f.left = (f.left.clamp(-1.0, 1.0) * scale).round() * inv;
            f.right = (f.right.clamp(-1.0, 1.0) * scale).round() * inv;
        }
    }
}

pub struct Gain {
    amount: f32,
}

impl Gain {
    pub fn new(amount: f32) -> Self {
        Self { amount }
    }
}

impl Effect for Gain {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            f.left *= self.amount;
            f.right *= self.amount;
        }
    }
}
