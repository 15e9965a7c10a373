// Pattern values and the generated-pattern matrix.
//
// A Pattern is a small 3-D tensor over [batch, step, channel] with cell
// values in {0, 1} once thresholded. The matrix is the store the generator
// fills batch by batch and the sampler reads from once it is complete.

use anyhow::{bail, ensure};

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    data: Vec<f32>,
    shape: [usize; 3],
}

impl Pattern {
    pub fn new(data: Vec<f32>, shape: [usize; 3]) -> anyhow::Result<Self> {
        ensure!(
            data.len() == shape[0] * shape[1] * shape[2],
            "pattern data length {} does not match shape {:?}",
            data.len(),
            shape
        );
        Ok(Self { data, shape })
    }

    pub fn zeros(shape: [usize; 3]) -> Self {
        Self {
            data: vec![0.0; shape[0] * shape[1] * shape[2]],
            shape,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn get(&self, batch: usize, step: usize, channel: usize) -> f32 {
        let [_, steps, channels] = self.shape;
        self.data[(batch * steps + step) * channels + channel]
    }

    /// One batch item as a flat [steps * channels] slice.
    pub fn batch_item(&self, batch: usize) -> &[f32] {
        let stride = self.shape[1] * self.shape[2];
        &self.data[batch * stride..(batch + 1) * stride]
    }

    /// Concatenate along `axis` (0 = batch, 2 = channel). Shapes must agree
    /// on every other axis.
    pub fn concatenate(&self, other: &Pattern, axis: usize) -> anyhow::Result<Pattern> {
        match axis {
            0 => {
                ensure!(
                    self.shape[1] == other.shape[1] && self.shape[2] == other.shape[2],
                    "batch concat shape mismatch: {:?} vs {:?}",
                    self.shape,
                    other.shape
                );
                let mut data = self.data.clone();
                data.extend_from_slice(&other.data);
                Pattern::new(
                    data,
                    [self.shape[0] + other.shape[0], self.shape[1], self.shape[2]],
                )
            }
            2 => {
                ensure!(
                    self.shape[0] == other.shape[0] && self.shape[1] == other.shape[1],
                    "channel concat shape mismatch: {:?} vs {:?}",
                    self.shape,
                    other.shape
                );
                let [b, s, c0] = self.shape;
                let c1 = other.shape[2];
                let mut data = Vec::with_capacity(b * s * (c0 + c1));
                for batch in 0..b {
                    for step in 0..s {
                        let base0 = (batch * s + step) * c0;
                        let base1 = (batch * s + step) * c1;
                        data.extend_from_slice(&self.data[base0..base0 + c0]);
                        data.extend_from_slice(&other.data[base1..base1 + c1]);
                    }
                }
                Pattern::new(data, [b, s, c0 + c1])
            }
            _ => bail!("unsupported concat axis {axis}"),
        }
    }
}

/// Binarize raw model output: strictly greater than the threshold becomes
/// an onset, everything else silence.
pub fn apply_onset_threshold(data: &[f32], shape: [usize; 3], threshold: f32) -> anyhow::Result<Pattern> {
    let onsets = data
        .iter()
        .map(|&v| if v > threshold { 1.0 } else { 0.0 })
        .collect();
    Pattern::new(onsets, shape)
}

/// The onset matrix store: a rows x cols grid of generated pattern cells,
/// written exactly once per slot by the fill loop. Reads are refused until
/// every slot has been written.
pub struct PatternMatrix {
    cells: Vec<Option<Vec<f32>>>,
    rows: usize,
    cols: usize,
    cell_shape: [usize; 3],
}

impl PatternMatrix {
    pub fn new(cell_shape: [usize; 3], rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![None; rows * cols],
            rows,
            cols,
            cell_shape,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn append(&mut self, cell: Vec<f32>, row: usize, col: usize) -> anyhow::Result<()> {
        ensure!(row < self.rows && col < self.cols, "matrix index ({row}, {col}) out of range");
        ensure!(
            cell.len() == self.cell_shape[0] * self.cell_shape[1] * self.cell_shape[2],
            "cell data length {} does not match shape {:?}",
            cell.len(),
            self.cell_shape
        );
        let slot = &mut self.cells[row * self.cols + col];
        ensure!(slot.is_none(), "matrix cell ({row}, {col}) written twice");
        *slot = Some(cell);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Number of cells written so far, for progress reporting.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Read one cell as a Pattern. None until the whole matrix is ready;
    /// partial reads are not part of the contract.
    pub fn cell(&self, row: usize, col: usize) -> Option<Pattern> {
        if !self.is_ready() || row >= self.rows || col >= self.cols {
            return None;
        }
        let data = self.cells[row * self.cols + col].as_ref()?.clone();
        Pattern::new(data, self.cell_shape).ok()
    }
}
