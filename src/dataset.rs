//! Indexable (input, target) samples for training
//!
//! Pairs a stack of camera frames `(frame, channel, x, y)` with the emitters
//! that produced them, rendering the target of a frame when it is requested.

use ndarray::{s, Array3, Array4, Axis};

use crate::emitter::EmitterSet;
use crate::error::EmitterError;
use crate::target::TargetGenerator;

pub struct Sample {
    pub input : Array3<f32>,
    pub target: Array3<f32>,
    pub index : usize,
}

pub struct SmlmDataset {
    frames: Array4<f32>,
    em: Vec<EmitterSet>,
    target: Box<dyn TargetGenerator>,
    multi_frame: bool,
}

impl SmlmDataset {

    /// Emitters outside the target grid are discarded; the rest are split
    /// into the frames `0 .. frames.len()`.
    pub fn new(
        emitters   : &EmitterSet,
        frames     : Array4<f32>,
        target     : Box<dyn TargetGenerator>,
        multi_frame: bool,
    ) -> Result<Self, EmitterError> {
        let grid = target.grid();
        let emitters = emitters.within_extent(grid.xextent, grid.yextent, grid.zextent);
        let n = frames.len_of(Axis(0));
        let em = if n == 0 { vec![] }
                 else      { emitters.split_in_frames(Some(0), Some(n as i64 - 1))? };
        log::info!("Dataset loaded. N: {n} samples.");
        Ok(Self { frames, em, target, multi_frame })
    }

    pub fn len(&self) -> usize { self.frames.len_of(Axis(0)) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Emitters belonging to frame `index`
    pub fn emitters(&self, index: usize) -> Option<&EmitterSet> { self.em.get(index) }

    /// Input and target of frame `index`. In multi-frame mode the input holds
    /// the previous, current and next frames stacked along the channel axis,
    /// repeating the first/last frame at the ends of the stack.
    pub fn get(&self, index: usize) -> Option<Sample> {
        let em = self.em.get(index)?;
        let input = if self.multi_frame {
            let last = self.len() - 1;
            let neighbours = [index.saturating_sub(1), index, (index + 1).min(last)];
            let (_, c, nx, ny) = self.frames.dim();
            let mut input = Array3::zeros((3 * c, nx, ny));
            for (k, &f) in neighbours.iter().enumerate() {
                input.slice_mut(s![k * c..(k + 1) * c, .., ..])
                     .assign(&self.frames.index_axis(Axis(0), f));
            }
            input
        } else {
            self.frames.index_axis(Axis(0), index).to_owned()
        };
        let target = self.target.forward(em);
        Some(Sample { input, target, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use crate::grid::{Extent, Grid};
    use crate::target::DeltaPsf;

    fn dataset(multi_frame: bool) -> SmlmDataset {
        let e = Extent::new(-0.5, 7.5).unwrap();
        let target = DeltaPsf::new(Grid::new(e, e, None, [8, 8]).unwrap());
        let frames = Array4::from_shape_fn((4, 1, 8, 8), |(f, _, _, _)| f as f32);
        let em = EmitterSet::new(
            array![[1., 1., 0.], [2., 2., 0.], [3., 3., 0.], [4., 4., 0.], [20., 2., 0.]],
            Array1::ones(5),
            array![0, 2, -1, 5, 1],
        ).unwrap();
        SmlmDataset::new(&em, frames, Box::new(target), multi_frame).unwrap()
    }

    #[test]
    fn length_and_bounds() {
        let ds = dataset(false);
        assert_eq!(ds.len(), 4);
        assert!(ds.get(3).is_some());
        assert!(ds.get(4).is_none());
    }

    #[test]
    fn targets_follow_frames() {
        let ds = dataset(false);
        let counts: Vec<f32> = (0..4).map(|i| ds.get(i).unwrap().target.sum()).collect();
        // frame 1 emitter lies off the grid; frames -1 and 5 are outside the stack
        assert_eq!(counts, vec![1.0, 0.0, 1.0, 0.0]);
        let sample = ds.get(2).unwrap();
        assert_eq!(sample.index, 2);
        assert_eq!(sample.target[[0, 2, 2]], 1.0);
        assert_eq!(ds.emitters(1).unwrap().len(), 0);
    }

    #[test]
    fn single_frame_input() {
        let sample = dataset(false).get(2).unwrap();
        assert_eq!(sample.input.dim(), (1, 8, 8));
        assert!(sample.input.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn multi_frame_input_replicates_edges() {
        let ds = dataset(true);
        let firsts = |i: usize| {
            let input = ds.get(i).unwrap().input;
            assert_eq!(input.dim(), (3, 8, 8));
            (input[[0, 0, 0]], input[[1, 0, 0]], input[[2, 0, 0]])
        };
        assert_eq!(firsts(0), (0.0, 0.0, 1.0));
        assert_eq!(firsts(2), (1.0, 2.0, 3.0));
        assert_eq!(firsts(3), (2.0, 3.0, 3.0));
    }
}
