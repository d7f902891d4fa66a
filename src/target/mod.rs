//! Dense training targets rasterized from the emitters of a single frame
//!
//! Every generator owns an immutable [`Grid`] and maps an [`EmitterSet`] to a
//! `(channel, x, y)` array. Emitter coordinates are taken as stored, in the
//! grid's coordinate system; frame indices are ignored, so callers pass the
//! emitters of one frame (see `EmitterSet::split_in_frames`). Emitters off the
//! grid are dropped silently.

mod delta;
mod offset;
mod global;
mod onehot;

pub use delta::{DeltaPsf, DeltaWeight, Overlap};
pub use offset::{OffsetMaps, OffsetRep, RoiOffsetRep};
pub use global::GlobalOffsetRep;
pub use onehot::ZasOneHot;

use ndarray::Array3;

use crate::emitter::EmitterSet;
use crate::grid::Grid;

pub trait TargetGenerator: Send + Sync {
    fn grid(&self) -> &Grid;

    /// Number of channels produced by `forward`
    fn channels(&self) -> usize;

    fn forward(&self, em: &EmitterSet) -> Array3<f32>;

    fn img_shape(&self) -> [usize; 2] { self.grid().img_shape }
}
