use ndarray::{azip, Array3, Axis};

use crate::emitter::EmitterSet;
use crate::grid::Grid;
use super::TargetGenerator;

/// What a single emitter deposits in its pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeltaWeight {
    #[default]
    Photons,
    Unit,
}

/// What happens when several emitters land in the same pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overlap {
    #[default]
    Sum,
    /// The emitter appearing last in the set wins
    Last,
}

/// Rasterize each emitter into the single pixel (and depth bin) containing
/// it. Pixels which no emitter reaches are set to `dark_value`.
#[derive(Clone, Debug)]
pub struct DeltaPsf {
    grid: Grid,
    weight: DeltaWeight,
    overlap: Overlap,
    dark_value: f32,
}

impl DeltaPsf {

    pub fn new(grid: Grid) -> Self {
        Self { grid, weight: DeltaWeight::default(), overlap: Overlap::default(), dark_value: 0.0 }
    }

    pub fn with_weight    (mut self, weight : DeltaWeight) -> Self { self.weight  = weight ; self }
    pub fn with_overlap   (mut self, overlap: Overlap    ) -> Self { self.overlap = overlap; self }
    pub fn with_dark_value(mut self, dark   : f32        ) -> Self { self.dark_value = dark; self }
}

impl TargetGenerator for DeltaPsf {

    fn grid(&self) -> &Grid { &self.grid }

    fn channels(&self) -> usize { self.grid.z_bins() }

    fn forward(&self, em: &EmitterSet) -> Array3<f32> {
        let [nx, ny] = self.grid.img_shape;
        let shape = (self.grid.z_bins(), nx, ny);
        let mut out = Array3::<f32>::zeros(shape);
        let mut hit = Array3::from_elem(shape, false);
        let mut dropped = 0;
        for (xyz, &phot) in em.xyz().axis_iter(Axis(0)).zip(em.phot()) {
            let Some(cell) = self.grid.locate(xyz) else { dropped += 1; continue };
            let w = match self.weight {
                DeltaWeight::Photons => phot,
                DeltaWeight::Unit    => 1.0,
            };
            let ix = [cell.iz, cell.ix, cell.iy];
            match self.overlap {
                Overlap::Sum  => out[ix] += w,
                Overlap::Last => out[ix]  = w,
            }
            hit[ix] = true;
        }
        if dropped > 0 { log::debug!("DeltaPsf dropped {dropped} emitters outside the grid") }
        if self.dark_value != 0.0 {
            let dark = self.dark_value;
            azip!((v in &mut out, &h in &hit) if !h { *v = dark });
        }
        out
    }
}
