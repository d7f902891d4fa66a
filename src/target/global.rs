use ndarray::{Array2, Array3};
use ordered_float::OrderedFloat;

use crate::emitter::EmitterSet;
use crate::grid::Grid;
use super::{OffsetMaps, OffsetRep, TargetGenerator};

/// Offsets for every pixel, not just occupied ones: each pixel is owned by
/// the nearest emitter (a Voronoi partition of the grid) and reports the
/// offset to, and depth of, its owner.
///
/// The p and intensity channels are those of `OffsetRep`. In `masked` mode
/// emitters without positive photon counts are ignored altogether.
#[derive(Clone, Debug)]
pub struct GlobalOffsetRep {
    offset: OffsetRep,
    masked: bool,
}

impl GlobalOffsetRep {

    pub fn new(grid: Grid) -> Self { Self { offset: OffsetRep::new(grid), masked: false } }

    pub fn masked(mut self, masked: bool) -> Self { self.masked = masked; self }

    fn eligible(&self, em: &EmitterSet) -> Vec<usize> {
        em.phot().iter().enumerate()
            .filter(|&(_, &phot)| !self.masked || phot > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Index (into `em`) of the emitter nearest to each pixel centre, ties
    /// going to the lower index. Emitters off the grid take part too.
    ///
    /// `None` when there is no eligible emitter.
    pub fn assign_emitter(&self, em: &EmitterSet) -> Option<Array2<usize>> {
        let candidates = self.eligible(em);
        if candidates.is_empty() { return None }
        let grid = self.grid();
        let xyz = em.xyz();
        let [nx, ny] = grid.img_shape;
        Some(Array2::from_shape_fn((nx, ny), |(ix, iy)| {
            let [cx, cy] = grid.pixel_centre(ix, iy);
            candidates.iter()
                .copied()
                .min_by_key(|&i| {
                    let (dx, dy) = (xyz[[i, 0]] - cx, xyz[[i, 1]] - cy);
                    (OrderedFloat(dx * dx + dy * dy), i)
                })
                .unwrap_or_default()
        }))
    }

    pub fn maps(&self, em: &EmitterSet) -> OffsetMaps {
        let OffsetMaps { p, phot, .. } = self.offset.maps(&em.select(&self.eligible(em)));
        let (nx, ny) = p.dim();
        let mut dx = Array2::zeros((nx, ny));
        let mut dy = Array2::zeros((nx, ny));
        let mut z  = Array2::zeros((nx, ny));
        if let Some(owner) = self.assign_emitter(em) {
            let grid = self.grid();
            let [sx, sy] = grid.pixel_size();
            let xyz = em.xyz();
            for ((ix, iy), &i) in owner.indexed_iter() {
                let [cx, cy] = grid.pixel_centre(ix, iy);
                dx[[ix, iy]] = (xyz[[i, 0]] - cx) / sx;
                dy[[ix, iy]] = (xyz[[i, 1]] - cy) / sy;
                z [[ix, iy]] =  xyz[[i, 2]];
            }
        }
        OffsetMaps { p, phot, dx, dy, z }
    }
}

impl TargetGenerator for GlobalOffsetRep {
    fn grid(&self) -> &Grid { self.offset.grid() }
    fn channels(&self) -> usize { OffsetMaps::CHANNELS }
    fn forward(&self, em: &EmitterSet) -> Array3<f32> { self.maps(em).stack() }
}
