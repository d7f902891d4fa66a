//! Per-pixel regression targets: probability, intensity, sub-pixel offsets
//! and depth.
//!
//! Conflicts between emitters competing for a pixel are settled per pixel:
//! the emitter closest to that pixel's centre wins all five channels, and an
//! exact tie goes to the emitter appearing first in the set.
//!
//! `p` defines the support: every other channel is zero wherever `p` is.
//! Inside the support the regression channels hold the winner's values, and
//! these may be zero themselves (an emitter on a pixel centre, or at z = 0).

use itertools::iproduct;
use ndarray::{Array2, Array3, Axis};

use crate::emitter::EmitterSet;
use crate::error::GridError;
use crate::grid::Grid;
use super::TargetGenerator;

/// The five co-registered maps, indexed `[x, y]`
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetMaps {
    pub p   : Array2<f32>,
    pub phot: Array2<f32>,
    pub dx  : Array2<f32>,
    pub dy  : Array2<f32>,
    pub z   : Array2<f32>,
}

impl OffsetMaps {

    pub const CHANNELS: usize = 5;

    fn zeros([nx, ny]: [usize; 2]) -> Self {
        let z = || Array2::zeros((nx, ny));
        Self { p: z(), phot: z(), dx: z(), dy: z(), z: z() }
    }

    fn maps(&self) -> [&Array2<f32>; 5] {
        [&self.p, &self.phot, &self.dx, &self.dy, &self.z]
    }

    /// Stack as `(channel, x, y)` in the order p, phot, dx, dy, z
    pub fn stack(&self) -> Array3<f32> {
        let (nx, ny) = self.p.dim();
        let mut out = Array3::zeros((Self::CHANNELS, nx, ny));
        for (mut channel, map) in out.axis_iter_mut(Axis(0)).zip(self.maps()) {
            channel.assign(map);
        }
        out
    }
}

/// Write every emitter into the `roi_size`² pixels around the pixel it
/// falls in. Offsets are measured from each pixel's own centre, in pixels.
fn rasterize(grid: &Grid, em: &EmitterSet, roi_size: usize) -> OffsetMaps {
    let [nx, ny] = grid.img_shape;
    let mut maps = OffsetMaps::zeros(grid.img_shape);
    let mut best = Array2::from_elem((nx, ny), f32::INFINITY);
    let r = (roi_size / 2) as isize;
    let xyz = em.xyz();
    let phot = em.phot();
    let mut dropped = 0;
    for (xyz, &phot) in xyz.axis_iter(Axis(0)).zip(phot.iter()) {
        let Some(cell) = grid.locate(xyz) else { dropped += 1; continue };
        for (ox, oy) in iproduct!(-r..=r, -r..=r) {
            let ix = cell.ix as isize + ox;
            let iy = cell.iy as isize + oy;
            if ix < 0 || iy < 0 || ix >= nx as isize || iy >= ny as isize { continue }
            let pixel = [ix as usize, iy as usize];
            let dx = cell.dx - ox as f32;
            let dy = cell.dy - oy as f32;
            let distance = dx * dx + dy * dy;
            if distance < best[pixel] {
                best[pixel] = distance;
                maps.p   [pixel] = 1.0;
                maps.phot[pixel] = phot;
                maps.dx  [pixel] = dx;
                maps.dy  [pixel] = dy;
                maps.z   [pixel] = xyz[2];
            }
        }
    }
    if dropped > 0 { log::debug!("Offset rasterization dropped {dropped} emitters outside the grid") }
    maps
}

/// Each emitter occupies exactly the pixel it falls in; `dx` and `dy` lie in
/// `[-0.5, 0.5]`.
#[derive(Clone, Debug)]
pub struct OffsetRep {
    grid: Grid,
}

impl OffsetRep {

    pub fn new(grid: Grid) -> Self { Self { grid } }

    /// The five maps separately, rather than stacked as by `forward`
    pub fn maps(&self, em: &EmitterSet) -> OffsetMaps { rasterize(&self.grid, em, 1) }
}

impl TargetGenerator for OffsetRep {
    fn grid(&self) -> &Grid { &self.grid }
    fn channels(&self) -> usize { OffsetMaps::CHANNELS }
    fn forward(&self, em: &EmitterSet) -> Array3<f32> { self.maps(em).stack() }
}

/// Like `OffsetRep`, but each emitter also claims the neighbouring pixels in
/// a square region of interest around its own, so offsets in those pixels
/// exceed half a pixel.
#[derive(Clone, Debug)]
pub struct RoiOffsetRep {
    grid: Grid,
    roi_size: usize,
}

impl RoiOffsetRep {

    pub const DEFAULT_ROI_SIZE: usize = 3;

    pub fn new(grid: Grid) -> Self { Self { grid, roi_size: Self::DEFAULT_ROI_SIZE } }

    pub fn with_roi_size(mut self, roi_size: usize) -> Result<Self, GridError> {
        if roi_size % 2 == 0 { return Err(GridError::RoiSize(roi_size)) }
        self.roi_size = roi_size;
        Ok(self)
    }

    pub fn roi_size(&self) -> usize { self.roi_size }

    pub fn maps(&self, em: &EmitterSet) -> OffsetMaps { rasterize(&self.grid, em, self.roi_size) }
}

impl TargetGenerator for RoiOffsetRep {
    fn grid(&self) -> &Grid { &self.grid }
    fn channels(&self) -> usize { OffsetMaps::CHANNELS }
    fn forward(&self, em: &EmitterSet) -> Array3<f32> { self.maps(em).stack() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use float_eq::assert_float_eq;
    use rand::{Rng, SeedableRng};
    use rand_isaac::Isaac64Rng;
    use rstest::{fixture, rstest};
    use crate::grid::Extent;

    #[fixture]
    fn grid() -> Grid {
        let e = Extent::new(-0.5, 31.5).unwrap();
        Grid::new(e, e, None, [32, 32]).unwrap()
    }

    /// 100 emitters scattered over an area larger than the grid
    #[fixture]
    fn em_set() -> EmitterSet {
        let mut rng = Isaac64Rng::seed_from_u64(100);
        let n = 100;
        let xyz = Array2::from_shape_fn((n, 3), |_| rng.gen::<f32>() * 40.0);
        let phot = Array1::from_shape_fn(n, |_| rng.gen::<f32>() + f32::EPSILON);
        EmitterSet::new(xyz, phot, Array1::zeros(n)).unwrap()
    }

    fn support(map: &Array2<f32>) -> Vec<(usize, usize)> {
        map.indexed_iter().filter(|&(_, &v)| v != 0.0).map(|(i, _)| i).collect()
    }

    #[rstest]
    fn forward_shape(grid: Grid, em_set: EmitterSet) {
        let rep = OffsetRep::new(grid);
        let out = rep.forward(&em_set);
        assert_eq!(out.dim(), (5, 32, 32));
        let OffsetMaps { p, phot, dx, dy, z } = rep.maps(&em_set);
        for map in [&phot, &dx, &dy, &z] { assert_eq!(map.dim(), p.dim()) }
    }

    #[rstest]
    fn channels_vanish_outside_p(grid: Grid, em_set: EmitterSet) {
        let m = OffsetRep::new(grid).maps(&em_set);
        let p = support(&m.p);
        assert!(!p.is_empty());
        assert_eq!(p, support(&m.phot));
        for map in [&m.dx, &m.dy, &m.z] {
            assert!(support(map).iter().all(|pixel| p.contains(pixel)));
        }
    }

    #[rstest]
    fn centred_flat_emitter_keeps_zero_regression_values(grid: Grid) {
        let em = EmitterSet::new(array![[15.0, 15.0], [3.3, 7.2]], array![100.0, 50.0], Array1::zeros(2)).unwrap();
        let m = OffsetRep::new(grid).maps(&em);
        assert_eq!(support(&m.p), vec![(3, 7), (15, 15)]);
        assert_eq!(support(&m.phot), support(&m.p));
        assert_eq!(m.phot[[15, 15]], 100.0);
        assert_eq!((m.dx[[15, 15]], m.dy[[15, 15]], m.z[[15, 15]]), (0.0, 0.0, 0.0));
        assert!(support(&m.z).is_empty());
        assert_float_eq!(m.dx[[3, 7]], 0.3, abs <= 1e-4);
        assert_float_eq!(m.dy[[3, 7]], 0.2, abs <= 1e-4);
    }

    #[rstest]
    fn output_range(grid: Grid, em_set: EmitterSet) {
        let m = OffsetRep::new(grid).maps(&em_set);
        assert!(m.dx.iter().all(|v| (-0.5..=0.5).contains(v)), "delta x must be between -0.5 and 0.5");
        assert!(m.dy.iter().all(|v| (-0.5..=0.5).contains(v)), "delta y must be between -0.5 and 0.5");
    }

    #[rstest]
    fn closest_emitter_wins_shared_pixel(grid: Grid) {
        let em = EmitterSet::new(
            array![[5.3, 5.3, 10.0], [5.1, 4.9, 20.0], [4.6, 5.4, 30.0]],
            array![1.0, 2.0, 3.0],
            Array1::zeros(3),
        ).unwrap();
        let m = OffsetRep::new(grid).maps(&em);
        assert_eq!(support(&m.p), vec![(5, 5)]);
        assert_eq!(m.z[[5, 5]], 20.0);
        assert_eq!(m.phot[[5, 5]], 2.0);
        assert_float_eq!(m.dx[[5, 5]],  0.1, abs <= 1e-4);
        assert_float_eq!(m.dy[[5, 5]], -0.1, abs <= 1e-4);
    }

    #[rstest]
    fn empty_set_gives_empty_maps(grid: Grid) {
        let out = OffsetRep::new(grid).forward(&EmitterSet::empty());
        assert!(out.iter().all(|&v| v == 0.0));
        let out = RoiOffsetRep::new(grid).forward(&EmitterSet::empty());
        assert!(out.iter().all(|&v| v == 0.0));
    }

    /// An easy emitter, two adjacent emitters, two overlapping emitters and
    /// two diagonal neighbours.
    #[fixture]
    fn roi_set() -> EmitterSet {
        let xyz = array![[14.9, 17.2,  300.],
                         [ 0.0,  0.0,  250.],
                         [ 1.0,  1.0, -250.],
                         [25.0, 25.0,  500.],
                         [25.2, 25.2,  700.],
                         [10.0, 10.0,  200.],
                         [11.0, 11.0,  500.]];
        EmitterSet::coordinates_only(xyz, None, None).unwrap()
    }

    #[rstest]
    fn roi_values_of_isolated_emitter(grid: Grid, roi_set: EmitterSet) {
        let m = RoiOffsetRep::new(grid).maps(&roi_set);
        for (ix, iy) in iproduct!(14..=16, 16..=18) {
            assert_eq!(m.p[[ix, iy]], 1.0);
            assert_eq!(m.z[[ix, iy]], 300.0);
            assert_float_eq!(m.dx[[ix, iy]], 14.9 - ix as f32, abs <= 1e-4);
            assert_float_eq!(m.dy[[ix, iy]], 17.2 - iy as f32, abs <= 1e-4);
        }
        assert_eq!(m.p[[13, 17]], 0.0);
        assert_eq!(m.p[[15, 19]], 0.0);
    }

    #[rstest]
    fn roi_conflicts_are_resolved_by_distance_then_order(grid: Grid, roi_set: EmitterSet) {
        let m = RoiOffsetRep::new(grid).maps(&roi_set);
        // Equidistant from (0,0) and (1,1): first emitter wins
        assert_eq!(m.z[[1, 0]],  250.0);
        assert_eq!(m.z[[0, 1]],  250.0);
        assert_eq!(m.z[[0, 0]],  250.0);
        assert_eq!(m.z[[1, 1]], -250.0);
        assert_eq!(m.z[[2, 2]], -250.0);
        // Overlapping pair: each keeps the pixels it is closer to
        assert_eq!(m.z[[25, 25]], 500.0);
        assert_eq!(m.z[[24, 24]], 500.0);
        assert_eq!(m.z[[26, 26]], 700.0);
        assert_float_eq!(m.dx[[26, 26]], -0.8, abs <= 1e-4);
        // Diagonal neighbours share the off-diagonal corners
        assert_eq!(m.z[[11, 10]], 200.0);
        assert_eq!(m.z[[10, 11]], 200.0);
        assert_eq!(m.z[[12, 12]], 500.0);
    }

    #[rstest]
    fn roi_of_one_is_offset_rep(grid: Grid, em_set: EmitterSet) {
        let roi = RoiOffsetRep::new(grid).with_roi_size(1).unwrap();
        assert_eq!(roi.forward(&em_set), OffsetRep::new(grid).forward(&em_set));
    }

    #[rstest]
    fn roi_size_must_be_odd(grid: Grid) {
        assert_eq!(RoiOffsetRep::new(grid).with_roi_size(4).unwrap_err(), GridError::RoiSize(4));
        assert_eq!(RoiOffsetRep::new(grid).with_roi_size(5).unwrap().roi_size(), 5);
    }
}
