//! The pixel grid onto which emitters are rasterized
//!
//! A grid is a rectangular region of the xy-plane (plus an optional depth
//! range) cut into `img_shape` pixels. Positions are in the same coordinate
//! system as the extents, usually pixels with centres at integers, as in
//! extents of `(-0.5, 31.5)` for 32 pixels.

use ndarray::ArrayView1;
use rand::Rng;

use units::todo::{Coordf32, Pixelf32};
use crate::error::GridError;

/// Half-open interval `[lo, hi)` along one axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub lo: Coordf32,
    pub hi: Coordf32,
}

impl Extent {

    pub fn new(lo: Coordf32, hi: Coordf32) -> Result<Self, GridError> {
        if lo.is_finite() && hi.is_finite() && lo < hi { Ok(Self { lo, hi }) }
        else { Err(GridError::Extent(lo, hi)) }
    }

    pub fn width(&self) -> Coordf32 { self.hi - self.lo }

    pub fn contains(&self, x: Coordf32) -> bool { self.lo <= x && x < self.hi }

    /// Uniformly distributed position within the extent
    pub fn sample(&self, rng: &mut impl Rng) -> Coordf32 { self.lo + rng.gen::<f32>() * self.width() }
}

/// Find the bin of `extent` (cut into `n` equal bins) which contains `coord`,
/// and the signed distance of `coord` from the centre of that bin, in units
/// of the bin width. The distance lies in `[-0.5, 0.5]`.
///
/// Returns `None` for coordinates outside the extent.
pub fn discretize(coord: Coordf32, extent: Extent, n: usize) -> Option<(usize, Pixelf32)> {
    if n == 0 || !extent.contains(coord) { return None }
    let u = (coord - extent.lo) / extent.width() * n as f32;
    let ix = (u.floor() as usize).min(n - 1);
    let offset = (u - ix as f32 - 0.5).clamp(-0.5, 0.5);
    Some((ix, offset))
}

/// Where an emitter lands on a grid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub ix: usize,
    pub iy: usize,
    /// Depth bin; always 0 on grids without a z extent
    pub iz: usize,
    /// Offsets from the pixel centre, in pixels
    pub dx: Pixelf32,
    pub dy: Pixelf32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub xextent: Extent,
    pub yextent: Extent,
    pub zextent: Option<Extent>,
    pub img_shape: [usize; 2],
    z_bins: usize,
}

impl Grid {

    pub fn new(xextent: Extent, yextent: Extent, zextent: Option<Extent>, img_shape: [usize; 2]) -> Result<Self, GridError> {
        if img_shape.contains(&0) { return Err(GridError::Shape(img_shape.to_vec())) }
        Ok(Self { xextent, yextent, zextent, img_shape, z_bins: 1 })
    }

    /// Cut the z extent into `n` depth bins. Only meaningful with a z extent.
    pub fn with_z_bins(mut self, n: usize) -> Result<Self, GridError> {
        if n == 0 || self.zextent.is_none() {
            let [nx, ny] = self.img_shape;
            return Err(GridError::Shape(vec![nx, ny, n]))
        }
        self.z_bins = n;
        Ok(self)
    }

    pub fn z_bins(&self) -> usize { self.z_bins }

    /// Physical width and height of one pixel in grid coordinates
    pub fn pixel_size(&self) -> [Coordf32; 2] {
        let [nx, ny] = self.img_shape;
        [self.xextent.width() / nx as f32,
         self.yextent.width() / ny as f32]
    }

    /// Centre of pixel `(ix, iy)` in grid coordinates
    pub fn pixel_centre(&self, ix: usize, iy: usize) -> [Coordf32; 2] {
        let [sx, sy] = self.pixel_size();
        [self.xextent.lo + (ix as f32 + 0.5) * sx,
         self.yextent.lo + (iy as f32 + 0.5) * sy]
    }

    /// Is `xyz` inside the x, y and (if present) z extents?
    pub fn contains(&self, xyz: ArrayView1<f32>) -> bool {
        self.xextent.contains(xyz[0]) &&
        self.yextent.contains(xyz[1]) &&
        self.zextent.map_or(true, |z| z.contains(xyz[2]))
    }

    /// Pixel (and depth bin) containing `xyz`, `None` if it is off the grid
    pub fn locate(&self, xyz: ArrayView1<f32>) -> Option<Cell> {
        let [nx, ny] = self.img_shape;
        let (ix, dx) = discretize(xyz[0], self.xextent, nx)?;
        let (iy, dy) = discretize(xyz[1], self.yextent, ny)?;
        let iz = match self.zextent {
            Some(z) => discretize(xyz[2], z, self.z_bins)?.0,
            None    => 0,
        };
        Some(Cell { ix, iy, iz, dx, dy })
    }
}
