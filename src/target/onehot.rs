use ndarray::{s, Array2, Array3};

use crate::emitter::EmitterSet;
use crate::error::GridError;
use crate::grid::Grid;
use super::{DeltaPsf, DeltaWeight, Overlap, TargetGenerator};

/// Presence map for classification: every emitter becomes a Gaussian blob of
/// height exactly 1, whatever its photon count. Overlapping blobs saturate at
/// 1. With a threshold, the map is binarised.
#[derive(Clone, Debug)]
pub struct ZasOneHot {
    delta: DeltaPsf,
    kernel: Array2<f32>,
    threshold: Option<f32>,
}

/// Odd square Gaussian kernel with its peak (the centre) at 1
fn gaussian_kernel(size: usize, sigma: f32) -> Array2<f32> {
    let c = (size / 2) as f32;
    Array2::from_shape_fn((size, size), |(i, j)| {
        let (di, dj) = (i as f32 - c, j as f32 - c);
        (-(di * di + dj * dj) / (2.0 * sigma * sigma)).exp()
    })
}

impl ZasOneHot {

    pub fn new(delta: DeltaPsf, kernel_size: usize, sigma: f32) -> Result<Self, GridError> {
        if kernel_size % 2 == 0 || !(sigma.is_finite() && sigma > 0.0) {
            return Err(GridError::Kernel { size: kernel_size, sigma })
        }
        let delta = delta
            .with_weight(DeltaWeight::Unit)
            .with_overlap(Overlap::Sum)
            .with_dark_value(0.0);
        Ok(Self { delta, kernel: gaussian_kernel(kernel_size, sigma), threshold: None })
    }

    /// Values at or above `threshold` become 1, everything else 0
    pub fn with_threshold(mut self, threshold: f32) -> Self { self.threshold = Some(threshold); self }
}

impl TargetGenerator for ZasOneHot {

    fn grid(&self) -> &Grid { self.delta.grid() }

    fn channels(&self) -> usize { self.delta.channels() }

    fn forward(&self, em: &EmitterSet) -> Array3<f32> {
        let counts = self.delta.forward(em);
        let (nz, nx, ny) = counts.dim();
        let k = self.kernel.nrows();
        let r = k / 2;
        let mut out = Array3::<f32>::zeros((nz, nx, ny));
        for ((iz, ix, iy), &n) in counts.indexed_iter() {
            if n == 0.0 { continue }
            // Clip the kernel footprint to the image
            let (x0, x1) = (ix.saturating_sub(r), (ix + r + 1).min(nx));
            let (y0, y1) = (iy.saturating_sub(r), (iy + r + 1).min(ny));
            let (kx0, ky0) = (x0 + r - ix, y0 + r - iy);
            let kernel = self.kernel.slice(s![kx0..kx0 + (x1 - x0), ky0..ky0 + (y1 - y0)]);
            let mut patch = out.slice_mut(s![iz, x0..x1, y0..y1]);
            patch.scaled_add(n, &kernel);
        }
        out.mapv_inplace(|v| v.min(1.0));
        if let Some(t) = self.threshold {
            out.mapv_inplace(|v| if v >= t { 1.0 } else { 0.0 });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use float_eq::assert_float_eq;
    use rstest::rstest;
    use crate::grid::Extent;

    fn zas() -> ZasOneHot {
        let e = Extent::new(-0.5, 31.5).unwrap();
        let delta = DeltaPsf::new(Grid::new(e, e, None, [32, 32]).unwrap());
        ZasOneHot::new(delta, 5, 0.8).unwrap()
    }

    fn max(a: &Array3<f32>) -> f32 { a.iter().cloned().fold(f32::MIN, f32::max) }

    #[rstest(phot, case(1.0), case(0.01), case(12345.0))]
    fn peak_is_one_regardless_of_photons(phot: f32) {
        let em = EmitterSet::new(array![[15., 15., 100.]], array![phot], Array1::zeros(1)).unwrap();
        let img = zas().forward(&em);
        assert_float_eq!(max(&img), 1.0, abs <= 1e-3);
        assert_eq!(img[[0, 15, 15]], 1.0);
        assert!(img[[0, 16, 15]] > 0.0 && img[[0, 16, 15]] < 1.0);
        assert_eq!(img[[0, 18, 15]], 0.0);
    }

    #[test]
    fn blobs_at_edges_are_clipped() {
        let em = EmitterSet::coordinates_only(array![[0., 31., 0.]], None, None).unwrap();
        let img = zas().forward(&em);
        assert_eq!(img[[0, 0, 31]], 1.0);
        assert!(img[[0, 2, 29]] > 0.0);
    }

    #[test]
    fn overlapping_blobs_saturate() {
        let em = EmitterSet::coordinates_only(array![[10., 10., 0.], [11., 10., 0.], [10.2, 10.1, 0.]], None, None)
            .unwrap();
        let img = zas().forward(&em);
        assert_float_eq!(max(&img), 1.0, abs <= 1e-6);
    }

    #[test]
    fn threshold_binarises() {
        let em = EmitterSet::coordinates_only(array![[10., 10., 0.]], None, None).unwrap();
        let img = zas().with_threshold(0.4).forward(&em);
        assert!(img.iter().all(|&v| v == 0.0 || v == 1.0));
        assert_eq!(img.sum(), 5.0);
    }

    #[test]
    fn invalid_kernel() {
        let e = Extent::new(-0.5, 31.5).unwrap();
        let delta = DeltaPsf::new(Grid::new(e, e, None, [32, 32]).unwrap());
        assert!(ZasOneHot::new(delta.clone(), 4, 0.8).is_err());
        assert!(ZasOneHot::new(delta, 5, 0.0).is_err());
        assert!(zas().forward(&EmitterSet::empty()).iter().all(|&v| v == 0.0));
    }
}
