//! Column-wise collections of point emitters
//!
//! An `EmitterSet` stores N emitters as parallel columns: positions (`xyz`,
//! always 3 columns), photon counts (`phot`) and integral frame indices
//! (`frame_ix`), optionally accompanied by ids and per-axis Cramer-Rao
//! localization bounds (`xyz_cr`). The unit of x and y is carried as metadata
//! and other views are computed on access, see [`crate::coord`].

mod loose;
pub use loose::{LooseEmitterSet, FRAME_LIMIT};

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;

use units::PxSize;
use crate::coord::{convert_xyz, XyUnit};
use crate::error::{EmitterError, UnitError};
use crate::grid::Extent;

#[derive(Clone, Debug, PartialEq)]
pub struct EmitterSet {
    xyz     : Array2<f32>,
    phot    : Array1<f32>,
    frame_ix: Array1<i64>,
    id      : Option<Array1<i64>>,
    xyz_cr  : Option<Array2<f32>>,
    xy_unit : Option<XyUnit>,
    px_size : Option<PxSize>,
}

/// How `EmitterSet::cat` should treat the frame indices of its inputs
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FrameIxPolicy {
    /// Leave frame indices as they are
    #[default]
    Keep,
    /// Every emitter of the i-th set gets the i-th value
    Assign(Vec<i64>),
    /// The i-th set is moved `i * shift` frames later
    Shift(i64),
}

type Result<T> = std::result::Result<T, EmitterError>;

/// 2^63: integral floats in `[-I64_BOUND, I64_BOUND)` convert to `i64` exactly
const I64_BOUND: f32 = 9_223_372_036_854_775_808.0;

/// Largest number of frames `split_in_frames` will produce
pub const MAX_SPLIT_FRAMES: usize = 1 << 24;

fn check_len(column: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found { Ok(()) }
    else { Err(EmitterError::LengthMismatch { column, expected, found }) }
}

/// Accept N×2 or N×3 positions, padding the former with z = 0.
fn three_columns(xyz: Array2<f32>) -> Result<Array2<f32>> {
    match xyz.ncols() {
        3 => Ok(xyz),
        2 => {
            let mut out = Array2::zeros((xyz.nrows(), 3));
            out.slice_mut(s![.., ..2]).assign(&xyz);
            Ok(out)
        },
        n => Err(EmitterError::Columns(n)),
    }
}

impl EmitterSet {

    pub fn new(xyz: Array2<f32>, phot: Array1<f32>, frame_ix: Array1<i64>) -> Result<Self> {
        let n = xyz.nrows();
        check_len("phot"    , n, phot    .len())?;
        check_len("frame_ix", n, frame_ix.len())?;
        let xyz = three_columns(xyz)?;
        Ok(Self { xyz, phot, frame_ix, id: None, xyz_cr: None, xy_unit: None, px_size: None })
    }

    /// Like `new`, but for frame indices that arrive as floats. Every one of
    /// them must be an exact integer.
    pub fn from_float_frames(xyz: Array2<f32>, phot: Array1<f32>, frame_ix: Array1<f32>) -> Result<Self> {
        let n = xyz.nrows();
        check_len("phot"    , n, phot    .len())?;
        check_len("frame_ix", n, frame_ix.len())?;
        let frame_ix = frame_ix.iter().enumerate()
            .map(|(row, &value)| {
                if !(value.is_finite() && value.fract() == 0.0) {
                    Err(EmitterError::NonIntegralFrame { row, value })
                } else if !(-I64_BOUND..I64_BOUND).contains(&value) {
                    Err(EmitterError::FrameOutOfRange { row, value })
                } else {
                    Ok(value as i64)
                }
            })
            .collect::<Result<Array1<i64>>>()?;
        Self::new(xyz, phot, frame_ix)
    }

    /// A set with no emitters and no metadata
    pub fn empty() -> Self {
        Self {
            xyz     : Array2::zeros((0, 3)),
            phot    : Array1::zeros(0),
            frame_ix: Array1::zeros(0),
            id      : None,
            xyz_cr  : None,
            xy_unit : None,
            px_size : None,
        }
    }

    /// Emitters for which only the positions matter: unit photon counts, all
    /// in frame 0.
    pub fn coordinates_only(xyz: Array2<f32>, xy_unit: Option<XyUnit>, px_size: Option<PxSize>) -> Result<Self> {
        let n = xyz.nrows();
        let mut em = Self::new(xyz, Array1::ones(n), Array1::zeros(n))?;
        em.xy_unit = xy_unit;
        em.px_size = px_size;
        Ok(em)
    }

    /// `n` emitters uniformly distributed in `[0, extent)` along all three
    /// axes, in pixel units, with unit photon counts, all in frame 0.
    pub fn random(n: usize, extent: f32, rng: &mut impl Rng) -> Self {
        let xyz = Array2::from_shape_fn((n, 3), |_| rng.gen::<f32>() * extent);
        Self {
            xyz,
            phot    : Array1::ones(n),
            frame_ix: Array1::zeros(n),
            id      : None,
            xyz_cr  : None,
            xy_unit : Some(XyUnit::Px),
            px_size : None,
        }
    }

    // ----- Builders ----------------------------------------------------------------
    pub fn with_unit(mut self, xy_unit: XyUnit) -> Self { self.xy_unit = Some(xy_unit); self }

    pub fn with_px_size(mut self, px_size: PxSize) -> Self { self.px_size = Some(px_size); self }

    pub fn with_id(mut self, id: Array1<i64>) -> Result<Self> {
        check_len("id", self.len(), id.len())?;
        self.id = Some(id);
        Ok(self)
    }

    pub fn with_xyz_cr(mut self, xyz_cr: Array2<f32>) -> Result<Self> {
        self.set_xyz_cr(xyz_cr)?;
        Ok(self)
    }

    // ----- Metadata reassignment -----------------------------------------------------
    pub fn set_xy_unit(&mut self, xy_unit: Option<XyUnit>) { self.xy_unit = xy_unit }

    pub fn set_px_size(&mut self, px_size: Option<PxSize>) { self.px_size = px_size }

    pub fn set_xyz_cr(&mut self, xyz_cr: Array2<f32>) -> Result<()> {
        check_len("xyz_cr", self.len(), xyz_cr.nrows())?;
        self.xyz_cr = Some(three_columns(xyz_cr)?);
        Ok(())
    }

    pub fn set_phot(&mut self, phot: Array1<f32>) -> Result<()> {
        check_len("phot", self.len(), phot.len())?;
        self.phot = phot;
        Ok(())
    }

    // ----- Accessors -----------------------------------------------------------------
    pub fn len     (&self) -> usize { self.xyz.nrows() }
    pub fn is_empty(&self) -> bool  { self.len() == 0 }

    pub fn xyz     (&self) -> ArrayView2<f32> { self.xyz     .view() }
    pub fn phot    (&self) -> ArrayView1<f32> { self.phot    .view() }
    pub fn frame_ix(&self) -> ArrayView1<i64> { self.frame_ix.view() }

    pub fn id     (&self) -> Option<ArrayView1<i64>> { self.id    .as_ref().map(Array1::view) }
    pub fn xyz_cr (&self) -> Option<ArrayView2<f32>> { self.xyz_cr.as_ref().map(Array2::view) }
    pub fn xy_unit(&self) -> Option<XyUnit>          { self.xy_unit }
    pub fn px_size(&self) -> Option<PxSize>          { self.px_size }

    pub fn xyz_px(&self) -> std::result::Result<Array2<f32>, UnitError> { self.xyz_in(XyUnit::Px) }
    pub fn xyz_nm(&self) -> std::result::Result<Array2<f32>, UnitError> { self.xyz_in(XyUnit::Nm) }

    pub fn xyz_cr_px(&self) -> std::result::Result<Array2<f32>, UnitError> { self.xyz_cr_in(XyUnit::Px) }
    pub fn xyz_cr_nm(&self) -> std::result::Result<Array2<f32>, UnitError> { self.xyz_cr_in(XyUnit::Nm) }

    fn xyz_in(&self, unit: XyUnit) -> std::result::Result<Array2<f32>, UnitError> {
        convert_xyz(self.xyz.view(), self.xy_unit, unit, self.px_size)
    }

    fn xyz_cr_in(&self, unit: XyUnit) -> std::result::Result<Array2<f32>, UnitError> {
        let cr = self.xyz_cr.as_ref().ok_or(UnitError::MissingCramerRao)?;
        convert_xyz(cr.view(), self.xy_unit, unit, self.px_size)
    }

    /// Smallest and largest frame index, `None` for an empty set
    pub fn frame_range(&self) -> Option<(i64, i64)> {
        let min = self.frame_ix.iter().min()?;
        let max = self.frame_ix.iter().max()?;
        Some((*min, *max))
    }

    // ----- Subsets -------------------------------------------------------------------

    /// New set containing the rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            xyz     : self.xyz     .select(Axis(0), indices),
            phot    : self.phot    .select(Axis(0), indices),
            frame_ix: self.frame_ix.select(Axis(0), indices),
            id      : self.id    .as_ref().map(|id| id.select(Axis(0), indices)),
            xyz_cr  : self.xyz_cr.as_ref().map(|cr| cr.select(Axis(0), indices)),
            xy_unit : self.xy_unit,
            px_size : self.px_size,
        }
    }

    /// Emitters whose frame index lies in `[ix_f, ix_l]`, with `shift` added
    /// to their frame indices.
    pub fn frame_subset(&self, ix_f: i64, ix_l: i64, shift: i64) -> Self {
        let indices: Vec<usize> = self.frame_ix.iter().enumerate()
            .filter(|(_, &f)| ix_f <= f && f <= ix_l)
            .map(|(i, _)| i)
            .collect();
        let mut subset = self.select(&indices);
        subset.frame_ix += shift;
        subset
    }

    /// Remove emitters lying outside the given half-open extents
    pub fn within_extent(&self, xextent: Extent, yextent: Extent, zextent: Option<Extent>) -> Self {
        let indices: Vec<usize> = self.xyz.axis_iter(Axis(0)).enumerate()
            .filter(|(_, p)| {
                xextent.contains(p[0]) &&
                yextent.contains(p[1]) &&
                zextent.map_or(true, |z| z.contains(p[2]))
            })
            .map(|(i, _)| i)
            .collect();
        let dropped = self.len() - indices.len();
        if dropped > 0 { log::debug!("Removed {dropped} of {} emitters outside the field of view", self.len()) }
        self.select(&indices)
    }

    /// One set per frame in the inclusive range `[ix_f, ix_l]`, in ascending
    /// frame order. Missing bounds are taken from the data; frames without
    /// emitters yield empty sets, emitters outside the range are dropped.
    ///
    /// Fails if the range spans more than `MAX_SPLIT_FRAMES` frames.
    pub fn split_in_frames(&self, ix_f: Option<i64>, ix_l: Option<i64>) -> Result<Vec<Self>> {
        let observed = self.frame_range();
        let bounds = match (ix_f, ix_l) {
            (Some(f), Some(l)) => Some((f, l)),
            _ => observed.map(|(min, max)| (ix_f.unwrap_or(min), ix_l.unwrap_or(max))),
        };
        let Some((ix_f, ix_l)) = bounds else { return Ok(vec![]) };
        if ix_l < ix_f { return Ok(vec![]) }

        let n_frames = ix_l.checked_sub(ix_f)
            .and_then(|span| usize::try_from(span).ok())
            .and_then(|span| span.checked_add(1))
            .filter(|&n| n <= MAX_SPLIT_FRAMES)
            .ok_or(EmitterError::FrameRange { first: ix_f, last: ix_l })?;
        let mut buckets: Vec<Vec<usize>> = vec![vec![]; n_frames];
        for (i, &f) in self.frame_ix.iter().enumerate() {
            if ix_f <= f && f <= ix_l {
                buckets[(f - ix_f) as usize].push(i);
            }
        }
        log::debug!("Split {} emitters into {n_frames} frames [{ix_f}, {ix_l}]", self.len());
        Ok(buckets.iter().map(|indices| self.select(indices)).collect())
    }

    /// Concatenate `sets`, preserving their order and the order within each.
    ///
    /// Unit and pixel size are taken from the first set. Ids and Cramer-Rao
    /// values survive only if every input carries them.
    pub fn cat(sets: &[Self], policy: FrameIxPolicy) -> Result<Self> {
        if let FrameIxPolicy::Assign(ref values) = policy {
            if values.len() != sets.len() {
                return Err(EmitterError::FrameIxCount { given: values.len(), sets: sets.len() })
            }
        }
        let Some(first) = sets.first() else { return Ok(Self::empty()) };
        if sets.iter().any(|s| s.xy_unit != first.xy_unit || s.px_size != first.px_size) {
            log::warn!("Concatenating emitter sets with differing units or pixel sizes; keeping those of the first");
        }

        let total: usize = sets.iter().map(Self::len).sum();
        let mut xyz     : Array2<f32> = Array2::zeros((total, 3));
        let mut phot    : Array1<f32> = Array1::zeros(total);
        let mut frame_ix: Array1<i64> = Array1::zeros(total);
        let keep_id = sets.iter().all(|s| s.id    .is_some());
        let keep_cr = sets.iter().all(|s| s.xyz_cr.is_some());
        let mut id    : Option<Array1<i64>> = keep_id.then(|| Array1::zeros(total));
        let mut xyz_cr: Option<Array2<f32>> = keep_cr.then(|| Array2::zeros((total, 3)));

        let mut start = 0;
        for (i, set) in sets.iter().enumerate() {
            let rows = start..start + set.len();
            xyz .slice_mut(s![rows.clone(), ..]).assign(&set.xyz);
            phot.slice_mut(s![rows.clone()    ]).assign(&set.phot);
            let mut frames = frame_ix.slice_mut(s![rows.clone()]);
            match &policy {
                FrameIxPolicy::Keep          => frames.assign(&set.frame_ix),
                FrameIxPolicy::Assign(value) => frames.fill(value[i]),
                FrameIxPolicy::Shift(shift)  => frames.assign(&(&set.frame_ix + i as i64 * shift)),
            }
            if let (Some(out), Some(src)) = (id.as_mut(), set.id.as_ref()) {
                out.slice_mut(s![rows.clone()]).assign(src);
            }
            if let (Some(out), Some(src)) = (xyz_cr.as_mut(), set.xyz_cr.as_ref()) {
                out.slice_mut(s![rows, ..]).assign(src);
            }
            start += set.len();
        }
        Ok(Self { xyz, phot, frame_ix, id, xyz_cr, xy_unit: first.xy_unit, px_size: first.px_size })
    }
}

impl Default for EmitterSet {
    fn default() -> Self { Self::empty() }
}
