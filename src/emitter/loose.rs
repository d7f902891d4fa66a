//! Emitters living on a continuous time axis
//!
//! Each emitter switches on at `t0` and stays on for `ontime`, emitting
//! `phot` photons per unit of time. Time is measured in frames: frame `k`
//! integrates over `[k, k + 1)`.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use rand_distr::{Distribution, Exp};

use units::{PxSize, todo::{Framef32, Photonsf32}};
use crate::coord::XyUnit;
use crate::error::EmitterError;
use crate::grid::Extent;
use super::EmitterSet;

#[derive(Clone, Debug, PartialEq)]
pub struct LooseEmitterSet {
    xyz    : Array2<f32>,
    phot   : Array1<f32>,
    ontime : Array1<Framef32>,
    t0     : Array1<Framef32>,
    id     : Option<Array1<i64>>,
    xy_unit: Option<XyUnit>,
    px_size: Option<PxSize>,
}

type Result<T> = std::result::Result<T, EmitterError>;

/// On-windows must lie within `[-FRAME_LIMIT, FRAME_LIMIT]` frames, where
/// every frame boundary is exactly representable as `f32`.
pub const FRAME_LIMIT: Framef32 = 16_777_216.0;

impl LooseEmitterSet {

    pub fn new(xyz: Array2<f32>, phot: Array1<f32>, ontime: Array1<Framef32>, t0: Array1<Framef32>) -> Result<Self> {
        let n = xyz.nrows();
        super::check_len("phot"  , n, phot  .len())?;
        super::check_len("ontime", n, ontime.len())?;
        super::check_len("t0"    , n, t0    .len())?;
        if let Some((row, &value)) = t0.iter().enumerate().find(|(_, t)| !(t.abs() <= FRAME_LIMIT)) {
            return Err(EmitterError::StartTime { row, value })
        }
        let bad_ontime = |(row, (&t, &on)): (usize, (&f32, &f32))| {
            let valid = on.is_finite() && on >= 0.0 && (t + on) <= FRAME_LIMIT;
            (!valid).then_some(EmitterError::OnTime { row, value: on })
        };
        if let Some(err) = t0.iter().zip(ontime.iter()).enumerate().find_map(bad_ontime) {
            return Err(err)
        }
        let xyz = super::three_columns(xyz)?;
        Ok(Self { xyz, phot, ontime, t0, id: None, xy_unit: None, px_size: None })
    }

    /// `n` emitters placed uniformly within `extents` (x, y, z), switching on
    /// uniformly within `frames` and staying on for exponentially distributed
    /// times with mean `lifetime`.
    pub fn random(
        n        : usize,
        extents  : [Extent; 3],
        frames   : Extent,
        lifetime : Framef32,
        phot     : Photonsf32,
        rng      : &mut impl Rng,
    ) -> Result<Self> {
        let exp = Exp::new(1.0 / lifetime)
            .ok()
            .filter(|_| lifetime.is_finite() && lifetime > 0.0)
            .ok_or(EmitterError::Lifetime(lifetime))?;
        let xyz    = Array2::from_shape_fn((n, 3), |(_, axis)| extents[axis].sample(rng));
        let t0     = Array1::from_shape_fn(n, |_| frames.sample(rng));
        let ontime = Array1::from_shape_fn(n, |_| exp.sample(rng));
        Self::new(xyz, Array1::from_elem(n, phot), ontime, t0)
    }

    pub fn with_id(mut self, id: Array1<i64>) -> Result<Self> {
        super::check_len("id", self.len(), id.len())?;
        self.id = Some(id);
        Ok(self)
    }

    pub fn with_unit(mut self, xy_unit: XyUnit) -> Self { self.xy_unit = Some(xy_unit); self }

    pub fn with_px_size(mut self, px_size: PxSize) -> Self { self.px_size = Some(px_size); self }

    pub fn len     (&self) -> usize { self.xyz.nrows() }
    pub fn is_empty(&self) -> bool  { self.len() == 0 }

    pub fn t0    (&self) -> ArrayView1<Framef32> { self.t0    .view() }
    pub fn ontime(&self) -> ArrayView1<Framef32> { self.ontime.view() }

    /// Distribute every emitter's on-window over the frames it overlaps.
    ///
    /// Each (emitter, frame) pair with a positive overlap becomes one row,
    /// carrying `phot * overlap` photons and the id of its emitter (its row
    /// index if no ids were given). Rows are ordered by emitter, then frame.
    pub fn return_emitterset(&self) -> EmitterSet {
        let mut xyz      = vec![];
        let mut phot     = vec![];
        let mut frame_ix = vec![];
        let mut id       = vec![];
        for (i, p) in self.xyz.axis_iter(Axis(0)).enumerate() {
            let (t0, ontime) = (self.t0[i], self.ontime[i]);
            let te = t0 + ontime;
            let first = t0.floor() as i64;
            let last  = te.ceil()  as i64 - 1;
            for frame in first..=last {
                let start = t0.max(frame as f32);
                let end   = te.min((frame + 1) as f32);
                let overlap = end - start;
                if overlap <= 0.0 { continue }
                xyz     .push([p[0], p[1], p[2]]);
                phot    .push(self.phot[i] * overlap);
                frame_ix.push(frame);
                id      .push(self.id.as_ref().map_or(i as i64, |id| id[i]));
            }
        }
        log::debug!("{} loose emitters spread over {} frame-wise emitters", self.len(), xyz.len());
        EmitterSet {
            xyz     : Array2::from(xyz),
            phot    : Array1::from(phot),
            frame_ix: Array1::from(frame_ix),
            id      : Some(Array1::from(id)),
            xyz_cr  : None,
            xy_unit : self.xy_unit,
            px_size : self.px_size,
        }
    }
}
