//! Units of emitter coordinates and conversion between them
//!
//! Coordinates are stored in whatever unit they arrived in. Views in the other
//! unit are computed on demand from the stored values plus two pieces of
//! metadata: the `xy_unit` label and the physical pixel size. Only x and y are
//! affected; z is always left as it is.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Axis};
use serde::Deserialize;

use units::{nm_, PxSize};
use crate::error::UnitError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XyUnit { Px, Nm }

impl fmt::Display for XyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XyUnit::Px => write!(f, "px"),
            XyUnit::Nm => write!(f, "nm"),
        }
    }
}

impl FromStr for XyUnit {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "px" => Ok(XyUnit::Px),
            "nm" => Ok(XyUnit::Nm),
            _    => Err(format!("Unknown xy unit `{s}`: expected `px` or `nm`")),
        }
    }
}

/// Express `xyz` (rows of x, y, z) in unit `to`.
///
/// Fails if the source unit is unknown, or if a change of unit is requested
/// without a pixel size. An empty array obeys the same rules.
pub fn convert_xyz(
    xyz     : ArrayView2<f32>,
    from    : Option<XyUnit>,
    to      : XyUnit,
    px_size : Option<PxSize>,
) -> Result<Array2<f32>, UnitError> {
    let from = from.ok_or(UnitError::MissingUnit)?;
    if from == to { return Ok(xyz.to_owned()) }
    let [sx, sy] = px_size
        .map(|[sx, sy]| [nm_(sx), nm_(sy)])
        .ok_or(UnitError::MissingPxSize { from, to })?;
    let mut out = xyz.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        match to {
            XyUnit::Nm => { row[0] *= sx; row[1] *= sy; }
            XyUnit::Px => { row[0] /= sx; row[1] /= sy; }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use units::px_size_nm;

    fn rows(v: &[[f32; 3]]) -> Array2<f32> { Array2::from(v.to_vec()) }

    fn check(actual: Result<Array2<f32>, UnitError>, expected: Option<Vec<[f32; 3]>>) {
        match (actual, expected) {
            (Err(_), None) => {},
            (Ok(a), Some(e)) => {
                let e = rows(&e);
                assert_eq!(a.dim(), e.dim());
                for (a, e) in a.iter().zip(e.iter()) {
                    assert_float_eq!(*a, *e, abs <= 1e-4);
                }
            },
            (a, e) => panic!("expected {e:?}, got {a:?}"),
        }
    }

    use XyUnit::{Px, Nm};

    #[rstest(/**/ xyz,                  unit,     px_size,           px,                          nm,
             case(vec![],               None,     None,              None,                        None),
             case(vec![],               Some(Px), None,              Some(vec![]),                None),
             case(vec![],               Some(Nm), None,              None,                        Some(vec![])),
             case(vec![[25., 25., 5.]], None,     None,              None,                        None),
             case(vec![[25., 25., 5.]], Some(Px), None,              Some(vec![[25., 25., 5.]]),  None),
             case(vec![[25., 25., 5.]], Some(Nm), None,              None,                        Some(vec![[25., 25., 5.]])),
             case(vec![[0.25,0.25,5.]], Some(Px), Some([50., 100.]), Some(vec![[0.25,0.25,5.]]),  Some(vec![[12.5, 25., 5.]])),
             case(vec![[25., 25., 5.]], Some(Nm), Some([50., 100.]), Some(vec![[0.5, 0.25, 5.]]), Some(vec![[25., 25., 5.]])),
    )]
    fn conversion_table(
        xyz    : Vec<[f32; 3]>,
        unit   : Option<XyUnit>,
        px_size: Option<[f32; 2]>,
        px     : Option<Vec<[f32; 3]>>,
        nm     : Option<Vec<[f32; 3]>>,
    ) {
        let xyz = rows(&xyz);
        let px_size = px_size.map(px_size_nm);
        check(convert_xyz(xyz.view(), unit, Px, px_size), px);
        check(convert_xyz(xyz.view(), unit, Nm, px_size), nm);
    }

    #[test]
    fn missing_px_size_names_both_units() {
        let xyz = rows(&[[1., 2., 3.]]);
        let err = convert_xyz(xyz.view(), Some(XyUnit::Px), XyUnit::Nm, None).unwrap_err();
        assert_eq!(err, UnitError::MissingPxSize { from: XyUnit::Px, to: XyUnit::Nm });
    }

    #[test]
    fn unit_parsing() {
        assert_eq!("px".parse::<XyUnit>(), Ok(XyUnit::Px));
        assert_eq!("nm".parse::<XyUnit>(), Ok(XyUnit::Nm));
        assert!("mm".parse::<XyUnit>().is_err());
        assert_eq!(XyUnit::Nm.to_string(), "nm");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn px_nm_roundtrip(
            x  in -100.0 .. (100.0 as f32),
            y  in -100.0 .. (100.0 as f32),
            z  in -500.0 .. (500.0 as f32),
            sx in   10.0 .. (200.0 as f32),
            sy in   10.0 .. (200.0 as f32),
        ) {
            let xyz = rows(&[[x, y, z]]);
            let px_size = Some(px_size_nm([sx, sy]));
            let there = convert_xyz(xyz.view(), Some(XyUnit::Px), XyUnit::Nm, px_size).unwrap();
            let back  = convert_xyz(there.view(), Some(XyUnit::Nm), XyUnit::Px, px_size).unwrap();
            for (a, b) in xyz.iter().zip(back.iter()) {
                assert_float_eq!(*a, *b, abs <= 1e-3);
            }
        }
    }
}
