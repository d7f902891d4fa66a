//! Configuration file parser for target generation

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use units::PxSize;
use crate::error::{Error, GridError};
use crate::grid::{Extent, Grid};
use crate::target::{DeltaPsf, DeltaWeight, GlobalOffsetRep, OffsetRep, RoiOffsetRep, TargetGenerator, ZasOneHot};

fn deserialize_uom_2d_opt<'d, D, T>(deserializer: D) -> Result<Option<[T; 2]>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(&str, &str)>::deserialize(deserializer)?
        .map(|(x, y)| tr_pair_res((x.parse(), y.parse())))
        .transpose()
        .map_err(de::Error::custom)
}

/// Transpose pair of `Result`
///
/// `Ok` if both elements `Ok`; otherwise the first `Err`.
fn tr_pair_res<O, E>((x, y): (Result<O, E>, Result<O, E>)) -> Result<[O; 2], E> {
    Ok([x?, y?])
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Physical size of a camera pixel, e.g. `["100 nm", "100 nm"]`
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_2d_opt")]
    pub px_size: Option<PxSize>,

    pub grid: GridConfig,

    pub target: TargetConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    pub xextent: (f32, f32),
    pub yextent: (f32, f32),
    #[serde(default)]
    pub zextent: Option<(f32, f32)>,
    pub img_shape: [usize; 2],
    /// Number of depth bins; needs `zextent`
    #[serde(default = "default_z_bins")]
    pub z_bins: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetConfig {
    Delta {
        #[serde(default)]
        unit_weight: bool,
        #[serde(default)]
        dark_value: f32,
    },
    Offset,
    RoiOffset {
        #[serde(default = "default_roi_size")]
        roi_size: usize,
    },
    GlobalOffset {
        #[serde(default)]
        masked: bool,
    },
    ZasOneHot {
        #[serde(default = "default_kernel_size")]
        kernel_size: usize,
        #[serde(default = "default_sigma")]
        sigma: f32,
        #[serde(default)]
        threshold: Option<f32>,
    },
}

fn default_z_bins     () -> usize { 1 }
fn default_roi_size   () -> usize { RoiOffsetRep::DEFAULT_ROI_SIZE }
fn default_kernel_size() -> usize { 5 }
fn default_sigma      () -> f32   { 0.8 }

impl GridConfig {
    pub fn build(&self) -> Result<Grid, GridError> {
        let extent = |(lo, hi)| Extent::new(lo, hi);
        let zextent = self.zextent.map(extent).transpose()?;
        let grid = Grid::new(extent(self.xextent)?, extent(self.yextent)?, zextent, self.img_shape)?;
        if self.z_bins == 1 { Ok(grid) }
        else                { grid.with_z_bins(self.z_bins) }
    }
}

impl Config {

    pub fn grid(&self) -> Result<Grid, GridError> { self.grid.build() }

    pub fn target_generator(&self) -> Result<Box<dyn TargetGenerator>, GridError> {
        let grid = self.grid()?;
        let generator: Box<dyn TargetGenerator> = match self.target {
            TargetConfig::Delta { unit_weight, dark_value } => {
                let weight = if unit_weight { DeltaWeight::Unit } else { DeltaWeight::Photons };
                Box::new(DeltaPsf::new(grid).with_weight(weight).with_dark_value(dark_value))
            },
            TargetConfig::Offset                  => Box::new(OffsetRep::new(grid)),
            TargetConfig::RoiOffset { roi_size }  => Box::new(RoiOffsetRep::new(grid).with_roi_size(roi_size)?),
            TargetConfig::GlobalOffset { masked } => Box::new(GlobalOffsetRep::new(grid).masked(masked)),
            TargetConfig::ZasOneHot { kernel_size, sigma, threshold } => {
                let zas = ZasOneHot::new(DeltaPsf::new(grid), kernel_size, sigma)?;
                Box::new(match threshold {
                    Some(t) => zas.with_threshold(t),
                    None    => zas,
                })
            },
        };
        Ok(generator)
    }
}

pub fn read_config_file(path: &Path) -> Result<Config, Error> {
    let config: String = fs::read_to_string(path)?;
    Ok(toml::from_str(&config)?)
}
