//! Error types of the crate

use crate::coord::XyUnit;

/// Failures while building or combining emitter sets.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EmitterError {
    #[error("column `{column}` has {found} entries but xyz has {expected}")]
    LengthMismatch { column: &'static str, expected: usize, found: usize },

    #[error("xyz must have 2 or 3 columns, found {0}")]
    Columns(usize),

    #[error("frame index {value} at row {row} is not integral")]
    NonIntegralFrame { row: usize, value: f32 },

    #[error("frame index {value} at row {row} does not fit in a 64-bit integer")]
    FrameOutOfRange { row: usize, value: f32 },

    #[error("on-time {value} at row {row} must be finite, non-negative and end within 2^24 frames")]
    OnTime { row: usize, value: f32 },

    #[error("start time {value} at row {row} must be finite and within ±2^24 frames")]
    StartTime { row: usize, value: f32 },

    #[error("mean on-time must be finite and positive, got {0}")]
    Lifetime(f32),

    #[error("frame range [{first}, {last}] spans too many frames to split")]
    FrameRange { first: i64, last: i64 },

    #[error("{given} frame indices given for {sets} emitter sets")]
    FrameIxCount { given: usize, sets: usize },
}

/// Failures of the lazy px <-> nm accessors. Recoverable by supplying the
/// missing metadata and asking again.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("xy unit is not set")]
    MissingUnit,

    #[error("pixel size is needed to convert from {from} to {to}")]
    MissingPxSize { from: XyUnit, to: XyUnit },

    #[error("emitter set carries no Cramer-Rao values")]
    MissingCramerRao,
}

/// Invalid target-grid or generator parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("extent ({0}, {1}) must be finite with lower < upper")]
    Extent(f32, f32),

    #[error("image shape must be non-zero in every dimension, got {0:?}")]
    Shape(Vec<usize>),

    #[error("ROI size must be odd and positive, got {0}")]
    RoiSize(usize),

    #[error("kernel size must be odd and positive with sigma > 0, got size {size} and sigma {sigma}")]
    Kernel { size: usize, sigma: f32 },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Emitter(#[from] EmitterError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Failed to read or write file")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration")]
    Config(#[from] toml::de::Error),

    #[error("target file is malformed: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, Error>;
