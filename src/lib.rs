pub mod error;
pub mod coord;
pub mod emitter;
pub mod grid;
pub mod target;
pub mod dataset;
pub mod config;
pub mod io;
pub mod utils;

pub use coord::XyUnit;
pub use emitter::{EmitterSet, FrameIxPolicy, LooseEmitterSet};
pub use error::{EmitterError, Error, GridError, UnitError};
pub use grid::{Extent, Grid};
pub use target::TargetGenerator;
