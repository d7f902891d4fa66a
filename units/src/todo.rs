/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// This may be because:
///
/// + They are counts or positions on a discrete grid, which `uom` has no
///   dimension for (photons, pixels, frames).
///
/// + Their physical meaning depends on run-time metadata (a coordinate may be
///   in pixels or in nanometres, depending on the `xy_unit` it travels with).

pub type Photonsf32 = f32;
pub type Pixelf32   = f32;
pub type Coordf32   = f32; // px or nm, according to accompanying unit
pub type Framef32   = f32; // continuous time, measured in frames
