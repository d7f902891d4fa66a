pub mod todo;

pub use uom;
pub use uom::si::Quantity;
pub use uom::si::f32::Length;

mod units {
  pub use uom::si::length::{nanometer, micrometer};
}

// Making values from float literals seems to be very long-winded, so provide
// some pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(nm Length  nanometer);
wrap!(um Length micrometer);

// Reverse direction of the above.
pub fn nm_(x: Length) -> f32 { x.get::<units::nanometer>() }
pub fn um_(x: Length) -> f32 { x.get::<units::micrometer>() }

/// Physical size of one camera pixel along x and y.
pub type PxSize = [Length; 2];

/// Pixel size from a pair of `f32`s interpreted as nanometres
pub fn px_size_nm([x, y]: [f32; 2]) -> PxSize { [nm(x), nm(y)] }

/// Pixel size as a pair of `f32`s in nanometres
pub fn px_size_nm_([x, y]: PxSize) -> [f32; 2] { [nm_(x), nm_(y)] }

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
