//! Colour space conversions used by the transform evaluator

pub mod lab;

/// CIE standard illuminant D50 white point in XYZ coordinates.
///
/// This is the reference illuminant of the ICC Profile Connection Space.
pub const D50_WHITE_POINT: [f64; 3] = [0.9642, 1.0, 0.8249];
