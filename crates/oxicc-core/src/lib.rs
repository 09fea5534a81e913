//! # oxicc - Oxidized ICC profiles
//!
//! A fast, safe ICC profile codec and colour-transform evaluator in Rust.
//!
//! ICC profiles describe how to convert colours between device colour spaces
//! (such as RGB or CMYK) and a device-independent Profile Connection Space
//! (PCS). The PCS is either CIEXYZ or CIELAB, both based on the D50
//! illuminant.
//!
//! ## Reading and Writing Profiles
//!
//! Use [`Profile::decode`] to read an ICC profile from binary data, and
//! [`Profile::encode`] to convert a profile back to binary form:
//!
//! ```no_run
//! use oxicc_core::Profile;
//!
//! # fn main() -> oxicc_core::Result<()> {
//! # let data: Vec<u8> = Vec::new();
//! let profile = Profile::decode(data)?;
//! // inspect profile.class, profile.color_space, profile.version, ...
//! let encoded = profile.encode()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Colour Transformations
//!
//! To convert colours using a profile, create a [`Transform`]:
//!
//! ```no_run
//! use oxicc_core::{Direction, Profile, RenderingIntent, Transform};
//!
//! # fn main() -> oxicc_core::Result<()> {
//! # let profile = Profile::default();
//! let t = Transform::new(&profile, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL)?;
//! let [x, y, z] = t.to_xyz(&[1.0, 0.0, 0.0]); // device RGB to PCS XYZ
//! # Ok(())
//! # }
//! ```
//!
//! For the reverse direction, create the transform with
//! [`Direction::PcsToDevice`] and use [`Transform::from_xyz`].

pub mod color;
pub mod error;
pub mod icc;
pub mod math;
pub mod transform;

pub use color::D50_WHITE_POINT;
pub use error::{Error, Result};
pub use icc::header::{CheckSum, ColorSpace, ProfileClass, RenderingIntent, Version};
pub use icc::profile::Profile;
pub use icc::tags::curves::{Curve, CurveKind};
pub use icc::tags::lut::{Lut, Lut16, Lut8, LutAToB, LutBToA, LutClut, LutMatrix};
pub use icc::tags::text::LocalizedText;
pub use icc::types::{DateTimeNumber, TagSignature, TypeSignature};
pub use math::Matrix3x3;
pub use transform::{detect_profile_kind, Direction, ProfileKind, Transform};

/// Version of the oxicc crate itself (not an ICC format version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
