//! ICC profile container and tag-element codecs
//!
//! An ICC profile consists of:
//! 1. A 128-byte header
//! 2. A tag table listing all tags
//! 3. Tag data (entries may share byte ranges)
//!
//! [`profile::Profile`] handles the container; the modules under [`tags`]
//! interpret individual tag elements (curves, LUTs, XYZ values, text).

pub mod header;
pub mod profile;
pub mod tags;
pub mod types;
