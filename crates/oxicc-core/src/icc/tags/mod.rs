//! Tag-element codecs
//!
//! Tag data in a profile is kept as opaque bytes; the codecs here interpret
//! individual elements on demand. Every decoder takes the full element
//! including its leading 4-byte type signature.

pub mod curves;
pub mod lut;
pub mod text;
pub mod xyz;
