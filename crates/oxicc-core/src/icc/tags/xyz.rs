//! XYZType elements
//!
//! A 20-byte element: the `XYZ ` signature, four reserved bytes, and three
//! s15Fixed16 values. Used for matrix columns and the media white point.

use crate::error::{Error, Result};
use crate::icc::types::{read_s15_fixed16, write_s15_fixed16};

/// Decode an `XYZ ` element into its three coordinates.
pub fn decode_xyz(data: &[u8]) -> Result<[f64; 3]> {
    if data.len() < 20 {
        return Err(Error::InvalidTagData);
    }
    if &data[0..4] != b"XYZ " {
        return Err(Error::UnexpectedTagType);
    }

    Ok([
        read_s15_fixed16(data, 8),
        read_s15_fixed16(data, 12),
        read_s15_fixed16(data, 16),
    ])
}

/// Encode three coordinates as an `XYZ ` element.
pub fn encode_xyz(xyz: [f64; 3]) -> Vec<u8> {
    let mut buf = vec![0u8; 20];
    buf[0..4].copy_from_slice(b"XYZ ");
    write_s15_fixed16(&mut buf, 8, xyz[0]);
    write_s15_fixed16(&mut buf, 12, xyz[1]);
    write_s15_fixed16(&mut buf, 16, xyz[2]);
    buf
}
