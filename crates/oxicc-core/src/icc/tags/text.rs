//! `text` and `mluc` elements
//!
//! Only decoded far enough to expose copyright strings.

use crate::error::{Error, Result};
use crate::icc::types::{read_u16, read_u32};

/// One localized string from a `mluc` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedText {
    /// ISO 639-1 language code
    pub language: String,
    /// ISO 3166-1 country code
    pub country: String,
    pub value: String,
}

fn check_type(type_id: &[u8; 4], data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != type_id {
        return Err(Error::UnexpectedTagType);
    }
    Ok(())
}

/// Decode a `text` element: a NUL-padded ASCII string after the 8-byte
/// element header.
pub fn decode_text(data: &[u8]) -> Result<String> {
    check_type(b"text", data)?;

    if data.len() < 8 {
        return Err(Error::InvalidTagData);
    }
    let start = 8;
    let mut end = data.len();
    while end - 1 > start && data[end - 1] == 0 {
        end -= 1;
    }
    Ok(String::from_utf8_lossy(&data[start..end]).into_owned())
}

/// Decode a `mluc` element into its list of localized strings.
pub fn decode_mluc(data: &[u8]) -> Result<Vec<LocalizedText>> {
    check_type(b"mluc", data)?;

    if data.len() < 12 {
        return Err(Error::InvalidTagData);
    }
    let n = read_u32(data, 8) as usize;
    if n == 0 || data.len() < 16 + 12 * n {
        return Err(Error::InvalidTagData);
    }

    let mut res = Vec::with_capacity(n);
    for i in 0..n {
        let rec = 16 + 12 * i;
        let language = String::from_utf8_lossy(&data[rec..rec + 2]).into_owned();
        let country = String::from_utf8_lossy(&data[rec + 2..rec + 4]).into_owned();
        let length = read_u32(data, rec + 4) as usize;
        let offset = read_u32(data, rec + 8) as usize;

        let end = offset.checked_add(length).ok_or(Error::InvalidTagData)?;
        if end > data.len() || length % 2 != 0 {
            return Err(Error::InvalidTagData);
        }

        let units: Vec<u16> = (0..length / 2)
            .map(|j| read_u16(data, offset + 2 * j))
            .collect();
        res.push(LocalizedText {
            language,
            country,
            value: String::from_utf16_lossy(&units),
        });
    }
    Ok(res)
}
