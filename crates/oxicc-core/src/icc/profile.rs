//! Profile container codec
//!
//! Decode and re-encode the ICC profile container: the 128-byte header, the
//! tag table, and the raw tag data. Tag bodies stay opaque bytes; the codecs
//! under [`crate::icc::tags`] interpret them on demand.

use std::collections::HashMap;

use md5::{Digest, Md5};

use crate::color::D50_WHITE_POINT;
use crate::error::{Error, Result};
use crate::icc::header::{
    CheckSum, ColorSpace, ProfileClass, RenderingIntent, Version, PROFILE_SIGNATURE,
};
use crate::icc::tags::text::{decode_mluc, decode_text, LocalizedText};
use crate::icc::types::{
    read_u32, read_u64, write_s15_fixed16, write_u32, write_u64, DateTimeNumber, TagSignature,
};

/// An ICC colour profile
///
/// The header fields describe the profile's characteristics. `tag_data`
/// maps tag signatures to their raw binary data; use [`crate::Curve::decode`],
/// [`crate::Lut::decode`] or [`crate::Transform::new`] to interpret tag data
/// for colour transformations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub preferred_cmm_type: u32,
    pub version: Version,
    pub class: ProfileClass,
    /// Device colour space (e.g. RGB, CMYK)
    pub color_space: ColorSpace,
    /// Profile Connection Space (PCS_XYZ or PCS_LAB)
    pub pcs: ColorSpace,
    pub creation_date: DateTimeNumber,
    pub primary_platform: u32,
    pub flags: u32,
    pub device_manufacturer: u32,
    pub device_model: u32,
    pub device_attributes: u64,
    pub rendering_intent: RenderingIntent,
    pub creator: u32,

    /// Whether the embedded Profile ID checksum is valid.
    /// Only meaningful for profiles read with [`Profile::decode`].
    pub checksum: CheckSum,

    /// Raw binary data for each tag in the profile
    pub tag_data: HashMap<TagSignature, Vec<u8>>,
}

fn invalid(offset: usize, reason: &'static str) -> Error {
    Error::InvalidProfile { offset, reason }
}

impl Profile {
    /// Decode an ICC profile. The function takes over ownership of the data.
    pub fn decode(mut data: Vec<u8>) -> Result<Self> {
        if data.len() < 128 + 4 {
            return Err(invalid(0, "profile is too short"));
        }
        if &data[36..40] != PROFILE_SIGNATURE.to_be_bytes().as_slice() {
            return Err(invalid(36, "missing 'acsp' signature"));
        }

        let num_tags = read_u32(&data, 128) as usize;
        let max_num_tags = (data.len() - 128 - 4) / 12;
        if num_tags > max_num_tags {
            return Err(invalid(128, "too many tags"));
        }

        let mut p = Profile {
            preferred_cmm_type: read_u32(&data, 4),
            version: Version(read_u32(&data, 8)),
            class: ProfileClass(read_u32(&data, 12)),
            color_space: ColorSpace(read_u32(&data, 16)),
            pcs: ColorSpace(read_u32(&data, 20)),
            creation_date: DateTimeNumber::read(&data, 24),
            primary_platform: read_u32(&data, 40),
            flags: read_u32(&data, 44),
            device_manufacturer: read_u32(&data, 48),
            device_model: read_u32(&data, 52),
            device_attributes: read_u64(&data, 56),
            rendering_intent: RenderingIntent(read_u32(&data, 64)),
            creator: read_u32(&data, 80),
            ..Profile::default()
        };

        if data[84..100].iter().any(|&b| b != 0) {
            let mut given_hash = [0u8; 16];
            given_hash.copy_from_slice(&data[84..100]);

            // The profile ID is the MD5 of the whole profile with the
            // flags field, rendering intent field and profile ID field
            // temporarily set to zero.
            write_u32(&mut data, 44, 0);
            write_u32(&mut data, 64, 0);
            data[84..100].fill(0);

            let computed: [u8; 16] = Md5::digest(&data).into();
            p.checksum = if computed == given_hash {
                CheckSum::Valid
            } else {
                CheckSum::Invalid
            };
        }

        let min_tag_offset = (128 + 4 + num_tags * 12) as u64;
        for i in 0..num_tags {
            let entry = 128 + 4 + i * 12;
            let signature = TagSignature(read_u32(&data, entry));
            let tag_offset = read_u32(&data, entry + 4) as u64;
            let tag_size = read_u32(&data, entry + 8);
            if tag_size < 4 {
                return Err(invalid(entry + 8, "tag is too small"));
            } else if tag_size > 0xFFFF_FFFC {
                return Err(invalid(entry + 8, "tag is too large"));
            }

            let start = tag_offset;
            let end = start + tag_size as u64;
            if start < min_tag_offset || end > data.len() as u64 {
                return Err(invalid(entry, "tag is out of bounds"));
            }
            p.tag_data
                .insert(signature, data[start as usize..end as usize].to_vec());
        }

        if p.version == Version(0) {
            p.version = Version::CURRENT;
        }

        Ok(p)
    }

    /// Convert the profile to binary ICC format.
    ///
    /// The version field must be set to a valid ICC version (e.g.
    /// [`Version::V4_4_0`]). For version 4.0 and later, a Profile ID
    /// checksum is computed and embedded.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.version == Version(0) {
            return Err(Error::InvalidVersion);
        }

        // arrange tags by byte content and merge duplicates: identical
        // bodies share a single offset in the emitted tag table
        struct TagInfo<'a> {
            signature: TagSignature,
            data: &'a [u8],
            start: u32,
            duplicate: bool,
        }

        let mut tags: Vec<TagInfo> = self
            .tag_data
            .iter()
            .map(|(&signature, data)| TagInfo {
                signature,
                data,
                start: 0,
                duplicate: false,
            })
            .collect();
        tags.sort_by(|a, b| a.data.cmp(b.data).then(a.signature.cmp(&b.signature)));

        let mut pos = 128 + 4 + tags.len() * 12;
        for i in 0..tags.len() {
            if i > 0 && tags[i].data == tags[i - 1].data {
                tags[i].start = tags[i - 1].start;
                tags[i].duplicate = true;
            } else {
                tags[i].start = pos as u32;
                pos += (tags[i].data.len() + 3) & !3;
            }
        }

        let mut buf = vec![0u8; pos];
        write_u32(&mut buf, 0, pos as u32);
        write_u32(&mut buf, 4, self.preferred_cmm_type);
        write_u32(&mut buf, 8, self.version.0);
        write_u32(&mut buf, 12, self.class.0);
        write_u32(&mut buf, 16, self.color_space.0);
        write_u32(&mut buf, 20, self.pcs.0);
        self.creation_date.write(&mut buf, 24);
        write_u32(&mut buf, 36, PROFILE_SIGNATURE);
        write_u32(&mut buf, 40, self.primary_platform);
        write_u32(&mut buf, 48, self.device_manufacturer);
        write_u32(&mut buf, 52, self.device_model);
        write_u64(&mut buf, 56, self.device_attributes);
        // PCS illuminant: always the D50 white point
        write_s15_fixed16(&mut buf, 68, D50_WHITE_POINT[0]);
        write_s15_fixed16(&mut buf, 72, D50_WHITE_POINT[1]);
        write_s15_fixed16(&mut buf, 76, D50_WHITE_POINT[2]);
        write_u32(&mut buf, 80, self.creator);

        write_u32(&mut buf, 128, tags.len() as u32);
        let tag_table = 128 + 4;
        for (i, tag) in tags.iter().enumerate() {
            write_u32(&mut buf, tag_table + i * 12, tag.signature.0);
            write_u32(&mut buf, tag_table + i * 12 + 4, tag.start);
            write_u32(&mut buf, tag_table + i * 12 + 8, tag.data.len() as u32);
            if !tag.duplicate {
                let start = tag.start as usize;
                buf[start..start + tag.data.len()].copy_from_slice(tag.data);
            }
        }

        if self.version >= Version::V4_0_0 {
            // the flags, rendering intent and ID fields are still zero here;
            // the hash must be taken before their real values are stored
            let digest: [u8; 16] = Md5::digest(&buf).into();
            buf[84..100].copy_from_slice(&digest);
        }

        write_u32(&mut buf, 44, self.flags);
        write_u32(&mut buf, 64, self.rendering_intent.0);

        Ok(buf)
    }

    /// The name of the PCS colour space.
    pub fn pcs_name(&self) -> String {
        match self.pcs {
            ColorSpace::PCS_XYZ => "PCSXYZ".to_string(),
            ColorSpace::PCS_LAB => "PCSLab".to_string(),
            other => other.to_string(),
        }
    }

    /// The contents of the copyright (`cprt`) tag.
    ///
    /// Decodes a `mluc` element when present, falling back to the v2
    /// `text` element form.
    pub fn copyright(&self) -> Result<Vec<LocalizedText>> {
        let data = self
            .tag_data
            .get(&TagSignature::COPYRIGHT)
            .ok_or(Error::MissingTag)?;

        match decode_mluc(data) {
            Err(Error::UnexpectedTagType) => {}
            other => return other,
        }

        let value = decode_text(data)?;
        Ok(vec![LocalizedText {
            language: "en".to_string(),
            country: "US".to_string(),
            value,
        }])
    }
}
