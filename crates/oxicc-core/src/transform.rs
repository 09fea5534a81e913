//! Colour transform evaluation
//!
//! A [`Transform`] evaluates the colour mapping described by a profile in
//! one direction. It supports matrix/TRC profiles (common for displays),
//! grayscale profiles, and LUT-based profiles (common for printers).
//!
//! A `Transform` owns all derived state (decoded curves, LUT, matrices) and
//! is not safe for concurrent use; create one transform per thread.

use crate::color::lab::{denormalize_lab, lab_to_xyz, normalize_lab, xyz_to_lab};
use crate::color::D50_WHITE_POINT;
use crate::error::{Error, Result};
use crate::icc::header::{ColorSpace, RenderingIntent};
use crate::icc::profile::Profile;
use crate::icc::tags::curves::Curve;
use crate::icc::tags::lut::Lut;
use crate::icc::tags::xyz::decode_xyz;
use crate::icc::types::TagSignature;
use crate::math::Matrix3x3;

/// Direction of a colour transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Convert from device colour space to Profile Connection Space.
    DeviceToPcs,
    /// Convert from Profile Connection Space to device colour space.
    PcsToDevice,
}

/// The shape of the colour math a profile carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    /// Primaries as matrix columns plus per-channel TRCs
    MatrixTrc,
    /// A single gray TRC
    GrayTrc,
    /// AToB / BToA lookup tables
    Lut,
    /// No recognisable transform shape
    Unknown,
}

/// Detect the kind of transform a profile describes.
///
/// LUT tags take precedence over matrix/TRC tags, which take precedence
/// over a gray TRC.
pub fn detect_profile_kind(profile: &Profile) -> ProfileKind {
    const LUT_TAGS: [TagSignature; 6] = [
        TagSignature::A_TO_B0,
        TagSignature::A_TO_B1,
        TagSignature::A_TO_B2,
        TagSignature::B_TO_A0,
        TagSignature::B_TO_A1,
        TagSignature::B_TO_A2,
    ];
    if LUT_TAGS.iter().any(|t| profile.tag_data.contains_key(t)) {
        return ProfileKind::Lut;
    }

    const MATRIX_TRC_TAGS: [TagSignature; 6] = [
        TagSignature::RED_MATRIX_COLUMN,
        TagSignature::GREEN_MATRIX_COLUMN,
        TagSignature::BLUE_MATRIX_COLUMN,
        TagSignature::RED_TRC,
        TagSignature::GREEN_TRC,
        TagSignature::BLUE_TRC,
    ];
    if MATRIX_TRC_TAGS
        .iter()
        .all(|t| profile.tag_data.contains_key(t))
    {
        return ProfileKind::MatrixTrc;
    }

    if profile.tag_data.contains_key(&TagSignature::GRAY_TRC) {
        return ProfileKind::GrayTrc;
    }

    ProfileKind::Unknown
}

/// A colour transform built from an ICC profile
pub struct Transform {
    direction: Direction,
    kind: ProfileKind,
    pcs: ColorSpace,

    // matrix/TRC profiles
    matrix: Matrix3x3,
    matrix_inv: Option<Matrix3x3>,
    trc: Option<[Curve; 3]>,

    // gray TRC profiles
    gray_trc: Option<Curve>,

    // LUT-based profiles
    lut: Option<Lut>,

    /// XYZ of the media white point
    white_point: [f64; 3],
}

impl Transform {
    /// Create a colour transform from an ICC profile.
    ///
    /// `direction` selects device-to-PCS or PCS-to-device evaluation;
    /// `intent` selects among the AToBn/BToAn LUTs of a LUT-based profile.
    pub fn new(profile: &Profile, direction: Direction, intent: RenderingIntent) -> Result<Self> {
        let kind = detect_profile_kind(profile);

        let mut t = Transform {
            direction,
            kind,
            pcs: profile.pcs,
            matrix: Matrix3x3::identity(),
            matrix_inv: None,
            trc: None,
            gray_trc: None,
            lut: None,
            white_point: D50_WHITE_POINT,
        };

        match kind {
            ProfileKind::MatrixTrc => t.init_matrix_trc(profile)?,
            ProfileKind::GrayTrc => t.init_gray_trc(profile)?,
            ProfileKind::Lut => t.init_lut(profile, intent)?,
            ProfileKind::Unknown => return Err(Error::UnsupportedProfileType),
        }

        if let Some(data) = profile.tag_data.get(&TagSignature::MEDIA_WHITE_POINT) {
            if let Ok(xyz) = decode_xyz(data) {
                t.white_point = xyz;
            }
        }

        Ok(t)
    }

    /// The detected kind of the underlying profile.
    pub fn profile_kind(&self) -> ProfileKind {
        self.kind
    }

    fn init_matrix_trc(&mut self, profile: &Profile) -> Result<()> {
        let r_xyz = decode_xyz(&profile.tag_data[&TagSignature::RED_MATRIX_COLUMN])?;
        let g_xyz = decode_xyz(&profile.tag_data[&TagSignature::GREEN_MATRIX_COLUMN])?;
        let b_xyz = decode_xyz(&profile.tag_data[&TagSignature::BLUE_MATRIX_COLUMN])?;

        // the matrix columns are the primaries' XYZ coordinates
        self.matrix = Matrix3x3::from_columns(r_xyz, g_xyz, b_xyz);

        if self.direction == Direction::PcsToDevice {
            self.matrix_inv = Some(self.matrix.inverse().ok_or(Error::SingularMatrix)?);
        }

        let r_trc = Curve::decode(&profile.tag_data[&TagSignature::RED_TRC])?;
        let g_trc = Curve::decode(&profile.tag_data[&TagSignature::GREEN_TRC])?;
        let b_trc = Curve::decode(&profile.tag_data[&TagSignature::BLUE_TRC])?;
        self.trc = Some([r_trc, g_trc, b_trc]);

        Ok(())
    }

    fn init_gray_trc(&mut self, profile: &Profile) -> Result<()> {
        self.gray_trc = Some(Curve::decode(&profile.tag_data[&TagSignature::GRAY_TRC])?);
        Ok(())
    }

    fn init_lut(&mut self, profile: &Profile, intent: RenderingIntent) -> Result<()> {
        // select the LUT tag for the direction and intent, falling back to
        // the perceptual table when the specific intent is absent
        let (preferred, fallback) = match self.direction {
            Direction::DeviceToPcs => (
                match intent {
                    RenderingIntent::RELATIVE_COLORIMETRIC
                    | RenderingIntent::ABSOLUTE_COLORIMETRIC => TagSignature::A_TO_B1,
                    RenderingIntent::SATURATION => TagSignature::A_TO_B2,
                    _ => TagSignature::A_TO_B0,
                },
                TagSignature::A_TO_B0,
            ),
            Direction::PcsToDevice => (
                match intent {
                    RenderingIntent::RELATIVE_COLORIMETRIC
                    | RenderingIntent::ABSOLUTE_COLORIMETRIC => TagSignature::B_TO_A1,
                    RenderingIntent::SATURATION => TagSignature::B_TO_A2,
                    _ => TagSignature::B_TO_A0,
                },
                TagSignature::B_TO_A0,
            ),
        };

        let data = profile
            .tag_data
            .get(&preferred)
            .or_else(|| profile.tag_data.get(&fallback))
            .ok_or(Error::MissingLutTag)?;

        self.lut = Some(Lut::decode(data)?);
        Ok(())
    }

    /// Transform a colour.
    ///
    /// Input and output are normalised [0, 1] value slices. For
    /// [`Direction::DeviceToPcs`] the input is a device colour and the
    /// output is the PCS value; for [`Direction::PcsToDevice`] the
    /// reverse.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        match self.kind {
            ProfileKind::MatrixTrc => self.apply_matrix_trc(input),
            ProfileKind::GrayTrc => self.apply_gray_trc(input),
            ProfileKind::Lut => match &self.lut {
                Some(lut) => lut.apply(input),
                None => input.to_vec(),
            },
            ProfileKind::Unknown => input.to_vec(),
        }
    }

    fn apply_matrix_trc(&self, input: &[f64]) -> Vec<f64> {
        if input.len() != 3 {
            return vec![0.0; 3];
        }
        let Some(trc) = &self.trc else {
            return vec![0.0; 3];
        };

        match self.direction {
            Direction::DeviceToPcs => {
                // linearise, then project to XYZ
                let r = trc[0].evaluate(input[0]);
                let g = trc[1].evaluate(input[1]);
                let b = trc[2].evaluate(input[2]);
                self.matrix.multiply_vec([r, g, b]).to_vec()
            }
            Direction::PcsToDevice => {
                // materialised at init for this direction
                let Some(inv) = &self.matrix_inv else {
                    return vec![0.0; 3];
                };
                let [r, g, b] = inv.multiply_vec([input[0], input[1], input[2]]);

                let r = trc[0].invert(r.clamp(0.0, 1.0));
                let g = trc[1].invert(g.clamp(0.0, 1.0));
                let b = trc[2].invert(b.clamp(0.0, 1.0));
                vec![r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0)]
            }
        }
    }

    fn apply_gray_trc(&self, input: &[f64]) -> Vec<f64> {
        let Some(curve) = &self.gray_trc else {
            return vec![0.0];
        };

        match self.direction {
            Direction::DeviceToPcs => {
                if input.len() != 1 {
                    return vec![0.0; 3];
                }
                // gray maps onto the white point axis
                let y = curve.evaluate(input[0]);
                vec![
                    self.white_point[0] * y,
                    self.white_point[1] * y,
                    self.white_point[2] * y,
                ]
            }
            Direction::PcsToDevice => {
                if input.is_empty() {
                    return vec![0.0];
                }
                // take the Y component of an XYZ triple
                let mut y = if input.len() >= 2 { input[1] } else { input[0] };
                if self.white_point[1] != 0.0 {
                    y /= self.white_point[1];
                }
                vec![curve.invert(y.clamp(0.0, 1.0))]
            }
        }
    }

    /// Convert a device colour to PCS XYZ (D50).
    ///
    /// Returns zero for transforms built with [`Direction::PcsToDevice`].
    pub fn to_xyz(&self, device: &[f64]) -> [f64; 3] {
        if self.direction != Direction::DeviceToPcs {
            return [0.0; 3];
        }

        let mut result = self.apply(device);

        if self.pcs == ColorSpace::PCS_LAB {
            // LUT pipelines read and write [0,1]; widen to Lab ranges first
            if self.kind == ProfileKind::Lut && result.len() >= 3 {
                result = denormalize_lab(&result);
            }
            return lab_to_xyz(&result, self.white_point);
        }

        if result.len() >= 3 {
            [result[0], result[1], result[2]]
        } else {
            [0.0; 3]
        }
    }

    /// Convert PCS XYZ (D50) to a device colour.
    ///
    /// Returns an empty vector for transforms built with
    /// [`Direction::DeviceToPcs`].
    pub fn from_xyz(&self, x: f64, y: f64, z: f64) -> Vec<f64> {
        if self.direction != Direction::PcsToDevice {
            return Vec::new();
        }

        let input = if self.pcs == ColorSpace::PCS_LAB {
            let lab = xyz_to_lab(x, y, z, self.white_point);
            if self.kind == ProfileKind::Lut {
                normalize_lab(&lab)
            } else {
                lab.to_vec()
            }
        } else {
            vec![x, y, z]
        };

        self.apply(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::header::{CheckSum, ProfileClass, Version};
    use crate::icc::tags::lut::{LutAToB, LutClut};
    use crate::icc::tags::xyz::encode_xyz;

    // sRGB primaries in XYZ (D50), Bradford-adapted from IEC 61966-2-1
    const RED_D50: [f64; 3] = [0.4361, 0.2225, 0.0139];
    const GREEN_D50: [f64; 3] = [0.3851, 0.7169, 0.0971];
    const BLUE_D50: [f64; 3] = [0.1431, 0.0606, 0.7141];

    fn srgb_trc() -> Curve {
        Curve::parametric(
            3,
            vec![2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045],
        )
    }

    /// An sRGB-like matrix/TRC display profile built through the encoder.
    fn srgb_profile() -> Profile {
        let mut p = Profile {
            version: Version::V4_4_0,
            class: ProfileClass::DISPLAY_DEVICE,
            color_space: ColorSpace::RGB,
            pcs: ColorSpace::PCS_XYZ,
            ..Profile::default()
        };

        p.tag_data
            .insert(TagSignature::RED_MATRIX_COLUMN, encode_xyz(RED_D50));
        p.tag_data
            .insert(TagSignature::GREEN_MATRIX_COLUMN, encode_xyz(GREEN_D50));
        p.tag_data
            .insert(TagSignature::BLUE_MATRIX_COLUMN, encode_xyz(BLUE_D50));
        let trc = srgb_trc().encode();
        p.tag_data.insert(TagSignature::RED_TRC, trc.clone());
        p.tag_data.insert(TagSignature::GREEN_TRC, trc.clone());
        p.tag_data.insert(TagSignature::BLUE_TRC, trc);
        p.tag_data
            .insert(TagSignature::MEDIA_WHITE_POINT, encode_xyz(D50_WHITE_POINT));

        // run the profile through the container codec so the transform
        // sees decoded bytes, not hand-built ones
        let mut q = Profile::decode(p.encode().unwrap()).unwrap();
        q.checksum = CheckSum::Missing;
        assert_eq!(p, q);
        q
    }

    #[test]
    fn srgb_primaries_map_to_d50_pcs() {
        let p = srgb_profile();
        let t = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).unwrap();
        assert_eq!(t.profile_kind(), ProfileKind::MatrixTrc);

        let cases = [
            ([1.0, 0.0, 0.0], RED_D50),
            ([0.0, 1.0, 0.0], GREEN_D50),
            ([0.0, 0.0, 1.0], BLUE_D50),
        ];
        for (input, want) in cases {
            let xyz = t.to_xyz(&input);
            for i in 0..3 {
                assert!(
                    (xyz[i] - want[i]).abs() < 0.005,
                    "{:?} -> {:?}, want {:?}",
                    input,
                    xyz,
                    want
                );
            }
        }

        // white lands on the D50 white point
        let white = t.to_xyz(&[1.0, 1.0, 1.0]);
        for i in 0..3 {
            assert!((white[i] - D50_WHITE_POINT[i]).abs() < 0.02);
        }

        // black stays black
        let black = t.to_xyz(&[0.0, 0.0, 0.0]);
        for v in black {
            assert!(v.abs() < 0.01);
        }

        // red is darker than green
        let red_y = t.to_xyz(&[1.0, 0.0, 0.0])[1];
        let green_y = t.to_xyz(&[0.0, 1.0, 0.0])[1];
        assert!(red_y < green_y);
    }

    #[test]
    fn srgb_device_round_trip() {
        let p = srgb_profile();
        let fwd = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).unwrap();
        let inv = Transform::new(&p, Direction::PcsToDevice, RenderingIntent::PERCEPTUAL).unwrap();

        let inputs: [[f64; 3]; 7] = [
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.5, 0.5, 0.5],
            [0.2, 0.4, 0.8],
        ];
        for rgb in inputs {
            let [x, y, z] = fwd.to_xyz(&rgb);
            let back = inv.from_xyz(x, y, z);
            for i in 0..3 {
                assert!(
                    (back[i] - rgb[i]).abs() < 0.02,
                    "round trip {:?} -> ({}, {}, {}) -> {:?}",
                    rgb,
                    x,
                    y,
                    z,
                    back
                );
            }
        }
    }

    #[test]
    fn direction_mismatch_yields_empty_results() {
        let p = srgb_profile();
        let fwd = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).unwrap();
        let inv = Transform::new(&p, Direction::PcsToDevice, RenderingIntent::PERCEPTUAL).unwrap();

        assert_eq!(fwd.from_xyz(0.5, 0.5, 0.5), Vec::<f64>::new());
        assert_eq!(inv.to_xyz(&[0.5, 0.5, 0.5]), [0.0; 3]);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut p = srgb_profile();
        // make the green column equal to the red column
        let red = p.tag_data[&TagSignature::RED_MATRIX_COLUMN].clone();
        p.tag_data.insert(TagSignature::GREEN_MATRIX_COLUMN, red);

        // forward direction never inverts, so it still works
        assert!(Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).is_ok());
        assert_eq!(
            Transform::new(&p, Direction::PcsToDevice, RenderingIntent::PERCEPTUAL).err(),
            Some(Error::SingularMatrix)
        );
    }

    fn gray_profile() -> Profile {
        let mut p = Profile {
            version: Version::V4_4_0,
            class: ProfileClass::DISPLAY_DEVICE,
            color_space: ColorSpace::GRAY,
            pcs: ColorSpace::PCS_XYZ,
            ..Profile::default()
        };
        p.tag_data
            .insert(TagSignature::GRAY_TRC, Curve::gamma(2.25).encode());
        p
    }

    #[test]
    fn gray_trc_scales_the_white_point() {
        let p = gray_profile();
        let t = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).unwrap();
        assert_eq!(t.profile_kind(), ProfileKind::GrayTrc);

        let xyz = t.to_xyz(&[1.0]);
        for i in 0..3 {
            assert!((xyz[i] - D50_WHITE_POINT[i]).abs() < 1e-6);
        }

        let y = 0.5f64.powf(2.25);
        let mid = t.to_xyz(&[0.5]);
        assert!((mid[1] - y).abs() < 1e-6);
        assert!((mid[0] - D50_WHITE_POINT[0] * y).abs() < 1e-6);
    }

    #[test]
    fn gray_trc_round_trip() {
        let p = gray_profile();
        let fwd = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).unwrap();
        let inv = Transform::new(&p, Direction::PcsToDevice, RenderingIntent::PERCEPTUAL).unwrap();

        for g in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let [x, y, z] = fwd.to_xyz(&[g]);
            let back = inv.from_xyz(x, y, z);
            assert_eq!(back.len(), 1);
            assert!((back[0] - g).abs() < 1e-6, "gray {} -> {:?}", g, back);
        }
    }

    fn identity_clut_3d(grid: usize) -> Vec<f64> {
        let mut clut = vec![0.0; grid * grid * grid * 3];
        for r in 0..grid {
            for g in 0..grid {
                for b in 0..grid {
                    let idx = ((r * grid + g) * grid + b) * 3;
                    clut[idx] = r as f64 / (grid - 1) as f64;
                    clut[idx + 1] = g as f64 / (grid - 1) as f64;
                    clut[idx + 2] = b as f64 / (grid - 1) as f64;
                }
            }
        }
        clut
    }

    fn lut_profile(pcs: ColorSpace) -> Profile {
        let mut p = Profile {
            version: Version::V4_4_0,
            class: ProfileClass::OUTPUT_DEVICE,
            color_space: ColorSpace::RGB,
            pcs,
            ..Profile::default()
        };
        let lut = LutAToB {
            clut: Some(LutClut {
                grid_points: vec![2, 2, 2],
                precision: 2,
                data: identity_clut_3d(2),
            }),
            ..LutAToB::new(3, 3)
        };
        p.tag_data
            .insert(TagSignature::A_TO_B0, Lut::AToB(lut).encode());
        p
    }

    #[test]
    fn lut_profile_applies_the_table() {
        let p = lut_profile(ColorSpace::PCS_XYZ);
        let t = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).unwrap();
        assert_eq!(t.profile_kind(), ProfileKind::Lut);

        let xyz = t.to_xyz(&[0.25, 0.75, 0.5]);
        assert!((xyz[0] - 0.25).abs() < 0.01);
        assert!((xyz[1] - 0.75).abs() < 0.01);
        assert!((xyz[2] - 0.5).abs() < 0.01);
    }

    #[test]
    fn lut_intent_falls_back_to_perceptual_table() {
        let p = lut_profile(ColorSpace::PCS_XYZ);
        // only A2B0 exists; asking for saturation must fall back
        let t = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::SATURATION).unwrap();
        let xyz = t.to_xyz(&[0.5, 0.5, 0.5]);
        assert!((xyz[1] - 0.5).abs() < 0.01);
    }

    #[test]
    fn lut_missing_for_direction() {
        let p = lut_profile(ColorSpace::PCS_XYZ);
        // no BToA table at all
        assert_eq!(
            Transform::new(&p, Direction::PcsToDevice, RenderingIntent::PERCEPTUAL).err(),
            Some(Error::MissingLutTag)
        );
    }

    #[test]
    fn lab_pcs_lut_uses_the_lab_encoding() {
        let p = lut_profile(ColorSpace::PCS_LAB);
        let t = Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).unwrap();

        // the identity LUT emits (1, 0.5, 0.5), which denormalises to
        // Lab (100, ~0, ~0): close to the white point
        let xyz = t.to_xyz(&[1.0, 0.5, 0.5]);
        for i in 0..3 {
            assert!(
                (xyz[i] - D50_WHITE_POINT[i]).abs() < 0.02,
                "got {:?}",
                xyz
            );
        }
    }

    #[test]
    fn unsupported_profile_is_rejected() {
        let p = Profile {
            version: Version::V4_4_0,
            ..Profile::default()
        };
        assert_eq!(detect_profile_kind(&p), ProfileKind::Unknown);
        assert_eq!(
            Transform::new(&p, Direction::DeviceToPcs, RenderingIntent::PERCEPTUAL).err(),
            Some(Error::UnsupportedProfileType)
        );
    }

    #[test]
    fn lut_detection_takes_precedence() {
        let mut p = srgb_profile();
        p.tag_data.insert(
            TagSignature::A_TO_B0,
            Lut::AToB(LutAToB::new(3, 3)).encode(),
        );
        assert_eq!(detect_profile_kind(&p), ProfileKind::Lut);
    }
}
