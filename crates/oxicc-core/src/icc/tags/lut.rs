//! LUT elements (`mft1`, `mft2`, `mAB `, `mBA `)
//!
//! The four LUT kinds share one capability set: apply, encode, and the
//! channel counts. Processing orders differ per kind:
//!
//! - [`Lut8`] / [`Lut16`]: Matrix -> InputCurves -> CLUT -> OutputCurves
//! - [`LutAToB`]: ACurves -> CLUT -> MCurves -> Matrix -> BCurves
//! - [`LutBToA`]: BCurves -> Matrix -> MCurves -> CLUT -> ACurves
//!
//! CLUT data is kept as a flat sequence of floats in [0, 1], row-major with
//! the first input dimension varying slowest.

use crate::error::{Error, Result};
use crate::icc::tags::curves::Curve;
use crate::icc::types::{
    read_s15_fixed16, read_u16, read_u32, write_s15_fixed16, write_u16, write_u32, TypeSignature,
};
use crate::math::interpolation::{multilinear_interp, tetrahedral_interp_3d};
use crate::math::Matrix3x3;

// hard cap on grid-points product, rejects allocation amplification
const MAX_CLUT_SIZE: u64 = 1 << 30;

/// A colour lookup table from an ICC profile
#[derive(Debug, Clone, PartialEq)]
pub enum Lut {
    Lut8(Lut8),
    Lut16(Lut16),
    AToB(LutAToB),
    BToA(LutBToA),
}

impl Lut {
    /// Decode a LUT from tag data.
    ///
    /// This is used for the AToB0..2 and BToA0..2 tags. Supported element
    /// types: `mft1`, `mft2`, `mAB `, `mBA `.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::InvalidTagData);
        }

        match TypeSignature(read_u32(data, 0)) {
            TypeSignature::LUT8 => Lut8::decode(data).map(Lut::Lut8),
            TypeSignature::LUT16 => Lut16::decode(data).map(Lut::Lut16),
            TypeSignature::LUT_A_TO_B => LutAToB::decode(data).map(Lut::AToB),
            TypeSignature::LUT_B_TO_A => LutBToA::decode(data).map(Lut::BToA),
            _ => Err(Error::UnexpectedTagType),
        }
    }

    /// Transform input values, normalised to [0, 1], through the LUT.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        match self {
            Lut::Lut8(l) => l.apply(input),
            Lut::Lut16(l) => l.apply(input),
            Lut::AToB(l) => l.apply(input),
            Lut::BToA(l) => l.apply(input),
        }
    }

    /// Convert the LUT to tag data in its native format.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Lut::Lut8(l) => l.encode(),
            Lut::Lut16(l) => l.encode(),
            Lut::AToB(l) => l.encode(),
            Lut::BToA(l) => l.encode(),
        }
    }

    /// Number of input channels.
    pub fn input_channels(&self) -> usize {
        match self {
            Lut::Lut8(l) => l.input_channels,
            Lut::Lut16(l) => l.input_channels,
            Lut::AToB(l) => l.input_channels,
            Lut::BToA(l) => l.input_channels,
        }
    }

    /// Number of output channels.
    pub fn output_channels(&self) -> usize {
        match self {
            Lut::Lut8(l) => l.output_channels,
            Lut::Lut16(l) => l.output_channels,
            Lut::AToB(l) => l.output_channels,
            Lut::BToA(l) => l.output_channels,
        }
    }
}

/// The 3x4 matrix of `mAB `/`mBA ` elements: a 3x3 linear block followed
/// by a 3-element offset column
#[derive(Debug, Clone, PartialEq)]
pub struct LutMatrix {
    pub m: Matrix3x3,
    pub offset: [f64; 3],
}

impl LutMatrix {
    fn is_identity(&self) -> bool {
        self.m.is_identity(1e-6) && self.offset.iter().all(|o| o.abs() <= 1e-6)
    }

    fn apply(&self, values: &mut Vec<f64>) {
        if values.len() != 3 {
            return;
        }
        let v = self.m.multiply_vec([values[0], values[1], values[2]]);
        values[0] = v[0] + self.offset[0];
        values[1] = v[1] + self.offset[1];
        values[2] = v[2] + self.offset[2];
    }
}

/// The CLUT block of an `mAB `/`mBA ` element
///
/// Grid sizes may differ per dimension; `data` holds ∏(grid_points) x
/// output_channels samples normalised to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct LutClut {
    pub grid_points: Vec<usize>,
    /// 1 for 8-bit samples on the wire, 2 for 16-bit
    pub precision: u8,
    pub data: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Lut8 - lut8Type (mft1)
// ---------------------------------------------------------------------------

/// An 8-bit LUT (lut8Type, `mft1`)
#[derive(Debug, Clone, PartialEq)]
pub struct Lut8 {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Grid size, the same for all dimensions
    pub grid_points: usize,
    /// None means identity
    pub matrix: Option<Matrix3x3>,
    /// One per input channel
    pub input_curves: Vec<Curve>,
    /// Flattened n-dimensional table, normalised [0, 1]; empty means absent
    pub clut: Vec<f64>,
    /// One per output channel
    pub output_curves: Vec<Curve>,
}

impl Lut8 {
    /// Transform input values through the LUT.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        if input.len() != self.input_channels {
            return vec![0.0; self.output_channels];
        }

        let mut values = input.to_vec();
        apply_matrix3x3(&self.matrix, &mut values);
        apply_curves(&self.input_curves, &mut values);
        values = apply_uniform_clut(
            &self.clut,
            self.grid_points,
            self.input_channels,
            self.output_channels,
            values,
        );
        apply_curves(&self.output_curves, &mut values);

        for v in &mut values {
            *v = v.clamp(0.0, 1.0);
        }
        values
    }

    /// Convert to lut8Type (mft1) bytes.
    ///
    /// Each channel curve is sampled into a 256-entry 8-bit table, so
    /// analytic curves are quantised on encode.
    pub fn encode(&self) -> Vec<u8> {
        let input_table_size = 256 * self.input_channels;
        let clut_size =
            compute_clut_size_uniform(self.grid_points, self.input_channels, self.output_channels);
        let output_table_size = 256 * self.output_channels;
        let total = 48 + input_table_size + clut_size + output_table_size;

        let mut buf = vec![0u8; total];
        buf[0..4].copy_from_slice(b"mft1");
        buf[8] = self.input_channels as u8;
        buf[9] = self.output_channels as u8;
        buf[10] = self.grid_points as u8;

        write_matrix3x3(&mut buf, 12, &self.matrix);

        // input tables: 256 8-bit entries per channel
        let mut offset = 48;
        for ch in 0..self.input_channels {
            let curve = self.input_curves.get(ch);
            for i in 0..256 {
                let mut val = i as f64 / 255.0;
                if let Some(c) = curve {
                    val = c.evaluate(val);
                }
                buf[offset + ch * 256 + i] = (val.clamp(0.0, 1.0) * 255.0) as u8;
            }
        }
        offset += input_table_size;

        for (i, &v) in self.clut.iter().take(clut_size).enumerate() {
            buf[offset + i] = (v.clamp(0.0, 1.0) * 255.0) as u8;
        }
        offset += clut_size;

        // output tables
        for ch in 0..self.output_channels {
            let curve = self.output_curves.get(ch);
            for i in 0..256 {
                let mut val = i as f64 / 255.0;
                if let Some(c) = curve {
                    val = c.evaluate(val);
                }
                buf[offset + ch * 256 + i] = (val.clamp(0.0, 1.0) * 255.0) as u8;
            }
        }

        buf
    }

    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 48 {
            return Err(Error::InvalidTagData);
        }

        let input_channels = data[8] as usize;
        let output_channels = data[9] as usize;
        let grid_points = data[10] as usize;

        if input_channels == 0 || output_channels == 0 || input_channels > 15 || output_channels > 15
        {
            return Err(Error::InvalidTagData);
        }

        let matrix = read_matrix3x3(data, 12);

        // input tables: 256 entries per channel
        let input_table_start = 48;
        let input_table_size = 256 * input_channels;
        if data.len() < input_table_start + input_table_size {
            return Err(Error::InvalidTagData);
        }

        let input_curves = (0..input_channels)
            .map(|ch| read_curve_from_bytes(&data[input_table_start + ch * 256..], 256))
            .collect();

        let clut_size = compute_clut_size_uniform(grid_points, input_channels, output_channels);
        if clut_size == 0 {
            return Err(Error::InvalidTagData);
        }

        let clut_start = input_table_start + input_table_size;
        if data.len() < clut_start + clut_size {
            return Err(Error::InvalidTagData);
        }
        let clut = data[clut_start..clut_start + clut_size]
            .iter()
            .map(|&b| b as f64 / 255.0)
            .collect();

        let output_table_start = clut_start + clut_size;
        let output_table_size = 256 * output_channels;
        if data.len() < output_table_start + output_table_size {
            return Err(Error::InvalidTagData);
        }

        let output_curves = (0..output_channels)
            .map(|ch| read_curve_from_bytes(&data[output_table_start + ch * 256..], 256))
            .collect();

        Ok(Self {
            input_channels,
            output_channels,
            grid_points,
            matrix,
            input_curves,
            clut,
            output_curves,
        })
    }
}

// ---------------------------------------------------------------------------
// Lut16 - lut16Type (mft2)
// ---------------------------------------------------------------------------

/// A 16-bit LUT (lut16Type, `mft2`)
#[derive(Debug, Clone, PartialEq)]
pub struct Lut16 {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Grid size, the same for all dimensions
    pub grid_points: usize,
    /// None means identity
    pub matrix: Option<Matrix3x3>,
    /// Entries per input curve; 0 encodes as the 256 default
    pub input_table_entries: usize,
    /// Entries per output curve; 0 encodes as the 256 default
    pub output_table_entries: usize,
    pub input_curves: Vec<Curve>,
    pub clut: Vec<f64>,
    pub output_curves: Vec<Curve>,
}

impl Lut16 {
    /// Transform input values through the LUT.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        if input.len() != self.input_channels {
            return vec![0.0; self.output_channels];
        }

        let mut values = input.to_vec();
        apply_matrix3x3(&self.matrix, &mut values);
        apply_curves(&self.input_curves, &mut values);
        values = apply_uniform_clut(
            &self.clut,
            self.grid_points,
            self.input_channels,
            self.output_channels,
            values,
        );
        apply_curves(&self.output_curves, &mut values);

        for v in &mut values {
            *v = v.clamp(0.0, 1.0);
        }
        values
    }

    /// Convert to lut16Type (mft2) bytes.
    pub fn encode(&self) -> Vec<u8> {
        let input_entries = if self.input_table_entries == 0 {
            256
        } else {
            self.input_table_entries
        };
        let output_entries = if self.output_table_entries == 0 {
            256
        } else {
            self.output_table_entries
        };

        let input_table_bytes = input_entries * self.input_channels * 2;
        let clut_size =
            compute_clut_size_uniform(self.grid_points, self.input_channels, self.output_channels);
        let output_table_bytes = output_entries * self.output_channels * 2;
        let total = 52 + input_table_bytes + clut_size * 2 + output_table_bytes;

        let mut buf = vec![0u8; total];
        buf[0..4].copy_from_slice(b"mft2");
        buf[8] = self.input_channels as u8;
        buf[9] = self.output_channels as u8;
        buf[10] = self.grid_points as u8;
        write_u16(&mut buf, 48, input_entries as u16);
        write_u16(&mut buf, 50, output_entries as u16);

        write_matrix3x3(&mut buf, 12, &self.matrix);

        // input tables (16-bit)
        let mut offset = 52;
        for ch in 0..self.input_channels {
            let curve = self.input_curves.get(ch);
            for i in 0..input_entries {
                let mut val = i as f64 / (input_entries - 1) as f64;
                if let Some(c) = curve {
                    val = c.evaluate(val);
                }
                write_u16(
                    &mut buf,
                    offset + (ch * input_entries + i) * 2,
                    (val.clamp(0.0, 1.0) * 65535.0) as u16,
                );
            }
        }
        offset += input_table_bytes;

        for (i, &v) in self.clut.iter().take(clut_size).enumerate() {
            write_u16(&mut buf, offset + i * 2, (v.clamp(0.0, 1.0) * 65535.0) as u16);
        }
        offset += clut_size * 2;

        // output tables (16-bit)
        for ch in 0..self.output_channels {
            let curve = self.output_curves.get(ch);
            for i in 0..output_entries {
                let mut val = i as f64 / (output_entries - 1) as f64;
                if let Some(c) = curve {
                    val = c.evaluate(val);
                }
                write_u16(
                    &mut buf,
                    offset + (ch * output_entries + i) * 2,
                    (val.clamp(0.0, 1.0) * 65535.0) as u16,
                );
            }
        }

        buf
    }

    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 52 {
            return Err(Error::InvalidTagData);
        }

        let input_channels = data[8] as usize;
        let output_channels = data[9] as usize;
        let grid_points = data[10] as usize;

        if input_channels == 0 || output_channels == 0 || input_channels > 15 || output_channels > 15
        {
            return Err(Error::InvalidTagData);
        }

        let matrix = read_matrix3x3(data, 12);

        let input_table_entries = read_u16(data, 48) as usize;
        let output_table_entries = read_u16(data, 50) as usize;

        let input_table_start = 52;
        let input_table_size = input_table_entries * input_channels * 2;
        if data.len() < input_table_start + input_table_size {
            return Err(Error::InvalidTagData);
        }

        let input_curves = (0..input_channels)
            .map(|ch| {
                let table = (0..input_table_entries)
                    .map(|i| read_u16(data, input_table_start + (ch * input_table_entries + i) * 2))
                    .collect();
                Curve::sampled(table)
            })
            .collect();

        let clut_size = compute_clut_size_uniform(grid_points, input_channels, output_channels);
        if clut_size == 0 {
            return Err(Error::InvalidTagData);
        }

        let clut_start = input_table_start + input_table_size;
        if data.len() < clut_start + clut_size * 2 {
            return Err(Error::InvalidTagData);
        }
        let clut = (0..clut_size)
            .map(|i| read_u16(data, clut_start + i * 2) as f64 / 65535.0)
            .collect();

        let output_table_start = clut_start + clut_size * 2;
        let output_table_bytes = output_table_entries * output_channels * 2;
        if data.len() < output_table_start + output_table_bytes {
            return Err(Error::InvalidTagData);
        }

        let output_curves = (0..output_channels)
            .map(|ch| {
                let table = (0..output_table_entries)
                    .map(|i| {
                        read_u16(data, output_table_start + (ch * output_table_entries + i) * 2)
                    })
                    .collect();
                Curve::sampled(table)
            })
            .collect();

        Ok(Self {
            input_channels,
            output_channels,
            grid_points,
            matrix,
            input_table_entries,
            output_table_entries,
            input_curves,
            clut,
            output_curves,
        })
    }
}

// ---------------------------------------------------------------------------
// LutAToB - lutAtoBType (mAB )
// ---------------------------------------------------------------------------

/// An A-to-B LUT (lutAtoBType, `mAB `)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LutAToB {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Input curves, one per input channel
    pub a_curves: Option<Vec<Curve>>,
    pub clut: Option<LutClut>,
    /// Curves between CLUT and matrix; always 3 channels
    pub m_curves: Option<Vec<Curve>>,
    /// None means identity with zero offset
    pub matrix: Option<LutMatrix>,
    /// Output curves, one per output channel
    pub b_curves: Option<Vec<Curve>>,
}

impl LutAToB {
    pub fn new(input_channels: usize, output_channels: usize) -> Self {
        Self {
            input_channels,
            output_channels,
            ..Self::default()
        }
    }

    /// Transform input values through the LUT.
    ///
    /// Processing order: ACurves -> CLUT -> MCurves -> Matrix -> BCurves.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        if input.len() != self.input_channels {
            return vec![0.0; self.output_channels];
        }

        let mut values = input.to_vec();
        if let Some(curves) = &self.a_curves {
            apply_curves(curves, &mut values);
        }
        values = apply_clut(&self.clut, self.output_channels, values);
        if let Some(curves) = &self.m_curves {
            apply_curves(curves, &mut values);
        }
        if let Some(matrix) = &self.matrix {
            matrix.apply(&mut values);
        }
        if let Some(curves) = &self.b_curves {
            apply_curves(curves, &mut values);
        }

        for v in &mut values {
            *v = v.clamp(0.0, 1.0);
        }
        values
    }

    /// Convert to lutAtoBType (mAB ) bytes.
    pub fn encode(&self) -> Vec<u8> {
        encode_lut_ab(
            self.input_channels,
            self.output_channels,
            self.a_curves.as_deref(),
            self.clut.as_ref(),
            self.m_curves.as_deref(),
            self.matrix.as_ref(),
            self.b_curves.as_deref(),
            false,
        )
    }

    fn decode(data: &[u8]) -> Result<Self> {
        let header = decode_lut_ab_header(data)?;

        let mut lut = Self::new(header.input_channels, header.output_channels);

        // B curves are the output side of mAB
        if header.b_curve_offset != 0 {
            lut.b_curves = Some(decode_curves_at_offset(
                data,
                header.b_curve_offset,
                header.output_channels,
            )?);
        }
        // A curves are the input side of mAB
        if header.a_curve_offset != 0 {
            lut.a_curves = Some(decode_curves_at_offset(
                data,
                header.a_curve_offset,
                header.input_channels,
            )?);
        }
        if header.matrix_offset != 0 {
            lut.matrix = decode_matrix3x4(data, header.matrix_offset)?;
        }
        if header.m_curve_offset != 0 {
            // M curves always operate on the matrix's 3 channels
            lut.m_curves = Some(decode_curves_at_offset(data, header.m_curve_offset, 3)?);
        }
        if header.clut_offset != 0 {
            lut.clut = Some(decode_clut(
                data,
                header.clut_offset,
                header.input_channels,
                header.output_channels,
            )?);
        }

        Ok(lut)
    }
}

// ---------------------------------------------------------------------------
// LutBToA - lutBtoAType (mBA )
// ---------------------------------------------------------------------------

/// A B-to-A LUT (lutBtoAType, `mBA `)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LutBToA {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Input curves, one per input channel
    pub b_curves: Option<Vec<Curve>>,
    /// None means identity with zero offset
    pub matrix: Option<LutMatrix>,
    /// Curves between matrix and CLUT; always 3 channels
    pub m_curves: Option<Vec<Curve>>,
    pub clut: Option<LutClut>,
    /// Output curves, one per output channel
    pub a_curves: Option<Vec<Curve>>,
}

impl LutBToA {
    pub fn new(input_channels: usize, output_channels: usize) -> Self {
        Self {
            input_channels,
            output_channels,
            ..Self::default()
        }
    }

    /// Transform input values through the LUT.
    ///
    /// Processing order: BCurves -> Matrix -> MCurves -> CLUT -> ACurves.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        if input.len() != self.input_channels {
            return vec![0.0; self.output_channels];
        }

        let mut values = input.to_vec();
        if let Some(curves) = &self.b_curves {
            apply_curves(curves, &mut values);
        }
        if let Some(matrix) = &self.matrix {
            matrix.apply(&mut values);
        }
        if let Some(curves) = &self.m_curves {
            apply_curves(curves, &mut values);
        }
        values = apply_clut(&self.clut, self.output_channels, values);
        if let Some(curves) = &self.a_curves {
            apply_curves(curves, &mut values);
        }

        for v in &mut values {
            *v = v.clamp(0.0, 1.0);
        }
        values
    }

    /// Convert to lutBtoAType (mBA ) bytes.
    pub fn encode(&self) -> Vec<u8> {
        encode_lut_ab(
            self.input_channels,
            self.output_channels,
            self.a_curves.as_deref(),
            self.clut.as_ref(),
            self.m_curves.as_deref(),
            self.matrix.as_ref(),
            self.b_curves.as_deref(),
            true,
        )
    }

    fn decode(data: &[u8]) -> Result<Self> {
        let header = decode_lut_ab_header(data)?;

        let mut lut = Self::new(header.input_channels, header.output_channels);

        // B curves are the input side of mBA
        if header.b_curve_offset != 0 {
            lut.b_curves = Some(decode_curves_at_offset(
                data,
                header.b_curve_offset,
                header.input_channels,
            )?);
        }
        // A curves are the output side of mBA
        if header.a_curve_offset != 0 {
            lut.a_curves = Some(decode_curves_at_offset(
                data,
                header.a_curve_offset,
                header.output_channels,
            )?);
        }
        if header.matrix_offset != 0 {
            lut.matrix = decode_matrix3x4(data, header.matrix_offset)?;
        }
        if header.m_curve_offset != 0 {
            lut.m_curves = Some(decode_curves_at_offset(data, header.m_curve_offset, 3)?);
        }
        if header.clut_offset != 0 {
            lut.clut = Some(decode_clut(
                data,
                header.clut_offset,
                header.input_channels,
                header.output_channels,
            )?);
        }

        Ok(lut)
    }
}

// ---------------------------------------------------------------------------
// shared helpers
// ---------------------------------------------------------------------------

struct LutAbHeader {
    input_channels: usize,
    output_channels: usize,
    b_curve_offset: usize,
    matrix_offset: usize,
    m_curve_offset: usize,
    clut_offset: usize,
    a_curve_offset: usize,
}

fn decode_lut_ab_header(data: &[u8]) -> Result<LutAbHeader> {
    if data.len() < 32 {
        return Err(Error::InvalidTagData);
    }

    let input_channels = data[8] as usize;
    let output_channels = data[9] as usize;

    if input_channels == 0 || output_channels == 0 || input_channels > 15 || output_channels > 15 {
        return Err(Error::InvalidTagData);
    }

    Ok(LutAbHeader {
        input_channels,
        output_channels,
        b_curve_offset: read_u32(data, 12) as usize,
        matrix_offset: read_u32(data, 16) as usize,
        m_curve_offset: read_u32(data, 20) as usize,
        clut_offset: read_u32(data, 24) as usize,
        a_curve_offset: read_u32(data, 28) as usize,
    })
}

/// Product of grid sizes times output channels, or 0 past the 2^30 cap.
fn compute_clut_size(grid_points: &[usize], output_channels: usize) -> usize {
    let mut size: u64 = 1;
    for &g in grid_points {
        size *= g as u64;
        if size > MAX_CLUT_SIZE {
            return 0;
        }
    }
    size *= output_channels as u64;
    if size > MAX_CLUT_SIZE {
        return 0;
    }
    size as usize
}

fn compute_clut_size_uniform(
    grid_points: usize,
    input_channels: usize,
    output_channels: usize,
) -> usize {
    let mut size: u64 = 1;
    for _ in 0..input_channels {
        size *= grid_points as u64;
        if size > MAX_CLUT_SIZE {
            return 0;
        }
    }
    size *= output_channels as u64;
    if size > MAX_CLUT_SIZE {
        return 0;
    }
    size as usize
}

fn apply_curves(curves: &[Curve], values: &mut [f64]) {
    for (i, curve) in curves.iter().enumerate() {
        if i < values.len() {
            values[i] = curve.evaluate(values[i]);
        }
    }
}

fn apply_matrix3x3(matrix: &Option<Matrix3x3>, values: &mut [f64]) {
    if let Some(m) = matrix {
        if values.len() == 3 {
            let v = m.multiply_vec([values[0], values[1], values[2]]);
            values.copy_from_slice(&v);
        }
    }
}

fn apply_uniform_clut(
    clut: &[f64],
    grid_points: usize,
    input_channels: usize,
    output_channels: usize,
    values: Vec<f64>,
) -> Vec<f64> {
    if clut.is_empty() || grid_points == 0 {
        return values;
    }
    if values.len() == 3 {
        return tetrahedral_interp_3d(
            clut,
            grid_points,
            output_channels,
            values[0],
            values[1],
            values[2],
        );
    }
    let dims = vec![grid_points; input_channels];
    multilinear_interp(clut, &dims, output_channels, &values)
}

fn apply_clut(clut: &Option<LutClut>, output_channels: usize, values: Vec<f64>) -> Vec<f64> {
    let Some(clut) = clut else {
        return values;
    };
    if clut.grid_points.len() != values.len() {
        return values;
    }
    if values.len() == 3
        && clut.grid_points[0] == clut.grid_points[1]
        && clut.grid_points[1] == clut.grid_points[2]
    {
        return tetrahedral_interp_3d(
            &clut.data,
            clut.grid_points[0],
            output_channels,
            values[0],
            values[1],
            values[2],
        );
    }
    multilinear_interp(&clut.data, &clut.grid_points, output_channels, &values)
}

fn read_matrix3x3(data: &[u8], offset: usize) -> Option<Matrix3x3> {
    let mut m = [[0.0f64; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            m[row][col] = read_s15_fixed16(data, offset + (row * 3 + col) * 4);
        }
    }
    let matrix = Matrix3x3::new(m);
    if matrix.is_identity(1e-6) {
        None
    } else {
        Some(matrix)
    }
}

fn write_matrix3x3(buf: &mut [u8], offset: usize, matrix: &Option<Matrix3x3>) {
    let m = matrix.unwrap_or_else(Matrix3x3::identity);
    for row in 0..3 {
        for col in 0..3 {
            write_s15_fixed16(buf, offset + (row * 3 + col) * 4, m.m[row][col]);
        }
    }
}

/// Load an 8-bit table as a sampled curve by byte-replicating each sample
/// (0x00 -> 0x0000, 0xFF -> 0xFFFF).
fn read_curve_from_bytes(data: &[u8], entries: usize) -> Curve {
    let table = data[..entries]
        .iter()
        .map(|&b| u16::from(b) << 8 | u16::from(b))
        .collect();
    Curve::sampled(table)
}

fn decode_curves_at_offset(data: &[u8], offset: usize, count: usize) -> Result<Vec<Curve>> {
    let mut curves = Vec::with_capacity(count);
    let mut pos = offset;
    for _ in 0..count {
        if pos + 8 > data.len() {
            return Err(Error::InvalidTagData);
        }

        let size = match TypeSignature(read_u32(data, pos)) {
            TypeSignature::CURVE => {
                if pos + 12 > data.len() {
                    return Err(Error::InvalidTagData);
                }
                let n = read_u32(data, pos + 8) as u64;
                12 + n * 2
            }
            TypeSignature::PARAMETRIC_CURVE => {
                if pos + 12 > data.len() {
                    return Err(Error::InvalidTagData);
                }
                let func_type = read_u16(data, pos + 8) as usize;
                let num_params = [1u64, 3, 4, 5, 7][func_type.min(4)];
                12 + num_params * 4
            }
            _ => return Err(Error::UnexpectedTagType),
        };

        // curves pack one after another with 4-byte alignment between them
        let size = (size + 3) & !3;
        let end = pos as u64 + size;
        if end > data.len() as u64 {
            return Err(Error::InvalidTagData);
        }

        curves.push(Curve::decode(&data[pos..end as usize])?);
        pos = end as usize;
    }
    Ok(curves)
}

fn decode_matrix3x4(data: &[u8], offset: usize) -> Result<Option<LutMatrix>> {
    if offset + 48 > data.len() {
        return Err(Error::InvalidTagData);
    }
    let mut m = [[0.0f64; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            m[row][col] = read_s15_fixed16(data, offset + (row * 3 + col) * 4);
        }
    }
    let mut off = [0.0f64; 3];
    for (i, o) in off.iter_mut().enumerate() {
        *o = read_s15_fixed16(data, offset + 36 + i * 4);
    }

    let matrix = LutMatrix {
        m: Matrix3x3::new(m),
        offset: off,
    };
    if matrix.is_identity() {
        Ok(None)
    } else {
        Ok(Some(matrix))
    }
}

fn decode_clut(
    data: &[u8],
    offset: usize,
    input_channels: usize,
    output_channels: usize,
) -> Result<LutClut> {
    if offset + 20 > data.len() {
        return Err(Error::InvalidTagData);
    }

    // 16 grid-size bytes, only the first input_channels used; a zero grid
    // size counts as 1 to avoid a degenerate product
    let grid_points: Vec<usize> = (0..input_channels)
        .map(|i| data[offset + i].max(1) as usize)
        .collect();

    let precision = data[offset + 16];

    let size = compute_clut_size(&grid_points, output_channels);
    if size == 0 {
        return Err(Error::InvalidTagData);
    }

    let start = offset + 20;
    let clut_data = match precision {
        1 => {
            if data.len() < start + size {
                return Err(Error::InvalidTagData);
            }
            data[start..start + size]
                .iter()
                .map(|&b| b as f64 / 255.0)
                .collect()
        }
        2 => {
            if data.len() < start + size * 2 {
                return Err(Error::InvalidTagData);
            }
            (0..size)
                .map(|i| read_u16(data, start + i * 2) as f64 / 65535.0)
                .collect()
        }
        _ => return Err(Error::InvalidTagData),
    };

    Ok(LutClut {
        grid_points,
        precision,
        data: clut_data,
    })
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn encode_curves(curves: Option<&[Curve]>, count: usize) -> Vec<u8> {
    let identity = Curve::identity();
    let mut buf = Vec::new();
    for i in 0..count {
        let curve = curves.and_then(|c| c.get(i)).unwrap_or(&identity);
        let mut data = curve.encode();
        while data.len() % 4 != 0 {
            data.push(0);
        }
        buf.extend_from_slice(&data);
    }
    buf
}

fn encode_clut_block(clut: &LutClut, output_channels: usize) -> Vec<u8> {
    let size = compute_clut_size(&clut.grid_points, output_channels);

    // default to 16-bit precision unless 8-bit was requested
    let precision = if clut.precision == 1 { 1 } else { 2 };

    let mut buf = vec![0u8; 20 + size * precision as usize];
    for (i, &g) in clut.grid_points.iter().take(16).enumerate() {
        buf[i] = g as u8;
    }
    buf[16] = precision;

    if precision == 1 {
        for (i, &v) in clut.data.iter().take(size).enumerate() {
            buf[20 + i] = (v.clamp(0.0, 1.0) * 255.0) as u8;
        }
    } else {
        for (i, &v) in clut.data.iter().take(size).enumerate() {
            write_u16(&mut buf, 20 + i * 2, (v.clamp(0.0, 1.0) * 65535.0) as u16);
        }
    }

    buf
}

#[allow(clippy::too_many_arguments)]
fn encode_lut_ab(
    input_channels: usize,
    output_channels: usize,
    a_curves: Option<&[Curve]>,
    clut: Option<&LutClut>,
    m_curves: Option<&[Curve]>,
    matrix: Option<&LutMatrix>,
    b_curves: Option<&[Curve]>,
    is_b_to_a: bool,
) -> Vec<u8> {
    let mut offset = 32usize;

    // curve counts depend on direction
    let (a_curve_count, b_curve_count) = if is_b_to_a {
        (output_channels, input_channels)
    } else {
        (input_channels, output_channels)
    };
    // M curves always operate on the matrix's 3 channels
    let m_curve_count = 3;

    let mut b_curve_offset = 0usize;
    let mut b_curve_data = Vec::new();
    if b_curves.is_some() {
        b_curve_offset = offset;
        b_curve_data = encode_curves(b_curves, b_curve_count);
        offset += b_curve_data.len();
    }

    let mut matrix_offset = 0usize;
    if matrix.is_some() {
        offset = align4(offset);
        matrix_offset = offset;
        offset += 48;
    }

    let mut m_curve_offset = 0usize;
    let mut m_curve_data = Vec::new();
    if m_curves.is_some() {
        offset = align4(offset);
        m_curve_offset = offset;
        m_curve_data = encode_curves(m_curves, m_curve_count);
        offset += m_curve_data.len();
    }

    let mut clut_offset = 0usize;
    let mut clut_data = Vec::new();
    if let Some(clut) = clut {
        if !clut.grid_points.is_empty() {
            offset = align4(offset);
            clut_offset = offset;
            clut_data = encode_clut_block(clut, output_channels);
            offset += clut_data.len();
        }
    }

    let mut a_curve_offset = 0usize;
    let mut a_curve_data = Vec::new();
    if a_curves.is_some() {
        offset = align4(offset);
        a_curve_offset = offset;
        a_curve_data = encode_curves(a_curves, a_curve_count);
        offset += a_curve_data.len();
    }

    let mut buf = vec![0u8; align4(offset)];
    buf[0..4].copy_from_slice(if is_b_to_a { b"mBA " } else { b"mAB " });
    buf[8] = input_channels as u8;
    buf[9] = output_channels as u8;
    write_u32(&mut buf, 12, b_curve_offset as u32);
    write_u32(&mut buf, 16, matrix_offset as u32);
    write_u32(&mut buf, 20, m_curve_offset as u32);
    write_u32(&mut buf, 24, clut_offset as u32);
    write_u32(&mut buf, 28, a_curve_offset as u32);

    if b_curve_offset != 0 {
        buf[b_curve_offset..b_curve_offset + b_curve_data.len()].copy_from_slice(&b_curve_data);
    }
    if let Some(matrix) = matrix {
        if matrix_offset != 0 {
            for row in 0..3 {
                for col in 0..3 {
                    write_s15_fixed16(
                        &mut buf,
                        matrix_offset + (row * 3 + col) * 4,
                        matrix.m.m[row][col],
                    );
                }
            }
            for i in 0..3 {
                write_s15_fixed16(&mut buf, matrix_offset + 36 + i * 4, matrix.offset[i]);
            }
        }
    }
    if m_curve_offset != 0 {
        buf[m_curve_offset..m_curve_offset + m_curve_data.len()].copy_from_slice(&m_curve_data);
    }
    if clut_offset != 0 {
        buf[clut_offset..clut_offset + clut_data.len()].copy_from_slice(&clut_data);
    }
    if a_curve_offset != 0 {
        buf[a_curve_offset..a_curve_offset + a_curve_data.len()].copy_from_slice(&a_curve_data);
    }

    buf
}
