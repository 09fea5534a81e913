//! Header field value types
//!
//! The ICC profile header is exactly 128 bytes. The types here give the raw
//! 32-bit header fields names, display strings and a little arithmetic; all
//! of them stay transparent wrappers so that unknown codes survive a
//! decode/encode round trip untouched.

use std::fmt;

/// Profile file signature at offset 36 - must be 'acsp'
pub const PROFILE_SIGNATURE: u32 = 0x6163_7370;

/// ICC profile format version
///
/// Packed as `(major << 24) | (minor << 20) | (bugfix << 16) | other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u32);

impl Version {
    pub const V2_1_0: Self = Self(0x0210_0000); // Version 3.3 (November 1996)
    pub const V2_2_0: Self = Self(0x0220_0000); // ICC.1:1998-09
    pub const V2_3_0: Self = Self(0x0230_0000); // ICC.1:1998-09 + ICC.1A:1999-04
    pub const V4_0_0: Self = Self(0x0400_0000); // ICC.1:2001-12
    pub const V4_1_0: Self = Self(0x0410_0000); // ICC.1:2003-09
    pub const V4_2_0: Self = Self(0x0420_0000); // ICC.1:2004-10
    pub const V4_3_0: Self = Self(0x0430_0000); // ICC.1:2010-12
    pub const V4_4_0: Self = Self(0x0440_0000); // ICC.1:2022-05

    /// The version written into profiles that were decoded without one.
    pub const CURRENT: Self = Self::V4_4_0;

    pub fn major(self) -> u32 {
        self.0 >> 24
    }

    pub fn minor(self) -> u32 {
        (self.0 >> 20) & 0xF
    }

    pub fn bugfix(self) -> u32 {
        (self.0 >> 16) & 0xF
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.bugfix())?;
        let other = self.0 & 0xFFFF;
        if other != 0 {
            write!(f, ".{:04X}", other)?;
        }
        Ok(())
    }
}

/// ICC profile or device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProfileClass(pub u32);

impl ProfileClass {
    pub const fn from_bytes(b: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(b))
    }

    pub const INPUT_DEVICE: Self = Self::from_bytes(*b"scnr");
    pub const DISPLAY_DEVICE: Self = Self::from_bytes(*b"mntr");
    pub const OUTPUT_DEVICE: Self = Self::from_bytes(*b"prtr");
    pub const COLOR_SPACE: Self = Self::from_bytes(*b"spac");
    pub const DEVICE_LINK: Self = Self::from_bytes(*b"link");
    pub const ABSTRACT: Self = Self::from_bytes(*b"abst");
    pub const NAMED_COLOR: Self = Self::from_bytes(*b"nmcl");
}

impl fmt::Display for ProfileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::INPUT_DEVICE => "Input Device Profile",
            Self::DISPLAY_DEVICE => "Display Device Profile",
            Self::OUTPUT_DEVICE => "Output Device Profile",
            Self::DEVICE_LINK => "DeviceLink Profile",
            Self::COLOR_SPACE => "ColorSpace Profile",
            Self::ABSTRACT => "Abstract Profile",
            Self::NAMED_COLOR => "Named Color Profile",
            _ => return write!(f, "ProfileClass(0x{:08X})", self.0),
        };
        f.write_str(name)
    }
}

/// Rendering intent: how colours outside the destination gamut are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderingIntent(pub u32);

impl RenderingIntent {
    /// Preserves visual relationships between colours.
    pub const PERCEPTUAL: Self = Self(0);
    /// Maps white point, preserves in-gamut colours.
    pub const RELATIVE_COLORIMETRIC: Self = Self(1);
    /// Preserves saturation, may shift hue.
    pub const SATURATION: Self = Self(2);
    /// Preserves exact colorimetric values.
    pub const ABSOLUTE_COLORIMETRIC: Self = Self(3);
}

impl fmt::Display for RenderingIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::PERCEPTUAL => "Perceptual",
            Self::RELATIVE_COLORIMETRIC => "Relative Colorimetric",
            Self::SATURATION => "Saturation",
            Self::ABSOLUTE_COLORIMETRIC => "Absolute Colorimetric",
            _ => return write!(f, "RenderingIntent({})", self.0),
        };
        f.write_str(name)
    }
}

/// Colour space signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorSpace(pub u32);

impl ColorSpace {
    pub const fn from_bytes(b: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(b))
    }

    pub const CIE_XYZ: Self = Self::from_bytes(*b"XYZ ");
    pub const CIE_LAB: Self = Self::from_bytes(*b"Lab ");
    pub const CIE_LUV: Self = Self::from_bytes(*b"Luv ");
    pub const YCBCR: Self = Self::from_bytes(*b"YCbr");
    pub const CIE_YXY: Self = Self::from_bytes(*b"Yxy ");
    pub const RGB: Self = Self::from_bytes(*b"RGB ");
    pub const GRAY: Self = Self::from_bytes(*b"GRAY");
    pub const HSV: Self = Self::from_bytes(*b"HSV ");
    pub const HLS: Self = Self::from_bytes(*b"HLS ");
    pub const CMYK: Self = Self::from_bytes(*b"CMYK");
    pub const CMY: Self = Self::from_bytes(*b"CMY ");
    pub const COLOR2: Self = Self::from_bytes(*b"2CLR");
    pub const COLOR3: Self = Self::from_bytes(*b"3CLR");
    pub const COLOR4: Self = Self::from_bytes(*b"4CLR");
    pub const COLOR5: Self = Self::from_bytes(*b"5CLR");
    pub const COLOR6: Self = Self::from_bytes(*b"6CLR");
    pub const COLOR7: Self = Self::from_bytes(*b"7CLR");
    pub const COLOR8: Self = Self::from_bytes(*b"8CLR");
    pub const COLOR9: Self = Self::from_bytes(*b"9CLR");
    pub const COLOR10: Self = Self::from_bytes(*b"ACLR");
    pub const COLOR11: Self = Self::from_bytes(*b"BCLR");
    pub const COLOR12: Self = Self::from_bytes(*b"CCLR");
    pub const COLOR13: Self = Self::from_bytes(*b"DCLR");
    pub const COLOR14: Self = Self::from_bytes(*b"ECLR");
    pub const COLOR15: Self = Self::from_bytes(*b"FCLR");

    /// PCS signature for CIEXYZ.
    pub const PCS_XYZ: Self = Self::CIE_XYZ;
    /// PCS signature for CIELAB.
    pub const PCS_LAB: Self = Self::CIE_LAB;

    /// Number of colour components, or 0 for unknown signatures.
    pub fn num_components(self) -> usize {
        match self {
            Self::GRAY => 1,
            Self::COLOR2 => 2,
            Self::CIE_XYZ
            | Self::CIE_LAB
            | Self::CIE_LUV
            | Self::YCBCR
            | Self::CIE_YXY
            | Self::RGB
            | Self::HSV
            | Self::HLS
            | Self::CMY
            | Self::COLOR3 => 3,
            Self::CMYK | Self::COLOR4 => 4,
            Self::COLOR5 => 5,
            Self::COLOR6 => 6,
            Self::COLOR7 => 7,
            Self::COLOR8 => 8,
            Self::COLOR9 => 9,
            Self::COLOR10 => 10,
            Self::COLOR11 => 11,
            Self::COLOR12 => 12,
            Self::COLOR13 => 13,
            Self::COLOR14 => 14,
            Self::COLOR15 => 15,
            _ => 0,
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::CIE_XYZ => "CIEXYZ",
            Self::CIE_LAB => "CIELAB",
            Self::CIE_LUV => "CIELUV",
            Self::YCBCR => "YCbCr",
            Self::CIE_YXY => "CIEYxy",
            Self::RGB => "RGB",
            Self::GRAY => "Gray",
            Self::HSV => "HSV",
            Self::HLS => "HLS",
            Self::CMYK => "CMYK",
            Self::CMY => "CMY",
            Self::COLOR2 => "2CLR",
            Self::COLOR3 => "3CLR",
            Self::COLOR4 => "4CLR",
            Self::COLOR5 => "5CLR",
            Self::COLOR6 => "6CLR",
            Self::COLOR7 => "7CLR",
            Self::COLOR8 => "8CLR",
            Self::COLOR9 => "9CLR",
            Self::COLOR10 => "10CLR",
            Self::COLOR11 => "11CLR",
            Self::COLOR12 => "12CLR",
            Self::COLOR13 => "13CLR",
            Self::COLOR14 => "14CLR",
            Self::COLOR15 => "15CLR",
            _ => return write!(f, "ColorSpace(0x{:08X})", self.0),
        };
        f.write_str(name)
    }
}

/// Status of the 16-byte Profile ID field read by `Profile::decode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckSum {
    /// The Profile ID field was all zero.
    #[default]
    Missing,
    /// The embedded MD5 matches the profile contents.
    Valid,
    /// The embedded MD5 does not match the profile contents.
    Invalid,
}

impl fmt::Display for CheckSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "Valid",
            Self::Invalid => "Invalid",
            Self::Missing => "Missing",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_display() {
        assert_eq!(Version::V4_3_0.to_string(), "4.3.0");
        assert_eq!(Version::V2_1_0.to_string(), "2.1.0");
        assert_eq!(Version(0x0430_00A5).to_string(), "4.3.0.00A5");
    }

    #[test]
    fn version_ordering() {
        assert!(Version::V4_0_0 > Version::V2_3_0);
        assert!(Version::V4_4_0 >= Version::V4_0_0);
        assert!(Version::V2_1_0 < Version::V4_0_0);
    }

    #[test]
    fn color_space_components() {
        assert_eq!(ColorSpace::GRAY.num_components(), 1);
        assert_eq!(ColorSpace::RGB.num_components(), 3);
        assert_eq!(ColorSpace::CMYK.num_components(), 4);
        assert_eq!(ColorSpace::COLOR15.num_components(), 15);
        assert_eq!(ColorSpace(0x12345678).num_components(), 0);
    }

    #[test]
    fn display_names() {
        assert_eq!(ProfileClass::DISPLAY_DEVICE.to_string(), "Display Device Profile");
        assert_eq!(RenderingIntent::PERCEPTUAL.to_string(), "Perceptual");
        assert_eq!(RenderingIntent(7).to_string(), "RenderingIntent(7)");
        assert_eq!(ColorSpace::CIE_LAB.to_string(), "CIELAB");
        assert_eq!(CheckSum::default().to_string(), "Missing");
    }
}
