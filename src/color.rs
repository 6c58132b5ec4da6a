use std::hash::{Hash, Hasher};

use palette::Srgb;

/// 8-bit device sRGB color, as stored in decoded rasters.
pub type RgbColor = Srgb<u8>;

// ------------------------------------------------------------
// Reference constants (sRGB primaries, D65 white)
// ------------------------------------------------------------

/// D65 reference white, scaled so Y = 100.
const WHITE_X: f64 = 95.047;
const WHITE_Y: f64 = 100.0;
const WHITE_Z: f64 = 108.883;

/// 6/29, the knee of the CIE Lab companding curve.
const DELTA: f64 = 6.0 / 29.0;

const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [3.2406, -1.5372, -0.4986],
    [-0.9689, 1.8758, 0.0415],
    [0.0557, -0.2040, 1.0570],
];

/// Round to 4 decimal places. Negative zero comes out as positive zero.
#[inline]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0 + 0.0
}

/// sRGB inverse gamma: 8-bit channel to linear light in [0, 1].
#[inline]
pub fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB gamma: linear light to an 8-bit channel.
///
/// Out-of-gamut input (negative or above 1.0) is clamped to 0..=255.
#[inline]
pub fn unlinearize(linear: f64) -> u8 {
    let c = if linear <= 0.003_130_8 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

#[inline]
fn mul(matrix: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    matrix.map(|row| row[0] * v[0] + row[1] * v[1] + row[2] * v[2])
}

/// Uppercase `RRGGBB` hex string.
pub fn to_hex(color: RgbColor) -> String {
    format!("{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
}

// ------------------------------------------------------------
// CIE XYZ
// ------------------------------------------------------------

/// CIE 1931 XYZ tristimulus value, white normalized to Y = 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct XyzColor {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl XyzColor {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Linearize and project through the sRGB matrix. Components are
    /// rounded to 4 decimals.
    pub fn from_rgb(color: RgbColor) -> Self {
        let linear = [
            linearize(color.red),
            linearize(color.green),
            linearize(color.blue),
        ];
        let [x, y, z] = mul(&RGB_TO_XYZ, linear);
        Self::new(round4(x), round4(y), round4(z))
    }

    /// Inverse matrix then gamma; out-of-gamut channels are clamped.
    pub fn to_rgb(self) -> RgbColor {
        let [r, g, b] = mul(&XYZ_TO_RGB, [self.x, self.y, self.z]);
        Srgb::new(unlinearize(r), unlinearize(g), unlinearize(b))
    }

    /// CIE 1931 (x, y) chromaticity. `None` for black, which has none.
    pub fn chromaticity(self) -> Option<(f64, f64)> {
        let sum = self.x + self.y + self.z;
        if sum <= 0.0 {
            return None;
        }
        Some((self.x / sum, self.y / sum))
    }
}

impl From<RgbColor> for XyzColor {
    fn from(color: RgbColor) -> Self {
        Self::from_rgb(color)
    }
}

// ------------------------------------------------------------
// CIE L*a*b*
// ------------------------------------------------------------

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.powf(1.0 / 3.0)
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[inline]
fn lab_f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// CIE L*a*b* color relative to the D65 white point.
///
/// Equality and hashing are exact over the stored components, which is
/// what makes palette deduplication reproducible: values built through
/// [`LabColor::from_xyz`] are rounded to 4 decimals first.
#[derive(Clone, Copy, Debug)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabColor {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    pub fn from_xyz(xyz: XyzColor) -> Self {
        let fx = lab_f(xyz.x * 100.0 / WHITE_X);
        let fy = lab_f(xyz.y * 100.0 / WHITE_Y);
        let fz = lab_f(xyz.z * 100.0 / WHITE_Z);

        Self::new(
            round4(116.0 * fy - 16.0),
            round4(500.0 * (fx - fy)),
            round4(200.0 * (fy - fz)),
        )
    }

    pub fn to_xyz(self) -> XyzColor {
        let fy = (self.l + 16.0) / 116.0;
        let fx = fy + self.a / 500.0;
        let fz = fy - self.b / 200.0;

        XyzColor::new(
            round4(lab_f_inv(fx) * WHITE_X / 100.0),
            round4(lab_f_inv(fy) * WHITE_Y / 100.0),
            round4(lab_f_inv(fz) * WHITE_Z / 100.0),
        )
    }

    /// RGB to Lab through XYZ.
    pub fn from_rgb(color: RgbColor) -> Self {
        Self::from_xyz(XyzColor::from_rgb(color))
    }

    /// Lab to RGB through XYZ, clamped to the 8-bit range.
    pub fn to_rgb(self) -> RgbColor {
        self.to_xyz().to_rgb()
    }

    fn bits(&self) -> [u64; 3] {
        [
            (self.l + 0.0).to_bits(),
            (self.a + 0.0).to_bits(),
            (self.b + 0.0).to_bits(),
        ]
    }
}

impl PartialEq for LabColor {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for LabColor {}

impl Hash for LabColor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl From<XyzColor> for LabColor {
    fn from(xyz: XyzColor) -> Self {
        Self::from_xyz(xyz)
    }
}

impl From<LabColor> for XyzColor {
    fn from(lab: LabColor) -> Self {
        lab.to_xyz()
    }
}
