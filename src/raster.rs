use image::imageops;
use image::metadata::Orientation as ExifOrientation;
use image::{DynamicImage, RgbImage};
use palette::Srgb;

use crate::color::RgbColor;
use crate::error::{PaletteError, Result};

/// EXIF orientation (tag 0x0112) describing how stored pixels must be
/// transformed to display upright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// 1
    #[default]
    Identity,
    /// 2
    FlipHorizontal,
    /// 3
    Rotate180,
    /// 4
    FlipVertical,
    /// 5: rotate 90° clockwise, then flip horizontally.
    Transpose,
    /// 6
    Rotate90,
    /// 7: rotate 90° clockwise, then flip vertically.
    Transverse,
    /// 8
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation value (1..=8). Anything else is `None`.
    pub fn from_exif(value: u16) -> Option<Self> {
        let orientation = match value {
            1 => Self::Identity,
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => return None,
        };
        Some(orientation)
    }

    pub fn to_exif(self) -> u16 {
        match self {
            Self::Identity => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// True when applying the orientation exchanges width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }
}

impl From<ExifOrientation> for Orientation {
    fn from(orientation: ExifOrientation) -> Self {
        match orientation {
            ExifOrientation::NoTransforms => Self::Identity,
            ExifOrientation::FlipHorizontal => Self::FlipHorizontal,
            ExifOrientation::Rotate180 => Self::Rotate180,
            ExifOrientation::FlipVertical => Self::FlipVertical,
            ExifOrientation::Rotate90FlipH => Self::Transpose,
            ExifOrientation::Rotate90 => Self::Rotate90,
            ExifOrientation::Rotate270FlipH => Self::Transverse,
            ExifOrientation::Rotate270 => Self::Rotate270,
        }
    }
}

/// Transform stored pixels into display orientation.
pub fn apply_orientation(image: RgbImage, orientation: Orientation) -> RgbImage {
    match orientation {
        Orientation::Identity => image,
        Orientation::FlipHorizontal => imageops::flip_horizontal(&image),
        Orientation::Rotate180 => imageops::rotate180(&image),
        Orientation::FlipVertical => imageops::flip_vertical(&image),
        Orientation::Transpose => imageops::flip_horizontal(&imageops::rotate90(&image)),
        Orientation::Rotate90 => imageops::rotate90(&image),
        Orientation::Transverse => imageops::flip_vertical(&imageops::rotate90(&image)),
        Orientation::Rotate270 => imageops::rotate270(&image),
    }
}

/// Byte layout of an interleaved 8-bit pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
    /// Blue-green-red order, as handed out by most screen capture APIs.
    Bgr8,
    Bgra8,
    Gray8,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb8 | PixelLayout::Bgr8 => 3,
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => 4,
            PixelLayout::Gray8 => 1,
        }
    }

    #[inline]
    fn decode(self, px: &[u8]) -> [u8; 3] {
        match self {
            PixelLayout::Rgb8 | PixelLayout::Rgba8 => [px[0], px[1], px[2]],
            PixelLayout::Bgr8 | PixelLayout::Bgra8 => [px[2], px[1], px[0]],
            PixelLayout::Gray8 => [px[0]; 3],
        }
    }
}

/// A decoded RGB raster plus the orientation it should be displayed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    image: RgbImage,
    orientation: Orientation,
}

impl Raster {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            orientation: Orientation::Identity,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// The raster in display orientation, tagged `Identity`.
    pub fn oriented(&self) -> Raster {
        match self.orientation {
            Orientation::Identity => self.clone(),
            orientation => Raster::new(apply_orientation(self.image.clone(), orientation)),
        }
    }

    /// Width and height once the orientation is applied.
    pub fn display_dimensions(&self) -> (u32, u32) {
        if self.orientation.swaps_dimensions() {
            (self.height(), self.width())
        } else {
            (self.width(), self.height())
        }
    }

    /// Build a raster from row-major pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: &[RgbColor]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(PaletteError::InvalidParameter(format!(
                "{} pixels supplied for a {width}x{height} raster",
                pixels.len()
            )));
        }

        let raw: Vec<u8> = pixels
            .iter()
            .flat_map(|p| [p.red, p.green, p.blue])
            .collect();
        let image = RgbImage::from_raw(width, height, raw).ok_or_else(|| {
            PaletteError::InvalidParameter(format!("cannot build a {width}x{height} raster"))
        })?;
        Ok(Self::new(image))
    }

    /// Decode an interleaved byte buffer whose rows are `stride` bytes apart.
    /// Alpha channels are ignored.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
        bytes: &[u8],
    ) -> Result<Self> {
        let bpp = layout.bytes_per_pixel();
        let row_len = width as usize * bpp;
        if stride < row_len {
            return Err(PaletteError::InvalidParameter(format!(
                "stride {stride} is shorter than a {width}-pixel {layout:?} row"
            )));
        }
        if height > 0 && bytes.len() < stride * (height as usize - 1) + row_len {
            return Err(PaletteError::InvalidParameter(format!(
                "buffer of {} bytes is too small for {width}x{height} {layout:?}",
                bytes.len()
            )));
        }

        let mut raw = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height as usize {
            let row = &bytes[y * stride..y * stride + row_len];
            for px in row.chunks_exact(bpp) {
                raw.extend_from_slice(&layout.decode(px));
            }
        }

        let image = RgbImage::from_raw(width, height, raw).ok_or_else(|| {
            PaletteError::InvalidParameter(format!("cannot build a {width}x{height} raster"))
        })?;
        Ok(Self::new(image))
    }

    /// Accept any gray or color layout the `image` crate decodes to.
    pub fn from_dynamic_image(img: &DynamicImage) -> Result<Self> {
        let image = match img {
            DynamicImage::ImageRgb8(buf) => buf.clone(),
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgba8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_) => img.to_rgb8(),
            other => {
                return Err(PaletteError::UnsupportedFormat(format!(
                    "{:?}",
                    other.color()
                )));
            }
        };
        Ok(Self::new(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Pixel at `(x, y)` in stored (not oriented) coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<RgbColor> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Srgb::new(p[0], p[1], p[2]))
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl TryFrom<&DynamicImage> for Raster {
    type Error = PaletteError;

    fn try_from(img: &DynamicImage) -> Result<Self> {
        Self::from_dynamic_image(img)
    }
}

/// Flatten a raster into RGB samples, row-major, top-to-bottom and
/// left-to-right in stored coordinates.
pub fn sample(raster: &Raster) -> Result<Vec<RgbColor>> {
    if raster.is_empty() {
        return Err(PaletteError::InvalidParameter(
            "cannot sample an empty raster".to_string(),
        ));
    }

    Ok(raster
        .image
        .pixels()
        .map(|px| Srgb::new(px[0], px[1], px[2]))
        .collect())
}
