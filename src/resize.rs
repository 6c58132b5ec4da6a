use std::borrow::Cow;

use image::imageops::{self, FilterType};
use tracing::debug;

use crate::error::{PaletteError, Result};
use crate::raster::{Raster, apply_orientation};

/// Long-edge bound used for palette thumbnails.
pub const THUMBNAIL_SIZE: u32 = 72;

/// Aspect-preserving dimensions whose longer side equals `size`.
///
/// The shorter side is scaled with floor division; it never drops below 1.
pub fn thumbnail_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let (w, h, s) = (width as u64, height as u64, size as u64);
    let resized_width = if w > h { s } else { w * s / h };
    let resized_height = if h > w { s } else { h * s / w };
    (resized_width.max(1) as u32, resized_height.max(1) as u32)
}

/// Downsample `raster` so neither side exceeds `size`.
///
/// A raster that already fits is handed back as-is, orientation tag
/// included. Otherwise the raster is resampled with a bicubic filter and its
/// orientation is applied, so the returned dimensions are the final ones.
pub fn resize(raster: &Raster, size: u32) -> Result<Cow<'_, Raster>> {
    if raster.is_empty() {
        return Err(PaletteError::InvalidParameter(
            "cannot resize an empty raster".to_string(),
        ));
    }
    if size == 0 {
        return Err(PaletteError::InvalidParameter(
            "thumbnail size must be positive".to_string(),
        ));
    }

    let (width, height) = (raster.width(), raster.height());
    if width <= size && height <= size {
        return Ok(Cow::Borrowed(raster));
    }

    let (resized_width, resized_height) = thumbnail_dimensions(width, height, size);
    let resized = imageops::resize(
        raster.as_image(),
        resized_width,
        resized_height,
        FilterType::CatmullRom,
    );
    let (display_width, display_height) = if raster.orientation().swaps_dimensions() {
        (resized_height, resized_width)
    } else {
        (resized_width, resized_height)
    };
    debug!(
        "resized {}x{} to {}x{} ({:?})",
        width,
        height,
        display_width,
        display_height,
        raster.orientation()
    );

    let oriented = apply_orientation(resized, raster.orientation());
    Ok(Cow::Owned(Raster::new(oriented)))
}

/// Cut the oriented raster into `count` equal-width, full-height strips,
/// left to right. Columns left over by the integer division are dropped.
pub fn slice_columns(raster: &Raster, count: u32) -> Result<Vec<Raster>> {
    if count == 0 {
        return Err(PaletteError::InvalidParameter(
            "slice count must be positive".to_string(),
        ));
    }

    let (width, height) = raster.display_dimensions();
    let strip_width = width / count;
    if strip_width == 0 || height == 0 {
        return Err(PaletteError::InvalidParameter(format!(
            "cannot cut a {width}x{height} raster into {count} strips"
        )));
    }

    let upright = raster.oriented();
    Ok((0..count)
        .map(|i| {
            let strip =
                imageops::crop_imm(upright.as_image(), i * strip_width, 0, strip_width, height);
            Raster::new(strip.to_image())
        })
        .collect())
}
