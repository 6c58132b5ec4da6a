//! Dominant-color palettes for driving ambient lighting from an image.
//!
//! The pipeline is:
//! 1. Bound the raster to a small thumbnail (72 px long edge) and apply its
//!    EXIF orientation ([`resize`]).
//! 2. Sample every thumbnail pixel ([`sample`]) and convert it to CIE
//!    L\*a\*b\* through XYZ ([`LabColor`]).
//! 3. Cluster the Lab points with k-means++ seeding and Lloyd refinement
//!    ([`cluster`]) in a [`CieLabSpace`].
//! 4. Convert the cluster centroids back to RGB, most populous first.
//!
//! ```
//! use ambient_palette::{Raster, extract_palette};
//! use image::{Rgb, RgbImage};
//!
//! let raster = Raster::new(RgbImage::from_fn(40, 20, |x, _| {
//!     if x < 30 { Rgb([200, 30, 30]) } else { Rgb([20, 20, 160]) }
//! }));
//! let palette = extract_palette(&raster, 2, Some(7)).unwrap();
//! assert_eq!(palette.len(), 2);
//! assert!(palette[0].red > palette[0].blue);
//! ```
//!
//! Every call owns its inputs and random source, so independent extractions
//! may run on as many threads as the caller likes. Callers polling a live
//! source (periodic screen capture, say) are expected to skip a cycle while
//! the previous extraction is still running.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};
use tracing::debug;

pub mod color;
pub mod error;
pub mod extract;
pub mod kmeans;
pub mod raster;
pub mod resize;
pub mod space;
pub mod wasm;

pub use color::{LabColor, RgbColor, XyzColor, to_hex};
pub use error::{PaletteError, Result};
pub use extract::{PaletteExtractor, Swatch, extract_palette, extract_slices};
pub use kmeans::{Clustering, cluster};
pub use raster::{Orientation, PixelLayout, Raster, apply_orientation, sample};
pub use resize::{THUMBNAIL_SIZE, resize, slice_columns, thumbnail_dimensions};
pub use space::{CieLabSpace, MetricSpace, RgbSpace};

/// Decode an encoded image (PNG, JPEG, ...) into a [`Raster`].
///
/// The raster is tagged with `orientation` when given, otherwise with the
/// orientation stored in the image's EXIF metadata (upright when absent).
pub fn decode(bytes: &[u8], orientation: Option<Orientation>) -> Result<Raster> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .into_decoder()?;
    let embedded = Orientation::from(decoder.orientation()?);
    let img = DynamicImage::from_decoder(decoder)?;

    let orientation = orientation.unwrap_or(embedded);
    debug!(
        "decoded {}x{} image, orientation {:?} (embedded {:?})",
        img.width(),
        img.height(),
        orientation,
        embedded
    );
    Ok(Raster::from_dynamic_image(&img)?.with_orientation(orientation))
}
