use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::color::{LabColor, RgbColor};
use crate::error::{PaletteError, Result};
use crate::kmeans::cluster;
use crate::raster::{Raster, sample};
use crate::resize::{THUMBNAIL_SIZE, resize, slice_columns};
use crate::space::{CieLabSpace, MetricSpace};

/// One palette entry and the number of thumbnail pixels behind it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Swatch {
    pub color: RgbColor,
    pub population: usize,
}

/// Palette extraction settings.
///
/// ```
/// use ambient_palette::{PaletteExtractor, Raster};
/// use image::{Rgb, RgbImage};
///
/// let raster = Raster::new(RgbImage::from_pixel(10, 10, Rgb([30, 60, 90])));
/// let palette = PaletteExtractor::new(3).with_seed(0).palette(&raster).unwrap();
/// assert_eq!(palette.len(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteExtractor {
    count: usize,
    seed: Option<u64>,
    thumbnail_size: u32,
}

impl PaletteExtractor {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            seed: None,
            thumbnail_size: THUMBNAIL_SIZE,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn thumbnail_size(&self) -> u32 {
        self.thumbnail_size
    }

    /// Up to `count` representative colors, most populous first.
    pub fn palette(&self, raster: &Raster) -> Result<Vec<RgbColor>> {
        Ok(self
            .swatches(raster)?
            .into_iter()
            .map(|s| s.color)
            .collect())
    }

    /// Resize, sample, convert to Lab and cluster.
    ///
    /// When the thumbnail holds fewer distinct colors than requested, the
    /// distinct colors are returned in first-seen order and no clustering
    /// happens. Otherwise swatches are ordered by descending cluster
    /// population; equal populations keep cluster order.
    pub fn swatches(&self, raster: &Raster) -> Result<Vec<Swatch>> {
        if self.count == 0 {
            return Err(PaletteError::InvalidParameter(
                "palette size must be positive".to_string(),
            ));
        }

        let thumb = resize(raster, self.thumbnail_size)?;
        let samples = sample(&thumb)?;
        let points = to_lab(&samples);

        let distinct = distinct_with_counts(&points);
        debug!(
            "{}x{} thumbnail, {} samples, {} distinct colors",
            thumb.width(),
            thumb.height(),
            points.len(),
            distinct.len()
        );

        if distinct.len() < self.count {
            debug!("short-circuit: fewer distinct colors than {}", self.count);
            return Ok(distinct
                .into_iter()
                .map(|(lab, population)| Swatch {
                    color: lab.to_rgb(),
                    population,
                })
                .collect());
        }

        let groups = cluster(&points, &CieLabSpace, self.count, self.seed)?.into_groups();
        Ok(swatches_by_weight(groups))
    }
}

/// One swatch per non-empty group, heaviest first. A stable sort keeps
/// groups of equal weight in cluster order.
fn swatches_by_weight(mut groups: Vec<Vec<LabColor>>) -> Vec<Swatch> {
    groups.retain(|g| !g.is_empty());
    groups.sort_by(|a, b| b.len().cmp(&a.len()));

    debug!(
        "cluster sizes: {:?}",
        groups.iter().map(Vec::len).collect::<Vec<_>>()
    );

    groups
        .into_iter()
        .map(|members| Swatch {
            color: CieLabSpace.centroid(&members).to_rgb(),
            population: members.len(),
        })
        .collect()
}

/// Convert samples to Lab, converting each distinct RGB value once.
fn to_lab(samples: &[RgbColor]) -> Vec<LabColor> {
    let mut cache: HashMap<[u8; 3], LabColor> = HashMap::new();
    samples
        .iter()
        .map(|c| {
            *cache
                .entry([c.red, c.green, c.blue])
                .or_insert_with(|| LabColor::from_rgb(*c))
        })
        .collect()
}

/// Distinct values in first-seen order with their occurrence counts.
fn distinct_with_counts(points: &[LabColor]) -> Vec<(LabColor, usize)> {
    let mut index: HashMap<LabColor, usize> = HashMap::new();
    let mut distinct: Vec<(LabColor, usize)> = Vec::new();
    for point in points {
        match index.entry(*point) {
            Entry::Occupied(slot) => distinct[*slot.get()].1 += 1,
            Entry::Vacant(slot) => {
                slot.insert(distinct.len());
                distinct.push((*point, 1));
            }
        }
    }
    distinct
}

/// Extract up to `count` dominant colors from `raster`, most populous first.
pub fn extract_palette(raster: &Raster, count: usize, seed: Option<u64>) -> Result<Vec<RgbColor>> {
    PaletteExtractor::new(count)
        .with_optional_seed(seed)
        .palette(raster)
}

/// One palette per vertical strip, left to right, e.g. one per light.
pub fn extract_slices(
    raster: &Raster,
    slices: u32,
    count: usize,
    seed: Option<u64>,
) -> Result<Vec<Vec<RgbColor>>> {
    let extractor = PaletteExtractor::new(count).with_optional_seed(seed);
    slice_columns(raster, slices)?
        .iter()
        .map(|strip| extractor.palette(strip))
        .collect()
}
