use palette::Srgb;

use crate::color::{LabColor, RgbColor};

/// A color representation the clusterer can measure and average.
///
/// `distance` must be non-negative and symmetric. `centroid` is only ever
/// called with a non-empty slice.
pub trait MetricSpace<T> {
    fn distance(&self, x: &T, y: &T) -> f64;
    fn centroid(&self, points: &[T]) -> T;
}

/// Euclidean distance over 8-bit RGB channels; centroids are rounded means.
#[derive(Clone, Copy, Debug, Default)]
pub struct RgbSpace;

impl MetricSpace<RgbColor> for RgbSpace {
    fn distance(&self, x: &RgbColor, y: &RgbColor) -> f64 {
        let dr = x.red as f64 - y.red as f64;
        let dg = x.green as f64 - y.green as f64;
        let db = x.blue as f64 - y.blue as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    fn centroid(&self, points: &[RgbColor]) -> RgbColor {
        let n = points.len() as f64;
        let [r, g, b] = points.iter().fold([0.0; 3], |acc, p| {
            [
                acc[0] + p.red as f64,
                acc[1] + p.green as f64,
                acc[2] + p.blue as f64,
            ]
        });
        Srgb::new(
            (r / n).round() as u8,
            (g / n).round() as u8,
            (b / n).round() as u8,
        )
    }
}

/// CIE76: Euclidean distance in L*a*b*; centroids are per-component means.
#[derive(Clone, Copy, Debug, Default)]
pub struct CieLabSpace;

impl MetricSpace<LabColor> for CieLabSpace {
    fn distance(&self, x: &LabColor, y: &LabColor) -> f64 {
        let dl = x.l - y.l;
        let da = x.a - y.a;
        let db = x.b - y.b;
        (dl * dl + da * da + db * db).sqrt()
    }

    fn centroid(&self, points: &[LabColor]) -> LabColor {
        let n = points.len() as f64;
        let [l, a, b] = points
            .iter()
            .fold([0.0; 3], |acc, p| [acc[0] + p.l, acc[1] + p.a, acc[2] + p.b]);
        LabColor::new(l / n, a / n, b / n)
    }
}
