//! Weighted k-means++ seeding followed by Lloyd refinement, generic over any
//! [`MetricSpace`].
//!
//! Duplicated points are meaningful: they pull centroids and add to cluster
//! weight. Convergence is exact: refinement stops as soon as one assignment
//! pass reproduces the previous partition.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::{PaletteError, Result};
use crate::space::MetricSpace;

/// Outcome of [`cluster`].
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering<T> {
    assignments: Vec<(T, usize)>,
    centroids: Vec<T>,
    iterations: usize,
}

impl<T> Clustering<T> {
    /// Every input point, in input order, tagged with its cluster index.
    pub fn assignments(&self) -> &[(T, usize)] {
        &self.assignments
    }

    /// Final centroid per cluster index.
    pub fn centroids(&self) -> &[T] {
        &self.centroids
    }

    /// Number of assignment passes performed, including the one that
    /// confirmed convergence.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    /// Member count per cluster index. Entries may be zero when a centroid
    /// lost all its points during refinement.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for (_, index) in &self.assignments {
            sizes[*index] += 1;
        }
        sizes
    }

    /// Points grouped by cluster index, each group in input order.
    pub fn into_groups(self) -> Vec<Vec<T>> {
        let mut groups: Vec<Vec<T>> = (0..self.centroids.len()).map(|_| Vec::new()).collect();
        for (point, index) in self.assignments {
            groups[index].push(point);
        }
        groups
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Partition `points` into `k` clusters.
///
/// `seed` makes the run reproducible; without one the generator is seeded
/// from the operating system.
///
/// # Errors
///
/// [`PaletteError::InvalidParameter`] when `points` is empty, when `k` is 0
/// or larger than `points.len()`, or when there are fewer than `k` distinct
/// points to seed from.
pub fn cluster<T, S>(
    points: &[T],
    space: &S,
    k: usize,
    seed: Option<u64>,
) -> Result<Clustering<T>>
where
    T: Clone,
    S: MetricSpace<T> + ?Sized,
{
    if points.is_empty() {
        return Err(PaletteError::InvalidParameter(
            "cannot cluster an empty point set".to_string(),
        ));
    }
    if k == 0 || k > points.len() {
        return Err(PaletteError::InvalidParameter(format!(
            "cluster count {k} must be between 1 and {}",
            points.len()
        )));
    }

    let mut rng = rng_for(seed);
    let mut centroids = seed_centroids(points, space, k, &mut rng)?;

    let mut previous: Option<Vec<usize>> = None;
    let mut iterations = 0;
    let assignment = loop {
        iterations += 1;
        let assignment: Vec<usize> = points
            .iter()
            .map(|p| nearest_centroid(p, &centroids, space))
            .collect();

        if previous.as_ref() == Some(&assignment) {
            break assignment;
        }

        centroids = recompute_centroids(points, &assignment, centroids, space);
        trace!("lloyd iteration {iterations}");
        previous = Some(assignment);
    };

    debug!(
        "clustered {} points into {k} clusters after {iterations} iterations",
        points.len()
    );

    Ok(Clustering {
        assignments: points.iter().cloned().zip(assignment).collect(),
        centroids,
        iterations,
    })
}

/// k-means++ seeding: the first centroid is drawn uniformly, each further
/// one with probability proportional to its squared distance from the
/// nearest centroid chosen so far. Points sitting on a centroid have zero
/// weight and can never be drawn again.
fn seed_centroids<T, S, R>(points: &[T], space: &S, k: usize, rng: &mut R) -> Result<Vec<T>>
where
    T: Clone,
    S: MetricSpace<T> + ?Sized,
    R: Rng,
{
    let first = rng.random_range(0..points.len());
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[first].clone());

    let mut weights: Vec<f64> = points
        .iter()
        .map(|p| space.distance(p, &centroids[0]).powi(2))
        .collect();

    while centroids.len() < k {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(PaletteError::InvalidParameter(format!(
                "only {} distinct points available for {k} clusters",
                centroids.len()
            )));
        }

        let draw: f64 = rng.random();
        let mut cumulative = 0.0;
        let mut chosen = None;
        for (i, weight) in weights.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            cumulative += weight / total;
            chosen = Some(i);
            if cumulative > draw {
                break;
            }
        }
        // Rounding can leave the cumulative sum just short of the draw; the
        // last positively weighted point then takes it.
        let Some(index) = chosen else {
            return Err(PaletteError::InvalidParameter(format!(
                "only {} distinct points available for {k} clusters",
                centroids.len()
            )));
        };

        let centroid = points[index].clone();
        for (weight, point) in weights.iter_mut().zip(points) {
            let d = space.distance(point, &centroid).powi(2);
            if d < *weight {
                *weight = d;
            }
        }
        centroids.push(centroid);
    }

    Ok(centroids)
}

/// Index of the closest centroid; the lowest index wins ties.
fn nearest_centroid<T, S>(point: &T, centroids: &[T], space: &S) -> usize
where
    S: MetricSpace<T> + ?Sized,
{
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = space.distance(centroid, point);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

/// Fresh centroids from the current partition. A cluster with no members
/// keeps its previous centroid.
fn recompute_centroids<T, S>(
    points: &[T],
    assignment: &[usize],
    previous: Vec<T>,
    space: &S,
) -> Vec<T>
where
    T: Clone,
    S: MetricSpace<T> + ?Sized,
{
    let mut groups: Vec<Vec<T>> = (0..previous.len()).map(|_| Vec::new()).collect();
    for (point, index) in points.iter().zip(assignment) {
        groups[*index].push(point.clone());
    }

    previous
        .into_iter()
        .zip(groups)
        .map(|(old, members)| {
            if members.is_empty() {
                old
            } else {
                space.centroid(&members)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{LabColor, RgbColor};
    use crate::space::{CieLabSpace, RgbSpace};
    use palette::Srgb;

    fn rgb(r: u8, g: u8, b: u8) -> RgbColor {
        Srgb::new(r, g, b)
    }

    fn scenario() -> Vec<RgbColor> {
        vec![
            rgb(255, 255, 255),
            rgb(200, 200, 200),
            rgb(140, 24, 53),
            rgb(0, 0, 0),
        ]
    }

    #[test]
    fn separates_light_from_dark() {
        let points = scenario();
        let result = cluster(&points, &RgbSpace, 2, Some(0)).unwrap();
        let a = result.assignments();

        assert_eq!(a[0].1, a[1].1, "white and light gray share a cluster");
        assert_eq!(a[2].1, a[3].1, "crimson and black share a cluster");
        assert_ne!(a[0].1, a[2].1);
        assert_eq!(result.sizes(), vec![2, 2]);
    }

    #[test]
    fn membership_does_not_depend_on_seed() {
        let points = scenario();
        for seed in 0..32 {
            let mut groups = cluster(&points, &RgbSpace, 2, Some(seed))
                .unwrap()
                .into_groups();
            groups.sort_by_key(|g| g[0].red);
            assert_eq!(groups[0], vec![rgb(140, 24, 53), rgb(0, 0, 0)], "seed {seed}");
            assert_eq!(groups[1], vec![rgb(255, 255, 255), rgb(200, 200, 200)], "seed {seed}");
        }
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let points: Vec<LabColor> = (0..200u32)
            .map(|i| {
                let v = (i * 37 % 256) as u8;
                LabColor::from_rgb(rgb(v, (i % 7 * 30) as u8, 255 - v))
            })
            .collect();

        let first = cluster(&points, &CieLabSpace, 5, Some(42)).unwrap();
        let second = cluster(&points, &CieLabSpace, 5, Some(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn converges_within_a_generous_bound() {
        let points: Vec<LabColor> = (0..1_000u32)
            .map(|i| {
                LabColor::from_rgb(rgb(
                    (i * 7919 % 256) as u8,
                    (i * 104_729 % 256) as u8,
                    (i % 256) as u8,
                ))
            })
            .collect();
        for seed in 0..4 {
            let result = cluster(&points, &CieLabSpace, 8, Some(seed)).unwrap();
            assert!(result.iterations() < 10_000);
            assert_eq!(result.assignments().len(), points.len());
        }
    }

    #[test]
    fn assignment_is_total_and_keeps_input_order() {
        let points = scenario();
        let result = cluster(&points, &RgbSpace, 3, Some(7)).unwrap();

        let echoed: Vec<RgbColor> = result.assignments().iter().map(|(p, _)| *p).collect();
        assert_eq!(echoed, points);
        assert!(result.assignments().iter().all(|(_, i)| *i < 3));
        assert_eq!(result.sizes().iter().sum::<usize>(), points.len());
    }

    #[test]
    fn duplicates_add_weight() {
        let mut points = vec![rgb(250, 0, 0); 6];
        points.extend([rgb(0, 0, 250); 2]);
        let result = cluster(&points, &RgbSpace, 2, Some(1)).unwrap();

        let mut sizes = result.sizes();
        sizes.sort();
        assert_eq!(sizes, vec![2, 6]);
    }

    #[test]
    fn one_cluster_takes_everything() {
        let points = scenario();
        let result = cluster(&points, &RgbSpace, 1, Some(3)).unwrap();
        assert_eq!(result.sizes(), vec![4]);
        assert_eq!(result.centroids()[0], rgb(149, 120, 127));
    }

    #[test]
    fn k_equal_to_distinct_count_isolates_every_point() {
        let points = scenario();
        let result = cluster(&points, &RgbSpace, 4, Some(9)).unwrap();
        assert_eq!(result.sizes(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn empty_cluster_keeps_previous_centroid() {
        let points = scenario();
        let previous = vec![rgb(1, 2, 3), rgb(77, 77, 77), rgb(9, 9, 9)];
        // Nothing is assigned to index 1.
        let assignment = [0, 0, 2, 2];

        let centroids = recompute_centroids(&points, &assignment, previous, &RgbSpace);
        assert_eq!(
            centroids,
            vec![rgb(228, 228, 228), rgb(77, 77, 77), rgb(70, 12, 27)]
        );
    }

    #[test]
    fn rejects_invalid_parameters() {
        let points = scenario();
        let empty: Vec<RgbColor> = Vec::new();

        for (input, k) in [(&empty, 1), (&points, 0), (&points, 5)] {
            assert!(
                matches!(cluster(input, &RgbSpace, k, Some(0)), Err(PaletteError::InvalidParameter(_))),
                "k = {k}, {} points",
                input.len()
            );
        }
    }

    #[test]
    fn too_few_distinct_points_fail_instead_of_spinning() {
        let points = vec![rgb(10, 10, 10), rgb(10, 10, 10), rgb(90, 90, 90), rgb(10, 10, 10)];
        assert!(matches!(
            cluster(&points, &RgbSpace, 3, Some(0)),
            Err(PaletteError::InvalidParameter(_))
        ));
    }
}
