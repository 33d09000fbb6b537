use crate::{
    error::{GenerationError, PlacementStage, Result},
    extent::Extent,
    geometry::Point,
};

use rand::{prelude::*, rngs::SmallRng};
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

pub fn small_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NormalDistSpec {
    pub mean: f32,
    pub std_dev: f32,
}

impl Default for NormalDistSpec {
    fn default() -> Self {
        NormalDistSpec {
            mean: 0.0,
            std_dev: 1.0,
        }
    }
}

impl NormalDistSpec {
    pub fn make(&self) -> Result<Normal<f32>> {
        Normal::new(self.mean, self.std_dev).map_err(|e| {
            GenerationError::InvalidParameters(format!(
                "bad normal distribution (mean = {}, std_dev = {}): {:?}",
                self.mean, self.std_dev, e
            ))
        })
    }
}

/// Rounds independent normal samples to an integer offset.
pub struct PlaneNormalDist {
    pub x: Normal<f32>,
    pub y: Normal<f32>,
}

impl Distribution<Point> for PlaneNormalDist {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let x = rng.sample(self.x).round() as i32;
        let y = rng.sample(self.y).round() as i32;

        [x, y].into()
    }
}

pub struct PlaneUniformDist {
    pub x: Uniform<i32>,
    pub y: Uniform<i32>,
}

impl Distribution<Point> for PlaneUniformDist {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let x = rng.sample(self.x);
        let y = rng.sample(self.y);

        [x, y].into()
    }
}

/// Inclusive ranges for each axis.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PlaneUniformDistSpec {
    pub x: (i32, i32),
    pub y: (i32, i32),
}

impl PlaneUniformDistSpec {
    pub fn make(&self) -> Result<PlaneUniformDist> {
        if self.x.0 > self.x.1 || self.y.0 > self.y.1 {
            return Err(GenerationError::InvalidParameters(format!(
                "empty uniform range x = {:?}, y = {:?}",
                self.x, self.y
            )));
        }

        Ok(PlaneUniformDist {
            x: Uniform::new_inclusive(self.x.0, self.x.1),
            y: Uniform::new_inclusive(self.y.0, self.y.1),
        })
    }
}

/// Parameters of the anchor point sampler.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SamplingSpec {
    /// The minimum separation is `separation_factor * sqrt(usable_area / node_count)`, floored at
    /// `min_separation`.
    pub separation_factor: f64,
    pub min_separation: f64,
    /// Anchors stay at least this far from every side of the bounds.
    pub margin: i32,
    /// Number of consecutive rejected candidates before giving up.
    pub max_retries: usize,
}

impl Default for SamplingSpec {
    fn default() -> Self {
        SamplingSpec {
            separation_factor: 0.6,
            min_separation: 40.0,
            margin: 24,
            max_retries: 2000,
        }
    }
}

impl SamplingSpec {
    /// The region anchors are drawn from, or `None` if the margin eats the whole bounds.
    pub fn usable_extent(&self, width: i32, height: i32) -> Option<Extent> {
        let usable = Extent::from_min_and_size(Point::new(0, 0), Point::new(width, height))
            .radial_grow(-self.margin);

        if usable.width() < 0 || usable.height() < 0 {
            None
        } else {
            Some(usable)
        }
    }

    pub fn min_distance(&self, usable: &Extent, node_count: usize) -> f64 {
        let spread = (usable.area() as f64 / node_count.max(1) as f64).sqrt();

        (self.separation_factor * spread).max(self.min_separation)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.separation_factor >= 0.0) || !(self.min_separation >= 0.0) {
            return Err(GenerationError::InvalidParameters(format!(
                "separation must be non-negative (factor = {}, min = {})",
                self.separation_factor, self.min_separation
            )));
        }
        if self.margin < 0 {
            return Err(GenerationError::InvalidParameters(format!(
                "sampling margin must be non-negative (got {})",
                self.margin
            )));
        }

        Ok(())
    }
}

/// Rejection-samples `node_count` anchors inside `[0, width) x [0, height)`, each at least
/// `spec.min_distance` from all others and `spec.margin` from the bounds.
///
/// Fails with `InsufficientSpace` once `spec.max_retries` candidates in a row are rejected. No
/// partial point set is returned.
pub fn sample_points(
    node_count: usize,
    width: i32,
    height: i32,
    spec: &SamplingSpec,
    rng: &mut impl Rng,
) -> Result<Vec<Point>> {
    spec.validate()?;

    let insufficient = |placed| GenerationError::InsufficientSpace {
        stage: PlacementStage::Points,
        requested: node_count,
        placed,
    };

    let usable = spec
        .usable_extent(width, height)
        .ok_or_else(|| insufficient(0))?;
    let min_distance = spec.min_distance(&usable, node_count);
    let min_distance_sq = min_distance * min_distance;
    log::debug!(
        "Sampling {} points in {:?} with separation {:.1}",
        node_count,
        usable,
        min_distance
    );

    // Keep clear of the far edges too; the bounds are half-open.
    let max = usable.max();
    let location_dist = PlaneUniformDistSpec {
        x: (usable.min.x, max.x.min(width - 1)),
        y: (usable.min.y, max.y.min(height - 1)),
    }
    .make()
    .map_err(|_| insufficient(0))?;

    let mut points: Vec<Point> = Vec::with_capacity(node_count);
    let mut rejections = 0;
    while points.len() < node_count {
        let candidate = location_dist.sample(rng);
        let separated = points
            .iter()
            .all(|p| p.distance_squared(&candidate) as f64 >= min_distance_sq);

        if separated {
            points.push(candidate);
            rejections = 0;
        } else {
            rejections += 1;
            if rejections >= spec.max_retries {
                log::debug!(
                    "Gave up sampling after {} consecutive rejections",
                    rejections
                );
                return Err(insufficient(points.len()));
            }
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_points_are_separated_and_inside_margin() {
        let spec = SamplingSpec::default();
        let mut rng = small_rng(7);
        let points = sample_points(12, 800, 600, &spec, &mut rng).unwrap();

        assert_eq!(points.len(), 12);

        let usable = spec.usable_extent(800, 600).unwrap();
        let min_distance = spec.min_distance(&usable, 12);
        for (i, p) in points.iter().enumerate() {
            assert!(p.x >= spec.margin && p.x <= 800 - spec.margin);
            assert!(p.y >= spec.margin && p.y <= 600 - spec.margin);
            for q in points[i + 1..].iter() {
                assert!(p.distance(q) >= min_distance);
            }
        }
    }

    #[test]
    fn test_same_seed_same_points() {
        let spec = SamplingSpec::default();
        let a = sample_points(8, 500, 500, &spec, &mut small_rng(99)).unwrap();
        let b = sample_points(8, 500, 500, &spec, &mut small_rng(99)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_overfull_bounds_are_insufficient_space() {
        let spec = SamplingSpec::default();
        let result = sample_points(1000, 400, 400, &spec, &mut small_rng(1));

        match result {
            Err(GenerationError::InsufficientSpace {
                stage,
                requested,
                placed,
            }) => {
                assert_eq!(stage, PlacementStage::Points);
                assert_eq!(requested, 1000);
                assert!(placed < 1000);
            }
            other => panic!("expected InsufficientSpace, got {:?}", other),
        }
    }

    #[test]
    fn test_margin_larger_than_bounds_is_insufficient_space() {
        let spec = SamplingSpec {
            margin: 300,
            ..SamplingSpec::default()
        };
        let result = sample_points(3, 400, 400, &spec, &mut small_rng(1));

        assert!(matches!(
            result,
            Err(GenerationError::InsufficientSpace { placed: 0, .. })
        ));
    }

    #[test]
    fn test_normal_dist_spec_rejects_bad_std_dev() {
        let spec = NormalDistSpec {
            mean: 0.0,
            std_dev: -1.0,
        };

        assert!(matches!(
            spec.make(),
            Err(GenerationError::InvalidParameters(_))
        ));
    }
}
