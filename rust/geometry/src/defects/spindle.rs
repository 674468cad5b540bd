// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spindle deflection offsets from an external model

use nalgebra::{Point3, Vector3};

use super::{finite, finite_vector, DeflectionPredictor};
use crate::error::{Error, Result};
use crate::point_cloud::FacePointCloud;

/// Length of the predictor feature vector:
/// `[tool, depth, feed, speed, distance_to_plane, relative_height]`
pub const FEATURE_COUNT: usize = 6;

/// Linear normalization window of one feature
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl Default for FeatureRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl FeatureRange {
    /// `value` mapped so that `min` is 0 and `max` is 1
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            0.0
        } else {
            (value - self.min) / span
        }
    }
}

/// Fixture plane the part is clamped against
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferencePlane {
    pub point: [f64; 3],
    pub normal: [f64; 3],
}

impl Default for ReferencePlane {
    fn default() -> Self {
        Self {
            point: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
        }
    }
}

/// Machining process parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpindleParams {
    pub tool_condition: f64,
    pub depth: f64,
    pub feed: f64,
    pub spindle_speed: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reference_plane: ReferencePlane,
    /// Normalization windows, one per feature
    #[cfg_attr(feature = "serde", serde(default))]
    pub ranges: [FeatureRange; FEATURE_COUNT],
}

pub(super) fn spindle(
    cloud: &FacePointCloud,
    params: &SpindleParams,
    predictor: &dyn DeflectionPredictor,
) -> Result<Vec<Point3<f64>>> {
    let process = [
        finite("tool condition", params.tool_condition)?,
        finite("cutting depth", params.depth)?,
        finite("feed", params.feed)?,
        finite("spindle speed", params.spindle_speed)?,
    ];
    for range in &params.ranges {
        finite("feature range", range.min)?;
        finite("feature range", range.max)?;
    }

    let origin = Point3::from(finite_vector("reference point", &params.reference_plane.point)?);
    let plane_normal: Vector3<f64> = finite_vector("reference normal", &params.reference_plane.normal)?
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| Error::invalid("reference plane normal is the zero vector"))?;

    let ranges = &params.ranges;
    let mut features = [0.0; FEATURE_COUNT];
    for (slot, (value, range)) in features.iter_mut().zip(process.iter().zip(ranges)) {
        *slot = range.normalize(*value);
    }

    // heights above the plane, relative to the face's own span
    let heights: Vec<f64> = cloud
        .points()
        .iter()
        .map(|p| (p - origin).dot(&plane_normal))
        .collect();
    let (low, high) = heights
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)));
    let height_range = FeatureRange { min: low, max: high };

    let mut out = Vec::with_capacity(cloud.len());
    for ((p, n), &height) in cloud.points().iter().zip(cloud.normals()).zip(&heights) {
        features[4] = ranges[4].normalize(height.abs());
        features[5] = ranges[5].normalize(height_range.normalize(height));

        let deflection = predictor.predict(&features);
        if !deflection.is_finite() {
            return Err(Error::invalid(format!(
                "predictor returned {} for features {:?}",
                deflection, features
            )));
        }
        out.push(p + n * deflection);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::tests::plate;
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    #[test]
    fn test_feature_vector() {
        let cloud = plate();
        let params = SpindleParams {
            tool_condition: 0.5,
            depth: 2.0,
            feed: 150.0,
            spindle_speed: 3000.0,
            reference_plane: ReferencePlane {
                point: [0.0, 0.0, 0.0],
                normal: [0.0, 2.0, 0.0],
            },
            ranges: [
                FeatureRange { min: 0.0, max: 1.0 },
                FeatureRange { min: 0.0, max: 4.0 },
                FeatureRange { min: 100.0, max: 200.0 },
                FeatureRange { min: 1000.0, max: 5000.0 },
                FeatureRange { min: 0.0, max: 2.0 },
                FeatureRange::default(),
            ],
        };

        let seen = Mutex::new(Vec::new());
        let predictor = |f: &[f64; FEATURE_COUNT]| {
            seen.lock().unwrap().push(*f);
            0.1
        };
        let moved = spindle(&cloud, &params, &predictor).unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), cloud.len());
        assert_eq!(&seen[0][..4], &[0.5, 0.5, 0.5, 0.5]);
        // last row sits at y = 2: distance 2 -> 1, top of the face -> 1
        let last = seen[seen.len() - 1];
        assert_relative_eq!(last[4], 1.0);
        assert_relative_eq!(last[5], 1.0);
        assert_relative_eq!(seen[0][4], 0.0);
        assert_relative_eq!(seen[0][5], 0.0);

        for (a, b) in cloud.points().iter().zip(&moved) {
            assert_relative_eq!(b.z - a.z, 0.1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_non_finite_prediction_rejected() {
        let predictor = |_: &[f64; FEATURE_COUNT]| f64::NAN;
        assert!(matches!(
            spindle(&plate(), &SpindleParams::default(), &predictor),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_plane_normal_rejected() {
        let params = SpindleParams {
            reference_plane: ReferencePlane {
                point: [0.0; 3],
                normal: [0.0; 3],
            },
            ..SpindleParams::default()
        };
        let predictor = |_: &[f64; FEATURE_COUNT]| 0.0;
        assert!(matches!(
            spindle(&plate(), &params, &predictor),
            Err(Error::InvalidParameter(_))
        ));
    }
}
