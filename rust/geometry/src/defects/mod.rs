// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Defect Transform Library
//!
//! Pure perturbations of a face's points. Each transform returns a new cloud
//! with the same length, face, normals and bounds; the input is never touched.
//! The face bounding box recorded at discretization time is the frame of
//! reference for pivots, normalized positions and the default drill axis.

mod beam;
mod jitter;
mod pattern;
mod rigid;
mod spindle;

use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::point_cloud::{Axis, FacePointCloud};

pub use beam::BeamParams;
pub use pattern::PatternParams;
pub use spindle::{FeatureRange, ReferencePlane, SpindleParams, FEATURE_COUNT};

/// External deflection model: six normalized features in, offset out
pub trait DeflectionPredictor: Send + Sync {
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64;
}

impl<F> DeflectionPredictor for F
where
    F: Fn(&[f64; FEATURE_COUNT]) -> f64 + Send + Sync,
{
    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self(features)
    }
}

/// A point-cloud perturbation with its parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Defect {
    /// Rigid shift by `offset` along `direction`
    Translate { direction: [f64; 3], offset: f64 },
    /// Rigid rotation about the face bbox centre, angles in degrees
    Rotate { angles: [f64; 3] },
    /// Random offsets with magnitude in `[min_offset, max_offset]`
    Jitter {
        min_offset: f64,
        max_offset: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        seed: Option<u64>,
    },
    /// Cantilever bending
    Flexion(BeamParams),
    /// Twist about the long axis
    Torsion(BeamParams),
    /// Normal offsets cycling with point index
    Wave(PatternParams),
    /// Normal offsets cycling twice per turn about the drill axis
    Oval(PatternParams),
    /// Normal offsets cycling along the drill axis
    Sinusoidal(PatternParams),
    /// Normal offsets from a spindle deflection model
    Spindle(SpindleParams),
}

impl Defect {
    pub fn name(&self) -> &'static str {
        match self {
            Defect::Translate { .. } => "translate",
            Defect::Rotate { .. } => "rotate",
            Defect::Jitter { .. } => "jitter",
            Defect::Flexion(_) => "flexion",
            Defect::Torsion(_) => "torsion",
            Defect::Wave(_) => "wave",
            Defect::Oval(_) => "oval",
            Defect::Sinusoidal(_) => "sinusoidal",
            Defect::Spindle(_) => "spindle",
        }
    }
}

/// Apply `defect` to a cloud, producing a replacement cloud.
///
/// `predictor` is only consulted by [`Defect::Spindle`].
pub fn apply_defect(
    defect: &Defect,
    cloud: &FacePointCloud,
    predictor: Option<&dyn DeflectionPredictor>,
) -> Result<FacePointCloud> {
    if cloud.points().len() != cloud.normals().len() {
        return Err(Error::invalid(format!(
            "{} points but {} normals",
            cloud.points().len(),
            cloud.normals().len()
        )));
    }

    let points = match defect {
        Defect::Translate { direction, offset } => rigid::translate(cloud, direction, *offset)?,
        Defect::Rotate { angles } => rigid::rotate(cloud, angles)?,
        Defect::Jitter {
            min_offset,
            max_offset,
            seed,
        } => jitter::jitter(cloud, *min_offset, *max_offset, *seed)?,
        Defect::Flexion(params) => beam::flexion(cloud, params)?,
        Defect::Torsion(params) => beam::torsion(cloud, params)?,
        Defect::Wave(params) => pattern::wave(cloud, params)?,
        Defect::Oval(params) => pattern::oval(cloud, params)?,
        Defect::Sinusoidal(params) => pattern::sinusoidal(cloud, params)?,
        Defect::Spindle(params) => {
            let predictor = predictor.ok_or_else(|| {
                Error::invalid("spindle defect requires a deflection predictor")
            })?;
            spindle::spindle(cloud, params, predictor)?
        }
    };

    tracing::debug!(
        face = cloud.face().get(),
        defect = defect.name(),
        points = points.len(),
        "applied defect"
    );

    cloud.with_points(points)
}

pub(crate) fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::invalid(format!("{} must be finite, got {}", name, value)))
    }
}

pub(crate) fn finite_vector(name: &str, v: &[f64; 3]) -> Result<Vector3<f64>> {
    for &c in v {
        finite(name, c)?;
    }
    Ok(Vector3::from(*v))
}

/// Explicit drill axis or the longest side of the face bounds
pub(crate) fn drill_axis(cloud: &FacePointCloud, explicit: Option<Axis>) -> Axis {
    explicit.unwrap_or_else(|| cloud.bounds().longest_axis())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::point_cloud::BoundingBox;
    use iges_lite_core::SequenceNumber;
    use nalgebra::Point3;

    /// 11 x 3 lattice on z = 0 spanning x in [0, 10], y in [0, 2]
    pub(crate) fn plate() -> FacePointCloud {
        let mut points = Vec::new();
        for y in 0..3 {
            for x in 0..=10 {
                points.push(Point3::new(x as f64, y as f64, 0.0));
            }
        }
        let normals = vec![Vector3::z(); points.len()];
        let bounds = BoundingBox::from_points(&points);
        FacePointCloud::new(SequenceNumber(11), points, normals, bounds).unwrap()
    }

    #[test]
    fn test_output_keeps_face_and_normals() {
        let cloud = plate();
        let moved = apply_defect(
            &Defect::Translate {
                direction: [0.0, 0.0, 2.0],
                offset: 1.5,
            },
            &cloud,
            None,
        )
        .unwrap();
        assert_eq!(moved.face(), cloud.face());
        assert_eq!(moved.len(), cloud.len());
        assert_eq!(moved.normals(), cloud.normals());
        assert_eq!(moved.bounds(), cloud.bounds());
        assert!(moved.points().iter().all(|p| p.z == 1.5));
    }

    #[test]
    fn test_spindle_requires_predictor() {
        let defect = Defect::Spindle(SpindleParams::default());
        let err = apply_defect(&defect, &plate(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_closure_predictor() {
        let predictor = |features: &[f64; FEATURE_COUNT]| features[0] * 2.0;
        assert_eq!(predictor.predict(&[0.25, 0.0, 0.0, 0.0, 0.0, 0.0]), 0.5);
    }

    #[test]
    fn test_empty_cloud_passes_through() {
        let empty = FacePointCloud::empty(SequenceNumber(3));
        let defect = Defect::Wave(PatternParams {
            amplitude: 1.0,
            points_per_cycle: 4.0,
            drill_axis: None,
        });
        assert!(apply_defect(&defect, &empty, None).unwrap().is_empty());
    }
}
