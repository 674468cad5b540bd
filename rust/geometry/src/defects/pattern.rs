// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic offsets along the point normals

use std::f64::consts::TAU;

use nalgebra::Point3;

use super::{drill_axis, finite};
use crate::error::{Error, Result};
use crate::point_cloud::{Axis, FacePointCloud};

/// Periodic pattern settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternParams {
    pub amplitude: f64,
    /// Points per cycle, the pattern frequency
    pub points_per_cycle: f64,
    /// Axis of the drilled hole; the longest face axis when unset
    #[cfg_attr(feature = "serde", serde(default))]
    pub drill_axis: Option<Axis>,
}

impl PatternParams {
    fn validate(&self) -> Result<(f64, f64)> {
        let amplitude = finite("amplitude", self.amplitude)?;
        let per_cycle = finite("points per cycle", self.points_per_cycle)?;
        if per_cycle <= 0.0 {
            return Err(Error::invalid(format!(
                "points per cycle must be positive, got {}",
                per_cycle
            )));
        }
        Ok((amplitude, per_cycle))
    }
}

/// `p + A * sin(2 pi * ratio(i, p)) * n`
fn offset_by(
    cloud: &FacePointCloud,
    amplitude: f64,
    ratio: impl Fn(usize, &Point3<f64>) -> f64,
) -> Vec<Point3<f64>> {
    cloud
        .points()
        .iter()
        .zip(cloud.normals())
        .enumerate()
        .map(|(i, (p, n))| p + n * (amplitude * (TAU * ratio(i, p)).sin()))
        .collect()
}

pub(super) fn wave(cloud: &FacePointCloud, params: &PatternParams) -> Result<Vec<Point3<f64>>> {
    let (amplitude, per_cycle) = params.validate()?;
    Ok(offset_by(cloud, amplitude, |i, _| i as f64 / per_cycle))
}

pub(super) fn sinusoidal(
    cloud: &FacePointCloud,
    params: &PatternParams,
) -> Result<Vec<Point3<f64>>> {
    let (amplitude, per_cycle) = params.validate()?;
    let axis = drill_axis(cloud, params.drill_axis);
    let cycles = cloud.len() as f64 / per_cycle;
    let bounds = *cloud.bounds();
    Ok(offset_by(cloud, amplitude, |_, p| {
        cycles * bounds.normalized(p, axis)
    }))
}

pub(super) fn oval(cloud: &FacePointCloud, params: &PatternParams) -> Result<Vec<Point3<f64>>> {
    let (amplitude, _) = params.validate()?;
    let axis = drill_axis(cloud, params.drill_axis);
    // in-plane axes, right-handed about the drill axis
    let (a, b) = match axis {
        Axis::X => (1, 2),
        Axis::Y => (2, 0),
        Axis::Z => (0, 1),
    };
    let centre = cloud.bounds().center();
    Ok(offset_by(cloud, amplitude, |_, p| {
        let theta = (p[b] - centre[b]).atan2(p[a] - centre[a]);
        2.0 * theta / TAU
    }))
}

#[cfg(test)]
mod tests {
    use super::super::tests::plate;
    use super::*;
    use approx::assert_relative_eq;

    fn params(amplitude: f64, points_per_cycle: f64) -> PatternParams {
        PatternParams {
            amplitude,
            points_per_cycle,
            drill_axis: None,
        }
    }

    #[test]
    fn test_wave_cycles_with_index() {
        let cloud = plate();
        let waved = wave(&cloud, &params(0.5, 4.0)).unwrap();
        // index 1 is a quarter cycle, index 2 half, index 3 three quarters
        assert_relative_eq!(waved[0].z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(waved[1].z, 0.5, epsilon = 1e-12);
        assert_relative_eq!(waved[2].z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(waved[3].z, -0.5, epsilon = 1e-12);
        assert_relative_eq!(waved[5].z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sinusoidal_follows_drill_axis() {
        let cloud = plate();
        // 33 points, 66 per cycle: half a cycle over the x extent
        let shaped = sinusoidal(&cloud, &params(1.0, 66.0)).unwrap();
        for (a, b) in cloud.points().iter().zip(&shaped) {
            let expected = (TAU * 0.5 * a.x / 10.0).sin();
            assert_relative_eq!(b.z, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_oval_two_lobes_per_turn() {
        let cloud = plate();
        let ovalized = oval(
            &cloud,
            &PatternParams {
                drill_axis: Some(Axis::Z),
                ..params(1.0, 1.0)
            },
        )
        .unwrap();
        // (10, 1) sits at angle 0 around the centre (5, 1), (0, 1) at pi
        let at = |x: f64, y: f64| {
            cloud
                .points()
                .iter()
                .position(|p| *p == Point3::new(x, y, 0.0))
                .unwrap()
        };
        assert_relative_eq!(ovalized[at(10.0, 1.0)].z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ovalized[at(0.0, 1.0)].z, 0.0, epsilon = 1e-12);
        // (6, 2) at 45 degrees is a quarter cycle
        assert_relative_eq!(ovalized[at(6.0, 2.0)].z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_frequency() {
        assert!(matches!(wave(&plate(), &params(1.0, 0.0)), Err(Error::InvalidParameter(_))));
        assert!(matches!(oval(&plate(), &params(1.0, -2.0)), Err(Error::InvalidParameter(_))));
        assert!(matches!(
            sinusoidal(&plate(), &params(f64::NAN, 2.0)),
            Err(Error::InvalidParameter(_))
        ));
    }
}
