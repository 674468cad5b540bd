// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flexion and torsion of a face treated as a beam along its long axis

use nalgebra::{Point3, Rotation3, Unit};

use super::finite;
use crate::error::{Error, Result};
use crate::point_cloud::{Axis, FacePointCloud};

/// Beam deformation settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeamParams {
    pub long_axis: Axis,
    pub perpendicular_axis: Axis,
    /// Deflection at the free end (flexion) or at the perpendicular
    /// half-width (torsion)
    pub max_deflection: f64,
}

impl BeamParams {
    fn validate(&self) -> Result<f64> {
        if self.long_axis == self.perpendicular_axis {
            return Err(Error::invalid(format!(
                "long and perpendicular axes are both {:?}",
                self.long_axis
            )));
        }
        finite("maximum deflection", self.max_deflection)
    }
}

/// Cantilever cubic, 0 at the clamped end and `delta` at the free end
#[inline]
fn cantilever(delta: f64, xi: f64) -> f64 {
    delta * xi * xi * (3.0 - xi) / 2.0
}

pub(super) fn flexion(cloud: &FacePointCloud, params: &BeamParams) -> Result<Vec<Point3<f64>>> {
    let delta = params.validate()?;
    if delta == 0.0 {
        return Ok(cloud.points().to_vec());
    }

    let bounds = cloud.bounds();
    let perpendicular = params.perpendicular_axis.index();
    Ok(cloud
        .points()
        .iter()
        .map(|p| {
            let xi = bounds.normalized(p, params.long_axis);
            let mut q = *p;
            q[perpendicular] += cantilever(delta, xi);
            q
        })
        .collect())
}

pub(super) fn torsion(cloud: &FacePointCloud, params: &BeamParams) -> Result<Vec<Point3<f64>>> {
    let delta = params.validate()?;
    if delta == 0.0 {
        return Ok(cloud.points().to_vec());
    }

    let bounds = cloud.bounds();
    let radius = bounds.extent()[params.perpendicular_axis.index()] / 2.0;
    let max_angle = delta.atan2(radius);
    let axis = Unit::new_normalize(params.long_axis.unit());
    let centre = bounds.center();

    Ok(cloud
        .points()
        .iter()
        .map(|p| {
            let xi = bounds.normalized(p, params.long_axis);
            let twist = Rotation3::from_axis_angle(&axis, xi * max_angle);
            centre + twist * (p - centre)
        })
        .collect())
}
