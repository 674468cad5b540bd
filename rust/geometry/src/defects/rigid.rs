// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation and rotation

use nalgebra::{Point3, Rotation3, Vector3};

use super::{finite, finite_vector};
use crate::error::{Error, Result};
use crate::point_cloud::FacePointCloud;

pub(super) fn translate(
    cloud: &FacePointCloud,
    direction: &[f64; 3],
    offset: f64,
) -> Result<Vec<Point3<f64>>> {
    let direction = finite_vector("translation direction", direction)?;
    let offset = finite("translation offset", offset)?;
    let unit = direction
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| Error::invalid("translation direction is the zero vector"))?;

    let shift = unit * offset;
    Ok(cloud.points().iter().map(|p| p + shift).collect())
}

/// `R = Rx * Ry * Rz`, angles in degrees
pub(super) fn rotation_matrix(angles: &Vector3<f64>) -> Rotation3<f64> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.x.to_radians());
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.y.to_radians());
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.z.to_radians());
    rx * ry * rz
}

pub(super) fn rotate(cloud: &FacePointCloud, angles: &[f64; 3]) -> Result<Vec<Point3<f64>>> {
    let angles = finite_vector("rotation angle", angles)?;
    if cloud.is_empty() {
        return Ok(Vec::new());
    }

    let rotation = rotation_matrix(&angles);
    let pivot = cloud.bounds().center();
    Ok(cloud
        .points()
        .iter()
        .map(|p| pivot + rotation * (p - pivot))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::tests::plate;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translate_normalizes_direction() {
        let cloud = plate();
        let moved = translate(&cloud, &[3.0, 4.0, 0.0], 5.0).unwrap();
        for (a, b) in cloud.points().iter().zip(&moved) {
            assert_relative_eq!(b - a, Vector3::new(3.0, 4.0, 0.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(matches!(
            translate(&plate(), &[0.0, 0.0, 0.0], 1.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            translate(&plate(), &[1.0, 0.0, 0.0], f64::NAN),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rotate_about_bbox_centre() {
        let cloud = plate();
        // centre is (5, 1, 0); a quarter turn about z maps (10, 1) to (5, 6)
        let rotated = rotate(&cloud, &[0.0, 0.0, 90.0]).unwrap();
        let idx = cloud
            .points()
            .iter()
            .position(|p| *p == Point3::new(10.0, 1.0, 0.0))
            .unwrap();
        assert_relative_eq!(rotated[idx], Point3::new(5.0, 6.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_order() {
        let angles = Vector3::new(30.0, 45.0, 60.0);
        let r = rotation_matrix(&angles);
        let expected = Rotation3::from_axis_angle(&Vector3::x_axis(), 30f64.to_radians())
            * Rotation3::from_axis_angle(&Vector3::y_axis(), 45f64.to_radians())
            * Rotation3::from_axis_angle(&Vector3::z_axis(), 60f64.to_radians());
        assert_relative_eq!(r.matrix(), expected.matrix(), epsilon = 1e-12);
    }
}
