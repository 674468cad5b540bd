// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local orthonormal frame of a planar face

use nalgebra::{Matrix3, Point2, Point3, Vector3};

/// Cross products shorter than this mean the defining points are colinear
const COLINEAR_EPSILON: f64 = 1e-12;

/// Origin plus orthonormal axes `i`, `j`, `k` (`k` is the face normal)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFrame {
    pub origin: Point3<f64>,
    pub i: Vector3<f64>,
    pub j: Vector3<f64>,
    pub k: Vector3<f64>,
}

impl FaceFrame {
    /// Frame from three boundary vertices: `i = v0 - v1`, `j = v0 - v2`,
    /// `k = i x j`. Gram-Schmidt keeps `i` and removes its component from `j`.
    ///
    /// Returns `None` when the vertices are colinear.
    pub fn from_points(v0: &Point3<f64>, v1: &Point3<f64>, v2: &Point3<f64>) -> Option<Self> {
        let i = v0 - v1;
        let j = v0 - v2;
        let k = i.cross(&j);

        let i_len = i.norm();
        let k_len = k.norm();
        if i_len < COLINEAR_EPSILON || k_len < COLINEAR_EPSILON * i_len.max(1.0) {
            return None;
        }

        let i = i / i_len;
        let j = j - i * j.dot(&i);
        let j_len = j.norm();
        if j_len < COLINEAR_EPSILON {
            return None;
        }

        Some(Self {
            origin: *v0,
            i,
            j: j / j_len,
            k: k / k_len,
        })
    }

    /// Columns `i`, `j`, `k`
    pub fn basis(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.i, self.j, self.k])
    }

    /// Frame coordinates of a world point
    pub fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        // the basis is orthonormal, its inverse is the transpose
        Point3::from(self.basis().transpose() * (p - self.origin))
    }

    /// World point of frame coordinates
    pub fn to_world(&self, local: &Point3<f64>) -> Point3<f64> {
        self.origin + self.basis() * local.coords
    }

    /// World point of an in-plane position at height `z` along `k`
    pub fn plane_point(&self, p: &Point2<f64>, z: f64) -> Point3<f64> {
        self.to_world(&Point3::new(p.x, p.y, z))
    }
}
