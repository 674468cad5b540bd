// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-face point clouds

use iges_lite_core::SequenceNumber;
use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.index()] = 1.0;
        v
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Box containing nothing; grows with [`BoundingBox::include`]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.include(p);
        }
        bounds
    }

    pub fn include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Axis of the largest extent (first one on ties)
    pub fn longest_axis(&self) -> Axis {
        let extent = self.extent();
        let mut best = Axis::X;
        for axis in [Axis::Y, Axis::Z] {
            if extent[axis.index()] > extent[best.index()] {
                best = axis;
            }
        }
        best
    }

    /// Position of `p` along `axis`, 0 at `min` and 1 at `max`
    pub fn normalized(&self, p: &Point3<f64>, axis: Axis) -> f64 {
        let i = axis.index();
        let span = self.max[i] - self.min[i];
        if span.abs() < f64::EPSILON {
            0.0
        } else {
            (p[i] - self.min[i]) / span
        }
    }
}

/// Discretized face: points with parallel unit normals
#[derive(Debug, Clone, PartialEq)]
pub struct FacePointCloud {
    face: SequenceNumber,
    points: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
    /// World bounds of the face boundary (or samples) at discretization time
    bounds: BoundingBox,
}

impl FacePointCloud {
    pub fn new(
        face: SequenceNumber,
        points: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
        bounds: BoundingBox,
    ) -> Result<Self> {
        if points.len() != normals.len() {
            return Err(Error::invalid(format!(
                "{} points but {} normals",
                points.len(),
                normals.len()
            )));
        }
        Ok(Self {
            face,
            points,
            normals,
            bounds,
        })
    }

    /// Cloud of a degenerate face
    pub fn empty(face: SequenceNumber) -> Self {
        Self {
            face,
            points: Vec::new(),
            normals: Vec::new(),
            bounds: BoundingBox::empty(),
        }
    }

    #[inline]
    pub fn face(&self) -> SequenceNumber {
        self.face
    }

    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    #[inline]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    #[inline]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Same face, normals and bounds with new point positions
    pub fn with_points(&self, points: Vec<Point3<f64>>) -> Result<Self> {
        Self::new(self.face, points, self.normals.clone(), self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let points = [
            Point3::new(0.0, 1.0, 2.0),
            Point3::new(4.0, -1.0, 2.5),
            Point3::new(2.0, 0.0, 3.0),
        ];
        let bounds = BoundingBox::from_points(&points);
        assert_eq!(bounds.min, Point3::new(0.0, -1.0, 2.0));
        assert_eq!(bounds.max, Point3::new(4.0, 1.0, 3.0));
        assert_eq!(bounds.center(), Point3::new(2.0, 0.0, 2.5));
        assert_eq!(bounds.longest_axis(), Axis::X);
        assert_eq!(bounds.normalized(&points[2], Axis::X), 0.5);
        assert!(!bounds.is_empty());
        assert!(BoundingBox::empty().is_empty());
    }

    #[test]
    fn test_cloud_lengths_must_match() {
        let cloud = FacePointCloud::new(
            SequenceNumber(1),
            vec![Point3::origin()],
            vec![],
            BoundingBox::empty(),
        );
        assert!(matches!(cloud, Err(Error::InvalidParameter(_))));
    }
}
