// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face Discretizer
//!
//! Planar path:
//! 1. walk the outer loop into a closed boundary polygon
//! 2. build an orthonormal frame from its first two vertices and the first
//!    vertex off their line
//! 3. project boundary and holes into the frame plane
//! 4. keep lattice points inside the boundary and outside every hole
//! 5. map the survivors back to world space with the frame normal
//!
//! Curved B-spline surfaces can instead be sampled directly in `(u, v)` when
//! the request asks for parametric sampling.

pub mod boundary;
pub mod grid;

use iges_lite_core::{EntityTable, Face, SequenceNumber};
use nalgebra::{Point2, Point3};

use crate::error::Result;
use crate::frame::FaceFrame;
use crate::nurbs::NurbsSurface;
use crate::point_cloud::{BoundingBox, FacePointCloud};
use crate::request::DiscretizationRequest;

/// Relative flatness tolerance for choosing parametric sampling
pub const PLANAR_TOLERANCE: f64 = 1e-6;

/// Discretize the face with sequence number `face_seq`
pub fn discretize_face(
    face_seq: SequenceNumber,
    table: &EntityTable,
    request: &DiscretizationRequest,
) -> Result<FacePointCloud> {
    let face = table.face(face_seq)?;
    discretize(face, table, request)
}

/// Discretize one face
pub fn discretize(
    face: &Face,
    table: &EntityTable,
    request: &DiscretizationRequest,
) -> Result<FacePointCloud> {
    let seq = face.seq();

    if request.parametric() {
        if let Some(surface) = curved_surface(face, table)? {
            return sample_surface(seq, &surface, request);
        }
    }

    let Some(outer_seq) = face.outer_loop() else {
        tracing::debug!(face = seq.get(), "face has no loops");
        return Ok(FacePointCloud::empty(seq));
    };

    let outer = boundary::loop_polygon(table, outer_seq, seq, request.curve_delta())?;
    if outer.len() < 3 {
        tracing::debug!(face = seq.get(), vertices = outer.len(), "degenerate boundary");
        return Ok(FacePointCloud::empty(seq));
    }

    let Some(frame) = boundary_frame(&outer) else {
        tracing::debug!(face = seq.get(), "boundary vertices are colinear");
        return Ok(FacePointCloud::empty(seq));
    };

    let local: Vec<Point3<f64>> = outer.iter().map(|p| frame.to_local(p)).collect();
    // best-fit plane offset along the normal
    let height = local.iter().map(|p| p.z).sum::<f64>() / local.len() as f64;
    let outer_2d: Vec<Point2<f64>> = local.iter().map(|p| p.xy()).collect();

    let mut holes = Vec::with_capacity(face.inner_loops().len());
    for &hole_seq in face.inner_loops() {
        let hole = boundary::loop_polygon(table, hole_seq, seq, request.curve_delta())?;
        if hole.len() >= 3 {
            holes.push(hole.iter().map(|p| frame.to_local(p).xy()).collect::<Vec<_>>());
        }
    }

    let grid = grid::interior_points(&outer_2d, &holes, request.precision());
    let points: Vec<Point3<f64>> = grid.iter().map(|p| frame.plane_point(p, height)).collect();
    let normals = vec![frame.k; points.len()];

    tracing::debug!(
        face = seq.get(),
        boundary = outer.len(),
        holes = holes.len(),
        points = points.len(),
        "discretized planar face"
    );

    FacePointCloud::new(seq, points, normals, BoundingBox::from_points(&outer))
}

/// Frame from `v0`, `v1` and the first later vertex off their line
fn boundary_frame(outer: &[Point3<f64>]) -> Option<FaceFrame> {
    let (v0, v1) = (outer.first()?, outer.get(1)?);
    outer[2..]
        .iter()
        .find_map(|vk| FaceFrame::from_points(v0, v1, vk))
}

/// The face's B-spline surface when it is not planar
fn curved_surface(face: &Face, table: &EntityTable) -> Result<Option<NurbsSurface>> {
    if face.surface.is_null() {
        return Ok(None);
    }
    let Some(entity) = table.try_resolve(face.surface)? else {
        return Ok(None);
    };
    let Some(surface) = entity.as_surface() else {
        return Ok(None);
    };

    let surface = NurbsSurface::from_entity(surface)?;
    let extent = BoundingBox::from_points(&surface.control_points())
        .extent()
        .norm();
    if surface.is_planar(PLANAR_TOLERANCE * extent.max(1.0)) {
        Ok(None)
    } else {
        Ok(Some(surface))
    }
}

/// Sample the whole surface domain with per-sample normals
fn sample_surface(
    seq: SequenceNumber,
    surface: &NurbsSurface,
    request: &DiscretizationRequest,
) -> Result<FacePointCloud> {
    let (u_samples, v_samples) = request.uv_samples();
    let mut points = Vec::with_capacity(u_samples * v_samples);
    let mut normals = Vec::with_capacity(u_samples * v_samples);

    for sample in surface.grid(u_samples, v_samples)? {
        let sample = sample?;
        points.push(sample.point);
        normals.push(sample.normal);
    }

    tracing::debug!(
        face = seq.get(),
        u_samples,
        v_samples,
        "sampled curved face parametrically"
    );

    let bounds = BoundingBox::from_points(&points);
    FacePointCloud::new(seq, points, normals, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_skips_colinear_vertices() {
        let outer = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
        ];
        let frame = boundary_frame(&outer).unwrap();
        assert_eq!(frame.k.z.abs(), 1.0);

        let line = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
            Point3::new(3.0, 3.0, 3.0),
        ];
        assert!(boundary_frame(&line).is_none());
    }
}
