// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discretize the shared test models.

use approx::assert_relative_eq;
use iges_lite_core::{decode_file, EntityTable, SequenceNumber};
use iges_lite_geometry::{
    discretize_face, parse_pcd, serialize, DiscretizationRequest, Error, FacePointCloud,
};
use std::fs;
use std::path::PathBuf;

fn load(name: &str) -> EntityTable {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/models")
        .join(name);
    let bytes = fs::read(&path)
        .unwrap_or_else(|e| panic!("Test model not found at {}: {}", path.display(), e));
    decode_file(&bytes).expect("model should decode")
}

fn planar(table: &EntityTable, face: u32, precision: u32) -> FacePointCloud {
    let request = DiscretizationRequest::planar(precision).unwrap();
    discretize_face(SequenceNumber(face), table, &request).unwrap()
}

#[test]
fn test_plate_with_hole() {
    let table = load("plate_with_hole.igs");
    let cloud = planar(&table, 11, 5);

    assert_eq!(cloud.face(), SequenceNumber(11));
    assert_eq!(cloud.len(), 12);
    for p in cloud.points() {
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
        assert!(p.x > 0.0 && p.x < 10.0 && p.y > 0.0 && p.y < 10.0);
        let in_hole = p.x > 3.0 && p.x < 7.0 && p.y > 3.0 && p.y < 7.0;
        assert!(!in_hole, "{:?} lies in the hole", p);
    }
    for n in cloud.normals() {
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.z.abs(), 1.0, epsilon = 1e-12);
    }
    assert_relative_eq!(cloud.bounds().max.x, 10.0);
}

#[test]
fn test_planar_surface_ignores_parametric_flag() {
    let table = load("plate_with_hole.igs");
    let request = DiscretizationRequest::new(5, 0.05, 6, 6, true).unwrap();
    let cloud = discretize_face(SequenceNumber(11), &table, &request).unwrap();
    assert_eq!(cloud.len(), 12);
}

#[test]
fn test_square_lattice() {
    let table = load("square_and_triangle.igs");
    let cloud = planar(&table, 9, 5);

    assert_eq!(cloud.len(), 16);
    for p in cloud.points() {
        for c in [p.x, p.y] {
            let nearest = [2.0, 4.0, 6.0, 8.0]
                .into_iter()
                .map(|g| (g - c).abs())
                .fold(f64::INFINITY, f64::min);
            assert!(nearest < 1e-9, "{:?} is off the lattice", p);
        }
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_split_edge_square() {
    // (0,0) (5,0) (10,0) start the boundary on one line
    let table = load("split_edge_square.igs");
    let cloud = planar(&table, 7, 5);

    assert_eq!(cloud.len(), 16);
    for p in cloud.points() {
        for c in [p.x, p.y] {
            assert!([2.0, 4.0, 6.0, 8.0].iter().any(|g| (g - c).abs() < 1e-9), "{:?}", p);
        }
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_triangle() {
    let table = load("square_and_triangle.igs");

    // a single cell has no interior lattice lines
    assert!(planar(&table, 11, 1).is_empty());

    // spacing 1 on the 4 x 3 triangle keeps (21,1), (22,1) and (21,2)
    let cloud = planar(&table, 11, 4);
    assert_eq!(cloud.len(), 3);
    for p in cloud.points() {
        assert!((p.x - 20.0) / 4.0 + p.y / 3.0 < 1.0);
    }
}

#[test]
fn test_curved_patch_parametric() {
    let table = load("curved_patch.igs");
    let request = DiscretizationRequest::new(10, 0.05, 5, 5, true).unwrap();
    let cloud = discretize_face(SequenceNumber(9), &table, &request).unwrap();

    assert_eq!(cloud.len(), 25);
    for (p, n) in cloud.points().iter().zip(cloud.normals()) {
        assert_relative_eq!(p.z, p.x * p.y / 20.0, epsilon = 1e-9);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-9);
    }
    assert_relative_eq!(cloud.points()[0].coords.norm(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(cloud.points()[24].z, 5.0, epsilon = 1e-9);
}

#[test]
fn test_curved_edge_samples_bound_the_face() {
    let table = load("curved_patch.igs");
    let cloud = planar(&table, 9, 10);

    assert!(!cloud.is_empty());
    // the arc edge bulges out to x = -2
    assert!(cloud.bounds().min.x < -1.9, "bounds {:?}", cloud.bounds());
    assert!(cloud.bounds().min.x > -2.0 - 1e-9);
}

#[test]
fn test_open_loop_is_reported() {
    let table = load("open_loop.igs");
    let request = DiscretizationRequest::planar(5).unwrap();
    match discretize_face(SequenceNumber(7), &table, &request) {
        Err(Error::UnclosableLoop { face, remaining }) => {
            assert_eq!(face, 7);
            assert_eq!(remaining, 2);
        }
        other => panic!("expected UnclosableLoop, got {:?}", other),
    }
}

#[test]
fn test_face_pointer_must_name_a_face() {
    let table = load("plate_with_hole.igs");
    let request = DiscretizationRequest::planar(5).unwrap();
    let err = discretize_face(SequenceNumber(5), &table, &request).unwrap_err();
    assert!(matches!(
        err,
        Error::CoreError(iges_lite_core::Error::PointerResolution { pointer: 5, .. })
    ));
}

#[test]
fn test_pcd_round_trip() {
    let table = load("square_and_triangle.igs");
    let clouds = vec![planar(&table, 9, 5), planar(&table, 11, 4)];
    let text = String::from_utf8(serialize(&clouds)).unwrap();

    assert!(text.contains("\nPOINTS 19\n"));
    let points = parse_pcd(&text).unwrap();
    let expected: Vec<_> = clouds.iter().flat_map(|c| c.points().iter().copied()).collect();
    assert_eq!(points, expected);
}
