// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IGES-Lite Geometry
//!
//! Turns decoded IGES faces into point clouds and perturbs them:
//!
//! - [`nurbs`]: rational B-spline curve and surface evaluation
//! - [`polygon`]: even-odd point classification
//! - [`discretize`]: planar lattice and parametric face sampling
//! - [`pcd`]: ASCII PCD output
//! - [`defects`]: deterministic point-cloud perturbations
//!
//! ```no_run
//! use iges_lite_geometry::{discretize_face, pcd, DiscretizationRequest};
//!
//! let bytes = std::fs::read("part.igs")?;
//! let table = iges_lite_core::decode_file(&bytes)?;
//! let request = DiscretizationRequest::planar(10)?;
//! let clouds = table
//!     .faces()
//!     .map(|face| discretize_face(face.seq(), &table, &request))
//!     .collect::<Result<Vec<_>, _>>()?;
//! pcd::write_pcd("part.pcd", &clouds)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod defects;
pub mod discretize;
pub mod error;
pub mod frame;
pub mod nurbs;
pub mod pcd;
pub mod point_cloud;
pub mod polygon;
pub mod request;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

pub use defects::{
    apply_defect, BeamParams, Defect, DeflectionPredictor, FeatureRange, PatternParams,
    ReferencePlane, SpindleParams,
};
pub use discretize::{discretize, discretize_face};
pub use error::{Error, Result};
pub use frame::FaceFrame;
pub use nurbs::{NurbsCurve, NurbsSurface, SurfaceSample};
pub use pcd::{parse_pcd, serialize, write_pcd};
pub use point_cloud::{Axis, BoundingBox, FacePointCloud};
pub use polygon::inside;
pub use request::DiscretizationRequest;
