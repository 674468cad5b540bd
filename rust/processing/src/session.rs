// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Caller-owned processing state for one model.
//!
//! A [`Session`] owns the decoded entity table, the discretization request and
//! the current point cloud of every discretized face. Faces are discretized in
//! parallel; a defect replaces the face's cloud with a fully built new one.

use std::path::Path;
use std::time::Instant;

use iges_lite_core::{EntityTable, SequenceNumber};
use iges_lite_geometry::{
    apply_defect, discretize_face, pcd, Defect, DeflectionPredictor, DiscretizationRequest,
    FacePointCloud,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::Result;

/// A face that could not be discretized.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceFailure {
    pub face: SequenceNumber,
    pub reason: String,
}

/// Outcome of [`Session::discretize_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Faces with a cloud, in sequence order.
    pub discretized: Vec<SequenceNumber>,
    pub failed: Vec<FaceFailure>,
    pub total_points: usize,
    pub elapsed_ms: u64,
}

pub struct Session {
    table: EntityTable,
    request: DiscretizationRequest,
    predictor: Option<Box<dyn DeflectionPredictor>>,
    clouds: FxHashMap<SequenceNumber, FacePointCloud>,
}

impl Session {
    pub fn new(table: EntityTable, request: DiscretizationRequest) -> Self {
        Self {
            table,
            request,
            predictor: None,
            clouds: FxHashMap::default(),
        }
    }

    /// Decode a file's bytes into a new session.
    pub fn load(bytes: &[u8], request: DiscretizationRequest) -> Result<Self> {
        let table = iges_lite_core::decode_file(bytes)?;
        Ok(Self::new(table, request))
    }

    pub fn open(path: impl AsRef<Path>, request: DiscretizationRequest) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::load(&bytes, request)
    }

    /// Model used by spindle defects.
    pub fn with_predictor(mut self, predictor: impl DeflectionPredictor + 'static) -> Self {
        self.predictor = Some(Box::new(predictor));
        self
    }

    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    pub fn request(&self) -> &DiscretizationRequest {
        &self.request
    }

    /// Use `request` from the next discretization on; current clouds stay.
    pub fn set_request(&mut self, request: DiscretizationRequest) {
        self.request = request;
    }

    /// Face sequence numbers in directory order.
    pub fn face_ids(&self) -> Vec<SequenceNumber> {
        self.table.faces().map(|face| face.seq()).collect()
    }

    /// Discretize every face of the model.
    ///
    /// Failures are reported per face and drop that face's previous cloud;
    /// other clouds stay intact.
    pub fn discretize_all(&mut self) -> BatchReport {
        let start = Instant::now();
        let faces = self.face_ids();

        let table = &self.table;
        let request = &self.request;
        let results: Vec<_> = faces
            .par_iter()
            .map(|&seq| (seq, discretize_face(seq, table, request)))
            .collect();

        let mut report = BatchReport::default();
        for (seq, result) in results {
            match result {
                Ok(cloud) => {
                    report.total_points += cloud.len();
                    report.discretized.push(seq);
                    self.clouds.insert(seq, cloud);
                }
                Err(e) => {
                    tracing::warn!(face = seq.get(), error = %e, "face discretization failed");
                    self.clouds.remove(&seq);
                    report.failed.push(FaceFailure {
                        face: seq,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            faces = faces.len(),
            discretized = report.discretized.len(),
            failed = report.failed.len(),
            points = report.total_points,
            elapsed_ms = report.elapsed_ms,
            "batch discretization complete"
        );
        report
    }

    /// Discretize one face, replacing any previous cloud.
    pub fn discretize_face(&mut self, face: SequenceNumber) -> Result<&FacePointCloud> {
        let cloud = match discretize_face(face, &self.table, &self.request) {
            Ok(cloud) => cloud,
            Err(e) => {
                self.clouds.remove(&face);
                return Err(e.into());
            }
        };
        self.clouds.insert(face, cloud);
        Ok(&self.clouds[&face])
    }

    /// Replace a face's cloud with its perturbed version.
    pub fn apply_defect(&mut self, face: SequenceNumber, defect: &Defect) -> Result<&FacePointCloud> {
        let current = self
            .clouds
            .get(&face)
            .ok_or(iges_lite_geometry::Error::SurfaceNotDiscretized(face.get()))?;
        let next = apply_defect(defect, current, self.predictor.as_deref())?;
        self.clouds.insert(face, next);
        Ok(&self.clouds[&face])
    }

    pub fn cloud(&self, face: SequenceNumber) -> Option<&FacePointCloud> {
        self.clouds.get(&face)
    }

    /// All clouds in face sequence order.
    pub fn clouds(&self) -> Vec<&FacePointCloud> {
        let mut clouds: Vec<_> = self.clouds.values().collect();
        clouds.sort_by_key(|cloud| cloud.face());
        clouds
    }

    /// PCD document of all clouds.
    pub fn to_pcd(&self) -> Vec<u8> {
        let clouds = self.clouds();
        pcd::serialize_points(clouds.iter().flat_map(|cloud| cloud.points().iter())).into_bytes()
    }

    pub fn write_pcd(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_pcd())?;
        Ok(())
    }
}
