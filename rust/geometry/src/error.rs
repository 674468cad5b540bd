// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during evaluation, discretization and defects
#[derive(Error, Debug)]
pub enum Error {
    #[error("Face {face}: boundary loop cannot be closed ({remaining} edge chains left unmatched)")]
    UnclosableLoop { face: u32, remaining: usize },

    #[error("Rational denominator vanishes at parameter {parameter}")]
    DegenerateWeight { parameter: f64 },

    #[error("Surface normal vanishes at (u={u}, v={v})")]
    DegenerateNormal { u: f64, v: f64 },

    #[error("Invalid knot vector: {0}")]
    InvalidKnotVector(String),

    #[error("Face {0} has not been discretized")]
    SurfaceNotDiscretized(u32),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid discretization request: {0}")]
    InvalidRequest(String),

    #[error("PCD format error: {0}")]
    Pcd(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core parser error: {0}")]
    CoreError(#[from] iges_lite_core::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParameter(message.into())
    }
}
