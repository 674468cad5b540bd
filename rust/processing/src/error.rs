// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for sessions, configuration and job files.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Decode error: {0}")]
    Core(#[from] iges_lite_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] iges_lite_geometry::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Job file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
