// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IGES-Lite processing pipeline
//!
//! Ties decoding, discretization and defects together for callers that keep a
//! model open (a viewer) or convert files in one go (the `iges-to-pcd` tool).

pub mod config;
pub mod error;
pub mod job;
pub mod session;
pub mod summary;

pub use config::Config;
pub use error::{Error, Result};
pub use job::{FaceDefect, Job};
pub use session::{BatchReport, FaceFailure, Session};
pub use summary::{FaceSummary, ModelInfo, RunSummary};
