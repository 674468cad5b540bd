// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON summary of a conversion run.

use serde::{Deserialize, Serialize};

use crate::session::{BatchReport, Session};

/// Model information from the Global section and entity directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    pub file_name: String,
    pub system_id: String,
    pub unit_name: String,
    /// Millimetres per model unit when the unit is known.
    pub unit_scale_to_mm: Option<f64>,
    pub entity_count: usize,
    pub decoded_count: usize,
    /// Entity type codes left undecoded.
    pub unsupported_codes: Vec<i64>,
}

/// Per-face result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceSummary {
    pub face: u32,
    pub points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whole-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub model: ModelInfo,
    pub request: iges_lite_geometry::DiscretizationRequest,
    pub faces: Vec<FaceSummary>,
    pub total_points: usize,
    pub defects_applied: usize,
    pub parse_time_ms: u64,
    pub discretize_time_ms: u64,
}

impl RunSummary {
    pub fn new(session: &Session, report: &BatchReport, parse_time_ms: u64) -> Self {
        let table = session.table();
        let global = table.global();

        let mut faces: Vec<FaceSummary> = session
            .clouds()
            .into_iter()
            .map(|cloud| FaceSummary {
                face: cloud.face().get(),
                points: cloud.len(),
                error: None,
            })
            .chain(report.failed.iter().map(|failure| FaceSummary {
                face: failure.face.get(),
                points: 0,
                error: Some(failure.reason.clone()),
            }))
            .collect();
        faces.sort_by_key(|face| face.face);

        Self {
            model: ModelInfo {
                file_name: global.file_name.clone(),
                system_id: global.system_id.clone(),
                unit_name: global.unit_name.clone(),
                unit_scale_to_mm: global.unit_scale_to_mm(),
                entity_count: table.len(),
                decoded_count: table.decoded_count(),
                unsupported_codes: table.unsupported_codes(),
            },
            request: *session.request(),
            total_points: faces.iter().map(|face| face.points).sum(),
            faces,
            defects_applied: 0,
            parse_time_ms,
            discretize_time_ms: report.elapsed_ms,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
