// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON job files: request overrides plus defects to apply per face.
//!
//! ```json
//! {
//!   "precision": 20,
//!   "parametric": true,
//!   "defects": [
//!     { "face": 11, "defect": { "kind": "rotate", "angles": [0, 0, 15] } },
//!     { "face": 11, "defect": { "kind": "jitter", "min_offset": 0.01, "max_offset": 0.05, "seed": 7 } }
//!   ]
//! }
//! ```

use std::path::Path;

use iges_lite_geometry::Defect;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;

/// A defect bound to the face it perturbs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDefect {
    /// Face sequence number.
    pub face: u32,
    pub defect: Defect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub curve_delta: Option<f64>,
    #[serde(default)]
    pub u_samples: Option<usize>,
    #[serde(default)]
    pub v_samples: Option<usize>,
    #[serde(default)]
    pub parametric: Option<bool>,
    /// Applied in order after discretization.
    #[serde(default)]
    pub defects: Vec<FaceDefect>,
}

impl Job {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Overlay the job's request settings onto `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(precision) = self.precision {
            config.precision = precision;
        }
        if let Some(delta) = self.curve_delta {
            config.curve_delta = delta;
        }
        if let Some(u) = self.u_samples {
            config.u_samples = u;
        }
        if let Some(v) = self.v_samples {
            config.v_samples = v;
        }
        if let Some(parametric) = self.parametric {
            config.parametric = parametric;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iges_lite_geometry::{Axis, BeamParams};

    #[test]
    fn test_parse_job() {
        let job = Job::from_json(
            r#"{
                "precision": 20,
                "defects": [
                    { "face": 11, "defect": { "kind": "translate", "direction": [0, 0, 1], "offset": 0.5 } },
                    { "face": 11, "defect": { "kind": "flexion", "long_axis": "x",
                      "perpendicular_axis": "z", "max_deflection": 0.2 } },
                    { "face": 9, "defect": { "kind": "wave", "amplitude": 0.1, "points_per_cycle": 8 } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(job.precision, Some(20));
        assert_eq!(job.parametric, None);
        assert_eq!(job.defects.len(), 3);
        assert_eq!(
            job.defects[1].defect,
            Defect::Flexion(BeamParams {
                long_axis: Axis::X,
                perpendicular_axis: Axis::Z,
                max_deflection: 0.2,
            })
        );
        assert_eq!(job.defects[2].face, 9);
    }

    #[test]
    fn test_apply_to_config() {
        let mut config = Config::from_vars(|_| None);
        let job = Job {
            precision: Some(3),
            parametric: Some(true),
            ..Job::default()
        };
        job.apply_to(&mut config);
        assert_eq!(config.precision, 3);
        assert!(config.parametric);
        assert_eq!(config.curve_delta, 0.05);
    }

    #[test]
    fn test_unknown_defect_kind() {
        let result = Job::from_json(r#"{ "defects": [ { "face": 1, "defect": { "kind": "melt" } } ] }"#);
        assert!(matches!(result, Err(crate::Error::Json(_))));
    }
}
