// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration loaded from environment variables.

use iges_lite_geometry::DiscretizationRequest;

use crate::error::{Error, Result};

/// Run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Grid cells along the longest side of a planar face.
    pub precision: u32,
    /// Normalized parameter step for boundary curves.
    pub curve_delta: f64,
    /// Parametric samples along u.
    pub u_samples: usize,
    /// Parametric samples along v.
    pub v_samples: usize,
    /// Sample curved B-spline faces in (u, v).
    pub parametric: bool,
    /// Number of worker threads for batch discretization.
    pub worker_threads: usize,
    /// `tracing` filter directive.
    pub log_filter: String,
}

fn parsed<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("on")
    )
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            precision: parsed(var("IGES_PRECISION"), 10),
            curve_delta: parsed(var("IGES_CURVE_DELTA"), 0.05),
            u_samples: parsed(var("IGES_U_SAMPLES"), 20),
            v_samples: parsed(var("IGES_V_SAMPLES"), 20),
            parametric: flag(var("IGES_PARAMETRIC")),
            worker_threads: parsed(var("IGES_WORKER_THREADS"), num_cpus::get()).max(1),
            log_filter: var("RUST_LOG").unwrap_or_else(|| "info".into()),
        }
    }

    /// Validated discretization request.
    pub fn request(&self) -> Result<DiscretizationRequest> {
        Ok(DiscretizationRequest::new(
            self.precision,
            self.curve_delta,
            self.u_samples,
            self.v_samples,
            self.parametric,
        )?)
    }

    /// Override the parametric sample counts, as `--uv U V` does.
    pub fn set_uv(&mut self, u: &str, v: &str) -> Result<()> {
        let parse = |s: &str| {
            s.parse::<usize>()
                .map_err(|_| Error::Config(format!("invalid sample count {:?}", s)))
        };
        self.u_samples = parse(u)?;
        self.v_samples = parse(v)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: FxHashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.precision, 10);
        assert_eq!(config.curve_delta, 0.05);
        assert_eq!((config.u_samples, config.v_samples), (20, 20));
        assert!(!config.parametric);
        assert!(config.worker_threads >= 1);
        assert_eq!(config.log_filter, "info");
        assert!(config.request().is_ok());
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = config(&[
            ("IGES_PRECISION", "25"),
            ("IGES_CURVE_DELTA", "not a number"),
            ("IGES_PARAMETRIC", "true"),
            ("IGES_WORKER_THREADS", "0"),
        ]);
        assert_eq!(config.precision, 25);
        assert_eq!(config.curve_delta, 0.05);
        assert!(config.parametric);
        assert_eq!(config.worker_threads, 1);
    }

    #[test]
    fn test_out_of_range_rejected_at_request() {
        let config = config(&[("IGES_PRECISION", "80")]);
        assert!(matches!(
            config.request(),
            Err(Error::Geometry(iges_lite_geometry::Error::InvalidRequest(_)))
        ));
    }

    #[test]
    fn test_set_uv() {
        let mut config = config(&[]);
        config.set_uv("8", "12").unwrap();
        assert_eq!((config.u_samples, config.v_samples), (8, 12));
        assert!(matches!(config.set_uv("8", "x"), Err(Error::Config(_))));
    }
}
