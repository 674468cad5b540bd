// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discretization settings, validated once and immutable afterwards.

use crate::error::{Error, Result};

pub const MIN_PRECISION: u32 = 1;
pub const MAX_PRECISION: u32 = 50;
/// Smallest curve step; 10 000 steps per edge curve at most
pub const MIN_CURVE_DELTA: f64 = 1e-4;
pub const MIN_SAMPLES: usize = 2;
pub const MAX_SAMPLES: usize = 500;

/// How a face is turned into points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DiscretizationRequest {
    precision: u32,
    curve_delta: f64,
    u_samples: usize,
    v_samples: usize,
    parametric: bool,
}

impl DiscretizationRequest {
    /// Build a request.
    ///
    /// - `precision`: grid cells along the longest side of the face, `1..=50`
    /// - `curve_delta`: step of the normalized curve domain, `[1e-4, 1]`
    /// - `u_samples`, `v_samples`: parametric sample counts, `2..=500`
    /// - `parametric`: sample curved surfaces directly
    pub fn new(
        precision: u32,
        curve_delta: f64,
        u_samples: usize,
        v_samples: usize,
        parametric: bool,
    ) -> Result<Self> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(Error::InvalidRequest(format!(
                "precision must be in [{}, {}], got {}",
                MIN_PRECISION, MAX_PRECISION, precision
            )));
        }
        if !(MIN_CURVE_DELTA..=1.0).contains(&curve_delta) {
            return Err(Error::InvalidRequest(format!(
                "curve delta must be in [{}, 1], got {}",
                MIN_CURVE_DELTA, curve_delta
            )));
        }
        for (name, count) in [("u", u_samples), ("v", v_samples)] {
            if !(MIN_SAMPLES..=MAX_SAMPLES).contains(&count) {
                return Err(Error::InvalidRequest(format!(
                    "{} sample count must be in [{}, {}], got {}",
                    name, MIN_SAMPLES, MAX_SAMPLES, count
                )));
            }
        }
        Ok(Self {
            precision,
            curve_delta,
            u_samples,
            v_samples,
            parametric,
        })
    }

    /// Planar grid sampling only
    pub fn planar(precision: u32) -> Result<Self> {
        let defaults = Self::default();
        Self::new(
            precision,
            defaults.curve_delta,
            defaults.u_samples,
            defaults.v_samples,
            false,
        )
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    #[inline]
    pub fn curve_delta(&self) -> f64 {
        self.curve_delta
    }

    #[inline]
    pub fn uv_samples(&self) -> (usize, usize) {
        (self.u_samples, self.v_samples)
    }

    #[inline]
    pub fn parametric(&self) -> bool {
        self.parametric
    }
}

impl Default for DiscretizationRequest {
    fn default() -> Self {
        Self {
            precision: 10,
            curve_delta: 0.05,
            u_samples: 20,
            v_samples: 20,
            parametric: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(DiscretizationRequest::new(1, 1.0, 2, 2, false).is_ok());
        assert!(DiscretizationRequest::new(50, 0.001, 500, 500, true).is_ok());
        assert!(DiscretizationRequest::new(0, 0.05, 20, 20, false).is_err());
        assert!(DiscretizationRequest::new(51, 0.05, 20, 20, false).is_err());
        assert!(DiscretizationRequest::new(10, 0.0, 20, 20, false).is_err());
        assert!(DiscretizationRequest::new(10, f64::NAN, 20, 20, false).is_err());
        assert!(DiscretizationRequest::new(10, MIN_CURVE_DELTA, 20, 20, false).is_ok());
        assert!(DiscretizationRequest::new(10, 1e-15, 20, 20, false).is_err());
        assert!(DiscretizationRequest::new(10, 0.05, 1, 20, false).is_err());
        assert!(DiscretizationRequest::new(10, 0.05, 20, 501, false).is_err());
    }

    #[test]
    fn test_planar_helper() {
        let request = DiscretizationRequest::planar(5).unwrap();
        assert_eq!(request.precision(), 5);
        assert_eq!(request.curve_delta(), 0.05);
        assert_eq!(request.uv_samples(), (20, 20));
        assert!(!request.parametric());
    }
}
