// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Random point offsets

use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::finite;
use crate::error::{Error, Result};
use crate::point_cloud::FacePointCloud;

/// Isotropic unit direction from three Gaussian components
fn random_direction<R: Rng>(rng: &mut R) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.sample::<f64, _>(StandardNormal),
            rng.sample::<f64, _>(StandardNormal),
            rng.sample::<f64, _>(StandardNormal),
        );
        if let Some(unit) = v.try_normalize(1e-12) {
            return unit;
        }
    }
}

pub(super) fn jitter(
    cloud: &FacePointCloud,
    min_offset: f64,
    max_offset: f64,
    seed: Option<u64>,
) -> Result<Vec<Point3<f64>>> {
    let min_offset = finite("jitter minimum offset", min_offset)?;
    let max_offset = finite("jitter maximum offset", max_offset)?;
    if min_offset > max_offset {
        return Err(Error::invalid(format!(
            "jitter minimum offset {} exceeds maximum {}",
            min_offset, max_offset
        )));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    Ok(cloud
        .points()
        .iter()
        .map(|p| {
            let direction = random_direction(&mut rng);
            let magnitude = if min_offset == max_offset {
                min_offset
            } else {
                rng.gen_range(min_offset..=max_offset)
            };
            p + direction * magnitude
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::tests::plate;
    use super::*;

    #[test]
    fn test_offsets_within_range() {
        let cloud = plate();
        let moved = jitter(&cloud, 0.2, 0.5, Some(7)).unwrap();
        for (a, b) in cloud.points().iter().zip(&moved) {
            let d = (b - a).norm();
            assert!((0.2 - 1e-12..=0.5 + 1e-12).contains(&d), "offset {}", d);
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let cloud = plate();
        assert_eq!(
            jitter(&cloud, 0.0, 1.0, Some(42)).unwrap(),
            jitter(&cloud, 0.0, 1.0, Some(42)).unwrap()
        );
        assert_ne!(
            jitter(&cloud, 0.0, 1.0, Some(42)).unwrap(),
            jitter(&cloud, 0.0, 1.0, Some(43)).unwrap()
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            jitter(&plate(), 1.0, 0.5, None),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_range_is_identity() {
        let cloud = plate();
        assert_eq!(jitter(&cloud, 0.0, 0.0, None).unwrap(), cloud.points());
    }
}
