// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASCII PCD serialization
//!
//! A fixed 10-line header followed by one `x y z` line per point. Coordinates
//! use Rust's shortest round-trip float formatting, so parsing the body gives
//! back the exact values.

use std::fmt::Write as _;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::point_cloud::FacePointCloud;

pub const HEADER_LINES: usize = 10;

/// Serialize the points of all clouds, in order, as one PCD document
pub fn serialize(clouds: &[FacePointCloud]) -> Vec<u8> {
    let points = clouds.iter().flat_map(|c| c.points().iter());
    serialize_points(points).into_bytes()
}

/// PCD text of a point sequence
pub fn serialize_points<'a>(points: impl Iterator<Item = &'a Point3<f64>> + Clone) -> String {
    let count = points.clone().count();
    let mut out = String::with_capacity(160 + count * 48);

    out.push_str("VERSION 0.7\n");
    out.push_str("FIELDS x y z\n");
    out.push_str("SIZE 8 8 8\n");
    out.push_str("TYPE F F F\n");
    out.push_str("COUNT 1 1 1\n");
    let _ = writeln!(out, "WIDTH {}", count);
    out.push_str("HEIGHT 1\n");
    out.push_str("VIEWPOINT 0 0 0 1 0 0 0\n");
    let _ = writeln!(out, "POINTS {}", count);
    out.push_str("DATA ascii\n");

    for p in points {
        let _ = writeln!(out, "{} {} {}", p.x, p.y, p.z);
    }
    out
}

/// Write clouds to a PCD file
pub fn write_pcd(path: impl AsRef<Path>, clouds: &[FacePointCloud]) -> Result<()> {
    std::fs::write(path, serialize(clouds))?;
    Ok(())
}

/// Read back a document produced by [`serialize`]
pub fn parse_pcd(text: &str) -> Result<Vec<Point3<f64>>> {
    let mut lines = text.lines();
    let mut declared: Option<usize> = None;

    for n in 0..HEADER_LINES {
        let line = lines
            .next()
            .ok_or_else(|| Error::Pcd(format!("header ends after {} lines", n)))?;
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("POINTS"), Some(count)) => {
                declared = Some(
                    count
                        .parse()
                        .map_err(|_| Error::Pcd(format!("invalid POINTS value {:?}", count)))?,
                );
            }
            (Some("DATA"), Some(kind)) if kind != "ascii" => {
                return Err(Error::Pcd(format!("unsupported DATA encoding {:?}", kind)));
            }
            _ => {}
        }
    }
    let declared = declared.ok_or_else(|| Error::Pcd("missing POINTS header".to_string()))?;

    // a body line is at least "0 0 0\n"
    let mut points = Vec::with_capacity(declared.min(text.len() / 6));
    for (i, line) in lines.enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        let coords: Vec<f64> = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Pcd(format!("point {}: {}", i + 1, e)))?;
        if coords.len() != 3 {
            return Err(Error::Pcd(format!(
                "point {}: expected 3 coordinates, found {}",
                i + 1,
                coords.len()
            )));
        }
        points.push(Point3::new(coords[0], coords[1], coords[2]));
    }

    if points.len() != declared {
        return Err(Error::Pcd(format!(
            "header declares {} points, body has {}",
            declared,
            points.len()
        )));
    }
    Ok(points)
}
