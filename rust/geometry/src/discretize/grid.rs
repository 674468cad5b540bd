// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interior lattice of a projected face

use nalgebra::Point2;

use crate::polygon::{bounds, inside};

/// Lattice positions strictly inside `(min, max)`
fn axis_positions(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    let tolerance = spacing * 1e-9;
    (1..)
        .map(|k| min + spacing * k as f64)
        .take_while(|&v| v < max - tolerance)
        .collect()
}

/// Grid points inside `outer` and outside every hole.
///
/// The spacing is the longest side of the outer bounding box divided by
/// `precision`; lattice lines on the box edges are skipped. Points are
/// ordered row by row (`y` outer, `x` inner).
pub fn interior_points(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
    precision: u32,
) -> Vec<Point2<f64>> {
    let Some((min, max)) = bounds(outer) else {
        return Vec::new();
    };
    let extent = max - min;
    let longest = extent.x.max(extent.y);
    if !(longest > 0.0) || precision == 0 {
        return Vec::new();
    }

    let spacing = longest / precision as f64;
    let xs = axis_positions(min.x, max.x, spacing);
    let ys = axis_positions(min.y, max.y, spacing);

    let mut points = Vec::new();
    for &y in &ys {
        for &x in &xs {
            if inside(x, y, outer) && !holes.iter().any(|hole| inside(x, y, hole)) {
                points.push(Point2::new(x, y));
            }
        }
    }
    points
}
