// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point classification with the even-odd rule
//!
//! A horizontal ray from the query point toggles membership at every edge it
//! crosses. The straddle test is half-open (`(yi > y) != (yj > y)`) and the
//! crossing must lie strictly to the right, so points on bottom or left edges
//! classify inside and points on top or right edges classify outside.

use nalgebra::Point2;

/// Even-odd membership of `(x, y)` in `polygon`.
///
/// Polygons with fewer than 3 vertices contain nothing.
pub fn inside(x: f64, y: f64, polygon: &[Point2<f64>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];

        if ((pi.y > y) != (pj.y > y)) && (x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Axis-aligned bounds `(min, max)` of a 2D polygon
pub fn bounds(polygon: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = polygon.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &polygon[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// Vertex average
pub fn centroid(polygon: &[Point2<f64>]) -> Option<Point2<f64>> {
    if polygon.is_empty() {
        return None;
    }
    let sum = polygon
        .iter()
        .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
    Some(Point2::from(sum / polygon.len() as f64))
}
