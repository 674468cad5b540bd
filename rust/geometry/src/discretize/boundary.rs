// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary polygons from loops
//!
//! Every loop edge becomes a chain of points from its start vertex to its end
//! vertex, with samples of the underlying curve in between when the curve is
//! not straight. The chains are then stitched end to end.

use iges_lite_core::{Entity, EntityTable, LoopEdge, SequenceNumber};
use nalgebra::Point3;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::nurbs::NurbsCurve;

/// Chain endpoints closer than this are the same vertex
pub const STITCH_TOLERANCE: f64 = 1e-6;

pub(crate) type Chain = SmallVec<[Point3<f64>; 8]>;

#[inline]
fn coincident(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    (a - b).norm() < STITCH_TOLERANCE
}

/// Closed polygon of a loop, without a repeated closing vertex
pub fn loop_polygon(
    table: &EntityTable,
    loop_seq: SequenceNumber,
    face: SequenceNumber,
    curve_delta: f64,
) -> Result<Vec<Point3<f64>>> {
    let entity = table.loop_entity(loop_seq)?;

    let mut chains = Vec::with_capacity(entity.edges.len());
    for entry in &entity.edges {
        // vertex entries carry no boundary segment
        if entry.is_vertex {
            continue;
        }
        chains.push(edge_chain(table, entry, curve_delta)?);
    }

    stitch(chains, face)
}

/// Points of one loop edge in loop direction
fn edge_chain(table: &EntityTable, entry: &LoopEdge, curve_delta: f64) -> Result<Chain> {
    let edge = table.edge(entry.list, entry.index)?;
    let start = Point3::from(table.vertex(edge.start_list, edge.start_index)?);
    let end = Point3::from(table.vertex(edge.end_list, edge.end_index)?);

    let mut chain = Chain::new();
    chain.push(start);
    chain.extend(intermediate_samples(table, edge.curve, &start, &end, curve_delta)?);
    chain.push(end);

    if !entry.orientation {
        chain.reverse();
    }
    Ok(chain)
}

/// Curve samples strictly between `start` and `end`, ordered start to end.
/// Straight or unsupported curves contribute nothing (a chord).
fn intermediate_samples(
    table: &EntityTable,
    curve_seq: SequenceNumber,
    start: &Point3<f64>,
    end: &Point3<f64>,
    curve_delta: f64,
) -> Result<Vec<Point3<f64>>> {
    if curve_seq.is_null() {
        return Ok(Vec::new());
    }

    let curve = match table.try_resolve(curve_seq)? {
        Some(Entity::RationalBSplineCurve(curve)) => curve,
        Some(other) => {
            tracing::debug!(
                curve = curve_seq.get(),
                entity = other.entity_type().name(),
                "edge curve is not a B-spline, using a chord"
            );
            return Ok(Vec::new());
        }
        None => return Ok(Vec::new()),
    };

    let curve = NurbsCurve::from_entity(curve)?;
    if curve.is_straight() {
        return Ok(Vec::new());
    }

    let mut samples = curve
        .samples(curve_delta)?
        .collect::<Result<Vec<Point3<f64>>>>()?;
    if samples.len() <= 2 {
        return Ok(Vec::new());
    }

    let runs_backwards = (samples[0] - start).norm() > (samples[0] - end).norm();
    samples.pop();
    samples.remove(0);
    if runs_backwards {
        samples.reverse();
    }
    Ok(samples)
}

/// Join chains into one polygon.
///
/// Starting from the first chain, the chain whose head (append as is) or tail
/// (append reversed) matches the last vertex is consumed next.
pub(crate) fn stitch(mut chains: Vec<Chain>, face: SequenceNumber) -> Result<Vec<Point3<f64>>> {
    if chains.is_empty() {
        return Ok(Vec::new());
    }

    let mut polygon = chains.remove(0).into_vec();

    while !chains.is_empty() {
        let Some(&last) = polygon.last() else {
            break;
        };

        if let Some(idx) = chains.iter().position(|c| c.first().is_some_and(|p| coincident(p, &last))) {
            let chain = chains.remove(idx);
            polygon.extend_from_slice(&chain[1..]);
            continue;
        }

        if let Some(idx) = chains.iter().position(|c| c.last().is_some_and(|p| coincident(p, &last))) {
            let chain = chains.remove(idx);
            polygon.extend(chain.iter().rev().skip(1));
            continue;
        }

        return Err(Error::UnclosableLoop {
            face: face.get(),
            remaining: chains.len(),
        });
    }

    if polygon.len() > 1 && coincident(&polygon[0], &polygon[polygon.len() - 1]) {
        polygon.pop();
    }
    Ok(polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn test_stitch_mixed_directions() {
        let chains: Vec<Chain> = vec![
            smallvec![p(0.0, 0.0), p(1.0, 0.0)],
            // stored tail first
            smallvec![p(1.0, 1.0), p(1.0, 0.0)],
            smallvec![p(0.0, 1.0), p(0.0, 0.0)],
            smallvec![p(1.0, 1.0), p(0.5, 1.2), p(0.0, 1.0)],
        ];
        let polygon = stitch(chains, SequenceNumber(1)).unwrap();
        assert_eq!(
            polygon,
            vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.5, 1.2), p(0.0, 1.0)]
        );
    }

    #[test]
    fn test_stitch_tolerance() {
        let chains: Vec<Chain> = vec![
            smallvec![p(0.0, 0.0), p(1.0, 0.0)],
            smallvec![p(1.0 + 1e-8, 0.0), p(0.0, 1.0)],
            smallvec![p(0.0, 1.0), p(0.0, 1e-8)],
        ];
        let polygon = stitch(chains, SequenceNumber(1)).unwrap();
        assert_eq!(polygon.len(), 3);
    }

    #[test]
    fn test_unclosable_loop() {
        let chains: Vec<Chain> = vec![
            smallvec![p(0.0, 0.0), p(1.0, 0.0)],
            smallvec![p(5.0, 5.0), p(6.0, 5.0)],
            smallvec![p(1.0, 0.0), p(0.0, 1.0)],
        ];
        match stitch(chains, SequenceNumber(9)) {
            Err(Error::UnclosableLoop { face, remaining }) => {
                assert_eq!(face, 9);
                assert_eq!(remaining, 1);
            }
            other => panic!("expected UnclosableLoop, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_loop() {
        assert!(stitch(Vec::new(), SequenceNumber(1)).unwrap().is_empty());
    }
}
