// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! NURBS Evaluator
//!
//! Rational B-spline curves and surfaces over homogeneous control points
//! `(w·x, w·y, w·z, w)`. Basis functions follow the Cox-de Boor recursion
//! anchored on the knot span that contains the parameter, so the end of the
//! domain evaluates on the last non-empty span and clamped splines hit their
//! end control points exactly.
//!
//! Sampling is lazy: [`CurveSamples`] and [`SurfaceSamples`] are finite
//! iterators that can be cloned or restarted.

use iges_lite_core::{RationalBSplineCurve, RationalBSplineSurface};
use nalgebra::{Point3, Vector3, Vector4};

use crate::error::{Error, Result};
use crate::request::MIN_CURVE_DELTA;

/// Rational denominators below this magnitude are degenerate
pub const WEIGHT_EPSILON: f64 = 1e-12;

/// Knot differences below this are treated as zero-length intervals
const KNOT_EPSILON: f64 = 1e-10;

/// Check degree, counts and monotonicity of a knot vector
fn validate_knots(knots: &[f64], degree: usize, count: usize, direction: &str) -> Result<()> {
    if degree < 1 {
        return Err(Error::InvalidKnotVector(format!(
            "{} degree must be at least 1",
            direction
        )));
    }
    if count < degree + 1 {
        return Err(Error::InvalidKnotVector(format!(
            "{} needs at least {} control points for degree {}, found {}",
            direction,
            degree + 1,
            degree,
            count
        )));
    }
    if knots.len() != count + degree + 1 {
        return Err(Error::InvalidKnotVector(format!(
            "{} expects {} knots, found {}",
            direction,
            count + degree + 1,
            knots.len()
        )));
    }
    if knots.iter().any(|k| !k.is_finite()) {
        return Err(Error::InvalidKnotVector(format!(
            "{} knots must be finite",
            direction
        )));
    }
    if let Some(pos) = knots.windows(2).position(|w| w[1] < w[0]) {
        return Err(Error::InvalidKnotVector(format!(
            "{} knots decrease at index {} ({} > {})",
            direction,
            pos + 1,
            knots[pos],
            knots[pos + 1]
        )));
    }
    if knots[degree] >= knots[count] {
        return Err(Error::InvalidKnotVector(format!(
            "{} parameter domain [{}, {}] is empty",
            direction, knots[degree], knots[count]
        )));
    }
    Ok(())
}

/// Homogeneous control points from coordinates and weights
fn homogeneous(points: &[[f64; 3]], weights: &[f64], direction: &str) -> Result<Vec<Vector4<f64>>> {
    if points.len() != weights.len() {
        return Err(Error::InvalidKnotVector(format!(
            "{} has {} control points but {} weights",
            direction,
            points.len(),
            weights.len()
        )));
    }
    Ok(points
        .iter()
        .zip(weights)
        .map(|(p, &w)| Vector4::new(w * p[0], w * p[1], w * p[2], w))
        .collect())
}

/// Knot span `s` with `knots[s] <= u < knots[s + 1]`, limited to
/// `[degree, count - 1]`. The domain end maps to the last non-empty span.
pub fn find_span(knots: &[f64], degree: usize, count: usize, u: f64) -> usize {
    if u < knots[count] {
        for span in degree..count {
            if knots[span] <= u && u < knots[span + 1] {
                return span;
            }
        }
    }
    let mut span = count - 1;
    while span > degree && knots[span] >= knots[span + 1] {
        span -= 1;
    }
    span
}

/// Cox-de Boor basis function `N(i, p)` at `u`, with the degree-0 term
/// equal to 1 only on `span`
pub fn basis(i: usize, p: usize, u: f64, knots: &[f64], span: usize) -> f64 {
    if p == 0 {
        return if i == span { 1.0 } else { 0.0 };
    }
    let left = {
        let denom = knots[i + p] - knots[i];
        if denom.abs() < KNOT_EPSILON {
            0.0
        } else {
            (u - knots[i]) / denom * basis(i, p - 1, u, knots, span)
        }
    };
    let right = {
        let denom = knots[i + p + 1] - knots[i + 1];
        if denom.abs() < KNOT_EPSILON {
            0.0
        } else {
            (knots[i + p + 1] - u) / denom * basis(i + 1, p - 1, u, knots, span)
        }
    };
    left + right
}

/// First derivative of `N(i, p)` at `u`
pub fn basis_derivative(i: usize, p: usize, u: f64, knots: &[f64], span: usize) -> f64 {
    if p == 0 {
        return 0.0;
    }
    let degree = p as f64;
    let left = {
        let denom = knots[i + p] - knots[i];
        if denom.abs() < KNOT_EPSILON {
            0.0
        } else {
            degree / denom * basis(i, p - 1, u, knots, span)
        }
    };
    let right = {
        let denom = knots[i + p + 1] - knots[i + 1];
        if denom.abs() < KNOT_EPSILON {
            0.0
        } else {
            degree / denom * basis(i + 1, p - 1, u, knots, span)
        }
    };
    left - right
}

/// Divide a homogeneous point by its weight
fn project(h: &Vector4<f64>, parameter: f64) -> Result<Point3<f64>> {
    if h.w.abs() < WEIGHT_EPSILON {
        return Err(Error::DegenerateWeight { parameter });
    }
    Ok(Point3::new(h.x / h.w, h.y / h.w, h.z / h.w))
}

/// Number of steps covering the unit interval at `delta`
fn step_count(delta: f64, name: &str) -> Result<usize> {
    if !(MIN_CURVE_DELTA..=1.0).contains(&delta) {
        return Err(Error::invalid(format!(
            "{} must be in [{}, 1], got {}",
            name, MIN_CURVE_DELTA, delta
        )));
    }
    Ok(((1.0 / delta) - 1e-9).ceil().max(1.0) as usize)
}

/// `[start, end]` limited to the knot domain; the knot domain itself when
/// that leaves no interval
fn clamp_range(knot_domain: (f64, f64), start: f64, end: f64) -> (f64, f64) {
    let (lo, hi) = knot_domain;
    let (start, end) = (start.max(lo), end.min(hi));
    if start.is_finite() && end.is_finite() && end - start > KNOT_EPSILON {
        (start, end)
    } else {
        knot_domain
    }
}

/// True if all points lie on one line (relative tolerance)
fn colinear(points: &[Point3<f64>]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let far = points
        .iter()
        .max_by(|a, b| (*a - first).norm().total_cmp(&(*b - first).norm()));
    let Some(far) = far else {
        return true;
    };
    let extent = (far - first).norm();
    if extent < KNOT_EPSILON {
        return true;
    }
    let dir = (far - first) / extent;
    let tolerance = 1e-9 * extent.max(1.0);
    points.iter().all(|p| {
        let offset = p - first;
        (offset - dir * offset.dot(&dir)).norm() <= tolerance
    })
}

/// Rational B-spline curve
#[derive(Debug, Clone)]
pub struct NurbsCurve {
    degree: usize,
    knots: Vec<f64>,
    control: Vec<Vector4<f64>>,
    range: (f64, f64),
}

impl NurbsCurve {
    pub fn new(degree: usize, knots: Vec<f64>, points: &[[f64; 3]], weights: &[f64]) -> Result<Self> {
        let control = homogeneous(points, weights, "curve")?;
        validate_knots(&knots, degree, control.len(), "curve")?;
        let range = (knots[degree], knots[control.len()]);
        Ok(Self {
            degree,
            knots,
            control,
            range,
        })
    }

    /// Curve with the entity's `[V0, V1]` parameter range
    pub fn from_entity(curve: &RationalBSplineCurve) -> Result<Self> {
        Ok(Self::new(
            curve.degree,
            curve.knots.clone(),
            &curve.control_points,
            &curve.weights,
        )?
        .with_range(curve.u_start, curve.u_end))
    }

    /// Restrict evaluation and sampling to `[start, end]` within the knots
    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        let knot_domain = (self.knots[self.degree], self.knots[self.control.len()]);
        self.range = clamp_range(knot_domain, start, end);
        self
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[inline]
    pub fn control_count(&self) -> usize {
        self.control.len()
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Parameter domain, `[knots[degree], knots[count]]` unless restricted
    pub fn domain(&self) -> (f64, f64) {
        self.range
    }

    /// Control points in Cartesian coordinates
    pub fn control_points(&self) -> Vec<Point3<f64>> {
        self.control
            .iter()
            .map(|h| Point3::new(h.x / h.w, h.y / h.w, h.z / h.w))
            .collect()
    }

    /// Evaluate at `u`, clamped to the domain
    pub fn point_at(&self, u: f64) -> Result<Point3<f64>> {
        let (u_min, u_max) = self.domain();
        let u = u.clamp(u_min, u_max);
        let count = self.control.len();
        let span = find_span(&self.knots, self.degree, count, u);

        let mut sum = Vector4::zeros();
        for i in span - self.degree..=span {
            let n = basis(i, self.degree, u, &self.knots, span);
            if n != 0.0 {
                sum += self.control[i] * n;
            }
        }
        project(&sum, u)
    }

    /// Samples at a fixed step of the normalized domain, both ends included
    pub fn samples(&self, delta: f64) -> Result<CurveSamples<'_>> {
        Ok(CurveSamples {
            curve: self,
            steps: step_count(delta, "curve delta")?,
            next: 0,
        })
    }

    /// Degree 1 with two control points, or all control points on one line
    pub fn is_straight(&self) -> bool {
        if self.degree == 1 && self.control.len() == 2 {
            return true;
        }
        if self.control.iter().any(|h| h.w.abs() < WEIGHT_EPSILON) {
            return false;
        }
        colinear(&self.control_points())
    }
}

/// Lazy curve samples
#[derive(Debug, Clone)]
pub struct CurveSamples<'a> {
    curve: &'a NurbsCurve,
    steps: usize,
    next: usize,
}

impl CurveSamples<'_> {
    /// Rewind to the first sample
    pub fn restart(&mut self) {
        self.next = 0;
    }

    /// Number of steps; the sequence yields `steps + 1` points
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Iterator for CurveSamples<'_> {
    type Item = Result<Point3<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.steps {
            return None;
        }
        let (u_min, u_max) = self.curve.domain();
        let u = if self.next == self.steps {
            u_max
        } else {
            u_min + (u_max - u_min) * self.next as f64 / self.steps as f64
        };
        self.next += 1;
        Some(self.curve.point_at(u))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.steps + 1).saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for CurveSamples<'_> {}

/// Evaluated surface sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub u: f64,
    pub v: f64,
    pub point: Point3<f64>,
    /// Unit normal `Su x Sv`
    pub normal: Vector3<f64>,
}

/// Rational B-spline surface, control net stored with `u` varying fastest
#[derive(Debug, Clone)]
pub struct NurbsSurface {
    degree_u: usize,
    degree_v: usize,
    u_knots: Vec<f64>,
    v_knots: Vec<f64>,
    count_u: usize,
    count_v: usize,
    control: Vec<Vector4<f64>>,
    range_u: (f64, f64),
    range_v: (f64, f64),
}

impl NurbsSurface {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        u_knots: Vec<f64>,
        v_knots: Vec<f64>,
        count_u: usize,
        count_v: usize,
        points: &[[f64; 3]],
        weights: &[f64],
    ) -> Result<Self> {
        let control = homogeneous(points, weights, "surface")?;
        if control.len() != count_u * count_v {
            return Err(Error::InvalidKnotVector(format!(
                "surface net is {}x{} but has {} control points",
                count_u,
                count_v,
                control.len()
            )));
        }
        validate_knots(&u_knots, degree_u, count_u, "surface u")?;
        validate_knots(&v_knots, degree_v, count_v, "surface v")?;
        let range_u = (u_knots[degree_u], u_knots[count_u]);
        let range_v = (v_knots[degree_v], v_knots[count_v]);
        Ok(Self {
            degree_u,
            degree_v,
            u_knots,
            v_knots,
            count_u,
            count_v,
            control,
            range_u,
            range_v,
        })
    }

    /// Surface with the entity's `[U0, U1] x [V0, V1]` parameter ranges
    pub fn from_entity(surface: &RationalBSplineSurface) -> Result<Self> {
        let (count_u, count_v) = surface.net_size();
        Ok(Self::new(
            surface.degree_u,
            surface.degree_v,
            surface.u_knots.clone(),
            surface.v_knots.clone(),
            count_u,
            count_v,
            &surface.control_points,
            &surface.weights,
        )?
        .with_range(
            (surface.u_start, surface.u_end),
            (surface.v_start, surface.v_end),
        ))
    }

    /// Restrict evaluation and sampling to `u` and `v` ranges within the knots
    pub fn with_range(mut self, u: (f64, f64), v: (f64, f64)) -> Self {
        let u_knots = (self.u_knots[self.degree_u], self.u_knots[self.count_u]);
        let v_knots = (self.v_knots[self.degree_v], self.v_knots[self.count_v]);
        self.range_u = clamp_range(u_knots, u.0, u.1);
        self.range_v = clamp_range(v_knots, v.0, v.1);
        self
    }

    pub fn degrees(&self) -> (usize, usize) {
        (self.degree_u, self.degree_v)
    }

    pub fn net_size(&self) -> (usize, usize) {
        (self.count_u, self.count_v)
    }

    /// `((u_min, u_max), (v_min, v_max))`
    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (self.range_u, self.range_v)
    }

    /// Homogeneous sum and its partial derivatives
    fn evaluate(&self, u: f64, v: f64) -> (Vector4<f64>, Vector4<f64>, Vector4<f64>) {
        let span_u = find_span(&self.u_knots, self.degree_u, self.count_u, u);
        let span_v = find_span(&self.v_knots, self.degree_v, self.count_v, v);

        let mut sum = Vector4::zeros();
        let mut du = Vector4::zeros();
        let mut dv = Vector4::zeros();

        for j in span_v - self.degree_v..=span_v {
            let nv = basis(j, self.degree_v, v, &self.v_knots, span_v);
            let dnv = basis_derivative(j, self.degree_v, v, &self.v_knots, span_v);
            for i in span_u - self.degree_u..=span_u {
                let nu = basis(i, self.degree_u, u, &self.u_knots, span_u);
                let dnu = basis_derivative(i, self.degree_u, u, &self.u_knots, span_u);
                let h = &self.control[j * self.count_u + i];
                sum += h * (nu * nv);
                du += h * (dnu * nv);
                dv += h * (nu * dnv);
            }
        }
        (sum, du, dv)
    }

    fn clamp(&self, u: f64, v: f64) -> (f64, f64) {
        let ((u0, u1), (v0, v1)) = self.domain();
        (u.clamp(u0, u1), v.clamp(v0, v1))
    }

    /// Evaluate at `(u, v)`, clamped to the domain
    pub fn point_at(&self, u: f64, v: f64) -> Result<Point3<f64>> {
        let (u, v) = self.clamp(u, v);
        let (sum, _, _) = self.evaluate(u, v);
        project(&sum, u)
    }

    /// Point and first partial derivatives (rational quotient rule)
    pub fn derivatives(&self, u: f64, v: f64) -> Result<(Point3<f64>, Vector3<f64>, Vector3<f64>)> {
        let (u, v) = self.clamp(u, v);
        let (sum, du, dv) = self.evaluate(u, v);
        let point = project(&sum, u)?;
        let w = sum.w;
        let su = (du.xyz() - point.coords * du.w) / w;
        let sv = (dv.xyz() - point.coords * dv.w) / w;
        Ok((point, su, sv))
    }

    /// Unit normal. At a pole the parameter is nudged toward the domain centre.
    pub fn normal_at(&self, u: f64, v: f64) -> Result<Vector3<f64>> {
        let ((u0, u1), (v0, v1)) = self.domain();
        let (uc, vc) = ((u0 + u1) / 2.0, (v0 + v1) / 2.0);

        for nudge in [0.0, 1e-6, 1e-4, 1e-2] {
            let (_, su, sv) = self.derivatives(u + (uc - u) * nudge, v + (vc - v) * nudge)?;
            let n = su.cross(&sv);
            let len = n.norm();
            if len > WEIGHT_EPSILON {
                return Ok(n / len);
            }
        }
        Err(Error::DegenerateNormal { u, v })
    }

    /// `u_count x v_count` samples spanning the whole domain
    pub fn grid(&self, u_count: usize, v_count: usize) -> Result<SurfaceSamples<'_>> {
        if u_count < 2 || v_count < 2 {
            return Err(Error::invalid(format!(
                "surface sample counts must be at least 2, got {}x{}",
                u_count, v_count
            )));
        }
        Ok(SurfaceSamples {
            surface: self,
            u_count,
            v_count,
            next: 0,
        })
    }

    /// Samples at fixed steps of the normalized domain, ends included
    pub fn samples(&self, delta_u: f64, delta_v: f64) -> Result<SurfaceSamples<'_>> {
        let u_steps = step_count(delta_u, "surface u delta")?;
        let v_steps = step_count(delta_v, "surface v delta")?;
        self.grid(u_steps + 1, v_steps + 1)
    }

    /// Control points in Cartesian coordinates, `u` fastest
    pub fn control_points(&self) -> Vec<Point3<f64>> {
        self.control
            .iter()
            .map(|h| Point3::new(h.x / h.w, h.y / h.w, h.z / h.w))
            .collect()
    }

    /// True if every control point lies within `tolerance` of one plane.
    /// With positive weights the surface stays inside that plane.
    pub fn is_planar(&self, tolerance: f64) -> bool {
        if self.control.iter().any(|h| h.w.abs() < WEIGHT_EPSILON) {
            return false;
        }
        let points = self.control_points();
        let first = points[0];
        let Some(far) = points
            .iter()
            .max_by(|a, b| (*a - first).norm().total_cmp(&(*b - first).norm()))
        else {
            return true;
        };
        let axis = far - first;
        let normal = points
            .iter()
            .map(|p| axis.cross(&(p - first)))
            .max_by(|a, b| a.norm().total_cmp(&b.norm()))
            .unwrap_or_else(Vector3::zeros);
        let len = normal.norm();
        if len < WEIGHT_EPSILON {
            // all control points on one line
            return true;
        }
        let normal = normal / len;
        points
            .iter()
            .all(|p| (p - first).dot(&normal).abs() <= tolerance)
    }
}

/// Lazy surface samples, `u` varying fastest
#[derive(Debug, Clone)]
pub struct SurfaceSamples<'a> {
    surface: &'a NurbsSurface,
    u_count: usize,
    v_count: usize,
    next: usize,
}

impl SurfaceSamples<'_> {
    pub fn restart(&mut self) {
        self.next = 0;
    }

    fn parameter(index: usize, count: usize, (min, max): (f64, f64)) -> f64 {
        if index + 1 == count {
            max
        } else {
            min + (max - min) * index as f64 / (count - 1) as f64
        }
    }
}

impl Iterator for SurfaceSamples<'_> {
    type Item = Result<SurfaceSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.u_count * self.v_count {
            return None;
        }
        let (u_range, v_range) = self.surface.domain();
        let u = Self::parameter(self.next % self.u_count, self.u_count, u_range);
        let v = Self::parameter(self.next / self.u_count, self.v_count, v_range);
        self.next += 1;

        let sample = self.surface.point_at(u, v).and_then(|point| {
            Ok(SurfaceSample {
                u,
                v,
                point,
                normal: self.surface.normal_at(u, v)?,
            })
        });
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.u_count * self.v_count).saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for SurfaceSamples<'_> {}
