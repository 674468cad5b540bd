// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded B-rep entities
//!
//! Topology (vertex/edge lists, loops, faces, shells, solids) refers to other
//! entities through directory sequence numbers. Geometry is carried by
//! rational B-spline curves and surfaces.

use smallvec::SmallVec;
use std::fmt;

use crate::reader::RawDirectoryRecord;

/// 3D coordinate triple
pub type Point3 = [f64; 3];

/// Directory sequence number, the pointer type used by every entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceNumber(pub u32);

impl SequenceNumber {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Pointer value 0 means "no entity"
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SequenceNumber {
    fn from(value: u32) -> Self {
        SequenceNumber(value)
    }
}

/// Supported entity type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityType {
    RationalBSplineCurve,
    RationalBSplineSurface,
    ManifoldSolid,
    VertexList,
    EdgeList,
    Loop,
    Face,
    Shell,
}

impl EntityType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            126 => Some(EntityType::RationalBSplineCurve),
            128 => Some(EntityType::RationalBSplineSurface),
            186 => Some(EntityType::ManifoldSolid),
            502 => Some(EntityType::VertexList),
            504 => Some(EntityType::EdgeList),
            508 => Some(EntityType::Loop),
            510 => Some(EntityType::Face),
            514 => Some(EntityType::Shell),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            EntityType::RationalBSplineCurve => 126,
            EntityType::RationalBSplineSurface => 128,
            EntityType::ManifoldSolid => 186,
            EntityType::VertexList => 502,
            EntityType::EdgeList => 504,
            EntityType::Loop => 508,
            EntityType::Face => 510,
            EntityType::Shell => 514,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityType::RationalBSplineCurve => "RationalBSplineCurve",
            EntityType::RationalBSplineSurface => "RationalBSplineSurface",
            EntityType::ManifoldSolid => "ManifoldSolid",
            EntityType::VertexList => "VertexList",
            EntityType::EdgeList => "EdgeList",
            EntityType::Loop => "Loop",
            EntityType::Face => "Face",
            EntityType::Shell => "Shell",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Directory metadata shared by every entity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityHeader {
    pub entity_type: EntityType,
    pub pd_pointer: u32,
    pub param_count: u32,
    pub seq_number: SequenceNumber,
    pub form: i64,
    pub transform: i64,
    pub label: String,
    /// Parameter fields consumed while decoding, type field included
    pub field_count: usize,
}

impl EntityHeader {
    pub fn from_directory(
        entity_type: EntityType,
        directory: &RawDirectoryRecord,
        field_count: usize,
    ) -> Self {
        Self {
            entity_type,
            pd_pointer: directory.pd_pointer,
            param_count: directory.param_count,
            seq_number: SequenceNumber(directory.seq_number),
            form: directory.form,
            transform: directory.transform,
            label: directory.label.clone(),
            field_count,
        }
    }
}

/// Entity 502: ordered vertex coordinates, addressed 1-based
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexList {
    pub header: EntityHeader,
    pub vertices: Vec<Point3>,
}

impl VertexList {
    /// Vertex by 1-based index
    pub fn vertex(&self, index: usize) -> Option<Point3> {
        index.checked_sub(1).and_then(|i| self.vertices.get(i)).copied()
    }
}

/// One edge of an edge list
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub curve: SequenceNumber,
    pub start_list: SequenceNumber,
    pub start_index: usize,
    pub end_list: SequenceNumber,
    pub end_index: usize,
}

/// Entity 504: ordered edges, addressed 1-based
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeList {
    pub header: EntityHeader,
    pub edges: Vec<Edge>,
}

impl EdgeList {
    /// Edge by 1-based index
    pub fn edge(&self, index: usize) -> Option<&Edge> {
        index.checked_sub(1).and_then(|i| self.edges.get(i))
    }
}

/// Parameter-space curve attached to a loop edge
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterCurve {
    pub isoparametric: bool,
    pub curve: SequenceNumber,
}

/// One entry of a loop
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopEdge {
    /// Entry references a vertex instead of an edge
    pub is_vertex: bool,
    /// Edge list (or vertex list when `is_vertex`)
    pub list: SequenceNumber,
    pub index: usize,
    /// Edge direction agrees with the underlying curve
    pub orientation: bool,
    pub curves: SmallVec<[ParameterCurve; 2]>,
}

/// Entity 508
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Loop {
    pub header: EntityHeader,
    pub edges: Vec<LoopEdge>,
}

/// Entity 510: bounded portion of a surface
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Face {
    pub header: EntityHeader,
    pub surface: SequenceNumber,
    pub outer_loop_flag: bool,
    pub loops: Vec<SequenceNumber>,
}

impl Face {
    #[inline]
    pub fn seq(&self) -> SequenceNumber {
        self.header.seq_number
    }

    /// Boundary loop: the first listed loop
    pub fn outer_loop(&self) -> Option<SequenceNumber> {
        self.loops.first().copied()
    }

    /// Hole loops: every loop after the first
    pub fn inner_loops(&self) -> &[SequenceNumber] {
        self.loops.get(1..).unwrap_or(&[])
    }
}

/// Oriented face reference of a shell
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShellFace {
    pub face: SequenceNumber,
    pub orientation: bool,
}

/// Entity 514
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shell {
    pub header: EntityHeader,
    pub faces: Vec<ShellFace>,
}

/// Oriented shell reference of a solid
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShellRef {
    pub shell: SequenceNumber,
    pub orientation: bool,
}

/// Entity 186
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManifoldSolid {
    pub header: EntityHeader,
    pub shell: ShellRef,
    pub voids: Vec<ShellRef>,
}

/// Entity 126
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RationalBSplineCurve {
    pub header: EntityHeader,
    /// Upper index of the control point sum (K); there are K + 1 points
    pub upper_index: usize,
    /// Degree (M)
    pub degree: usize,
    pub planar: bool,
    pub closed: bool,
    pub polynomial: bool,
    pub periodic: bool,
    pub knots: Vec<f64>,
    pub weights: Vec<f64>,
    pub control_points: Vec<Point3>,
    pub u_start: f64,
    pub u_end: f64,
    /// Unit normal of the curve plane, present for planar curves only
    pub normal: Option<Point3>,
}

/// Entity 128
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RationalBSplineSurface {
    pub header: EntityHeader,
    /// Upper indices (K1, K2); the control net is (K1 + 1) x (K2 + 1)
    pub upper_index_u: usize,
    pub upper_index_v: usize,
    /// Degrees (M1, M2)
    pub degree_u: usize,
    pub degree_v: usize,
    pub closed_u: bool,
    pub closed_v: bool,
    pub polynomial: bool,
    pub periodic_u: bool,
    pub periodic_v: bool,
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
    /// Row-major with `u` varying fastest
    pub weights: Vec<f64>,
    /// Row-major with `u` varying fastest
    pub control_points: Vec<Point3>,
    pub u_start: f64,
    pub u_end: f64,
    pub v_start: f64,
    pub v_end: f64,
}

impl RationalBSplineSurface {
    /// Control point counts along `u` and `v`
    pub fn net_size(&self) -> (usize, usize) {
        (self.upper_index_u + 1, self.upper_index_v + 1)
    }
}

/// A decoded entity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Entity {
    VertexList(VertexList),
    EdgeList(EdgeList),
    Loop(Loop),
    Face(Face),
    Shell(Shell),
    ManifoldSolid(ManifoldSolid),
    RationalBSplineCurve(RationalBSplineCurve),
    RationalBSplineSurface(RationalBSplineSurface),
}

impl Entity {
    pub fn header(&self) -> &EntityHeader {
        match self {
            Entity::VertexList(e) => &e.header,
            Entity::EdgeList(e) => &e.header,
            Entity::Loop(e) => &e.header,
            Entity::Face(e) => &e.header,
            Entity::Shell(e) => &e.header,
            Entity::ManifoldSolid(e) => &e.header,
            Entity::RationalBSplineCurve(e) => &e.header,
            Entity::RationalBSplineSurface(e) => &e.header,
        }
    }

    #[inline]
    pub fn entity_type(&self) -> EntityType {
        self.header().entity_type
    }

    #[inline]
    pub fn seq(&self) -> SequenceNumber {
        self.header().seq_number
    }

    pub fn as_face(&self) -> Option<&Face> {
        match self {
            Entity::Face(face) => Some(face),
            _ => None,
        }
    }

    pub fn as_shell(&self) -> Option<&Shell> {
        match self {
            Entity::Shell(shell) => Some(shell),
            _ => None,
        }
    }

    pub fn as_loop(&self) -> Option<&Loop> {
        match self {
            Entity::Loop(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_vertex_list(&self) -> Option<&VertexList> {
        match self {
            Entity::VertexList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_edge_list(&self) -> Option<&EdgeList> {
        match self {
            Entity::EdgeList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_curve(&self) -> Option<&RationalBSplineCurve> {
        match self {
            Entity::RationalBSplineCurve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn as_surface(&self) -> Option<&RationalBSplineSurface> {
        match self {
            Entity::RationalBSplineSurface(surface) => Some(surface),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_codes() {
        for code in [126, 128, 186, 502, 504, 508, 510, 514] {
            let ty = EntityType::from_code(code).unwrap();
            assert_eq!(ty.code(), code);
        }
        assert_eq!(EntityType::from_code(110), None);
        assert_eq!(EntityType::Face.to_string(), "Face (510)");
    }

    #[test]
    fn test_one_based_lookup() {
        let directory = RawDirectoryRecord {
            entity_type: 502,
            pd_pointer: 1,
            transform: 0,
            param_count: 1,
            form: 1,
            label: String::new(),
            seq_number: 1,
            line: 1,
        };
        let list = VertexList {
            header: EntityHeader::from_directory(EntityType::VertexList, &directory, 8),
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]],
        };
        assert_eq!(list.vertex(0), None);
        assert_eq!(list.vertex(2), Some([1.0, 2.0, 3.0]));
        assert_eq!(list.vertex(3), None);
    }

    #[test]
    fn test_face_loops() {
        let directory = RawDirectoryRecord {
            entity_type: 510,
            pd_pointer: 1,
            transform: 0,
            param_count: 1,
            form: 1,
            label: String::new(),
            seq_number: 9,
            line: 1,
        };
        let face = Face {
            header: EntityHeader::from_directory(EntityType::Face, &directory, 6),
            surface: SequenceNumber(1),
            outer_loop_flag: true,
            loops: vec![SequenceNumber(7), SequenceNumber(11)],
        };
        assert_eq!(face.seq(), SequenceNumber(9));
        assert_eq!(face.outer_loop(), Some(SequenceNumber(7)));
        assert_eq!(face.inner_loops(), &[SequenceNumber(11)]);
    }
}
