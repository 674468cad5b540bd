// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity Decoder - positional unpacking of parameter records
//!
//! Every entity layout is read front to back through a [`ParameterCursor`],
//! which reports running out of fields as an error instead of panicking.

use smallvec::SmallVec;

use crate::entities::{
    Edge, EdgeList, Entity, EntityHeader, EntityType, Face, Loop, LoopEdge, ManifoldSolid,
    ParameterCurve, Point3, RationalBSplineCurve, RationalBSplineSurface, SequenceNumber, Shell,
    ShellFace, ShellRef, VertexList,
};
use crate::error::{Error, Result};
use crate::parser::{parse_fields, Delimiters, Field};
use crate::reader::{RawDirectoryRecord, RawParameterRecord};

/// Sequential reader over the typed fields of one parameter record
pub struct ParameterCursor<'a> {
    seq: u32,
    fields: &'a [Field],
    pos: usize,
}

impl<'a> ParameterCursor<'a> {
    pub fn new(seq: u32, fields: &'a [Field]) -> Self {
        Self { seq, fields, pos: 0 }
    }

    /// Fields consumed so far
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.fields.len() - self.pos
    }

    /// Fail unless `count` more fields are available
    pub fn require(&self, count: usize) -> Result<()> {
        if count > self.remaining() {
            return Err(Error::ParameterUnderflow {
                seq: self.seq,
                needed: self.pos + count,
                available: self.fields.len(),
            });
        }
        Ok(())
    }

    pub fn next_field(&mut self) -> Result<&'a Field> {
        self.require(1)?;
        let field = &self.fields[self.pos];
        self.pos += 1;
        Ok(field)
    }

    fn invalid(&self, expected: &'static str) -> Error {
        Error::InvalidField {
            seq: self.seq,
            // 1-based position of the field just consumed
            position: self.pos,
            expected,
        }
    }

    pub fn int(&mut self) -> Result<i64> {
        let field = self.next_field()?;
        field.as_int().ok_or_else(|| self.invalid("integer"))
    }

    pub fn real(&mut self) -> Result<f64> {
        let field = self.next_field()?;
        field.as_real().ok_or_else(|| self.invalid("real"))
    }

    /// Leading entity type field. Must be an explicit integer.
    pub fn type_code(&mut self) -> Result<i64> {
        match self.next_field()? {
            Field::Integer(code) => Ok(*code),
            _ => Err(self.invalid("entity type")),
        }
    }

    /// Non-negative count
    pub fn count(&mut self) -> Result<usize> {
        let value = self.int()?;
        usize::try_from(value).map_err(|_| self.invalid("count"))
    }

    /// 1-based list index
    pub fn index(&mut self) -> Result<usize> {
        self.count()
    }

    /// Directory pointer. Negated pointers are read by magnitude.
    pub fn pointer(&mut self) -> Result<SequenceNumber> {
        let value = self.int()?;
        u32::try_from(value.unsigned_abs())
            .map(SequenceNumber)
            .map_err(|_| self.invalid("pointer"))
    }

    /// Integer flag, nonzero is true
    pub fn flag(&mut self) -> Result<bool> {
        Ok(self.int()? != 0)
    }

    pub fn point(&mut self) -> Result<Point3> {
        Ok([self.real()?, self.real()?, self.real()?])
    }

    pub fn reals(&mut self, count: usize) -> Result<Vec<f64>> {
        self.require(count)?;
        (0..count).map(|_| self.real()).collect()
    }

    pub fn points(&mut self, count: usize) -> Result<Vec<Point3>> {
        self.require(count.saturating_mul(3))?;
        (0..count).map(|_| self.point()).collect()
    }
}

/// Decode one entity from its directory entry and parameter record
pub fn decode(
    directory: &RawDirectoryRecord,
    parameter: &RawParameterRecord,
    delimiters: Delimiters,
) -> Result<Entity> {
    let seq = directory.seq_number;
    let fields = parse_fields(&parameter.data, delimiters);
    let mut cursor = ParameterCursor::new(seq, &fields);

    let code = cursor.type_code()?;
    if code != directory.entity_type {
        tracing::warn!(
            seq,
            directory_type = directory.entity_type,
            parameter_type = code,
            "entity type differs between directory and parameter record"
        );
    }

    let entity_type = EntityType::from_code(code).ok_or(Error::UnsupportedEntity(code))?;

    let entity = match entity_type {
        EntityType::VertexList => {
            let count = cursor.count()?;
            let vertices = cursor.points(count)?;
            Entity::VertexList(VertexList {
                header: header(entity_type, directory, &cursor),
                vertices,
            })
        }
        EntityType::EdgeList => {
            let count = cursor.count()?;
            cursor.require(count.saturating_mul(5))?;
            let edges = (0..count)
                .map(|_| {
                    Ok(Edge {
                        curve: cursor.pointer()?,
                        start_list: cursor.pointer()?,
                        start_index: cursor.index()?,
                        end_list: cursor.pointer()?,
                        end_index: cursor.index()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Entity::EdgeList(EdgeList {
                header: header(entity_type, directory, &cursor),
                edges,
            })
        }
        EntityType::Loop => {
            let count = cursor.count()?;
            // at least five fields per entry
            cursor.require(count.saturating_mul(5))?;
            let edges = (0..count)
                .map(|_| decode_loop_edge(&mut cursor))
                .collect::<Result<Vec<_>>>()?;
            Entity::Loop(Loop {
                header: header(entity_type, directory, &cursor),
                edges,
            })
        }
        EntityType::Face => {
            let surface = cursor.pointer()?;
            let count = cursor.count()?;
            let outer_loop_flag = cursor.flag()?;
            cursor.require(count)?;
            let loops = (0..count)
                .map(|_| cursor.pointer())
                .collect::<Result<Vec<_>>>()?;
            Entity::Face(Face {
                header: header(entity_type, directory, &cursor),
                surface,
                outer_loop_flag,
                loops,
            })
        }
        EntityType::Shell => {
            let count = cursor.count()?;
            cursor.require(count.saturating_mul(2))?;
            let faces = (0..count)
                .map(|_| {
                    Ok(ShellFace {
                        face: cursor.pointer()?,
                        orientation: cursor.flag()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Entity::Shell(Shell {
                header: header(entity_type, directory, &cursor),
                faces,
            })
        }
        EntityType::ManifoldSolid => {
            let shell = ShellRef {
                shell: cursor.pointer()?,
                orientation: cursor.flag()?,
            };
            let count = cursor.count()?;
            cursor.require(count.saturating_mul(2))?;
            let voids = (0..count)
                .map(|_| {
                    Ok(ShellRef {
                        shell: cursor.pointer()?,
                        orientation: cursor.flag()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Entity::ManifoldSolid(ManifoldSolid {
                header: header(entity_type, directory, &cursor),
                shell,
                voids,
            })
        }
        EntityType::RationalBSplineCurve => decode_curve(directory, &mut cursor)?,
        EntityType::RationalBSplineSurface => decode_surface(directory, &mut cursor)?,
    };

    tracing::debug!(
        seq,
        entity = entity_type.name(),
        fields = cursor.position(),
        "decoded entity"
    );
    Ok(entity)
}

fn header(entity_type: EntityType, directory: &RawDirectoryRecord, cursor: &ParameterCursor) -> EntityHeader {
    EntityHeader::from_directory(entity_type, directory, cursor.position())
}

fn decode_loop_edge(cursor: &mut ParameterCursor) -> Result<LoopEdge> {
    let is_vertex = cursor.int()? == 1;
    let list = cursor.pointer()?;
    let index = cursor.index()?;
    let orientation = cursor.flag()?;
    let curve_count = cursor.count()?;
    cursor.require(curve_count.saturating_mul(2))?;

    let mut curves = SmallVec::with_capacity(curve_count);
    for _ in 0..curve_count {
        curves.push(ParameterCurve {
            isoparametric: cursor.flag()?,
            curve: cursor.pointer()?,
        });
    }

    Ok(LoopEdge {
        is_vertex,
        list,
        index,
        orientation,
        curves,
    })
}

fn decode_curve(directory: &RawDirectoryRecord, cursor: &mut ParameterCursor) -> Result<Entity> {
    let upper_index = cursor.count()?;
    let degree = cursor.count()?;
    let planar = cursor.flag()?;
    let closed = cursor.flag()?;
    let polynomial = cursor.flag()?;
    let periodic = cursor.flag()?;

    let control_count = upper_index.saturating_add(1);
    let knots = cursor.reals(upper_index.saturating_add(degree).saturating_add(2))?;
    let weights = cursor.reals(control_count)?;
    let control_points = cursor.points(control_count)?;
    let u_start = cursor.real()?;
    let u_end = cursor.real()?;

    // Unit normal is only written for planar curves
    let normal = if cursor.remaining() >= 3 {
        Some(cursor.point()?)
    } else {
        None
    };

    Ok(Entity::RationalBSplineCurve(RationalBSplineCurve {
        header: header(EntityType::RationalBSplineCurve, directory, cursor),
        upper_index,
        degree,
        planar,
        closed,
        polynomial,
        periodic,
        knots,
        weights,
        control_points,
        u_start,
        u_end,
        normal,
    }))
}

fn decode_surface(directory: &RawDirectoryRecord, cursor: &mut ParameterCursor) -> Result<Entity> {
    let upper_index_u = cursor.count()?;
    let upper_index_v = cursor.count()?;
    let degree_u = cursor.count()?;
    let degree_v = cursor.count()?;
    let closed_u = cursor.flag()?;
    let closed_v = cursor.flag()?;
    let polynomial = cursor.flag()?;
    let periodic_u = cursor.flag()?;
    let periodic_v = cursor.flag()?;

    let u_knots = cursor.reals(upper_index_u.saturating_add(degree_u).saturating_add(2))?;
    let v_knots = cursor.reals(upper_index_v.saturating_add(degree_v).saturating_add(2))?;
    let control_count = upper_index_u
        .saturating_add(1)
        .saturating_mul(upper_index_v.saturating_add(1));
    let weights = cursor.reals(control_count)?;
    let control_points = cursor.points(control_count)?;
    let u_start = cursor.real()?;
    let u_end = cursor.real()?;
    let v_start = cursor.real()?;
    let v_end = cursor.real()?;

    Ok(Entity::RationalBSplineSurface(RationalBSplineSurface {
        header: header(EntityType::RationalBSplineSurface, directory, cursor),
        upper_index_u,
        upper_index_v,
        degree_u,
        degree_v,
        closed_u,
        closed_v,
        polynomial,
        periodic_u,
        periodic_v,
        u_knots,
        v_knots,
        weights,
        control_points,
        u_start,
        u_end,
        v_start,
        v_end,
    }))
}
