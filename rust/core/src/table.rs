// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity Table - decoded entities addressed by sequence number
//!
//! Built once per file and immutable afterwards. Pointers resolve through a
//! map filled in a first pass over the directory, so a dangling pointer is an
//! error rather than an out-of-bounds index.

use rustc_hash::FxHashMap;

use crate::decoder::decode;
use crate::entities::{Edge, Entity, Face, Loop, Point3, SequenceNumber, Shell};
use crate::error::{Error, Result};
use crate::global::GlobalSection;
use crate::reader::read_records;

/// Unsupported entity encountered while loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkippedEntity {
    pub seq: SequenceNumber,
    pub code: i64,
}

/// All entities of one IGES file
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    entities: Vec<Option<Entity>>,
    index: FxHashMap<SequenceNumber, usize>,
    global: GlobalSection,
    start: Vec<String>,
    skipped: Vec<SkippedEntity>,
}

impl EntityTable {
    /// Decode the contents of an IGES file.
    ///
    /// Bytes that are not UTF-8 (Latin-1 labels) are replaced, which never
    /// affects the ASCII numeric data.
    pub fn decode_file(bytes: &[u8]) -> Result<Self> {
        let records = read_records(bytes)?;

        if records.directory.len() != records.parameter.len() {
            return Err(Error::SectionMismatch {
                directory: records.directory.len(),
                parameter: records.parameter.len(),
            });
        }

        let global = GlobalSection::parse(&records.global);

        // First pass: sequence number -> slot
        let mut index =
            FxHashMap::with_capacity_and_hasher(records.directory.len(), Default::default());
        for (slot, directory) in records.directory.iter().enumerate() {
            let seq = SequenceNumber(directory.seq_number);
            if index.insert(seq, slot).is_some() {
                return Err(Error::malformed(
                    directory.line,
                    format!("duplicate directory sequence number {}", seq),
                ));
            }
        }

        let mut entities = Vec::with_capacity(records.directory.len());
        let mut skipped = Vec::new();

        for (directory, parameter) in records.directory.iter().zip(&records.parameter) {
            let seq = directory.seq_number;
            if parameter.de_pointer != seq {
                tracing::warn!(
                    seq,
                    back_pointer = parameter.de_pointer,
                    "parameter record points at a different directory entry"
                );
            }

            match decode(directory, parameter, global.delimiters) {
                Ok(entity) => entities.push(Some(entity)),
                Err(Error::UnsupportedEntity(code)) => {
                    tracing::debug!(seq, code, "skipping unsupported entity");
                    skipped.push(SkippedEntity {
                        seq: SequenceNumber(seq),
                        code,
                    });
                    entities.push(None);
                }
                Err(e) => return Err(e.in_entity(seq)),
            }
        }

        let table = Self {
            entities,
            index,
            global,
            start: records.start,
            skipped,
        };

        tracing::info!(
            entities = table.len(),
            decoded = table.decoded_count(),
            faces = table.faces().count(),
            unsupported = table.skipped.len(),
            "IGES file loaded"
        );
        if !table.skipped.is_empty() {
            tracing::warn!(
                codes = ?table.unsupported_codes(),
                "unsupported entity types left as empty slots"
            );
        }

        Ok(table)
    }

    pub fn decode_str(content: &str) -> Result<Self> {
        Self::decode_file(content.as_bytes())
    }

    /// Number of directory entries (decoded or not)
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn decoded_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_some()).count()
    }

    pub fn global(&self) -> &GlobalSection {
        &self.global
    }

    /// Start section lines
    pub fn start(&self) -> &[String] {
        &self.start
    }

    /// Entity slots in directory order
    pub fn slots(&self) -> &[Option<Entity>] {
        &self.entities
    }

    /// Unsupported entities in directory order
    pub fn skipped(&self) -> &[SkippedEntity] {
        &self.skipped
    }

    /// Distinct unsupported type codes, ascending
    pub fn unsupported_codes(&self) -> Vec<i64> {
        let mut codes: Vec<i64> = self.skipped.iter().map(|s| s.code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    /// Table slot of a sequence number
    pub fn slot_of(&self, seq: SequenceNumber) -> Result<usize> {
        self.index
            .get(&seq)
            .copied()
            .ok_or_else(|| Error::unresolved(seq.get(), "no directory entry with this sequence number"))
    }

    /// Slot content: `None` for an unsupported entity
    pub fn try_resolve(&self, seq: SequenceNumber) -> Result<Option<&Entity>> {
        let slot = self.slot_of(seq)?;
        Ok(self.entities[slot].as_ref())
    }

    /// Decoded entity, failing for empty slots
    pub fn resolve(&self, seq: SequenceNumber) -> Result<&Entity> {
        self.try_resolve(seq)?
            .ok_or_else(|| Error::unresolved(seq.get(), "entity type is not supported"))
    }

    pub fn face(&self, seq: SequenceNumber) -> Result<&Face> {
        let entity = self.resolve(seq)?;
        entity.as_face().ok_or_else(|| wrong_type(seq, "Face", entity))
    }

    pub fn loop_entity(&self, seq: SequenceNumber) -> Result<&Loop> {
        let entity = self.resolve(seq)?;
        entity.as_loop().ok_or_else(|| wrong_type(seq, "Loop", entity))
    }

    /// Vertex `index` (1-based) of vertex list `list`
    pub fn vertex(&self, list: SequenceNumber, index: usize) -> Result<Point3> {
        let entity = self.resolve(list)?;
        let vertices = entity
            .as_vertex_list()
            .ok_or_else(|| wrong_type(list, "VertexList", entity))?;
        vertices.vertex(index).ok_or_else(|| {
            Error::unresolved(
                list.get(),
                format!("vertex index {} outside 1..={}", index, vertices.vertices.len()),
            )
        })
    }

    /// Edge `index` (1-based) of edge list `list`
    pub fn edge(&self, list: SequenceNumber, index: usize) -> Result<&Edge> {
        let entity = self.resolve(list)?;
        let edges = entity
            .as_edge_list()
            .ok_or_else(|| wrong_type(list, "EdgeList", entity))?;
        edges.edge(index).ok_or_else(|| {
            Error::unresolved(
                list.get(),
                format!("edge index {} outside 1..={}", index, edges.edges.len()),
            )
        })
    }

    /// All decoded entities in directory order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().flatten()
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.entities().filter_map(Entity::as_face)
    }

    pub fn shells(&self) -> impl Iterator<Item = &Shell> {
        self.entities().filter_map(Entity::as_shell)
    }
}

fn wrong_type(seq: SequenceNumber, expected: &str, found: &Entity) -> Error {
    Error::unresolved(
        seq.get(),
        format!("expected {}, found {}", expected, found.entity_type()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::{directory_lines, parameter_line, text_line};

    fn square_file() -> String {
        [
            text_line("unit square", 'S', 1),
            text_line("1H,,1H;;", 'G', 1),
            directory_lines(502, 1, 2, 1, 1),
            directory_lines(504, 3, 1, 1, 3),
            directory_lines(110, 4, 1, 0, 5),
            directory_lines(510, 5, 1, 1, 7),
            parameter_line("502,4,0.,0.,0.,1.,0.,0.,1.,1.,0.,", 1, 1),
            parameter_line("0.,1.,0.;", 1, 2),
            parameter_line("504,1,5,1,1,1,2;", 3, 3),
            parameter_line("110,0.,0.,0.,1.,0.,0.;", 5, 4),
            parameter_line("510,0,1,1,9;", 7, 5),
        ]
        .join("\n")
    }

    #[test]
    fn test_decode_table() {
        let table = EntityTable::decode_str(&square_file()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.decoded_count(), 3);
        assert_eq!(table.start(), &["unit square".to_string()]);
        assert_eq!(table.faces().count(), 1);
        assert_eq!(table.shells().count(), 0);
    }

    #[test]
    fn test_unsupported_entity_leaves_empty_slot() {
        let table = EntityTable::decode_str(&square_file()).unwrap();
        assert_eq!(table.slots()[2], None);
        assert_eq!(table.try_resolve(SequenceNumber(5)).unwrap(), None);
        assert_eq!(table.unsupported_codes(), vec![110]);
        assert_eq!(
            table.skipped(),
            &[SkippedEntity {
                seq: SequenceNumber(5),
                code: 110
            }]
        );
        assert!(matches!(
            table.resolve(SequenceNumber(5)),
            Err(Error::PointerResolution { pointer: 5, .. })
        ));
    }

    #[test]
    fn test_resolve_by_sequence_number() {
        let table = EntityTable::decode_str(&square_file()).unwrap();
        assert_eq!(table.slot_of(SequenceNumber(7)).unwrap(), 3);
        assert_eq!(table.vertex(SequenceNumber(1), 3).unwrap(), [1.0, 1.0, 0.0]);
        assert_eq!(table.edge(SequenceNumber(3), 1).unwrap().end_index, 2);
        assert_eq!(table.face(SequenceNumber(7)).unwrap().loops, vec![SequenceNumber(9)]);
    }

    #[test]
    fn test_resolution_errors() {
        let table = EntityTable::decode_str(&square_file()).unwrap();
        assert!(matches!(
            table.resolve(SequenceNumber(2)),
            Err(Error::PointerResolution { pointer: 2, .. })
        ));
        assert!(matches!(
            table.vertex(SequenceNumber(1), 5),
            Err(Error::PointerResolution { pointer: 1, .. })
        ));
        assert!(matches!(
            table.face(SequenceNumber(1)),
            Err(Error::PointerResolution { pointer: 1, .. })
        ));
    }

    #[test]
    fn test_section_count_mismatch() {
        let content = [
            directory_lines(502, 1, 1, 1, 1),
            directory_lines(502, 2, 1, 1, 3),
            parameter_line("502,1,0.,0.,0.;", 1, 1),
        ]
        .join("\n");
        assert_eq!(
            EntityTable::decode_str(&content).unwrap_err(),
            Error::SectionMismatch {
                directory: 2,
                parameter: 1
            }
        );
    }

    #[test]
    fn test_entity_error_aborts_load() {
        let content = [
            directory_lines(510, 1, 1, 1, 1),
            parameter_line("510,1,3,1,7;", 1, 1),
        ]
        .join("\n");
        match EntityTable::decode_str(&content) {
            Err(Error::Entity { seq, source }) => {
                assert_eq!(seq, 1);
                assert!(matches!(*source, Error::ParameterUnderflow { .. }));
            }
            other => panic!("expected entity error, got {:?}", other),
        }
    }

    #[test]
    fn test_latin1_bytes_are_tolerated() {
        let mut bytes = square_file().into_bytes();
        // Start section text is free-form; replace a letter with a Latin-1 byte
        bytes[0] = 0xE9;
        let table = EntityTable::decode_file(&bytes).unwrap();
        assert_eq!(table.len(), 4);
    }
}
