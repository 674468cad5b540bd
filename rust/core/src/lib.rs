// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IGES-Lite Core Parser
//!
//! Fixed-column IGES reader and B-rep entity decoder built with
//! [nom](https://docs.rs/nom).
//!
//! ## Overview
//!
//! - **Record Reading**: 80-column lines split by section flag using
//!   [memchr](https://docs.rs/memchr)
//! - **Field Parsing**: delimiter-aware tokenizer with Hollerith strings and
//!   FORTRAN `D` exponents
//! - **Entity Decoding**: positional unpacking of vertex/edge lists, loops,
//!   faces, shells, solids and rational B-splines
//! - **Entity Table**: sequence-number addressed entities with checked
//!   pointer resolution
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use iges_lite_core::{EntityTable, SequenceNumber};
//!
//! let bytes = std::fs::read("part.igs")?;
//! let table = EntityTable::decode_file(&bytes)?;
//!
//! for face in table.faces() {
//!     println!("Face {} on surface {}", face.seq(), face.surface);
//! }
//!
//! let vertex = table.vertex(SequenceNumber(1), 1)?;
//! ```
//!
//! Only entity types 126, 128, 186, 502, 504, 508, 510 and 514 are decoded.
//! Every other type leaves an empty table slot and is listed in
//! [`EntityTable::skipped`].
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for parsed data

pub mod decoder;
pub mod entities;
pub mod error;
pub mod global;
pub mod parser;
pub mod reader;
pub mod table;

pub use decoder::{decode, ParameterCursor};
pub use entities::{
    Edge, EdgeList, Entity, EntityHeader, EntityType, Face, Loop, LoopEdge, ManifoldSolid,
    ParameterCurve, Point3, RationalBSplineCurve, RationalBSplineSurface, SequenceNumber, Shell,
    ShellFace, ShellRef, VertexList,
};
pub use error::{Error, Result};
pub use global::GlobalSection;
pub use parser::{parse_fields, Delimiters, Field};
pub use reader::{read_records, RawDirectoryRecord, RawParameterRecord, RawRecords};
pub use table::{EntityTable, SkippedEntity};

/// Decode an IGES file held in memory
pub fn decode_file(bytes: &[u8]) -> Result<EntityTable> {
    EntityTable::decode_file(bytes)
}

/// Decode IGES text
pub fn decode_str(content: &str) -> Result<EntityTable> {
    EntityTable::decode_str(content)
}
