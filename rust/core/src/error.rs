// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for IGES reading and entity decoding.

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading records or decoding entities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A physical line does not follow the fixed 80-column layout
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Directory and parameter sections describe a different number of entities
    #[error("Section mismatch: {directory} directory records but {parameter} parameter records")]
    SectionMismatch { directory: usize, parameter: usize },

    /// Entity type code outside the supported set
    #[error("Unsupported entity type {0}")]
    UnsupportedEntity(i64),

    /// A pointer does not name an entity of the table
    #[error("Cannot resolve pointer {pointer}: {reason}")]
    PointerResolution { pointer: u32, reason: String },

    /// Positional unpacking ran past the end of the parameter list
    #[error("Entity {seq}: parameter list underflow (needed field {needed}, only {available} present)")]
    ParameterUnderflow {
        seq: u32,
        needed: usize,
        available: usize,
    },

    /// A field holds a value of the wrong kind
    #[error("Entity {seq}: field {position} is not a valid {expected}")]
    InvalidField {
        seq: u32,
        position: usize,
        expected: &'static str,
    },

    /// Decoding a specific entity failed
    #[error("Failed to decode entity {seq}: {source}")]
    Entity {
        seq: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a malformed-record error
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create a pointer-resolution error
    pub fn unresolved(pointer: u32, reason: impl Into<String>) -> Self {
        Error::PointerResolution {
            pointer,
            reason: reason.into(),
        }
    }

    /// Attach the sequence number of the entity being decoded
    pub fn in_entity(self, seq: u32) -> Self {
        match self {
            Error::Entity { .. } => self,
            other => Error::Entity {
                seq,
                source: Box::new(other),
            },
        }
    }
}
