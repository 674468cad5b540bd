// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record Reader - fixed-column section splitting
//!
//! IGES files are made of 80-column physical lines. Column 73 carries the
//! section flag, columns 74-80 the line's sequence number within its section.
//!
//! - Start (`S`) and Global (`G`) lines carry free text in columns 1-72
//! - Directory (`D`) entries span two lines of ten 8-column fields each
//! - Parameter (`P`) lines carry data in columns 1-64 and the owning
//!   directory entry's sequence number in columns 65-72

use crate::error::{Error, Result};

/// Zero-based index of the section flag (column 73)
pub const FLAG_COLUMN: usize = 72;
/// Minimum length of a non-empty physical line
pub const MIN_LINE_LEN: usize = FLAG_COLUMN + 1;
/// Width of the free-format data area of a parameter line
pub const PARAMETER_DATA_COLUMNS: usize = 64;
/// Width of a directory field
pub const DIRECTORY_FIELD_WIDTH: usize = 8;

/// File section, identified by the flag column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Start,
    Global,
    Directory,
    Parameter,
    Terminate,
}

impl Section {
    fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            b'S' => Some(Section::Start),
            b'G' => Some(Section::Global),
            b'D' => Some(Section::Directory),
            b'P' => Some(Section::Parameter),
            b'T' => Some(Section::Terminate),
            _ => None,
        }
    }
}

/// One directory entry (two physical `D` lines)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawDirectoryRecord {
    pub entity_type: i64,
    /// Sequence number of the first parameter line
    pub pd_pointer: u32,
    pub transform: i64,
    /// Number of parameter lines
    pub param_count: u32,
    pub form: i64,
    pub label: String,
    pub seq_number: u32,
    /// 1-based file line of the first physical line (diagnostics)
    pub line: usize,
}

/// Concatenated parameter data of one entity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawParameterRecord {
    /// Directory back-pointer shared by all physical lines of the record
    pub de_pointer: u32,
    /// Sequence number of the first physical line
    pub first_line: u32,
    /// Columns 1-64 of every physical line, concatenated in arrival order
    pub data: String,
}

/// All sections of an IGES file, still untyped
#[derive(Debug, Clone, Default)]
pub struct RawRecords {
    pub start: Vec<String>,
    /// Columns 1-72 of every `G` line, concatenated
    pub global: String,
    pub directory: Vec<RawDirectoryRecord>,
    pub parameter: Vec<RawParameterRecord>,
}

/// Split file content into raw records.
///
/// Columns are cut on bytes; text that is not UTF-8 is replaced afterwards,
/// so Latin-1 labels never shift the fixed layout.
pub fn read_records(content: &[u8]) -> Result<RawRecords> {
    let mut records = RawRecords::default();
    let mut pending_directory: Option<(usize, &[u8])> = None;

    for (line_no, line) in physical_lines(content) {
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }
        if line.len() < MIN_LINE_LEN {
            return Err(Error::malformed(
                line_no,
                format!(
                    "line has {} columns, expected at least {}",
                    line.len(),
                    MIN_LINE_LEN
                ),
            ));
        }

        let flag = line[FLAG_COLUMN];
        let section = Section::from_flag(flag).ok_or_else(|| {
            Error::malformed(
                line_no,
                format!("missing section flag in column 73 (found {:?})", flag as char),
            )
        })?;

        match section {
            Section::Start => records
                .start
                .push(column_text(line, 0, FLAG_COLUMN).trim_end().to_string()),
            Section::Global => records.global.push_str(&column_text(line, 0, FLAG_COLUMN)),
            Section::Directory => match pending_directory.take() {
                None => pending_directory = Some((line_no, line)),
                Some((first_no, first)) => {
                    records
                        .directory
                        .push(parse_directory_entry(first_no, first, line)?);
                }
            },
            Section::Parameter => push_parameter_line(&mut records.parameter, line_no, line)?,
            Section::Terminate => {}
        }
    }

    if let Some((line_no, _)) = pending_directory {
        return Err(Error::malformed(
            line_no,
            "directory entry is missing its second line",
        ));
    }

    Ok(records)
}

/// Iterate physical lines with 1-based line numbers, stripping `\r`
fn physical_lines(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    let mut start = 0;
    let mut breaks = memchr::memchr_iter(b'\n', bytes);
    let mut finished = false;

    std::iter::from_fn(move || {
        if finished {
            return None;
        }
        let end = match breaks.next() {
            Some(end) => end,
            None => {
                finished = true;
                bytes.len()
            }
        };
        let mut line = &bytes[start..end];
        start = end + 1;
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        Some(line)
    })
    .enumerate()
    .map(|(i, line)| (i + 1, line))
}

/// Text of columns `[start, end)`, clipped to the line length
fn column_text(line: &[u8], start: usize, end: usize) -> String {
    let end = end.min(line.len());
    if start >= end {
        return String::new();
    }
    String::from_utf8_lossy(&line[start..end]).into_owned()
}

/// Integer in a fixed-width field. Blank fields read as 0.
fn column_int(line: &[u8], line_no: usize, start: usize, end: usize, name: &str) -> Result<i64> {
    let text = column_text(line, start, end);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    lexical_core::parse::<i64>(unsigned.as_bytes()).map_err(|_| {
        Error::malformed(line_no, format!("{} field {:?} is not an integer", name, trimmed))
    })
}

fn column_u32(line: &[u8], line_no: usize, start: usize, end: usize, name: &str) -> Result<u32> {
    let value = column_int(line, line_no, start, end, name)?;
    u32::try_from(value)
        .map_err(|_| Error::malformed(line_no, format!("{} field {} is out of range", name, value)))
}

/// Field `n` (1-based) of a directory line
fn directory_field(n: usize) -> (usize, usize) {
    let start = (n - 1) * DIRECTORY_FIELD_WIDTH;
    (start, start + DIRECTORY_FIELD_WIDTH)
}

fn sequence_number(line: &[u8], line_no: usize) -> Result<u32> {
    let seq = column_u32(line, line_no, FLAG_COLUMN + 1, 80, "sequence number")?;
    if seq == 0 {
        return Err(Error::malformed(line_no, "missing sequence number"));
    }
    Ok(seq)
}

fn parse_directory_entry(line_no: usize, first: &[u8], second: &[u8]) -> Result<RawDirectoryRecord> {
    let (s, e) = directory_field(1);
    let entity_type = column_int(first, line_no, s, e, "entity type")?;
    let (s, e) = directory_field(2);
    let pd_pointer = column_u32(first, line_no, s, e, "parameter pointer")?;
    let (s, e) = directory_field(7);
    let transform = column_int(first, line_no, s, e, "transformation matrix")?;
    let seq_number = sequence_number(first, line_no)?;

    let second_no = line_no + 1;
    let (s, e) = directory_field(1);
    let repeated_type = column_int(second, second_no, s, e, "entity type")?;
    if repeated_type != entity_type {
        return Err(Error::malformed(
            second_no,
            format!(
                "directory lines disagree on entity type ({} vs {})",
                entity_type, repeated_type
            ),
        ));
    }
    let (s, e) = directory_field(4);
    let param_count = column_u32(second, second_no, s, e, "parameter line count")?;
    let (s, e) = directory_field(5);
    let form = column_int(second, second_no, s, e, "form number")?;
    let (s, e) = directory_field(8);
    let label = column_text(second, s, e).trim().to_string();

    Ok(RawDirectoryRecord {
        entity_type,
        pd_pointer,
        transform,
        param_count,
        form,
        label,
        seq_number,
        line: line_no,
    })
}

fn push_parameter_line(
    records: &mut Vec<RawParameterRecord>,
    line_no: usize,
    line: &[u8],
) -> Result<()> {
    let de_pointer = column_u32(line, line_no, PARAMETER_DATA_COLUMNS, FLAG_COLUMN, "directory pointer")?;
    let data = column_text(line, 0, PARAMETER_DATA_COLUMNS);

    match records.last_mut() {
        Some(last) if last.de_pointer == de_pointer => last.data.push_str(&data),
        _ => records.push(RawParameterRecord {
            de_pointer,
            first_line: sequence_number(line, line_no)?,
            data,
        }),
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Format a Start/Global/Terminate line
    pub(crate) fn text_line(text: &str, flag: char, seq: u32) -> String {
        format!("{:<72}{}{:>7}", text, flag, seq)
    }

    /// Format the two lines of a directory entry
    pub(crate) fn directory_lines(entity_type: i64, pd: u32, lines: u32, form: i64, seq: u32) -> String {
        let first = format!(
            "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}D{:>7}",
            entity_type, pd, 0, 0, 0, 0, 0, 0, "00000000", seq
        );
        let second = format!(
            "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}D{:>7}",
            entity_type, 0, 0, lines, form, "", "", "", 0, seq + 1
        );
        format!("{}\n{}", first, second)
    }

    /// Format a parameter line
    pub(crate) fn parameter_line(data: &str, de: u32, seq: u32) -> String {
        format!("{:<64}{:>8}P{:>7}", data, de, seq)
    }

    #[test]
    fn test_read_sections() {
        let content = [
            text_line("generated for testing", 'S', 1),
            text_line("1H,,1H;,4Htest;", 'G', 1),
            directory_lines(502, 1, 2, 1, 1),
            parameter_line("502,1,", 1, 1),
            parameter_line("0.,0.,1.5;", 1, 2),
            text_line("S      1G      1D      2P      2", 'T', 1),
        ]
        .join("\n");

        let records = read_records(content.as_bytes()).unwrap();
        assert_eq!(records.start, vec!["generated for testing".to_string()]);
        assert!(records.global.starts_with("1H,,1H;,4Htest;"));
        assert_eq!(records.directory.len(), 1);
        assert_eq!(records.parameter.len(), 1);

        let dir = &records.directory[0];
        assert_eq!(dir.entity_type, 502);
        assert_eq!(dir.pd_pointer, 1);
        assert_eq!(dir.param_count, 2);
        assert_eq!(dir.form, 1);
        assert_eq!(dir.seq_number, 1);

        let param = &records.parameter[0];
        assert_eq!(param.de_pointer, 1);
        assert_eq!(param.first_line, 1);
        assert!(param.data.starts_with("502,1,"));
        assert!(param.data.trim_end().ends_with("0.,0.,1.5;"));
    }

    #[test]
    fn test_crlf_and_trailing_blank_lines() {
        let content = format!(
            "{}\r\n{}\r\n\r\n",
            text_line("x", 'S', 1),
            text_line("", 'G', 1)
        );
        let records = read_records(content.as_bytes()).unwrap();
        assert_eq!(records.start.len(), 1);
    }

    #[test]
    fn test_short_line_is_malformed() {
        let content = format!("{}\n502,1;", text_line("x", 'S', 1));
        match read_records(content.as_bytes()) {
            Err(Error::MalformedRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_flag_is_malformed() {
        let content = format!("{:<72} {:>7}", "no flag here", 1);
        assert!(matches!(
            read_records(content.as_bytes()),
            Err(Error::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn test_unpaired_directory_line() {
        let dir = directory_lines(510, 1, 1, 1, 1);
        let first_only = dir.lines().next().unwrap().to_string();
        assert!(matches!(
            read_records(first_only.as_bytes()),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_parameter_lines_grouped_by_back_pointer() {
        let content = [
            directory_lines(502, 1, 1, 1, 1),
            directory_lines(502, 2, 1, 1, 3),
            parameter_line("502,1,0.,0.,0.;", 1, 1),
            parameter_line("502,1,1.,1.,1.;", 3, 2),
        ]
        .join("\n");
        let records = read_records(content.as_bytes()).unwrap();
        assert_eq!(records.parameter.len(), 2);
        assert_eq!(records.parameter[1].de_pointer, 3);
        assert_eq!(records.parameter[1].first_line, 2);
    }
}
