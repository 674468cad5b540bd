// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Global section parsing and unit conversion
//!
//! The Global section declares the delimiters used by every parameter record,
//! followed by file metadata and the model unit.

use crate::parser::{parse_fields, Delimiters, Field};

/// Unit flag used when the Global section omits it (inches)
pub const DEFAULT_UNIT_FLAG: i64 = 1;

/// Parsed Global section
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalSection {
    pub delimiters: Delimiters,
    pub sender_id: String,
    pub file_name: String,
    pub system_id: String,
    pub preprocessor_version: String,
    pub model_scale: f64,
    pub unit_flag: i64,
    pub unit_name: String,
    pub min_resolution: f64,
}

impl Default for GlobalSection {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            sender_id: String::new(),
            file_name: String::new(),
            system_id: String::new(),
            preprocessor_version: String::new(),
            model_scale: 1.0,
            unit_flag: DEFAULT_UNIT_FLAG,
            unit_name: String::new(),
            min_resolution: 0.0,
        }
    }
}

impl GlobalSection {
    /// Parse the concatenated data columns of the `G` lines.
    ///
    /// Never fails: missing or unreadable fields keep their defaults.
    pub fn parse(data: &str) -> Self {
        let mut global = GlobalSection::default();
        let (delimiters, rest) = read_delimiters(data);
        global.delimiters = delimiters;

        let Some(rest) = rest else {
            return global;
        };

        // rest[0] is field 3
        let fields = parse_fields(rest, delimiters);
        let text = |n: usize| -> String {
            fields
                .get(n - 3)
                .and_then(Field::as_text)
                .map(str::to_string)
                .unwrap_or_default()
        };
        let real = |n: usize, default: f64| -> f64 {
            match fields.get(n - 3) {
                Some(Field::Empty) | None => default,
                Some(field) => field.as_real().unwrap_or(default),
            }
        };

        global.sender_id = text(3);
        global.file_name = text(4);
        global.system_id = text(5);
        global.preprocessor_version = text(6);
        global.model_scale = real(13, 1.0);
        global.unit_flag = match fields.get(14 - 3) {
            Some(Field::Empty) | None => DEFAULT_UNIT_FLAG,
            Some(field) => field.as_int().unwrap_or(DEFAULT_UNIT_FLAG),
        };
        global.unit_name = text(15);
        global.min_resolution = real(19, 0.0);

        global
    }

    /// Millimetres per model unit, `None` for an unknown unit
    pub fn unit_scale_to_mm(&self) -> Option<f64> {
        match self.unit_flag {
            3 => scale_for_unit_name(&self.unit_name),
            flag => scale_for_unit_flag(flag),
        }
    }
}

fn scale_for_unit_flag(flag: i64) -> Option<f64> {
    let scale = match flag {
        1 => 25.4,
        2 => 1.0,
        4 => 304.8,
        5 => 1_609_344.0,
        6 => 1_000.0,
        7 => 1_000_000.0,
        8 => 0.0254,
        9 => 0.001,
        10 => 10.0,
        11 => 0.0000254,
        _ => return None,
    };
    Some(scale)
}

fn scale_for_unit_name(name: &str) -> Option<f64> {
    let flag = match name.trim().to_ascii_uppercase().as_str() {
        "IN" | "INCH" => 1,
        "MM" => 2,
        "FT" => 4,
        "MI" => 5,
        "M" => 6,
        "KM" => 7,
        "MIL" => 8,
        "UM" => 9,
        "CM" => 10,
        "UIN" => 11,
        _ => return None,
    };
    scale_for_unit_flag(flag)
}

/// Read fields 1 and 2. Returns the delimiters and the text after field 2's
/// terminating delimiter, if any.
fn read_delimiters(data: &str) -> (Delimiters, Option<&str>) {
    let mut delimiters = Delimiters::default();
    let mut rest = data.trim_start();

    // Field 1: parameter delimiter
    if let Some((c, after)) = one_char_hollerith(rest) {
        delimiters.parameter = c;
        rest = after;
    }
    match rest.chars().next() {
        Some(c) if c == delimiters.parameter => rest = &rest[c.len_utf8()..],
        _ => return (delimiters, None),
    }

    // Field 2: record delimiter
    if let Some((c, after)) = one_char_hollerith(rest.trim_start()) {
        delimiters.record = c;
        rest = after;
    }
    match rest.chars().next() {
        Some(c) if c == delimiters.parameter => (delimiters, Some(&rest[c.len_utf8()..])),
        _ => (delimiters, None),
    }
}

/// `1H<c>` at the start of `input`
fn one_char_hollerith(input: &str) -> Option<(char, &str)> {
    let after = input
        .strip_prefix("1H")
        .or_else(|| input.strip_prefix("1h"))?;
    let c = after.chars().next()?;
    Some((c, &after[c.len_utf8()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBAL: &str = "1H,,1H;,7HSENDER1,9Hpart.igs,6HSYSTEM,3H1.0,32,38,6,308,15,\
                          7HRECEIVE,1.0,2,2HMM,1,0.01,15H20240101.120000,1.0E-6,100.,;";

    #[test]
    fn test_parse_global_fields() {
        let global = GlobalSection::parse(GLOBAL);
        assert_eq!(global.delimiters, Delimiters::default());
        assert_eq!(global.sender_id, "SENDER1");
        assert_eq!(global.file_name, "part.igs");
        assert_eq!(global.system_id, "SYSTEM");
        assert_eq!(global.preprocessor_version, "1.0");
        assert_eq!(global.model_scale, 1.0);
        assert_eq!(global.unit_flag, 2);
        assert_eq!(global.unit_name, "MM");
        assert_eq!(global.min_resolution, 1.0e-6);
        assert_eq!(global.unit_scale_to_mm(), Some(1.0));
    }

    #[test]
    fn test_custom_delimiters() {
        let global = GlobalSection::parse("1H//1H:/4HSEND/8Hfile.igs:");
        assert_eq!(global.delimiters, Delimiters::new('/', ':'));
        assert_eq!(global.sender_id, "SEND");
        assert_eq!(global.file_name, "file.igs");
    }

    #[test]
    fn test_defaulted_delimiters() {
        let global = GlobalSection::parse(",,4HSEND;");
        assert_eq!(global.delimiters, Delimiters::default());
        assert_eq!(global.sender_id, "SEND");
        assert_eq!(global.unit_flag, DEFAULT_UNIT_FLAG);
    }

    #[test]
    fn test_empty_global() {
        let global = GlobalSection::parse("");
        assert_eq!(global, GlobalSection::default());
        assert_eq!(global.unit_scale_to_mm(), Some(25.4));
    }

    #[test]
    fn test_unit_scale() {
        let mut global = GlobalSection::default();
        global.unit_flag = 6;
        assert_eq!(global.unit_scale_to_mm(), Some(1000.0));
        global.unit_flag = 3;
        global.unit_name = "ft".into();
        assert_eq!(global.unit_scale_to_mm(), Some(304.8));
        global.unit_name = "furlong".into();
        assert_eq!(global.unit_scale_to_mm(), None);
        global.unit_flag = 42;
        assert_eq!(global.unit_scale_to_mm(), None);
    }
}
