//! Field descriptors: the typed column metadata that follows the header
//!.

pub mod value;

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::encoding::{EncodingRsTranscoder, Transcoder, HEADER_LABEL_ENCODING};
use crate::error::ErrorKind;
use crate::header::Version;

/// Size in bytes of one field descriptor entry in the header.
pub(crate) const FIELD_DESCRIPTOR_SIZE: usize = 32;

/// The closed set of field-type letters this crate understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `C` — fixed-width text.
    Character,
    /// `N` — numeric-as-text.
    Numeric,
    /// `F` — float-as-text, decoded exactly like `Numeric`.
    Float,
    /// `L` — one-byte boolean.
    Logical,
    /// `D` — 8-byte `YYYYMMDD` text.
    Date,
    /// `I` — 32-bit little-endian signed integer.
    Integer,
    /// `T` — VFP datetime (Julian day + ms-since-midnight).
    DateTime,
    /// `B` — IEEE-754 little-endian double.
    Double,
    /// `M` — memo block reference.
    Memo,
}

impl FieldType {
    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(FieldType::Character),
            'N' => Some(FieldType::Numeric),
            'F' => Some(FieldType::Float),
            'L' => Some(FieldType::Logical),
            'D' => Some(FieldType::Date),
            'I' => Some(FieldType::Integer),
            'T' => Some(FieldType::DateTime),
            'B' => Some(FieldType::Double),
            'M' => Some(FieldType::Memo),
            _ => None,
        }
    }

    pub(crate) fn to_char(self) -> char {
        match self {
            FieldType::Character => 'C',
            FieldType::Numeric => 'N',
            FieldType::Float => 'F',
            FieldType::Logical => 'L',
            FieldType::Date => 'D',
            FieldType::Integer => 'I',
            FieldType::DateTime => 'T',
            FieldType::Double => 'B',
            FieldType::Memo => 'M',
        }
    }

    /// Fixed in-record size for types whose size does not vary by field
    ///; `None` for `Character`/
    /// `Numeric`/`Float`, whose width is chosen per field.
    pub(crate) fn fixed_size(self) -> Option<u8> {
        match self {
            FieldType::Logical => Some(1),
            FieldType::Date => Some(8),
            FieldType::Integer => Some(4),
            FieldType::Memo => Some(10),
            FieldType::DateTime => Some(8),
            FieldType::Double => Some(8),
            FieldType::Character | FieldType::Numeric | FieldType::Float => None,
        }
    }
}

/// A validated field name: 1–10 bytes once encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldName(pub(crate) String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> Result<Self, ErrorKind> {
        let name = name.into();
        if name.is_empty() || name.len() > 10 || !name.is_ascii() {
            return Err(ErrorKind::FieldNameInvalid(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One column definition, as it appears in the field descriptor table and
/// as it is exposed on the public handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: FieldName,
    pub field_type: FieldType,
    pub field_length: u8,
    pub num_decimal_places: u8,
}

impl FieldInfo {
    pub fn new(name: FieldName, field_type: FieldType, field_length: u8) -> Self {
        Self {
            name,
            field_type,
            field_length,
            num_decimal_places: 0,
        }
    }

    pub(crate) fn read_from<R: Read>(source: &mut R) -> std::io::Result<RawFieldInfo> {
        let mut name_bytes = [0u8; 11];
        source.read_exact(&mut name_bytes)?;
        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(11);
        // Field names are always latin1/ISO-8859-1 regardless of the data
        // encoding.
        let transcoder = EncodingRsTranscoder;
        let name = transcoder
            .decode(&name_bytes[..name_end], HEADER_LABEL_ENCODING)
            .expect("ISO-8859-1 never fails to decode")
            .into_owned();

        let type_char = source.read_u8()? as char;

        let mut reserved = [0u8; 4];
        source.read_exact(&mut reserved)?;

        let field_length = source.read_u8()?;
        let num_decimal_places = source.read_u8()?;

        let mut reserved_tail = [0u8; 14];
        source.read_exact(&mut reserved_tail)?;
        // Work-area id lives at offset 18..32's first byte; we don't use
        // it but it is written as 1 on create.

        Ok(RawFieldInfo {
            name,
            type_char,
            field_length,
            num_decimal_places,
        })
    }

    pub(crate) fn write_to<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        let transcoder = EncodingRsTranscoder;
        let encoded_name = transcoder
            .encode(self.name.as_str(), HEADER_LABEL_ENCODING)
            .expect("ISO-8859-1 never fails to encode ASCII names");
        let mut name_bytes = [0u8; 11];
        let len = encoded_name.len().min(11);
        name_bytes[..len].copy_from_slice(&encoded_name[..len]);
        dest.write_all(&name_bytes)?;

        dest.write_u8(self.field_type.to_char() as u8)?;
        dest.write_all(&[0u8; 4])?; // reserved
        dest.write_u8(self.field_length)?;
        dest.write_u8(self.num_decimal_places)?;

        let mut reserved_tail = [0u8; 14];
        reserved_tail[0] = 1; // work area id
        dest.write_all(&reserved_tail)?;
        Ok(())
    }
}

/// Intermediate result of parsing one 32-byte descriptor, before the type
/// char has been validated against the closed set (needed so loose mode can
/// retain unknown types without failing the whole parse).
pub(crate) struct RawFieldInfo {
    pub name: String,
    pub type_char: char,
    pub field_length: u8,
    pub num_decimal_places: u8,
}

/// Validates one field descriptor against the per-type size/decimal rules.
/// On `create`, memo fields are always rejected — writing memo content is
/// never supported, so there's no point creating the field at all.
pub(crate) fn validate_descriptor(
    info: &FieldInfo,
    version: Version,
    for_create: bool,
) -> Result<(), ErrorKind> {
    if info.name.0.is_empty() || info.name.0.len() > 10 {
        return Err(ErrorKind::FieldNameInvalid(info.name.0.clone()));
    }

    if for_create && info.field_type == FieldType::Memo {
        return Err(ErrorKind::MemoWriteUnsupported);
    }

    match info.field_type {
        FieldType::Character => {
            if info.field_length == 0 {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "character fields must have size 1..=255",
                });
            }
        }
        FieldType::Numeric | FieldType::Float => {
            if info.field_length == 0 || info.field_length > 20 {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "numeric fields must have size 1..=20",
                });
            }
            if info.num_decimal_places > version.max_numeric_decimals() {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "too many decimal places for this file version",
                });
            }
        }
        FieldType::Logical => {
            if info.field_length != 1 {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "logical fields must have size 1",
                });
            }
        }
        FieldType::Date => {
            if info.field_length != 8 {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "date fields must have size 8",
                });
            }
        }
        FieldType::Integer => {
            if info.field_length != 4 {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "integer fields must have size 4",
                });
            }
        }
        FieldType::Memo => {
            if info.field_length != 10 {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "memo fields must have size 10",
                });
            }
        }
        FieldType::DateTime | FieldType::Double => {
            if info.field_length != 8 {
                return Err(ErrorKind::FieldSizeInvalid {
                    field: info.name.0.clone(),
                    reason: "this field type must have size 8",
                });
            }
        }
    }
    Ok(())
}

/// Ensures every name in `fields` is unique.
pub(crate) fn check_unique_names(fields: &[FieldInfo]) -> Result<(), ErrorKind> {
    for (i, f) in fields.iter().enumerate() {
        if fields[..i].iter().any(|other| other.name == f.name) {
            return Err(ErrorKind::DuplicateFieldName(f.name.0.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn field_type_round_trips_through_char() {
        for t in [
            FieldType::Character,
            FieldType::Numeric,
            FieldType::Float,
            FieldType::Logical,
            FieldType::Date,
            FieldType::Integer,
            FieldType::DateTime,
            FieldType::Double,
            FieldType::Memo,
        ] {
            assert_eq!(FieldType::from_char(t.to_char()), Some(t));
        }
    }

    #[test]
    fn descriptor_read_write_round_trip() {
        let info = FieldInfo::new(FieldName::new("AFCLPD").unwrap(), FieldType::Character, 1);
        let mut buf = Vec::new();
        info.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), FIELD_DESCRIPTOR_SIZE);

        let mut cursor = std::io::Cursor::new(buf);
        let raw = FieldInfo::read_from(&mut cursor).unwrap();
        assert_eq!(raw.name, "AFCLPD");
        assert_eq!(raw.type_char, 'C');
        assert_eq!(raw.field_length, 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fields = vec![
            FieldInfo::new(FieldName::new("POINT_ID").unwrap(), FieldType::Integer, 4),
            FieldInfo::new(FieldName::new("POINT_ID").unwrap(), FieldType::Integer, 4),
        ];
        assert!(matches!(
            check_unique_names(&fields),
            Err(ErrorKind::DuplicateFieldName(_))
        ));
    }

    #[test]
    fn memo_field_rejected_on_create() {
        let info = FieldInfo::new(FieldName::new("NOTES").unwrap(), FieldType::Memo, 10);
        assert!(matches!(
            validate_descriptor(&info, Version::DBase3Memo, true),
            Err(ErrorKind::MemoWriteUnsupported)
        ));
        assert!(validate_descriptor(&info, Version::DBase3Memo, false).is_ok());
    }

    #[test]
    fn numeric_decimal_ceiling_depends_on_version() {
        let info = FieldInfo {
            name: FieldName::new("N1").unwrap(),
            field_type: FieldType::Numeric,
            field_length: 20,
            num_decimal_places: 16,
        };
        assert!(validate_descriptor(&info, Version::DBase3, false).is_err());
        assert!(validate_descriptor(&info, Version::DBase4Memo, false).is_ok());
    }
}
