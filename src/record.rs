//! Record framing: the deletion flag byte plus the per-field byte layout
//! that follows it.

use std::collections::HashMap;
use std::io::{Read, Seek, Write};

use crate::encoding::{Encoding, Transcoder};
use crate::error::ErrorKind;
use crate::field::value::{decode_field, decode_memo_index, encode_field, Value};
use crate::field::FieldInfo;
use crate::header::Version;
use crate::memo::MemoReader;

const DELETED_FLAG: u8 = 0x2A;
const NOT_DELETED_FLAG: u8 = 0x20;

/// One decoded row: the deletion flag plus a name-keyed map of field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub deleted: bool,
    pub values: HashMap<String, Value>,
}

impl Record {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self {
            deleted: false,
            values,
        }
    }

    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.values.get(field_name)
    }
}

/// Decodes one record's raw bytes (length `1 + sum(field sizes)`) into a
/// [`Record`], resolving memo references through `memo` when present.
pub(crate) fn decode_record<T: Transcoder, M: Read + Seek>(
    bytes: &[u8],
    fields: &[FieldInfo],
    transcoder: &T,
    encoding: &Encoding,
    version: Version,
    memo: Option<&mut MemoReader<M>>,
) -> Result<Record, ErrorKind> {
    let deleted = match bytes[0] {
        DELETED_FLAG => true,
        _ => false,
    };

    let mut values = HashMap::with_capacity(fields.len());
    let mut offset = 1usize;
    let mut memo = memo;
    let is_vfp = matches!(version, Version::VisualFoxPro);

    for field in fields {
        let len = field.field_length as usize;
        let field_bytes = &bytes[offset..offset + len];
        offset += len;

        let label = encoding.label_for(field.name.as_str());

        let value = if field.field_type == crate::field::FieldType::Memo {
            let index = decode_memo_index(field_bytes, is_vfp)?;
            let text = match (index, memo.as_mut()) {
                (Some(block), Some(reader)) => match reader.get_memo(block) {
                    Ok(text) => Some(text),
                    Err(_) => None,
                },
                _ => None,
            };
            Value::Memo(text)
        } else {
            decode_field(field_bytes, field, transcoder, label)?
        };

        values.insert(field.name.as_str().to_owned(), value);
    }

    Ok(Record { deleted, values })
}

/// Encodes `record` into a freshly-allocated buffer of exactly
/// `1 + sum(field sizes)` bytes, in field declaration order.
pub(crate) fn encode_record<T: Transcoder>(
    record: &Record,
    fields: &[FieldInfo],
    transcoder: &T,
    encoding: &Encoding,
) -> Result<Vec<u8>, ErrorKind> {
    let total_len = 1 + fields.iter().map(|f| f.field_length as usize).sum::<usize>();
    let mut buf = vec![0u8; total_len];
    buf[0] = if record.deleted {
        DELETED_FLAG
    } else {
        NOT_DELETED_FLAG
    };

    let mut offset = 1usize;
    for field in fields {
        let len = field.field_length as usize;
        let value = record
            .values
            .get(field.name.as_str())
            .ok_or_else(|| ErrorKind::ValueTypeMismatch {
                field: field.name.as_str().to_owned(),
                expected: "a value for every declared field",
            })?;
        let label = encoding.label_for(field.name.as_str());
        encode_field(value, field, transcoder, label, &mut buf[offset..offset + len])?;
        offset += len;
    }

    Ok(buf)
}

pub(crate) fn write_record<W: Write>(bytes: &[u8], dest: &mut W) -> std::io::Result<()> {
    dest.write_all(bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoding::EncodingRsTranscoder;
    use crate::field::{FieldName, FieldType};

    fn sample_fields() -> Vec<FieldInfo> {
        vec![
            FieldInfo::new(FieldName::new("NAME").unwrap(), FieldType::Character, 10),
            FieldInfo::new(FieldName::new("AGE").unwrap(), FieldType::Numeric, 3),
        ]
    }

    #[test]
    fn record_round_trip_without_memo() {
        let fields = sample_fields();
        let transcoder = EncodingRsTranscoder;
        let encoding = Encoding::default();

        let mut values = HashMap::new();
        values.insert("NAME".to_owned(), Value::Character(Some("Yoshi".to_owned())));
        values.insert("AGE".to_owned(), Value::Numeric(Some(12.0)));
        let record = Record::new(values);

        let bytes = encode_record(&record, &fields, &transcoder, &encoding).unwrap();
        assert_eq!(bytes[0], NOT_DELETED_FLAG);

        let decoded = decode_record::<_, std::io::Cursor<Vec<u8>>>(
            &bytes,
            &fields,
            &transcoder,
            &encoding,
            Version::DBase3,
            None,
        )
        .unwrap();
        assert_eq!(decoded.values, record.values);
        assert!(!decoded.deleted);
    }

    #[test]
    fn deleted_flag_round_trips() {
        let fields = sample_fields();
        let transcoder = EncodingRsTranscoder;
        let encoding = Encoding::default();

        let mut values = HashMap::new();
        values.insert("NAME".to_owned(), Value::Character(None));
        values.insert("AGE".to_owned(), Value::Numeric(None));
        let record = Record {
            deleted: true,
            values,
        };

        let bytes = encode_record(&record, &fields, &transcoder, &encoding).unwrap();
        assert_eq!(bytes[0], DELETED_FLAG);
        let decoded = decode_record::<_, std::io::Cursor<Vec<u8>>>(
            &bytes,
            &fields,
            &transcoder,
            &encoding,
            Version::DBase3,
            None,
        )
        .unwrap();
        assert!(decoded.deleted);
    }

    #[test]
    fn missing_value_is_rejected_on_encode() {
        let fields = sample_fields();
        let transcoder = EncodingRsTranscoder;
        let encoding = Encoding::default();

        let mut values = HashMap::new();
        values.insert("NAME".to_owned(), Value::Character(Some("X".to_owned())));
        let record = Record::new(values);

        assert!(encode_record(&record, &fields, &transcoder, &encoding).is_err());
    }
}
