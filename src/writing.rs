//! The append-only record writer.
//!
//! Only appending is supported: no in-place edits, no record deletion by
//! rewrite. Each call validates every record against the field descriptors
//! before writing any bytes, so a rejected batch leaves the file untouched.

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::encoding::{Encoding, Transcoder};
use crate::error::{Error, ErrorKind};
use crate::field::FieldInfo;
use crate::header::{Header, EOF_MARKER};
use crate::record::{encode_record, Record};

/// Appends `records` to the end of the data area, then rewrites the EOF
/// marker and persists the new record count to both the in-memory `header`
/// and the on-disk header.
pub(crate) fn append_records<W: Write + Seek, T: Transcoder>(
    dest: &mut W,
    header: &mut Header,
    fields: &[FieldInfo],
    transcoder: &T,
    encoding: &Encoding,
    records: &[Record],
) -> Result<(), Error> {
    // Validate every record up front: a partially-written batch would leave
    // the file in an inconsistent state with no way back (append-only, no
    // in-place rewrite).
    let mut encoded = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let bytes = encode_record(record, fields, transcoder, encoding)
            .map_err(|kind| Error::new(kind, header.num_records as usize + i))?;
        encoded.push(bytes);
    }

    let start_index = header.num_records as usize;
    dest.seek(SeekFrom::Start(header.record_position(start_index) as u64))
        .map_err(|e| Error::io_error(e, start_index))?;

    for bytes in &encoded {
        dest.write_all(bytes)
            .map_err(|e| Error::io_error(e, start_index))?;
    }

    dest.write_u8(EOF_MARKER)
        .map_err(|e| Error::io_error(e, start_index))?;

    header.num_records += records.len() as u32;

    dest.seek(SeekFrom::Start(4))
        .map_err(|e| Error::io_error(e, start_index))?;
    dest.write_u32::<LittleEndian>(header.num_records)
        .map_err(|e| Error::io_error(e, start_index))?;

    Ok(())
}

/// Checks a record's values against its field descriptors before encoding,
/// used by callers that want a validation-only pass (e.g. before batching
/// a large append across multiple calls).
pub(crate) fn validate_record(record: &Record, fields: &[FieldInfo]) -> Result<(), ErrorKind> {
    for field in fields {
        if !record.values.contains_key(field.name.as_str()) {
            return Err(ErrorKind::ValueTypeMismatch {
                field: field.name.as_str().to_owned(),
                expected: "a value for every declared field",
            });
        }
    }
    Ok(())
}
