//! The batched record-read engine.

use std::io::{Read, Seek, SeekFrom};

use crate::encoding::{Encoding, Transcoder};
use crate::error::{Error, ErrorKind};
use crate::field::FieldInfo;
use crate::header::{Header, Version};
use crate::memo::MemoReader;
use crate::record::{decode_record, Record};

/// Number of records decoded per batch when no explicit `max_count` is
/// given. Chosen to bound peak memory on huge tables while
/// keeping syscall overhead low for small ones.
pub(crate) const BATCH_SIZE: usize = 1000;

/// Reads up to `max_count` not-yet-read records (or all remaining records,
/// batched `BATCH_SIZE` at a time, if `max_count` is `None`), starting at
/// `*cursor`, advancing `*cursor` past every record it visits — including
/// ones filtered out because they are marked deleted and `include_deleted`
/// is `false`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn read_records<S: Read + Seek, M: Read + Seek, T: Transcoder>(
    source: &mut S,
    memo: &mut Option<MemoReader<M>>,
    header: &Header,
    fields: &[FieldInfo],
    transcoder: &T,
    encoding: &Encoding,
    include_deleted: bool,
    cursor: &mut usize,
    max_count: Option<usize>,
) -> Result<Vec<Record>, Error> {
    let mut out = Vec::new();
    let record_len = header.record_length as usize;
    let mut buf = vec![0u8; record_len];

    loop {
        if *cursor >= header.num_records as usize {
            break;
        }
        if let Some(max) = max_count {
            if out.len() >= max {
                break;
            }
        }

        let batch_limit = max_count
            .map(|max| max - out.len())
            .unwrap_or(BATCH_SIZE)
            .min(BATCH_SIZE);

        for _ in 0..batch_limit {
            if *cursor >= header.num_records as usize {
                break;
            }
            if let Some(max) = max_count {
                if out.len() >= max {
                    break;
                }
            }

            let position = header.record_position(*cursor);
            source
                .seek(SeekFrom::Start(position as u64))
                .map_err(|e| Error::io_error(e, *cursor))?;
            source
                .read_exact(&mut buf)
                .map_err(|e| Error::io_error(e, *cursor))?;

            let record = decode_record(
                &buf,
                fields,
                transcoder,
                encoding,
                header.version,
                memo.as_mut(),
            )
            .map_err(|kind| Error::new(kind, *cursor))?;

            *cursor += 1;

            if record.deleted && !include_deleted {
                continue;
            }
            out.push(record);
        }
    }

    Ok(out)
}

/// Validates that the version read from disk is one this crate understands,
/// honoring `strict`'s tolerance for unknown versions.
pub(crate) fn check_version(version: Version, strict: bool) -> Result<(), ErrorKind> {
    if strict && !version.is_known() {
        return Err(ErrorKind::UnsupportedVersion(version.to_byte()));
    }
    Ok(())
}
