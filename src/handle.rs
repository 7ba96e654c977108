//! The public handle: the type callers open, create, read from and append
//! to.

use std::fs::{File as StdFile, OpenOptions as StdOpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::encoding::{Encoding, EncodingRsTranscoder};
use crate::error::{Error, ErrorKind};
use crate::field::{check_unique_names, validate_descriptor, FieldInfo};
use crate::header::{
    check_record_length, find_memo_path, Header, RawDate, Version, EOF_MARKER, TERMINATOR_VALUE,
};
use crate::memo::MemoReader;
use crate::reading::{check_version, read_records};
use crate::record::Record;
use crate::writing::append_records;

/// Controls how tolerant opening/reading is of data that deviates from the
/// closed set this crate fully understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Unknown file versions and unknown field types are hard errors;
    /// a missing memo file referenced by the header is a hard error.
    Strict,
    /// Unknown file versions and field types are tolerated (the field is
    /// kept with a `None`-producing decode); a missing memo file degrades
    /// memo fields to `None` instead of failing the open.
    Loose,
}

impl Default for ReadMode {
    fn default() -> Self {
        ReadMode::Strict
    }
}

/// Options controlling how an existing file is opened.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub read_mode: ReadMode,
    pub encoding: Encoding,
    /// When `false` (the default), `read_records` silently skips over rows
    /// whose deletion flag is set, advancing the cursor past them without
    /// returning them.
    pub include_deleted: bool,
}

/// Options controlling how a new file is created.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub version: Version,
    pub encoding: Encoding,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            version: Version::DBase3,
            encoding: Encoding::default(),
        }
    }
}

/// A dBase table: the header, field descriptors, and a cursor over the
/// records that have already been read back by this handle.
pub struct Table<F> {
    data: F,
    memo: Option<MemoReader<StdFile>>,
    header: Header,
    fields: Vec<FieldInfo>,
    transcoder: EncodingRsTranscoder,
    options: OpenOptions,
    records_read_cursor: usize,
    path: Option<PathBuf>,
}

impl<F: Read + Write + Seek> Table<F> {
    pub fn header_version(&self) -> Version {
        self.header.version
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn record_count(&self) -> u32 {
        self.header.num_records
    }

    pub fn date_of_last_update(&self) -> RawDate {
        self.header.last_update
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resets the read cursor back to the first record.
    pub fn rewind(&mut self) {
        self.records_read_cursor = 0;
    }

    /// Reads up to `max_count` not-yet-read records (all remaining records,
    /// batched internally, when `None`), honoring `include_deleted` from
    /// the options this table was opened with.
    pub fn read_records(&mut self, max_count: Option<usize>) -> Result<Vec<Record>, Error> {
        read_records(
            &mut self.data,
            &mut self.memo,
            &self.header,
            &self.fields,
            &self.transcoder,
            &self.options.encoding,
            self.options.include_deleted,
            &mut self.records_read_cursor,
            max_count,
        )
    }

    /// Appends `records` to the end of the file. Every record must supply a
    /// value for every declared field; memo fields may only be `None`
    /// (writing memo content is never supported).
    pub fn append_records(&mut self, records: &[Record]) -> Result<(), Error> {
        append_records(
            &mut self.data,
            &mut self.header,
            &self.fields,
            &self.transcoder,
            &self.options.encoding,
            records,
        )
    }

    #[cfg(feature = "async")]
    pub fn read_records_stream(&mut self) -> crate::asynch::RecordStream<'_, F> {
        crate::asynch::RecordStream::new(self)
    }
}

/// Opens an existing `.dbf` file at `path`, parsing the header and field
/// descriptor table and, when the header declares one, resolving and
/// opening the companion memo file.
pub fn open(path: impl AsRef<Path>, options: OpenOptions) -> Result<Table<StdFile>, Error> {
    let path = path.as_ref();
    let mut file = StdOpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| Error::io_error(e, 0))?;

    let strict = options.read_mode == ReadMode::Strict;

    let mut header = Header::read_from(&mut file).map_err(|e| Error::io_error(e, 0))?;
    check_version(header.version, strict).map_err(|kind| Error::new(kind, 0))?;

    let field_count = (header.header_length as usize - Header::SIZE - 2) / 32;
    let mut fields = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let raw = FieldInfo::read_from(&mut file).map_err(|e| Error::io_error(e, 0))?;
        match crate::field::FieldType::from_char(raw.type_char) {
            Some(field_type) => fields.push(FieldInfo {
                name: crate::field::FieldName(raw.name),
                field_type,
                field_length: raw.field_length,
                num_decimal_places: raw.num_decimal_places,
            }),
            None if strict => {
                return Err(Error::new(ErrorKind::UnsupportedFieldType(raw.type_char), 0));
            }
            None => continue,
        }
    }

    let mut terminator = [0u8; 1];
    std::io::Read::read_exact(&mut file, &mut terminator).map_err(|e| Error::io_error(e, 0))?;
    if terminator[0] != TERMINATOR_VALUE && strict {
        return Err(Error::new(ErrorKind::BadHeaderTerminator(terminator[0]), 0));
    }

    check_unique_names(&fields).map_err(|kind| Error::new(kind, 0))?;
    if strict {
        if let Some(kind) = check_record_length(header.record_length, &fields) {
            return Err(Error::new(kind, 0));
        }
    } else {
        header.record_length = crate::header::expected_record_length(&fields);
    }

    let memo = if header.version.has_memo() {
        match find_memo_path(path, header.version) {
            Some(memo_path) => {
                let memo_file = StdOpenOptions::new()
                    .read(true)
                    .open(&memo_path)
                    .map_err(|e| Error::io_error(e, 0))?;
                Some(MemoReader::new(memo_file, header.version).map_err(|kind| Error::new(kind, 0))?)
            }
            None if strict => return Err(Error::new(ErrorKind::MissingMemoFile, 0)),
            None => None,
        }
    } else {
        None
    };

    Ok(Table {
        data: file,
        memo,
        header,
        fields,
        transcoder: EncodingRsTranscoder,
        options,
        records_read_cursor: 0,
        path: Some(path.to_path_buf()),
    })
}

/// Creates a new, empty `.dbf` file at `path` with the given field
/// descriptors. Memo fields cannot be created (writing memo content is
/// never supported, so a file can't declare one from scratch).
pub fn create(
    path: impl AsRef<Path>,
    fields: Vec<FieldInfo>,
    options: CreateOptions,
) -> Result<Table<StdFile>, Error> {
    let path = path.as_ref();

    for field in &fields {
        validate_descriptor(field, options.version, true).map_err(|kind| Error::new(kind, 0))?;
    }
    check_unique_names(&fields).map_err(|kind| Error::new(kind, 0))?;

    let mut file = StdOpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| Error::io_error(e, 0))?;

    let header = Header::new(options.version, &fields);
    header.write_to(&mut file).map_err(|e| Error::io_error(e, 0))?;
    for field in &fields {
        field.write_to(&mut file).map_err(|e| Error::io_error(e, 0))?;
    }
    std::io::Write::write_all(&mut file, &[TERMINATOR_VALUE]).map_err(|e| Error::io_error(e, 0))?;
    std::io::Write::write_all(&mut file, &[0u8]).map_err(|e| Error::io_error(e, 0))?;
    std::io::Write::write_all(&mut file, &[EOF_MARKER]).map_err(|e| Error::io_error(e, 0))?;

    Ok(Table {
        data: file,
        memo: None,
        header,
        fields,
        transcoder: EncodingRsTranscoder,
        options: OpenOptions {
            read_mode: ReadMode::Strict,
            encoding: options.encoding,
            include_deleted: false,
        },
        records_read_cursor: 0,
        path: Some(path.to_path_buf()),
    })
}
