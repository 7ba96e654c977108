//! Error types returned by every fallible operation in this crate.

use std::fmt;

/// The distinct ways a dBase operation can fail.
///
/// This is the closed taxonomy the crate reports through; `IoError` and the
/// two parse-error variants fold in the underlying `std`/external failures
/// so callers only ever have to match on one enum.
#[derive(Debug)]
pub enum ErrorKind {
    /// The header's version byte is not one of the four known values, and
    /// the file was opened in [`ReadMode::Strict`](crate::ReadMode::Strict).
    UnsupportedVersion(u8),
    /// The main file references a memo file (`.dbt`/`.fpt`) that could not
    /// be found, and the file was opened in strict mode.
    MissingMemoFile,
    /// Two field descriptors in the same header share a name.
    DuplicateFieldName(String),
    /// The byte following the last field descriptor was not `0x0D`.
    BadHeaderTerminator(u8),
    /// The header's `record_length` does not match `1 + sum(field sizes)`.
    WrongRecordLength { expected: u16, actual: u16 },
    /// A field descriptor names a type outside the closed set, and the
    /// file was opened/created in strict mode.
    UnsupportedFieldType(char),
    /// The encoding configuration names a label the transcoder does not
    /// recognize.
    UnsupportedEncoding(String),
    /// An attempt was made to write a value into a memo field.
    MemoWriteUnsupported,
    /// A memo block index points past the end of the memo file.
    MemoReadPastEnd,
    /// A field descriptor's size/decimal combination violates §3's table.
    FieldSizeInvalid { field: String, reason: &'static str },
    /// A field name is empty or longer than 10 bytes once encoded.
    FieldNameInvalid(String),
    /// A value handed to `append_records` does not match its field's type.
    ValueTypeMismatch { field: String, expected: &'static str },
    /// A `Character` value, once encoded, exceeds 255 bytes.
    TextTooLong { field: String },
    /// Any underlying I/O failure from the filesystem capability.
    IoError(std::io::Error),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnsupportedVersion(b) => {
                write!(f, "unsupported file version: 0x{b:02X}")
            }
            ErrorKind::MissingMemoFile => write!(f, "missing memo file"),
            ErrorKind::DuplicateFieldName(name) => {
                write!(f, "Duplicate field name: '{name}'")
            }
            ErrorKind::BadHeaderTerminator(b) => {
                write!(f, "expected header terminator 0x0D, got 0x{b:02X}")
            }
            ErrorKind::WrongRecordLength { expected, actual } => write!(
                f,
                "record length mismatch: header says {actual}, fields sum to {expected}"
            ),
            ErrorKind::UnsupportedFieldType(c) => write!(f, "unsupported field type '{c}'"),
            ErrorKind::UnsupportedEncoding(label) => {
                write!(f, "unsupported encoding: '{label}'")
            }
            ErrorKind::MemoWriteUnsupported => {
                write!(f, "Writing to files with memo fields is not supported.")
            }
            ErrorKind::MemoReadPastEnd => write!(f, "memo block index points past end of file"),
            ErrorKind::FieldSizeInvalid { field, reason } => {
                write!(f, "{field}: {reason}")
            }
            ErrorKind::FieldNameInvalid(name) => write!(f, "invalid field name: '{name}'"),
            ErrorKind::ValueTypeMismatch { field, expected } => {
                write!(f, "{field}: expected {expected}")
            }
            ErrorKind::TextTooLong { field } => write!(
                f,
                "{field}: text is too long (maximum length is 255 chars)"
            ),
            ErrorKind::IoError(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ErrorKind::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(e: std::io::Error) -> Self {
        ErrorKind::IoError(e)
    }
}

/// The error type returned by all public operations in this crate.
///
/// Carries the zero-based record index the error was encountered at (`0`
/// for errors that happen before any record is involved, e.g. during
/// header parsing) and, where relevant, the name of the offending field.
#[derive(Debug)]
pub struct Error {
    pub record_num: usize,
    pub field: Option<String>,
    pub kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, record_num: usize) -> Self {
        Self {
            record_num,
            field: None,
            kind,
        }
    }

    pub(crate) fn with_field(kind: ErrorKind, record_num: usize, field: impl Into<String>) -> Self {
        Self {
            record_num,
            field: Some(field.into()),
            kind,
        }
    }

    pub(crate) fn io_error(error: std::io::Error, record_num: usize) -> Self {
        Self::new(ErrorKind::IoError(error), record_num)
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(_) => write!(f, "{}", self.kind),
            None => write!(f, "record {}: {}", self.record_num, self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::IoError(e), 0)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
