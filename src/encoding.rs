//! The character-encoding capability.
//!
//! The codec core never hard-codes a character set: every `Character`,
//! `Numeric`/`Float`/`Date` (stored as ASCII digit strings) and `Memo` value
//! passes through a [`Transcoder`] resolved per field: given an encoding
//! label, convert a byte slice to a text string and vice versa.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::ErrorKind;

/// A pluggable character-set transcoder.
///
/// The default implementation ([`EncodingRsTranscoder`]) resolves labels
/// through `encoding_rs`'s WHATWG label table, which is what lets a single
/// file declare per-field encodings as loosely-specified as `"tis620"` or
/// `"gb2312"`. Callers needing a different
/// backend (e.g. an in-memory test double, or a vendor-specific codepage
/// table) can supply their own `Transcoder` impl.
pub trait Transcoder {
    /// Returns `true` if `label` names a character set this transcoder can
    /// use for [`decode`](Transcoder::decode)/[`encode`](Transcoder::encode).
    fn encoding_exists(&self, label: &str) -> bool;

    /// Decodes `bytes` into text using the character set named by `label`.
    fn decode<'a>(&self, bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>, ErrorKind>;

    /// Encodes `text` into bytes using the character set named by `label`.
    fn encode(&self, text: &str, label: &str) -> Result<Vec<u8>, ErrorKind>;
}

/// Default [`Transcoder`] backed by `encoding_rs`.
///
/// `encoding_rs` resolves labels the same way a browser would (case
/// insensitive, aliases included), which covers every label a dBase file in
/// the wild is likely to declare (`"ISO-8859-1"`, `"latin1"`, `"cp1252"`,
/// `"tis620"`, `"gb2312"`, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct EncodingRsTranscoder;

impl EncodingRsTranscoder {
    fn resolve(label: &str) -> Result<&'static encoding_rs::Encoding, ErrorKind> {
        encoding_rs::Encoding::for_label(label.as_bytes())
            .ok_or_else(|| ErrorKind::UnsupportedEncoding(label.to_owned()))
    }
}

impl Transcoder for EncodingRsTranscoder {
    fn encoding_exists(&self, label: &str) -> bool {
        encoding_rs::Encoding::for_label(label.as_bytes()).is_some()
    }

    fn decode<'a>(&self, bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>, ErrorKind> {
        let encoding = Self::resolve(label)?;
        let (text, _, _had_errors) = encoding.decode(bytes);
        Ok(text)
    }

    fn encode(&self, text: &str, label: &str) -> Result<Vec<u8>, ErrorKind> {
        let encoding = Self::resolve(label)?;
        let (bytes, _, _had_errors) = encoding.encode(text);
        Ok(bytes.into_owned())
    }
}

/// The label ISO-8859-1 is always resolved to, used for field names in the
/// header regardless of the data encoding.
pub(crate) const HEADER_LABEL_ENCODING: &str = "ISO-8859-1";

/// Per-field or whole-file character encoding configuration.
///
/// Resolution: if [`Encoding::PerField`], use the mapped
/// label for the named field, falling back to `default`; if
/// [`Encoding::Single`], use that label for every field.
#[derive(Debug, Clone)]
pub enum Encoding {
    /// Use one label for every field in the file.
    Single(String),
    /// Use a field-specific label where present, otherwise `default`.
    PerField {
        default: String,
        fields: HashMap<String, String>,
    },
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Single(HEADER_LABEL_ENCODING.to_owned())
    }
}

impl Encoding {
    /// Creates a single whole-file encoding.
    pub fn single(label: impl Into<String>) -> Self {
        Encoding::Single(label.into())
    }

    /// Creates a per-field encoding with the given default label.
    pub fn per_field(default: impl Into<String>) -> PerFieldBuilder {
        PerFieldBuilder {
            default: default.into(),
            fields: HashMap::new(),
        }
    }

    /// Resolves the label that should be used for the named field.
    pub(crate) fn label_for(&self, field_name: &str) -> &str {
        match self {
            Encoding::Single(label) => label,
            Encoding::PerField { default, fields } => {
                fields.get(field_name).unwrap_or(default)
            }
        }
    }
}

/// Builder for [`Encoding::PerField`].
pub struct PerFieldBuilder {
    default: String,
    fields: HashMap<String, String>,
}

impl PerFieldBuilder {
    /// Overrides the encoding used for a specific field name.
    pub fn field(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.fields.insert(name.into(), label.into());
        self
    }

    pub fn build(self) -> Encoding {
        Encoding::PerField {
            default: self.default,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_label_applies_to_every_field() {
        let enc = Encoding::single("latin1");
        assert_eq!(enc.label_for("ANY_FIELD"), "latin1");
        assert_eq!(enc.label_for("OTHER"), "latin1");
    }

    #[test]
    fn per_field_falls_back_to_default() {
        let enc = Encoding::per_field("tis620").field("PNAME", "latin1").build();
        assert_eq!(enc.label_for("PNAME"), "latin1");
        assert_eq!(enc.label_for("DISPNAME"), "tis620");
    }

    #[test]
    fn encoding_rs_roundtrip() {
        let t = EncodingRsTranscoder;
        assert!(t.encoding_exists("latin1"));
        assert!(!t.encoding_exists("not-a-real-encoding"));

        let bytes = t.encode("hello", "ISO-8859-1").unwrap();
        let text = t.decode(&bytes, "ISO-8859-1").unwrap();
        assert_eq!(text, "hello");
    }
}
