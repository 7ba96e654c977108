//! Read and append dBase-family database files (`.dbf`), including their
//! `.dbt`/`.fpt` memo companions.
//!
//! Supports dBase III, dBase III+memo, dBase IV+memo and Visual FoxPro 9
//! table headers. Existing records cannot be edited in place and memo
//! content cannot be written — this crate is a reader plus an append-only
//! writer, not a full table editor.
//!
//! ```no_run
//! use dbfcore::{open, OpenOptions};
//!
//! # fn main() -> Result<(), dbfcore::Error> {
//! let mut table = open("data.dbf", OpenOptions::default())?;
//! for record in table.read_records(None)? {
//!     println!("{:?}", record.values);
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "async")]
mod asynch;
pub mod encoding;
pub mod error;
pub mod field;
mod handle;
mod header;
mod memo;
mod record;
mod reading;
mod writing;

pub use encoding::{Encoding, Transcoder};
pub use error::{Error, ErrorKind, Result};
pub use field::value::{Date, DateTime, Value};
pub use field::{FieldInfo, FieldName, FieldType};
pub use handle::{create, open, CreateOptions, OpenOptions, ReadMode, Table};
pub use header::{RawDate, Version};
pub use record::Record;

#[cfg(feature = "serde")]
mod serde_support {
    //! `serde::Serialize`/`Deserialize` impls for [`Value`], gated behind
    //! the `serde` feature so the default build carries no serde
    //! dependency.

    use serde::ser::{SerializeMap, Serializer};
    use serde::Serialize;

    use crate::field::value::Value;
    use crate::Record;

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::Character(v) => v.serialize(serializer),
                Value::Numeric(v) => v.serialize(serializer),
                Value::Logical(v) => v.serialize(serializer),
                Value::Date(v) => v.map(|d| d.to_string()).serialize(serializer),
                Value::DateTime(dt) => format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                    dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
                )
                .serialize(serializer),
                Value::Double(v) => v.serialize(serializer),
                Value::Integer(v) => v.serialize(serializer),
                Value::Memo(v) => v.serialize(serializer),
            }
        }
    }

    impl Serialize for Record {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.values.len()))?;
            for (k, v) in &self.values {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::field::value::Value;
    use std::collections::HashMap;

    #[test]
    fn public_surface_opens_creates_appends_and_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke.dbf");

        let fields = vec![FieldInfo::new(
            FieldName::new("CODE").unwrap(),
            FieldType::Character,
            4,
        )];
        let mut table = create(&path, fields, CreateOptions::default()).unwrap();

        let mut values = HashMap::new();
        values.insert("CODE".to_owned(), Value::Character(Some("AB12".to_owned())));
        table.append_records(&[Record::new(values)]).unwrap();
        drop(table);

        let mut table = open(&path, OpenOptions::default()).unwrap();
        assert_eq!(table.record_count(), 1);
        let records = table.read_records(None).unwrap();
        assert_eq!(
            records[0].get("CODE"),
            Some(&Value::Character(Some("AB12".to_owned())))
        );
    }

    #[test]
    fn loose_mode_tolerates_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weird.dbf");

        let fields = vec![FieldInfo::new(
            FieldName::new("X").unwrap(),
            FieldType::Integer,
            4,
        )];
        let mut table = create(&path, fields, CreateOptions::default()).unwrap();
        drop(table);

        // Hand-corrupt the version byte to an unknown value.
        {
            use std::io::{Seek, SeekFrom, Write};
            let mut f = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
            f.seek(SeekFrom::Start(0)).unwrap();
            f.write_all(&[0x42]).unwrap();
        }

        assert!(open(
            &path,
            OpenOptions {
                read_mode: ReadMode::Strict,
                ..Default::default()
            }
        )
        .is_err());

        table = open(
            &path,
            OpenOptions {
                read_mode: ReadMode::Loose,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(table.header_version(), Version::Unknown(0x42)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn record_serializes_to_json() {
        let mut values = HashMap::new();
        values.insert("CODE".to_owned(), Value::Character(Some("AB12".to_owned())));
        values.insert("SCORE".to_owned(), Value::Numeric(None));
        let record = Record::new(values);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["CODE"], "AB12");
        assert!(json["SCORE"].is_null());
    }
}
