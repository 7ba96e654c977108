//! The fixed 32-byte header prelude and field-descriptor table.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::ErrorKind;
use crate::field::FieldInfo;

/// Byte value that must follow the last field descriptor.
pub(crate) const TERMINATOR_VALUE: u8 = 0x0D;
/// Byte value written at the very end of the file.
pub(crate) const EOF_MARKER: u8 = 0x1A;

/// The closed set of file versions this crate understands, plus the
/// `Unknown` escape hatch strict mode rejects and loose mode tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// `0x03` — dBase III, no memo file.
    DBase3,
    /// `0x83` — dBase III plus a `.dbt` memo file.
    DBase3Memo,
    /// `0x8B` — dBase IV plus a `.dbt` memo file.
    DBase4Memo,
    /// `0x30` — Visual FoxPro 9, optionally with a `.fpt` memo file.
    VisualFoxPro,
    /// Any other version byte. Only constructible by reading a file in
    /// [`ReadMode::Loose`](crate::ReadMode::Loose); rejected by `create`.
    Unknown(u8),
}

impl Version {
    pub(crate) fn from_byte(b: u8) -> Self {
        match b {
            0x03 => Version::DBase3,
            0x83 => Version::DBase3Memo,
            0x8B => Version::DBase4Memo,
            0x30 => Version::VisualFoxPro,
            other => Version::Unknown(other),
        }
    }

    pub(crate) fn to_byte(self) -> u8 {
        match self {
            Version::DBase3 => 0x03,
            Version::DBase3Memo => 0x83,
            Version::DBase4Memo => 0x8B,
            Version::VisualFoxPro => 0x30,
            Version::Unknown(b) => b,
        }
    }

    pub(crate) fn is_known(self) -> bool {
        !matches!(self, Version::Unknown(_))
    }

    /// `0x8B` relaxes the `N`/`F` decimal-places ceiling from 15 to 18
    ///.
    pub(crate) fn max_numeric_decimals(self) -> u8 {
        if matches!(self, Version::DBase4Memo) {
            18
        } else {
            15
        }
    }

    pub(crate) fn has_memo(self) -> bool {
        matches!(
            self,
            Version::DBase3Memo | Version::DBase4Memo | Version::VisualFoxPro
        )
    }
}

/// The raw `YY/MM/DD` last-update triple, preserved exactly as stored.
///
/// Real-world files disagree on whether the month byte is 0- or 1-based;
/// this type accepts any byte on read and never reinterprets it, it only
/// ever adds 1900 to the year byte to get a human-legible year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl RawDate {
    pub(crate) fn from_bytes(year_byte: u8, month: u8, day: u8) -> Self {
        Self {
            year: 1900 + year_byte as u16,
            month,
            day,
        }
    }

    pub(crate) fn today() -> Self {
        let now = time::OffsetDateTime::now_utc().date();
        Self {
            year: now.year() as u16,
            month: u8::from(now.month()),
            day: now.day(),
        }
    }

    fn year_byte(self) -> u8 {
        (self.year.saturating_sub(1900)).min(255) as u8
    }
}

#[derive(Debug, Clone)]
pub struct Header {
    pub version: Version,
    pub last_update: RawDate,
    pub num_records: u32,
    pub header_length: u16,
    pub record_length: u16,
}

impl Header {
    pub(crate) const SIZE: usize = 32;

    pub(crate) fn new(version: Version, fields: &[FieldInfo]) -> Self {
        let header_length = 34 + 32 * fields.len() as u16;
        let record_length = expected_record_length(fields);
        Self {
            version,
            last_update: RawDate::today(),
            num_records: 0,
            header_length,
            record_length,
        }
    }

    pub(crate) fn read_from<R: Read>(source: &mut R) -> std::io::Result<Self> {
        let version = Version::from_byte(source.read_u8()?);

        let year_byte = source.read_u8()?;
        let month = source.read_u8()?;
        let day = source.read_u8()?;
        let last_update = RawDate::from_bytes(year_byte, month, day);

        let num_records = source.read_u32::<LittleEndian>()?;
        let header_length = source.read_u16::<LittleEndian>()?;
        let record_length = source.read_u16::<LittleEndian>()?;

        let mut reserved = [0u8; 20];
        source.read_exact(&mut reserved)?;

        Ok(Self {
            version,
            last_update,
            num_records,
            header_length,
            record_length,
        })
    }

    pub(crate) fn write_to<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_u8(self.version.to_byte())?;
        dest.write_u8(self.last_update.year_byte())?;
        dest.write_u8(self.last_update.month)?;
        dest.write_u8(self.last_update.day)?;
        dest.write_u32::<LittleEndian>(self.num_records)?;
        dest.write_u16::<LittleEndian>(self.header_length)?;
        dest.write_u16::<LittleEndian>(self.record_length)?;

        let reserved = [0u8; 20];
        dest.write_all(&reserved)?;
        Ok(())
    }

    /// Byte offset of the first byte of the record at `index`.
    pub(crate) fn record_position(&self, index: usize) -> usize {
        self.header_length as usize + index * self.record_length as usize
    }
}

/// Looks for a sidecar memo file next to `main_path`, trying both the
/// lowercase and uppercase extension.
pub(crate) fn find_memo_path(main_path: &Path, version: Version) -> Option<PathBuf> {
    memo_path_candidates(main_path, version)
        .into_iter()
        .find(|p| p.is_file())
}

fn memo_path_candidates(main_path: &Path, version: Version) -> Vec<PathBuf> {
    match version {
        Version::DBase3Memo | Version::DBase4Memo => {
            vec![
                main_path.with_extension("dbt"),
                main_path.with_extension("DBT"),
            ]
        }
        Version::VisualFoxPro => {
            let ext = main_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            if ext.eq_ignore_ascii_case("dbf") {
                vec![
                    main_path.with_extension("fpt"),
                    main_path.with_extension("FPT"),
                ]
            } else {
                vec![
                    main_path.with_extension(memo_ext_with_t(ext, false)),
                    main_path.with_extension(memo_ext_with_t(ext, true)),
                ]
            }
        }
        _ => Vec::new(),
    }
}

/// Substitutes the 2nd character of `ext` with `t`/`T` (e.g. `pjx` -> `pjt`).
fn memo_ext_with_t(ext: &str, upper: bool) -> String {
    let mut chars: Vec<char> = ext.chars().collect();
    if chars.len() >= 2 {
        chars[1] = if upper { 'T' } else { 't' };
    }
    chars.into_iter().collect()
}

pub(crate) fn expected_record_length(fields: &[FieldInfo]) -> u16 {
    1 + fields.iter().map(|f| f.field_length as u16).sum::<u16>()
}

pub(crate) fn check_record_length(record_length_in_header: u16, fields: &[FieldInfo]) -> Option<ErrorKind> {
    let expected = expected_record_length(fields);
    if expected != record_length_in_header {
        Some(ErrorKind::WrongRecordLength {
            expected,
            actual: record_length_in_header,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn version_round_trips_through_raw_byte() {
        for b in [0x03u8, 0x83, 0x8B, 0x30] {
            assert_eq!(Version::from_byte(b).to_byte(), b);
        }
        assert!(matches!(Version::from_byte(0x31), Version::Unknown(0x31)));
    }

    #[test]
    fn header_read_write_round_trip() {
        let header = Header {
            version: Version::DBase3,
            last_update: RawDate {
                year: 2014,
                month: 4,
                day: 14,
            },
            num_records: 45,
            header_length: 97,
            record_length: 64,
        };

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), Header::SIZE);

        let mut cursor = Cursor::new(buf);
        let read_back = Header::read_from(&mut cursor).unwrap();
        assert_eq!(read_back.version, header.version);
        assert_eq!(read_back.last_update, header.last_update);
        assert_eq!(read_back.num_records, header.num_records);
        assert_eq!(read_back.header_length, header.header_length);
        assert_eq!(read_back.record_length, header.record_length);
    }

    #[test]
    fn nonsense_year_is_preserved_verbatim() {
        // 1919 shows up in real-world fixtures.
        let raw = RawDate::from_bytes(19, 3, 25);
        assert_eq!(raw.year, 1919);
    }

    #[test]
    fn vfp_memo_extension_substitutes_second_char() {
        assert_eq!(memo_ext_with_t("pjx", false), "pjt");
        assert_eq!(memo_ext_with_t("pjx", true), "pJT".to_uppercase());
    }
}
