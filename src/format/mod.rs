//! Container format constants, record definitions, and low-level parsing.
//!
//! The container is a plain ZIP archive. This module knows the record
//! layouts (local file header, central directory header, end of central
//! directory) and how to find them inside a byte buffer that starts with
//! arbitrary prefix bytes, which is how the HTML shell wraps the archive.

pub mod header;
pub mod parser;
pub mod reader;

/// Signature of a local file header (`PK\x03\x04`).
pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Signature of a central directory file header (`PK\x01\x02`).
pub const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;

/// Signature of the end of central directory record (`PK\x05\x06`).
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

/// Fixed part of a local file header, in bytes.
pub const LOCAL_FILE_HEADER_SIZE: usize = 30;

/// Fixed part of a central directory header, in bytes.
pub const CENTRAL_DIRECTORY_HEADER_SIZE: usize = 46;

/// Fixed part of the end of central directory record, in bytes.
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 22;

/// Largest comment the end of central directory record can carry.
pub const MAX_COMMENT_LENGTH: usize = u16::MAX as usize;

/// Version needed to extract (2.0: deflate, directories).
pub const VERSION_NEEDED: u16 = 20;

/// Version made by: MS-DOS attribute compatibility, APPNOTE version 2.0.
pub const VERSION_MADE_BY: u16 = 20;

/// General purpose flag bit 11: names and comments are UTF-8.
pub const FLAG_UTF8: u16 = 0x0800;

/// General purpose flag bit 0: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// Largest entry count representable without ZIP64.
pub const MAX_ENTRIES: usize = u16::MAX as usize;

/// Largest size or offset representable without ZIP64.
pub const MAX_SIZE: u64 = u32::MAX as u64;

/// An MS-DOS date and time pair as stored in ZIP records.
///
/// DOS timestamps have two-second resolution and start at 1980.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosDateTime {
    /// Packed date: bits 9-15 year since 1980, 5-8 month, 0-4 day.
    pub date: u16,
    /// Packed time: bits 11-15 hour, 5-10 minute, 0-4 seconds / 2.
    pub time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const EPOCH: Self = Self {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// Packs a calendar date and time.
    ///
    /// Returns `None` when a field is out of range or the year falls
    /// outside 1980..=2107.
    ///
    /// ```
    /// use pagezip::format::DosDateTime;
    ///
    /// let t = DosDateTime::from_ymdhms(2024, 3, 15, 12, 30, 44).unwrap();
    /// assert_eq!(t.to_ymdhms(), (2024, 3, 15, 12, 30, 44));
    /// assert!(DosDateTime::from_ymdhms(1979, 1, 1, 0, 0, 0).is_none());
    /// ```
    pub fn from_ymdhms(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Option<Self> {
        if !(1980..=2107).contains(&year)
            || !(1..=12).contains(&month)
            || !(1..=31).contains(&day)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }
        Some(Self {
            date: ((year - 1980) << 9) | (u16::from(month) << 5) | u16::from(day),
            time: (u16::from(hour) << 11) | (u16::from(minute) << 5) | u16::from(second / 2),
        })
    }

    /// Unpacks into `(year, month, day, hour, minute, second)`.
    pub fn to_ymdhms(self) -> (u16, u8, u8, u8, u8, u8) {
        (
            (self.date >> 9) + 1980,
            ((self.date >> 5) & 0x0F) as u8,
            (self.date & 0x1F) as u8,
            (self.time >> 11) as u8,
            ((self.time >> 5) & 0x3F) as u8,
            ((self.time & 0x1F) * 2) as u8,
        )
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl std::fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (y, mo, d, h, mi, s) = self.to_ymdhms();
        write!(f, "{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(DosDateTime::EPOCH.to_ymdhms(), (1980, 1, 1, 0, 0, 0));
        assert_eq!(DosDateTime::default(), DosDateTime::EPOCH);
        assert_eq!(DosDateTime::EPOCH.to_string(), "1980-01-01 00:00:00");
    }

    #[test]
    fn test_odd_seconds_truncate() {
        let t = DosDateTime::from_ymdhms(2000, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(t.to_ymdhms(), (2000, 12, 31, 23, 59, 58));
    }

    #[test]
    fn test_out_of_range() {
        assert!(DosDateTime::from_ymdhms(2108, 1, 1, 0, 0, 0).is_none());
        assert!(DosDateTime::from_ymdhms(2000, 13, 1, 0, 0, 0).is_none());
        assert!(DosDateTime::from_ymdhms(2000, 1, 0, 0, 0, 0).is_none());
        assert!(DosDateTime::from_ymdhms(2000, 1, 1, 24, 0, 0).is_none());
    }

    #[test]
    fn test_signatures_spell_pk() {
        assert_eq!(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes(), b"PK\x03\x04");
        assert_eq!(&CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes(), b"PK\x01\x02");
        assert_eq!(
            &END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes(),
            b"PK\x05\x06"
        );
    }
}
