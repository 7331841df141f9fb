//! PackStream marker bytes and structure tags.
//!
//! Every packed value starts with a marker byte. Small strings, lists, maps
//! and structures carry their size in the low nibble of the marker; larger
//! ones are followed by an 8, 16 or 32 bit big-endian size.

pub const NULL: u8 = 0xC0;
pub const FLOAT_64: u8 = 0xC1;
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

pub const BYTES_8: u8 = 0xCC;
pub const BYTES_16: u8 = 0xCD;
pub const BYTES_32: u8 = 0xCE;

pub const TINY_STRING: u8 = 0x80;
pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

pub const TINY_LIST: u8 = 0x90;
pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

pub const TINY_MAP: u8 = 0xA0;
pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;

pub const TINY_STRUCT: u8 = 0xB0;
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

/// Largest size that fits in a tiny marker's low nibble.
pub const TINY_MAX: usize = 0x0F;

/// Range of integers packed directly into the marker byte.
pub const TINY_INT_MIN: i64 = -16;
pub const TINY_INT_MAX: i64 = 127;

/// Largest integer magnitude a float can carry without losing precision.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Structure tags of the temporal types.
pub mod tag {
    /// Duration {months, days, seconds, nanoseconds}
    pub const DURATION: u8 = 0x45; // 'E'
    /// Date {epochDay}
    pub const DATE: u8 = 0x44; // 'D'
    /// Time {nanoOfDay, offsetSeconds}
    pub const TIME: u8 = 0x54; // 'T'
    /// LocalTime {nanoOfDay}
    pub const LOCAL_TIME: u8 = 0x74; // 't'
    /// LocalDateTime {epochSecond, nano}
    pub const LOCAL_DATE_TIME: u8 = 0x64; // 'd'
    /// DateTime {utcEpochSecond, nano, offsetSeconds}, Bolt 5.0+
    pub const DATE_TIME_OFFSET: u8 = 0x49; // 'I'
    /// DateTime {utcEpochSecond, nano, zoneId}, Bolt 5.0+
    pub const DATE_TIME_ZONE_ID: u8 = 0x69; // 'i'
    /// DateTime {localEpochSecond, nano, offsetSeconds}, before Bolt 5.0
    pub const LEGACY_DATE_TIME_OFFSET: u8 = 0x46; // 'F'
    /// DateTime {localEpochSecond, nano, zoneId}, before Bolt 5.0
    pub const LEGACY_DATE_TIME_ZONE_ID: u8 = 0x66; // 'f'
}

/// Size carried in the low nibble of a tiny marker.
#[inline]
pub fn tiny_size(marker: u8) -> usize {
    (marker & 0x0F) as usize
}

/// Marker family of a tiny collection marker (high nibble).
#[inline]
pub fn tiny_family(marker: u8) -> u8 {
    marker & 0xF0
}

/// True for markers that are themselves a tiny integer.
#[inline]
pub fn is_tiny_int(marker: u8) -> bool {
    marker <= 0x7F || marker >= 0xF0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiny_markers() {
        assert_eq!(tiny_size(0x85), 5);
        assert_eq!(tiny_family(0x85), TINY_STRING);
        assert_eq!(tiny_family(0x9F), TINY_LIST);
        assert_eq!(tiny_family(0xA3), TINY_MAP);
        assert_eq!(tiny_family(0xB4), TINY_STRUCT);
    }

    #[test]
    fn test_tiny_int_markers() {
        assert!(is_tiny_int(0x00));
        assert!(is_tiny_int(0x7F));
        assert!(is_tiny_int(0xF0));
        assert!(is_tiny_int(0xFF));
        assert!(!is_tiny_int(NULL));
        assert!(!is_tiny_int(TINY_STRING));
        assert_eq!(0xF0u8 as i8 as i64, TINY_INT_MIN);
    }

    #[test]
    fn test_temporal_tags_distinct() {
        let tags = [
            tag::DURATION,
            tag::DATE,
            tag::TIME,
            tag::LOCAL_TIME,
            tag::LOCAL_DATE_TIME,
            tag::DATE_TIME_OFFSET,
            tag::DATE_TIME_ZONE_ID,
            tag::LEGACY_DATE_TIME_OFFSET,
            tag::LEGACY_DATE_TIME_ZONE_ID,
        ];
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
