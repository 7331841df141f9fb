//! Bolt protocol version definitions.

use std::fmt;

/// Bolt protocol versions.
///
/// The discriminant packs the major version in the high 16 bits and the
/// minor version in the low 16 bits, so declaration order and numeric order
/// agree. On the wire a version is sent as `[0, 0, minor, major]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum BoltVersion {
    /// Bolt 3.0
    V3 = 0x0003_0000,
    /// Bolt 4.0 - databases, PULL/DISCARD with n and qid
    V4_0 = 0x0004_0000,
    /// Bolt 4.1 - routing context in HELLO
    V4_1 = 0x0004_0001,
    /// Bolt 4.2
    V4_2 = 0x0004_0002,
    /// Bolt 4.3 - ROUTE message
    V4_3 = 0x0004_0003,
    /// Bolt 4.4 - impersonation
    V4_4 = 0x0004_0004,
    /// Bolt 5.0 - UTC date-times
    V5_0 = 0x0005_0000,
    /// Bolt 5.1 - LOGON/LOGOFF
    V5_1 = 0x0005_0001,
    /// Bolt 5.2 - notification filters
    V5_2 = 0x0005_0002,
    /// Bolt 5.3 - bolt agent
    V5_3 = 0x0005_0003,
    /// Bolt 5.4
    V5_4 = 0x0005_0004,
}

impl BoltVersion {
    /// All supported versions, newest first.
    pub const ALL: [BoltVersion; 11] = [
        BoltVersion::V5_4,
        BoltVersion::V5_3,
        BoltVersion::V5_2,
        BoltVersion::V5_1,
        BoltVersion::V5_0,
        BoltVersion::V4_4,
        BoltVersion::V4_3,
        BoltVersion::V4_2,
        BoltVersion::V4_1,
        BoltVersion::V4_0,
        BoltVersion::V3,
    ];

    pub fn new(major: u8, minor: u8) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.major() == major && v.minor() == minor)
    }

    pub fn major(self) -> u8 {
        ((self as u32) >> 16) as u8
    }

    pub fn minor(self) -> u8 {
        ((self as u32) & 0xFFFF) as u8
    }

    /// Wire form: `[0, 0, minor, major]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [0, 0, self.minor(), self.major()]
    }

    /// Parse the version a server agreed on.
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        Self::new(bytes[3], bytes[2])
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}
