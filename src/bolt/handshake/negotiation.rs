//! Bolt handshake negotiation.

use super::{BoltVersion, HandshakeError, BOLT_MAGIC, HANDSHAKE_SIZE};

/// ASCII "HTTP", what an HTTP server sends back instead of a version.
const HTTP_RESPONSE: [u8; 4] = *b"HTTP";

/// One proposal slot: newest version plus how many older minors it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub newest: BoltVersion,
    pub range: u8,
}

impl VersionRange {
    pub const fn new(newest: BoltVersion, range: u8) -> Self {
        Self { newest, range }
    }

    /// Wire form: `[0, range, minor, major]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [0, self.range, self.newest.minor(), self.newest.major()]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Option<(u8, u8, u8)> {
        if bytes == [0; 4] {
            return None;
        }
        Some((bytes[3], bytes[2], bytes[1]))
    }

    pub fn contains(self, version: BoltVersion) -> bool {
        version.major() == self.newest.major()
            && version.minor() <= self.newest.minor()
            && version.minor() + self.range >= self.newest.minor()
    }
}

/// Client side of the handshake.
///
/// The client sends the magic preamble and four version slots, newest first,
/// then reads the single version the server agreed on.
#[derive(Debug, Clone)]
pub struct Handshake {
    proposals: [Option<VersionRange>; 4],
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    /// Propose 5.4..5.0, 4.4..4.2, 4.1 and 3.0.
    pub fn new() -> Self {
        Self {
            proposals: [
                Some(VersionRange::new(BoltVersion::V5_4, 4)),
                Some(VersionRange::new(BoltVersion::V4_4, 2)),
                Some(VersionRange::new(BoltVersion::V4_1, 1)),
                Some(VersionRange::new(BoltVersion::V3, 0)),
            ],
        }
    }

    /// Propose exactly one version.
    pub fn only(version: BoltVersion) -> Self {
        Self {
            proposals: [Some(VersionRange::new(version, 0)), None, None, None],
        }
    }

    /// The 20 bytes written to the server.
    pub fn request(&self) -> [u8; HANDSHAKE_SIZE] {
        let mut out = [0u8; HANDSHAKE_SIZE];
        out[..4].copy_from_slice(&BOLT_MAGIC);
        for (i, slot) in self.proposals.iter().enumerate() {
            if let Some(range) = slot {
                out[4 + i * 4..8 + i * 4].copy_from_slice(&range.to_bytes());
            }
        }
        out
    }

    /// Interpret the server's 4-byte answer.
    pub fn parse_response(&self, response: [u8; 4]) -> Result<BoltVersion, HandshakeError> {
        if response == [0; 4] {
            return Err(HandshakeError::NoCompatibleVersion);
        }
        if response == HTTP_RESPONSE {
            return Err(HandshakeError::Http);
        }
        let version = BoltVersion::from_bytes(response)
            .ok_or(HandshakeError::UnsupportedVersion(u32::from_be_bytes(response)))?;
        if !self.proposes(version) {
            return Err(HandshakeError::UnsupportedVersion(u32::from_be_bytes(response)));
        }
        Ok(version)
    }

    pub fn proposes(&self, version: BoltVersion) -> bool {
        self.proposals.iter().flatten().any(|r| r.contains(version))
    }
}

/// Server side: pick the first proposed version the server supports.
///
/// Used by in-process test servers.
pub fn negotiate(request: &[u8], supported: &[BoltVersion]) -> Result<BoltVersion, HandshakeError> {
    if request.len() != HANDSHAKE_SIZE {
        return Err(HandshakeError::InvalidData(format!(
            "Expected {} bytes, got {}",
            HANDSHAKE_SIZE,
            request.len()
        )));
    }
    if request[..4] != BOLT_MAGIC {
        return Err(HandshakeError::InvalidData("bad magic preamble".into()));
    }
    for slot in request[4..].chunks_exact(4) {
        let bytes = [slot[0], slot[1], slot[2], slot[3]];
        let Some((major, minor, range)) = VersionRange::from_bytes(bytes) else {
            continue;
        };
        for m in (minor.saturating_sub(range)..=minor).rev() {
            if let Some(v) = BoltVersion::new(major, m).filter(|v| supported.contains(v)) {
                return Ok(v);
            }
        }
    }
    Err(HandshakeError::NoCompatibleVersion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_layout() {
        let bytes = Handshake::new().request();
        assert_eq!(&bytes[..4], &BOLT_MAGIC);
        assert_eq!(&bytes[4..8], &[0, 4, 4, 5]);
        assert_eq!(&bytes[8..12], &[0, 2, 4, 4]);
        assert_eq!(&bytes[12..16], &[0, 1, 1, 4]);
        assert_eq!(&bytes[16..20], &[0, 0, 0, 3]);
    }

    #[test]
    fn test_every_version_is_proposed() {
        let handshake = Handshake::new();
        for v in BoltVersion::ALL {
            assert!(handshake.proposes(v), "{}", v);
        }
    }

    #[test]
    fn test_parse_response() {
        let handshake = Handshake::new();
        assert_eq!(handshake.parse_response([0, 0, 2, 5]), Ok(BoltVersion::V5_2));
        assert_eq!(handshake.parse_response([0, 0, 0, 3]), Ok(BoltVersion::V3));
        assert_eq!(
            handshake.parse_response([0, 0, 0, 0]),
            Err(HandshakeError::NoCompatibleVersion)
        );
        assert_eq!(handshake.parse_response(*b"HTTP"), Err(HandshakeError::Http));
        assert!(matches!(
            handshake.parse_response([0, 0, 7, 6]),
            Err(HandshakeError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_single_proposal() {
        let handshake = Handshake::only(BoltVersion::V4_2);
        assert_eq!(&handshake.request()[4..8], &[0, 0, 2, 4]);
        assert!(matches!(
            handshake.parse_response([0, 0, 4, 4]),
            Err(HandshakeError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_server_negotiation() {
        let request = Handshake::new().request();
        assert_eq!(negotiate(&request, &BoltVersion::ALL), Ok(BoltVersion::V5_4));
        assert_eq!(
            negotiate(&request, &[BoltVersion::V4_3, BoltVersion::V4_0]),
            Ok(BoltVersion::V4_3)
        );
        assert_eq!(negotiate(&request, &[BoltVersion::V4_0]), Ok(BoltVersion::V4_0));
        assert_eq!(
            negotiate(&Handshake::only(BoltVersion::V5_0).request(), &[BoltVersion::V3]),
            Err(HandshakeError::NoCompatibleVersion)
        );
    }
}
