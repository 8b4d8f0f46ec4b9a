// Copyright 2025 the Stasis authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the unified container format for persisted snapshots.
//!
//! Every snapshot written to a store uses this format: a fixed-size
//! [`SnapshotHeader`] followed by a variable-length payload. The header acts
//! as a manifest, naming the codec used to encode the payload so a reader
//! can refuse data it does not understand instead of misparsing it.

use std::convert::TryInto;

/// A unique byte sequence to identify Stasis snapshot blobs ("STASISSN").
pub const HEADER_MAGIC_BYTES: [u8; 8] = *b"STASISSN";
const CODEC_ID_LEN: usize = 32;

/// The fixed-size header at the beginning of every persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes to identify the blob type, must be `HEADER_MAGIC_BYTES`.
    pub magic_bytes: [u8; 8],
    /// The version of the header format itself.
    pub format_version: u8,
    /// A null-padded UTF-8 string identifying the payload codec,
    /// e.g. `"ST_FLAT_V1"`.
    pub codec_id: [u8; CODEC_ID_LEN],
    /// The length of the payload data that follows this header, in bytes.
    pub payload_length: u64,
}

/// A logical representation of a full persisted snapshot in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// The parsed header data.
    pub header: SnapshotHeader,
    /// The raw, variable-length payload data.
    pub payload: Vec<u8>,
}

// NOTE: the header is a fixed-layout prefix, not a serde type; direct byte
// manipulation keeps it robust against codec evolution in the payload.
impl SnapshotHeader {
    /// The total size of the header in bytes.
    pub const SIZE: usize = 8 + 1 + CODEC_ID_LEN + 8;

    /// Builds a version-1 header for a payload of `payload_length` bytes
    /// encoded with `codec_id`.
    ///
    /// `codec_id` must be at most 32 bytes of UTF-8; it is null-padded.
    pub fn new(codec_id: &str, payload_length: u64) -> Self {
        let mut codec_bytes = [0u8; CODEC_ID_LEN];
        let len = codec_id.len().min(CODEC_ID_LEN);
        codec_bytes[..len].copy_from_slice(&codec_id.as_bytes()[..len]);
        Self {
            magic_bytes: HEADER_MAGIC_BYTES,
            format_version: 1,
            codec_id: codec_bytes,
            payload_length,
        }
    }

    /// Returns the codec id as a trimmed string slice, if it is valid UTF-8.
    pub fn codec_id_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.codec_id)
            .ok()
            .map(|s| s.trim_end_matches('\0'))
    }

    /// Attempts to parse a `SnapshotHeader` from the beginning of a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() < Self::SIZE {
            return Err("Not enough bytes to form a valid header");
        }

        let magic_bytes: [u8; 8] = bytes[0..8].try_into().unwrap();
        if magic_bytes != HEADER_MAGIC_BYTES {
            return Err("Invalid magic bytes; not a Stasis snapshot");
        }

        let format_version = bytes[8];

        let codec_id: [u8; CODEC_ID_LEN] = bytes[9..9 + CODEC_ID_LEN].try_into().unwrap();

        let payload_length =
            u64::from_le_bytes(bytes[9 + CODEC_ID_LEN..Self::SIZE].try_into().unwrap());

        Ok(Self {
            magic_bytes,
            format_version,
            codec_id,
            payload_length,
        })
    }

    /// Serializes the header into its fixed-size byte form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(&self.magic_bytes);
        bytes.push(self.format_version);
        bytes.extend_from_slice(&self.codec_id);
        bytes.extend_from_slice(&self.payload_length.to_le_bytes());
        bytes
    }
}

impl SnapshotFile {
    /// Wraps a payload encoded with `codec_id` into a framed snapshot blob.
    pub fn new(codec_id: &str, payload: Vec<u8>) -> Self {
        Self {
            header: SnapshotHeader::new(codec_id, payload.len() as u64),
            payload,
        }
    }

    /// Serializes header and payload into one contiguous byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header.to_bytes();
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parses a framed snapshot blob, validating the header and payload length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        let header = SnapshotHeader::from_bytes(bytes)?;
        let expected = SnapshotHeader::SIZE as u64 + header.payload_length;
        if (bytes.len() as u64) < expected {
            return Err("Snapshot payload is truncated");
        }
        let payload = bytes[SnapshotHeader::SIZE..expected as usize].to_vec();
        Ok(Self { header, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_bytes() {
        let file = SnapshotFile::new("ST_FLAT_V1", vec![1, 2, 3, 4]);
        let bytes = file.to_bytes();

        let parsed = SnapshotFile::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, file);
        assert_eq!(parsed.header.codec_id_str(), Some("ST_FLAT_V1"));
        assert_eq!(parsed.header.payload_length, 4);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = SnapshotFile::new("ST_FLAT_V1", vec![]).to_bytes();
        bytes[0] = b'X';
        assert!(SnapshotFile::from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = SnapshotFile::new("ST_FLAT_V1", vec![9; 16]).to_bytes();
        assert!(SnapshotFile::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }
}
