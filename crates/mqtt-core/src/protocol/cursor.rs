//! Growable byte buffer with a read cursor.
//!
//! `ByteCursor` is the single wire primitive every packet reads from and
//! writes to.  Writes always append at the logical end of the buffer; reads
//! consume from the current position.
//!
//! # Failure contract
//!
//! A read that would go past the written data fails with
//! [`ProtocolError::EndOfStream`] and leaves the position exactly where it
//! was.  The stream parser depends on this: when a packet is only partially
//! buffered it simply stops and retries the same bytes on the next push.
//!
//! ```text
//!   consumed        unread            free
//! [#########|.....................]
//!  0     position                len
//! ```

use crate::protocol::codec::ProtocolError;

/// Largest value the remaining-length field can carry (4 groups of 7 bits).
pub const MAX_REMAINING_LENGTH: u32 = 268_435_455;

/// Largest length a 2-byte length prefix can describe.
pub const MAX_STRING_LENGTH: usize = u16::MAX as usize;

/// Number of 7-bit groups allowed in a remaining-length field.
const MAX_REMAINING_LENGTH_GROUPS: usize = 4;

/// A byte buffer plus a read position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteCursor {
    data: Vec<u8>,
    position: usize,
}

impl ByteCursor {
    /// Creates an empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cursor with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Total number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes between the position and the end of the data.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the read position.  Positions past the end are allowed; reads
    /// from there fail until enough data has been appended.
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Moves the read position by `offset`, clamping at zero.
    pub fn seek(&mut self, offset: isize) {
        self.position = self.position.saturating_add_signed(offset);
    }

    /// Drops every byte before the position and resets the position to 0.
    pub fn compact(&mut self) {
        let consumed = self.position.min(self.data.len());
        self.data.drain(..consumed);
        self.position -= consumed;
    }

    /// Returns the bytes that have not been read yet.
    pub fn unread(&self) -> &[u8] {
        self.data.get(self.position..).unwrap_or(&[])
    }

    /// Returns the whole buffer, read or not.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Returns the byte at the position without consuming it.
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        let byte = self.peek_byte().ok_or(ProtocolError::EndOfStream)?;
        self.position += 1;
        Ok(byte)
    }

    /// Reads a big-endian 16-bit word.
    pub fn read_word(&mut self) -> Result<u16, ProtocolError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8], ProtocolError> {
        if self.remaining() < count {
            return Err(ProtocolError::EndOfStream);
        }
        let start = self.position;
        self.position += count;
        Ok(&self.data[start..start + count])
    }

    /// Reads a 2-byte length prefix followed by that many raw bytes.
    pub fn read_length_prefixed_bytes(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let start = self.position;
        let result = self
            .read_word()
            .and_then(|len| self.read_bytes(len as usize).map(<[u8]>::to_vec));
        if result.is_err() {
            self.position = start;
        }
        result
    }

    /// Reads a 2-byte length prefix followed by that many UTF-8 bytes.
    ///
    /// Invalid UTF-8 (including encoded surrogates) is a
    /// [`ProtocolError::MalformedPacket`].
    pub fn read_length_prefixed_string(&mut self) -> Result<String, ProtocolError> {
        let start = self.position;
        let result = self.read_length_prefixed_bytes().and_then(|bytes| {
            String::from_utf8(bytes)
                .map_err(|e| ProtocolError::MalformedPacket(format!("invalid UTF-8 string: {e}")))
        });
        if result.is_err() {
            self.position = start;
        }
        result
    }

    /// Decodes a variable byte integer (the MQTT remaining length).
    ///
    /// Groups are 7 bits, least significant first; bit 7 flags a following
    /// group.  A fifth group is a [`ProtocolError::MalformedPacket`].
    pub fn read_remaining_length(&mut self) -> Result<u32, ProtocolError> {
        let start = self.position;
        let mut value = 0u32;
        for group in 0..MAX_REMAINING_LENGTH_GROUPS {
            let byte = match self.read_byte() {
                Ok(byte) => byte,
                Err(e) => {
                    self.position = start;
                    return Err(e);
                }
            };
            value |= u32::from(byte & 0x7F) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ProtocolError::MalformedPacket(
            "remaining length exceeds 4 bytes".to_string(),
        ))
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Writes a big-endian 16-bit word.
    pub fn write_word(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    /// Writes a 2-byte length prefix followed by the raw bytes.
    pub fn write_length_prefixed_bytes(&mut self, value: &[u8]) -> Result<(), ProtocolError> {
        let len = u16::try_from(value.len()).map_err(|_| {
            ProtocolError::InvalidArgument(format!(
                "length-prefixed value of {} bytes exceeds {MAX_STRING_LENGTH}",
                value.len()
            ))
        })?;
        self.write_word(len);
        self.write_bytes(value);
        Ok(())
    }

    /// Writes a 2-byte length prefix followed by the UTF-8 bytes of `value`.
    pub fn write_length_prefixed_string(&mut self, value: &str) -> Result<(), ProtocolError> {
        self.write_length_prefixed_bytes(value.as_bytes())
    }

    /// Encodes `value` as a variable byte integer.
    pub fn write_remaining_length(&mut self, value: u32) -> Result<(), ProtocolError> {
        if value > MAX_REMAINING_LENGTH {
            return Err(ProtocolError::InvalidArgument(format!(
                "remaining length {value} exceeds {MAX_REMAINING_LENGTH}"
            )));
        }
        let mut rest = value;
        loop {
            let mut byte = (rest & 0x7F) as u8;
            rest >>= 7;
            if rest > 0 {
                byte |= 0x80;
            }
            self.write_byte(byte);
            if rest == 0 {
                return Ok(());
            }
        }
    }
}

impl From<Vec<u8>> for ByteCursor {
    fn from(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }
}

impl From<&[u8]> for ByteCursor {
    fn from(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remaining_length_bytes(value: u32) -> Vec<u8> {
        let mut cursor = ByteCursor::new();
        cursor.write_remaining_length(value).expect("valid length");
        cursor.into_inner()
    }

    #[test]
    fn test_read_word_is_big_endian() {
        let mut cursor = ByteCursor::from(vec![0x12, 0x34]);
        assert_eq!(cursor.read_word(), Ok(0x1234));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_over_read_keeps_position() {
        // Arrange
        let mut cursor = ByteCursor::from(vec![0x01, 0x02, 0x03]);
        cursor.read_byte().unwrap();

        // Act
        let result = cursor.read_bytes(5);

        // Assert
        assert_eq!(result, Err(ProtocolError::EndOfStream));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_truncated_string_keeps_position() {
        // Length prefix says 5 bytes but only 2 follow.
        let mut cursor = ByteCursor::from(vec![0x00, 0x05, b'a', b'b']);
        assert_eq!(
            cursor.read_length_prefixed_string(),
            Err(ProtocolError::EndOfStream)
        );
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_invalid_utf8_string_is_malformed() {
        let mut cursor = ByteCursor::from(vec![0x00, 0x02, 0xC3, 0x28]);
        assert!(matches!(
            cursor.read_length_prefixed_string(),
            Err(ProtocolError::MalformedPacket(_))
        ));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_encoded_surrogate_is_malformed() {
        // U+D800 encoded as CESU-8 style bytes is not valid UTF-8.
        let mut cursor = ByteCursor::from(vec![0x00, 0x03, 0xED, 0xA0, 0x80]);
        assert!(matches!(
            cursor.read_length_prefixed_string(),
            Err(ProtocolError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_string_round_trip() {
        let mut cursor = ByteCursor::new();
        cursor.write_length_prefixed_string("héllo").unwrap();
        assert_eq!(cursor.as_slice()[..2], [0x00, 0x06]);
        assert_eq!(cursor.read_length_prefixed_string().unwrap(), "héllo");
    }

    #[test]
    fn test_write_string_longer_than_prefix_fails() {
        let mut cursor = ByteCursor::new();
        let too_long = "a".repeat(MAX_STRING_LENGTH + 1);
        assert!(matches!(
            cursor.write_length_prefixed_string(&too_long),
            Err(ProtocolError::InvalidArgument(_))
        ));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_remaining_length_boundaries_encode_to_expected_bytes() {
        assert_eq!(remaining_length_bytes(0), vec![0x00]);
        assert_eq!(remaining_length_bytes(127), vec![0x7F]);
        assert_eq!(remaining_length_bytes(128), vec![0x80, 0x01]);
        assert_eq!(remaining_length_bytes(16_383), vec![0xFF, 0x7F]);
        assert_eq!(remaining_length_bytes(16_384), vec![0x80, 0x80, 0x01]);
        assert_eq!(remaining_length_bytes(2_097_151), vec![0xFF, 0xFF, 0x7F]);
        assert_eq!(remaining_length_bytes(2_097_152), vec![0x80, 0x80, 0x80, 0x01]);
        assert_eq!(
            remaining_length_bytes(MAX_REMAINING_LENGTH),
            vec![0xFF, 0xFF, 0xFF, 0x7F]
        );
    }

    #[test]
    fn test_remaining_length_decodes_boundaries() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, MAX_REMAINING_LENGTH] {
            let mut cursor = ByteCursor::from(remaining_length_bytes(value));
            assert_eq!(cursor.read_remaining_length(), Ok(value));
            assert_eq!(cursor.remaining(), 0);
        }
    }

    #[test]
    fn test_remaining_length_too_large_to_encode() {
        let mut cursor = ByteCursor::new();
        assert!(matches!(
            cursor.write_remaining_length(MAX_REMAINING_LENGTH + 1),
            Err(ProtocolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_remaining_length_fifth_group_is_malformed() {
        let mut cursor = ByteCursor::from(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        assert!(matches!(
            cursor.read_remaining_length(),
            Err(ProtocolError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_incomplete_remaining_length_is_end_of_stream() {
        let mut cursor = ByteCursor::from(vec![0x80, 0x80]);
        assert_eq!(cursor.read_remaining_length(), Err(ProtocolError::EndOfStream));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_seek_clamps_at_zero_and_allows_past_end() {
        let mut cursor = ByteCursor::from(vec![1, 2, 3]);
        cursor.seek(-10);
        assert_eq!(cursor.position(), 0);
        cursor.seek(10);
        assert_eq!(cursor.position(), 10);
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.read_byte(), Err(ProtocolError::EndOfStream));
    }

    #[test]
    fn test_compact_drops_consumed_bytes() {
        // Arrange
        let mut cursor = ByteCursor::from(vec![1, 2, 3, 4]);
        cursor.read_bytes(3).unwrap();

        // Act
        cursor.compact();

        // Assert
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.as_slice(), &[4]);
        assert_eq!(cursor.read_byte(), Ok(4));
    }

    #[test]
    fn test_writes_append_after_reads() {
        let mut cursor = ByteCursor::from(vec![0xAA]);
        assert_eq!(cursor.read_byte(), Ok(0xAA));
        cursor.write_word(0xBEEF);
        assert_eq!(cursor.read_word(), Ok(0xBEEF));
    }
}
