//! Little-endian base-128 varints as used by Sponge `BlockData`.

use crate::error::{Result, SchemError};

const CONTINUE_BIT: u8 = 0x80;
const SEGMENT_BITS: u8 = 0x7F;

/// Largest value a decoded palette id may take.
pub const MAX_VALUE: u32 = i32::MAX as u32;

/// Append the varint encoding of `value` to `out`.
pub fn encode_into(mut value: u32, out: &mut Vec<u8>) {
    loop {
        let byte = (value & SEGMENT_BITS as u32) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | CONTINUE_BIT);
    }
}

pub fn encode(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    encode_into(value, &mut out);
    out
}

/// Number of bytes `encode(value)` produces.
pub fn encoded_len(value: u32) -> usize {
    let bits = u32::BITS - value.leading_zeros();
    std::cmp::max(1, bits.div_ceil(7) as usize)
}

/// Decode one varint starting at `offset`, returning `(value, bytes_consumed)`.
pub fn decode(bytes: &[u8], offset: usize) -> Result<(u32, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    let mut position = offset;

    loop {
        let byte = *bytes
            .get(position)
            .ok_or(SchemError::MalformedVarint { offset })?;
        position += 1;

        value |= u64::from(byte & SEGMENT_BITS) << shift;
        if value > u64::from(MAX_VALUE) {
            return Err(SchemError::IntegerOverflow { offset });
        }
        if byte & CONTINUE_BIT == 0 {
            return Ok((value as u32, position - offset));
        }

        shift += 7;
        // five groups cover 35 bits; a sixth can never fit an i32
        if shift >= 35 {
            return Err(SchemError::IntegerOverflow { offset });
        }
    }
}

/// Iterator over consecutive varints in a byte slice.
pub struct VarintReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> VarintReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }
}

impl Iterator for VarintReader<'_> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.bytes.len() {
            return None;
        }
        match decode(self.bytes, self.position) {
            Ok((value, consumed)) => {
                self.position += consumed;
                Some(Ok(value))
            }
            Err(e) => {
                // stop iterating after a hard failure
                self.position = self.bytes.len();
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_single_byte_values() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(1), vec![0x01]);
        assert_eq!(encode(127), vec![0x7F]);
    }

    #[test]
    fn test_multi_byte_values() {
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xAC, 0x02]);
        assert_eq!(encode(16_384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode(MAX_VALUE), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
    }

    #[test]
    fn test_decode_reports_consumed_bytes() {
        let bytes = [0x05, 0xAC, 0x02, 0x7F];
        assert_eq!(decode(&bytes, 0).unwrap(), (5, 1));
        assert_eq!(decode(&bytes, 1).unwrap(), (300, 2));
        assert_eq!(decode(&bytes, 3).unwrap(), (127, 1));
    }

    #[test]
    fn test_random_values_survive() {
        let mut rng = rand::thread_rng();
        for _ in 0..2_000 {
            let value = rng.gen_range(0..=MAX_VALUE);
            let bytes = encode(value);
            assert_eq!(bytes.len(), encoded_len(value));
            assert_eq!(decode(&bytes, 0).unwrap(), (value, bytes.len()));
        }
    }

    #[test]
    fn test_truncated_stream_is_malformed() {
        let err = decode(&[0x80, 0x80], 0).unwrap_err();
        assert!(matches!(err, SchemError::MalformedVarint { offset: 0 }));

        let err = decode(&[], 0).unwrap_err();
        assert!(matches!(err, SchemError::MalformedVarint { .. }));
    }

    #[test]
    fn test_overflow_is_rejected() {
        // 2^31 does not fit a palette id
        let err = decode(&[0x80, 0x80, 0x80, 0x80, 0x08], 0).unwrap_err();
        assert!(matches!(err, SchemError::IntegerOverflow { .. }));

        // endless zero continuation groups
        let err = decode(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00], 0).unwrap_err();
        assert!(matches!(err, SchemError::IntegerOverflow { .. }));
    }

    #[test]
    fn test_reader_walks_stream() {
        let mut bytes = Vec::new();
        for value in [0u32, 1, 200, 70_000] {
            encode_into(value, &mut bytes);
        }
        let values: Vec<u32> = VarintReader::new(&bytes).map(|v| v.unwrap()).collect();
        assert_eq!(values, vec![0, 1, 200, 70_000]);
    }
}
