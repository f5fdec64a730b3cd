//! Entropy-coded unsigned symbol streams.

use crate::ans::{rans_precision_bits, RansSymbolDecoder};
use crate::buffer::DecoderBuffer;
use crate::error::{corrupt, DracoError, Result};

const TAGGED_SCHEME: u8 = 0;
const RAW_SCHEME: u8 = 1;
const TAG_PRECISION_BITS: u32 = 12;
const MAX_RAW_BIT_LENGTH: u8 = 18;

/// Decodes `num_values` symbols laid out in groups of `num_components`.
pub fn decode_symbols(
    buffer: &mut DecoderBuffer<'_>,
    num_values: usize,
    num_components: usize,
) -> Result<Vec<u32>> {
    if num_values == 0 {
        return Ok(Vec::new());
    }
    match buffer.read_u8()? {
        TAGGED_SCHEME => decode_tagged(buffer, num_values, num_components.max(1)),
        RAW_SCHEME => decode_raw(buffer, num_values),
        other => Err(DracoError::Unsupported(format!(
            "symbol coding scheme {other}"
        ))),
    }
}

fn decode_raw(buffer: &mut DecoderBuffer<'_>, num_values: usize) -> Result<Vec<u32>> {
    let max_bit_length = buffer.read_u8()?;
    if max_bit_length == 0 || max_bit_length > MAX_RAW_BIT_LENGTH {
        return corrupt(format!("raw symbol bit length {max_bit_length}"));
    }
    let mut decoder =
        RansSymbolDecoder::start(buffer, rans_precision_bits(u32::from(max_bit_length)))?;
    if decoder.num_symbols() == 0 {
        return corrupt("raw symbol stream has an empty alphabet");
    }
    Ok((0..num_values).map(|_| decoder.decode_symbol()).collect())
}

fn decode_tagged(
    buffer: &mut DecoderBuffer<'_>,
    num_values: usize,
    num_components: usize,
) -> Result<Vec<u32>> {
    let mut tags = RansSymbolDecoder::start(buffer, TAG_PRECISION_BITS)?;
    if tags.num_symbols() == 0 {
        return corrupt("tagged symbol stream has an empty alphabet");
    }
    buffer.start_bit_decoding(false)?;
    let mut values = Vec::with_capacity(num_values);
    while values.len() < num_values {
        let bit_length = tags.decode_symbol();
        if bit_length > 32 {
            return corrupt(format!("tagged symbol bit length {bit_length}"));
        }
        for _ in 0..num_components {
            values.push(buffer.decode_lsb_bits(bit_length));
        }
    }
    buffer.end_bit_decoding();
    values.truncate(num_values);
    Ok(values)
}

/// Folds the sign back out of a symbol: even symbols are non-negative.
pub fn symbol_to_signed(symbol: u32) -> i32 {
    let magnitude = (symbol >> 1) as i32;
    if symbol & 1 == 0 {
        magnitude
    } else {
        -magnitude - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_stream_reads_nothing() {
        let mut buffer = DecoderBuffer::new(&[0xFF]);
        assert!(decode_symbols(&mut buffer, 0, 3).unwrap().is_empty());
        assert_eq!(buffer.remaining_size(), 1);
    }

    #[test]
    fn test_tagged_stream_reads_fixed_width_values() {
        // Tag alphabet {0, 0, 0, 4}: only bit length 3 is possible.
        let bytes = [
            TAGGED_SCHEME,
            4,
            0b0000_1011, // zero run covering symbols 0..=2
            0b0000_0001,
            0x40, // symbol 3 owns the whole table
            1,
            0x00,
            0b0111_0101, // 3-bit values packed least significant bit first
            0b0000_0000,
        ];
        let mut buffer = DecoderBuffer::new(&bytes);
        let values = decode_symbols(&mut buffer, 3, 1).unwrap();
        assert_eq!(values, vec![0b101, 0b110, 0b001]);
        assert_eq!(buffer.remaining_size(), 0);
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let mut buffer = DecoderBuffer::new(&[7]);
        assert!(decode_symbols(&mut buffer, 1, 1).is_err());
    }

    proptest! {
        #[test]
        fn test_signed_mapping_is_bijective(value in -1_000_000i32..1_000_000) {
            let symbol = if value >= 0 {
                (value as u32) << 1
            } else {
                (((-value - 1) as u32) << 1) | 1
            };
            prop_assert_eq!(symbol_to_signed(symbol), value);
        }
    }
}
