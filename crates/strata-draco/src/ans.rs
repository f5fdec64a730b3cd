//! Asymmetric numeral system decoders: the multi-symbol rANS coder used for
//! entropy-coded integers and the binary rABS coder used for flag streams.

use crate::buffer::{bitstream_version, DecoderBuffer};
use crate::error::{corrupt, DracoError, Result};

const IO_BASE: u32 = 256;
const BIT_L_BASE: u32 = 4096;
const BIT_PRECISION: u32 = 256;

/// Reads the initial coder state from the tail of `data`. The two high bits
/// of the last byte give the number of state bytes.
fn read_state(data: &[u8], l_base: u32, allow_four_bytes: bool) -> Result<(u32, usize)> {
    let len = data.len();
    let Some(&last) = data.last() else {
        return corrupt("empty ANS payload");
    };
    let le = |n: usize| {
        data[len - n..]
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    };
    let (state, offset) = match last >> 6 {
        0 => (u32::from(last) & 0x3F, len - 1),
        1 if len >= 2 => (le(2) & 0x3FFF, len - 2),
        2 if len >= 3 => (le(3) & 0x3F_FFFF, len - 3),
        3 if allow_four_bytes && len >= 4 => (le(4) & 0x3FFF_FFFF, len - 4),
        _ => return corrupt("invalid ANS state prefix"),
    };
    let state = state + l_base;
    if u64::from(state) >= u64::from(l_base) * u64::from(IO_BASE) {
        return corrupt("ANS state out of range");
    }
    Ok((state, offset))
}

/// Precision used by the raw symbol coder for a given maximum symbol bit length.
pub fn rans_precision_bits(max_bit_length: u32) -> u32 {
    ((3 * max_bit_length) / 2).clamp(12, 20)
}

// ============================================================================
// rANS symbol decoder
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct SymbolEntry {
    prob: u32,
    cum_prob: u32,
}

#[derive(Debug)]
pub struct RansSymbolDecoder<'a> {
    precision: u32,
    l_base: u32,
    table: Vec<SymbolEntry>,
    lut: Vec<u32>,
    data: &'a [u8],
    offset: usize,
    state: u32,
}

impl<'a> RansSymbolDecoder<'a> {
    /// Reads the probability table and the coded payload, leaving `buffer`
    /// positioned after both.
    pub fn start(buffer: &mut DecoderBuffer<'a>, precision_bits: u32) -> Result<Self> {
        let precision = 1u32 << precision_bits;
        let num_symbols = buffer.read_count()? as usize;
        if num_symbols / 64 > buffer.remaining_size() {
            return corrupt("rANS symbol count exceeds payload");
        }

        let mut probs = vec![0u32; num_symbols];
        let mut i = 0;
        while i < num_symbols {
            let prob_data = buffer.read_u8()?;
            let token = prob_data & 3;
            if token == 3 {
                let run = usize::from(prob_data >> 2);
                if i + run >= num_symbols {
                    return corrupt("rANS zero run past the alphabet");
                }
                i += run + 1;
                continue;
            }
            let mut prob = u32::from(prob_data >> 2);
            for b in 0..u32::from(token) {
                let extra = u32::from(buffer.read_u8()?);
                prob |= extra << (8 * (b + 1) - 2);
            }
            probs[i] = prob;
            i += 1;
        }

        let mut table = Vec::with_capacity(num_symbols);
        let mut lut = vec![0u32; precision as usize];
        let mut cum_prob = 0u32;
        for (symbol, &prob) in probs.iter().enumerate() {
            let start = cum_prob;
            cum_prob = cum_prob.saturating_add(prob);
            if cum_prob > precision {
                return corrupt("rANS probabilities exceed precision");
            }
            table.push(SymbolEntry {
                prob,
                cum_prob: start,
            });
            for slot in &mut lut[start as usize..cum_prob as usize] {
                *slot = symbol as u32;
            }
        }
        if num_symbols > 0 && cum_prob != precision {
            return corrupt("rANS probabilities do not sum to precision");
        }

        let bytes_encoded = if buffer.version() < bitstream_version(2, 0) {
            buffer.read_u64()?
        } else {
            buffer.read_varint_u64()?
        };
        let bytes_encoded = usize::try_from(bytes_encoded)
            .ok()
            .filter(|&n| n <= buffer.remaining_size())
            .ok_or(DracoError::UnexpectedEnd("rANS payload"))?;
        let data = buffer.read_bytes(bytes_encoded, "rANS payload")?;

        let l_base = precision * 4;
        let (state, offset) = if num_symbols == 0 {
            (l_base, 0)
        } else {
            read_state(data, l_base, true)?
        };
        Ok(Self {
            precision,
            l_base,
            table,
            lut,
            data,
            offset,
            state,
        })
    }

    pub fn num_symbols(&self) -> usize {
        self.table.len()
    }

    pub fn decode_symbol(&mut self) -> u32 {
        while self.state < self.l_base && self.offset > 0 {
            self.offset -= 1;
            self.state = self.state * IO_BASE + u32::from(self.data[self.offset]);
        }
        let quo = self.state / self.precision;
        let rem = self.state % self.precision;
        let symbol = self.lut[rem as usize];
        let entry = self.table[symbol as usize];
        self.state = quo * entry.prob + rem - entry.cum_prob;
        symbol
    }
}

// ============================================================================
// rABS bit decoder
// ============================================================================

#[derive(Debug, Clone)]
pub struct RansBitDecoder<'a> {
    prob_zero: u8,
    data: &'a [u8],
    offset: usize,
    state: u32,
}

impl<'a> RansBitDecoder<'a> {
    pub fn start(buffer: &mut DecoderBuffer<'a>) -> Result<Self> {
        let prob_zero = buffer.read_u8()?;
        let size = if buffer.version() < bitstream_version(2, 2) {
            buffer.read_u32()?
        } else {
            buffer.read_varint_u32()?
        } as usize;
        let data = buffer.read_bytes(size, "rABS payload")?;
        let (state, offset) = read_state(data, BIT_L_BASE, false)?;
        Ok(Self {
            prob_zero,
            data,
            offset,
            state,
        })
    }

    pub fn decode_next_bit(&mut self) -> bool {
        let p = BIT_PRECISION - u32::from(self.prob_zero);
        if self.state < BIT_L_BASE && self.offset > 0 {
            self.offset -= 1;
            self.state = self.state * IO_BASE + u32::from(self.data[self.offset]);
        }
        let x = self.state;
        let quot = x / BIT_PRECISION;
        let rem = x % BIT_PRECISION;
        let xn = quot * p;
        let bit = rem < p;
        self.state = if bit { xn + rem } else { x - xn - p };
        bit
    }

    /// Reads `nbits` flags, the first one landing in the most significant bit.
    pub fn decode_msb_bits(&mut self, nbits: u32) -> u32 {
        (0..nbits).fold(0, |acc, _| (acc << 1) | u32::from(self.decode_next_bit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_is_clamped() {
        assert_eq!(rans_precision_bits(1), 12);
        assert_eq!(rans_precision_bits(10), 15);
        assert_eq!(rans_precision_bits(18), 20);
    }

    #[test]
    fn test_single_symbol_alphabet_repeats() {
        // One symbol owning the full 4096 precision: prob 0 + extra byte 0x40 << 6.
        let bytes = [1u8, 0b0000_0001, 0x40, 1, 0x00];
        let mut buffer = DecoderBuffer::new(&bytes);
        let mut decoder = RansSymbolDecoder::start(&mut buffer, 12).unwrap();
        assert_eq!(decoder.num_symbols(), 1);
        for _ in 0..8 {
            assert_eq!(decoder.decode_symbol(), 0);
        }
        assert_eq!(buffer.remaining_size(), 0);
    }

    #[test]
    fn test_probabilities_must_fill_precision() {
        // Two symbols of probability 1 cannot describe a 4096 table.
        let bytes = [2u8, 0b0000_0100, 0b0000_0100, 1, 0x00];
        let mut buffer = DecoderBuffer::new(&bytes);
        assert!(RansSymbolDecoder::start(&mut buffer, 12).is_err());
    }

    #[test]
    fn test_bit_decoder_reads_known_flag() {
        // prob_zero 255 leaves p = 1; state 4097 gives rem 1 which is not < 1.
        let bytes = [255u8, 1, 0x01];
        let mut buffer = DecoderBuffer::new(&bytes);
        let mut decoder = RansBitDecoder::start(&mut buffer).unwrap();
        assert!(!decoder.decode_next_bit());
    }

    #[test]
    fn test_bit_decoder_rejects_four_byte_state() {
        let bytes = [0u8, 1, 0xC0];
        let mut buffer = DecoderBuffer::new(&bytes);
        assert!(RansBitDecoder::start(&mut buffer).is_err());
    }
}
