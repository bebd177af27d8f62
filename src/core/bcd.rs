//! BCD and 7-segment encoding of the two-digit count display
//!
//! The counter rig drives two 7-segment digits through BCD decoders. These
//! helpers reproduce what the decoders see so the console can show a
//! circuit-level view next to the plain number.

/// Segment patterns for 0-9, bit 6 = segment `a` ... bit 0 = segment `g`
const SEGMENTS: [u8; 10] = [
    0b111_1110, // 0
    0b011_0000, // 1
    0b110_1101, // 2
    0b111_1001, // 3
    0b011_0011, // 4
    0b101_1011, // 5
    0b101_1111, // 6
    0b111_0000, // 7
    0b111_1111, // 8
    0b111_1011, // 9
];

/// One displayed digit as the decoder sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitEncoding {
    /// Decimal digit 0-9
    pub digit: u8,
    /// 4-bit BCD nibble (D C B A, MSB first)
    pub bcd: u8,
    /// Lit segments, `abcdefg` from bit 6 down to bit 0
    pub segments: u8,
}

impl DigitEncoding {
    /// Encode a single decimal digit (values above 9 wrap)
    pub fn new(digit: u8) -> Self {
        let digit = digit % 10;
        Self {
            digit,
            bcd: digit & 0x0F,
            segments: SEGMENTS[digit as usize],
        }
    }

    /// BCD nibble as a 4-character bit string, e.g. `0101`
    pub fn bcd_bits(&self) -> String {
        format!("{:04b}", self.bcd)
    }

    /// Names of the lit segments in `abcdefg` order
    pub fn lit_segments(&self) -> String {
        "abcdefg"
            .chars()
            .enumerate()
            .filter(|(i, _)| self.segments & (1 << (6 - i)) != 0)
            .map(|(_, c)| c)
            .collect()
    }
}

/// Tens and ones digits of a count as shown on the two-digit display
///
/// Counts above 99 show their last two digits, the same as the hardware.
pub fn encode_count(count: u32) -> [DigitEncoding; 2] {
    let shown = count % 100;
    [
        DigitEncoding::new((shown / 10) as u8),
        DigitEncoding::new((shown % 10) as u8),
    ]
}
