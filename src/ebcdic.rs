//! EBCDIC code page 037 translation for 3270 screen text
//!
//! Only the graphic range (0x40-0xFF) carries display characters on a 3270.
//! Everything below 0x40 is either an order, a format control or the null
//! character, and all of those display as a blank.

/// EBCDIC null: an empty buffer position, suppressed on read
pub const EBCDIC_NULL: u8 = 0x00;

/// EBCDIC space
pub const EBCDIC_SPACE: u8 = 0x40;

/// ASCII rendering of CP037 positions 0x40-0xFF, sixteen per row.
/// Positions without an ASCII equivalent render as a space.
const CP037_GRAPHICS: &[u8] = concat!(
    "           .<(+|", // 0x40
    "&         !$*); ", // 0x50
    "-/         ,%_>?", // 0x60
    "         `:#@'=\"", // 0x70
    " abcdefghi      ", // 0x80
    " jklmnopqr      ", // 0x90
    " ~stuvwxyz      ", // 0xA0
    "^         []    ", // 0xB0
    "{ABCDEFGHI      ", // 0xC0
    "}JKLMNOPQR      ", // 0xD0
    "\\ STUVWXYZ      ", // 0xE0
    "0123456789      ", // 0xF0
)
.as_bytes();

/// Convert an EBCDIC byte to the ASCII character shown on screen
#[inline]
pub fn ebcdic_to_ascii(byte: u8) -> char {
    if byte < EBCDIC_SPACE {
        ' '
    } else {
        CP037_GRAPHICS[(byte - EBCDIC_SPACE) as usize] as char
    }
}

/// Convert an ASCII character to EBCDIC, or `None` if CP037 has no
/// ASCII-range graphic for it
pub fn ascii_to_ebcdic(ch: char) -> Option<u8> {
    if ch == ' ' {
        return Some(EBCDIC_SPACE);
    }
    if !ch.is_ascii_graphic() {
        return None;
    }
    CP037_GRAPHICS
        .iter()
        .position(|&c| c == ch as u8)
        .map(|index| index as u8 + EBCDIC_SPACE)
}

/// Convert EBCDIC bytes to a displayable string
pub fn ebcdic_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| ebcdic_to_ascii(b)).collect()
}

/// Convert an ASCII string to EBCDIC, substituting a space for any
/// character without a CP037 equivalent
pub fn string_to_ebcdic(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| ascii_to_ebcdic(ch).unwrap_or(EBCDIC_SPACE))
        .collect()
}

/// True for EBCDIC digits 0-9
pub fn is_ebcdic_digit(byte: u8) -> bool {
    (0xF0..=0xF9).contains(&byte)
}
