//! Buffer addressing and screen geometry
//!
//! A buffer address is a linear position in `[0, rows * cols)`. On the wire it
//! travels as two bytes, either in 12-bit coded form (six bits per byte, each
//! taken from a fixed code table) or in 14-bit binary form. The mode is a
//! property of the screen geometry and applies to a whole stream.

use std::fmt;

use crate::error::{AddressDecodeError, ConfigError, ConfigResult};

/// Graphic codes for each 6-bit value in 12-bit addressing
pub const ADDRESS_CODE_TABLE: [u8; 64] = [
    0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7,
    0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F,
    0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7,
    0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
    0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7,
    0xE8, 0xE9, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F,
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7,
    0xF8, 0xF9, 0x7A, 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
];

/// Largest buffer reachable with 12-bit addresses
pub const MAX_12BIT_BUFFER: usize = 1 << 12;

/// Largest buffer reachable with 14-bit addresses
pub const MAX_14BIT_BUFFER: usize = 1 << 14;

/// Buffer address encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    TwelveBit,
    FourteenBit,
}

impl AddressingMode {
    /// Number of buffer positions the mode can address
    pub fn capacity(self) -> usize {
        match self {
            Self::TwelveBit => MAX_12BIT_BUFFER,
            Self::FourteenBit => MAX_14BIT_BUFFER,
        }
    }

    /// Narrowest mode that reaches every position of a buffer
    pub fn for_buffer_size(size: usize) -> Self {
        if size <= MAX_12BIT_BUFFER {
            Self::TwelveBit
        } else {
            Self::FourteenBit
        }
    }
}

/// Standard 3270 screen models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSize {
    /// Model 2: 24 rows x 80 columns
    Model2,
    /// Model 3: 32 rows x 80 columns
    Model3,
    /// Model 4: 43 rows x 80 columns
    Model4,
    /// Model 5: 27 rows x 132 columns
    Model5,
}

impl ScreenSize {
    pub fn rows(self) -> u16 {
        match self {
            Self::Model2 => 24,
            Self::Model3 => 32,
            Self::Model4 => 43,
            Self::Model5 => 27,
        }
    }

    pub fn cols(self) -> u16 {
        match self {
            Self::Model2 | Self::Model3 | Self::Model4 => 80,
            Self::Model5 => 132,
        }
    }
}

/// Rows, columns and addressing mode of a terminal buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    rows: u16,
    cols: u16,
    mode: AddressingMode,
}

impl ScreenGeometry {
    /// Validate and build a geometry
    pub fn new(rows: u16, cols: u16, mode: AddressingMode) -> ConfigResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "terminal.geometry".to_string(),
                value: format!("{}x{}", rows, cols),
                reason: "rows and columns must be non-zero".to_string(),
            });
        }
        let size = rows as usize * cols as usize;
        if size > mode.capacity() {
            return Err(ConfigError::InvalidParameter {
                parameter: "terminal.geometry".to_string(),
                value: format!("{}x{}", rows, cols),
                reason: format!("{} cells exceed the {} cells {:?} addressing reaches", size, mode.capacity(), mode),
            });
        }
        Ok(Self { rows, cols, mode })
    }

    /// Geometry with the narrowest addressing mode that fits
    pub fn with_auto_mode(rows: u16, cols: u16) -> ConfigResult<Self> {
        let mode = AddressingMode::for_buffer_size(rows as usize * cols as usize);
        Self::new(rows, cols, mode)
    }

    /// Geometry of a standard model in 12-bit addressing
    pub fn model(size: ScreenSize) -> Self {
        Self {
            rows: size.rows(),
            cols: size.cols(),
            mode: AddressingMode::TwelveBit,
        }
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn mode(&self) -> AddressingMode {
        self.mode
    }

    /// Total number of buffer positions
    pub fn buffer_size(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::model(ScreenSize::Model2)
    }
}

/// Linear position in the screen buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BufferAddress(u16);

impl BufferAddress {
    pub const ZERO: BufferAddress = BufferAddress(0);

    pub const fn new(position: u16) -> Self {
        Self(position)
    }

    /// Address of a row/column pair, wrapped into the buffer
    pub fn from_row_col(row: u16, col: u16, geometry: &ScreenGeometry) -> Self {
        let linear = row as usize * geometry.cols() as usize + col as usize;
        Self((linear % geometry.buffer_size()) as u16)
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn row(self, geometry: &ScreenGeometry) -> u16 {
        self.0 / geometry.cols()
    }

    pub fn col(self, geometry: &ScreenGeometry) -> u16 {
        self.0 % geometry.cols()
    }

    /// Position `count` cells further on, wrapping at the end of the buffer
    pub fn advance(self, count: usize, geometry: &ScreenGeometry) -> Self {
        Self(((self.index() + count) % geometry.buffer_size()) as u16)
    }

    /// Next position, wrapping at the end of the buffer
    pub fn next(self, geometry: &ScreenGeometry) -> Self {
        self.advance(1, geometry)
    }

    /// Wrap an arbitrary position into the buffer
    pub fn wrapped(self, geometry: &ScreenGeometry) -> Self {
        Self((self.index() % geometry.buffer_size()) as u16)
    }

    /// Two-byte wire form in the given mode
    pub fn encode(self, mode: AddressingMode) -> [u8; 2] {
        encode(self, mode)
    }
}

impl From<u16> for BufferAddress {
    fn from(position: u16) -> Self {
        Self(position)
    }
}

impl fmt::Display for BufferAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode an address into its two-byte wire form
///
/// Bits above the mode's width are discarded; callers hold addresses that
/// were validated against the geometry.
pub fn encode(address: BufferAddress, mode: AddressingMode) -> [u8; 2] {
    let value = address.value();
    match mode {
        AddressingMode::TwelveBit => [
            ADDRESS_CODE_TABLE[((value >> 6) & 0x3F) as usize],
            ADDRESS_CODE_TABLE[(value & 0x3F) as usize],
        ],
        AddressingMode::FourteenBit => [((value >> 8) & 0x3F) as u8, (value & 0xFF) as u8],
    }
}

/// Decode a two-byte wire address against a geometry
pub fn decode(bytes: [u8; 2], geometry: &ScreenGeometry) -> Result<BufferAddress, AddressDecodeError> {
    let value = match geometry.mode() {
        AddressingMode::TwelveBit => {
            let high = decode_code(bytes[0])?;
            let low = decode_code(bytes[1])?;
            (high << 6) | low
        }
        AddressingMode::FourteenBit => {
            if bytes[0] & 0xC0 != 0 {
                return Err(AddressDecodeError::HighBitsSet { byte: bytes[0] });
            }
            ((bytes[0] as u16) << 8) | bytes[1] as u16
        }
    };

    if value as usize >= geometry.buffer_size() {
        return Err(AddressDecodeError::OutOfRange {
            address: value as usize,
            buffer_size: geometry.buffer_size(),
        });
    }
    Ok(BufferAddress(value))
}

fn decode_code(byte: u8) -> Result<u16, AddressDecodeError> {
    let six_bits = byte & 0x3F;
    if ADDRESS_CODE_TABLE[six_bits as usize] == byte {
        Ok(six_bits as u16)
    } else {
        Err(AddressDecodeError::InvalidCode { byte })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry_14bit() -> ScreenGeometry {
        ScreenGeometry::new(62, 160, AddressingMode::FourteenBit).unwrap()
    }

    #[test]
    fn test_12bit_known_addresses() {
        let geometry = ScreenGeometry::default();
        assert_eq!(encode(BufferAddress::new(0), AddressingMode::TwelveBit), [0x40, 0x40]);
        assert_eq!(encode(BufferAddress::new(1), AddressingMode::TwelveBit), [0x40, 0xC1]);
        // row 1, column 0 on a 24x80 screen
        assert_eq!(encode(BufferAddress::new(80), AddressingMode::TwelveBit), [0xC1, 0x50]);
        assert_eq!(decode([0xC1, 0x50], &geometry), Ok(BufferAddress::new(80)));
        assert_eq!(decode([0x5D, 0x7F], &geometry), Ok(BufferAddress::new(1919)));
    }

    #[test]
    fn test_12bit_round_trip_every_position() {
        let geometry = ScreenGeometry::model(ScreenSize::Model5);
        for position in 0..geometry.buffer_size() as u16 {
            let address = BufferAddress::new(position);
            let bytes = encode(address, geometry.mode());
            assert_eq!(decode(bytes, &geometry), Ok(address));
        }
    }

    #[test]
    fn test_12bit_rejects_non_table_byte() {
        let geometry = ScreenGeometry::default();
        // 0x01 has low bits 1, whose code is 0xC1
        assert_eq!(
            decode([0x40, 0x01], &geometry),
            Err(AddressDecodeError::InvalidCode { byte: 0x01 })
        );
        assert_eq!(
            decode([0x81, 0x40], &geometry),
            Err(AddressDecodeError::InvalidCode { byte: 0x81 })
        );
    }

    #[test]
    fn test_14bit_round_trip_and_high_bits() {
        let geometry = geometry_14bit();
        let address = BufferAddress::new(9000);
        let bytes = encode(address, AddressingMode::FourteenBit);
        assert_eq!(bytes, [0x23, 0x28]);
        assert_eq!(decode(bytes, &geometry), Ok(address));
        assert_eq!(
            decode([0x40, 0x00], &geometry),
            Err(AddressDecodeError::HighBitsSet { byte: 0x40 })
        );
    }

    #[test]
    fn test_out_of_range_rejected_in_both_modes() {
        let geometry = ScreenGeometry::default();
        let bytes = encode(BufferAddress::new(1920), AddressingMode::TwelveBit);
        assert_eq!(
            decode(bytes, &geometry),
            Err(AddressDecodeError::OutOfRange { address: 1920, buffer_size: 1920 })
        );

        let geometry = geometry_14bit();
        assert_eq!(
            decode([0x3F, 0xFF], &geometry),
            Err(AddressDecodeError::OutOfRange { address: 16383, buffer_size: 9920 })
        );
    }

    #[test]
    fn test_geometry_validation() {
        assert!(ScreenGeometry::new(24, 80, AddressingMode::TwelveBit).is_ok());
        assert!(ScreenGeometry::new(64, 80, AddressingMode::TwelveBit).is_err());
        assert!(ScreenGeometry::new(64, 80, AddressingMode::FourteenBit).is_ok());
        assert!(ScreenGeometry::new(200, 100, AddressingMode::FourteenBit).is_err());
        assert!(ScreenGeometry::new(0, 80, AddressingMode::TwelveBit).is_err());

        let auto = ScreenGeometry::with_auto_mode(64, 80).unwrap();
        assert_eq!(auto.mode(), AddressingMode::FourteenBit);
        let auto = ScreenGeometry::with_auto_mode(24, 80).unwrap();
        assert_eq!(auto.mode(), AddressingMode::TwelveBit);
    }

    #[test]
    fn test_row_col_and_wrapping() {
        let geometry = ScreenGeometry::default();
        let address = BufferAddress::from_row_col(2, 5, &geometry);
        assert_eq!(address.value(), 165);
        assert_eq!(address.row(&geometry), 2);
        assert_eq!(address.col(&geometry), 5);
        assert_eq!(BufferAddress::new(1919).next(&geometry), BufferAddress::ZERO);
        assert_eq!(BufferAddress::new(1918).advance(5, &geometry).value(), 3);
    }

    #[test]
    fn test_standard_models() {
        assert_eq!(ScreenGeometry::model(ScreenSize::Model2).buffer_size(), 1920);
        assert_eq!(ScreenGeometry::model(ScreenSize::Model3).buffer_size(), 2560);
        assert_eq!(ScreenGeometry::model(ScreenSize::Model4).buffer_size(), 3440);
        assert_eq!(ScreenGeometry::model(ScreenSize::Model5).buffer_size(), 3564);
    }
}
