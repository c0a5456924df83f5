//! 3270 Data Stream Constants and Codes
//!
//! Command bytes, order identifiers, AID values, WCC bits, field attribute
//! bits and structured field identifiers as defined in the IBM 3270 Data
//! Stream Programmer's Reference (GA23-0059).

use crate::error::DataStreamError;

/// 3270 Command Codes (SNA form)
///
/// These are the bytes emitted when a command is assembled
pub const CMD_WRITE: u8 = 0xF1;                  // Write
pub const CMD_ERASE_WRITE: u8 = 0xF5;            // Erase/Write
pub const CMD_ERASE_WRITE_ALTERNATE: u8 = 0x7E;  // Erase/Write Alternate
pub const CMD_READ_BUFFER: u8 = 0xF2;            // Read Buffer
pub const CMD_READ_MODIFIED: u8 = 0xF6;          // Read Modified
pub const CMD_READ_MODIFIED_ALL: u8 = 0x6E;      // Read Modified All
pub const CMD_ERASE_ALL_UNPROTECTED: u8 = 0x6F;  // Erase All Unprotected
pub const CMD_WRITE_STRUCTURED_FIELD: u8 = 0xF3; // Write Structured Field

/// Channel command (local attachment) aliases, accepted on parse only
pub const CCW_WRITE: u8 = 0x01;
pub const CCW_ERASE_WRITE: u8 = 0x05;
pub const CCW_ERASE_WRITE_ALTERNATE: u8 = 0x0D;
pub const CCW_READ_BUFFER: u8 = 0x02;
pub const CCW_READ_MODIFIED: u8 = 0x06;
pub const CCW_READ_MODIFIED_ALL: u8 = 0x0E;
pub const CCW_ERASE_ALL_UNPROTECTED: u8 = 0x0F;
pub const CCW_WRITE_STRUCTURED_FIELD: u8 = 0x11;

/// 3270 Order Codes
pub const ORDER_SF: u8 = 0x1D;    // Start Field
pub const ORDER_SFE: u8 = 0x29;   // Start Field Extended
pub const ORDER_SBA: u8 = 0x11;   // Set Buffer Address
pub const ORDER_SA: u8 = 0x28;    // Set Attribute
pub const ORDER_MF: u8 = 0x2C;    // Modify Field
pub const ORDER_IC: u8 = 0x13;    // Insert Cursor
pub const ORDER_PT: u8 = 0x05;    // Program Tab
pub const ORDER_RA: u8 = 0x3C;    // Repeat to Address
pub const ORDER_EUA: u8 = 0x12;   // Erase Unprotected to Address
pub const ORDER_GE: u8 = 0x08;    // Graphic Escape
pub const ORDER_NL: u8 = 0x15;    // New Line

/// Format control characters that travel as ordinary data
pub const FCC_NULL: u8 = 0x00;
pub const FCC_DUP: u8 = 0x1C;
pub const FCC_FM: u8 = 0x1E;
pub const FCC_SUB: u8 = 0x3F;

/// Write Control Character (WCC) Bits
pub const WCC_RESET: u8 = 0x40;           // Reset partition characteristics
pub const WCC_START_PRINTER: u8 = 0x08;   // Start printer
pub const WCC_ALARM: u8 = 0x04;           // Sound alarm
pub const WCC_RESTORE: u8 = 0x02;         // Restore keyboard
pub const WCC_RESET_MDT: u8 = 0x01;       // Reset MDT bits

/// AID (Attention Identifier) values
pub const AID_NO_AID: u8 = 0x60;
pub const AID_STRUCTURED_FIELD: u8 = 0x88;
pub const AID_READ_PARTITION: u8 = 0x61;
pub const AID_SYSREQ: u8 = 0xF0;
pub const AID_ENTER: u8 = 0x7D;
pub const AID_CLEAR: u8 = 0x6D;
pub const AID_PA1: u8 = 0x6C;
pub const AID_PA2: u8 = 0x6E;
pub const AID_PA3: u8 = 0x6B;

/// PF1 through PF24, in key order
pub const AID_PF_KEYS: [u8; 24] = [
    0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C,
    0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C,
];

/// Field Attribute Byte Bits
pub const ATTR_PROTECTED: u8 = 0x20;      // Protected field
pub const ATTR_NUMERIC: u8 = 0x10;        // Numeric-only field
pub const ATTR_DISPLAY: u8 = 0x0C;        // Display class mask
pub const ATTR_MDT: u8 = 0x01;            // Modified Data Tag

/// Display class values (masked by ATTR_DISPLAY)
pub const DISPLAY_NORMAL: u8 = 0x00;
pub const DISPLAY_INTENSIFIED: u8 = 0x08;
pub const DISPLAY_HIDDEN: u8 = 0x0C;

/// Extended Attribute Types (SFE, SA and MF)
pub const XA_ALL: u8 = 0x00;              // Reset all character attributes
pub const XA_3270: u8 = 0xC0;             // 3270 field attribute
pub const XA_VALIDATION: u8 = 0xC1;       // Field validation
pub const XA_OUTLINING: u8 = 0xC2;        // Field outlining
pub const XA_HIGHLIGHTING: u8 = 0x41;     // Highlighting
pub const XA_FOREGROUND: u8 = 0x42;       // Foreground color
pub const XA_CHARSET: u8 = 0x43;          // Character set
pub const XA_BACKGROUND: u8 = 0x45;       // Background color
pub const XA_TRANSPARENCY: u8 = 0x46;     // Transparency

/// Highlighting values
pub const HIGHLIGHT_DEFAULT: u8 = 0x00;
pub const HIGHLIGHT_NORMAL: u8 = 0xF0;
pub const HIGHLIGHT_BLINK: u8 = 0xF1;
pub const HIGHLIGHT_REVERSE: u8 = 0xF2;
pub const HIGHLIGHT_UNDERSCORE: u8 = 0xF4;

/// Color values
pub const COLOR_DEFAULT: u8 = 0x00;
pub const COLOR_BLUE: u8 = 0xF1;
pub const COLOR_RED: u8 = 0xF2;
pub const COLOR_PINK: u8 = 0xF3;
pub const COLOR_GREEN: u8 = 0xF4;
pub const COLOR_TURQUOISE: u8 = 0xF5;
pub const COLOR_YELLOW: u8 = 0xF6;
pub const COLOR_WHITE: u8 = 0xF7;

/// Structured field identifiers (outbound)
pub const SF_READ_PARTITION: u8 = 0x01;
pub const SF_ERASE_RESET: u8 = 0x03;
pub const SF_OUTBOUND_3270DS: u8 = 0x40;

/// Read Partition operation types
pub const RP_QUERY: u8 = 0x02;
pub const RP_QUERY_LIST: u8 = 0x03;

/// Query reply identifiers (inbound)
pub const SF_QUERY_REPLY: u8 = 0x81;
pub const QR_SUMMARY: u8 = 0x80;
pub const QR_USABLE_AREA: u8 = 0x81;

/// Enum representation of 3270 command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Write,
    EraseWrite,
    EraseWriteAlternate,
    ReadBuffer,
    ReadModified,
    ReadModifiedAll,
    EraseAllUnprotected,
    WriteStructuredField,
}

impl CommandCode {
    /// Convert a command byte, in either SNA or channel form
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            CMD_WRITE | CCW_WRITE => Some(Self::Write),
            CMD_ERASE_WRITE | CCW_ERASE_WRITE => Some(Self::EraseWrite),
            CMD_ERASE_WRITE_ALTERNATE | CCW_ERASE_WRITE_ALTERNATE => Some(Self::EraseWriteAlternate),
            CMD_READ_BUFFER | CCW_READ_BUFFER => Some(Self::ReadBuffer),
            CMD_READ_MODIFIED | CCW_READ_MODIFIED => Some(Self::ReadModified),
            CMD_READ_MODIFIED_ALL | CCW_READ_MODIFIED_ALL => Some(Self::ReadModifiedAll),
            CMD_ERASE_ALL_UNPROTECTED | CCW_ERASE_ALL_UNPROTECTED => Some(Self::EraseAllUnprotected),
            CMD_WRITE_STRUCTURED_FIELD | CCW_WRITE_STRUCTURED_FIELD => Some(Self::WriteStructuredField),
            _ => None,
        }
    }

    /// SNA command byte
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Write => CMD_WRITE,
            Self::EraseWrite => CMD_ERASE_WRITE,
            Self::EraseWriteAlternate => CMD_ERASE_WRITE_ALTERNATE,
            Self::ReadBuffer => CMD_READ_BUFFER,
            Self::ReadModified => CMD_READ_MODIFIED,
            Self::ReadModifiedAll => CMD_READ_MODIFIED_ALL,
            Self::EraseAllUnprotected => CMD_ERASE_ALL_UNPROTECTED,
            Self::WriteStructuredField => CMD_WRITE_STRUCTURED_FIELD,
        }
    }

    /// Commands followed by a WCC and an order body
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::EraseWrite | Self::EraseWriteAlternate)
    }

    /// Commands that consist of the command byte alone
    pub fn is_bodyless(self) -> bool {
        matches!(
            self,
            Self::ReadBuffer | Self::ReadModified | Self::ReadModifiedAll | Self::EraseAllUnprotected
        )
    }
}

/// True when a byte inside a write body is character data rather than an
/// order identifier
#[inline]
pub fn is_data_byte(byte: u8) -> bool {
    byte >= 0x40 || matches!(byte, FCC_NULL | FCC_DUP | FCC_FM | FCC_SUB)
}

/// Enum representation of AID keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AidKey {
    NoAid,
    Enter,
    Clear,
    PA1,
    PA2,
    PA3,
    PF1, PF2, PF3, PF4, PF5, PF6,
    PF7, PF8, PF9, PF10, PF11, PF12,
    PF13, PF14, PF15, PF16, PF17, PF18,
    PF19, PF20, PF21, PF22, PF23, PF24,
    StructuredField,
    ReadPartition,
    SysReq,
}

const PF_ORDER: [AidKey; 24] = [
    AidKey::PF1, AidKey::PF2, AidKey::PF3, AidKey::PF4, AidKey::PF5, AidKey::PF6,
    AidKey::PF7, AidKey::PF8, AidKey::PF9, AidKey::PF10, AidKey::PF11, AidKey::PF12,
    AidKey::PF13, AidKey::PF14, AidKey::PF15, AidKey::PF16, AidKey::PF17, AidKey::PF18,
    AidKey::PF19, AidKey::PF20, AidKey::PF21, AidKey::PF22, AidKey::PF23, AidKey::PF24,
];

impl AidKey {
    /// PF key by number (1-24)
    pub fn pf(number: u8) -> Option<Self> {
        match number {
            1..=24 => Some(PF_ORDER[number as usize - 1]),
            _ => None,
        }
    }

    /// Convert a byte value to an AidKey
    pub fn from_u8(value: u8) -> Option<Self> {
        if let Some(index) = AID_PF_KEYS.iter().position(|&b| b == value) {
            return Some(PF_ORDER[index]);
        }
        match value {
            AID_NO_AID => Some(Self::NoAid),
            AID_ENTER => Some(Self::Enter),
            AID_CLEAR => Some(Self::Clear),
            AID_PA1 => Some(Self::PA1),
            AID_PA2 => Some(Self::PA2),
            AID_PA3 => Some(Self::PA3),
            AID_STRUCTURED_FIELD => Some(Self::StructuredField),
            AID_READ_PARTITION => Some(Self::ReadPartition),
            AID_SYSREQ => Some(Self::SysReq),
            _ => None,
        }
    }

    /// Convert AidKey to its wire byte
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoAid => AID_NO_AID,
            Self::Enter => AID_ENTER,
            Self::Clear => AID_CLEAR,
            Self::PA1 => AID_PA1,
            Self::PA2 => AID_PA2,
            Self::PA3 => AID_PA3,
            Self::StructuredField => AID_STRUCTURED_FIELD,
            Self::ReadPartition => AID_READ_PARTITION,
            Self::SysReq => AID_SYSREQ,
            pf => {
                let index = PF_ORDER.iter().position(|&k| k == pf).unwrap_or(0);
                AID_PF_KEYS[index]
            }
        }
    }

    /// PA keys and Clear send the AID alone on a Read Modified
    pub fn is_short_read(self) -> bool {
        matches!(self, Self::PA1 | Self::PA2 | Self::PA3 | Self::Clear)
    }
}

impl TryFrom<u8> for AidKey {
    type Error = DataStreamError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_u8(byte).ok_or(DataStreamError::UnknownAid { byte })
    }
}

impl From<AidKey> for u8 {
    fn from(aid: AidKey) -> u8 {
        aid.to_u8()
    }
}
