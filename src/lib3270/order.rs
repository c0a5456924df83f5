//! Order codec
//!
//! Orders are the formatting instructions embedded in a write command body.
//! Each one is an identifier byte followed by a fixed or counted set of
//! operands. Encoding and decoding are pure: nothing here touches the screen.

use log::trace;

use super::addressing::{self, BufferAddress, ScreenGeometry};
use super::codes::*;
use super::field::{ExtendedAttribute, FieldAttribute};
use crate::error::{DataStreamError, StreamResult};

/// Most type/value pairs an SFE or MF count byte can announce
pub const MAX_ATTRIBUTE_PAIRS: usize = 255;

/// A 3270 order with its operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    /// SBA: move the write cursor
    SetBufferAddress(BufferAddress),
    /// SF: field attribute at the cursor
    StartField(FieldAttribute),
    /// SFE: field with extended attribute pairs
    StartFieldExtended(Vec<ExtendedAttribute>),
    /// SA: character attribute for subsequent data
    SetAttribute(ExtendedAttribute),
    /// MF: update the attributes of the field at the cursor
    ModifyField(Vec<ExtendedAttribute>),
    /// IC: place the hardware cursor at the write cursor
    InsertCursor,
    /// PT: advance to the next unprotected field
    ProgramTab,
    /// RA: repeat a character up to an address
    RepeatToAddress(BufferAddress, u8),
    /// EUA: null unprotected positions up to an address
    EraseUnprotectedToAddress(BufferAddress),
    /// GE: one character from the alternate character set
    GraphicEscape(u8),
    /// NL: move to the start of the next row
    NewLine,
}

impl Order {
    /// Identifier byte for this order
    pub fn id(&self) -> u8 {
        match self {
            Order::SetBufferAddress(_) => ORDER_SBA,
            Order::StartField(_) => ORDER_SF,
            Order::StartFieldExtended(_) => ORDER_SFE,
            Order::SetAttribute(_) => ORDER_SA,
            Order::ModifyField(_) => ORDER_MF,
            Order::InsertCursor => ORDER_IC,
            Order::ProgramTab => ORDER_PT,
            Order::RepeatToAddress(..) => ORDER_RA,
            Order::EraseUnprotectedToAddress(_) => ORDER_EUA,
            Order::GraphicEscape(_) => ORDER_GE,
            Order::NewLine => ORDER_NL,
        }
    }

    /// Short mnemonic, as used in traces and the CLI
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Order::SetBufferAddress(_) => "SBA",
            Order::StartField(_) => "SF",
            Order::StartFieldExtended(_) => "SFE",
            Order::SetAttribute(_) => "SA",
            Order::ModifyField(_) => "MF",
            Order::InsertCursor => "IC",
            Order::ProgramTab => "PT",
            Order::RepeatToAddress(..) => "RA",
            Order::EraseUnprotectedToAddress(_) => "EUA",
            Order::GraphicEscape(_) => "GE",
            Order::NewLine => "NL",
        }
    }

    /// Serialize the order
    pub fn encode(&self, geometry: &ScreenGeometry) -> StreamResult<Vec<u8>> {
        let mut out = Vec::with_capacity(4);
        self.encode_into(&mut out, geometry)?;
        Ok(out)
    }

    /// Append the serialized order to `out`
    ///
    /// Addresses are wrapped into the buffer the same way `apply_order`
    /// wraps them. SFE and MF fail with `OperandOverflow` beyond 255 pairs,
    /// leaving `out` untouched.
    pub fn encode_into(&self, out: &mut Vec<u8>, geometry: &ScreenGeometry) -> StreamResult<()> {
        let address_bytes = |address: &BufferAddress| address.wrapped(geometry).encode(geometry.mode());
        if let Order::StartFieldExtended(pairs) | Order::ModifyField(pairs) = self {
            if pairs.len() > MAX_ATTRIBUTE_PAIRS {
                return Err(DataStreamError::OperandOverflow {
                    what: "attribute pair count",
                    length: pairs.len(),
                    max: MAX_ATTRIBUTE_PAIRS,
                });
            }
        }

        out.push(self.id());
        match self {
            Order::SetBufferAddress(address) | Order::EraseUnprotectedToAddress(address) => {
                out.extend_from_slice(&address_bytes(address));
            }
            Order::StartField(attribute) => out.push(attribute.byte()),
            Order::StartFieldExtended(pairs) | Order::ModifyField(pairs) => {
                out.push(pairs.len() as u8);
                for pair in pairs {
                    out.push(pair.attr_type);
                    out.push(pair.value);
                }
            }
            Order::SetAttribute(pair) => {
                out.push(pair.attr_type);
                out.push(pair.value);
            }
            Order::RepeatToAddress(address, ch) => {
                out.extend_from_slice(&address_bytes(address));
                out.push(*ch);
            }
            Order::GraphicEscape(ch) => out.push(*ch),
            Order::InsertCursor | Order::ProgramTab | Order::NewLine => {}
        }
        Ok(())
    }

    /// Decode the order whose identifier is at `bytes[offset]`
    ///
    /// Returns the order and the number of bytes it occupies, identifier
    /// included. Error offsets are positions in `bytes`.
    pub fn decode(bytes: &[u8], offset: usize, geometry: &ScreenGeometry) -> StreamResult<(Order, usize)> {
        let reader = OperandReader { bytes, offset };
        let id = reader.byte(0, 1)?;

        let decoded = match id {
            ORDER_SBA => (Order::SetBufferAddress(reader.address(1, 3, geometry)?), 3),
            ORDER_EUA => (Order::EraseUnprotectedToAddress(reader.address(1, 3, geometry)?), 3),
            ORDER_SF => (Order::StartField(FieldAttribute::new(reader.byte(1, 2)?)), 2),
            ORDER_SFE => {
                let (pairs, consumed) = reader.pairs()?;
                (Order::StartFieldExtended(pairs), consumed)
            }
            ORDER_MF => {
                let (pairs, consumed) = reader.pairs()?;
                (Order::ModifyField(pairs), consumed)
            }
            ORDER_SA => {
                let attr_type = reader.byte(1, 3)?;
                let value = reader.byte(2, 3)?;
                (Order::SetAttribute(ExtendedAttribute::new(attr_type, value)), 3)
            }
            ORDER_IC => (Order::InsertCursor, 1),
            ORDER_PT => (Order::ProgramTab, 1),
            ORDER_NL => (Order::NewLine, 1),
            ORDER_RA => {
                let address = reader.address(1, 4, geometry)?;
                (Order::RepeatToAddress(address, reader.byte(3, 4)?), 4)
            }
            ORDER_GE => (Order::GraphicEscape(reader.byte(1, 2)?), 2),
            byte => return Err(DataStreamError::UnknownOrder { byte, offset }),
        };

        trace!("decoded {} at offset {}", decoded.0.mnemonic(), offset);
        Ok(decoded)
    }
}

/// Bounds-checked operand access relative to an order identifier
struct OperandReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl OperandReader<'_> {
    fn available(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    fn truncated(&self, needed: usize) -> DataStreamError {
        DataStreamError::TruncatedStream {
            offset: self.offset,
            needed,
            available: self.available(),
        }
    }

    /// Byte at `index`, for an order of `needed` total bytes
    fn byte(&self, index: usize, needed: usize) -> StreamResult<u8> {
        self.bytes
            .get(self.offset + index)
            .copied()
            .ok_or_else(|| self.truncated(needed))
    }

    fn address(&self, index: usize, needed: usize, geometry: &ScreenGeometry) -> StreamResult<BufferAddress> {
        if self.available() < needed {
            return Err(self.truncated(needed));
        }
        let at = self.offset + index;
        addressing::decode([self.bytes[at], self.bytes[at + 1]], geometry)
            .map_err(|source| DataStreamError::AddressDecode { offset: at, source })
    }

    /// Count byte followed by that many type/value pairs
    fn pairs(&self) -> StreamResult<(Vec<ExtendedAttribute>, usize)> {
        let count = self.byte(1, 2)? as usize;
        let needed = 2 + count * 2;
        if self.available() < needed {
            return Err(self.truncated(needed));
        }
        let start = self.offset + 2;
        let pairs = self.bytes[start..start + count * 2]
            .chunks_exact(2)
            .map(|pair| ExtendedAttribute::new(pair[0], pair[1]))
            .collect();
        Ok((pairs, needed))
    }
}
