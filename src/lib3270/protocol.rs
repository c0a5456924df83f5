//! 3270 Stream Assembler and Parser
//!
//! `assemble` turns a `Command` into outbound bytes and `parse` turns
//! outbound bytes back into a `Command`. Neither touches terminal state:
//! applying a parsed command is `TerminalState::apply_command`.
//! `parse_inbound` decodes the host-bound records the terminal produces.

use log::debug;

use super::addressing::{self, BufferAddress, ScreenGeometry};
use super::codes::*;
use super::command::{Command, StructuredField, Wcc, WriteItem};
use super::order::Order;
use crate::error::{DataStreamError, StreamResult};

/// Serialize a command into its outbound byte form
///
/// Items are emitted in caller order with no reordering or merging. Fails
/// only when an operand list or payload is too long for its length field.
pub fn assemble(command: &Command, geometry: &ScreenGeometry) -> StreamResult<Vec<u8>> {
    let mut out = vec![command.code().to_u8()];
    match command {
        Command::Write { wcc, items }
        | Command::EraseWrite { wcc, items }
        | Command::EraseWriteAlternate { wcc, items } => {
            out.push(wcc.byte());
            for item in items {
                match item {
                    WriteItem::Order(order) => order.encode_into(&mut out, geometry)?,
                    WriteItem::Data(bytes) => out.extend_from_slice(bytes),
                }
            }
        }
        Command::WriteStructuredField(fields) => {
            for field in fields {
                field.encode_into(&mut out)?;
            }
        }
        Command::EraseAllUnprotected
        | Command::ReadBuffer(_)
        | Command::ReadModified(_)
        | Command::ReadModifiedAll(_) => {}
    }
    Ok(out)
}

/// Parse an outbound record into a command
pub fn parse(data: &[u8], geometry: &ScreenGeometry) -> StreamResult<Command> {
    let command = DataStreamParser::new(data, geometry).parse_command()?;
    debug!("parsed {:?} command from {} bytes", command.code(), data.len());
    Ok(command)
}

/// Data stream parser for outbound records
struct DataStreamParser<'a> {
    data: &'a [u8],
    pos: usize,
    geometry: &'a ScreenGeometry,
}

impl<'a> DataStreamParser<'a> {
    fn new(data: &'a [u8], geometry: &'a ScreenGeometry) -> Self {
        Self { data, pos: 0, geometry }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn next_byte(&mut self) -> StreamResult<u8> {
        let byte = self.data.get(self.pos).copied().ok_or(DataStreamError::TruncatedStream {
            offset: self.pos,
            needed: 1,
            available: 0,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    fn parse_command(&mut self) -> StreamResult<Command> {
        let cmd_byte = self.next_byte()?;
        let code = CommandCode::from_u8(cmd_byte).ok_or(DataStreamError::UnknownCommand {
            byte: cmd_byte,
            offset: 0,
        })?;

        let command = match code {
            CommandCode::Write | CommandCode::EraseWrite | CommandCode::EraseWriteAlternate => {
                let wcc = Wcc::new(self.next_byte()?);
                let items = self.parse_write_body()?;
                Command::write(code, wcc, items).ok_or(DataStreamError::UnknownCommand {
                    byte: cmd_byte,
                    offset: 0,
                })?
            }
            CommandCode::WriteStructuredField => Command::WriteStructuredField(self.parse_structured_fields()?),
            CommandCode::ReadBuffer => Command::ReadBuffer(AidKey::NoAid),
            CommandCode::ReadModified => Command::ReadModified(AidKey::NoAid),
            CommandCode::ReadModifiedAll => Command::ReadModifiedAll(AidKey::NoAid),
            CommandCode::EraseAllUnprotected => Command::EraseAllUnprotected,
        };

        if code.is_bodyless() && self.remaining() > 0 {
            return Err(DataStreamError::TrailingData { offset: self.pos });
        }
        Ok(command)
    }

    /// Orders and data runs up to the end of the record
    fn parse_write_body(&mut self) -> StreamResult<Vec<WriteItem>> {
        let mut items = Vec::new();
        while self.pos < self.data.len() {
            let run_start = self.pos;
            while self.pos < self.data.len() && is_data_byte(self.data[self.pos]) {
                self.pos += 1;
            }
            if self.pos > run_start {
                items.push(WriteItem::Data(self.data[run_start..self.pos].to_vec()));
                continue;
            }

            let (order, consumed) = Order::decode(self.data, self.pos, self.geometry)?;
            self.pos += consumed;
            items.push(WriteItem::Order(order));
        }
        Ok(items)
    }

    /// Length-prefixed structured fields up to the end of the record
    ///
    /// A length of zero means the field runs to the end of the record.
    fn parse_structured_fields(&mut self) -> StreamResult<Vec<StructuredField>> {
        let mut fields = Vec::new();
        while self.pos < self.data.len() {
            let offset = self.pos;
            if self.remaining() < 3 {
                return Err(DataStreamError::TruncatedStream {
                    offset,
                    needed: 3,
                    available: self.remaining(),
                });
            }
            let declared = u16::from_be_bytes([self.data[offset], self.data[offset + 1]]) as usize;
            let length = if declared == 0 { self.remaining() } else { declared };
            if length < 3 {
                return Err(DataStreamError::MalformedStructuredField { offset, length });
            }
            if length > self.remaining() {
                return Err(DataStreamError::TruncatedStream {
                    offset,
                    needed: length,
                    available: self.remaining(),
                });
            }

            let id = self.data[offset + 2];
            fields.push(StructuredField::new(id, self.data[offset + 3..offset + length].to_vec()));
            self.pos += length;
        }
        Ok(fields)
    }
}

/// A decoded host-bound record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub aid: AidKey,
    pub cursor: Option<BufferAddress>,
    /// `(address, bytes)` per SBA-introduced entry; bytes before any SBA
    /// (an unformatted screen) are reported at address 0
    pub fields: Vec<(BufferAddress, Vec<u8>)>,
}

impl InboundRecord {
    /// Bytes sent for the entry at `address`
    pub fn field_data(&self, address: BufferAddress) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(at, _)| *at == address)
            .map(|(_, data)| data.as_slice())
    }
}

/// Parse a host-bound record
///
/// `with_cursor` selects whether a two-byte cursor address follows the AID.
/// A record consisting of the AID alone (a short read) is accepted in
/// either form.
pub fn parse_inbound(data: &[u8], geometry: &ScreenGeometry, with_cursor: bool) -> StreamResult<InboundRecord> {
    let aid_byte = *data.first().ok_or(DataStreamError::TruncatedStream {
        offset: 0,
        needed: 1,
        available: 0,
    })?;
    let aid = AidKey::try_from(aid_byte)?;

    let mut pos = 1;
    let mut cursor = None;
    if with_cursor && data.len() > 1 {
        if data.len() < 3 {
            return Err(DataStreamError::TruncatedStream {
                offset: 1,
                needed: 2,
                available: data.len() - 1,
            });
        }
        let address = addressing::decode([data[1], data[2]], geometry)
            .map_err(|source| DataStreamError::AddressDecode { offset: 1, source })?;
        cursor = Some(address);
        pos = 3;
    }

    let mut fields: Vec<(BufferAddress, Vec<u8>)> = Vec::new();
    while pos < data.len() {
        if data[pos] == ORDER_SBA {
            let (order, consumed) = Order::decode(data, pos, geometry)?;
            if let Order::SetBufferAddress(address) = order {
                fields.push((address, Vec::new()));
            }
            pos += consumed;
            continue;
        }
        match fields.last_mut() {
            Some((_, bytes)) => bytes.push(data[pos]),
            None => fields.push((BufferAddress::ZERO, vec![data[pos]])),
        }
        pos += 1;
    }

    Ok(InboundRecord { aid, cursor, fields })
}
