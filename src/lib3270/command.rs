//! Commands, write control characters and structured fields

use super::codes::*;
use super::order::Order;
use crate::error::{DataStreamError, StreamResult};

/// Largest payload a structured field's two-byte length can cover
pub const MAX_STRUCTURED_FIELD_DATA: usize = u16::MAX as usize - 3;

/// Write Control Character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wcc(pub u8);

impl Wcc {
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn byte(self) -> u8 {
        self.0
    }

    pub fn reset(self) -> bool {
        self.0 & WCC_RESET != 0
    }

    pub fn start_printer(self) -> bool {
        self.0 & WCC_START_PRINTER != 0
    }

    pub fn sound_alarm(self) -> bool {
        self.0 & WCC_ALARM != 0
    }

    pub fn keyboard_restore(self) -> bool {
        self.0 & WCC_RESTORE != 0
    }

    pub fn reset_mdt(self) -> bool {
        self.0 & WCC_RESET_MDT != 0
    }
}

/// One element of a write command body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteItem {
    Order(Order),
    /// Run of ordinary characters between orders
    Data(Vec<u8>),
}

impl From<Order> for WriteItem {
    fn from(order: Order) -> Self {
        WriteItem::Order(order)
    }
}

/// A structured field: identifier and payload
///
/// On the wire it is preceded by a two-byte big-endian length that counts
/// the length bytes, the identifier and the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredField {
    pub id: u8,
    pub data: Vec<u8>,
}

impl StructuredField {
    pub fn new(id: u8, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// Read Partition Query addressed to partition 0xFF
    pub fn read_partition_query() -> Self {
        Self::new(SF_READ_PARTITION, vec![0xFF, RP_QUERY])
    }

    /// Length as carried in the length prefix
    pub fn wire_length(&self) -> usize {
        self.data.len() + 3
    }

    /// Append the length-prefixed field to `out`
    ///
    /// Payloads over `MAX_STRUCTURED_FIELD_DATA` fail with `OperandOverflow`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> StreamResult<()> {
        let length = u16::try_from(self.wire_length()).map_err(|_| DataStreamError::OperandOverflow {
            what: "structured field payload",
            length: self.data.len(),
            max: MAX_STRUCTURED_FIELD_DATA,
        })?;
        out.extend_from_slice(&length.to_be_bytes());
        out.push(self.id);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

/// A complete outbound command
///
/// Read commands carry the AID the terminal answers with; a parsed read
/// carries `AidKey::NoAid` and the session substitutes its pending AID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write { wcc: Wcc, items: Vec<WriteItem> },
    EraseWrite { wcc: Wcc, items: Vec<WriteItem> },
    EraseWriteAlternate { wcc: Wcc, items: Vec<WriteItem> },
    EraseAllUnprotected,
    ReadBuffer(AidKey),
    ReadModified(AidKey),
    ReadModifiedAll(AidKey),
    WriteStructuredField(Vec<StructuredField>),
}

impl Command {
    pub fn code(&self) -> CommandCode {
        match self {
            Command::Write { .. } => CommandCode::Write,
            Command::EraseWrite { .. } => CommandCode::EraseWrite,
            Command::EraseWriteAlternate { .. } => CommandCode::EraseWriteAlternate,
            Command::EraseAllUnprotected => CommandCode::EraseAllUnprotected,
            Command::ReadBuffer(_) => CommandCode::ReadBuffer,
            Command::ReadModified(_) => CommandCode::ReadModified,
            Command::ReadModifiedAll(_) => CommandCode::ReadModifiedAll,
            Command::WriteStructuredField(_) => CommandCode::WriteStructuredField,
        }
    }

    /// WCC and body of a write command
    pub fn write_body(&self) -> Option<(Wcc, &[WriteItem])> {
        match self {
            Command::Write { wcc, items }
            | Command::EraseWrite { wcc, items }
            | Command::EraseWriteAlternate { wcc, items } => Some((*wcc, items.as_slice())),
            _ => None,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Command::ReadBuffer(_) | Command::ReadModified(_) | Command::ReadModifiedAll(_)
        )
    }

    /// Build a write command of the given kind
    ///
    /// Returns `None` when `code` is not a write command.
    pub fn write(code: CommandCode, wcc: Wcc, items: Vec<WriteItem>) -> Option<Self> {
        match code {
            CommandCode::Write => Some(Command::Write { wcc, items }),
            CommandCode::EraseWrite => Some(Command::EraseWrite { wcc, items }),
            CommandCode::EraseWriteAlternate => Some(Command::EraseWriteAlternate { wcc, items }),
            _ => None,
        }
    }
}
