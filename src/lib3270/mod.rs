//! IBM 3270 data stream engine
//!
//! The host writes to a terminal with commands carrying orders and
//! character data; the terminal keeps a buffer of cells addressed by a
//! single position and answers reads with the fields the operator changed.
//!
//! - [`addressing`] - 12-bit and 14-bit buffer address codec, screen geometry
//! - [`codes`] - command, order, WCC, attribute and AID byte values
//! - [`order`] - order codec
//! - [`command`] - commands, WCC and structured fields
//! - [`protocol`] - stream assembler and parser
//! - [`field`] - field and extended attributes
//! - [`display`] - screen buffer, field model and operator input
//! - [`response`] - read responses and query replies
//! - [`session`] - a virtual terminal driven over channels
//!
//! ```rust,no_run
//! use ds3270::lib3270::{parse, ScreenGeometry, TerminalState};
//!
//! let geometry = ScreenGeometry::default();
//! let mut state = TerminalState::new(geometry);
//! let command = parse(&[0xF5, 0xC3, 0x1D, 0x20, 0xC8, 0xC9], &geometry)?;
//! state.apply_command(&command);
//! assert!(state.contains_text("HI"));
//! # Ok::<(), ds3270::error::DataStreamError>(())
//! ```

pub mod addressing;
pub mod codes;
pub mod command;
pub mod display;
pub mod field;
pub mod order;
pub mod protocol;
pub mod response;
pub mod session;

pub use addressing::{AddressingMode, BufferAddress, ScreenGeometry, ScreenSize};
pub use codes::*;
pub use command::{Command, StructuredField, Wcc, WriteItem};
pub use display::{Cell, Phase, TerminalState};
pub use field::{CharacterAttributes, DisplayClass, ExtendedAttribute, Field, FieldAttribute};
pub use order::Order;
pub use protocol::{assemble, parse, parse_inbound, InboundRecord};
pub use response::{
    build_inbound_record, build_query_reply, build_read_buffer_response, build_read_modified_response,
    ReadScope,
};
pub use session::Terminal;

pub use crate::ebcdic::{ascii_to_ebcdic, ebcdic_to_ascii};
