//! AID and read response engine
//!
//! Builds the host-bound records a terminal sends: Read Modified and Read
//! Modified All bodies, the full inbound record with cursor address, the
//! Read Buffer image, and the query reply to a Read Partition Query.

use super::addressing::{BufferAddress, ScreenGeometry};
use super::codes::*;
use super::command::StructuredField;
use super::display::TerminalState;
use crate::error::StreamResult;

/// Which fields a read returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    /// Fields with MDT set (Read Modified)
    Modified,
    /// Every field (Read Modified All)
    All,
}

fn push_address(out: &mut Vec<u8>, address: BufferAddress, geometry: &ScreenGeometry) {
    out.extend_from_slice(&address.encode(geometry.mode()));
}

fn is_short_read(aid: AidKey, scope: ReadScope) -> bool {
    scope == ReadScope::Modified && aid.is_short_read()
}

/// Append the field entries of a read: SBA to each selected field's data
/// start followed by its content, nulls suppressed
///
/// An unformatted screen contributes every non-null buffer byte instead.
fn push_fields(out: &mut Vec<u8>, state: &TerminalState, scope: ReadScope) {
    if !state.is_formatted() {
        out.extend(state.cells().iter().map(|cell| cell.char_data).filter(|&b| b != FCC_NULL));
        return;
    }

    for field in state.fields() {
        if scope == ReadScope::Modified && !field.is_modified() {
            continue;
        }
        out.push(ORDER_SBA);
        push_address(out, field.data_start, state.geometry());
        out.extend(field.content());
    }
}

/// AID followed by the selected fields
pub fn build_read_modified_response(state: &TerminalState, aid: AidKey, scope: ReadScope) -> Vec<u8> {
    let mut out = vec![aid.to_u8()];
    if !is_short_read(aid, scope) {
        push_fields(&mut out, state, scope);
    }
    out
}

/// AID, hardware cursor address, then the selected fields
///
/// This is the record a host receives after an attention key. A short read
/// is the AID alone.
pub fn build_inbound_record(state: &TerminalState, aid: AidKey, scope: ReadScope) -> Vec<u8> {
    let mut out = vec![aid.to_u8()];
    if is_short_read(aid, scope) {
        return out;
    }
    push_address(&mut out, state.hardware_cursor(), state.geometry());
    push_fields(&mut out, state, scope);
    out
}

/// AID, cursor address, then every buffer position; markers are sent as
/// SF followed by the attribute byte
pub fn build_read_buffer_response(state: &TerminalState, aid: AidKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(state.buffer_size() + 3);
    out.push(aid.to_u8());
    push_address(&mut out, state.hardware_cursor(), state.geometry());
    for cell in state.cells() {
        match cell.field_attr {
            Some(attr) => {
                out.push(ORDER_SF);
                out.push(attr.byte());
            }
            None => out.push(cell.char_data),
        }
    }
    out
}

/// Reply to a Read Partition Query: Summary and Usable Area query replies
pub fn build_query_reply(geometry: &ScreenGeometry) -> StreamResult<Vec<u8>> {
    let mut out = vec![AID_STRUCTURED_FIELD];

    StructuredField::new(SF_QUERY_REPLY, vec![QR_SUMMARY, QR_SUMMARY, QR_USABLE_AREA]).encode_into(&mut out)?;

    let mut usable_area = vec![QR_USABLE_AREA, 0x01, 0x00];
    usable_area.extend_from_slice(&geometry.cols().to_be_bytes());
    usable_area.extend_from_slice(&geometry.rows().to_be_bytes());
    usable_area.push(0x00); // units: inches
    usable_area.extend_from_slice(&0x000A_02E5u32.to_be_bytes()); // Xr
    usable_area.extend_from_slice(&0x0002_006Fu32.to_be_bytes()); // Yr
    usable_area.push(0x09); // AW
    usable_area.push(0x0C); // AH
    usable_area.extend_from_slice(&(geometry.buffer_size() as u16).to_be_bytes());
    StructuredField::new(SF_QUERY_REPLY, usable_area).encode_into(&mut out)?;

    Ok(out)
}
