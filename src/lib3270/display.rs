//! Screen buffer and field model for 3270
//!
//! `TerminalState` is the in-memory terminal: a flat buffer of cells, the
//! write cursor that orders move, the hardware cursor the operator types at,
//! and the keyboard/AID state of the read cycle. Field boundaries are not
//! stored; they are found from the marker cells whenever they are needed.
//!
//! Every address operation wraps modulo the buffer size, so applying an
//! order never fails.

use std::fmt;

use log::trace;

use super::addressing::{BufferAddress, ScreenGeometry};
use super::codes::*;
use super::command::{Command, Wcc, WriteItem};
use super::field::{CharacterAttributes, ExtendedAttribute, Field, FieldAttribute};
use super::order::Order;
use crate::ebcdic;
use crate::error::{SessionError, SessionResult};

/// One buffer position
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    /// EBCDIC character (null for a marker cell)
    pub char_data: u8,
    /// Present when the cell is a field attribute marker
    pub field_attr: Option<FieldAttribute>,
    /// Extended attributes of a marker cell (SFE/MF)
    pub extended: Vec<ExtendedAttribute>,
    /// Character attributes in force when the data was written (SA)
    pub char_attrs: CharacterAttributes,
}

impl Cell {
    pub fn is_field_marker(&self) -> bool {
        self.field_attr.is_some()
    }
}

/// Write cycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Buffer freshly created or erased
    Idle,
    /// At least one order or data byte applied since the last erase
    AcceptingOrders,
}

/// The buffer, cursors and read-cycle state of one terminal
#[derive(Debug, Clone)]
pub struct TerminalState {
    geometry: ScreenGeometry,
    cells: Vec<Cell>,
    cursor: BufferAddress,
    hardware_cursor: BufferAddress,
    aid: AidKey,
    keyboard_locked: bool,
    alarm: bool,
    char_attrs: CharacterAttributes,
    phase: Phase,
}

impl TerminalState {
    /// Create an erased terminal with the given geometry
    pub fn new(geometry: ScreenGeometry) -> Self {
        Self {
            geometry,
            cells: vec![Cell::default(); geometry.buffer_size()],
            cursor: BufferAddress::ZERO,
            hardware_cursor: BufferAddress::ZERO,
            aid: AidKey::NoAid,
            keyboard_locked: false,
            alarm: false,
            char_attrs: CharacterAttributes::default(),
            phase: Phase::Idle,
        }
    }

    pub fn geometry(&self) -> &ScreenGeometry {
        &self.geometry
    }

    pub fn buffer_size(&self) -> usize {
        self.cells.len()
    }

    /// Current write cursor
    pub fn cursor_address(&self) -> BufferAddress {
        self.cursor
    }

    /// Position set by Insert Cursor or by operator movement
    pub fn hardware_cursor(&self) -> BufferAddress {
        self.hardware_cursor
    }

    pub fn pending_aid(&self) -> AidKey {
        self.aid
    }

    pub fn is_keyboard_locked(&self) -> bool {
        self.keyboard_locked
    }

    pub fn is_alarm(&self) -> bool {
        self.alarm
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cell at an address, wrapped into the buffer
    pub fn cell(&self, address: BufferAddress) -> &Cell {
        &self.cells[self.wrap(address.index())]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn wrap(&self, index: usize) -> usize {
        index % self.cells.len()
    }

    fn address(&self, index: usize) -> BufferAddress {
        BufferAddress::new(self.wrap(index) as u16)
    }

    /// Lock the keyboard after the operator presses an attention key
    pub fn lock_keyboard(&mut self, aid: AidKey) {
        self.keyboard_locked = true;
        self.aid = aid;
    }

    /// Keyboard restore: unlock and forget the pending AID
    pub fn restore_keyboard(&mut self) {
        self.keyboard_locked = false;
        self.aid = AidKey::NoAid;
    }

    pub fn set_alarm(&mut self, alarm: bool) {
        self.alarm = alarm;
    }

    /// Null the whole buffer, remove every field and home both cursors
    pub fn erase(&mut self) {
        self.cells.fill(Cell::default());
        self.cursor = BufferAddress::ZERO;
        self.hardware_cursor = BufferAddress::ZERO;
        self.char_attrs = CharacterAttributes::default();
        self.phase = Phase::Idle;
    }

    /// Null every cell from `from` to the end of the buffer
    pub fn erase_from(&mut self, from: BufferAddress) {
        let start = self.wrap(from.index());
        self.cells[start..].fill(Cell::default());
        self.char_attrs = CharacterAttributes::default();
        self.phase = Phase::Idle;
    }

    /// Clear every modified data tag
    pub fn reset_mdt(&mut self) {
        for attr in self.cells.iter_mut().filter_map(|cell| cell.field_attr.as_mut()) {
            attr.set_modified(false);
        }
    }

    /// Index of the marker governing `index`: the nearest marker strictly
    /// before it, searching backwards with wraparound
    fn governing_marker(&self, index: usize) -> Option<usize> {
        let size = self.cells.len();
        (1..=size)
            .map(|back| (index + size - back) % size)
            .find(|&i| self.cells[i].is_field_marker())
    }

    /// Attribute governing a position; `None` on an unformatted screen
    fn governing_attribute(&self, index: usize) -> Option<FieldAttribute> {
        self.governing_marker(index)
            .and_then(|i| self.cells[i].field_attr)
    }

    fn mark_modified(&mut self, index: usize) {
        if let Some(marker) = self.governing_marker(index) {
            if let Some(attr) = self.cells[marker].field_attr.as_mut() {
                attr.set_modified(true);
            }
        }
    }

    /// Store a data byte at `index`; MDT is left to the caller
    fn put(&mut self, index: usize, byte: u8) {
        let char_attrs = self.char_attrs;
        let cell = &mut self.cells[index];
        cell.char_data = byte;
        cell.field_attr = None;
        cell.extended.clear();
        cell.char_attrs = char_attrs;
    }

    /// Write one data byte at the write cursor and advance it
    pub fn write_data(&mut self, byte: u8) {
        self.write_run(std::iter::once(byte));
    }

    /// Write consecutive data bytes from the write cursor
    ///
    /// Markers inside the run are overwritten, so the only field the run
    /// can modify is the one governing its first position.
    fn write_run(&mut self, bytes: impl Iterator<Item = u8>) {
        self.phase = Phase::AcceptingOrders;
        let marker = self.governing_marker(self.cursor.index());
        for byte in bytes {
            let index = self.cursor.index();
            self.put(index, byte);
            self.cursor = self.cursor.next(&self.geometry);
        }
        if let Some(attr) = marker.and_then(|m| self.cells[m].field_attr.as_mut()) {
            attr.set_modified(true);
        }
    }

    fn start_field(&mut self, attribute: FieldAttribute, extended: Vec<ExtendedAttribute>) {
        let cell = &mut self.cells[self.cursor.index()];
        cell.char_data = FCC_NULL;
        cell.field_attr = Some(attribute.with_modified(false));
        cell.extended = extended;
        cell.char_attrs = CharacterAttributes::default();
        self.cursor = self.cursor.next(&self.geometry);
    }

    /// Number of positions from the cursor up to `target`; a target equal
    /// to the cursor spans the whole buffer
    fn span_to(&self, target: BufferAddress) -> usize {
        let size = self.cells.len();
        let distance = (target.index() + size - self.cursor.index()) % size;
        if distance == 0 {
            size
        } else {
            distance
        }
    }

    /// Data start of the next unprotected field whose marker is at or
    /// after `from`, optionally wrapping past the end of the buffer
    fn next_unprotected_field(&self, from: usize, wrap: bool) -> Option<usize> {
        let size = self.cells.len();
        let limit = if wrap { size } else { size - from };
        (0..limit)
            .map(|step| (from + step) % size)
            .find(|&i| {
                let unprotected = matches!(self.cells[i].field_attr, Some(attr) if !attr.is_protected());
                unprotected && !self.cells[(i + 1) % size].is_field_marker()
            })
            .map(|i| (i + 1) % size)
    }

    /// Apply one order to the buffer
    pub fn apply_order(&mut self, order: &Order) {
        trace!("applying {} at {}", order.mnemonic(), self.cursor);
        self.phase = Phase::AcceptingOrders;
        let size = self.cells.len();

        match order {
            Order::SetBufferAddress(address) => {
                self.cursor = address.wrapped(&self.geometry);
            }
            Order::StartField(attribute) => self.start_field(*attribute, Vec::new()),
            Order::StartFieldExtended(pairs) => {
                let base = pairs
                    .iter()
                    .rev()
                    .find(|pair| pair.is_field_attribute())
                    .map(|pair| FieldAttribute::new(pair.value))
                    .unwrap_or_default();
                let extended = pairs.iter().copied().filter(|pair| !pair.is_field_attribute()).collect();
                self.start_field(base, extended);
            }
            Order::SetAttribute(pair) => self.char_attrs.apply(*pair),
            Order::ModifyField(pairs) => {
                let cell = &mut self.cells[self.cursor.index()];
                if let Some(attr) = cell.field_attr.as_mut() {
                    for pair in pairs {
                        if pair.is_field_attribute() {
                            *attr = FieldAttribute::new(pair.value);
                        } else if let Some(existing) =
                            cell.extended.iter_mut().find(|e| e.attr_type == pair.attr_type)
                        {
                            existing.value = pair.value;
                        } else {
                            cell.extended.push(*pair);
                        }
                    }
                    self.cursor = self.cursor.next(&self.geometry);
                }
            }
            Order::InsertCursor => self.hardware_cursor = self.cursor,
            Order::ProgramTab => {
                let target = self.next_unprotected_field(self.cursor.index(), false).unwrap_or(0);
                self.cursor = self.address(target);
            }
            Order::RepeatToAddress(target, ch) => {
                let target = target.wrapped(&self.geometry);
                let count = self.span_to(target);
                self.write_run(std::iter::repeat(*ch).take(count));
                self.cursor = target;
            }
            Order::EraseUnprotectedToAddress(target) => {
                let target = target.wrapped(&self.geometry);
                let start = self.cursor.index();
                let mut attribute = self.governing_attribute(start);
                for step in 0..self.span_to(target) {
                    let index = (start + step) % size;
                    if let Some(attr) = self.cells[index].field_attr {
                        attribute = Some(attr);
                        continue;
                    }
                    if !attribute.map_or(false, |attr| attr.is_protected()) {
                        self.cells[index].char_data = FCC_NULL;
                    }
                }
                self.cursor = target;
            }
            Order::GraphicEscape(ch) => self.write_data(*ch),
            Order::NewLine => {
                let row = (self.cursor.row(&self.geometry) + 1) % self.geometry.rows();
                self.cursor = BufferAddress::from_row_col(row, 0, &self.geometry);
            }
        }
    }

    /// Apply one element of a write body
    pub fn apply_item(&mut self, item: &WriteItem) {
        match item {
            WriteItem::Order(order) => self.apply_order(order),
            WriteItem::Data(bytes) => self.write_run(bytes.iter().copied()),
        }
    }

    fn apply_write(&mut self, wcc: Wcc, items: &[WriteItem]) {
        if wcc.reset_mdt() {
            self.reset_mdt();
        }
        if wcc.sound_alarm() {
            self.alarm = true;
        }
        for item in items {
            self.apply_item(item);
        }
        if wcc.keyboard_restore() {
            self.restore_keyboard();
        }
    }

    /// Apply a parsed command
    ///
    /// Reads and structured fields leave the buffer alone; answering them
    /// is the caller's business.
    pub fn apply_command(&mut self, command: &Command) {
        match command {
            Command::EraseWrite { wcc, items } => {
                self.erase();
                self.apply_write(*wcc, items);
            }
            Command::EraseWriteAlternate { wcc, items } => {
                self.erase_from(self.cursor);
                self.apply_write(*wcc, items);
            }
            Command::Write { wcc, items } => self.apply_write(*wcc, items),
            Command::EraseAllUnprotected => {
                self.erase_input();
                self.restore_keyboard();
            }
            Command::ReadBuffer(_)
            | Command::ReadModified(_)
            | Command::ReadModifiedAll(_)
            | Command::WriteStructuredField(_) => {}
        }
    }

    /// Null all unprotected field data, reset their MDTs and move both
    /// cursors to the first unprotected field
    ///
    /// On an unformatted screen the whole buffer is nulled.
    pub fn erase_input(&mut self) {
        if !self.is_formatted() {
            self.cells.fill(Cell::default());
            self.cursor = BufferAddress::ZERO;
            self.hardware_cursor = BufferAddress::ZERO;
            return;
        }

        let mut attribute = self.governing_attribute(0);
        for cell in self.cells.iter_mut() {
            if let Some(attr) = cell.field_attr.as_mut() {
                if !attr.is_protected() {
                    attr.set_modified(false);
                }
                attribute = Some(*attr);
                continue;
            }
            if !attribute.map_or(false, |attr| attr.is_protected()) {
                cell.char_data = FCC_NULL;
            }
        }

        let first = self.next_unprotected_field(0, false).unwrap_or(0);
        self.cursor = self.address(first);
        self.hardware_cursor = self.cursor;
    }

    /// Clear key: erase the screen and home the cursors
    pub fn clear(&mut self) {
        self.erase();
    }

    /// True when the buffer holds at least one field
    pub fn is_formatted(&self) -> bool {
        self.cells.iter().any(Cell::is_field_marker)
    }

    /// Fields in ascending marker address
    pub fn fields(&self) -> Vec<Field> {
        let size = self.cells.len();
        let markers: Vec<usize> = (0..size).filter(|&i| self.cells[i].is_field_marker()).collect();

        markers
            .iter()
            .enumerate()
            .filter_map(|(n, &start)| {
                let next = markers.get(n + 1).copied().unwrap_or(markers[0] + size);
                let length = next - start - 1;
                let attribute = self.cells[start].field_attr?;
                let data = (1..=length).map(|k| self.cells[(start + k) % size].char_data).collect();
                Some(Field {
                    start: self.address(start),
                    attribute,
                    extended: self.cells[start].extended.clone(),
                    data_start: self.address(start + 1),
                    length,
                    data,
                })
            })
            .collect()
    }

    /// Field whose marker or data covers `address`
    pub fn field_at(&self, address: BufferAddress) -> Option<Field> {
        let address = address.wrapped(&self.geometry);
        let size = self.cells.len();
        self.fields()
            .into_iter()
            .find(|field| field.start == address || field.contains(address, size))
    }

    /// Screen text with one character per cell; markers and non-display
    /// field data show as blanks
    fn rendered(&self) -> Vec<char> {
        let mut attribute = self.governing_attribute(0);
        self.cells
            .iter()
            .map(|cell| {
                if let Some(attr) = cell.field_attr {
                    attribute = Some(attr);
                    ' '
                } else if attribute.map_or(false, |attr| attr.is_hidden()) {
                    ' '
                } else {
                    ebcdic::ebcdic_to_ascii(cell.char_data)
                }
            })
            .collect()
    }

    /// Whole screen, one line per row
    pub fn screen_text(&self) -> String {
        self.rendered()
            .chunks(self.geometry.cols() as usize)
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of one row; empty when the row is off screen
    pub fn row_text(&self, row: u16) -> String {
        if row >= self.geometry.rows() {
            return String::new();
        }
        let cols = self.geometry.cols() as usize;
        let start = row as usize * cols;
        self.rendered()[start..start + cols].iter().collect()
    }

    /// True when `text` appears anywhere on screen, including across a row
    /// boundary
    pub fn contains_text(&self, text: &str) -> bool {
        self.rendered().iter().collect::<String>().contains(text)
    }

    /// Move the hardware cursor, wrapping into the buffer
    pub fn set_hardware_cursor(&mut self, address: BufferAddress) {
        self.hardware_cursor = address.wrapped(&self.geometry);
    }

    /// Operator tab: hardware cursor to the next unprotected field, wrapping
    ///
    /// Returns false when the screen has no unprotected field.
    pub fn tab_to_next_field(&mut self) -> bool {
        let from = self.hardware_cursor.index();
        match self.next_unprotected_field(from, true) {
            Some(target) => {
                self.hardware_cursor = self.address(target);
                true
            }
            None => false,
        }
    }

    /// Operator typing at the hardware cursor
    ///
    /// Characters go into unprotected fields only and set the field's MDT.
    /// When the cursor runs onto the next marker it skips to the following
    /// unprotected field. Characters already accepted stay typed if a later
    /// one is rejected.
    pub fn type_text(&mut self, text: &str) -> SessionResult<()> {
        if self.keyboard_locked {
            return Err(SessionError::KeyboardLocked);
        }

        for ch in text.chars() {
            let index = self.hardware_cursor.index();
            let address = self.hardware_cursor.value();
            if self.cells[index].is_field_marker() {
                return Err(SessionError::FieldProtected { address });
            }

            let attribute = self.governing_attribute(index);
            if let Some(attr) = attribute {
                if attr.is_protected() {
                    return Err(SessionError::FieldProtected { address });
                }
                if attr.is_numeric() && !ch.is_ascii_digit() {
                    return Err(SessionError::NumericOnly { address, ch });
                }
            }

            let byte = ebcdic::ascii_to_ebcdic(ch).unwrap_or(ebcdic::EBCDIC_SPACE);
            self.cells[index].char_data = byte;
            self.mark_modified(index);

            let next = self.wrap(index + 1);
            self.hardware_cursor = self.address(next);
            if attribute.is_some() && self.cells[next].is_field_marker() {
                self.tab_to_next_field();
            }
        }
        Ok(())
    }
}

impl Default for TerminalState {
    fn default() -> Self {
        Self::new(ScreenGeometry::default())
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.screen_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebcdic::string_to_ebcdic;

    fn unprotected() -> FieldAttribute {
        FieldAttribute::new(0x00)
    }

    fn protected() -> FieldAttribute {
        FieldAttribute::new(ATTR_PROTECTED)
    }

    fn sba(position: u16) -> Order {
        Order::SetBufferAddress(BufferAddress::new(position))
    }

    fn write_text(state: &mut TerminalState, text: &str) {
        state.apply_item(&WriteItem::Data(string_to_ebcdic(text)));
    }

    #[test]
    fn test_new_state_is_idle_and_blank() {
        let state = TerminalState::default();
        assert_eq!(state.buffer_size(), 1920);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.is_keyboard_locked());
        assert_eq!(state.pending_aid(), AidKey::NoAid);
        assert!(state.fields().is_empty());
    }

    #[test]
    fn test_start_field_and_data() {
        let mut state = TerminalState::default();
        state.apply_order(&sba(0));
        state.apply_order(&Order::StartField(unprotected().with_modified(true)));
        assert_eq!(state.phase(), Phase::AcceptingOrders);
        assert_eq!(state.cursor_address().value(), 1);

        // SF clears the MDT it was given
        assert!(!state.fields()[0].is_modified());

        write_text(&mut state, "HELLO");
        let field = &state.fields()[0];
        assert_eq!(field.content(), string_to_ebcdic("HELLO"));
        assert!(field.is_modified());
        assert_eq!(field.length, 1919);
    }

    #[test]
    fn test_insert_cursor_keeps_write_cursor() {
        let mut state = TerminalState::default();
        state.apply_order(&sba(100));
        state.apply_order(&Order::InsertCursor);
        state.apply_order(&sba(5));
        assert_eq!(state.hardware_cursor().value(), 100);
        assert_eq!(state.cursor_address().value(), 5);
    }

    #[test]
    fn test_repeat_to_address_wraps() {
        let mut state = TerminalState::default();
        state.apply_order(&sba(1915));
        state.apply_order(&Order::RepeatToAddress(BufferAddress::new(3), 0x5C));
        assert_eq!(state.cursor_address().value(), 3);
        for position in [1915u16, 1919, 0, 2] {
            assert_eq!(state.cell(BufferAddress::new(position)).char_data, 0x5C);
        }
        assert_eq!(state.cell(BufferAddress::new(3)).char_data, 0x00);
        assert_eq!(state.cell(BufferAddress::new(1914)).char_data, 0x00);
    }

    #[test]
    fn test_repeat_to_cursor_fills_buffer() {
        let mut state = TerminalState::default();
        state.apply_order(&sba(10));
        state.apply_order(&Order::RepeatToAddress(BufferAddress::new(10), 0x4B));
        assert!(state.cells().iter().all(|cell| cell.char_data == 0x4B));
        assert_eq!(state.cursor_address().value(), 10);
    }

    #[test]
    fn test_erase_unprotected_to_address() {
        let mut state = TerminalState::default();
        state.apply_order(&sba(0));
        state.apply_order(&Order::StartField(unprotected()));
        write_text(&mut state, "AAAA");
        state.apply_order(&Order::StartField(protected()));
        write_text(&mut state, "BBBB");
        state.apply_order(&Order::StartField(unprotected()));
        write_text(&mut state, "CCCC");

        state.apply_order(&sba(1));
        state.apply_order(&Order::EraseUnprotectedToAddress(BufferAddress::new(13)));
        assert_eq!(state.cursor_address().value(), 13);

        let fields = state.fields();
        assert!(fields[0].content().is_empty());
        assert_eq!(fields[1].content(), string_to_ebcdic("BBBB"));
        // only the first two positions of the third field were in range
        assert_eq!(fields[2].content(), string_to_ebcdic("CC"));
        assert!(state.cell(BufferAddress::new(5)).is_field_marker());
    }

    #[test]
    fn test_program_tab() {
        let mut state = TerminalState::default();
        state.apply_order(&sba(10));
        state.apply_order(&Order::StartField(protected()));
        state.apply_order(&sba(20));
        state.apply_order(&Order::StartField(unprotected()));
        state.apply_order(&sba(0));
        state.apply_order(&Order::ProgramTab);
        assert_eq!(state.cursor_address().value(), 21);

        // nothing after the cursor: address 0
        state.apply_order(&sba(30));
        state.apply_order(&Order::ProgramTab);
        assert_eq!(state.cursor_address().value(), 0);
    }

    #[test]
    fn test_new_line_wraps_to_top() {
        let mut state = TerminalState::default();
        state.apply_order(&sba(85));
        state.apply_order(&Order::NewLine);
        assert_eq!(state.cursor_address().value(), 160);
        state.apply_order(&sba(1900));
        state.apply_order(&Order::NewLine);
        assert_eq!(state.cursor_address().value(), 0);
    }

    #[test]
    fn test_start_field_extended_and_modify_field() {
        let mut state = TerminalState::default();
        state.apply_order(&Order::StartFieldExtended(vec![
            ExtendedAttribute::new(XA_3270, ATTR_PROTECTED),
            ExtendedAttribute::new(XA_FOREGROUND, COLOR_RED),
        ]));
        let field = &state.fields()[0];
        assert!(field.is_protected());
        assert_eq!(field.extended_value(XA_FOREGROUND), Some(COLOR_RED));

        state.apply_order(&sba(0));
        state.apply_order(&Order::ModifyField(vec![
            ExtendedAttribute::new(XA_3270, 0x00),
            ExtendedAttribute::new(XA_FOREGROUND, COLOR_GREEN),
        ]));
        assert_eq!(state.cursor_address().value(), 1);
        let field = &state.fields()[0];
        assert!(!field.is_protected());
        assert_eq!(field.extended_value(XA_FOREGROUND), Some(COLOR_GREEN));

        // MF off a marker does nothing
        state.apply_order(&Order::ModifyField(vec![ExtendedAttribute::new(XA_3270, 0x20)]));
        assert_eq!(state.cursor_address().value(), 1);
    }

    #[test]
    fn test_set_attribute_applies_to_data() {
        let mut state = TerminalState::default();
        state.apply_order(&Order::SetAttribute(ExtendedAttribute::new(XA_FOREGROUND, COLOR_BLUE)));
        write_text(&mut state, "X");
        state.apply_order(&Order::SetAttribute(ExtendedAttribute::new(XA_ALL, 0)));
        write_text(&mut state, "Y");
        assert_eq!(state.cell(BufferAddress::new(0)).char_attrs.foreground, COLOR_BLUE);
        assert!(state.cell(BufferAddress::new(1)).char_attrs.is_default());
    }

    #[test]
    fn test_erase_write_alternate_clears_from_cursor() {
        let mut state = TerminalState::default();
        write_text(&mut state, "ABCDEF");
        state.apply_order(&sba(3));
        state.apply_command(&Command::EraseWriteAlternate { wcc: Wcc::default(), items: vec![] });
        assert_eq!(state.row_text(0).trim_end(), "ABC");
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_wcc_effects() {
        let mut state = TerminalState::default();
        state.apply_order(&Order::StartField(unprotected()));
        write_text(&mut state, "X");
        state.lock_keyboard(AidKey::Enter);
        assert!(state.fields()[0].is_modified());

        state.apply_command(&Command::Write {
            wcc: Wcc::new(WCC_RESET_MDT | WCC_RESTORE | WCC_ALARM),
            items: vec![],
        });
        assert!(!state.fields()[0].is_modified());
        assert!(!state.is_keyboard_locked());
        assert_eq!(state.pending_aid(), AidKey::NoAid);
        assert!(state.is_alarm());
    }

    #[test]
    fn test_erase_all_unprotected() {
        let mut state = TerminalState::default();
        state.apply_order(&Order::StartField(protected()));
        write_text(&mut state, "NAME");
        state.apply_order(&Order::StartField(unprotected()));
        write_text(&mut state, "JOE");
        state.lock_keyboard(AidKey::PF3);

        state.apply_command(&Command::EraseAllUnprotected);
        let fields = state.fields();
        assert_eq!(fields[0].content(), string_to_ebcdic("NAME"));
        assert!(fields[1].content().is_empty());
        assert!(!fields[1].is_modified());
        assert_eq!(state.hardware_cursor().value(), 6);
        assert_eq!(state.cursor_address().value(), 6);
        assert!(!state.is_keyboard_locked());
    }

    #[test]
    fn test_screen_text_hides_non_display_fields() {
        let geometry = ScreenGeometry::new(2, 10, crate::lib3270::AddressingMode::TwelveBit).unwrap();
        let mut state = TerminalState::new(geometry);
        state.apply_order(&Order::StartField(protected()));
        write_text(&mut state, "USER");
        state.apply_order(&Order::StartField(FieldAttribute::new(DISPLAY_HIDDEN)));
        write_text(&mut state, "PASS");
        assert_eq!(state.screen_text(), " USER     \n          ");
        assert!(state.contains_text("USER"));
        assert!(!state.contains_text("PASS"));
        assert_eq!(state.row_text(5), "");
    }

    #[test]
    fn test_type_text_rules() {
        let mut state = TerminalState::default();
        state.apply_order(&Order::StartField(protected()));
        write_text(&mut state, "ID");
        state.apply_order(&Order::StartField(FieldAttribute::new(ATTR_NUMERIC)));
        state.apply_order(&sba(10));
        state.apply_order(&Order::StartField(protected()));
        state.reset_mdt();

        state.set_hardware_cursor(BufferAddress::new(1));
        assert!(matches!(state.type_text("x"), Err(SessionError::FieldProtected { address: 1 })));

        assert!(state.tab_to_next_field());
        assert_eq!(state.hardware_cursor().value(), 4);
        assert!(matches!(state.type_text("7a"), Err(SessionError::NumericOnly { address: 5, ch: 'a' })));
        assert_eq!(state.fields()[1].content(), string_to_ebcdic("7"));
        assert!(state.fields()[1].is_modified());
        assert!(!state.fields()[0].is_modified());

        state.lock_keyboard(AidKey::Enter);
        assert!(matches!(state.type_text("1"), Err(SessionError::KeyboardLocked)));
    }

    #[test]
    fn test_typing_skips_to_next_field() {
        let mut state = TerminalState::default();
        state.apply_order(&Order::StartField(unprotected()));
        state.apply_order(&sba(3));
        state.apply_order(&Order::StartField(protected()));
        state.apply_order(&sba(6));
        state.apply_order(&Order::StartField(unprotected()));

        state.set_hardware_cursor(BufferAddress::new(1));
        state.type_text("ABC").unwrap();
        assert_eq!(state.fields()[0].content(), string_to_ebcdic("AB"));
        assert_eq!(state.fields()[2].content(), string_to_ebcdic("C"));
        assert_eq!(state.hardware_cursor().value(), 8);
    }

    #[test]
    fn test_erase_write_is_idempotent() {
        let mut state = TerminalState::default();
        write_text(&mut state, "JUNK");
        let erase = Command::EraseWrite { wcc: Wcc::default(), items: vec![] };
        state.apply_command(&erase);
        let once = state.cells().to_vec();
        state.apply_command(&erase);
        assert_eq!(state.cells(), once.as_slice());
        assert_eq!(state.cursor_address(), BufferAddress::ZERO);
    }
}
