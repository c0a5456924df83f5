//! Field attributes and the derived field view
//!
//! A field begins at a buffer cell holding a field attribute (written by SF or
//! SFE) and runs up to the next such cell, wrapping from the end of the
//! buffer to the start. Fields are never stored: `TerminalState::fields`
//! rebuilds them from the marker cells every time.

use std::fmt;

use super::addressing::BufferAddress;
use super::codes::*;
use crate::ebcdic;

/// Display class of a field (attribute bits 2-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayClass {
    Normal,
    Intensified,
    Hidden,
}

/// 3270 base field attribute byte
///
/// Kept as the raw byte so that every attribute round-trips through the
/// codec unchanged, including the bits this engine does not interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldAttribute(u8);

impl FieldAttribute {
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    /// Attribute built from its flags, with MDT clear
    pub fn from_flags(protected: bool, numeric: bool, display: DisplayClass) -> Self {
        let mut byte = match display {
            DisplayClass::Normal => DISPLAY_NORMAL,
            DisplayClass::Intensified => DISPLAY_INTENSIFIED,
            DisplayClass::Hidden => DISPLAY_HIDDEN,
        };
        if protected {
            byte |= ATTR_PROTECTED;
        }
        if numeric {
            byte |= ATTR_NUMERIC;
        }
        Self(byte)
    }

    pub const fn byte(self) -> u8 {
        self.0
    }

    /// Check if field is protected
    pub fn is_protected(self) -> bool {
        (self.0 & ATTR_PROTECTED) != 0
    }

    /// Check if field accepts digits only
    pub fn is_numeric(self) -> bool {
        (self.0 & ATTR_NUMERIC) != 0
    }

    pub fn display(self) -> DisplayClass {
        match self.0 & ATTR_DISPLAY {
            DISPLAY_INTENSIFIED => DisplayClass::Intensified,
            DISPLAY_HIDDEN => DisplayClass::Hidden,
            _ => DisplayClass::Normal,
        }
    }

    /// Check if field is non-display
    pub fn is_hidden(self) -> bool {
        self.display() == DisplayClass::Hidden
    }

    pub fn is_intensified(self) -> bool {
        self.display() == DisplayClass::Intensified
    }

    /// Check if Modified Data Tag (MDT) is set
    pub fn is_modified(self) -> bool {
        (self.0 & ATTR_MDT) != 0
    }

    /// Set or clear the Modified Data Tag
    pub fn set_modified(&mut self, modified: bool) {
        if modified {
            self.0 |= ATTR_MDT;
        } else {
            self.0 &= !ATTR_MDT;
        }
    }

    /// Copy of this attribute with the MDT forced to `modified`
    pub fn with_modified(mut self, modified: bool) -> Self {
        self.set_modified(modified);
        self
    }
}

impl From<u8> for FieldAttribute {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl fmt::Display for FieldAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:?}{}",
            if self.is_protected() { "protected " } else { "" },
            if self.is_numeric() { "numeric " } else { "" },
            self.display(),
            if self.is_modified() { " modified" } else { "" }
        )
    }
}

/// Extended attribute type/value pair carried by SFE, SA and MF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtendedAttribute {
    pub attr_type: u8,
    pub value: u8,
}

impl ExtendedAttribute {
    pub const fn new(attr_type: u8, value: u8) -> Self {
        Self { attr_type, value }
    }

    /// Pair carrying a base 3270 field attribute
    pub fn field_attribute(attribute: FieldAttribute) -> Self {
        Self::new(XA_3270, attribute.byte())
    }

    pub fn is_field_attribute(&self) -> bool {
        self.attr_type == XA_3270
    }
}

/// Character attributes applied to data by Set Attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacterAttributes {
    pub highlighting: u8,
    pub foreground: u8,
    pub background: u8,
    pub charset: u8,
}

impl CharacterAttributes {
    /// Apply one SA pair; type 0x00 resets everything to default
    pub fn apply(&mut self, pair: ExtendedAttribute) {
        match pair.attr_type {
            XA_ALL => *self = Self::default(),
            XA_HIGHLIGHTING => self.highlighting = pair.value,
            XA_FOREGROUND => self.foreground = pair.value,
            XA_BACKGROUND => self.background = pair.value,
            XA_CHARSET => self.charset = pair.value,
            _ => {}
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A field as seen at one moment: recomputed from the buffer, never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Address of the attribute (marker) cell
    pub start: BufferAddress,
    pub attribute: FieldAttribute,
    /// Extended attributes other than the base attribute
    pub extended: Vec<ExtendedAttribute>,
    /// First data position after the marker
    pub data_start: BufferAddress,
    /// Number of data positions up to the next marker
    pub length: usize,
    /// Raw data bytes, nulls included
    pub data: Vec<u8>,
}

impl Field {
    pub fn is_protected(&self) -> bool {
        self.attribute.is_protected()
    }

    pub fn is_numeric(&self) -> bool {
        self.attribute.is_numeric()
    }

    pub fn is_modified(&self) -> bool {
        self.attribute.is_modified()
    }

    /// Field data with nulls suppressed, as sent to the host
    pub fn content(&self) -> Vec<u8> {
        self.data.iter().copied().filter(|&b| b != FCC_NULL).collect()
    }

    /// Field data as text
    pub fn text(&self) -> String {
        ebcdic::ebcdic_to_string(&self.data)
    }

    /// Look up an extended attribute value by type
    pub fn extended_value(&self, attr_type: u8) -> Option<u8> {
        self.extended
            .iter()
            .rev()
            .find(|pair| pair.attr_type == attr_type)
            .map(|pair| pair.value)
    }

    /// True when `address` is one of this field's data positions
    pub fn contains(&self, address: BufferAddress, buffer_size: usize) -> bool {
        let distance = (address.index() + buffer_size - self.data_start.index()) % buffer_size;
        distance < self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_accessors() {
        let attr = FieldAttribute::new(ATTR_PROTECTED | DISPLAY_INTENSIFIED | ATTR_MDT);
        assert!(attr.is_protected());
        assert!(!attr.is_numeric());
        assert!(attr.is_intensified());
        assert!(attr.is_modified());
        assert_eq!(attr.display(), DisplayClass::Intensified);

        let hidden = FieldAttribute::new(ATTR_NUMERIC | DISPLAY_HIDDEN);
        assert!(hidden.is_hidden());
        assert!(hidden.is_numeric());
    }

    #[test]
    fn test_attribute_is_lossless() {
        // bits 6-7 and the reserved bit are carried even though unused here
        let attr = FieldAttribute::new(0xC2);
        assert_eq!(attr.byte(), 0xC2);
        assert_eq!(attr.with_modified(true).byte(), 0xC3);
        assert_eq!(attr.with_modified(true).with_modified(false), attr);
    }

    #[test]
    fn test_from_flags() {
        let attr = FieldAttribute::from_flags(true, true, DisplayClass::Hidden);
        assert_eq!(attr.byte(), 0x3C);
        assert!(!attr.is_modified());
    }

    #[test]
    fn test_character_attributes_reset() {
        let mut attrs = CharacterAttributes::default();
        attrs.apply(ExtendedAttribute::new(XA_FOREGROUND, COLOR_RED));
        attrs.apply(ExtendedAttribute::new(XA_HIGHLIGHTING, HIGHLIGHT_REVERSE));
        assert_eq!(attrs.foreground, COLOR_RED);
        assert!(!attrs.is_default());

        attrs.apply(ExtendedAttribute::new(XA_ALL, 0x00));
        assert!(attrs.is_default());
    }

    #[test]
    fn test_field_content_and_contains() {
        let field = Field {
            start: BufferAddress::new(1918),
            attribute: FieldAttribute::default(),
            extended: vec![ExtendedAttribute::new(XA_FOREGROUND, COLOR_GREEN)],
            data_start: BufferAddress::new(1919),
            length: 3,
            data: vec![0xC1, 0x00, 0xC2],
        };
        assert_eq!(field.content(), vec![0xC1, 0xC2]);
        assert_eq!(field.text(), "A B");
        assert_eq!(field.extended_value(XA_FOREGROUND), Some(COLOR_GREEN));
        assert_eq!(field.extended_value(XA_BACKGROUND), None);
        // wraps past the end of a 1920-cell buffer
        assert!(field.contains(BufferAddress::new(1919), 1920));
        assert!(field.contains(BufferAddress::new(1), 1920));
        assert!(!field.contains(BufferAddress::new(2), 1920));
        assert!(!field.contains(BufferAddress::new(1918), 1920));
    }
}
