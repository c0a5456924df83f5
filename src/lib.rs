//! ds3270: an IBM 3270 data stream engine
//!
//! Encodes and decodes host commands and orders, maintains the screen
//! buffer and field model a terminal keeps, and builds the records a
//! terminal sends back. [`lib3270::Terminal`] ties these together into a
//! virtual terminal that can be scripted against a host transport.

/// EBCDIC (CP037) translation
pub mod ebcdic;

/// Error types for every layer
pub mod error;

/// Session configuration
pub mod config;

/// LIB3270: IBM 3270 data stream implementation
pub mod lib3270;
