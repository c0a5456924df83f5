//! Error reporting tests for the data stream codec
//!
//! Every decode failure carries the position it was found at; the screen
//! model itself never fails.

use ds3270::error::{AddressDecodeError, DataStreamError, SessionError, Tn3270Error};
use ds3270::lib3270::addressing::decode;
use ds3270::lib3270::{
    parse, parse_inbound, AddressingMode, AidKey, Order, ScreenGeometry, TerminalState, CMD_WRITE,
    CMD_WRITE_STRUCTURED_FIELD, ORDER_RA, ORDER_SBA, ORDER_SFE,
};

fn model2() -> ScreenGeometry {
    ScreenGeometry::default()
}

#[test]
fn test_invalid_12bit_code() {
    assert_eq!(decode([0x40, 0x00], &model2()), Err(AddressDecodeError::InvalidCode { byte: 0x00 }));
    assert_eq!(decode([0x41, 0x40], &model2()), Err(AddressDecodeError::InvalidCode { byte: 0x41 }));
}

#[test]
fn test_address_out_of_range() {
    // 0x7F 0x7F is 4095, beyond a 1920-cell buffer
    assert_eq!(
        decode([0x7F, 0x7F], &model2()),
        Err(AddressDecodeError::OutOfRange { address: 4095, buffer_size: 1920 })
    );

    let g = ScreenGeometry::new(24, 80, AddressingMode::FourteenBit).unwrap();
    assert_eq!(decode([0xC0, 0x00], &g), Err(AddressDecodeError::HighBitsSet { byte: 0xC0 }));
    assert!(matches!(decode([0x3F, 0xFF], &g), Err(AddressDecodeError::OutOfRange { .. })));
}

#[test]
fn test_address_error_carries_operand_offset() {
    let err = parse(&[CMD_WRITE, 0x00, 0xC1, ORDER_SBA, 0x7F, 0x7F], &model2()).unwrap_err();
    assert!(matches!(err, DataStreamError::AddressDecode { offset: 4, .. }));
    assert!(err.to_string().contains("offset 4"));
}

#[test]
fn test_truncated_orders() {
    assert_eq!(
        Order::decode(&[ORDER_RA, 0x40, 0x40], 0, &model2()),
        Err(DataStreamError::TruncatedStream { offset: 0, needed: 4, available: 3 })
    );

    let err = parse(&[CMD_WRITE, 0x00, ORDER_SFE, 0x02, 0x41, 0xF1], &model2()).unwrap_err();
    assert!(matches!(err, DataStreamError::TruncatedStream { offset: 2, .. }));
}

#[test]
fn test_unknown_command() {
    assert_eq!(
        parse(&[0x99, 0x00], &model2()),
        Err(DataStreamError::UnknownCommand { byte: 0x99, offset: 0 })
    );
    assert!(matches!(parse(&[], &model2()), Err(DataStreamError::TruncatedStream { .. })));
}

#[test]
fn test_trailing_data_after_read() {
    assert_eq!(
        parse(&[0xF6, 0x00], &model2()),
        Err(DataStreamError::TrailingData { offset: 1 })
    );
}

#[test]
fn test_malformed_structured_field() {
    assert_eq!(
        parse(&[CMD_WRITE_STRUCTURED_FIELD, 0x00, 0x02, 0x01], &model2()),
        Err(DataStreamError::MalformedStructuredField { offset: 1, length: 2 })
    );
    assert!(matches!(
        parse(&[CMD_WRITE_STRUCTURED_FIELD, 0x00, 0x09, 0x01, 0xFF], &model2()),
        Err(DataStreamError::TruncatedStream { offset: 1, needed: 9, .. })
    ));
}

#[test]
fn test_unknown_aid() {
    assert_eq!(AidKey::try_from(0x01), Err(DataStreamError::UnknownAid { byte: 0x01 }));
    assert_eq!(AidKey::try_from(0x7D), Ok(AidKey::Enter));
    assert!(parse_inbound(&[0x00, 0x40, 0x40], &model2(), true).is_err());
}

#[test]
fn test_errors_convert_to_top_level() {
    let stream = DataStreamError::UnknownOrder { byte: 0x01, offset: 7 };
    let session: SessionError = stream.clone().into();
    assert!(matches!(session, SessionError::DataStream(_)));

    let top: Tn3270Error = stream.into();
    assert!(top.to_string().contains("unknown order 0x01 at offset 7"));
}

#[test]
fn test_failed_parse_leaves_screen_untouched() {
    let state = TerminalState::default();
    let before = state.cells().to_vec();
    assert!(parse(&[CMD_WRITE, 0x00, 0xC1, 0x01], state.geometry()).is_err());
    assert_eq!(state.cells(), before.as_slice());
    assert_eq!(state.phase(), ds3270::lib3270::Phase::Idle);
}
