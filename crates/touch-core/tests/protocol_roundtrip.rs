//! Integration tests for the gesture codec.
//!
//! These tests go through the public API only and check that decoding is the
//! left inverse of encoding for well-formed messages, and that every kind of
//! malformed text is reported as an error rather than a panic.

use touch_core::{decode, encode, encode_message, CodecError, GestureMessage, GesturePhase};

/// Encodes a message and decodes it back.
fn roundtrip(msg: GestureMessage) -> GestureMessage {
    let text = encode_message(&msg).expect("encode must succeed");
    decode(&text).expect("decode must succeed")
}

#[test]
fn test_roundtrip_preserves_every_phase() {
    for phase in [GesturePhase::Start, GesturePhase::Move, GesturePhase::Tap] {
        let original = GestureMessage::new(phase, 0.0, 0.0);
        assert_eq!(roundtrip(original), original);
    }
}

#[test]
fn test_roundtrip_preserves_awkward_floats() {
    // Values that do not have short decimal representations.
    let original = GestureMessage::moved(0.1 + 0.2, -1.0 / 3.0);
    assert_eq!(roundtrip(original), original);
}

#[test]
fn test_roundtrip_preserves_extreme_finite_values() {
    let original = GestureMessage::moved(f64::MAX, f64::MIN_POSITIVE);
    assert_eq!(roundtrip(original), original);
}

#[test]
fn test_encode_from_fields_matches_encode_message() {
    let a = encode(GesturePhase::Move, 2.5, 7.0).unwrap();
    let b = encode_message(&GestureMessage::moved(2.5, 7.0)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_decode_never_panics_on_garbage() {
    let inputs = [
        "",
        " ",
        "{",
        "}",
        "[]",
        "42",
        "\"start\"",
        "true",
        "{}",
        r#"{"phase":null,"dx":0,"dy":0}"#,
        r#"{"phase":1,"dx":0,"dy":0}"#,
        r#"{"phase":"START","dx":0,"dy":0}"#,
        r#"{"phase":"move","dx":[1],"dy":0}"#,
        r#"{"phase":"move","dx":{},"dy":0}"#,
        r#"{"phase":"move","dx":true,"dy":0}"#,
        r#"{"phase":"move","dx":0}"#,
        "\u{0}\u{1}\u{2}",
    ];

    for input in inputs {
        assert!(decode(input).is_err(), "expected error for {input:?}");
    }
}

#[test]
fn test_decode_reports_not_an_object_for_scalars() {
    assert_eq!(decode("3.14"), Err(CodecError::NotAnObject));
    assert_eq!(decode("\"tap\""), Err(CodecError::NotAnObject));
}
