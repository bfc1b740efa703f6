//! JSON codec for [`GestureMessage`].
//!
//! Wire format: one JSON object per WebSocket text frame.
//!
//! ```text
//! {"phase":"start"|"move"|"tap","dx":<number>,"dy":<number>}
//! ```
//!
//! Decoding is strict: the text must be a JSON object, `phase` must be one of
//! the three names, and `dx`/`dy` must be JSON numbers.  Numeric strings are
//! not coerced.  Unknown extra fields are ignored.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{GestureMessage, GesturePhase};

/// Errors that can occur while encoding or decoding a gesture message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// The text is valid JSON but not an object.
    #[error("gesture message must be a JSON object")]
    NotAnObject,

    /// A field is missing, has the wrong type, or `phase` is not recognized.
    #[error("invalid gesture fields: {0}")]
    InvalidFields(String),

    /// `dx` or `dy` is NaN or infinite.
    #[error("displacement must be finite (dx={dx}, dy={dy})")]
    NonFinite { dx: f64, dy: f64 },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `{phase, dx, dy}` into wire text.
///
/// # Errors
///
/// Returns [`CodecError::NonFinite`] if either displacement is NaN or
/// infinite.  JSON has no representation for those values.
///
/// # Examples
///
/// ```rust
/// use touch_core::protocol::{decode, encode, GesturePhase};
///
/// let text = encode(GesturePhase::Move, 4.0, -2.5).unwrap();
/// let msg = decode(&text).unwrap();
/// assert_eq!(msg.phase, GesturePhase::Move);
/// assert_eq!((msg.dx, msg.dy), (4.0, -2.5));
/// ```
pub fn encode(phase: GesturePhase, dx: f64, dy: f64) -> Result<String, CodecError> {
    encode_message(&GestureMessage::new(phase, dx, dy))
}

/// Encodes an already-built [`GestureMessage`].
///
/// # Errors
///
/// Returns [`CodecError::NonFinite`] for NaN or infinite displacements.
pub fn encode_message(msg: &GestureMessage) -> Result<String, CodecError> {
    if !msg.is_finite() {
        return Err(CodecError::NonFinite {
            dx: msg.dx,
            dy: msg.dy,
        });
    }
    serde_json::to_string(msg).map_err(|e| CodecError::InvalidFields(e.to_string()))
}

/// Decodes wire text into a [`GestureMessage`].
///
/// Never panics.  Every malformed input maps to a [`CodecError`] so the
/// receiver can drop it without tearing down the connection.
///
/// # Errors
///
/// - [`CodecError::MalformedJson`] when the text does not parse.
/// - [`CodecError::NotAnObject`] for arrays, strings, numbers, `null`.
/// - [`CodecError::InvalidFields`] for missing fields, non-numeric `dx`/`dy`,
///   or an unknown `phase`.
/// - [`CodecError::NonFinite`] if a number overflowed to infinity.
pub fn decode(text: &str) -> Result<GestureMessage, CodecError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| CodecError::MalformedJson(e.to_string()))?;

    // A derived struct deserializer would also accept `["move",1,2]`; the
    // wire record is an object only.
    if !value.is_object() {
        return Err(CodecError::NotAnObject);
    }

    let msg = GestureMessage::deserialize(value)
        .map_err(|e| CodecError::InvalidFields(e.to_string()))?;

    if !msg.is_finite() {
        return Err(CodecError::NonFinite {
            dx: msg.dx,
            dy: msg.dy,
        });
    }
    Ok(msg)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
