//! JSON codec for input events
//!
//! Decoding reads `DeviceType` first and only then deserializes the matching
//! variant, so an unknown device fails loudly instead of being skipped.

use crate::events::{DeviceType, InputEvent, KeyboardEvent, MouseEvent, RecordingMode};
use inputsim_core::{Error, Result};
use serde_json::Value;
use tracing::warn;

/// Field carrying the variant discriminator
pub const DEVICE_TYPE_FIELD: &str = "DeviceType";

/// Log framing, shared with the incremental writer in `storage`
pub const LOG_OPEN: &str = "[\n";
pub const LOG_SEPARATOR: &str = ",\n";
pub const LOG_CLOSE: &str = "\n]";

/// Encode one event as a single-line JSON object
pub fn encode(event: &InputEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

/// Encode a sequence in the same layout the recorder writes incrementally
pub fn encode_all(events: &[InputEvent]) -> Result<String> {
    let mut out = String::from(LOG_OPEN);
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            out.push_str(LOG_SEPARATOR);
        }
        out.push_str(&encode(event)?);
    }
    out.push_str(LOG_CLOSE);
    Ok(out)
}

/// Decode a single event object
pub fn decode(text: &str) -> Result<InputEvent> {
    let value: Value = serde_json::from_str(text)?;
    decode_value(value)
}

/// Decode a JSON array of events. Any bad element fails the whole log.
pub fn decode_all(text: &str) -> Result<Vec<InputEvent>> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(Error::decode("Event log is not a JSON array"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            decode_value(item).map_err(|e| {
                let message = format!("event #{}: {}", i, e.message);
                Error { message, ..e }
            })
        })
        .collect()
}

pub fn decode_value(value: Value) -> Result<InputEvent> {
    let tag = match value.get(DEVICE_TYPE_FIELD) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(Error::decode(format!(
                "{} must be a string, got {}",
                DEVICE_TYPE_FIELD, other
            )))
        }
        None => {
            return Err(Error::decode(format!(
                "Missing {} discriminator",
                DEVICE_TYPE_FIELD
            )))
        }
    };

    match DeviceType::parse(&tag) {
        Some(DeviceType::Keyboard) => {
            Ok(InputEvent::Keyboard(serde_json::from_value::<KeyboardEvent>(value)?))
        }
        Some(DeviceType::Mouse) => Ok(InputEvent::Mouse(serde_json::from_value::<MouseEvent>(value)?)),
        None => Err(Error::unknown_variant(&tag)),
    }
}

/// Check the invariants a loaded log must hold and report its mode.
///
/// Returns `None` for an empty log. Mixed framed/unframed events and
/// decreasing frame ids are rejected; decreasing timestamps only warn.
pub fn validate_log(events: &[InputEvent]) -> Result<Option<RecordingMode>> {
    let Some(first) = events.first() else {
        return Ok(None);
    };
    let mode = if first.frame_id().is_some() {
        RecordingMode::Frame
    } else {
        RecordingMode::Continuous
    };

    let mut warned = false;
    for (i, pair) in events.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);

        match (prev.frame_id(), next.frame_id()) {
            (Some(a), Some(b)) if b < a => {
                return Err(Error::decode(format!(
                    "event #{}: FrameId {} after {} (frame ids must not decrease)",
                    i + 1,
                    b,
                    a
                )))
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::decode(format!(
                    "event #{}: log mixes framed and unframed events",
                    i + 1
                )))
            }
            _ => {}
        }

        if next.timestamp() < prev.timestamp() && !warned {
            warn!(
                index = i + 1,
                "Input log timestamps decrease ({} after {})",
                next.timestamp(),
                prev.timestamp()
            );
            warned = true;
        }
    }

    Ok(Some(mode))
}
