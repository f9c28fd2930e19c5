//! # Lander Telemetry Decoder
//!
//! Decodes lander telemetry datagrams into partial state updates.
//!
//! A datagram holds zero or more `key:value` lines separated by CR and/or LF.
//! Lines are handled independently: a malformed line is dropped and counted,
//! an unknown key is skipped, and every other line still applies.

use tracing::debug;

use super::types::*;
use crate::error::{ConsoleError, Result};

/// Decode one telemetry datagram
///
/// Never fails as a whole; see [`TelemetryUpdate::rejected_lines`] for the
/// number of lines that were dropped.
///
/// # Examples
///
/// ```
/// use lander_console::protocol::decoder::decode_telemetry;
///
/// let update = decode_telemetry(b"altitude:45\r\ngarbage\nVx:2.5\n");
/// assert_eq!(update.altitude, Some(45.0));
/// assert_eq!(update.vx, Some(2.5));
/// assert_eq!(update.rejected_lines, 1);
/// ```
pub fn decode_telemetry(datagram: &[u8]) -> TelemetryUpdate {
    let text = String::from_utf8_lossy(datagram);
    let mut update = TelemetryUpdate::default();

    for line in text.split(|c| c == '\r' || c == '\n') {
        if line.trim().is_empty() {
            continue;
        }

        match decode_line(line) {
            Ok(Some(field)) => update.set(field),
            Ok(None) => debug!("Ignoring unknown telemetry key in {:?}", line),
            Err(e) => {
                debug!("Dropping telemetry line: {}", e);
                update.rejected_lines += 1;
            }
        }
    }

    update
}

/// Decode a single telemetry line
///
/// # Returns
///
/// * `Ok(Some(field))` - recognised key with a valid value
/// * `Ok(None)` - well-formed line with an unknown key
///
/// # Errors
///
/// Returns `MalformedMessage` if:
/// - The line has no `:` separator
/// - The value does not parse for its key
pub fn decode_line(line: &str) -> Result<Option<TelemetryField>> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ConsoleError::MalformedMessage(format!("missing ':' in {:?}", line)))?;

    let key = key.trim();
    let value = value.trim();

    let field = match key {
        KEY_ALTITUDE => TelemetryField::Altitude(parse_float(key, value)?),
        KEY_FUEL => TelemetryField::Fuel(parse_float(key, value)?),
        KEY_FLYING => TelemetryField::Flying(parse_flag(key, value)?),
        KEY_CRASHED => TelemetryField::Crashed(parse_flag(key, value)?),
        KEY_ORIENTATION => TelemetryField::Orientation(parse_float(key, value)?),
        KEY_VX => TelemetryField::Vx(parse_float(key, value)?),
        KEY_VY => TelemetryField::Vy(parse_float(key, value)?),
        _ => return Ok(None),
    };

    Ok(Some(field))
}

fn parse_float(key: &str, value: &str) -> Result<f32> {
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ConsoleError::MalformedMessage(format!(
            "{} expects a number, got {:?}",
            key, value
        ))),
    }
}

/// Integer flag: exactly `0` or `1`
fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.parse::<i32>() {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        _ => Err(ConsoleError::MalformedMessage(format!(
            "{} expects 0 or 1, got {:?}",
            key, value
        ))),
    }
}
