//! # Lander Protocol Encoder
//!
//! Builds the outbound datagrams: control commands for the lander and
//! single-field telemetry frames for the dashboard.

use std::fmt::Display;

use super::types::*;

/// Encode the throttle command datagram
///
/// # Examples
///
/// ```
/// use lander_console::protocol::encoder::encode_throttle_command;
///
/// assert_eq!(encode_throttle_command(42), b"command:!\nthrottle:42".to_vec());
/// ```
pub fn encode_throttle_command(throttle_percent: i32) -> Vec<u8> {
    format!("{COMMAND_PREFIX}{KEY_THROTTLE}:{throttle_percent}").into_bytes()
}

/// Encode the roll command datagram (six decimal places)
pub fn encode_roll_command(roll: f32) -> Vec<u8> {
    format!("{COMMAND_PREFIX}{KEY_ROLL}:{roll:.6}").into_bytes()
}

/// Encode one control cycle as two independent datagrams: throttle, then roll.
///
/// Each datagram is self-contained; the lander may receive either without the other.
pub fn encode_control_commands(input: &ControlInput) -> [Vec<u8>; 2] {
    [
        encode_throttle_command(input.throttle_percent),
        encode_roll_command(input.roll),
    ]
}

/// Encode a single newline-terminated `key:value` dashboard frame
pub fn encode_dashboard_field(key: &str, value: impl Display) -> Vec<u8> {
    format!("{key}:{value}\n").into_bytes()
}

/// Encode the six dashboard frames for a telemetry snapshot.
///
/// Order: altitude, fuel, flying, orientation, Vx, Vy. Floats use the
/// shortest representation that reads back to the same value; `flying` is 0/1.
pub fn encode_dashboard_frames(state: &TelemetryState) -> [Vec<u8>; 6] {
    [
        encode_dashboard_field(KEY_ALTITUDE, state.altitude),
        encode_dashboard_field(KEY_FUEL, state.fuel),
        encode_dashboard_field(KEY_FLYING, u8::from(state.flying)),
        encode_dashboard_field(KEY_ORIENTATION, state.orientation),
        encode_dashboard_field(KEY_VX, state.vx),
        encode_dashboard_field(KEY_VY, state.vy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decoder::decode_telemetry;

    fn text(frame: &[u8]) -> &str {
        std::str::from_utf8(frame).unwrap()
    }

    #[test]
    fn test_throttle_command_format() {
        assert_eq!(text(&encode_throttle_command(0)), "command:!\nthrottle:0");
        assert_eq!(text(&encode_throttle_command(100)), "command:!\nthrottle:100");
    }

    #[test]
    fn test_throttle_command_unclamped_value() {
        assert_eq!(text(&encode_throttle_command(150)), "command:!\nthrottle:150");
    }

    #[test]
    fn test_roll_command_format() {
        assert_eq!(text(&encode_roll_command(0.5)), "command:!\nroll:0.500000");
        assert_eq!(text(&encode_roll_command(-1.0)), "command:!\nroll:-1.000000");
    }

    #[test]
    fn test_control_commands_are_two_datagrams_throttle_first() {
        let input = ControlInput {
            throttle_percent: 35,
            roll: -0.25,
            boost_engaged: false,
        };
        let [throttle, roll] = encode_control_commands(&input);
        assert_eq!(text(&throttle), "command:!\nthrottle:35");
        assert_eq!(text(&roll), "command:!\nroll:-0.250000");
    }

    #[test]
    fn test_command_fits_in_datagram() {
        let frame = encode_roll_command(f32::MIN);
        assert!(frame.len() <= MAX_DATAGRAM_SIZE);
    }

    #[test]
    fn test_dashboard_frames_order_and_format() {
        let state = TelemetryState {
            altitude: 45.0,
            fuel: 80.0,
            flying: true,
            crashed: false,
            orientation: 12.5,
            vx: 2.5,
            vy: -1.0,
        };
        let frames = encode_dashboard_frames(&state);
        let texts: Vec<&str> = frames.iter().map(|f| text(f)).collect();
        assert_eq!(
            texts,
            vec![
                "altitude:45\n",
                "fuel:80\n",
                "flying:1\n",
                "orientation:12.5\n",
                "Vx:2.5\n",
                "Vy:-1\n",
            ]
        );
    }

    #[test]
    fn test_dashboard_flying_flag_as_integer() {
        let state = TelemetryState {
            flying: false,
            ..TelemetryState::default()
        };
        assert_eq!(text(&encode_dashboard_frames(&state)[2]), "flying:0\n");
    }

    #[test]
    fn test_dashboard_excludes_crashed() {
        let frames = encode_dashboard_frames(&TelemetryState::default());
        assert!(frames.iter().all(|f| !text(f).starts_with("crashed:")));
    }

    #[test]
    fn test_altitude_reencodes_to_same_value() {
        let mut state = TelemetryState::default();
        state.apply(&decode_telemetry(b"altitude:37.5"));

        let frame = encode_dashboard_frames(&state)[0].clone();
        let mut echoed = TelemetryState::default();
        echoed.apply(&decode_telemetry(&frame));

        assert!((echoed.altitude - 37.5).abs() < f32::EPSILON);
    }
}
