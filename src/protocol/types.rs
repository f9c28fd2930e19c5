//! # Lander Protocol Constants and Types
//!
//! Core definitions for the newline-delimited `key:value` text protocol
//! spoken with the lander and the dashboard.

/// Largest datagram the console expects to exchange
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// Header line that opens every command sent to the lander
pub const COMMAND_PREFIX: &str = "command:!\n";

/// Outbound command keys
pub const KEY_THROTTLE: &str = "throttle";
pub const KEY_ROLL: &str = "roll";

/// Telemetry keys (lander -> console, console -> dashboard)
pub const KEY_ALTITUDE: &str = "altitude";
pub const KEY_FUEL: &str = "fuel";
pub const KEY_FLYING: &str = "flying";
pub const KEY_CRASHED: &str = "crashed";
pub const KEY_ORIENTATION: &str = "orientation";
pub const KEY_VX: &str = "Vx";
pub const KEY_VY: &str = "Vy";

/// Throttle range accepted by the lander (percent)
pub const THROTTLE_MIN: i32 = 0;
pub const THROTTLE_MAX: i32 = 100;

/// Throttle offset applied while boost is engaged
pub const DEFAULT_BOOST_OFFSET: i32 = 50;

/// Last-known lander state.
///
/// Fields are merged from [`TelemetryUpdate`]s; a field absent from an update
/// keeps its previous value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryState {
    pub altitude: f32,
    pub fuel: f32,
    pub flying: bool,
    pub crashed: bool,
    pub orientation: f32,
    pub vx: f32,
    pub vy: f32,
}

impl Default for TelemetryState {
    /// Conservative start: flying, not crashed, everything else zeroed.
    fn default() -> Self {
        Self {
            altitude: 0.0,
            fuel: 0.0,
            flying: true,
            crashed: false,
            orientation: 0.0,
            vx: 0.0,
            vy: 0.0,
        }
    }
}

impl TelemetryState {
    /// Merge a decoded update into this state, touching only the fields it carries.
    pub fn apply(&mut self, update: &TelemetryUpdate) {
        if let Some(altitude) = update.altitude {
            self.altitude = altitude;
        }
        if let Some(fuel) = update.fuel {
            self.fuel = fuel;
        }
        if let Some(flying) = update.flying {
            self.flying = flying;
        }
        if let Some(crashed) = update.crashed {
            self.crashed = crashed;
        }
        if let Some(orientation) = update.orientation {
            self.orientation = orientation;
        }
        if let Some(vx) = update.vx {
            self.vx = vx;
        }
        if let Some(vy) = update.vy {
            self.vy = vy;
        }
    }
}

/// A single recognised telemetry field with its parsed value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryField {
    Altitude(f32),
    Fuel(f32),
    Flying(bool),
    Crashed(bool),
    Orientation(f32),
    Vx(f32),
    Vy(f32),
}

/// Partial state decoded from one telemetry datagram
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryUpdate {
    pub altitude: Option<f32>,
    pub fuel: Option<f32>,
    pub flying: Option<bool>,
    pub crashed: Option<bool>,
    pub orientation: Option<f32>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,

    /// Lines dropped because they did not parse
    pub rejected_lines: usize,
}

impl TelemetryUpdate {
    /// Record a field; a later occurrence of the same key wins.
    pub fn set(&mut self, field: TelemetryField) {
        match field {
            TelemetryField::Altitude(v) => self.altitude = Some(v),
            TelemetryField::Fuel(v) => self.fuel = Some(v),
            TelemetryField::Flying(v) => self.flying = Some(v),
            TelemetryField::Crashed(v) => self.crashed = Some(v),
            TelemetryField::Orientation(v) => self.orientation = Some(v),
            TelemetryField::Vx(v) => self.vx = Some(v),
            TelemetryField::Vy(v) => self.vy = Some(v),
        }
    }

    /// True when no recognised field was decoded
    pub fn is_empty(&self) -> bool {
        self.altitude.is_none()
            && self.fuel.is_none()
            && self.flying.is_none()
            && self.crashed.is_none()
            && self.orientation.is_none()
            && self.vx.is_none()
            && self.vy.is_none()
    }
}

/// How sampled throttle turns into the commanded percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRules {
    /// Added to the sampled percentage while boost is engaged
    pub boost_offset: i32,
    /// Saturate the result to [`THROTTLE_MIN`]..=[`THROTTLE_MAX`]
    pub clamp: bool,
}

impl Default for ThrottleRules {
    fn default() -> Self {
        Self {
            boost_offset: DEFAULT_BOOST_OFFSET,
            clamp: true,
        }
    }
}

/// Control values sent to the lander each cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInput {
    pub throttle_percent: i32,
    /// -1.0 (full left) ..= 1.0 (full right)
    pub roll: f32,
    pub boost_engaged: bool,
}

impl ControlInput {
    /// Derive the control values for one cycle.
    ///
    /// `sampled_throttle` and `sampled_roll` are normalized readings in 0.0..=1.0.
    /// Throttle is forced to zero while the lander is crashed or out of fuel,
    /// whatever the boost state.
    ///
    /// # Examples
    ///
    /// ```
    /// use lander_console::protocol::types::{ControlInput, TelemetryState, ThrottleRules};
    ///
    /// let telemetry = TelemetryState { fuel: 80.0, ..TelemetryState::default() };
    /// let input = ControlInput::compute(0.25, 0.5, true, &telemetry, &ThrottleRules::default());
    /// assert_eq!(input.throttle_percent, 75);
    /// assert_eq!(input.roll, 0.0);
    /// ```
    pub fn compute(
        sampled_throttle: f32,
        sampled_roll: f32,
        boost_engaged: bool,
        telemetry: &TelemetryState,
        rules: &ThrottleRules,
    ) -> Self {
        // Truncation, not rounding
        let sampled_percent = (sampled_throttle.clamp(0.0, 1.0) * 100.0) as i32;

        let throttle = if telemetry.crashed || telemetry.fuel == 0.0 {
            0
        } else if boost_engaged {
            sampled_percent + rules.boost_offset
        } else {
            sampled_percent
        };

        let throttle_percent = if rules.clamp {
            throttle.clamp(THROTTLE_MIN, THROTTLE_MAX)
        } else {
            throttle
        };

        Self {
            throttle_percent,
            roll: -1.0 + 2.0 * sampled_roll.clamp(0.0, 1.0),
            boost_engaged,
        }
    }
}
