//! # Presentation Module
//!
//! One-way sinks for everything the operator sees or hears: the control
//! readout, the audio proximity tone, the flight/crashed indicator lights and
//! the end-of-session banner. The console never reads these back.

use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::protocol::types::ControlInput;
use crate::session::SessionOutcome;

/// Proximity tone frequency (Hz)
pub const TONE_FREQUENCY_HZ: u32 = 3000;

/// Proximity tone duty cycle
pub const TONE_DUTY: f32 = 0.5;

/// Altitude above which the proximity tone is silent
pub const TONE_CEILING: f32 = 100.0;

/// Audio feedback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Silent
    Mute,
    /// Proximity tone at [`TONE_FREQUENCY_HZ`]
    On,
}

impl AudioCue {
    /// Tone only while the lander is airborne and close to the ground: 0 < altitude <= 100.
    pub fn for_altitude(altitude: f32) -> Self {
        if altitude > TONE_CEILING || altitude <= 0.0 {
            AudioCue::Mute
        } else {
            AudioCue::On
        }
    }
}

/// Indicator light pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorPattern {
    /// Green on, red off
    Flight,
    /// Red on, green off
    Crashed,
}

impl IndicatorPattern {
    pub fn for_crashed(crashed: bool) -> Self {
        if crashed {
            IndicatorPattern::Crashed
        } else {
            IndicatorPattern::Flight
        }
    }

    /// (red, green) lamp states
    pub fn lamps(self) -> (bool, bool) {
        match self {
            IndicatorPattern::Flight => (false, true),
            IndicatorPattern::Crashed => (true, false),
        }
    }
}

/// Sink for operator-facing output
#[cfg_attr(test, mockall::automock)]
pub trait Presentation: Send + Sync {
    /// Control values computed this cycle
    fn show_controls(&self, input: &ControlInput);

    fn audio(&self, cue: AudioCue);

    fn indicator(&self, pattern: IndicatorPattern);

    /// Terminal banner; called once per session
    fn show_outcome(&self, outcome: SessionOutcome);
}

/// [`Presentation`] that renders to the log
///
/// Audio and indicator changes are logged once per change rather than once
/// per telemetry datagram.
#[derive(Debug, Default)]
pub struct LogPresentation {
    last_audio: Mutex<Option<AudioCue>>,
    last_indicator: Mutex<Option<IndicatorPattern>>,
}

impl LogPresentation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presentation for LogPresentation {
    fn show_controls(&self, input: &ControlInput) {
        debug!(
            "Throttle: {} Roll: {:.2} Boost: {}",
            input.throttle_percent,
            input.roll,
            if input.boost_engaged { "ON" } else { "OFF" }
        );
    }

    fn audio(&self, cue: AudioCue) {
        let mut last = self.last_audio.lock().unwrap_or_else(PoisonError::into_inner);
        if last.replace(cue) != Some(cue) {
            match cue {
                AudioCue::On => info!("Proximity tone on ({} Hz, {:.0}% duty)", TONE_FREQUENCY_HZ, TONE_DUTY * 100.0),
                AudioCue::Mute => info!("Proximity tone muted"),
            }
        }
    }

    fn indicator(&self, pattern: IndicatorPattern) {
        let mut last = self.last_indicator.lock().unwrap_or_else(PoisonError::into_inner);
        if last.replace(pattern) != Some(pattern) {
            let (red, green) = pattern.lamps();
            info!(
                "Indicator: {:?} (red {}, green {})",
                pattern,
                if red { "on" } else { "off" },
                if green { "on" } else { "off" }
            );
        }
    }

    fn show_outcome(&self, outcome: SessionOutcome) {
        for line in outcome.banner() {
            info!("{}", line);
        }
    }
}
