//! # Input Module
//!
//! Sources of the operator's throttle, roll and boost inputs.
//!
//! This module handles:
//! - Normalized analog readings (0.0..=1.0) for throttle and roll
//! - The boost toggle, driven by rise/fall edge events
//! - Choosing a gamepad or fixed sampler from configuration

pub mod gamepad;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::config::{InputConfig, InputSource};

/// Source of normalized analog readings
///
/// Both methods return a value in 0.0..=1.0.
#[cfg_attr(test, mockall::automock)]
pub trait InputSampler: Send {
    fn sample_throttle(&self) -> f32;
    fn sample_roll(&self) -> f32;
}

/// Boost toggle state shared between the edge source and the control exchange
///
/// Rising edge engages boost, falling edge disengages it. The state is a single
/// atomic flag, so edges may arrive from any thread at any time.
///
/// # Examples
///
/// ```
/// use lander_console::input::BoostSwitch;
///
/// let boost = BoostSwitch::new();
/// let button = boost.clone();
/// button.rise();
/// assert!(boost.is_engaged());
/// button.fall();
/// assert!(!boost.is_engaged());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BoostSwitch {
    engaged: Arc<AtomicBool>,
}

impl BoostSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rising edge: engage boost
    pub fn rise(&self) {
        self.engaged.store(true, Ordering::Release);
    }

    /// Falling edge: disengage boost
    pub fn fall(&self) {
        self.engaged.store(false, Ordering::Release);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }
}

/// Sampler returning constant readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedInput {
    throttle: f32,
    roll: f32,
}

impl FixedInput {
    pub fn new(throttle: f32, roll: f32) -> Self {
        Self {
            throttle: throttle.clamp(0.0, 1.0),
            roll: roll.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.fixed_throttle, config.fixed_roll)
    }
}

impl InputSampler for FixedInput {
    fn sample_throttle(&self) -> f32 {
        self.throttle
    }

    fn sample_roll(&self) -> f32 {
        self.roll
    }
}

/// Build the sampler selected by configuration
///
/// A gamepad that cannot be opened is not fatal: the console falls back to
/// the fixed readings so the session can still run.
pub fn open_sampler(config: &InputConfig, boost: BoostSwitch) -> Box<dyn InputSampler> {
    match config.source {
        InputSource::Fixed => Box::new(FixedInput::from_config(config)),
        InputSource::Gamepad => match gamepad::GamepadInput::open(config, boost) {
            Ok(pad) => Box::new(pad),
            Err(e) => {
                warn!("Gamepad unavailable ({}), using fixed input readings", e);
                Box::new(FixedInput::from_config(config))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_boost_starts_disengaged() {
        assert!(!BoostSwitch::new().is_engaged());
    }

    #[test]
    fn test_last_edge_wins() {
        let boost = BoostSwitch::new();
        boost.rise();
        boost.rise();
        boost.fall();
        assert!(!boost.is_engaged());
        boost.rise();
        assert!(boost.is_engaged());
    }

    #[test]
    fn test_edges_from_another_thread() {
        let boost = BoostSwitch::new();
        let button = boost.clone();
        thread::spawn(move || button.rise()).join().unwrap();
        assert!(boost.is_engaged());
    }

    #[test]
    fn test_fixed_input_clamps_readings() {
        let input = FixedInput::new(1.5, -0.2);
        assert_eq!(input.sample_throttle(), 1.0);
        assert_eq!(input.sample_roll(), 0.0);
    }

    #[test]
    fn test_open_fixed_sampler() {
        let config = InputConfig {
            source: InputSource::Fixed,
            fixed_throttle: 0.25,
            fixed_roll: 0.75,
            ..InputConfig::default()
        };
        let sampler = open_sampler(&config, BoostSwitch::new());
        assert_eq!(sampler.sample_throttle(), 0.25);
        assert_eq!(sampler.sample_roll(), 0.75);
    }

    #[test]
    fn test_missing_gamepad_falls_back_to_fixed() {
        let config = InputConfig {
            source: InputSource::Gamepad,
            device_path: "/dev/input/nonexistent_event_device".to_string(),
            fixed_throttle: 0.1,
            ..InputConfig::default()
        };
        let sampler = open_sampler(&config, BoostSwitch::new());
        assert_eq!(sampler.sample_throttle(), 0.1);
        assert_eq!(sampler.sample_roll(), 0.5);
    }
}
