//! # Gamepad Input Module
//!
//! Reads throttle, roll and the boost button from a Linux evdev gamepad or
//! joystick.
//!
//! ## Default Mapping
//!
//! | Input | evdev Code | Use |
//! |-------|------------|-----|
//! | Left Stick Y | ABS_Y | Throttle (inverted: stick up = full throttle) |
//! | Right Stick X | ABS_Z | Roll |
//! | Triangle / North | BTN_NORTH | Boost (press = rise, release = fall) |
//!
//! Events are read on a dedicated blocking thread. Axis readings are kept as
//! atomics so the control exchange can sample them without locking; button
//! edges go straight to the shared [`BoostSwitch`].

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind, Key};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{BoostSwitch, InputSampler};
use crate::config::InputConfig;
use crate::error::{ConsoleError, Result};

/// Throttle reading while no event has arrived (idle)
const NEUTRAL_THROTTLE: f32 = 0.0;

/// Roll reading while no event has arrived (centered)
const NEUTRAL_ROLL: f32 = 0.5;

/// Key event values
const KEY_RELEASED: i32 = 0;
const KEY_PRESSED: i32 = 1;

/// Look up an absolute axis by its evdev name (e.g. `"ABS_Y"`)
pub fn parse_axis(name: &str) -> Option<AbsoluteAxisType> {
    let axis = match name {
        "ABS_X" => AbsoluteAxisType::ABS_X,
        "ABS_Y" => AbsoluteAxisType::ABS_Y,
        "ABS_Z" => AbsoluteAxisType::ABS_Z,
        "ABS_RX" => AbsoluteAxisType::ABS_RX,
        "ABS_RY" => AbsoluteAxisType::ABS_RY,
        "ABS_RZ" => AbsoluteAxisType::ABS_RZ,
        "ABS_THROTTLE" => AbsoluteAxisType::ABS_THROTTLE,
        "ABS_RUDDER" => AbsoluteAxisType::ABS_RUDDER,
        "ABS_WHEEL" => AbsoluteAxisType::ABS_WHEEL,
        "ABS_GAS" => AbsoluteAxisType::ABS_GAS,
        "ABS_BRAKE" => AbsoluteAxisType::ABS_BRAKE,
        _ => return None,
    };
    Some(axis)
}

/// Look up a button by its evdev name (e.g. `"BTN_NORTH"`)
pub fn parse_button(name: &str) -> Option<Key> {
    let key = match name {
        "BTN_SOUTH" => Key::BTN_SOUTH,
        "BTN_EAST" => Key::BTN_EAST,
        "BTN_NORTH" => Key::BTN_NORTH,
        "BTN_WEST" => Key::BTN_WEST,
        "BTN_TL" => Key::BTN_TL,
        "BTN_TR" => Key::BTN_TR,
        "BTN_TL2" => Key::BTN_TL2,
        "BTN_TR2" => Key::BTN_TR2,
        "BTN_SELECT" => Key::BTN_SELECT,
        "BTN_START" => Key::BTN_START,
        "BTN_MODE" => Key::BTN_MODE,
        "BTN_THUMBL" => Key::BTN_THUMBL,
        "BTN_THUMBR" => Key::BTN_THUMBR,
        "BTN_TRIGGER" => Key::BTN_TRIGGER,
        "BTN_THUMB" => Key::BTN_THUMB,
        _ => return None,
    };
    Some(key)
}

/// Which evdev codes drive the console inputs, and their raw range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMapping {
    pub throttle_axis: AbsoluteAxisType,
    pub roll_axis: AbsoluteAxisType,
    pub boost_button: Key,
    pub axis_min: i32,
    pub axis_max: i32,
    pub invert_throttle: bool,
}

impl AxisMapping {
    /// Resolve the configured code names
    ///
    /// # Errors
    ///
    /// Returns `Input` error if an axis or button name is unknown, or if the
    /// raw range is empty
    pub fn from_config(config: &InputConfig) -> Result<Self> {
        if config.axis_min >= config.axis_max {
            return Err(ConsoleError::Input(format!(
                "Empty axis range: axis_min {} must be less than axis_max {}",
                config.axis_min, config.axis_max
            )));
        }

        let throttle_axis = parse_axis(&config.throttle_axis)
            .ok_or_else(|| ConsoleError::Input(format!("Unknown axis: {}", config.throttle_axis)))?;
        let roll_axis = parse_axis(&config.roll_axis)
            .ok_or_else(|| ConsoleError::Input(format!("Unknown axis: {}", config.roll_axis)))?;
        let boost_button = parse_button(&config.boost_button)
            .ok_or_else(|| ConsoleError::Input(format!("Unknown button: {}", config.boost_button)))?;

        Ok(Self {
            throttle_axis,
            roll_axis,
            boost_button,
            axis_min: config.axis_min,
            axis_max: config.axis_max,
            invert_throttle: config.invert_throttle,
        })
    }

    /// Scale a raw axis value to 0.0..=1.0
    #[inline]
    pub fn normalize(&self, raw: i32) -> f32 {
        let span = (self.axis_max - self.axis_min) as f32;
        ((raw - self.axis_min) as f32 / span).clamp(0.0, 1.0)
    }

    fn supported_by(&self, device: &Device) -> bool {
        let axes_ok = device.supported_absolute_axes().map_or(false, |axes| {
            axes.contains(self.throttle_axis) && axes.contains(self.roll_axis)
        });
        let button_ok = device
            .supported_keys()
            .map_or(false, |keys| keys.contains(self.boost_button));
        axes_ok && button_ok
    }
}

/// Latest normalized axis readings, stored as f32 bit patterns
#[derive(Debug)]
struct AxisReadings {
    throttle: AtomicU32,
    roll: AtomicU32,
}

impl AxisReadings {
    fn new() -> Self {
        Self {
            throttle: AtomicU32::new(NEUTRAL_THROTTLE.to_bits()),
            roll: AtomicU32::new(NEUTRAL_ROLL.to_bits()),
        }
    }

    fn throttle(&self) -> f32 {
        f32::from_bits(self.throttle.load(Ordering::Relaxed))
    }

    fn roll(&self) -> f32 {
        f32::from_bits(self.roll.load(Ordering::Relaxed))
    }

    fn set_throttle(&self, value: f32) {
        self.throttle.store(value.to_bits(), Ordering::Relaxed);
    }

    fn set_roll(&self, value: f32) {
        self.roll.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Routes raw evdev events to axis readings and boost edges
#[derive(Debug)]
pub struct EventRouter {
    mapping: AxisMapping,
    readings: Arc<AxisReadings>,
    boost: BoostSwitch,
}

impl EventRouter {
    fn new(mapping: AxisMapping, readings: Arc<AxisReadings>, boost: BoostSwitch) -> Self {
        Self {
            mapping,
            readings,
            boost,
        }
    }

    /// Processes a single evdev input event
    ///
    /// Events for unmapped codes are ignored, as are key auto-repeats.
    pub fn process_event(&self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) if axis == self.mapping.throttle_axis => {
                let value = self.mapping.normalize(event.value());
                let value = if self.mapping.invert_throttle { 1.0 - value } else { value };
                self.readings.set_throttle(value);
            }
            InputEventKind::AbsAxis(axis) if axis == self.mapping.roll_axis => {
                self.readings.set_roll(self.mapping.normalize(event.value()));
            }
            InputEventKind::Key(key) if key == self.mapping.boost_button => match event.value() {
                KEY_PRESSED => self.boost.rise(),
                KEY_RELEASED => self.boost.fall(),
                _ => {}
            },
            _ => {}
        }
    }

    /// Return every input to neutral (device lost)
    fn release(&self) {
        self.readings.set_throttle(NEUTRAL_THROTTLE);
        self.readings.set_roll(NEUTRAL_ROLL);
        self.boost.fall();
    }
}

/// Gamepad-backed [`InputSampler`]
pub struct GamepadInput {
    readings: Arc<AxisReadings>,
    device_path: String,
    name: Option<String>,
}

impl std::fmt::Debug for GamepadInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadInput")
            .field("device_path", &self.device_path)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl GamepadInput {
    /// Open the configured gamepad and start reading its events
    ///
    /// With an empty `device_path`, scans `/dev/input/event*` for the first
    /// device exposing both mapped axes and the boost button.
    ///
    /// # Errors
    ///
    /// - `Input`: unknown code name, or the device cannot be opened
    /// - `InputDeviceNotFound`: auto-detection found no suitable device
    /// - `Io`: the reader thread could not be spawned
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lander_console::config::InputConfig;
    /// use lander_console::input::gamepad::GamepadInput;
    /// use lander_console::input::BoostSwitch;
    ///
    /// let pad = GamepadInput::open(&InputConfig::default(), BoostSwitch::new())?;
    /// println!("Reading input from {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &InputConfig, boost: BoostSwitch) -> Result<Self> {
        let mapping = AxisMapping::from_config(config)?;

        let (device, device_path) = if config.device_path.is_empty() {
            find_device(&mapping)?
        } else {
            let device = Device::open(&config.device_path).map_err(|e| {
                ConsoleError::Input(format!("Failed to open {}: {}", config.device_path, e))
            })?;
            (device, config.device_path.clone())
        };

        let name = device.name().map(str::to_string);
        info!(
            "Gamepad input from {} ({})",
            device_path,
            name.as_deref().unwrap_or("unnamed device")
        );

        let readings = Arc::new(AxisReadings::new());
        let router = EventRouter::new(mapping, Arc::clone(&readings), boost);

        std::thread::Builder::new()
            .name("gamepad-input".into())
            .spawn(move || read_events(device, router))?;

        Ok(Self {
            readings,
            device_path,
            name,
        })
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl InputSampler for GamepadInput {
    fn sample_throttle(&self) -> f32 {
        self.readings.throttle()
    }

    fn sample_roll(&self) -> f32 {
        self.readings.roll()
    }
}

/// Blocking event loop; ends when the device goes away
fn read_events(mut device: Device, router: EventRouter) {
    loop {
        match device.fetch_events() {
            Ok(events) => {
                for event in events {
                    router.process_event(&event);
                }
            }
            Err(e) => {
                warn!("Gamepad read failed ({}), inputs returned to neutral", e);
                router.release();
                return;
            }
        }
    }
}

fn find_device(mapping: &AxisMapping) -> Result<(Device, String)> {
    let input_dir = Path::new("/dev/input");

    let mut entries: Vec<_> = std::fs::read_dir(input_dir)
        .map_err(|e| ConsoleError::Input(format!("Failed to read /dev/input: {}", e)))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"))
        })
        .collect();

    // Deterministic choice when several devices qualify
    entries.sort();

    for path in entries {
        match Device::open(&path) {
            Ok(device) if mapping.supported_by(&device) => {
                return Ok((device, path.to_string_lossy().to_string()));
            }
            Ok(device) => {
                debug!(
                    "Skipping {} ({}): mapped axes or button missing",
                    path.display(),
                    device.name().unwrap_or("unnamed")
                );
            }
            Err(e) => debug!("Could not open {}: {}", path.display(), e),
        }
    }

    Err(ConsoleError::InputDeviceNotFound)
}
