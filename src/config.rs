//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{ConsoleError, Result};
use crate::protocol::types::MAX_DATAGRAM_SIZE;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub link: LinkConfig,
    pub schedule: ScheduleConfig,
    pub control: ControlConfig,
    pub input: InputConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

/// Network endpoints configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_lander_addr")]
    pub lander_addr: String,

    #[serde(default = "default_dashboard_addr")]
    pub dashboard_addr: String,

    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,

    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
}

/// Periodic task configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_control_period_ms")]
    pub control_period_ms: u64,

    #[serde(default = "default_dashboard_period_ms")]
    pub dashboard_period_ms: u64,

    #[serde(default = "default_status_period_ms")]
    pub status_period_ms: u64,
}

/// Throttle computation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_boost_offset")]
    pub boost_offset: i32,

    #[serde(default = "default_clamp_throttle")]
    pub clamp_throttle: bool,
}

/// Where throttle, roll and boost come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// evdev gamepad / joystick
    Gamepad,
    /// Constant readings, no hardware
    Fixed,
}

/// Input sampler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_input_source")]
    pub source: InputSource,

    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_throttle_axis")]
    pub throttle_axis: String,

    #[serde(default = "default_roll_axis")]
    pub roll_axis: String,

    #[serde(default = "default_boost_button")]
    pub boost_button: String,

    #[serde(default = "default_axis_min")]
    pub axis_min: i32,

    #[serde(default = "default_axis_max")]
    pub axis_max: i32,

    #[serde(default = "default_invert_throttle")]
    pub invert_throttle: bool,

    #[serde(default = "default_fixed_throttle")]
    pub fixed_throttle: f32,

    #[serde(default = "default_fixed_roll")]
    pub fixed_roll: f32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path, empty for stderr only
    #[serde(default)]
    pub file: String,
}

/// Session lifecycle configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub auto_restart: bool,
}

// Default value functions
fn default_bind_addr() -> String { "0.0.0.0:0".to_string() }
fn default_lander_addr() -> String { "192.168.0.13:65200".to_string() }
fn default_dashboard_addr() -> String { "192.168.0.13:65300".to_string() }
fn default_recv_timeout_ms() -> u64 { 20 }
fn default_max_datagram_size() -> usize { MAX_DATAGRAM_SIZE }

fn default_control_period_ms() -> u64 { 50 }
fn default_dashboard_period_ms() -> u64 { 1000 }
fn default_status_period_ms() -> u64 { 500 }

fn default_boost_offset() -> i32 { 50 }
fn default_clamp_throttle() -> bool { true }

fn default_input_source() -> InputSource { InputSource::Gamepad }
fn default_throttle_axis() -> String { "ABS_Y".to_string() }
fn default_roll_axis() -> String { "ABS_Z".to_string() }
fn default_boost_button() -> String { "BTN_NORTH".to_string() }
fn default_axis_min() -> i32 { 0 }
fn default_axis_max() -> i32 { 255 }
fn default_invert_throttle() -> bool { true }
fn default_fixed_throttle() -> f32 { 0.0 }
fn default_fixed_roll() -> f32 { 0.5 }

fn default_log_level() -> String { "info".to_string() }

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            lander_addr: default_lander_addr(),
            dashboard_addr: default_dashboard_addr(),
            recv_timeout_ms: default_recv_timeout_ms(),
            max_datagram_size: default_max_datagram_size(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            control_period_ms: default_control_period_ms(),
            dashboard_period_ms: default_dashboard_period_ms(),
            status_period_ms: default_status_period_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            boost_offset: default_boost_offset(),
            clamp_throttle: default_clamp_throttle(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: default_input_source(),
            device_path: String::new(),
            throttle_axis: default_throttle_axis(),
            roll_axis: default_roll_axis(),
            boost_button: default_boost_button(),
            axis_min: default_axis_min(),
            axis_max: default_axis_max(),
            invert_throttle: default_invert_throttle(),
            fixed_throttle: default_fixed_throttle(),
            fixed_roll: default_fixed_roll(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl LinkConfig {
    /// Local address to bind the console socket to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        parse_endpoint("bind_addr", &self.bind_addr)
    }

    /// Lander peer address
    pub fn lander_addr(&self) -> Result<SocketAddr> {
        parse_endpoint("lander_addr", &self.lander_addr)
    }

    /// Dashboard peer address
    pub fn dashboard_addr(&self) -> Result<SocketAddr> {
        parse_endpoint("dashboard_addr", &self.dashboard_addr)
    }
}

fn parse_endpoint(name: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|_| ConsoleError::InvalidEndpoint(format!("{} = {:?} is not host:port", name, value)))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lander_console::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Endpoints must parse
        self.link.bind_addr()?;
        self.link.lander_addr()?;
        self.link.dashboard_addr()?;

        // Validate timing fields
        for (name, value) in [
            ("control_period_ms", self.schedule.control_period_ms),
            ("dashboard_period_ms", self.schedule.dashboard_period_ms),
            ("status_period_ms", self.schedule.status_period_ms),
        ] {
            if value == 0 || value > 60000 {
                return Err(invalid(format!("{} must be between 1 and 60000", name)));
            }
        }

        if self.link.recv_timeout_ms == 0 || self.link.recv_timeout_ms > 1000 {
            return Err(invalid("recv_timeout_ms must be between 1 and 1000"));
        }

        // A lander reply wait must fit inside one control cycle
        if self.link.recv_timeout_ms >= self.schedule.control_period_ms {
            return Err(invalid("recv_timeout_ms must be less than control_period_ms"));
        }

        if self.link.max_datagram_size < 64 || self.link.max_datagram_size > 65507 {
            return Err(invalid("max_datagram_size must be between 64 and 65507"));
        }

        if self.control.boost_offset < 0 || self.control.boost_offset > 100 {
            return Err(invalid("boost_offset must be between 0 and 100"));
        }

        // Validate input mapping
        if self.input.axis_min >= self.input.axis_max {
            return Err(invalid("axis_min must be less than axis_max"));
        }

        for (name, value) in [
            ("fixed_throttle", self.input.fixed_throttle),
            ("fixed_roll", self.input.fixed_roll),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be between 0.0 and 1.0", name)));
            }
        }

        if self.input.throttle_axis.is_empty() || self.input.roll_axis.is_empty() {
            return Err(invalid("throttle_axis and roll_axis cannot be empty"));
        }

        if self.input.boost_button.is_empty() {
            return Err(invalid("boost_button cannot be empty"));
        }

        // Validate log level
        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> ConsoleError {
    ConsoleError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.schedule.control_period_ms, 50);
        assert_eq!(config.schedule.dashboard_period_ms, 1000);
        assert_eq!(config.schedule.status_period_ms, 500);
        assert_eq!(config.link.lander_addr, "192.168.0.13:65200");
        assert_eq!(config.link.dashboard_addr, "192.168.0.13:65300");
        assert!(!config.session.auto_restart);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[link]
lander_addr = "10.0.0.2:65200"
dashboard_addr = "10.0.0.3:65300"
recv_timeout_ms = 30

[schedule]
control_period_ms = 40

[control]
clamp_throttle = false

[input]
source = "fixed"
fixed_throttle = 0.4

[logging]
level = "debug"

[session]
auto_restart = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.link.lander_addr().unwrap(), "10.0.0.2:65200".parse::<SocketAddr>().unwrap());
        assert_eq!(config.schedule.control_period_ms, 40);
        assert_eq!(config.schedule.status_period_ms, 500);
        assert!(!config.control.clamp_throttle);
        assert_eq!(config.input.source, InputSource::Fixed);
        assert_eq!(config.input.fixed_throttle, 0.4);
        assert!(config.session.auto_restart);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        match Config::load("/nonexistent/lander-console.toml") {
            Err(ConsoleError::Io(_)) => {}
            other => panic!("Expected Io error, got: {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        assert!(matches!(Config::from_toml("[link"), Err(ConsoleError::Config(_))));
    }

    #[test]
    fn test_unknown_input_source() {
        assert!(Config::from_toml("[input]\nsource = \"keyboard\"\n").is_err());
    }

    #[test]
    fn test_invalid_lander_addr() {
        let mut config = Config::default();
        config.link.lander_addr = "lander".to_string();
        assert!(matches!(config.validate(), Err(ConsoleError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_invalid_bind_addr() {
        let mut config = Config::default();
        config.link.bind_addr = "0.0.0.0".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_period_zero() {
        let mut config = Config::default();
        config.schedule.dashboard_period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_period_too_high() {
        let mut config = Config::default();
        config.schedule.status_period_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recv_timeout_zero() {
        let mut config = Config::default();
        config.link.recv_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recv_timeout_must_fit_control_period() {
        let mut config = Config::default();
        config.link.recv_timeout_ms = 50;
        assert!(config.validate().is_err());

        config.link.recv_timeout_ms = 49;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_datagram_size_bounds() {
        let mut config = Config::default();
        config.link.max_datagram_size = 63;
        assert!(config.validate().is_err());

        config.link.max_datagram_size = 65508;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_boost_offset_bounds() {
        let mut config = Config::default();
        config.control.boost_offset = -1;
        assert!(config.validate().is_err());

        config.control.boost_offset = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_axis_range_inverted() {
        let mut config = Config::default();
        config.input.axis_min = 255;
        config.input.axis_max = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_readings_out_of_range() {
        let mut config = Config::default();
        config.input.fixed_roll = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.fixed_throttle = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_boost_button() {
        let mut config = Config::default();
        config.input.boost_button = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_bind_addr(), "0.0.0.0:0");
        assert_eq!(default_recv_timeout_ms(), 20);
        assert_eq!(default_max_datagram_size(), 512);
        assert_eq!(default_boost_offset(), 50);
        assert!(default_clamp_throttle());
        assert_eq!(default_input_source(), InputSource::Gamepad);
        assert_eq!(default_throttle_axis(), "ABS_Y");
        assert_eq!(default_roll_axis(), "ABS_Z");
        assert_eq!(default_boost_button(), "BTN_NORTH");
        assert_eq!(default_axis_min(), 0);
        assert_eq!(default_axis_max(), 255);
        assert!(default_invert_throttle());
        assert_eq!(default_fixed_throttle(), 0.0);
        assert_eq!(default_fixed_roll(), 0.5);
        assert_eq!(default_log_level(), "info");
    }
}
