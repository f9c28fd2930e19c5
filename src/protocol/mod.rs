//! # Lander Protocol Module
//!
//! Text protocol shared by the console, the lander and the dashboard.
//!
//! This module handles:
//! - Control command encoding (throttle and roll, one datagram each)
//! - Telemetry decoding into partial state updates
//! - Dashboard frame encoding (one field per datagram)

pub mod types;
pub mod encoder;
pub mod decoder;
