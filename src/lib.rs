//! # Lander Console Library
//!
//! Fly the lander simulation from a gamepad over UDP.
//!
//! This library provides the controller side of the lander game: it turns
//! operator inputs into throttle and roll commands, folds the lander's
//! key:value telemetry into a shared snapshot, republishes that snapshot to a
//! dashboard, and decides when a session has ended in a crash or a landing.

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod link;
pub mod presentation;
pub mod protocol;
pub mod session;
pub mod telemetry;
