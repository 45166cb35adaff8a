#![cfg_attr(not(test), no_std)]

//! Attitude Tracker - lightweight orientation estimation for 6-axis IMUs
//!
//! Estimates the orientation of a rigid body from an accelerometer and a
//! gyroscope, and keeps a checksum-protected calibration profile so the
//! estimate starts bias-free after every power cycle.
//!
//! The pipeline for each sensor reading is:
//!
//! ```text
//! SampleSource ─► subtract offsets ─► SignalFilter ─► AttitudeEstimator ─► quaternion
//! ```
//!
//! # Features
//!
//! - Stationary bias calibration with progress reporting and variance diagnostics
//! - Fixed-window moving-average smoothing, no allocation
//! - Complementary filter fusing gyro integration with the gravity reference
//! - Versioned, XOR-checksummed calibration record on any byte-addressable medium
//! - ASCII telemetry lines and single-byte host commands
//! - `#![no_std]` compatible for embedded systems
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use attitude_tracker::{AttitudeEstimator, SignalFilter};
//!
//! let mut filter: SignalFilter = SignalFilter::new();
//! let mut estimator = AttitudeEstimator::new();
//!
//! // Sensor readings
//! let accelerometer = Vector3::new(0.0, 0.0, 1.0); // g
//! let gyroscope = Vector3::new(0.1, 0.2, 0.3);     // deg/s
//!
//! // Smooth, then update
//! let (accelerometer, gyroscope) = filter.smooth(accelerometer, gyroscope);
//! let quaternion = estimator.update(accelerometer, gyroscope, 0.01); // 10ms
//!
//! // Convert to Euler angles (roll, pitch, yaw)
//! let (roll, pitch, yaw) = quaternion.euler_angles();
//! ```
//!
//! For a complete control loop with calibration storage, see [`Session`].

mod calibration;
mod error;
mod estimator;
mod filter;
mod math;
pub mod record;
mod sensor;
mod session;
mod storage;
mod store;
pub mod telemetry;
mod types;

// Re-export all public types and functions
pub use calibration::{CalibrationEngine, CalibrationProfile, CalibrationProgress, CalibrationReport};
pub use error::{CalibrationError, InitError, LoadError, SaveError, TickError};
pub use estimator::AttitudeEstimator;
pub use filter::{CHANNEL_COUNT, Channel, SignalFilter};
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use sensor::SampleSource;
pub use session::{CommandOutcome, Recalibration, Session, TickOutput};
pub use storage::{MemoryStorage, MemoryStorageError, Storage};
pub use store::CalibrationStore;
pub use telemetry::{Command, CommandSource, HELP_TEXT};
pub use types::*;
