//! Error types
//!
//! Only [`InitError`] is fatal. Every other failure is resolved where it
//! occurs and the tracker keeps running, calibrated or not.

use thiserror::Error;

/// Reasons a stored calibration record was not used
///
/// All variants are handled the same way: carry on as if the device was
/// never calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// The medium does not hold a calibration record
    #[error("no calibration record found")]
    NotFound,
    /// The record was written by an incompatible format version
    #[error("calibration record version {found} is not supported")]
    VersionMismatch {
        /// Version byte found on the medium
        found: u8,
    },
    /// Checksum or field validation failed
    #[error("calibration record is corrupted")]
    Corrupted,
    /// The medium could not be read
    #[error("calibration storage read failed")]
    ReadFailed,
}

/// Failure to persist a calibration record
///
/// The profile stays valid in memory for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveError {
    /// The medium rejected the write or commit
    #[error("calibration storage write failed")]
    WriteFailed,
}

/// Calibration run failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Zero samples requested, or every read failed
    #[error("calibration collected no samples")]
    NoSamples,
}

/// Fatal startup failure
///
/// There is no degraded mode without a verified sensor and storage path;
/// the firmware halts on any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// The sensor did not identify as expected
    #[error("sensor identity check failed")]
    SensorIdentity,
    /// The storage medium failed to initialise
    #[error("calibration storage failed to initialise")]
    Storage,
}

/// Skipped control-loop cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickError {
    /// The sensor read failed; state was left unchanged
    #[error("sensor read failed, cycle skipped")]
    SampleUnavailable,
}
