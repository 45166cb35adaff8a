//! Core types and settings for the attitude tracker

use nalgebra::Vector3;

/// Default moving-average window length (samples per channel)
pub const DEFAULT_WINDOW: usize = 8;

/// One raw reading from the inertial sensor
///
/// Produced by a [`SampleSource`](crate::SampleSource). Units follow the
/// sensor's natural output: acceleration in g, angular rate in degrees per
/// second, temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Accelerometer reading in g
    pub accelerometer: Vector3<f32>,
    /// Gyroscope reading in degrees per second
    pub gyroscope: Vector3<f32>,
    /// Die temperature in degrees Celsius
    pub temperature: f32,
    /// Seconds elapsed since the previous reading
    pub delta_time: f32,
}

impl RawSample {
    /// A sample from a device lying flat and still: 1 g on Z, no rotation
    pub fn at_rest(delta_time: f32) -> Self {
        Self {
            accelerometer: Vector3::new(0.0, 0.0, 1.0),
            gyroscope: Vector3::zeros(),
            temperature: 25.0,
            delta_time,
        }
    }
}

/// Attitude estimator settings
///
/// # Example
/// ```
/// use attitude_tracker::{AttitudeEstimator, EstimatorSettings};
///
/// let settings = EstimatorSettings {
///     gyro_weight: 0.98, // trust the gyroscope a little more
/// };
/// let estimator = AttitudeEstimator::with_settings(settings);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorSettings {
    /// Complementary filter weight given to the gyro-integrated quaternion
    ///
    /// The accelerometer reference receives `1.0 - gyro_weight`. Values close
    /// to 1.0 track fast motion well but correct drift slowly.
    pub gyro_weight: f32,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self { gyro_weight: 0.96 }
    }
}

/// Stationary calibration settings
///
/// # Example
/// ```
/// use attitude_tracker::CalibrationSettings;
///
/// let settings = CalibrationSettings {
///     sample_count: 2000,
///     ..Default::default()
/// };
/// assert_eq!(settings.report_interval, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSettings {
    /// Number of stationary samples averaged into the offsets
    pub sample_count: u32,
    /// Wait between samples in microseconds
    ///
    /// Should be no shorter than the sensor's output data period, otherwise
    /// the same reading is averaged several times.
    pub sample_interval_us: u32,
    /// Progress is reported every this many samples
    pub report_interval: u32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            sample_count: 1000,
            sample_interval_us: 3000,
            report_interval: 100,
        }
    }
}

/// Session settings
///
/// Groups everything the control loop needs to configure its components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Attitude estimator settings
    pub estimator: EstimatorSettings,
    /// Calibration settings used at startup and on request
    pub calibration: CalibrationSettings,
    /// Run a calibration pass during startup when no valid profile is stored
    pub calibrate_on_missing_profile: bool,
    /// Byte offset of the calibration record on the storage medium
    pub storage_offset: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            estimator: EstimatorSettings::default(),
            calibration: CalibrationSettings::default(),
            calibrate_on_missing_profile: true,
            storage_offset: 0,
        }
    }
}
