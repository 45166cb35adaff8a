//! Stationary bias calibration
//!
//! The device is held still and level while a batch of raw readings is
//! averaged. Whatever the gyroscope reports at rest is its bias; whatever the
//! accelerometer reports beyond 1 g on Z is its bias.
//!
//! # Example
//! ```
//! use attitude_tracker::{CalibrationEngine, CalibrationSettings, RawSample, SampleSource, SignalFilter};
//! use embedded_hal::delay::DelayNs;
//!
//! struct Bench;
//! impl SampleSource for Bench {
//!     type Error = ();
//!     fn verify(&mut self) -> Result<(), ()> { Ok(()) }
//!     fn read(&mut self) -> Result<RawSample, ()> {
//!         let mut sample = RawSample::at_rest(0.01);
//!         sample.gyroscope.x = 0.5;
//!         Ok(sample)
//!     }
//! }
//!
//! struct NoDelay;
//! impl DelayNs for NoDelay {
//!     fn delay_ns(&mut self, _ns: u32) {}
//! }
//!
//! let engine = CalibrationEngine::with_settings(CalibrationSettings {
//!     sample_count: 200,
//!     ..Default::default()
//! });
//! let mut filter: SignalFilter = SignalFilter::new();
//! let report = engine
//!     .calibrate(&mut Bench, &mut NoDelay, &mut filter, |_| {})
//!     .unwrap();
//!
//! assert!(report.profile.calibrated);
//! assert!((report.profile.gyro_offset.x - 0.5).abs() < 1e-6);
//! ```

use embedded_hal::delay::DelayNs;
use nalgebra::Vector3;

use crate::error::CalibrationError;
use crate::filter::SignalFilter;
use crate::sensor::SampleSource;
use crate::types::CalibrationSettings;

/// Expected Z reading of a level, stationary accelerometer in g
const GRAVITY_Z: f32 = 1.0;

/// Additive sensor offsets measured at rest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    /// Accelerometer offset in g
    pub accel_offset: Vector3<f32>,
    /// Gyroscope offset in degrees per second
    pub gyro_offset: Vector3<f32>,
    /// Whether the offsets come from a completed calibration run
    pub calibrated: bool,
    /// Mean die temperature during the run in degrees Celsius
    pub temperature_reference: f32,
}

impl CalibrationProfile {
    /// Profile with zero offsets, as used before any calibration exists
    pub fn uncalibrated() -> Self {
        Self {
            accel_offset: Vector3::zeros(),
            gyro_offset: Vector3::zeros(),
            calibrated: false,
            temperature_reference: 0.0,
        }
    }

    /// Subtract the offsets from a raw reading
    ///
    /// Returns `(accelerometer, gyroscope)`.
    pub fn apply(
        &self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
    ) -> (Vector3<f32>, Vector3<f32>) {
        (accelerometer - self.accel_offset, gyroscope - self.gyro_offset)
    }
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::uncalibrated()
    }
}

/// Progress notification emitted while calibrating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationProgress {
    /// Iterations finished so far, failed reads included
    pub completed: u32,
    /// Iterations requested
    pub total: u32,
}

/// Result of a calibration run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationReport {
    /// The new profile
    pub profile: CalibrationProfile,
    /// Per-axis accelerometer variance in g² (diagnostic only)
    pub accel_variance: Vector3<f32>,
    /// Per-axis gyroscope variance in (deg/s)² (diagnostic only)
    pub gyro_variance: Vector3<f32>,
    /// Samples that contributed to the averages
    pub samples_used: u32,
    /// Reads that failed and were skipped
    pub samples_failed: u32,
}

/// Running sums for one sensor
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum: Vector3<f64>,
    sum_squares: Vector3<f64>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            sum: Vector3::zeros(),
            sum_squares: Vector3::zeros(),
        }
    }

    fn add(&mut self, value: Vector3<f32>) {
        let value = value.cast::<f64>();
        self.sum += value;
        self.sum_squares += value.component_mul(&value);
    }

    fn mean(&self, count: u32) -> Vector3<f32> {
        (self.sum / f64::from(count)).cast::<f32>()
    }

    fn variance(&self, count: u32) -> Vector3<f32> {
        let n = f64::from(count);
        let mean = self.sum / n;
        (self.sum_squares / n - mean.component_mul(&mean))
            .map(|v| v.max(0.0))
            .cast::<f32>()
    }
}

/// Stationary calibration procedure
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrationEngine {
    settings: CalibrationSettings,
}

impl CalibrationEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::with_settings(CalibrationSettings::default())
    }

    /// Create an engine with specified settings
    pub fn with_settings(settings: CalibrationSettings) -> Self {
        Self { settings }
    }

    /// Get current settings
    pub fn settings(&self) -> CalibrationSettings {
        self.settings
    }

    /// Measure offsets from [`sample_count`](CalibrationSettings::sample_count)
    /// stationary readings
    ///
    /// Blocks for roughly `sample_count * sample_interval_us`. The filter is
    /// zeroed first so stale history cannot leak into later estimates, but
    /// the offsets themselves are computed from unfiltered readings. Failed
    /// reads are skipped and counted.
    ///
    /// # Errors
    /// [`CalibrationError::NoSamples`] when `sample_count` is zero or no read
    /// succeeded.
    pub fn calibrate<S, D, F, const N: usize>(
        &self,
        source: &mut S,
        delay: &mut D,
        filter: &mut SignalFilter<N>,
        mut progress: F,
    ) -> Result<CalibrationReport, CalibrationError>
    where
        S: SampleSource,
        D: DelayNs,
        F: FnMut(CalibrationProgress),
    {
        let sample_count = self.settings.sample_count;
        if sample_count == 0 {
            log::error!("calibration requested with zero samples");
            return Err(CalibrationError::NoSamples);
        }

        log::info!("calibration started: {} samples, keep the device still and level", sample_count);
        filter.reset();

        let mut accel = Accumulator::new();
        let mut gyro = Accumulator::new();
        let mut temperature_sum = 0.0f64;
        let mut used = 0u32;
        let mut failed = 0u32;

        for completed in 1..=sample_count {
            match source.read() {
                Ok(sample) => {
                    accel.add(sample.accelerometer);
                    gyro.add(sample.gyroscope);
                    temperature_sum += f64::from(sample.temperature);
                    used += 1;
                }
                Err(e) => {
                    log::warn!("calibration read failed: {:?}", e);
                    failed += 1;
                }
            }

            let interval = self.settings.report_interval;
            if (interval > 0 && completed % interval == 0) || completed == sample_count {
                log::debug!("calibration progress: {}/{}", completed, sample_count);
                progress(CalibrationProgress {
                    completed,
                    total: sample_count,
                });
            }

            delay.delay_us(self.settings.sample_interval_us);
        }

        if used == 0 {
            log::error!("calibration failed: all {} reads failed", failed);
            return Err(CalibrationError::NoSamples);
        }

        let mut accel_offset = accel.mean(used);
        accel_offset.z -= GRAVITY_Z;

        let report = CalibrationReport {
            profile: CalibrationProfile {
                accel_offset,
                gyro_offset: gyro.mean(used),
                calibrated: true,
                temperature_reference: (temperature_sum / f64::from(used)) as f32,
            },
            accel_variance: accel.variance(used),
            gyro_variance: gyro.variance(used),
            samples_used: used,
            samples_failed: failed,
        };

        log::info!(
            "calibration complete: accel offset ({:.4}, {:.4}, {:.4}) g, gyro offset ({:.4}, {:.4}, {:.4}) deg/s",
            accel_offset.x,
            accel_offset.y,
            accel_offset.z,
            report.profile.gyro_offset.x,
            report.profile.gyro_offset.y,
            report.profile.gyro_offset.z,
        );
        log::debug!(
            "calibration variance: accel ({:e}, {:e}, {:e}), gyro ({:e}, {:e}, {:e})",
            report.accel_variance.x,
            report.accel_variance.y,
            report.accel_variance.z,
            report.gyro_variance.x,
            report.gyro_variance.y,
            report.gyro_variance.z,
        );

        Ok(report)
    }
}
