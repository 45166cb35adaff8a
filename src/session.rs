//! Control-loop session
//!
//! One [`Session`] owns every piece of mutable tracker state: filter buffers,
//! the current quaternion, the loaded calibration profile and the store it
//! came from. The control loop holds it and passes collaborators (sensor,
//! delay, host link) in by reference on each call.
//!
//! # Example
//! ```
//! use attitude_tracker::{
//!     MemoryStorage, RawSample, SampleSource, Session, SessionSettings,
//! };
//! use embedded_hal::delay::DelayNs;
//!
//! struct Level;
//! impl SampleSource for Level {
//!     type Error = ();
//!     fn verify(&mut self) -> Result<(), ()> { Ok(()) }
//!     fn read(&mut self) -> Result<RawSample, ()> { Ok(RawSample::at_rest(0.01)) }
//! }
//!
//! struct NoDelay;
//! impl DelayNs for NoDelay {
//!     fn delay_ns(&mut self, _ns: u32) {}
//! }
//!
//! let mut session: Session<MemoryStorage<64>> = Session::start(
//!     SessionSettings::default(),
//!     MemoryStorage::new(),
//!     &mut Level,
//!     &mut NoDelay,
//!     |_| {},
//! )
//! .expect("sensor and storage present");
//!
//! // No stored profile, so startup calibrated and saved one
//! assert!(session.profile().calibrated);
//!
//! let output = session.tick(&mut Level).unwrap();
//! print!("{}", output.quaternion_line().unwrap());
//! ```

use embedded_hal::delay::DelayNs;
use nalgebra::{UnitQuaternion, Vector3};

use crate::calibration::{CalibrationEngine, CalibrationProfile, CalibrationProgress, CalibrationReport};
use crate::error::{CalibrationError, InitError, SaveError, TickError};
use crate::estimator::AttitudeEstimator;
use crate::filter::SignalFilter;
use crate::sensor::SampleSource;
use crate::storage::Storage;
use crate::store::CalibrationStore;
use crate::telemetry::{self, Command, CommandSource, Line};
use crate::types::{DEFAULT_WINDOW, SessionSettings};

/// Result of one control-loop cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Offset-corrected, smoothed acceleration in g
    pub accelerometer: Vector3<f32>,
    /// Offset-corrected, smoothed angular rate in degrees per second
    pub gyroscope: Vector3<f32>,
    /// Die temperature in degrees Celsius
    pub temperature: f32,
    /// Orientation after this cycle
    pub quaternion: UnitQuaternion<f32>,
}

impl TickOutput {
    /// `DATA,...` telemetry line for this cycle
    ///
    /// # Errors
    /// [`core::fmt::Error`] when the values do not fit in one line.
    pub fn sample_line(&self) -> Result<Line, core::fmt::Error> {
        telemetry::format_sample(&self.accelerometer, &self.gyroscope, self.temperature)
    }

    /// `Q:...` telemetry line for this cycle
    pub fn quaternion_line(&self) -> Result<Line, core::fmt::Error> {
        telemetry::format_quaternion(&self.quaternion)
    }
}

/// Result of a completed recalibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recalibration {
    /// Measured offsets and diagnostics
    pub report: CalibrationReport,
    /// Whether the new profile reached storage
    ///
    /// On failure the profile is still active for this session.
    pub saved: Result<(), SaveError>,
}

/// What the session did in response to a host command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    /// A calibration pass ran
    Recalibrated(Result<Recalibration, CalibrationError>),
    /// The caller should print [`HELP_TEXT`](crate::HELP_TEXT)
    Help,
}

/// Tracker state owned by the control loop
#[derive(Debug)]
pub struct Session<S, const N: usize = DEFAULT_WINDOW> {
    settings: SessionSettings,
    filter: SignalFilter<N>,
    estimator: AttitudeEstimator,
    engine: CalibrationEngine,
    profile: CalibrationProfile,
    store: CalibrationStore<S>,
}

impl<S: Storage, const N: usize> Session<S, N> {
    /// Bring up the tracker
    ///
    /// Verifies the sensor and initialises storage, then loads the stored
    /// profile. A missing or invalid profile is not an error: the session
    /// either calibrates immediately (when
    /// [`calibrate_on_missing_profile`](SessionSettings::calibrate_on_missing_profile)
    /// is set) or runs uncalibrated.
    ///
    /// # Errors
    /// [`InitError`] when the sensor or the storage medium fails its check.
    /// The caller must not continue.
    pub fn start<Src, D, F>(
        settings: SessionSettings,
        storage: S,
        source: &mut Src,
        delay: &mut D,
        progress: F,
    ) -> Result<Self, InitError>
    where
        Src: SampleSource,
        D: DelayNs,
        F: FnMut(CalibrationProgress),
    {
        source.verify().map_err(|e| {
            log::error!("sensor identity check failed: {:?}", e);
            InitError::SensorIdentity
        })?;

        let mut store = CalibrationStore::new(storage, settings.storage_offset);
        store.init().map_err(|e| {
            log::error!("calibration storage init failed: {:?}", e);
            InitError::Storage
        })?;

        let mut session = Self {
            settings,
            filter: SignalFilter::new(),
            estimator: AttitudeEstimator::with_settings(settings.estimator),
            engine: CalibrationEngine::with_settings(settings.calibration),
            profile: CalibrationProfile::uncalibrated(),
            store,
        };

        match session.store.load() {
            Ok(profile) => {
                log::info!(
                    "loaded calibration profile (reference temperature {:.2} C)",
                    profile.temperature_reference
                );
                session.profile = profile;
            }
            Err(e) => {
                log::warn!("no usable calibration profile: {}", e);
                if settings.calibrate_on_missing_profile {
                    if let Err(e) = session.recalibrate(source, delay, progress) {
                        log::warn!("startup calibration failed, running uncalibrated: {}", e);
                    }
                }
            }
        }

        Ok(session)
    }

    /// Run one control-loop cycle
    ///
    /// # Errors
    /// [`TickError::SampleUnavailable`] when the sensor read fails. No state
    /// changes in that case and the next call retries.
    pub fn tick<Src: SampleSource>(&mut self, source: &mut Src) -> Result<TickOutput, TickError> {
        let sample = source.read().map_err(|e| {
            log::warn!("sensor read failed, skipping cycle: {:?}", e);
            TickError::SampleUnavailable
        })?;

        let (accelerometer, gyroscope) = self.profile.apply(sample.accelerometer, sample.gyroscope);
        let (accelerometer, gyroscope) = self.filter.smooth(accelerometer, gyroscope);
        let quaternion = self.estimator.update(accelerometer, gyroscope, sample.delta_time);

        Ok(TickOutput {
            accelerometer,
            gyroscope,
            temperature: sample.temperature,
            quaternion,
        })
    }

    /// Measure a fresh profile, activate it and persist it
    ///
    /// Blocks until the pass completes. The new profile replaces the old one
    /// wholesale even when saving fails.
    ///
    /// # Errors
    /// [`CalibrationError`] when no samples could be collected; the previous
    /// profile stays active.
    pub fn recalibrate<Src, D, F>(
        &mut self,
        source: &mut Src,
        delay: &mut D,
        progress: F,
    ) -> Result<Recalibration, CalibrationError>
    where
        Src: SampleSource,
        D: DelayNs,
        F: FnMut(CalibrationProgress),
    {
        let report = self.engine.calibrate(source, delay, &mut self.filter, progress)?;

        self.profile = report.profile;

        let saved = self.store.save(&report.profile);
        match saved {
            Ok(()) => log::info!("calibration profile saved"),
            Err(e) => log::warn!("{}; calibration will not survive a restart", e),
        }

        Ok(Recalibration { report, saved })
    }

    /// Poll the host link once and act on any command
    ///
    /// A recalibration runs to completion before this returns.
    pub fn service_commands<C, Src, D, F>(
        &mut self,
        commands: &mut C,
        source: &mut Src,
        delay: &mut D,
        progress: F,
    ) -> Option<CommandOutcome>
    where
        C: CommandSource + ?Sized,
        Src: SampleSource,
        D: DelayNs,
        F: FnMut(CalibrationProgress),
    {
        match telemetry::poll_command(commands)? {
            Command::Recalibrate => Some(CommandOutcome::Recalibrated(self.recalibrate(source, delay, progress))),
            Command::Help => Some(CommandOutcome::Help),
        }
    }

    /// Active calibration profile
    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Current orientation
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.estimator.quaternion()
    }

    /// Session settings
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Attitude estimator
    pub fn estimator(&self) -> &AttitudeEstimator {
        &self.estimator
    }

    /// Signal filter
    pub fn filter(&self) -> &SignalFilter<N> {
        &self.filter
    }

    /// Calibration store
    pub fn store(&self) -> &CalibrationStore<S> {
        &self.store
    }

    /// Mutable calibration store
    pub fn store_mut(&mut self) -> &mut CalibrationStore<S> {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::{CalibrationSettings, RawSample};

    struct Fixed {
        sample: RawSample,
        fail: bool,
        identity_ok: bool,
        reads: u32,
    }

    impl Fixed {
        fn new(sample: RawSample) -> Self {
            Self {
                sample,
                fail: false,
                identity_ok: true,
                reads: 0,
            }
        }
    }

    impl SampleSource for Fixed {
        type Error = &'static str;

        fn verify(&mut self) -> Result<(), Self::Error> {
            if self.identity_ok { Ok(()) } else { Err("wrong WHO_AM_I") }
        }

        fn read(&mut self) -> Result<RawSample, Self::Error> {
            self.reads += 1;
            if self.fail { Err("bus timeout") } else { Ok(self.sample) }
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            calibration: CalibrationSettings {
                sample_count: 50,
                sample_interval_us: 0,
                report_interval: 10,
            },
            ..Default::default()
        }
    }

    type TestSession = Session<MemoryStorage<64>, 4>;

    #[test]
    fn test_identity_failure_is_fatal() {
        let mut source = Fixed::new(RawSample::at_rest(0.01));
        source.identity_ok = false;

        let result = TestSession::start(settings(), MemoryStorage::new(), &mut source, &mut NoDelay, |_| {});
        assert_eq!(result.err(), Some(InitError::SensorIdentity));
    }

    #[test]
    fn test_storage_failure_is_fatal() {
        let mut storage = MemoryStorage::new();
        storage.set_reject_init(true);
        let mut source = Fixed::new(RawSample::at_rest(0.01));

        let result = TestSession::start(settings(), storage, &mut source, &mut NoDelay, |_| {});
        assert_eq!(result.err(), Some(InitError::Storage));
    }

    #[test]
    fn test_startup_without_calibration() {
        let mut source = Fixed::new(RawSample::at_rest(0.01));
        let settings = SessionSettings {
            calibrate_on_missing_profile: false,
            ..settings()
        };

        let session = TestSession::start(settings, MemoryStorage::new(), &mut source, &mut NoDelay, |_| {}).unwrap();
        assert!(!session.profile().calibrated);
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn test_failed_startup_calibration_is_not_fatal() {
        let mut source = Fixed::new(RawSample::at_rest(0.01));
        let mut settings = settings();
        settings.calibration.sample_count = 0;

        let session = TestSession::start(settings, MemoryStorage::new(), &mut source, &mut NoDelay, |_| {}).unwrap();
        assert!(!session.profile().calibrated);
        assert_eq!(source.reads, 0);
        assert_eq!(session.store().storage().commit_count(), 0);
    }

    #[test]
    fn test_failed_tick_leaves_state() {
        let mut source = Fixed::new(RawSample::at_rest(0.01));
        source.sample.gyroscope = Vector3::new(30.0, 0.0, 0.0);
        let settings = SessionSettings {
            calibrate_on_missing_profile: false,
            ..settings()
        };
        let mut session = TestSession::start(settings, MemoryStorage::new(), &mut source, &mut NoDelay, |_| {}).unwrap();

        session.tick(&mut source).unwrap();
        let quaternion = session.quaternion();
        let cursor = session.filter().cursor();

        source.fail = true;
        assert_eq!(session.tick(&mut source), Err(TickError::SampleUnavailable));
        assert_eq!(session.quaternion(), quaternion);
        assert_eq!(session.filter().cursor(), cursor);
    }

    #[test]
    fn test_save_failure_keeps_profile_active() {
        let mut source = Fixed::new(RawSample::at_rest(0.01));
        let settings = SessionSettings {
            calibrate_on_missing_profile: false,
            ..settings()
        };
        let mut session = TestSession::start(settings, MemoryStorage::new(), &mut source, &mut NoDelay, |_| {}).unwrap();

        source.sample.gyroscope = Vector3::new(0.3, 0.0, -0.2);
        session.store_mut().storage_mut().set_reject_writes(true);

        let outcome = session.recalibrate(&mut source, &mut NoDelay, |_| {}).unwrap();
        assert_eq!(outcome.saved, Err(SaveError::WriteFailed));
        assert!(session.profile().calibrated);
        assert!((session.profile().gyro_offset.x - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_failed_recalibration_keeps_previous_profile() {
        let mut source = Fixed::new(RawSample::at_rest(0.01));
        source.sample.gyroscope = Vector3::new(0.5, 0.0, 0.0);
        let mut session = TestSession::start(settings(), MemoryStorage::new(), &mut source, &mut NoDelay, |_| {}).unwrap();
        let before = *session.profile();
        assert!(before.calibrated);

        source.fail = true;
        let result = session.recalibrate(&mut source, &mut NoDelay, |_| {});
        assert_eq!(result.err(), Some(CalibrationError::NoSamples));
        assert_eq!(*session.profile(), before);
    }
}
