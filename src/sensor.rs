//! Inertial sensor boundary
//!
//! The bus transaction layer lives outside this crate. Drivers expose
//! themselves to the tracker through [`SampleSource`].

use crate::types::RawSample;

/// Source of raw 6-axis readings
///
/// Implementations own the bus and the sensor's register map. A failed
/// [`read`](SampleSource::read) is treated as transient: the caller skips the
/// cycle and tries again on the next tick.
pub trait SampleSource {
    /// Driver-specific error, logged at the tracker boundary
    type Error: core::fmt::Debug;

    /// Confirm the device answers with the expected identity
    ///
    /// Called once at startup. Failure is fatal.
    fn verify(&mut self) -> Result<(), Self::Error>;

    /// Read one sample along with the time elapsed since the previous one
    fn read(&mut self) -> Result<RawSample, Self::Error>;
}

impl<T: SampleSource + ?Sized> SampleSource for &mut T {
    type Error = T::Error;

    fn verify(&mut self) -> Result<(), Self::Error> {
        (**self).verify()
    }

    fn read(&mut self) -> Result<RawSample, Self::Error> {
        (**self).read()
    }
}
