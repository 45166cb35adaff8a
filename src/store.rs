//! Calibration profile persistence

use crate::calibration::CalibrationProfile;
use crate::error::{LoadError, SaveError};
use crate::record::{self, RECORD_LEN};
use crate::storage::Storage;

/// Reads and writes the calibration record on a storage medium
///
/// # Example
/// ```
/// use attitude_tracker::{CalibrationProfile, CalibrationStore, LoadError, MemoryStorage};
///
/// let mut store = CalibrationStore::new(MemoryStorage::<64>::new(), 0);
/// assert_eq!(store.load(), Err(LoadError::NotFound));
///
/// let profile = CalibrationProfile { calibrated: true, ..Default::default() };
/// store.save(&profile).unwrap();
/// assert_eq!(store.load(), Ok(profile));
/// ```
#[derive(Debug)]
pub struct CalibrationStore<S> {
    storage: S,
    offset: u32,
}

impl<S: Storage> CalibrationStore<S> {
    /// Create a store keeping its record at `offset` on `storage`
    pub fn new(storage: S, offset: u32) -> Self {
        Self { storage, offset }
    }

    /// Initialise the underlying medium
    pub fn init(&mut self) -> Result<(), S::Error> {
        self.storage.init()
    }

    /// Load and validate the stored profile
    pub fn load(&mut self) -> Result<CalibrationProfile, LoadError> {
        let mut buf = [0u8; RECORD_LEN];
        self.storage.read(self.offset, &mut buf).map_err(|e| {
            log::warn!("calibration storage read failed: {:?}", e);
            LoadError::ReadFailed
        })?;
        record::decode(&buf)
    }

    /// Write `profile` and commit it
    pub fn save(&mut self, profile: &CalibrationProfile) -> Result<(), SaveError> {
        let buf = record::encode(profile);
        self.storage
            .write(self.offset, &buf)
            .and_then(|()| self.storage.commit())
            .map_err(|e| {
                log::warn!("calibration storage write failed: {:?}", e);
                SaveError::WriteFailed
            })
    }

    /// Access the underlying medium
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the underlying medium
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the store and return the medium
    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use nalgebra::Vector3;

    fn profile() -> CalibrationProfile {
        CalibrationProfile {
            accel_offset: Vector3::new(0.01, 0.02, -0.03),
            gyro_offset: Vector3::new(0.4, -0.5, 0.6),
            calibrated: true,
            temperature_reference: 24.0,
        }
    }

    #[test]
    fn test_save_survives_power_cycle() {
        let mut store = CalibrationStore::new(MemoryStorage::<64>::new(), 16);
        store.save(&profile()).unwrap();
        store.storage_mut().power_cycle();

        assert_eq!(store.load(), Ok(profile()));
        assert_eq!(store.storage().commit_count(), 1);
        // bytes before the offset are untouched
        assert_eq!(&store.storage().contents()[..16], &[0xFF; 16]);
    }

    #[test]
    fn test_write_failure() {
        let mut storage = MemoryStorage::<64>::new();
        storage.set_reject_writes(true);
        let mut store = CalibrationStore::new(storage, 0);

        assert_eq!(store.save(&profile()), Err(SaveError::WriteFailed));
        assert_eq!(store.load(), Err(LoadError::NotFound));
    }

    #[test]
    fn test_read_failure() {
        // record does not fit behind this offset
        let mut store = CalibrationStore::new(MemoryStorage::<40>::new(), 20);
        assert_eq!(store.load(), Err(LoadError::ReadFailed));
    }

    #[test]
    fn test_corruption_detected() {
        let mut store = CalibrationStore::new(MemoryStorage::<64>::new(), 0);
        store.save(&profile()).unwrap();
        store.storage_mut().corrupt(5, 0x01);

        assert_eq!(store.load(), Err(LoadError::Corrupted));
    }
}
