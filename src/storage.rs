//! Non-volatile storage medium
//!
//! The calibration record is small and rewritten rarely, so the medium is
//! modelled the way EEPROM emulation on a microcontroller behaves: writes land
//! in a RAM shadow and only survive a power cycle once
//! [`commit`](Storage::commit) succeeds.

/// Byte-addressable non-volatile medium
pub trait Storage {
    /// Medium-specific error, logged at the store boundary
    type Error: core::fmt::Debug;

    /// Prepare the medium for use
    ///
    /// Called once at startup. Failure is fatal.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Read `buf.len()` bytes starting at `offset`
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Stage `data` for writing at `offset`
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), Self::Error>;

    /// Make staged writes durable
    fn commit(&mut self) -> Result<(), Self::Error>;
}

/// Errors reported by [`MemoryStorage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryStorageError {
    /// Access past the end of the medium
    OutOfBounds,
    /// Write or commit refused by fault injection
    Rejected,
    /// Initialisation refused by fault injection
    InitFailed,
}

/// In-memory medium for tests and host simulation
///
/// Starts erased (`0xFF`). Supports fault injection and power-cycle
/// simulation.
///
/// # Example
/// ```
/// use attitude_tracker::{MemoryStorage, Storage};
///
/// let mut storage: MemoryStorage<64> = MemoryStorage::new();
/// storage.write(0, &[1, 2, 3]).unwrap();
///
/// // Uncommitted writes are lost on power loss
/// storage.power_cycle();
/// let mut buf = [0u8; 3];
/// storage.read(0, &mut buf).unwrap();
/// assert_eq!(buf, [0xFF; 3]);
///
/// storage.write(0, &[1, 2, 3]).unwrap();
/// storage.commit().unwrap();
/// storage.power_cycle();
/// storage.read(0, &mut buf).unwrap();
/// assert_eq!(buf, [1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStorage<const SIZE: usize> {
    /// Contents visible to reads (RAM shadow)
    shadow: [u8; SIZE],
    /// Contents that survive a power cycle
    committed: [u8; SIZE],
    /// Refuse writes and commits
    reject_writes: bool,
    /// Refuse initialisation
    reject_init: bool,
    /// Successful commits so far
    commit_count: u32,
}

impl<const SIZE: usize> MemoryStorage<SIZE> {
    /// Create an erased medium
    pub fn new() -> Self {
        Self::filled(0xFF)
    }

    /// Create a medium with every byte set to `value`
    pub fn filled(value: u8) -> Self {
        Self {
            shadow: [value; SIZE],
            committed: [value; SIZE],
            reject_writes: false,
            reject_init: false,
            commit_count: 0,
        }
    }

    /// Make subsequent writes and commits fail
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Make subsequent initialisation fail
    pub fn set_reject_init(&mut self, reject: bool) {
        self.reject_init = reject;
    }

    /// XOR `mask` into the durable byte at `offset` (and its shadow)
    ///
    /// Out-of-range offsets are ignored.
    pub fn corrupt(&mut self, offset: usize, mask: u8) {
        if offset < SIZE {
            self.committed[offset] ^= mask;
            self.shadow[offset] ^= mask;
        }
    }

    /// Drop uncommitted writes, as a power loss would
    pub fn power_cycle(&mut self) {
        self.shadow = self.committed;
    }

    /// Durable contents
    pub fn contents(&self) -> &[u8] {
        &self.committed
    }

    /// Number of successful commits
    pub fn commit_count(&self) -> u32 {
        self.commit_count
    }

    fn range(offset: u32, len: usize) -> Result<core::ops::Range<usize>, MemoryStorageError> {
        let start = offset as usize;
        let end = start.checked_add(len).ok_or(MemoryStorageError::OutOfBounds)?;
        if end > SIZE {
            return Err(MemoryStorageError::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl<const SIZE: usize> Default for MemoryStorage<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> Storage for MemoryStorage<SIZE> {
    type Error = MemoryStorageError;

    fn init(&mut self) -> Result<(), Self::Error> {
        if self.reject_init {
            return Err(MemoryStorageError::InitFailed);
        }
        Ok(())
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, buf.len())?;
        buf.copy_from_slice(&self.shadow[range]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), Self::Error> {
        if self.reject_writes {
            return Err(MemoryStorageError::Rejected);
        }
        let range = Self::range(offset, data.len())?;
        self.shadow[range].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        if self.reject_writes {
            return Err(MemoryStorageError::Rejected);
        }
        self.committed = self.shadow;
        self.commit_count += 1;
        Ok(())
    }
}
