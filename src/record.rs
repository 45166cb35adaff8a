//! Persisted calibration record
//!
//! Fixed 32-byte layout, little-endian floats, independent of the in-memory
//! representation:
//!
//! ```text
//! ┌────────┬─────────┬───────────────┬───────────────┬────────────┬─────────────┬──────────┐
//! │ magic  │ version │ accel_offset  │ gyro_offset   │ calibrated │ temperature │ checksum │
//! │ u8     │ u8      │ 3 × f32       │ 3 × f32       │ u8 (0/1)   │ f32         │ u8       │
//! │ 0      │ 1       │ 2..14         │ 14..26        │ 26         │ 27..31      │ 31       │
//! └────────┴─────────┴───────────────┴───────────────┴────────────┴─────────────┴──────────┘
//! ```
//!
//! `checksum` is the XOR of bytes `0..31`. It is verified before anything
//! else, so any single damaged byte reads as [`LoadError::Corrupted`]. A
//! blank medium (every byte equal, e.g. erased `0xFF`) has a consistent XOR
//! over its odd-length prefix and therefore falls through to the magic check
//! and reads as [`LoadError::NotFound`].

use nalgebra::Vector3;

use crate::calibration::CalibrationProfile;
use crate::error::LoadError;

/// Sentinel marking a formatted record
pub const RECORD_MAGIC: u8 = 0xA5;

/// Layout version understood by this implementation
pub const RECORD_VERSION: u8 = 1;

/// Record size in bytes
pub const RECORD_LEN: usize = 32;

const ACCEL_OFFSET: usize = 2;
const GYRO_OFFSET: usize = 14;
const CALIBRATED: usize = 26;
const TEMPERATURE: usize = 27;
const CHECKSUM: usize = RECORD_LEN - 1;

/// XOR of every byte in `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Serialize a profile into a complete record, checksum included
pub fn encode(profile: &CalibrationProfile) -> [u8; RECORD_LEN] {
    let mut record = [0u8; RECORD_LEN];
    record[0] = RECORD_MAGIC;
    record[1] = RECORD_VERSION;
    write_vector(&mut record[ACCEL_OFFSET..GYRO_OFFSET], profile.accel_offset);
    write_vector(&mut record[GYRO_OFFSET..CALIBRATED], profile.gyro_offset);
    record[CALIBRATED] = u8::from(profile.calibrated);
    record[TEMPERATURE..CHECKSUM].copy_from_slice(&profile.temperature_reference.to_le_bytes());
    record[CHECKSUM] = checksum(&record[..CHECKSUM]);
    record
}

/// Validate and deserialize a record
///
/// # Errors
/// * [`LoadError::Corrupted`] - checksum mismatch, invalid flag byte or a
///   non-finite value
/// * [`LoadError::NotFound`] - magic byte missing
/// * [`LoadError::VersionMismatch`] - unknown layout version
pub fn decode(record: &[u8; RECORD_LEN]) -> Result<CalibrationProfile, LoadError> {
    if checksum(&record[..CHECKSUM]) != record[CHECKSUM] {
        return Err(LoadError::Corrupted);
    }
    if record[0] != RECORD_MAGIC {
        return Err(LoadError::NotFound);
    }
    if record[1] != RECORD_VERSION {
        return Err(LoadError::VersionMismatch { found: record[1] });
    }

    let calibrated = match record[CALIBRATED] {
        0 => false,
        1 => true,
        _ => return Err(LoadError::Corrupted),
    };

    let profile = CalibrationProfile {
        accel_offset: read_vector(&record[ACCEL_OFFSET..GYRO_OFFSET]),
        gyro_offset: read_vector(&record[GYRO_OFFSET..CALIBRATED]),
        calibrated,
        temperature_reference: read_f32(&record[TEMPERATURE..CHECKSUM]),
    };

    let finite = profile.accel_offset.iter().all(|v| v.is_finite())
        && profile.gyro_offset.iter().all(|v| v.is_finite())
        && profile.temperature_reference.is_finite();
    if !finite {
        return Err(LoadError::Corrupted);
    }

    Ok(profile)
}

fn write_vector(dst: &mut [u8], v: Vector3<f32>) {
    for (chunk, value) in dst.chunks_exact_mut(4).zip(v.iter()) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
}

fn read_vector(src: &[u8]) -> Vector3<f32> {
    Vector3::new(read_f32(&src[0..4]), read_f32(&src[4..8]), read_f32(&src[8..12]))
}

fn read_f32(src: &[u8]) -> f32 {
    f32::from_le_bytes([src[0], src[1], src[2], src[3]])
}
