//! Host link: telemetry lines out, single-byte commands in
//!
//! Lines are plain ASCII terminated by `\n`:
//!
//! ```text
//! DATA,<ax>,<ay>,<az>,<gx>,<gy>,<gz>,<temp>
//! Q:<w>,<x>,<y>,<z>
//! ```
//!
//! Axis values carry three decimals, temperature two.

use core::fmt::{self, Write};

use heapless::String;
use nalgebra::{UnitQuaternion, Vector3};

/// Capacity of one formatted telemetry line
pub const LINE_CAPACITY: usize = 128;

/// One formatted telemetry line
pub type Line = String<LINE_CAPACITY>;

/// Help text printed for the `h` command
pub const HELP_TEXT: &[&str] = &[
    "Commands:",
    "  c  recalibrate (keep the device still and level)",
    "  h  show this help",
];

/// Host command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Run a fresh calibration pass
    Recalibrate,
    /// Print the command list
    Help,
}

impl Command {
    /// Decode a command byte, case-insensitive
    pub fn from_byte(byte: u8) -> Option<Command> {
        match byte.to_ascii_lowercase() {
            b'c' => Some(Command::Recalibrate),
            b'h' => Some(Command::Help),
            _ => None,
        }
    }
}

/// Incoming byte stream from the host
pub trait CommandSource {
    /// Next pending byte, if any
    fn read_byte(&mut self) -> Option<u8>;
}

/// Poll for one command
///
/// Reads a single byte. An unrecognized byte is ignored. After a recognized
/// command every remaining pending byte is discarded so that line endings
/// and repeated keystrokes do not queue further commands.
pub fn poll_command<C: CommandSource + ?Sized>(commands: &mut C) -> Option<Command> {
    let byte = commands.read_byte()?;
    let command = Command::from_byte(byte);
    match command {
        Some(command) => {
            while commands.read_byte().is_some() {}
            log::debug!("host command: {:?}", command);
        }
        None => log::debug!("ignoring host byte 0x{:02x}", byte),
    }
    command
}

/// Format a `DATA,...` sample line
///
/// # Errors
/// [`fmt::Error`] when the line would exceed [`LINE_CAPACITY`]. A partial
/// line is never returned, so the host never sees a line without its `\n`.
pub fn format_sample(
    accelerometer: &Vector3<f32>,
    gyroscope: &Vector3<f32>,
    temperature: f32,
) -> Result<Line, fmt::Error> {
    let mut line = Line::new();
    writeln!(
        line,
        "DATA,{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.2}",
        accelerometer.x,
        accelerometer.y,
        accelerometer.z,
        gyroscope.x,
        gyroscope.y,
        gyroscope.z,
        temperature
    )
    .inspect_err(|_| log::warn!("sample line exceeds {} bytes, dropped", LINE_CAPACITY))?;
    Ok(line)
}

/// Format a `Q:...` orientation line
///
/// A unit quaternion always fits; the error only surfaces for a non-unit
/// value built with `new_unchecked`.
pub fn format_quaternion(quaternion: &UnitQuaternion<f32>) -> Result<Line, fmt::Error> {
    let mut line = Line::new();
    writeln!(
        line,
        "Q:{:.3},{:.3},{:.3},{:.3}",
        quaternion.w, quaternion.i, quaternion.j, quaternion.k
    )
    .inspect_err(|_| log::warn!("quaternion line exceeds {} bytes, dropped", LINE_CAPACITY))?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Pending(VecDeque<u8>);

    impl CommandSource for Pending {
        fn read_byte(&mut self) -> Option<u8> {
            self.0.pop_front()
        }
    }

    #[test]
    fn test_sample_line() {
        let line = format_sample(
            &Vector3::new(0.01, -0.0205, 1.0),
            &Vector3::new(-12.5, 0.0, 3.14159),
            24.567,
        )
        .unwrap();
        assert_eq!(line.as_str(), "DATA,0.010,-0.021,1.000,-12.500,0.000,3.142,24.57\n");
    }

    #[test]
    fn test_oversized_sample_line_is_rejected() {
        // f32::MAX prints as 39 integer digits
        let huge = Vector3::new(f32::MAX, -f32::MAX, f32::MAX);
        assert_eq!(format_sample(&huge, &huge, 25.0), Err(fmt::Error));

        // sensor-range extremes still fit
        let line = format_sample(
            &Vector3::new(-16.0, -16.0, -16.0),
            &Vector3::new(-2000.0, -2000.0, -2000.0),
            -40.0,
        )
        .unwrap();
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_quaternion_line() {
        let line = format_quaternion(&UnitQuaternion::identity()).unwrap();
        assert_eq!(line.as_str(), "Q:1.000,0.000,0.000,0.000\n");
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::from_byte(b'c'), Some(Command::Recalibrate));
        assert_eq!(Command::from_byte(b'C'), Some(Command::Recalibrate));
        assert_eq!(Command::from_byte(b'h'), Some(Command::Help));
        assert_eq!(Command::from_byte(b'H'), Some(Command::Help));
        assert_eq!(Command::from_byte(b'x'), None);
        assert_eq!(Command::from_byte(b'\n'), None);
    }

    #[test]
    fn test_recognized_command_drains_input() {
        let mut pending = Pending(b"c\r\nhh".iter().copied().collect());

        assert_eq!(poll_command(&mut pending), Some(Command::Recalibrate));
        assert!(pending.0.is_empty());
        assert_eq!(poll_command(&mut pending), None);
    }

    #[test]
    fn test_unrecognized_byte_ignored() {
        let mut pending = Pending(b"xh".iter().copied().collect());

        assert_eq!(poll_command(&mut pending), None);
        assert_eq!(poll_command(&mut pending), Some(Command::Help));
    }
}
