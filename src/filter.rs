//! Moving-average smoothing for the six inertial channels
//!
//! Each channel keeps the last `N` raw values in a fixed ring buffer. All six
//! buffers share one write cursor which advances once per sensor reading, so
//! slot `i` of every buffer always holds values captured at the same instant.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use attitude_tracker::{Channel, SignalFilter};
//!
//! let mut filter: SignalFilter<4> = SignalFilter::new();
//!
//! // Per-channel use: write every channel, then advance once
//! let ax = filter.update(Channel::AccelX, 0.4);
//! filter.advance();
//! assert_eq!(ax, 0.1);
//!
//! // Or smooth a whole reading in one call
//! let (accel, gyro) = filter.smooth(Vector3::new(0.0, 0.0, 1.0), Vector3::zeros());
//! assert_eq!(accel.z, 0.25);
//! assert_eq!(gyro, Vector3::zeros());
//! ```

use nalgebra::Vector3;

use crate::types::DEFAULT_WINDOW;

/// Number of filtered channels (3 accelerometer + 3 gyroscope)
pub const CHANNEL_COUNT: usize = 6;

/// Physical sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Channel {
    /// All channels in buffer order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed-window moving-average filter over all six channels
#[derive(Debug, Clone)]
pub struct SignalFilter<const N: usize = DEFAULT_WINDOW> {
    /// Ring buffer per channel
    buffers: [[f32; N]; CHANNEL_COUNT],
    /// Shared write position
    cursor: usize,
}

impl<const N: usize> SignalFilter<N> {
    /// Create a filter with all buffers zeroed
    pub const fn new() -> Self {
        const { assert!(N > 0, "filter window must hold at least one sample") };
        Self {
            buffers: [[0.0; N]; CHANNEL_COUNT],
            cursor: 0,
        }
    }

    /// Store `raw` for `channel` at the shared cursor and return the window mean
    ///
    /// Does not move the cursor; call [`advance`](Self::advance) once all
    /// channels of the current reading have been written.
    pub fn update(&mut self, channel: Channel, raw: f32) -> f32 {
        let buffer = &mut self.buffers[channel.index()];
        buffer[self.cursor] = raw;
        buffer.iter().sum::<f32>() / N as f32
    }

    /// Move the shared cursor to the next slot
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % N;
    }

    /// Smooth one complete reading and advance the cursor
    pub fn smooth(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
    ) -> (Vector3<f32>, Vector3<f32>) {
        let accel = Vector3::new(
            self.update(Channel::AccelX, accelerometer.x),
            self.update(Channel::AccelY, accelerometer.y),
            self.update(Channel::AccelZ, accelerometer.z),
        );
        let gyro = Vector3::new(
            self.update(Channel::GyroX, gyroscope.x),
            self.update(Channel::GyroY, gyroscope.y),
            self.update(Channel::GyroZ, gyroscope.z),
        );
        self.advance();
        (accel, gyro)
    }

    /// Zero every buffer and rewind the cursor
    pub fn reset(&mut self) {
        self.buffers = [[0.0; N]; CHANNEL_COUNT];
        self.cursor = 0;
    }

    /// Current shared cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Window length in samples
    pub const fn window(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for SignalFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}
