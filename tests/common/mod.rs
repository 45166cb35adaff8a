//! Shared test doubles for the sensor and delay collaborators

#![allow(dead_code)]

use std::collections::VecDeque;

use attitude_tracker::{CommandSource, RawSample, SampleSource};
use embedded_hal::delay::DelayNs;
use nalgebra::Vector3;

/// Plays back queued readings, then repeats a fallback reading
pub struct ScriptedSource {
    pub queue: VecDeque<Result<RawSample, &'static str>>,
    pub fallback: RawSample,
    pub identity_ok: bool,
    pub reads: u32,
}

impl ScriptedSource {
    pub fn new(fallback: RawSample) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback,
            identity_ok: true,
            reads: 0,
        }
    }

    pub fn push(&mut self, sample: RawSample) {
        self.queue.push_back(Ok(sample));
    }

    pub fn push_failure(&mut self) {
        self.queue.push_back(Err("bus timeout"));
    }
}

impl SampleSource for ScriptedSource {
    type Error = &'static str;

    fn verify(&mut self) -> Result<(), Self::Error> {
        if self.identity_ok {
            Ok(())
        } else {
            Err("unexpected device id")
        }
    }

    fn read(&mut self) -> Result<RawSample, Self::Error> {
        self.reads += 1;
        self.queue.pop_front().unwrap_or(Ok(self.fallback))
    }
}

/// Delay that returns immediately but records requested time
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Host bytes waiting to be read
pub struct HostBytes(pub VecDeque<u8>);

impl HostBytes {
    pub fn new(bytes: &[u8]) -> Self {
        Self(bytes.iter().copied().collect())
    }
}

impl CommandSource for HostBytes {
    fn read_byte(&mut self) -> Option<u8> {
        self.0.pop_front()
    }
}

pub fn sample(accel: [f32; 3], gyro: [f32; 3], delta_time: f32) -> RawSample {
    RawSample {
        accelerometer: Vector3::from(accel),
        gyroscope: Vector3::from(gyro),
        temperature: 25.0,
        delta_time,
    }
}
