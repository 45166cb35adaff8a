//! Complementary-filter attitude estimator

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::math::{QuaternionExt, Vector3Ext, quaternion_from_euler, renormalize};
use crate::types::EstimatorSettings;

/// Attitude estimator
///
/// Integrates the gyroscope into a quaternion and pulls the result toward the
/// roll/pitch implied by the accelerometer's gravity reading. The accelerometer
/// reference carries no yaw, so yaw is also drawn back toward zero at the same
/// rate.
#[derive(Debug, Clone)]
pub struct AttitudeEstimator {
    /// Algorithm settings
    settings: EstimatorSettings,
    /// Current orientation, body frame to reference frame
    quaternion: UnitQuaternion<f32>,
}

impl AttitudeEstimator {
    /// Create a new estimator with default settings
    pub fn new() -> Self {
        Self::with_settings(EstimatorSettings::default())
    }

    /// Create a new estimator with specified settings
    pub fn with_settings(settings: EstimatorSettings) -> Self {
        Self {
            settings,
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// Return to the identity orientation
    pub fn reset(&mut self) {
        self.quaternion = UnitQuaternion::identity();
    }

    /// Get current settings
    pub fn settings(&self) -> EstimatorSettings {
        self.settings
    }

    /// Update the estimate with one filtered reading
    ///
    /// The gyro step is applied on the right, `q ⊗ Δq`, so the angular rate
    /// is taken in the body frame. The gravity reference is flipped onto the
    /// integrated quaternion's hemisphere before blending, since `q` and `-q`
    /// describe the same rotation but blend in opposite directions.
    ///
    /// # Arguments
    /// * `accelerometer` - Accelerometer reading in g
    /// * `gyroscope` - Gyroscope reading in degrees per second
    /// * `delta_time` - Time step in seconds
    ///
    /// # Returns
    /// The new orientation, which is also retained as the current estimate
    pub fn update(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
        delta_time: f32,
    ) -> UnitQuaternion<f32> {
        let gyroscope = gyroscope.deg_to_rad();
        let accelerometer = accelerometer.safe_normalize();

        let accel_quaternion = Self::accelerometer_reference(accelerometer);

        // Three small axis rotations over one interval, combined in closed form.
        // Only valid while delta_time stays at the sample period.
        let angle = gyroscope * delta_time;
        let delta = quaternion_from_euler(angle.x, angle.y, angle.z);
        let gyro_quaternion = renormalize(self.quaternion.into_inner() * delta);

        let accel_quaternion = if gyro_quaternion.coords.dot(&accel_quaternion.coords) < 0.0 {
            -accel_quaternion
        } else {
            accel_quaternion
        };

        let alpha = self.settings.gyro_weight;
        let blended = gyro_quaternion.into_inner() * alpha + accel_quaternion * (1.0 - alpha);

        self.quaternion = renormalize(blended);
        self.quaternion
    }

    /// Get current orientation quaternion
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Set orientation quaternion directly
    pub fn set_quaternion(&mut self, quaternion: UnitQuaternion<f32>) {
        self.quaternion = quaternion;
    }

    /// Current orientation as (roll, pitch, yaw) in degrees
    pub fn euler_degrees(&self) -> Vector3<f32> {
        self.quaternion.to_euler_degrees()
    }

    /// Roll/pitch-only orientation implied by a normalized gravity reading
    ///
    /// A zero vector yields identity since `atan2(0, 0)` is zero.
    pub fn accelerometer_reference(accelerometer: Vector3<f32>) -> Quaternion<f32> {
        let (ax, ay, az) = (accelerometer.x, accelerometer.y, accelerometer.z);
        let roll = libm::atan2f(ay, az);
        let pitch = libm::atan2f(-ax, libm::sqrtf(ay * ay + az * az));
        quaternion_from_euler(roll, pitch, 0.0)
    }
}

impl Default for AttitudeEstimator {
    fn default() -> Self {
        Self::new()
    }
}
