//! Mathematical utilities and nalgebra extensions

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;

    /// Convert degrees to radians
    fn deg_to_rad(&self) -> Vector3<f32>;

    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z);
        if mag > 0.0 {
            *self / mag
        } else {
            Vector3::zeros()
        }
    }

    fn deg_to_rad(&self) -> Vector3<f32> {
        *self * DEG_TO_RAD
    }

    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt {
    /// Convert quaternion to Euler angles (roll, pitch, yaw) in degrees
    fn to_euler_degrees(&self) -> Vector3<f32>;
}

impl QuaternionExt for UnitQuaternion<f32> {
    fn to_euler_degrees(&self) -> Vector3<f32> {
        let (roll, pitch, yaw) = self.euler_angles();
        Vector3::new(roll, pitch, yaw).rad_to_deg()
    }
}

/// Build a quaternion from roll, pitch and yaw angles in radians (ZYX order)
///
/// Evaluated with the combined half-angle expansion rather than three
/// sequential axis rotations. The result is unit length for finite input.
pub fn quaternion_from_euler(roll: f32, pitch: f32, yaw: f32) -> Quaternion<f32> {
    let (sr, cr) = (libm::sinf(roll * 0.5), libm::cosf(roll * 0.5));
    let (sp, cp) = (libm::sinf(pitch * 0.5), libm::cosf(pitch * 0.5));
    let (sy, cy) = (libm::sinf(yaw * 0.5), libm::cosf(yaw * 0.5));

    Quaternion::new(
        cr * cp * cy + sr * sp * sy,
        sr * cp * cy - cr * sp * sy,
        cr * sp * cy + sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
    )
}

/// Renormalize a quaternion, falling back to identity for a zero-length input
pub fn renormalize(q: Quaternion<f32>) -> UnitQuaternion<f32> {
    let norm_squared = q.w * q.w + q.i * q.i + q.j * q.j + q.k * q.k;
    if norm_squared > 0.0 {
        UnitQuaternion::new_unchecked(q / libm::sqrtf(norm_squared))
    } else {
        UnitQuaternion::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_extensions() {
        let v = Vector3::new(3.0f32, 4.0, 0.0);
        let normalized = v.safe_normalize();
        assert!((normalized.norm() - 1.0).abs() < 1e-6);
        assert!((normalized.x - 0.6).abs() < 1e-6);

        assert_eq!(Vector3::<f32>::zeros().safe_normalize(), Vector3::zeros());
    }

    #[test]
    fn test_euler_expansion_matches_nalgebra() {
        let (roll, pitch, yaw) = (0.3f32, -0.2, 1.1);
        let ours = quaternion_from_euler(roll, pitch, yaw);
        let reference = UnitQuaternion::from_euler_angles(roll, pitch, yaw);

        // q and -q are the same rotation
        let diff = (ours.coords - reference.coords).norm();
        let diff_neg = (ours.coords + reference.coords).norm();
        assert!(diff.min(diff_neg) < 1e-5);
    }

    #[test]
    fn test_renormalize() {
        let q = renormalize(Quaternion::new(2.0, 0.0, 0.0, 0.0));
        assert!((q.w - 1.0).abs() < 1e-6);

        let q = renormalize(Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(q, UnitQuaternion::identity());
    }

    #[test]
    fn test_euler_degrees() {
        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, core::f32::consts::FRAC_PI_2);
        let euler = q.to_euler_degrees();
        assert!((euler.z - 90.0).abs() < 1e-3);
    }
}
