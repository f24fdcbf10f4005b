//! 直角旋转与刚体变换
//!
//! 姿态只能由三个固定生成元 ROLL / PITCH / YAW 的幂组合得到：
//! - 整数次幂：90° 步进，使用精确的整数矩阵
//! - 分数次幂（精细模式）：例如 1/18 直角 = 5°
//!
//! 因此姿态始终是真旋转（正交且行列式为 +1）。

use crate::math::{Point3, Vector3};
use nalgebra::{Matrix3, Rotation3, Unit};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// 绕 x 轴 +90°
pub const ROLL: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
/// 绕 y 轴 -90°
pub const PITCH: [[f64; 3]; 3] = [[0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
/// 绕 z 轴 +90°
pub const YAW: [[f64; 3]; 3] = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];

/// 精细旋转步长（直角的分数）：5°
pub const FINE_ROTATION_STEP: f64 = 1.0 / 18.0;

/// 旋转生成元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generator {
    Roll,
    Pitch,
    Yaw,
}

impl Generator {
    fn matrix(self) -> Matrix3<f64> {
        let rows = match self {
            Generator::Roll => ROLL,
            Generator::Pitch => PITCH,
            Generator::Yaw => YAW,
        };
        Matrix3::from_fn(|r, c| rows[r][c])
    }

    /// 生成元对应的旋转轴与方向（角度为正时的转向）
    fn axis_angle(self, right_angles: f64) -> (Unit<Vector3>, f64) {
        match self {
            Generator::Roll => (Vector3::x_axis(), right_angles * FRAC_PI_2),
            Generator::Pitch => (Vector3::y_axis(), -right_angles * FRAC_PI_2),
            Generator::Yaw => (Vector3::z_axis(), right_angles * FRAC_PI_2),
        }
    }

    /// 生成元的 `power` 次幂
    pub fn power(self, power: f64) -> Rotation3<f64> {
        if power.fract() == 0.0 {
            let turns = (power as i64).rem_euclid(4);
            let step = self.matrix();
            let mut m = Matrix3::identity();
            for _ in 0..turns {
                m = step * m;
            }
            Rotation3::from_matrix_unchecked(m)
        } else {
            let (axis, angle) = self.axis_angle(power);
            Rotation3::from_axis_angle(&axis, angle)
        }
    }
}

/// 直角旋转：ROLL^roll · PITCH^pitch · YAW^yaw
///
/// 参数以直角为单位，整数为 90° 步进，分数为精细旋转。
pub fn right_angle_rotation(roll: f64, pitch: f64, yaw: f64) -> Rotation3<f64> {
    Generator::Roll.power(roll) * Generator::Pitch.power(pitch) * Generator::Yaw.power(yaw)
}

/// 检查矩阵是否为真旋转
pub fn is_proper_rotation(m: &Matrix3<f64>, tolerance: f64) -> bool {
    let identity_error = (m.transpose() * m - Matrix3::identity()).amax();
    identity_error <= tolerance && (m.determinant() - 1.0).abs() <= tolerance
}

/// 刚体变换：位置 + 姿态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector3,
    orientation: Rotation3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: Rotation3::identity(),
        }
    }

    pub fn from_position(position: Vector3) -> Self {
        Self {
            position,
            orientation: Rotation3::identity(),
        }
    }

    pub fn orientation(&self) -> &Rotation3<f64> {
        &self.orientation
    }

    pub fn translate(&mut self, v: &Vector3) {
        self.position += v;
    }

    /// 左乘旋转（绕自身位置，位置不变）
    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        self.orientation = rotation * self.orientation;
    }

    /// 绕 `center` 旋转：位置 `R·(p - c) + c`，姿态左乘 `R`
    pub fn rotate_about(&mut self, rotation: &Rotation3<f64>, center: &Point3) {
        let offset = self.position - center.coords;
        self.position = rotation * offset + center.coords;
        self.rotate(rotation);
    }

    /// 局部坐标 → 世界坐标
    pub fn apply(&self, local: &Point3) -> Point3 {
        Point3::from(self.orientation * local.coords + self.position)
    }

    /// 局部方向 → 世界方向
    pub fn apply_vector(&self, local: &Vector3) -> Vector3 {
        self.orientation * local
    }

    /// 姿态的轴角表示（角度为弧度；单位姿态时轴为 z）
    pub fn axis_angle(&self) -> (Vector3, f64) {
        match self.orientation.axis_angle() {
            Some((axis, angle)) => (axis.into_inner(), angle),
            None => (Vector3::z(), 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::EPSILON;

    #[test]
    fn test_generators_are_right_angles() {
        let x = Vector3::x();
        let y = Vector3::y();
        assert!((Generator::Roll.power(1.0) * y - Vector3::z()).norm() < EPSILON);
        assert!((Generator::Pitch.power(1.0) * x - Vector3::z()).norm() < EPSILON);
        assert!((Generator::Yaw.power(1.0) * x - y).norm() < EPSILON);
    }

    #[test]
    fn test_four_quarter_turns_return_to_start() {
        for arg in 1..4 {
            for axis in 0..3 {
                let a = arg as f64;
                let (r, p, y) = match axis {
                    0 => (a, 0.0, 0.0),
                    1 => (0.0, a, 0.0),
                    _ => (0.0, 0.0, a),
                };
                let mut transform = Transform::identity();
                let start = *transform.orientation();
                for _ in 0..4 {
                    transform.rotate(&right_angle_rotation(r, p, y));
                }
                assert!((transform.orientation().matrix() - start.matrix()).amax() < EPSILON);
            }
        }
    }

    #[test]
    fn test_fine_steps_compose_to_right_angle() {
        let mut transform = Transform::identity();
        for _ in 0..18 {
            transform.rotate(&right_angle_rotation(0.0, 0.0, FINE_ROTATION_STEP));
        }
        let quarter = right_angle_rotation(0.0, 0.0, 1.0);
        assert!((transform.orientation().matrix() - quarter.matrix()).amax() < 1e-9);
        assert!(is_proper_rotation(transform.orientation().matrix(), 1e-9));
    }

    #[test]
    fn test_negative_powers_invert() {
        let r = right_angle_rotation(1.0, 2.0, 3.0) * right_angle_rotation(0.0, 0.0, -3.0);
        let expected = right_angle_rotation(1.0, 2.0, 0.0);
        assert!((r.matrix() - expected.matrix()).amax() < EPSILON);
    }

    #[test]
    fn test_translate_roundtrip_exact() {
        let mut t = Transform::from_position(Vector3::new(3.0, -7.0, 12.0));
        let v = Vector3::new(25.0, 40.0, -5.0);
        t.translate(&v);
        t.translate(&-v);
        assert_eq!(t.position, Vector3::new(3.0, -7.0, 12.0));
    }

    #[test]
    fn test_rotate_about_center() {
        let mut t = Transform::from_position(Vector3::new(10.0, 0.0, 0.0));
        t.rotate_about(&right_angle_rotation(0.0, 0.0, 1.0), &Point3::new(5.0, 0.0, 0.0));
        assert!((t.position - Vector3::new(5.0, 5.0, 0.0)).norm() < EPSILON);
    }

    #[test]
    fn test_rejects_improper_matrix() {
        let mirror = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        assert!(!is_proper_rotation(&mirror, 1e-6));
        assert!(is_proper_rotation(&Matrix3::identity(), 1e-6));
    }
}
