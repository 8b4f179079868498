//! Differential drive kinematic model
//!
//! State [x, y, yaw], control [v, omega]:
//!
//! ```text
//! x'   = x + v cos(yaw) dt
//! y'   = y + v sin(yaw) dt
//! yaw' = yaw + omega dt
//! ```
//!
//! The heading is left unwrapped and velocities are not clamped; actuator
//! limits are the optimizer's job.

use nalgebra::{Matrix3, Matrix3x2};

use crate::common::{ControlInput, MotionModel, Pose2D};

/// Differential drive robot with its wheel geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    /// Wheel radius [m]
    pub wheel_radius: f64,
    /// Distance between the two drive wheels [m]
    pub wheel_base: f64,
}

impl DifferentialDrive {
    pub fn new(wheel_radius: f64, wheel_base: f64) -> Self {
        DifferentialDrive { wheel_radius, wheel_base }
    }

    /// One Euler step of the unicycle kinematics
    pub fn advance(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Pose2D {
        Pose2D::new(
            state.x + control.v * state.yaw.cos() * dt,
            state.y + control.v * state.yaw.sin() * dt,
            state.yaw + control.omega * dt,
        )
    }

    /// Left/right wheel angular speeds [rad/s] realizing a body command
    pub fn wheel_speeds(&self, control: &ControlInput) -> (f64, f64) {
        let half_base = self.wheel_base / 2.0;
        let left = (control.v - control.omega * half_base) / self.wheel_radius;
        let right = (control.v + control.omega * half_base) / self.wheel_radius;
        (left, right)
    }

    /// Body command produced by the given wheel angular speeds
    pub fn body_velocity(&self, left: f64, right: f64) -> ControlInput {
        let v = self.wheel_radius * (left + right) / 2.0;
        let omega = self.wheel_radius * (right - left) / self.wheel_base;
        ControlInput::new(v, omega)
    }
}

impl Default for DifferentialDrive {
    fn default() -> Self {
        DifferentialDrive::new(0.1, 0.5)
    }
}

impl MotionModel for DifferentialDrive {
    fn propagate(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Pose2D {
        self.advance(state, control, dt)
    }

    fn jacobian_state(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Matrix3<f64> {
        let (sin_yaw, cos_yaw) = state.yaw.sin_cos();
        Matrix3::new(
            1., 0., -control.v * sin_yaw * dt,
            0., 1., control.v * cos_yaw * dt,
            0., 0., 1.,
        )
    }

    fn jacobian_control(&self, state: &Pose2D, _control: &ControlInput, dt: f64) -> Matrix3x2<f64> {
        let (sin_yaw, cos_yaw) = state.yaw.sin_cos();
        Matrix3x2::new(
            cos_yaw * dt, 0.,
            sin_yaw * dt, 0.,
            0., dt,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_zero_control_is_identity() {
        let model = DifferentialDrive::default();
        let state = Pose2D::new(1.5, -0.3, 2.0);
        for &dt in &[0.0, 0.1, 1.0, 25.0] {
            let next = model.advance(&state, &ControlInput::zero(), dt);
            assert_eq!(next, state);
        }
    }

    #[test]
    fn test_straight_line_step() {
        let model = DifferentialDrive::default();
        let next = model.advance(&Pose2D::origin(), &ControlInput::new(1.0, 0.0), 1.0);
        assert!((next.x - 1.0).abs() < 1e-12);
        assert!(next.y.abs() < 1e-12);
        assert!(next.yaw.abs() < 1e-12);
    }

    #[test]
    fn test_heading_is_not_wrapped() {
        let model = DifferentialDrive::default();
        let mut state = Pose2D::origin();
        for _ in 0..100 {
            state = model.advance(&state, &ControlInput::new(0.0, PI), 0.1);
        }
        assert!((state.yaw - 10.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_unbounded_velocity_accepted() {
        let model = DifferentialDrive::default();
        let next = model.advance(&Pose2D::new(0.0, 0.0, PI / 2.0), &ControlInput::new(50.0, 0.0), 0.1);
        assert!((next.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_jacobians_match_finite_differences() {
        let model = DifferentialDrive::default();
        let state = Pose2D::new(0.4, -1.0, 0.7);
        let control = ControlInput::new(0.8, -0.3);
        let dt = 0.1;
        let h = 1e-7;

        let a = model.jacobian_state(&state, &control, dt);
        let base = model.propagate(&state, &control, dt).to_vector();
        for j in 0..3 {
            let mut perturbed = state.to_vector();
            perturbed[j] += h;
            let next = model.propagate(&Pose2D::from(perturbed), &control, dt).to_vector();
            let column = (next - base) / h;
            for i in 0..3 {
                assert!((a[(i, j)] - column[i]).abs() < 1e-6);
            }
        }

        let b = model.jacobian_control(&state, &control, dt);
        for j in 0..2 {
            let mut perturbed = control.to_vector();
            perturbed[j] += h;
            let next = model.propagate(&state, &ControlInput::from(perturbed), dt).to_vector();
            let column = (next - base) / h;
            for i in 0..3 {
                assert!((b[(i, j)] - column[i]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_wheel_speeds_round_trip() {
        let model = DifferentialDrive::default();
        let (left, right) = model.wheel_speeds(&ControlInput::new(0.5, 1.0));
        // v = 0.5, omega * b / 2 = 0.25, r = 0.1
        assert!((left - 2.5).abs() < 1e-12);
        assert!((right - 7.5).abs() < 1e-12);

        let back = model.body_velocity(left, right);
        assert!((back.v - 0.5).abs() < 1e-12);
        assert!((back.omega - 1.0).abs() < 1e-12);
    }
}
