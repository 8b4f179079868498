//! Common traits defining the seams of the MPC core

use nalgebra::{Matrix3, Matrix3x2};

use crate::common::types::*;
use crate::optimization::{Bounds, Solution};

/// Trait for vehicle/robot motion models
pub trait MotionModel {
    /// Propagate state forward in time
    fn propagate(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Pose2D;

    /// Jacobian of the next state with respect to the current state
    fn jacobian_state(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Matrix3<f64>;

    /// Jacobian of the next state with respect to the control input
    fn jacobian_control(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Matrix3x2<f64>;
}

/// Relative step used by the finite-difference gradient
pub const FINITE_DIFFERENCE_STEP: f64 = 1e-6;

/// Scalar objective over a flat decision vector
pub trait Objective {
    /// Number of decision variables
    fn dimension(&self) -> usize;

    /// Evaluate the objective at `x`
    fn value(&self, x: &[f64]) -> f64;

    /// Write the gradient at `x` into `grad`.
    ///
    /// The default uses central finite differences, costing two evaluations
    /// per variable. Implementors with an analytic gradient should override it.
    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        let mut shifted = x.to_vec();
        for i in 0..x.len() {
            let origin = shifted[i];
            let step = FINITE_DIFFERENCE_STEP * origin.abs().max(1.0);

            shifted[i] = origin + step;
            let f_plus = self.value(&shifted);
            shifted[i] = origin - step;
            let f_minus = self.value(&shifted);
            shifted[i] = origin;

            grad[i] = (f_plus - f_minus) / (2.0 * step);
        }
    }
}

/// Nonlinear programming backend for box-constrained problems
///
/// Backends never fail hard: whatever happens, the best iterate found is
/// returned together with a status describing how the search ended.
pub trait BoxConstrainedSolver {
    fn minimize<F: Objective + ?Sized>(
        &mut self,
        objective: &F,
        initial_guess: &[f64],
        bounds: &[Bounds],
    ) -> Solution;
}
