// Model Predictive Control (MPC) for a differential drive robot
//
// Every cycle optimizes a sequence of N [v, omega] commands against a
// reference window and the known obstacles, then hands back the whole plan.
// Only the first command is meant to be applied (receding horizon).

use log::{debug, warn};

use super::motion_model::DifferentialDrive;
use super::mpc_config::MpcConfig;
use super::mpc_objective::{controls_from_flat, MpcObjective};
use crate::common::{
    BoxConstrainedSolver, ControlInput, MotionModel, MpcError, MpcResult, Obstacles, Pose2D,
};
use crate::optimization::{SolverStatus, SpectralProjectedGradient};

/// Optimal plan of one MPC cycle
#[derive(Debug, Clone)]
pub struct MpcSolution {
    /// N commands, within the actuator limits
    pub controls: Vec<ControlInput>,
    /// N + 1 predicted states, starting with the current one
    pub predicted: Vec<Pose2D>,
    /// Objective value of `controls`
    pub cost: f64,
    pub status: SolverStatus,
    pub iterations: usize,
}

impl MpcSolution {
    /// Command to apply now
    pub fn first(&self) -> ControlInput {
        self.controls.first().copied().unwrap_or_default()
    }

    pub fn is_converged(&self) -> bool {
        self.status.is_converged()
    }
}

/// Receding horizon controller
pub struct MpcController<M = DifferentialDrive, S = SpectralProjectedGradient> {
    config: MpcConfig,
    model: M,
    solver: S,
}

impl MpcController {
    /// Controller with the default robot and the SPG backend
    pub fn new(config: MpcConfig) -> MpcResult<Self> {
        let solver = SpectralProjectedGradient::new(config.solver.clone());
        Self::with_components(config, DifferentialDrive::default(), solver)
    }
}

impl<M: MotionModel, S: BoxConstrainedSolver> MpcController<M, S> {
    /// Controller around a custom model and solver backend
    ///
    /// The backend keeps its own settings, `config.solver` is only read by
    /// [`MpcController::new`].
    pub fn with_components(config: MpcConfig, model: M, solver: S) -> MpcResult<Self> {
        config.validate()?;
        Ok(MpcController { config, model, solver })
    }

    pub fn config(&self) -> &MpcConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Solve one MPC cycle
    ///
    /// `reference` must hold exactly one pose per horizon step. The solver
    /// starts from all-zero controls. A plan is returned whether or not the
    /// solver converged; check [`MpcSolution::status`].
    pub fn optimize(
        &mut self,
        state: &Pose2D,
        reference: &[Pose2D],
        obstacles: &Obstacles,
    ) -> MpcResult<MpcSolution> {
        let horizon = self.config.horizon;
        if reference.len() != horizon {
            return Err(MpcError::ShapeMismatch {
                what: "reference window",
                expected: horizon,
                got: reference.len(),
            });
        }
        if !state.is_finite() {
            return Err(MpcError::InvalidParameter(format!(
                "current state must be finite, got {:?}",
                state
            )));
        }
        if let Some(bad) = reference.iter().find(|pose| !pose.is_finite()) {
            return Err(MpcError::InvalidParameter(format!(
                "reference poses must be finite, got {:?}",
                bad
            )));
        }

        let objective = MpcObjective::new(&self.model, &self.config, *state, reference, obstacles);
        let bounds = self.config.control_bounds();
        let initial_guess = vec![0.0; self.config.decision_dimension()];

        let solution = self.solver.minimize(&objective, &initial_guess, &bounds);
        match solution.status {
            SolverStatus::Converged => debug!(
                "MPC solved in {} iterations, cost {:.6}",
                solution.iterations, solution.value
            ),
            status => warn!(
                "MPC solver stopped with {:?} after {} iterations, cost {:.6}",
                status, solution.iterations, solution.value
            ),
        }

        let predicted = objective.predict(&solution.x);
        Ok(MpcSolution {
            controls: controls_from_flat(&solution.x),
            predicted,
            cost: solution.value,
            status: solution.status,
            iterations: solution.iterations,
        })
    }
}
