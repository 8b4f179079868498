//! Receding horizon simulation
//!
//! Every cycle hands the next `horizon` reference poses to the controller,
//! applies the first planned command through the motion model and records
//! what happened. The loop runs `trajectory.len() - horizon` cycles.

use log::{info, warn};

use crate::common::{BoxConstrainedSolver, ControlInput, MotionModel, MpcResult, Obstacles, Pose2D};
use crate::optimization::SolverStatus;
use crate::path_tracking::{MpcController, MpcSolution};
use crate::utils::trajectory_generator::distance_to_trajectory;

/// Command applied when the solver did not converge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Apply the best plan found anyway
    #[default]
    ApplyAnyway,
    /// Stop the robot
    Brake,
    /// Repeat the previously applied command
    HoldPrevious,
}

impl FallbackPolicy {
    fn select(&self, solution: &MpcSolution, previous: ControlInput) -> ControlInput {
        match self {
            FallbackPolicy::ApplyAnyway => solution.first(),
            FallbackPolicy::Brake => ControlInput::zero(),
            FallbackPolicy::HoldPrevious => previous,
        }
    }
}

/// Record of a simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationLog {
    /// Visited states, starting with the initial one
    pub states: Vec<Pose2D>,
    /// Command applied in each cycle
    pub controls: Vec<ControlInput>,
    pub statuses: Vec<SolverStatus>,
    pub costs: Vec<f64>,
    pub iterations: Vec<usize>,
    /// Predicted states of each cycle's plan
    pub horizons: Vec<Vec<Pose2D>>,
}

impl SimulationLog {
    /// Number of control cycles run
    pub fn steps(&self) -> usize {
        self.controls.len()
    }

    pub fn final_state(&self) -> Option<&Pose2D> {
        self.states.last()
    }

    /// Largest distance from a visited state to its nearest reference point
    pub fn max_tracking_error(&self, reference: &[Pose2D]) -> Option<f64> {
        self.states
            .iter()
            .filter_map(|s| distance_to_trajectory(reference, &s.position()))
            .reduce(f64::max)
    }

    /// Smallest distance between a visited state and any obstacle
    pub fn min_clearance(&self, obstacles: &Obstacles) -> Option<f64> {
        self.states
            .iter()
            .flat_map(|s| obstacles.iter().map(move |o| s.position().distance(o)))
            .reduce(f64::min)
    }

    /// Share of cycles whose solve converged; 1.0 for an empty run
    pub fn convergence_rate(&self) -> f64 {
        if self.statuses.is_empty() {
            return 1.0;
        }
        let converged = self.statuses.iter().filter(|s| s.is_converged()).count();
        converged as f64 / self.statuses.len() as f64
    }
}

/// Closed loop of controller and motion model
pub struct Simulator<M, S> {
    controller: MpcController<M, S>,
    fallback: FallbackPolicy,
}

impl<M: MotionModel, S: BoxConstrainedSolver> Simulator<M, S> {
    pub fn new(controller: MpcController<M, S>) -> Self {
        Simulator {
            controller,
            fallback: FallbackPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn controller(&self) -> &MpcController<M, S> {
        &self.controller
    }

    /// Track `trajectory` from `initial`
    ///
    /// A trajectory no longer than the horizon runs zero cycles.
    pub fn run(
        &mut self,
        initial: Pose2D,
        trajectory: &[Pose2D],
        obstacles: &Obstacles,
    ) -> MpcResult<SimulationLog> {
        let horizon = self.controller.config().horizon;
        let dt = self.controller.config().dt;
        let cycles = trajectory.len().saturating_sub(horizon);

        let mut log = SimulationLog::default();
        log.states.push(initial);

        let mut state = initial;
        let mut previous = ControlInput::zero();
        for (i, window) in trajectory.windows(horizon).take(cycles).enumerate() {
            let solution = self.controller.optimize(&state, window, obstacles)?;

            let command = if solution.is_converged() {
                solution.first()
            } else {
                let command = self.fallback.select(&solution, previous);
                warn!(
                    "Step {}: solver returned {:?}, applying {:?} ({:?})",
                    i, solution.status, command, self.fallback
                );
                command
            };

            state = self.controller.model().propagate(&state, &command, dt);
            info!("Step {}: Position (x, y) = ({:.3}, {:.3})", i, state.x, state.y);

            log.states.push(state);
            log.controls.push(command);
            log.statuses.push(solution.status);
            log.costs.push(solution.cost);
            log.iterations.push(solution.iterations);
            log.horizons.push(solution.predicted);
            previous = command;
        }
        Ok(log)
    }
}
