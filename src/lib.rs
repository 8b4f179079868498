//! mobile_mpc - Model Predictive Control for a differential drive robot
//!
//! This crate provides the motion model, cost terms and objective of an
//! obstacle-aware MPC tracker, a box-constrained nonlinear solver, the
//! controller facade and a receding horizon simulation loop.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod optimization;
pub mod path_tracking;
pub mod simulation;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, ControlInput, Obstacles};
pub use common::{MotionModel, Objective, BoxConstrainedSolver};
pub use common::{MpcError, MpcResult};
pub use optimization::{Bounds, Solution, SolverConfig, SolverStatus, SpectralProjectedGradient};
pub use path_tracking::{CostWeights, DifferentialDrive, MpcConfig, MpcController, MpcSolution};
pub use simulation::{FallbackPolicy, SimulationLog, Simulator};
