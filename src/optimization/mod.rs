//! Box-constrained nonlinear optimization
//!
//! Backends implement [`BoxConstrainedSolver`](crate::common::BoxConstrainedSolver)
//! and report how the search ended through [`SolverStatus`] instead of failing.

pub mod spg;

pub use spg::*;

use serde::{Deserialize, Serialize};

/// Independent lower/upper bound on one decision variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Bounds of the form [-limit, limit]
    pub fn symmetric(limit: f64) -> Self {
        Self { lower: -limit, upper: limit }
    }

    /// Lower bound not above upper bound, neither NaN
    pub fn is_valid(&self) -> bool {
        self.lower <= self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Closest point of the interval to `value`
    pub fn project(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

/// How a solve ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Projected gradient below tolerance
    Converged,
    /// Iteration budget exhausted
    MaxIterations,
    /// Backtracking could not find sufficient decrease
    LineSearchFailed,
    /// Objective or gradient evaluated to NaN/inf
    NonFinite,
    /// Some lower bound lies above its upper bound
    Infeasible,
}

impl SolverStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, SolverStatus::Converged)
    }
}

/// Result of one minimization
#[derive(Debug, Clone)]
pub struct Solution {
    /// Best iterate found
    pub x: Vec<f64>,
    /// Objective value at `x`
    pub value: f64,
    pub status: SolverStatus,
    pub iterations: usize,
    /// Number of objective evaluations, gradients excluded
    pub evaluations: usize,
}

/// Tuning of the iterative solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Iteration cap bounding worst-case latency
    pub max_iterations: usize,
    /// Stop when the infinity norm of the projected gradient falls below this
    pub tolerance: f64,
    /// Number of past objective values used by the nonmonotone line search
    pub history_length: usize,
    /// Armijo sufficient-decrease constant
    pub sufficient_decrease: f64,
    /// Clamp on the spectral step length
    pub min_spectral_step: f64,
    pub max_spectral_step: f64,
    /// Backtracking gives up below this step fraction
    pub min_line_search_step: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            history_length: 10,
            sufficient_decrease: 1e-4,
            min_spectral_step: 1e-10,
            max_spectral_step: 1e10,
            min_line_search_step: 1e-12,
        }
    }
}
