//! MPC controller configuration
//!
//! Every field has a default, so a TOML file only needs to list what it
//! changes:
//!
//! ```toml
//! horizon = 15
//! safety_margin = 0.4
//!
//! [weights]
//! obstacle = 10.0
//!
//! [solver]
//! max_iterations = 50
//! ```

use std::f64::consts::PI;
use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{MpcError, MpcResult};
use crate::optimization::{Bounds, SolverConfig};

/// Weights of the stage cost terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub tracking: f64,
    pub effort: f64,
    pub obstacle: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            tracking: 1.0,
            effort: 0.1,
            obstacle: 1.0,
        }
    }
}

/// Configuration for the MPC controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpcConfig {
    /// Prediction horizon N [steps]
    pub horizon: usize,
    /// Time step [s]
    pub dt: f64,
    /// Maximum linear velocity magnitude [m/s]
    pub v_max: f64,
    /// Maximum angular velocity magnitude [rad/s]
    pub omega_max: f64,
    /// Distance below which obstacles are penalized [m]
    pub safety_margin: f64,
    pub weights: CostWeights,
    pub solver: SolverConfig,
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            horizon: 10,
            dt: 0.1,
            v_max: 1.0,
            omega_max: PI / 2.0,
            safety_margin: 0.5,
            weights: CostWeights::default(),
            solver: SolverConfig::default(),
        }
    }
}

fn require_positive(name: &str, value: f64) -> MpcResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MpcError::InvalidParameter(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

fn require_non_negative(name: &str, value: f64) -> MpcResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MpcError::InvalidParameter(format!(
            "{} must be a non-negative finite number, got {}",
            name, value
        )))
    }
}

impl MpcConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> MpcResult<Self> {
        let config: MpcConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> MpcResult<Self> {
        let text = read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> MpcResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the controller cannot run with
    pub fn validate(&self) -> MpcResult<()> {
        if self.horizon == 0 {
            return Err(MpcError::InvalidParameter(
                "horizon must be at least one step".to_string(),
            ));
        }
        require_positive("dt", self.dt)?;
        require_positive("v_max", self.v_max)?;
        require_positive("omega_max", self.omega_max)?;
        require_positive("safety_margin", self.safety_margin)?;

        require_non_negative("weights.tracking", self.weights.tracking)?;
        require_non_negative("weights.effort", self.weights.effort)?;
        require_non_negative("weights.obstacle", self.weights.obstacle)?;

        let solver = &self.solver;
        if solver.max_iterations == 0 {
            return Err(MpcError::InvalidParameter(
                "solver.max_iterations must be at least one".to_string(),
            ));
        }
        require_positive("solver.tolerance", solver.tolerance)?;
        require_positive("solver.sufficient_decrease", solver.sufficient_decrease)?;
        require_positive("solver.min_spectral_step", solver.min_spectral_step)?;
        require_positive("solver.max_spectral_step", solver.max_spectral_step)?;
        require_positive("solver.min_line_search_step", solver.min_line_search_step)?;
        if solver.min_spectral_step > solver.max_spectral_step {
            return Err(MpcError::InvalidParameter(
                "solver.min_spectral_step exceeds solver.max_spectral_step".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of scalars in the flattened control sequence
    pub fn decision_dimension(&self) -> usize {
        2 * self.horizon
    }

    /// Box constraints [v, omega] repeated for every horizon step
    pub fn control_bounds(&self) -> Vec<Bounds> {
        (0..self.horizon)
            .flat_map(|_| [Bounds::symmetric(self.v_max), Bounds::symmetric(self.omega_max)])
            .collect()
    }
}
