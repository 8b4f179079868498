// Path Tracking: model predictive control of a differential drive robot

pub mod motion_model;
pub mod cost;
pub mod mpc_config;
pub mod mpc_objective;
pub mod mpc;

pub use motion_model::*;
pub use cost::*;
pub use mpc_config::*;
pub use mpc_objective::*;
pub use mpc::*;
