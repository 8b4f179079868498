//! Utility modules for mobile_mpc

pub mod trajectory_generator;
pub mod visualization;

pub use trajectory_generator::*;
pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
