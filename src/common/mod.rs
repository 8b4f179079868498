//! Common types, traits, and error definitions for mobile_mpc
//!
//! This module provides the foundational building blocks shared by the
//! motion model, the cost terms, the optimizer and the controller.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
