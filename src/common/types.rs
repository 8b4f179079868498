//! Common types used throughout mobile_mpc

use nalgebra::{Vector2, Vector3};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + heading), the robot state [x, y, theta]
///
/// The heading is never wrapped by the motion model; call
/// [`Pose2D::normalize_yaw`] when a bounded angle is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.yaw.is_finite()
    }

    /// Normalize yaw to [-pi, pi]
    pub fn normalize_yaw(&mut self) {
        while self.yaw > std::f64::consts::PI {
            self.yaw -= 2.0 * std::f64::consts::PI;
        }
        while self.yaw < -std::f64::consts::PI {
            self.yaw += 2.0 * std::f64::consts::PI;
        }
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2] }
    }
}

impl From<(f64, f64, f64)> for Pose2D {
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1, yaw: tuple.2 }
    }
}

/// Control input for differential drive robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInput {
    pub v: f64,      // linear velocity
    pub omega: f64,  // angular velocity
}

impl ControlInput {
    pub fn new(v: f64, omega: f64) -> Self {
        Self { v, omega }
    }

    pub fn zero() -> Self {
        Self { v: 0.0, omega: 0.0 }
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.v, self.omega)
    }
}

impl From<Vector2<f64>> for ControlInput {
    fn from(v: Vector2<f64>) -> Self {
        Self { v: v[0], omega: v[1] }
    }
}

impl Default for ControlInput {
    fn default() -> Self {
        Self::zero()
    }
}

/// Static point obstacles
#[derive(Debug, Clone)]
pub struct Obstacles {
    pub points: Vec<Point2D>,
}

impl Obstacles {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point2D> {
        self.points.iter()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

impl Default for Obstacles {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<(f64, f64)>> for Obstacles {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::from_points(points.into_iter().map(Point2D::from).collect())
    }
}
