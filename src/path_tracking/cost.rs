//! Stage cost terms of the MPC objective
//!
//! Each term is pure. The gradients are with respect to the robot position
//! (tracking, obstacle) or the control input (effort).

use nalgebra::Vector2;

use crate::common::{ControlInput, Obstacles, Point2D};

/// Squared position error, heading excluded
pub fn tracking_cost(position: &Point2D, reference: &Point2D) -> f64 {
    (position.x - reference.x).powi(2) + (position.y - reference.y).powi(2)
}

pub fn tracking_gradient(position: &Point2D, reference: &Point2D) -> Vector2<f64> {
    Vector2::new(2.0 * (position.x - reference.x), 2.0 * (position.y - reference.y))
}

/// Squared norm of [v, omega]
pub fn effort_cost(control: &ControlInput) -> f64 {
    control.v * control.v + control.omega * control.omega
}

pub fn effort_gradient(control: &ControlInput) -> Vector2<f64> {
    Vector2::new(2.0 * control.v, 2.0 * control.omega)
}

/// Quadratic penalty inside the safety margin of every obstacle
///
/// Sums (margin - d)^2 over the obstacles closer than `margin`; anything
/// at or beyond the margin contributes nothing. The penalty is C1 at the
/// margin boundary.
pub fn obstacle_cost(position: &Point2D, obstacles: &Obstacles, margin: f64) -> f64 {
    obstacles
        .iter()
        .map(|obstacle| position.distance(obstacle))
        .filter(|&d| d < margin)
        .map(|d| (margin - d).powi(2))
        .sum()
}

/// Gradient of [`obstacle_cost`]; zero for an obstacle exactly under the robot
pub fn obstacle_gradient(position: &Point2D, obstacles: &Obstacles, margin: f64) -> Vector2<f64> {
    let mut grad = Vector2::zeros();
    for obstacle in obstacles.iter() {
        let offset = position.to_vector() - obstacle.to_vector();
        let d = offset.norm();
        if d < margin && d > f64::EPSILON {
            grad -= offset * (2.0 * (margin - d) / d);
        }
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_cost_zero_on_reference() {
        for &(x, y) in &[(0.0, 0.0), (1.5, -2.0), (-1e3, 7.0)] {
            let p = Point2D::new(x, y);
            assert_eq!(tracking_cost(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_tracking_cost_positive_off_reference() {
        let cost = tracking_cost(&Point2D::new(1.0, 2.0), &Point2D::new(4.0, 6.0));
        assert!((cost - 25.0).abs() < 1e-12);
        assert!(tracking_cost(&Point2D::new(1e-4, 0.0), &Point2D::origin()) > 0.0);
    }

    #[test]
    fn test_effort_cost() {
        assert!((effort_cost(&ControlInput::new(0.6, -0.8)) - 1.0).abs() < 1e-12);
        assert_eq!(effort_cost(&ControlInput::zero()), 0.0);
    }

    #[test]
    fn test_obstacle_cost_outside_margin() {
        let obstacles = Obstacles::from(vec![(1.0, 0.0)]);
        assert_eq!(obstacle_cost(&Point2D::new(0.5, 0.0), &obstacles, 0.5), 0.0);
        assert_eq!(obstacle_cost(&Point2D::new(-3.0, 2.0), &obstacles, 0.5), 0.0);
    }

    #[test]
    fn test_obstacle_cost_inside_margin() {
        let obstacles = Obstacles::from(vec![(1.0, 0.0)]);
        let cost = obstacle_cost(&Point2D::new(0.8, 0.0), &obstacles, 0.5);
        assert!((cost - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_cost_sums_over_obstacles() {
        let obstacles = Obstacles::from(vec![(0.1, 0.0), (-0.2, 0.0), (5.0, 5.0)]);
        let cost = obstacle_cost(&Point2D::origin(), &obstacles, 0.5);
        assert!((cost - (0.16 + 0.09)).abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_cost_no_obstacles() {
        let empty = Obstacles::new();
        assert_eq!(obstacle_cost(&Point2D::new(0.3, 0.3), &empty, 0.5), 0.0);
        assert_eq!(obstacle_gradient(&Point2D::new(0.3, 0.3), &empty, 0.5), Vector2::zeros());
    }

    #[test]
    fn test_obstacle_gradient_points_towards_obstacle() {
        // Descent direction (-grad) must push away from the obstacle
        let obstacles = Obstacles::from(vec![(1.0, 0.0)]);
        let grad = obstacle_gradient(&Point2D::new(0.8, 0.0), &obstacles, 0.5);
        assert!((grad[0] - 0.6).abs() < 1e-12);
        assert!(grad[1].abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_gradient_at_obstacle_is_zero() {
        let obstacles = Obstacles::from(vec![(1.0, 1.0)]);
        let grad = obstacle_gradient(&Point2D::new(1.0, 1.0), &obstacles, 0.5);
        assert_eq!(grad, Vector2::zeros());
    }
}
