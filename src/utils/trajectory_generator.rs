//! Reference trajectory generators
//!
//! Both generators sample their parameter inclusively at both ends, so a
//! circle of n points repeats its first point at the end.

use ordered_float::OrderedFloat;

use crate::common::{Point2D, Pose2D};

/// `count` evenly spaced samples from `start` to `end`, both included
fn linspace(start: f64, end: f64, count: usize) -> impl Iterator<Item = f64> {
    let step = if count > 1 {
        (end - start) / (count - 1) as f64
    } else {
        0.0
    };
    (0..count).map(move |i| start + step * i as f64)
}

/// Points on a circle, heading equal to the parametric angle
pub fn circular_trajectory(radius: f64, count: usize, center: Point2D) -> Vec<Pose2D> {
    linspace(0.0, 2.0 * std::f64::consts::PI, count)
        .map(|t| Pose2D::new(center.x + radius * t.cos(), center.y + radius * t.sin(), t))
        .collect()
}

/// Straight segment with constant heading towards `end`
pub fn linear_trajectory(start: Point2D, end: Point2D, count: usize) -> Vec<Pose2D> {
    let yaw = (end.y - start.y).atan2(end.x - start.x);
    linspace(0.0, 1.0, count)
        .map(|s| {
            Pose2D::new(
                start.x + s * (end.x - start.x),
                start.y + s * (end.y - start.y),
                yaw,
            )
        })
        .collect()
}

/// Index of the trajectory point closest to `position`
pub fn nearest_index(trajectory: &[Pose2D], position: &Point2D) -> Option<usize> {
    trajectory
        .iter()
        .enumerate()
        .min_by_key(|(_, pose)| OrderedFloat(pose.position().distance(position)))
        .map(|(i, _)| i)
}

/// Distance from `position` to the closest trajectory point
pub fn distance_to_trajectory(trajectory: &[Pose2D], position: &Point2D) -> Option<f64> {
    nearest_index(trajectory, position).map(|i| trajectory[i].position().distance(position))
}
