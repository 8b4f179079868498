//! MPC objective over a flattened control sequence
//!
//! The decision vector is laid out as [v0, omega0, v1, omega1, ...]. One
//! evaluation rolls the motion model forward from the current state and
//! sums, for every horizon step i,
//!
//! ```text
//! w_track * |p_i - r_i|^2 + w_effort * |u_i|^2 + w_obstacle * obstacle_cost(p_i)
//! ```
//!
//! where p_i is the predicted position after applying u_i.

use std::cell::RefCell;

use itertools::Itertools;
use nalgebra::Vector3;

use super::cost::{
    effort_cost, effort_gradient, obstacle_cost, obstacle_gradient, tracking_cost,
    tracking_gradient,
};
use super::mpc_config::MpcConfig;
use crate::common::{ControlInput, MotionModel, Objective, Obstacles, Pose2D};

/// Reshape [v0, omega0, v1, omega1, ...] into control inputs
pub fn controls_from_flat(flat: &[f64]) -> Vec<ControlInput> {
    debug_assert!(flat.len() % 2 == 0);
    flat.iter()
        .tuples()
        .map(|(&v, &omega)| ControlInput::new(v, omega))
        .collect()
}

/// Flatten control inputs into [v0, omega0, v1, omega1, ...]
pub fn flatten_controls(controls: &[ControlInput]) -> Vec<f64> {
    controls.iter().flat_map(|u| [u.v, u.omega]).collect()
}

/// Objective of one MPC cycle, borrowing everything it reads
pub struct MpcObjective<'a, M: MotionModel> {
    model: &'a M,
    config: &'a MpcConfig,
    initial_state: Pose2D,
    reference: &'a [Pose2D],
    obstacles: &'a Obstacles,
    // predicted states of the last gradient evaluation
    rollout: RefCell<Vec<Pose2D>>,
}

impl<'a, M: MotionModel> MpcObjective<'a, M> {
    pub fn new(
        model: &'a M,
        config: &'a MpcConfig,
        initial_state: Pose2D,
        reference: &'a [Pose2D],
        obstacles: &'a Obstacles,
    ) -> Self {
        debug_assert_eq!(reference.len(), config.horizon);
        MpcObjective {
            model,
            config,
            initial_state,
            reference,
            obstacles,
            rollout: RefCell::new(Vec::with_capacity(config.horizon + 1)),
        }
    }

    fn stage_cost(&self, position: &Pose2D, reference: &Pose2D, control: &ControlInput) -> f64 {
        let weights = &self.config.weights;
        let p = position.position();
        weights.tracking * tracking_cost(&p, &reference.position())
            + weights.effort * effort_cost(control)
            + weights.obstacle * obstacle_cost(&p, self.obstacles, self.config.safety_margin)
    }

    /// States visited by the control sequence, starting with the current state
    pub fn predict(&self, flat_controls: &[f64]) -> Vec<Pose2D> {
        let mut states = Vec::with_capacity(self.config.horizon + 1);
        let mut state = self.initial_state;
        states.push(state);
        for u in flat_controls.chunks_exact(2) {
            state = self.model.propagate(&state, &ControlInput::new(u[0], u[1]), self.config.dt);
            states.push(state);
        }
        states
    }
}

impl<'a, M: MotionModel> Objective for MpcObjective<'a, M> {
    fn dimension(&self) -> usize {
        self.config.decision_dimension()
    }

    fn value(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.dimension());
        let mut state = self.initial_state;
        let mut total = 0.0;
        for (u, reference) in x.chunks_exact(2).zip(self.reference) {
            let control = ControlInput::new(u[0], u[1]);
            state = self.model.propagate(&state, &control, self.config.dt);
            total += self.stage_cost(&state, reference, &control);
        }
        total
    }

    /// Adjoint gradient: one forward rollout, one backward sweep
    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        debug_assert_eq!(x.len(), self.dimension());
        let weights = &self.config.weights;
        let dt = self.config.dt;
        let margin = self.config.safety_margin;

        let mut rollout = self.rollout.borrow_mut();
        rollout.clear();
        rollout.push(self.initial_state);
        let mut state = self.initial_state;
        for u in x.chunks_exact(2) {
            state = self.model.propagate(&state, &ControlInput::new(u[0], u[1]), dt);
            rollout.push(state);
        }

        // costate: derivative of the remaining cost w.r.t. the state after step i
        let mut costate = Vector3::zeros();
        for i in (0..self.reference.len()).rev() {
            let control = ControlInput::new(x[2 * i], x[2 * i + 1]);
            let position = rollout[i + 1].position();

            let d_position = weights.tracking * tracking_gradient(&position, &self.reference[i].position())
                + weights.obstacle * obstacle_gradient(&position, self.obstacles, margin);
            costate += Vector3::new(d_position[0], d_position[1], 0.0);

            let a = self.model.jacobian_state(&rollout[i], &control, dt);
            let b = self.model.jacobian_control(&rollout[i], &control, dt);
            let d_control = b.transpose() * costate + weights.effort * effort_gradient(&control);
            grad[2 * i] = d_control[0];
            grad[2 * i + 1] = d_control[1];

            costate = a.transpose() * costate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_tracking::motion_model::DifferentialDrive;

    fn sample_reference(n: usize) -> Vec<Pose2D> {
        (0..n)
            .map(|i| Pose2D::new(0.1 * i as f64, 0.05 * (i as f64).sin(), 0.0))
            .collect()
    }

    #[test]
    fn test_flatten_and_reshape() {
        let controls = vec![ControlInput::new(0.5, -0.1), ControlInput::new(-1.0, 0.3)];
        let flat = flatten_controls(&controls);
        assert_eq!(flat, vec![0.5, -0.1, -1.0, 0.3]);
        assert_eq!(controls_from_flat(&flat), controls);
    }

    #[test]
    fn test_exact_reference_leaves_only_effort() {
        let model = DifferentialDrive::default();
        let config = MpcConfig::default();
        let start = Pose2D::new(0.5, -1.0, 0.3);

        let controls: Vec<ControlInput> = (0..config.horizon)
            .map(|i| ControlInput::new(0.8, 0.4 - 0.1 * i as f64))
            .collect();
        let mut reference = Vec::new();
        let mut state = start;
        for u in &controls {
            state = model.advance(&state, u, config.dt);
            reference.push(state);
        }

        let obstacles = Obstacles::new();
        let objective = MpcObjective::new(&model, &config, start, &reference, &obstacles);
        let cost = objective.value(&flatten_controls(&controls));

        let effort: f64 = controls.iter().map(effort_cost).sum::<f64>() * config.weights.effort;
        assert!((cost - effort).abs() < 1e-9, "cost {} vs effort {}", cost, effort);
    }

    #[test]
    fn test_zero_controls_cost() {
        let model = DifferentialDrive::default();
        let config = MpcConfig { horizon: 3, ..Default::default() };
        let reference = vec![Pose2D::new(1.0, 0.0, 0.0); 3];
        let obstacles = Obstacles::new();
        let objective = MpcObjective::new(&model, &config, Pose2D::origin(), &reference, &obstacles);

        // robot stays at the origin, one unit from every reference point
        assert!((objective.value(&[0.0; 6]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_term_weighted() {
        let model = DifferentialDrive::default();
        let mut config = MpcConfig { horizon: 2, ..Default::default() };
        config.weights.obstacle = 4.0;
        let reference = vec![Pose2D::origin(); 2];
        let obstacles = Obstacles::from(vec![(0.3, 0.0)]);
        let objective = MpcObjective::new(&model, &config, Pose2D::origin(), &reference, &obstacles);

        // (0.5 - 0.3)^2 = 0.04 per step, weighted by 4
        assert!((objective.value(&[0.0; 4]) - 0.32).abs() < 1e-12);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_value_rejects_short_input() {
        let model = DifferentialDrive::default();
        let config = MpcConfig { horizon: 3, ..Default::default() };
        let reference = vec![Pose2D::new(1.0, 0.0, 0.0); 3];
        let obstacles = Obstacles::new();
        let objective = MpcObjective::new(&model, &config, Pose2D::origin(), &reference, &obstacles);
        objective.value(&[0.0; 4]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_gradient_rejects_short_input() {
        let model = DifferentialDrive::default();
        let config = MpcConfig { horizon: 3, ..Default::default() };
        let reference = vec![Pose2D::new(1.0, 0.0, 0.0); 3];
        let obstacles = Obstacles::new();
        let objective = MpcObjective::new(&model, &config, Pose2D::origin(), &reference, &obstacles);
        let mut grad = [0.0; 6];
        objective.gradient(&[0.0; 4], &mut grad);
    }

    #[test]
    fn test_value_is_deterministic() {
        let model = DifferentialDrive::default();
        let config = MpcConfig::default();
        let reference = sample_reference(config.horizon);
        let obstacles = Obstacles::from(vec![(0.4, 0.0), (0.6, 0.1)]);
        let objective = MpcObjective::new(&model, &config, Pose2D::origin(), &reference, &obstacles);

        let x: Vec<f64> = (0..config.decision_dimension()).map(|i| 0.05 * i as f64).collect();
        assert_eq!(objective.value(&x), objective.value(&x));
    }

    #[test]
    fn test_adjoint_gradient_matches_finite_differences() {
        let model = DifferentialDrive::default();
        let mut config = MpcConfig::default();
        config.weights.obstacle = 5.0;
        let reference = sample_reference(config.horizon);
        let obstacles = Obstacles::from(vec![(0.45, 0.05), (0.2, -0.2), (3.0, 3.0)]);
        let start = Pose2D::new(0.0, 0.1, 0.2);
        let objective = MpcObjective::new(&model, &config, start, &reference, &obstacles);

        let x: Vec<f64> = (0..config.decision_dimension())
            .map(|i| if i % 2 == 0 { 0.6 + 0.02 * i as f64 } else { 0.3 - 0.04 * i as f64 })
            .collect();

        let mut analytic = vec![0.0; x.len()];
        objective.gradient(&x, &mut analytic);

        let h = 1e-6;
        let mut shifted = x.clone();
        for i in 0..x.len() {
            shifted[i] = x[i] + h;
            let f_plus = objective.value(&shifted);
            shifted[i] = x[i] - h;
            let f_minus = objective.value(&shifted);
            shifted[i] = x[i];
            let numeric = (f_plus - f_minus) / (2.0 * h);
            assert!(
                (analytic[i] - numeric).abs() < 1e-5,
                "component {}: analytic {} vs numeric {}",
                i,
                analytic[i],
                numeric
            );
        }
    }

    #[test]
    fn test_predict_includes_initial_state() {
        let model = DifferentialDrive::default();
        let config = MpcConfig { horizon: 4, ..Default::default() };
        let reference = sample_reference(4);
        let obstacles = Obstacles::new();
        let start = Pose2D::new(1.0, 2.0, 0.0);
        let objective = MpcObjective::new(&model, &config, start, &reference, &obstacles);

        let states = objective.predict(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(states.len(), 5);
        assert_eq!(states[0], start);
        assert!((states[4].x - 1.4).abs() < 1e-12);
    }
}
