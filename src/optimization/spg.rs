//! Spectral Projected Gradient (SPG) solver for box-constrained problems
//!
//! Each iteration projects a Barzilai-Borwein scaled gradient step onto the
//! box and backtracks along the resulting direction until a nonmonotone
//! Armijo condition holds against the worst of the last few objective values.
//!
//! Ref:
//!     - E. G. Birgin, J. M. Martínez and M. Raydan,
//!       "Nonmonotone Spectral Projected Gradient Methods on Convex Sets",
//!       SIAM Journal on Optimization, 2000

use std::collections::VecDeque;

use log::trace;

use super::{Bounds, Solution, SolverConfig, SolverStatus};
use crate::common::{BoxConstrainedSolver, Objective};

/// Scratch vectors reused across solves
#[derive(Debug, Default)]
struct Workspace {
    x: Vec<f64>,
    grad: Vec<f64>,
    direction: Vec<f64>,
    trial: Vec<f64>,
    trial_grad: Vec<f64>,
    best: Vec<f64>,
    history: VecDeque<f64>,
}

impl Workspace {
    fn resize(&mut self, n: usize) {
        for buffer in [
            &mut self.x,
            &mut self.grad,
            &mut self.direction,
            &mut self.trial,
            &mut self.trial_grad,
            &mut self.best,
        ] {
            buffer.clear();
            buffer.resize(n, 0.0);
        }
        self.history.clear();
    }
}

/// SPG backend
///
/// Holds scratch buffers between calls, so a single instance must not be
/// shared by concurrently running controllers.
#[derive(Debug)]
pub struct SpectralProjectedGradient {
    config: SolverConfig,
    work: Workspace,
}

impl SpectralProjectedGradient {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            work: Workspace::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn clamp_spectral_step(&self, step: f64) -> f64 {
        step.max(self.config.min_spectral_step)
            .min(self.config.max_spectral_step)
    }
}

impl Default for SpectralProjectedGradient {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

/// Infinity norm of P(x - scale * g) - x
fn projected_step_norm(x: &[f64], grad: &[f64], bounds: &[Bounds], scale: f64) -> f64 {
    x.iter()
        .zip(grad)
        .zip(bounds)
        .map(|((&xi, &gi), b)| (b.project(xi - scale * gi) - xi).abs())
        .fold(0.0, f64::max)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}

impl BoxConstrainedSolver for SpectralProjectedGradient {
    fn minimize<F: Objective + ?Sized>(
        &mut self,
        objective: &F,
        initial_guess: &[f64],
        bounds: &[Bounds],
    ) -> Solution {
        let n = initial_guess.len();
        assert_eq!(n, bounds.len(), "one bound per decision variable");
        assert_eq!(n, objective.dimension(), "initial guess must match objective dimension");

        if !bounds.iter().all(Bounds::is_valid) {
            return Solution {
                x: initial_guess.to_vec(),
                value: objective.value(initial_guess),
                status: SolverStatus::Infeasible,
                iterations: 0,
                evaluations: 1,
            };
        }

        let mut work = std::mem::take(&mut self.work);
        work.resize(n);

        for ((xi, &x0), b) in work.x.iter_mut().zip(initial_guess).zip(bounds) {
            *xi = b.project(x0);
        }
        let mut fx = objective.value(&work.x);
        let mut evaluations = 1;
        work.best.copy_from_slice(&work.x);
        let mut best_value = fx;

        let finish = |work: Workspace, best_value: f64, status, iterations, evaluations| {
            let solution = Solution {
                x: work.best.clone(),
                value: best_value,
                status,
                iterations,
                evaluations,
            };
            (work, solution)
        };

        if !fx.is_finite() {
            let (work, solution) = finish(work, best_value, SolverStatus::NonFinite, 0, evaluations);
            self.work = work;
            return solution;
        }

        objective.gradient(&work.x, &mut work.grad);
        if !all_finite(&work.grad) {
            let (work, solution) = finish(work, best_value, SolverStatus::NonFinite, 0, evaluations);
            self.work = work;
            return solution;
        }

        let initial_norm = projected_step_norm(&work.x, &work.grad, bounds, 1.0);
        let mut spectral_step = if initial_norm > 0.0 {
            self.clamp_spectral_step(1.0 / initial_norm)
        } else {
            1.0
        };
        work.history.push_back(fx);

        let history_length = self.config.history_length.max(1);
        let mut outcome = None;

        for iteration in 0..self.config.max_iterations {
            if projected_step_norm(&work.x, &work.grad, bounds, 1.0) < self.config.tolerance {
                outcome = Some((SolverStatus::Converged, iteration));
                break;
            }

            for (((d, &xi), &gi), b) in work.direction.iter_mut()
                .zip(&work.x)
                .zip(&work.grad)
                .zip(bounds)
            {
                *d = b.project(xi - spectral_step * gi) - xi;
            }
            let slope = dot(&work.grad, &work.direction);
            let reference = work.history.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            let mut alpha = 1.0;
            let trial_value = loop {
                for ((t, &xi), &di) in work.trial.iter_mut().zip(&work.x).zip(&work.direction) {
                    *t = xi + alpha * di;
                }
                let value = objective.value(&work.trial);
                evaluations += 1;
                if value.is_finite()
                    && value <= reference + self.config.sufficient_decrease * alpha * slope
                {
                    break Some(value);
                }
                alpha *= 0.5;
                if alpha < self.config.min_line_search_step {
                    break None;
                }
            };

            let trial_value = match trial_value {
                Some(value) => value,
                None => {
                    outcome = Some((SolverStatus::LineSearchFailed, iteration));
                    break;
                }
            };

            objective.gradient(&work.trial, &mut work.trial_grad);
            if !all_finite(&work.trial_grad) {
                outcome = Some((SolverStatus::NonFinite, iteration));
                break;
            }

            // s = trial - x, y = trial_grad - grad
            let mut s_dot_y = 0.0;
            let mut s_dot_s = 0.0;
            for i in 0..n {
                let s = work.trial[i] - work.x[i];
                let y = work.trial_grad[i] - work.grad[i];
                s_dot_y += s * y;
                s_dot_s += s * s;
            }
            spectral_step = if s_dot_y <= 0.0 {
                self.config.max_spectral_step
            } else {
                self.clamp_spectral_step(s_dot_s / s_dot_y)
            };

            std::mem::swap(&mut work.x, &mut work.trial);
            std::mem::swap(&mut work.grad, &mut work.trial_grad);
            fx = trial_value;

            work.history.push_back(fx);
            while work.history.len() > history_length {
                work.history.pop_front();
            }
            if fx < best_value {
                best_value = fx;
                work.best.copy_from_slice(&work.x);
            }

            trace!("spg iteration {}: f = {:.6e}, alpha = {:.3e}", iteration, fx, alpha);
        }

        let (status, iterations) =
            outcome.unwrap_or((SolverStatus::MaxIterations, self.config.max_iterations));
        let (work, solution) = finish(work, best_value, status, iterations, evaluations);
        self.work = work;
        solution
    }
}
