//! Limited-memory BFGS with a backtracking Armijo line search.
//!
//! The optimizer never fails for running out of iterations: it always
//! returns its best point together with the [`StopReason`] that ended it.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::LbfgsConfig;
use crate::error::PriorError;
use crate::objective::{check_dimension, Objective};

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Gradient norm fell to the configured tolerance
    GradientTolerance,
    /// Iteration cap reached first
    MaxIterations,
    /// No step along the search direction decreased the objective enough
    LineSearchFailed,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::GradientTolerance => write!(f, "gradient tolerance"),
            StopReason::MaxIterations => write!(f, "max iterations"),
            StopReason::LineSearchFailed => write!(f, "line search failed"),
        }
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone, Serialize)]
pub struct Optimized {
    #[serde(skip_serializing)]
    pub vars: Vec<f64>,
    pub value: f64,
    pub gradient_norm: f64,
    pub iterations: usize,
    /// Objective value evaluations, line search included
    pub evaluations: usize,
    pub reason: StopReason,
}

/// One curvature pair `(s, y, 1 / s.y)`.
struct Correction {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

/// Quasi-Newton minimizer.
#[derive(Debug, Clone, Default)]
pub struct LbfgsOptimizer {
    config: LbfgsConfig,
}

impl LbfgsOptimizer {
    pub fn new(config: LbfgsConfig) -> Result<Self, PriorError> {
        config.validate().map_err(PriorError::InvalidArgument)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LbfgsConfig {
        &self.config
    }

    /// Minimize `objective` starting from `initial_vars`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `initial_vars` has the wrong dimension or the
    /// objective is not finite at the starting point. Errors returned by the
    /// objective itself are propagated.
    #[instrument(skip(self, objective, initial_vars), fields(vars = initial_vars.len()))]
    pub fn optimize<O: Objective + ?Sized>(
        &self,
        objective: &O,
        initial_vars: Vec<f64>,
    ) -> Result<Optimized, PriorError> {
        check_dimension(objective.num_variables(), &initial_vars)?;

        let mut x = initial_vars;
        let mut f = objective.value(&x)?;
        let mut evaluations = 1;
        if !f.is_finite() {
            return Err(PriorError::InvalidArgument(format!(
                "objective is not finite at the initial point: {}",
                f
            )));
        }
        let mut g = objective.gradient(&x)?;
        let mut history: VecDeque<Correction> = VecDeque::with_capacity(self.config.history_size);

        let mut iteration = 0;
        let reason = loop {
            let g_norm = norm(&g);
            if g_norm <= self.config.gradient_tolerance {
                break StopReason::GradientTolerance;
            }
            if iteration >= self.config.max_iterations {
                break StopReason::MaxIterations;
            }

            let mut direction = two_loop_direction(&g, &history);
            let mut slope = dot(&direction, &g);
            if !(slope < 0.0) {
                // Lost descent; restart from steepest descent
                debug!(iteration, "Resetting L-BFGS history");
                history.clear();
                direction = g.iter().map(|gi| -gi).collect();
                slope = -g_norm * g_norm;
            }

            let mut step = if history.is_empty() {
                (1.0 / g_norm).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..self.config.max_line_search_steps {
                let candidate: Vec<f64> = x
                    .iter()
                    .zip(&direction)
                    .map(|(xi, di)| xi + step * di)
                    .collect();
                let f_candidate = objective.value(&candidate)?;
                evaluations += 1;
                if f_candidate.is_finite() && f_candidate <= f + self.config.armijo * step * slope {
                    accepted = Some((candidate, f_candidate));
                    break;
                }
                step *= self.config.backtrack;
            }

            let Some((x_next, f_next)) = accepted else {
                warn!(iteration, value = f, "Line search found no sufficient decrease");
                break StopReason::LineSearchFailed;
            };

            let g_next = objective.gradient(&x_next)?;
            let s: Vec<f64> = x_next.iter().zip(&x).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = g_next.iter().zip(&g).map(|(a, b)| a - b).collect();
            let sy = dot(&s, &y);
            if sy > 1e-12 {
                if history.len() == self.config.history_size {
                    history.pop_front();
                }
                history.push_back(Correction { s, y, rho: 1.0 / sy });
            }

            x = x_next;
            f = f_next;
            g = g_next;
            iteration += 1;

            if iteration % 25 == 0 {
                debug!(iteration, value = f, gradient_norm = norm(&g), "L-BFGS progress");
            }
        };

        let gradient_norm = norm(&g);
        info!(
            iterations = iteration,
            value = f,
            gradient_norm,
            reason = %reason,
            "Optimization finished"
        );

        Ok(Optimized {
            vars: x,
            value: f,
            gradient_norm,
            iterations: iteration,
            evaluations,
            reason,
        })
    }
}

/// Two-loop recursion: returns `-H g` for the implicit inverse Hessian `H`.
fn two_loop_direction(g: &[f64], history: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = g.to_vec();
    let mut alphas = Vec::with_capacity(history.len());

    for c in history.iter().rev() {
        let alpha = c.rho * dot(&c.s, &q);
        axpy(-alpha, &c.y, &mut q);
        alphas.push(alpha);
    }

    let gamma = history
        .back()
        .map(|c| {
            let yy = dot(&c.y, &c.y);
            if yy > 0.0 {
                1.0 / (c.rho * yy)
            } else {
                1.0
            }
        })
        .unwrap_or(1.0);
    for qi in q.iter_mut() {
        *qi *= gamma;
    }

    for (c, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = c.rho * dot(&c.y, &q);
        axpy(alpha - beta, &c.s, &mut q);
    }

    for qi in q.iter_mut() {
        *qi = -*qi;
    }
    q
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// `y += alpha * x`
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}
