//! Optimizer configuration.

use plda_types::PriorSettings;
use serde::{Deserialize, Serialize};

/// L-BFGS tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LbfgsConfig {
    /// Correction pairs kept for the inverse-Hessian estimate
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Stop once the gradient's L2 norm is at or below this
    #[serde(default = "default_gradient_tolerance")]
    pub gradient_tolerance: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Armijo sufficient-decrease constant
    #[serde(default = "default_armijo")]
    pub armijo: f64,

    /// Step shrink factor per backtracking step
    #[serde(default = "default_backtrack")]
    pub backtrack: f64,

    #[serde(default = "default_max_line_search_steps")]
    pub max_line_search_steps: usize,
}

fn default_history_size() -> usize {
    7
}
fn default_gradient_tolerance() -> f64 {
    1e-5
}
fn default_max_iterations() -> usize {
    200
}
fn default_armijo() -> f64 {
    1e-4
}
fn default_backtrack() -> f64 {
    0.5
}
fn default_max_line_search_steps() -> usize {
    40
}

impl Default for LbfgsConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            gradient_tolerance: default_gradient_tolerance(),
            max_iterations: default_max_iterations(),
            armijo: default_armijo(),
            backtrack: default_backtrack(),
            max_line_search_steps: default_max_line_search_steps(),
        }
    }
}

impl From<&PriorSettings> for LbfgsConfig {
    fn from(settings: &PriorSettings) -> Self {
        Self {
            history_size: settings.history_size,
            gradient_tolerance: settings.gradient_tolerance,
            max_iterations: settings.max_iterations,
            ..Self::default()
        }
    }
}

impl LbfgsConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.history_size == 0 {
            return Err("history_size must be > 0".to_string());
        }
        if !(self.gradient_tolerance > 0.0) {
            return Err("gradient_tolerance must be > 0".to_string());
        }
        if !(self.armijo > 0.0 && self.armijo < 1.0) {
            return Err(format!("armijo must be in (0, 1), got {}", self.armijo));
        }
        if !(self.backtrack > 0.0 && self.backtrack < 1.0) {
            return Err(format!("backtrack must be in (0, 1), got {}", self.backtrack));
        }
        Ok(())
    }
}
