//! L2-regularized wrapper around any objective.

use crate::error::PriorError;
use crate::objective::{check_dimension, Objective};

/// Adds `rho / 2 * ||x||^2` to an inner objective.
#[derive(Debug, Clone)]
pub struct RidgeObjective<O> {
    inner: O,
    rho: f64,
}

impl<O: Objective> RidgeObjective<O> {
    pub fn new(inner: O, rho: f64) -> Result<Self, PriorError> {
        if !(rho.is_finite() && rho >= 0.0) {
            return Err(PriorError::InvalidArgument(format!(
                "ridge weight must be finite and >= 0, got {}",
                rho
            )));
        }
        Ok(Self { inner, rho })
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: Objective> Objective for RidgeObjective<O> {
    fn num_variables(&self) -> usize {
        self.inner.num_variables()
    }

    fn value(&self, vars: &[f64]) -> Result<f64, PriorError> {
        check_dimension(self.num_variables(), vars)?;
        let norm_sq: f64 = vars.iter().map(|x| x * x).sum();
        Ok(self.inner.value(vars)? + 0.5 * self.rho * norm_sq)
    }

    fn gradient(&self, vars: &[f64]) -> Result<Vec<f64>, PriorError> {
        check_dimension(self.num_variables(), vars)?;
        let mut grad = self.inner.gradient(vars)?;
        for (g, x) in grad.iter_mut().zip(vars) {
            *g += self.rho * x;
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(x) = sum (x_i - 1)^2
    struct Shifted(usize);

    impl Objective for Shifted {
        fn num_variables(&self) -> usize {
            self.0
        }
        fn value(&self, vars: &[f64]) -> Result<f64, PriorError> {
            check_dimension(self.0, vars)?;
            Ok(vars.iter().map(|x| (x - 1.0) * (x - 1.0)).sum())
        }
        fn gradient(&self, vars: &[f64]) -> Result<Vec<f64>, PriorError> {
            check_dimension(self.0, vars)?;
            Ok(vars.iter().map(|x| 2.0 * (x - 1.0)).collect())
        }
    }

    #[test]
    fn test_ridge_adds_penalty() {
        let ridge = RidgeObjective::new(Shifted(2), 2.0).unwrap();
        // (2-1)^2 + (0-1)^2 = 2, penalty = 0.5 * 2 * 4 = 4
        assert!((ridge.value(&[2.0, 0.0]).unwrap() - 6.0).abs() < 1e-12);

        let grad = ridge.gradient(&[2.0, 0.0]).unwrap();
        assert!((grad[0] - 6.0).abs() < 1e-12);
        assert!((grad[1] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ridge_checks_dimension_first() {
        let ridge = RidgeObjective::new(Shifted(2), 1.0).unwrap();
        assert!(matches!(
            ridge.value(&[1.0]),
            Err(PriorError::InvalidArgument(_))
        ));
        assert!(matches!(
            ridge.gradient(&[1.0, 2.0, 3.0]),
            Err(PriorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_ridge_rejects_negative_weight() {
        assert!(RidgeObjective::new(Shifted(1), -0.1).is_err());
    }
}
