//! Differentiable objective functions over a flat parameter vector.

use crate::error::PriorError;

/// A value + gradient provider minimized by the optimizer.
///
/// Implementations must reject a parameter vector whose length differs from
/// [`Objective::num_variables`] before doing any numeric work.
pub trait Objective {
    /// Number of free variables.
    fn num_variables(&self) -> usize;

    /// Objective value at `vars`.
    fn value(&self, vars: &[f64]) -> Result<f64, PriorError>;

    /// Gradient at `vars`, same length as `vars`.
    fn gradient(&self, vars: &[f64]) -> Result<Vec<f64>, PriorError>;
}

/// Fail with `InvalidArgument` unless `vars.len() == expected`.
pub fn check_dimension(expected: usize, vars: &[f64]) -> Result<(), PriorError> {
    if vars.len() != expected {
        return Err(PriorError::InvalidArgument(format!(
            "expected {} variables, got {}",
            expected,
            vars.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimension() {
        assert!(check_dimension(2, &[1.0, 2.0]).is_ok());
        match check_dimension(3, &[1.0]) {
            Err(PriorError::InvalidArgument(msg)) => {
                assert_eq!(msg, "expected 3 variables, got 1")
            }
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
    }
}
