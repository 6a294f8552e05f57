//! Categorical draw over unnormalized weights.

use rand::Rng;

use crate::error::SamplerError;

/// Draw an index with probability proportional to `weights[i]`.
///
/// Weights need not sum to one. Zero-weight indices are never returned. If
/// floating-point rounding pushes the uniform draw past the cumulative total,
/// the last index with positive weight is returned.
///
/// # Errors
///
/// `InvalidArgument` if any weight is negative or NaN, or if the total is not
/// a positive finite number (this includes an empty slice).
pub fn draw<R: Rng>(weights: &[f64], rng: &mut R) -> Result<usize, SamplerError> {
    let mut total = 0.0;
    for (index, &weight) in weights.iter().enumerate() {
        if !(weight >= 0.0) {
            return Err(SamplerError::InvalidArgument(format!(
                "weight {} at index {} is negative or NaN",
                weight, index
            )));
        }
        total += weight;
    }
    if !(total > 0.0 && total.is_finite()) {
        return Err(SamplerError::InvalidArgument(format!(
            "weights must have a positive finite total, got {}",
            total
        )));
    }

    let u = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (index, &weight) in weights.iter().enumerate() {
        if weight > 0.0 {
            cumulative += weight;
            last_positive = index;
            if cumulative > u {
                return Ok(index);
            }
        }
    }

    Ok(last_positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// Always produces the largest uniform value below one.
    struct MaxRng;

    impl RngCore for MaxRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }
        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0xff);
        }
    }

    #[test]
    fn test_frequencies_match_weights() {
        let weights = [0.45, 0.2, 0.35];
        let mut counts = [0usize; 3];
        let mut total = 0;

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..2000 {
                counts[draw(&weights, &mut rng).unwrap()] += 1;
                total += 1;
            }
        }

        for (count, expected) in counts.iter().zip(weights) {
            let observed = *count as f64 / total as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "observed {} expected {}",
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_unnormalized_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut hits = [0usize; 2];
        for _ in 0..4000 {
            hits[draw(&[30.0, 10.0], &mut rng).unwrap()] += 1;
        }
        let ratio = hits[0] as f64 / 4000.0;
        assert!((ratio - 0.75).abs() < 0.03, "ratio {}", ratio);
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            assert_eq!(draw(&[0.0, 0.0, 2.5, 0.0], &mut rng).unwrap(), 2);
        }
    }

    #[test]
    fn test_top_of_range_stays_in_bounds() {
        let weights = [0.1, 0.2, 0.0];
        assert_eq!(draw(&weights, &mut MaxRng).unwrap(), 1);

        let weights = [1e-300, 1e-300];
        assert_eq!(draw(&weights, &mut MaxRng).unwrap(), 1);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            draw(&[], &mut rng),
            Err(SamplerError::InvalidArgument(_))
        ));
        assert!(draw(&[0.0, 0.0], &mut rng).is_err());
        assert!(draw(&[0.5, -0.1], &mut rng).is_err());
        assert!(draw(&[f64::NAN, 1.0], &mut rng).is_err());
        assert!(draw(&[f64::INFINITY, 1.0], &mut rng).is_err());
    }
}
