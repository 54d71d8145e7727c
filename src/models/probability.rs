//! Link function, probability clamping, and categorical sampling shared by
//! both model families.

use rand::Rng;
use rand::rngs::StdRng;
use statrs::function::erf::erf;

/// Number of ordered response categories.
pub const CATEGORIES: usize = 5;

/// Branch probabilities from the link function are clamped to
/// `[PROBABILITY_FLOOR, 1 - PROBABILITY_FLOOR]` so every downstream product
/// stays strictly inside (0, 1).
pub const PROBABILITY_FLOOR: f64 = 1.0e-12;

/// Floor applied to a category probability before taking its logarithm, so
/// the likelihood of any observable response stays finite.
pub const CATEGORY_FLOOR: f64 = 1.0e-300;

/// Bound a probability away from exact 0 and 1.
#[must_use]
pub fn clamp_probability(probability: f64) -> f64 {
    probability.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR)
}

/// Cumulative-normal link: maps a latent difference to a clamped probability.
#[must_use]
pub fn normal_cdf_link(value: f64) -> f64 {
    let cdf = 0.5 * (1.0 + erf(value / std::f64::consts::SQRT_2));
    clamp_probability(cdf)
}

/// `ln` of a category probability with the documented floor.
#[must_use]
pub fn log_category_probability(probability: f64) -> f64 {
    probability.max(CATEGORY_FLOOR).ln()
}

/// Draw one category label in `1..=5` from a simplex over the five
/// categories.
#[must_use]
pub fn draw_category(rng: &mut StdRng, probabilities: &[f64; CATEGORIES]) -> u8 {
    let uniform = rng.random::<f64>();
    let mut cumulative = 0.0;
    for (index, probability) in probabilities.iter().enumerate() {
        cumulative += probability;
        if uniform < cumulative {
            return u8::try_from(index + 1).unwrap_or(5);
        }
    }
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    #[test]
    fn link_is_half_at_zero() {
        assert_relative_eq!(normal_cdf_link(0.0), 0.5, epsilon = 1.0e-12);
    }

    #[test]
    fn link_is_monotone_and_bounded() {
        let low = normal_cdf_link(-40.0);
        let high = normal_cdf_link(40.0);
        assert!(low >= PROBABILITY_FLOOR);
        assert!(high <= 1.0 - PROBABILITY_FLOOR);
        assert!(low < normal_cdf_link(0.0));
        assert!(normal_cdf_link(0.0) < high);
    }

    #[test]
    fn log_category_probability_is_finite_at_zero() {
        assert!(log_category_probability(0.0).is_finite());
    }

    #[test]
    fn draws_cover_only_supported_categories() {
        let mut rng = StdRng::seed_from_u64(7);
        let probabilities = [0.0, 0.5, 0.0, 0.5, 0.0];
        for _ in 0..200 {
            let category = draw_category(&mut rng, &probabilities);
            assert!(category == 2 || category == 4);
        }
    }

    #[test]
    fn degenerate_simplex_always_draws_its_category() {
        let mut rng = StdRng::seed_from_u64(11);
        let probabilities = [0.0, 0.0, 1.0, 0.0, 0.0];
        for _ in 0..50 {
            assert_eq!(draw_category(&mut rng, &probabilities), 3);
        }
    }
}
