//! Appearance likelihood between descriptors.

use nalgebra::DVector;
use rayon::prelude::*;

use crate::histogram::{compute_descriptor, Descriptor};
use crate::{Frame, Population};

/// Scale applied to the Bhattacharyya coefficient before exponentiation.
///
/// Larger values sharpen the gap between close and distant appearance matches.
pub const LIKELIHOOD_SHARPNESS: f64 = 20.0;

/// Bhattacharyya coefficient `sum_i sqrt(p_i * q_i)`.
///
/// Lies in `[0, 1]` for probability vectors; 0 if either descriptor is empty.
pub fn bhattacharyya_coefficient(p: &Descriptor, q: &Descriptor) -> f64 {
    p.iter()
        .zip(q.iter())
        .map(|(a, b)| (a * b).sqrt())
        .sum()
}

/// Unnormalized particle weight: `exp(20 * coefficient)`.
///
/// This is an increasing transform of the coefficient, not the Bhattacharyya
/// distance `-ln(coefficient)`. Symmetric in its arguments.
pub fn appearance_score(p: &Descriptor, q: &Descriptor) -> f64 {
    (LIKELIHOOD_SHARPNESS * bhattacharyya_coefficient(p, q)).exp()
}

/// Score every particle of `population` against `target` on `frame`.
///
/// Entry `i` of the result belongs to particle `i`. The parallel path yields the
/// same values as the sequential one, since each entry depends only on its own
/// particle.
pub fn score_population(
    frame: &Frame,
    population: &Population,
    target: &Descriptor,
    parallel: bool,
) -> DVector<f64> {
    let score_one = |i: usize| appearance_score(&compute_descriptor(frame, &population.state(i)), target);

    let scores: Vec<f64> = if parallel {
        (0..population.len()).into_par_iter().map(score_one).collect()
    } else {
        (0..population.len()).map(score_one).collect()
    };
    DVector::from_vec(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::DESCRIPTOR_LEN;
    use crate::State;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn descriptor_from(entries: &[(usize, f64)]) -> Descriptor {
        let mut d = DVector::zeros(DESCRIPTOR_LEN);
        for (i, v) in entries {
            d[*i] = *v;
        }
        d
    }

    #[test]
    fn test_identical_descriptors() {
        let p = descriptor_from(&[(0, 0.25), (10, 0.75)]);
        assert_relative_eq!(bhattacharyya_coefficient(&p, &p), 1.0, epsilon = 1e-12);
        assert_relative_eq!(appearance_score(&p, &p), 20.0_f64.exp(), max_relative = 1e-12);
    }

    #[test]
    fn test_disjoint_descriptors() {
        let p = descriptor_from(&[(0, 1.0)]);
        let q = descriptor_from(&[(1, 1.0)]);
        assert_eq!(bhattacharyya_coefficient(&p, &q), 0.0);
        assert_relative_eq!(appearance_score(&p, &q), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_descriptor_scores_one() {
        let p = DVector::zeros(DESCRIPTOR_LEN);
        let q = descriptor_from(&[(5, 1.0)]);
        assert_relative_eq!(appearance_score(&p, &q), 1.0, epsilon = 1e-12);
    }

    fn random_descriptor(rng: &mut StdRng) -> Descriptor {
        let support = rng.random_range(1..64);
        let mut d = DVector::zeros(DESCRIPTOR_LEN);
        for _ in 0..support {
            d[rng.random_range(0..DESCRIPTOR_LEN)] += rng.random::<f64>();
        }
        let total = d.sum();
        if total > 0.0 {
            d /= total;
        }
        d
    }

    #[test]
    fn test_score_is_symmetric() {
        let p = descriptor_from(&[(0, 0.1), (3, 0.4), (4000, 0.5)]);
        let q = descriptor_from(&[(0, 0.6), (3, 0.2), (17, 0.2)]);
        assert_eq!(appearance_score(&p, &q), appearance_score(&q, &p));

        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..200 {
            let p = random_descriptor(&mut rng);
            let q = random_descriptor(&mut rng);
            assert_eq!(bhattacharyya_coefficient(&p, &q), bhattacharyya_coefficient(&q, &p));
            assert_eq!(appearance_score(&p, &q), appearance_score(&q, &p));

            let coefficient = bhattacharyya_coefficient(&p, &q);
            assert!((0.0..=1.0 + 1e-12).contains(&coefficient));
            assert_relative_eq!(bhattacharyya_coefficient(&p, &p), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_partial_overlap_is_between_extremes() {
        let p = descriptor_from(&[(0, 0.5), (1, 0.5)]);
        let q = descriptor_from(&[(0, 1.0)]);
        let coefficient = bhattacharyya_coefficient(&p, &q);
        assert_relative_eq!(coefficient, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert!(appearance_score(&p, &q) < appearance_score(&q, &q));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut frame = Frame::filled(60, 60, [20, 40, 60]);
        frame.fill_rect(20, 20, 40, 40, [220, 30, 30]);
        let target = compute_descriptor(&frame, &State::new(30.0, 30.0, 10.0, 10.0, 0.0, 0.0));
        let population = Population::from_states(&[
            State::new(30.0, 30.0, 10.0, 10.0, 0.0, 0.0),
            State::new(25.0, 28.0, 8.0, 12.0, 0.0, 0.0),
            State::new(5.0, 5.0, 4.0, 4.0, 0.0, 0.0),
            State::new(-50.0, 5.0, 4.0, 4.0, 0.0, 0.0),
        ]);

        let sequential = score_population(&frame, &population, &target, false);
        let parallel = score_population(&frame, &population, &target, true);
        assert_eq!(sequential, parallel);
        assert!(sequential[0] > sequential[1]);
        assert!(sequential[1] > sequential[2]);
        assert_relative_eq!(sequential[3], 1.0, epsilon = 1e-12);
    }
}
