//! Completion score and overall verdict.
//!
//! Weights: satisfied 1.0, partial 0.3, unsatisfied 0.0. The score is
//! `round(100 * Σweight / N)`, computed in integer tenths so that halves
//! round away from zero exactly.

use crate::domain::{RequirementResult, VerdictStatus};

/// Completion score in 0..=100; 0 for no results.
pub fn aggregate(results: &[RequirementResult]) -> u8 {
    if results.is_empty() {
        return 0;
    }
    let n = results.len() as u64;
    let tenths: u64 = results.iter().map(|r| r.status.weight_tenths()).sum();
    // round(10 * tenths / n) with half-up on non-negative integers
    ((20 * tenths + n) / (2 * n)) as u8
}

/// Satisfied iff every result is satisfied; Partial iff some result is
/// partial and none is unsatisfied; Unsatisfied otherwise (including empty).
pub fn overall_verdict(results: &[RequirementResult]) -> VerdictStatus {
    if results.is_empty() {
        return VerdictStatus::Unsatisfied;
    }
    let any_unsatisfied = results
        .iter()
        .any(|r| r.status == VerdictStatus::Unsatisfied);
    let any_partial = results.iter().any(|r| r.status == VerdictStatus::Partial);

    if any_unsatisfied {
        VerdictStatus::Unsatisfied
    } else if any_partial {
        VerdictStatus::Partial
    } else {
        VerdictStatus::Satisfied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(statuses: &[VerdictStatus]) -> Vec<RequirementResult> {
        statuses
            .iter()
            .zip(1u32..)
            .map(|(s, i)| RequirementResult::new(i, *s))
            .collect()
    }

    use VerdictStatus::{Partial as P, Satisfied as S, Unsatisfied as U};

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(aggregate(&[]), 0);
        assert_eq!(overall_verdict(&[]), U);
    }

    #[test]
    fn test_all_satisfied_is_hundred() {
        assert_eq!(aggregate(&results(&[S, S, S])), 100);
        assert_eq!(overall_verdict(&results(&[S, S, S])), S);
    }

    #[test]
    fn test_partial_weight() {
        assert_eq!(aggregate(&results(&[P])), 30);
        assert_eq!(aggregate(&results(&[S, P])), 65);
        assert_eq!(aggregate(&results(&[S, P, U])), 43);
        assert_eq!(aggregate(&results(&[U, U, U])), 0);
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        // 100 * 0.3 / 4 = 7.5
        assert_eq!(aggregate(&results(&[P, U, U, U])), 8);
        // 100 * 1.3 / 4 = 32.5
        assert_eq!(aggregate(&results(&[S, P, U, U])), 33);
    }

    #[test]
    fn test_matches_formula_for_small_mixes() {
        for s in 0..=4u32 {
            for p in 0..=4u32 {
                for u in 0..=4u32 {
                    let n = s + p + u;
                    if n == 0 {
                        continue;
                    }
                    let mut statuses = Vec::new();
                    statuses.extend(std::iter::repeat(S).take(s as usize));
                    statuses.extend(std::iter::repeat(P).take(p as usize));
                    statuses.extend(std::iter::repeat(U).take(u as usize));

                    // exact rational: 100 * (10s + 3p) / (10n)
                    let num = 100 * (10 * s + 3 * p);
                    let den = 10 * n;
                    let expected = (2 * num + den) / (2 * den);
                    assert_eq!(aggregate(&results(&statuses)) as u32, expected);
                }
            }
        }
    }

    #[test]
    fn test_overall_partial_needs_no_unsatisfied() {
        assert_eq!(overall_verdict(&results(&[S, P])), P);
        assert_eq!(overall_verdict(&results(&[S, P, U])), U);
        assert_eq!(overall_verdict(&results(&[S, U])), U);
    }
}
