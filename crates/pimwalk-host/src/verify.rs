//! Host-vs-device comparison.
//!
//! A mismatch is data, not an error: the caller decides what it means for
//! the exit status.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerificationReport {
    pub total: usize,
    pub mismatches: usize,
    pub first_mismatch: Option<usize>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }

    /// Combine reports of independent checks; indices of `other` are shifted
    /// past this report's elements.
    #[must_use]
    pub fn and(self, other: VerificationReport) -> VerificationReport {
        VerificationReport {
            total: self.total + other.total,
            mismatches: self.mismatches + other.mismatches,
            first_mismatch: self.first_mismatch.or(other.first_mismatch.map(|i| i + self.total)),
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_mismatch {
            None => write!(f, "outputs are equal ({} elements)", self.total),
            Some(i) => write!(f, "{} of {} elements differ, first at index {i}", self.mismatches, self.total),
        }
    }
}

/// Element-wise equality; a length difference counts every missing element.
pub fn verify<T: PartialEq>(expected: &[T], actual: &[T]) -> VerificationReport {
    let total = expected.len().max(actual.len());
    let mut mismatches = total - expected.len().min(actual.len());
    let mut first_mismatch = (mismatches > 0).then_some(expected.len().min(actual.len()));
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        if e != a {
            mismatches += 1;
            if first_mismatch.is_none_or(|first| i < first) {
                first_mismatch = Some(i);
            }
        }
    }
    VerificationReport { total, mismatches, first_mismatch }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_outputs() {
        let report = verify(&[1, 2, 3], &[1, 2, 3]);
        assert!(report.passed());
        assert_eq!(report.total, 3);
    }

    #[test]
    fn test_mismatch_is_reported() {
        let report = verify(&[1, 2, 3, 4], &[1, 0, 3, 0]);
        assert_eq!(report.mismatches, 2);
        assert_eq!(report.first_mismatch, Some(1));
        assert!(report.to_string().contains("first at index 1"));
    }

    #[test]
    fn test_length_difference() {
        let report = verify(&[1, 2, 3], &[1, 2]);
        assert_eq!(report, VerificationReport { total: 3, mismatches: 1, first_mismatch: Some(2) });
    }

    #[test]
    fn test_verify_is_idempotent() {
        let (expected, actual) = (vec![5, 6, 7], vec![5, 0, 7]);
        assert_eq!(verify(&expected, &actual), verify(&expected, &actual));
    }

    #[test]
    fn test_and_shifts_indices() {
        let a = verify(&[1, 2], &[1, 2]);
        let b = verify(&[3], &[4]);
        assert_eq!(a.and(b).first_mismatch, Some(2));
    }
}
