// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Median helpers shared by the benchmark aggregators
//!
//! Medians rather than means: repeated benchmark runs are skewed by thermal
//! throttling and background load, and a median resists those outliers.

/// Median of a list of samples.
///
/// Non-finite values are ignored. An even-length list yields the mean of the
/// two central values. An empty (or all-non-finite) list yields `None`:
/// "no value" must stay absent downstream, never become a false zero.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("non-finite values filtered"));

    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn test_median_even_means_central_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_median_single() {
        assert_eq!(median(&[21.5]), Some(21.5));
    }

    #[test]
    fn test_median_empty_is_absent() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_median_ignores_non_finite() {
        assert_eq!(median(&[f64::NAN, 2.0, f64::INFINITY]), Some(2.0));
        assert_eq!(median(&[f64::NAN]), None);
    }

    #[test]
    fn test_median_order_independent() {
        let a = median(&[5.0, 1.0, 4.0, 2.0, 3.0]);
        let b = median(&[3.0, 2.0, 4.0, 1.0, 5.0]);
        assert_eq!(a, b);
    }
}
